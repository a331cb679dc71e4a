use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected {expected} bytes for a big-endian field, got {actual}")]
pub struct DecodeError {
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    #[error("malformed tag {tag:?}: {reason}")]
    MalformedTag { tag: String, reason: String },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("payload has {actual} bytes, item declares {declared}")]
    Truncation { declared: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open metadata source {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("metadata xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("metadata io error: {0}")]
    Io(#[from] std::io::Error),
}
