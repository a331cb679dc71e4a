use base64::{Engine as _, engine::general_purpose};

use crate::metadata::error::ItemError;

/// One `<item>` element exactly as read from the stream: hex tags, declared
/// length and base64 text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub item_type: String,
    pub code: String,
    pub length: usize,
    pub data: String,
}

/// A decoded metadata item, ready to be dispatched on its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataItem {
    /// `core` for DMAP fields, `ssnc` for receiver-generated events.
    pub item_type: String,
    pub code: String,
    pub payload: Vec<u8>,
}

impl MetadataItem {
    pub fn new(item_type: &str, code: &str, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            item_type: item_type.to_string(),
            code: code.to_string(),
            payload: payload.into(),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

impl RawItem {
    pub fn decode(&self) -> Result<MetadataItem, ItemError> {
        let item_type = decode_tag(&self.item_type)?;
        let code = decode_tag(&self.code)?;
        let payload = decode_payload(&self.data, self.length)?;
        Ok(MetadataItem {
            item_type,
            code,
            payload,
        })
    }
}

/// Tags are four printable ASCII characters, hex encoded.
fn decode_tag(tag: &str) -> Result<String, ItemError> {
    let malformed = |reason: String| ItemError::MalformedTag {
        tag: tag.to_string(),
        reason,
    };

    let bytes = hex::decode(tag.trim()).map_err(|e| malformed(e.to_string()))?;
    if bytes.len() != 4 {
        return Err(malformed(format!("decodes to {} bytes", bytes.len())));
    }
    if !bytes.iter().all(|b| b.is_ascii_graphic()) {
        return Err(malformed("not printable".to_string()));
    }

    // all bytes are ASCII at this point
    Ok(bytes.iter().map(|&b| b as char).collect())
}

fn decode_payload(data: &str, length: usize) -> Result<Vec<u8>, ItemError> {
    // the receiver wraps long payloads over several lines
    let compact: String = data.split_whitespace().collect();
    let mut payload = general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| ItemError::MalformedPayload(e.to_string()))?;

    if payload.len() < length {
        return Err(ItemError::Truncation {
            declared: length,
            actual: payload.len(),
        });
    }
    payload.truncate(length);
    Ok(payload)
}
