//! Incremental reader for the receiver's XML metadata stream.
//!
//! The stream is a flat sequence of elements such as
//!
//! ```text
//! <item><type>636f7265</type><code>6d696e6d</code><length>6</length>
//! <data encoding="base64">
//! U29uZyBB</data></item>
//! ```
//!
//! with no enclosing root element, and it keeps growing while the receiver
//! runs.

use std::{
    io::{self, BufRead, Read},
    thread,
    time::Duration,
};

use log::warn;
use quick_xml::{Reader, events::Event};

use crate::{
    metadata::{error::SourceError, item::RawItem},
    shutdown::Shutdown,
};

#[derive(Debug, Clone, Copy)]
enum Field {
    Type,
    Code,
    Length,
    Data,
}

pub struct ItemReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> ItemReader<R> {
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Bytes consumed from the underlying stream so far.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// Reads up to the next complete `<item>`. Returns `Ok(None)` at end of
    /// stream.
    ///
    /// Items whose `<length>` is not an integer are logged and skipped.
    pub fn next_item(&mut self) -> Result<Option<RawItem>, SourceError> {
        let mut item: Option<RawItem> = None;
        let mut field: Option<Field> = None;
        let mut bad_length: Option<String> = None;

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => {
                    field = match e.name().as_ref() {
                        b"item" => {
                            item = Some(RawItem::default());
                            bad_length = None;
                            None
                        }
                        b"type" => Some(Field::Type),
                        b"code" => Some(Field::Code),
                        b"length" => Some(Field::Length),
                        b"data" => Some(Field::Data),
                        _ => None,
                    };
                }
                Event::Text(e) => {
                    let (Some(current), Some(field)) = (item.as_mut(), field) else {
                        continue;
                    };
                    let text = e.decode().map_err(|err| {
                        SourceError::Io(io::Error::new(io::ErrorKind::InvalidData, err))
                    })?;
                    match field {
                        Field::Type => current.item_type.push_str(&text),
                        Field::Code => current.code.push_str(&text),
                        Field::Data => current.data.push_str(&text),
                        Field::Length => match text.trim().parse() {
                            Ok(length) => current.length = length,
                            Err(_) => bad_length = Some(text.into_owned()),
                        },
                    }
                }
                Event::End(e) => {
                    if e.name().as_ref() != b"item" {
                        field = None;
                        continue;
                    }
                    let Some(done) = item.take() else {
                        continue;
                    };
                    if let Some(length) = bad_length.take() {
                        warn!("Skipping item {}/{}: bad length {length:?}", done.item_type, done.code);
                        continue;
                    }
                    return Ok(Some(done));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for ItemReader<R> {
    type Item = Result<RawItem, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_item().transpose()
    }
}

/// Reader that waits for more data at end of file instead of reporting EOF,
/// until shutdown is requested.
pub struct FollowReader<R> {
    inner: R,
    follow: bool,
    poll_interval: Duration,
    shutdown: Shutdown,
}

impl<R: Read> FollowReader<R> {
    pub fn new(inner: R, follow: bool, poll_interval: Duration, shutdown: Shutdown) -> Self {
        Self {
            inner,
            follow,
            poll_interval,
            shutdown,
        }
    }
}

impl<R: Read> Read for FollowReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = self.inner.read(buf)?;
            if n > 0 || !self.follow || self.shutdown.is_triggered() {
                return Ok(n);
            }
            thread::sleep(self.poll_interval);
        }
    }
}
