//! Metadata received as UDP datagrams instead of the XML pipe.
//!
//! Each datagram is `type(4) | code(4) | payload`. Large items such as
//! cover art are split into `ssnc`/`chnk` datagrams, which are not needed
//! for track assembly and are skipped.

use std::{
    io::ErrorKind,
    net::UdpSocket,
    sync::mpsc::SyncSender,
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::Context;
use log::{debug, error, info};

use crate::{
    domain::{ports::TrackSource, track::Track},
    metadata::{item::MetadataItem, pipeline::Pipeline},
    remote::worker::RemoteHandle,
    shutdown::Shutdown,
};

const MAX_DATAGRAM: usize = 65_536;

pub struct UdpSource {
    bind_addr: String,
    port: u16,
    poll_interval: Duration,
    remote: RemoteHandle,
}

impl UdpSource {
    pub fn new(bind_addr: &str, port: u16, poll_interval: Duration, remote: RemoteHandle) -> Self {
        Self {
            bind_addr: bind_addr.to_string(),
            port,
            poll_interval,
            remote,
        }
    }
}

impl TrackSource for UdpSource {
    fn start(
        self: Box<Self>,
        tracks: SyncSender<Track>,
        shutdown: Shutdown,
    ) -> anyhow::Result<JoinHandle<()>> {
        let socket = UdpSocket::bind((self.bind_addr.as_str(), self.port))
            .with_context(|| format!("cannot bind metadata port {}", self.port))?;
        socket.set_read_timeout(Some(self.poll_interval))?;
        info!("Receiving metadata on udp {}:{}", self.bind_addr, self.port);

        let mut pipeline = Pipeline::new(tracks, self.remote);
        Ok(thread::spawn(move || {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            while !shutdown.is_triggered() {
                let len = match socket.recv(&mut buf) {
                    Ok(len) => len,
                    Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                        continue;
                    }
                    Err(e) => {
                        error!("Metadata socket failed: {e}");
                        break;
                    }
                };
                let Some(item) = parse_datagram(&buf[..len]) else {
                    continue;
                };
                if !pipeline.feed(&item) {
                    break;
                }
            }
        }))
    }
}

pub fn parse_datagram(data: &[u8]) -> Option<MetadataItem> {
    if data.len() < 8 {
        debug!("Ignoring {} byte datagram", data.len());
        return None;
    }
    let (tags, payload) = data.split_at(8);
    if !tags.iter().all(u8::is_ascii_graphic) {
        debug!("Ignoring datagram with unprintable tags");
        return None;
    }

    // all bytes are ASCII at this point
    let item_type: String = tags[..4].iter().map(|&b| b as char).collect();
    let code: String = tags[4..].iter().map(|&b| b as char).collect();
    if item_type == "ssnc" && code == "chnk" {
        debug!("Skipping chunked item");
        return None;
    }
    Some(MetadataItem::new(&item_type, &code, payload))
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn test_parse_datagram() {
        let item = parse_datagram(b"coreminmSong A").unwrap();
        assert_eq!(item, MetadataItem::new("core", "minm", "Song A"));
    }

    #[test]
    fn test_parse_marker_without_payload() {
        let item = parse_datagram(b"ssncpend").unwrap();
        assert_eq!(item.code, "pend");
        assert!(item.payload.is_empty());
    }

    #[test]
    fn test_rejects_short_and_chunked() {
        assert_eq!(parse_datagram(b"ssnc"), None);
        assert_eq!(parse_datagram(b"ssncchnk\x00\x00\x00\x00"), None);
        assert_eq!(parse_datagram(b"ss\x00cpend"), None);
    }

    #[test]
    fn test_udp_source_emits_track() -> anyhow::Result<()> {
        // find a free port, then hand it to the source
        let port = UdpSocket::bind("127.0.0.1:0")?.local_addr()?.port();

        let (tracks_tx, tracks_rx) = mpsc::sync_channel(0);
        let (remote_tx, _remote_rx) = mpsc::channel();
        let shutdown = Shutdown::new();
        let source = UdpSource::new(
            "127.0.0.1",
            port,
            Duration::from_millis(20),
            RemoteHandle::from_sender(remote_tx),
        );
        let join = Box::new(source).start(tracks_tx, shutdown.clone())?;

        let sender = UdpSocket::bind("127.0.0.1:0")?;
        let mut mper = b"coremper".to_vec();
        mper.extend_from_slice(&3u64.to_be_bytes());
        for datagram in [
            b"ssncmdst".to_vec(),
            b"coreminmOver UDP".to_vec(),
            mper,
            b"ssncmden".to_vec(),
        ] {
            sender.send_to(&datagram, ("127.0.0.1", port))?;
        }

        let track = tracks_rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(track.name, "Over UDP");
        assert_eq!(track.id, 3);

        shutdown.trigger();
        join.join().unwrap();
        Ok(())
    }
}
