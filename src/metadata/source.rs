use std::{
    fs::File,
    io::BufReader,
    path::PathBuf,
    sync::mpsc::SyncSender,
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{error, info, warn};

use crate::{
    domain::{ports::TrackSource, track::Track},
    metadata::{
        error::SourceError,
        pipeline::Pipeline,
        reader::{FollowReader, ItemReader},
    },
    remote::worker::RemoteHandle,
    shutdown::Shutdown,
};

/// Reads the XML metadata pipe or file written by the receiver.
pub struct FileSource {
    path: PathBuf,
    follow: bool,
    poll_interval: Duration,
    remote: RemoteHandle,
}

impl FileSource {
    pub fn new(path: PathBuf, follow: bool, poll_interval: Duration, remote: RemoteHandle) -> Self {
        Self {
            path,
            follow,
            poll_interval,
            remote,
        }
    }
}

impl TrackSource for FileSource {
    fn start(
        self: Box<Self>,
        tracks: SyncSender<Track>,
        shutdown: Shutdown,
    ) -> anyhow::Result<JoinHandle<()>> {
        let file = File::open(&self.path).map_err(|source| SourceError::Open {
            path: self.path.to_string_lossy().into_owned(),
            source,
        })?;
        info!("Reading metadata from {}", self.path.to_string_lossy());

        let reader = FollowReader::new(file, self.follow, self.poll_interval, shutdown.clone());
        let items = ItemReader::new(BufReader::new(reader));
        let pipeline = Pipeline::new(tracks, self.remote);

        Ok(thread::spawn(move || {
            if let Err(e) = pump(items, pipeline, &shutdown) {
                error!("Metadata source failed: {e}");
            }
        }))
    }
}

/// Decodes and handles items in document order until end of stream,
/// shutdown, or the track consumer going away. Bad items and ill-formed
/// records are skipped.
fn pump<R: std::io::BufRead>(
    mut items: ItemReader<R>,
    mut pipeline: Pipeline,
    shutdown: &Shutdown,
) -> Result<(), SourceError> {
    let mut last_error_at = None;
    loop {
        let raw = match items.next_item() {
            Ok(Some(raw)) => raw,
            Ok(None) => break,
            Err(SourceError::Xml(e)) => {
                let at = items.position();
                // no progress since the previous error
                if last_error_at == Some(at) {
                    return Err(SourceError::Xml(e));
                }
                last_error_at = Some(at);
                warn!("Skipping ill-formed record near byte {at}: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };
        if shutdown.is_triggered() {
            break;
        }
        match raw.decode() {
            Ok(item) => {
                if !pipeline.feed(&item) {
                    break;
                }
            }
            Err(e) => warn!("Invalid item: {e}"),
        }
    }
    info!("No more metadata");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        sync::mpsc,
        time::Instant,
    };

    use tempfile::NamedTempFile;

    use super::*;
    use crate::remote::{session::SessionEvent, worker::Request};

    fn item(item_type: &str, code: &str, payload: &[u8]) -> String {
        use base64::{Engine as _, engine::general_purpose};

        format!(
            "<item><type>{}</type><code>{}</code><length>{}</length>\n<data encoding=\"base64\">\n{}</data></item>\n",
            hex::encode(item_type),
            hex::encode(code),
            payload.len(),
            general_purpose::STANDARD.encode(payload)
        )
    }

    fn start(xml: &str) -> anyhow::Result<(mpsc::Receiver<Track>, mpsc::Receiver<Request>, JoinHandle<()>)> {
        let mut file = NamedTempFile::new()?;
        file.write_all(xml.as_bytes())?;
        file.flush()?;

        let (tracks_tx, tracks_rx) = mpsc::sync_channel(0);
        let (remote_tx, remote_rx) = mpsc::channel();
        let source = FileSource::new(
            file.path().to_path_buf(),
            false,
            Duration::from_millis(10),
            RemoteHandle::from_sender(remote_tx),
        );
        let join = Box::new(source).start(tracks_tx, Shutdown::new())?;
        // the opened handle stays valid after the temp path is removed
        drop(file);
        Ok((tracks_rx, remote_rx, join))
    }

    #[test]
    fn test_file_source_emits_tracks_and_stop() -> anyhow::Result<()> {
        let xml = [
            item("ssnc", "mdst", b""),
            item("core", "asar", b"Artist"),
            item("core", "minm", b"Song A"),
            item("core", "mper", &1u64.to_be_bytes()),
            item("ssnc", "mden", b""),
            // same track reported again
            item("ssnc", "mdst", b""),
            item("core", "mper", &1u64.to_be_bytes()),
            item("ssnc", "mden", b""),
            item("ssnc", "pend", b""),
        ]
        .concat();

        let (tracks, _remote, join) = start(&xml)?;
        let received: Vec<Track> = tracks.iter().collect();
        join.join().unwrap();

        assert_eq!(
            received,
            vec![
                Track {
                    artist: "Artist".into(),
                    name: "Song A".into(),
                    id: 1,
                    ..Default::default()
                },
                Track::stopped(),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_bad_item_does_not_stop_the_stream() -> anyhow::Result<()> {
        let xml = [
            item("ssnc", "mdst", b""),
            "<item><type>zz</type><code>6d696e6d</code><length>1</length><data>QQ==</data></item>\n"
                .to_string(),
            "<item><type>636f7265</type><code>6d696e6d</code><length>9</length><data>QQ==</data></item>\n"
                .to_string(),
            item("core", "minm", b"Kept"),
            item("core", "mper", &2u64.to_be_bytes()),
            item("ssnc", "mden", b""),
        ]
        .concat();

        let (tracks, _remote, join) = start(&xml)?;
        let received: Vec<Track> = tracks.iter().collect();
        join.join().unwrap();

        assert_eq!(received.len(), 1);
        assert_eq!(received[0].name, "Kept");
        Ok(())
    }

    #[test]
    fn test_session_details_reach_remote_worker() -> anyhow::Result<()> {
        let xml = [
            item("ssnc", "daid", b"ABCDEF"),
            item("ssnc", "acre", b"1234"),
            item("ssnc", "dapo", b"3689"),
        ]
        .concat();

        let (_tracks, remote, join) = start(&xml)?;
        join.join().unwrap();

        let events: Vec<SessionEvent> = remote
            .try_iter()
            .filter_map(|request| match request {
                Request::Session { event, .. } => Some(event),
                _ => None,
            })
            .collect();
        assert_eq!(
            events,
            vec![
                SessionEvent::DacpId("ABCDEF".into()),
                SessionEvent::ActiveRemote("1234".into()),
                SessionEvent::Port("3689".into()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_ill_formed_record_does_not_stop_the_stream() -> anyhow::Result<()> {
        let xml = [
            item("ssnc", "mdst", b""),
            "<item><type>636f7265</type><code>6d696e6d</typo><length>1</length><data>QQ==</data></item>\n"
                .to_string(),
            item("core", "minm", b"Song A"),
            item("core", "mper", &1u64.to_be_bytes()),
            item("ssnc", "mden", b""),
        ]
        .concat();

        let (tracks, _remote, join) = start(&xml)?;
        let received: Vec<Track> = tracks.iter().collect();
        join.join().unwrap();

        assert_eq!(received.len(), 1);
        assert_eq!(received[0].name, "Song A");
        assert_eq!(received[0].id, 1);
        Ok(())
    }

    #[test]
    fn test_follows_a_growing_file() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        let (tracks_tx, tracks_rx) = mpsc::sync_channel(0);
        let (remote_tx, _remote_rx) = mpsc::channel();
        let shutdown = Shutdown::new();
        let source = FileSource::new(
            file.path().to_path_buf(),
            true,
            Duration::from_millis(10),
            RemoteHandle::from_sender(remote_tx),
        );
        let join = Box::new(source).start(tracks_tx, shutdown.clone())?;

        let xml = [
            item("ssnc", "mdst", b""),
            item("core", "minm", b"Tail"),
            item("core", "mper", &7u64.to_be_bytes()),
            item("ssnc", "mden", b""),
        ]
        .concat();
        let (head, tail) = xml.split_at(xml.len() / 2);

        file.write_all(head.as_bytes())?;
        file.flush()?;
        thread::sleep(Duration::from_millis(50));
        assert!(tracks_rx.try_recv().is_err());

        file.write_all(tail.as_bytes())?;
        file.flush()?;
        let track = tracks_rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(track.name, "Tail");
        assert_eq!(track.id, 7);

        shutdown.trigger();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !join.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(join.is_finished());
        Ok(())
    }

    #[test]
    fn test_missing_file_fails_to_start() {
        let (tracks_tx, _tracks_rx) = mpsc::sync_channel(0);
        let (remote_tx, _remote_rx) = mpsc::channel();
        let source = FileSource::new(
            PathBuf::from("/nonexistent/airdeck/metadata"),
            false,
            Duration::from_millis(10),
            RemoteHandle::from_sender(remote_tx),
        );

        let err = Box::new(source)
            .start(tracks_tx, Shutdown::new())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::Open { .. })
        ));
    }
}
