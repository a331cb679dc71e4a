//! Server mode: wires the metadata source, the sink, the remote-control
//! worker and the control listener together.

use std::sync::{
    Arc,
    mpsc::{self, Receiver},
};

use anyhow::Context;
use log::{info, warn};

use crate::{
    config::Config,
    control::{error::ChannelError, server::ControlServer},
    domain::ports::{TrackSink, TrackSource},
    metadata::{source::FileSource, udp::UdpSource},
    output::{now_playing::NowPlaying, spawn_sink},
    remote::{
        dacp::{DacpForwarder, UreqTransport},
        locator::MdnsLocator,
        worker::{RemoteHandle, RemoteWorker},
    },
    shutdown::Shutdown,
};

#[derive(Debug, PartialEq, Eq)]
pub enum ServeOutcome {
    /// Ran until `stop` fired.
    Stopped,
    /// The control port is held by another instance; nothing was started.
    AlreadyRunning,
}

/// Runs the server until a message arrives on `stop` (or its sender is
/// dropped).
///
/// The control port is bound before anything else so that a second
/// instance backs off without touching the metadata source.
pub fn serve(
    config: &Config,
    sink: Box<dyn TrackSink>,
    stop: Receiver<()>,
) -> anyhow::Result<ServeOutcome> {
    let server = match ControlServer::bind(config.control.addr()) {
        Ok(server) => server,
        Err(ChannelError::BindInUse(addr)) => {
            warn!("Already listening on {addr}");
            return Ok(ServeOutcome::AlreadyRunning);
        }
        Err(e) => return Err(e).context("cannot start control server"),
    };

    let shutdown = Shutdown::new();
    let forwarder = DacpForwarder::new(Box::new(UreqTransport::new(
        config.remote.request_timeout(),
    )));
    let locator = Arc::new(MdnsLocator::new(config.remote.discovery_timeout()));
    let (remote, _remote_join) = RemoteWorker::new(forwarder, locator).spawn();
    let (now_playing, _now_playing_join) = NowPlaying::new(config.display.show_album).spawn();

    let (tracks_tx, tracks_rx) = mpsc::sync_channel(0);
    build_source(config, remote.clone())
        .start(tracks_tx, shutdown.clone())
        .context("cannot start metadata source")?;
    let _sink_join = spawn_sink(tracks_rx, sink, now_playing.clone());

    let listener = server.spawn(Arc::new(remote), now_playing, shutdown.clone())?;

    let _ = stop.recv();
    info!("Shutting down");
    shutdown.trigger();
    listener.stop();
    Ok(ServeOutcome::Stopped)
}

fn build_source(config: &Config, remote: RemoteHandle) -> Box<dyn TrackSource> {
    let metadata = &config.metadata;
    match metadata.udp_port {
        Some(port) => Box::new(UdpSource::new(
            "0.0.0.0",
            port,
            metadata.poll_interval(),
            remote,
        )),
        None => Box::new(FileSource::new(
            metadata.path.clone(),
            metadata.follow,
            metadata.poll_interval(),
            remote,
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{BufRead, BufReader, Write},
        net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream},
        path::PathBuf,
        sync::mpsc,
        thread,
        time::Duration,
    };

    use tempfile::NamedTempFile;

    use super::*;
    use crate::domain::track::Track;

    struct ChannelSink(mpsc::Sender<Track>);

    impl TrackSink for ChannelSink {
        fn handle_track(&mut self, track: &Track) {
            let _ = self.0.send(track.clone());
        }
    }

    fn free_port() -> anyhow::Result<u16> {
        Ok(TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?
            .local_addr()?
            .port())
    }

    fn item(code: &str, payload: &[u8]) -> String {
        use base64::{Engine as _, engine::general_purpose};

        format!(
            "<item><type>{}</type><code>{}</code><length>{}</length><data encoding=\"base64\">{}</data></item>\n",
            hex::encode("core"),
            hex::encode(code),
            payload.len(),
            general_purpose::STANDARD.encode(payload)
        )
    }

    #[test]
    fn test_second_instance_backs_off() -> anyhow::Result<()> {
        let holder = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let mut config = Config::default();
        config.control.port = holder.local_addr()?.port();
        // would be fatal if the source were started
        config.metadata.path = PathBuf::from("/nonexistent/airdeck/metadata");

        let (_stop_tx, stop_rx) = mpsc::channel();
        let (tracks_tx, _tracks_rx) = mpsc::channel();
        let outcome = serve(&config, Box::new(ChannelSink(tracks_tx)), stop_rx)?;

        assert_eq!(outcome, ServeOutcome::AlreadyRunning);
        Ok(())
    }

    #[test]
    fn test_missing_metadata_source_is_fatal() -> anyhow::Result<()> {
        let mut config = Config::default();
        config.control.port = free_port()?;
        config.metadata.path = PathBuf::from("/nonexistent/airdeck/metadata");

        let (_stop_tx, stop_rx) = mpsc::channel();
        let (tracks_tx, _tracks_rx) = mpsc::channel();
        assert!(serve(&config, Box::new(ChannelSink(tracks_tx)), stop_rx).is_err());
        Ok(())
    }

    #[test]
    fn test_serves_tracks_and_display() -> anyhow::Result<()> {
        let mut metadata = NamedTempFile::new()?;
        let xml = [
            item("mdst", b""),
            item("asar", b"Artist"),
            item("minm", b"Song"),
            item("mper", &8u64.to_be_bytes()),
            item("mden", b""),
        ]
        .concat();
        metadata.write_all(xml.as_bytes())?;

        let mut config = Config::default();
        config.control.port = free_port()?;
        config.metadata.path = metadata.path().to_path_buf();
        config.metadata.follow = false;
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.control.port));

        let (stop_tx, stop_rx) = mpsc::channel();
        let (tracks_tx, tracks_rx) = mpsc::channel();
        let server = thread::spawn(move || {
            serve(&config, Box::new(ChannelSink(tracks_tx)), stop_rx)
        });

        let track = tracks_rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(track.name, "Song");
        assert_eq!(track.id, 8);

        // the sink saw the track before display state is queried
        let mut stream = TcpStream::connect(addr)?;
        stream.write_all(b"display\n")?;
        let mut reply = String::new();
        BufReader::new(&stream).read_line(&mut reply)?;
        assert_eq!(reply, "Artist - Song\n");

        stop_tx.send(())?;
        assert_eq!(server.join().unwrap()?, ServeOutcome::Stopped);
        Ok(())
    }
}
