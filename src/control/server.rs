use std::{
    io::{BufRead, BufReader, ErrorKind, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error, info, warn};

use crate::{
    control::error::ChannelError,
    domain::{command::Command, ports::PlaybackControl},
    output::now_playing::{NOTHING_PLAYING, NowPlayingHandle},
    remote::error::ControlError,
    shutdown::Shutdown,
};

const DISPLAY_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ControlServer {
    listener: TcpListener,
}

/// Running accept loop.
pub struct ServerHandle {
    pub addr: SocketAddr,
    join: JoinHandle<()>,
    shutdown: Shutdown,
}

impl ControlServer {
    /// Binds the control port. An address already in use means another
    /// server instance owns it, reported as [`ChannelError::BindInUse`].
    pub fn bind(addr: SocketAddr) -> Result<Self, ChannelError> {
        match TcpListener::bind(addr) {
            Ok(listener) => Ok(Self { listener }),
            Err(e) if e.kind() == ErrorKind::AddrInUse => Err(ChannelError::BindInUse(addr)),
            Err(e) => Err(ChannelError::Io(e)),
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ChannelError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections on a background thread, one thread per connection.
    pub fn spawn(
        self,
        control: Arc<dyn PlaybackControl>,
        now_playing: NowPlayingHandle,
        shutdown: Shutdown,
    ) -> Result<ServerHandle, ChannelError> {
        let addr = self.local_addr()?;
        info!("Listening on {addr}");

        let accept_shutdown = shutdown.clone();
        let join = thread::spawn(move || {
            self.accept_loop(control, now_playing, accept_shutdown);
        });
        Ok(ServerHandle {
            addr,
            join,
            shutdown,
        })
    }

    fn accept_loop(
        self,
        control: Arc<dyn PlaybackControl>,
        now_playing: NowPlayingHandle,
        shutdown: Shutdown,
    ) {
        for stream in self.listener.incoming() {
            if shutdown.is_triggered() {
                break;
            }
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Error accepting control connection: {e}");
                    break;
                }
            };
            debug!("Connected: {:?}", stream.peer_addr());

            let control = Arc::clone(&control);
            let now_playing = now_playing.clone();
            thread::spawn(move || {
                if let Err(e) = handle_connection(stream, control.as_ref(), &now_playing) {
                    debug!("Control connection closed: {e}");
                }
            });
        }
        debug!("Control listener closed");
    }
}

impl ServerHandle {
    /// Stops accepting and releases the listening socket.
    pub fn stop(self) {
        self.shutdown.trigger();
        // wake the blocking accept
        let _ = TcpStream::connect_timeout(&self.addr, Duration::from_secs(1));
        if self.join.join().is_err() {
            error!("Control listener panicked");
        }
    }
}

/// Reads commands line by line until the peer closes. Invalid commands are
/// logged and the connection stays open.
fn handle_connection(
    stream: TcpStream,
    control: &dyn PlaybackControl,
    now_playing: &NowPlayingHandle,
) -> Result<(), ChannelError> {
    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match Command::resolve(&line) {
            Ok(Command::Display) => {
                let text = now_playing
                    .describe_timeout(DISPLAY_TIMEOUT)
                    .unwrap_or_else(|| NOTHING_PLAYING.to_string());
                writeln!(writer, "{text}")?;
                writer.flush()?;
            }
            Ok(command) => {
                debug!("Received {command}");
                match control.send(command) {
                    Ok(()) => {}
                    Err(e @ ControlError::NotResolved(_)) => warn!("{e}"),
                    Err(e) => error!("Command {command} failed: {e}"),
                }
            }
            Err(e) => warn!("Rejected control line: {e}"),
        }
    }
    Ok(())
}
