use std::{
    io::{BufRead, BufReader, ErrorKind, Write},
    net::{SocketAddr, TcpStream},
};

use log::debug;

use crate::{control::error::ChannelError, domain::command::Command};

/// One-shot connection to a running server.
pub struct ControlClient {
    stream: TcpStream,
}

impl ControlClient {
    pub fn connect(addr: SocketAddr) -> Result<Self, ChannelError> {
        match TcpStream::connect(addr) {
            Ok(stream) => {
                debug!("Connected to {addr}");
                Ok(Self { stream })
            }
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                Err(ChannelError::ConnectionRefused(addr))
            }
            Err(e) => Err(ChannelError::Io(e)),
        }
    }

    /// Sends one canonical command line. Returns the reply line for
    /// commands that have one.
    pub fn send(&mut self, command: Command) -> Result<Option<String>, ChannelError> {
        writeln!(self.stream, "{command}")?;
        self.stream.flush()?;

        if !command.expects_reply() {
            return Ok(None);
        }
        let mut reply = String::new();
        BufReader::new(&self.stream).read_line(&mut reply)?;
        Ok(Some(reply.trim_end().to_string()))
    }
}

/// Resolves `input` and sends it to the server at `addr`. An unrecognized
/// command fails before any connection is made.
pub fn request(addr: SocketAddr, input: &str) -> Result<Option<String>, ChannelError> {
    let command = Command::resolve(input)?;
    ControlClient::connect(addr)?.send(command)
}

#[cfg(test)]
mod tests {
    use std::{
        io::Read,
        net::{Ipv4Addr, TcpListener},
        thread,
    };

    use super::*;

    fn listener() -> anyhow::Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let addr = listener.local_addr()?;
        Ok((listener, addr))
    }

    /// Sends `input` and returns the bytes the server saw once the client
    /// closed.
    fn wire_bytes(input: &str) -> anyhow::Result<String> {
        let (listener, addr) = listener()?;
        let server = thread::spawn(move || -> std::io::Result<String> {
            let (mut stream, _) = listener.accept()?;
            let mut received = String::new();
            stream.read_to_string(&mut received)?;
            Ok(received)
        });

        assert!(request(addr, input)?.is_none());
        Ok(server.join().unwrap()?)
    }

    #[test]
    fn test_alias_goes_out_canonical() -> anyhow::Result<()> {
        let via_alias = wire_bytes("skip")?;
        let via_name = wire_bytes("nextitem")?;

        assert_eq!(via_alias, "nextitem\n");
        assert_eq!(via_alias, via_name);
        Ok(())
    }

    #[test]
    fn test_invalid_command_never_connects() -> anyhow::Result<()> {
        let (listener, addr) = listener()?;
        listener.set_nonblocking(true)?;

        let result = request(addr, "bogus");

        assert!(matches!(result, Err(ChannelError::InvalidCommand(_))));
        assert!(matches!(
            listener.accept(),
            Err(e) if e.kind() == ErrorKind::WouldBlock
        ));
        Ok(())
    }

    #[test]
    fn test_invalid_command_without_server() -> anyhow::Result<()> {
        let (listener, addr) = listener()?;
        drop(listener);

        assert!(matches!(
            request(addr, "bogus"),
            Err(ChannelError::InvalidCommand(_))
        ));
        Ok(())
    }

    #[test]
    fn test_display_reads_reply() -> anyhow::Result<()> {
        let (listener, addr) = listener()?;
        let server = thread::spawn(move || -> std::io::Result<String> {
            let (stream, _) = listener.accept()?;
            let mut line = String::new();
            BufReader::new(&stream).read_line(&mut line)?;
            (&stream).write_all(b"Artist - Song\r\n")?;
            Ok(line)
        });

        let reply = request(addr, "display")?;

        assert_eq!(reply.as_deref(), Some("Artist - Song"));
        assert_eq!(server.join().unwrap()?, "display\n");
        Ok(())
    }

    #[test]
    fn test_no_server_is_connection_refused() -> anyhow::Result<()> {
        // grab a free port and release it again
        let (listener, addr) = listener()?;
        drop(listener);

        assert!(matches!(
            ControlClient::connect(addr),
            Err(ChannelError::ConnectionRefused(a)) if a == addr
        ));
        Ok(())
    }
}
