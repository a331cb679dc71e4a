use std::{net::IpAddr, time::Duration};

use log::info;

use crate::{
    domain::command::Command,
    remote::{error::ControlError, session::RemoteSession},
};

/// Minimal HTTP client surface used to talk to the sender.
pub trait HttpTransport: Send {
    /// Issues a GET request and returns the response status. Any HTTP
    /// response counts as success; only failing to get one is an error.
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<u16, String>;
}

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();
        Self { agent }
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<u16, String> {
        let request = headers
            .iter()
            .fold(self.agent.get(url), |req, (name, value)| req.set(name, value));

        match request.call() {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(ureq::Error::Transport(transport)) => Err(transport.to_string()),
        }
    }
}

/// Turns playback commands into DACP `ctrl-int` requests.
pub struct DacpForwarder {
    transport: Box<dyn HttpTransport>,
}

impl DacpForwarder {
    pub fn new(transport: Box<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub fn forward(&self, session: &RemoteSession, command: Command) -> Result<(), ControlError> {
        if command == Command::Display {
            return Err(ControlError::NotForwardable(command));
        }

        let (Some(host), Some(port), Some(token)) = (
            session.remote_host,
            session.remote_port.as_deref(),
            session.remote_token.as_deref(),
        ) else {
            return Err(ControlError::NotResolved(command));
        };

        let url = command_url(host, port, command);
        info!("DACP request: {url}");
        let status = self
            .transport
            .get(&url, &[("Active-Remote", token)])
            .map_err(ControlError::Transport)?;
        info!("DACP response status: {status}");
        Ok(())
    }
}

pub fn command_url(host: IpAddr, port: &str, command: Command) -> String {
    match host {
        IpAddr::V4(ip) => format!("http://{ip}:{port}/ctrl-int/1/{command}"),
        IpAddr::V6(ip) => format!("http://[{ip}]:{port}/ctrl-int/1/{command}"),
    }
}
