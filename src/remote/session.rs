use std::net::IpAddr;

/// Session detail announced by the receiver in the metadata stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// `daid`: the sender's DACP identifier.
    DacpId(String),
    /// `acre`: token for the `Active-Remote` header.
    ActiveRemote(String),
    /// `dapo`: port of the sender's DACP server.
    Port(String),
}

/// Everything needed to address the current sender's DACP server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSession {
    pub dacp_id: Option<String>,
    pub remote_token: Option<String>,
    pub remote_host: Option<IpAddr>,
    pub remote_port: Option<String>,
}

impl RemoteSession {
    /// Applies an event. Returns `true` when the host has to be located,
    /// i.e. a DACP id arrived and no host is known for it.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::DacpId(id) => {
                if self.dacp_id.as_deref() != Some(id.as_str()) {
                    self.dacp_id = Some(id);
                    self.remote_host = None;
                }
                self.remote_host.is_none()
            }
            SessionEvent::ActiveRemote(token) => {
                self.remote_token = Some(token);
                false
            }
            SessionEvent::Port(port) => {
                self.remote_port = Some(port);
                false
            }
        }
    }

    /// Records a located host. Only the first result for the current DACP
    /// id is kept; late results for a previous sender are dropped.
    pub fn located(&mut self, dacp_id: &str, host: IpAddr) -> bool {
        if self.dacp_id.as_deref() != Some(dacp_id) || self.remote_host.is_some() {
            return false;
        }
        self.remote_host = Some(host);
        true
    }
}

/// mDNS instance name a sender advertises its DACP server under.
pub fn service_name(dacp_id: &str) -> String {
    format!("iTunes_Ctrl_{dacp_id}")
}
