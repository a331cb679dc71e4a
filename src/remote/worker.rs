//! Owns the [`RemoteSession`] and serializes everything that touches it.
//!
//! Session updates from the metadata thread, located hosts from lookup
//! threads and commands from control connections all arrive as messages on
//! one channel, so the session is never shared between threads.

use std::{
    net::IpAddr,
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender},
    },
    thread::{self, JoinHandle},
};

use log::{debug, warn};

use crate::{
    domain::{command::Command, ports::PlaybackControl},
    remote::{
        dacp::DacpForwarder,
        error::ControlError,
        locator::RemoteLocator,
        session::{RemoteSession, SessionEvent},
    },
};

pub(crate) enum Request {
    Session {
        event: SessionEvent,
        /// Where a lookup triggered by this event reports back.
        handle: RemoteHandle,
    },
    LookupDone {
        dacp_id: String,
        host: Option<IpAddr>,
    },
    Command {
        command: Command,
        reply: mpsc::SyncSender<Result<(), ControlError>>,
    },
}

/// Cloneable entry point to the remote-control worker.
#[derive(Clone)]
pub struct RemoteHandle {
    requests: Sender<Request>,
}

impl RemoteHandle {
    pub(crate) fn from_sender(requests: Sender<Request>) -> Self {
        Self { requests }
    }

    /// Never blocks; lookups run on their own thread.
    pub fn update(&self, event: SessionEvent) {
        let request = Request::Session {
            event,
            handle: self.clone(),
        };
        if self.requests.send(request).is_err() {
            warn!("Remote control worker stopped, dropping session update");
        }
    }
}

impl PlaybackControl for RemoteHandle {
    fn send(&self, command: Command) -> Result<(), ControlError> {
        let (reply, response) = mpsc::sync_channel(1);
        self.requests
            .send(Request::Command { command, reply })
            .map_err(|_| ControlError::Unavailable)?;
        response.recv().map_err(|_| ControlError::Unavailable)?
    }
}

pub struct RemoteWorker {
    session: RemoteSession,
    forwarder: DacpForwarder,
    locator: Arc<dyn RemoteLocator>,
    /// DACP id with a lookup still running.
    lookup: Option<String>,
}

impl RemoteWorker {
    pub fn new(forwarder: DacpForwarder, locator: Arc<dyn RemoteLocator>) -> Self {
        Self {
            session: RemoteSession::default(),
            forwarder,
            locator,
            lookup: None,
        }
    }

    /// Starts the worker thread. It exits once every handle is dropped.
    pub fn spawn(self) -> (RemoteHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel();
        let join = thread::spawn(move || self.run(rx));
        (RemoteHandle::from_sender(tx), join)
    }

    fn run(mut self, requests: Receiver<Request>) {
        for request in requests {
            self.handle(request);
        }
        debug!("Remote control worker stopped");
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Session { event, handle } => {
                if self.session.apply(event) {
                    if let Some(dacp_id) = self.session.dacp_id.clone() {
                        self.start_lookup(dacp_id, handle);
                    }
                }
            }
            Request::LookupDone { dacp_id, host } => {
                if self.lookup.as_deref() == Some(dacp_id.as_str()) {
                    self.lookup = None;
                }
                if let Some(host) = host {
                    if !self.session.located(&dacp_id, host) {
                        debug!("Dropping stale location {host} for {dacp_id}");
                    }
                }
            }
            Request::Command { command, reply } => {
                let result = self.forwarder.forward(&self.session, command);
                let _ = reply.send(result);
            }
        }
    }

    fn start_lookup(&mut self, dacp_id: String, handle: RemoteHandle) {
        if self.lookup.as_deref() == Some(dacp_id.as_str()) {
            debug!("Lookup for {dacp_id} already running");
            return;
        }
        self.lookup = Some(dacp_id.clone());

        let locator = Arc::clone(&self.locator);
        thread::spawn(move || {
            let host = locator.locate(&dacp_id);
            let _ = handle.requests.send(Request::LookupDone { dacp_id, host });
        });
    }
}
