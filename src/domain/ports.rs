//! Capability interfaces wired together at startup.

use std::{sync::mpsc::SyncSender, thread::JoinHandle};

use crate::{
    domain::{command::Command, track::Track},
    remote::error::ControlError,
    shutdown::Shutdown,
};

/// Produces tracks as they are played.
///
/// Sources push a track when it starts and [`Track::stopped`] when playback
/// ends. The channel is a rendezvous channel, so a slow consumer stalls the
/// source instead of losing events.
pub trait TrackSource {
    /// Opens the underlying resource and starts the producing thread.
    ///
    /// Failing to open the resource is returned here, before any thread is
    /// spawned.
    fn start(
        self: Box<Self>,
        tracks: SyncSender<Track>,
        shutdown: Shutdown,
    ) -> anyhow::Result<JoinHandle<()>>;
}

/// Consumes tracks produced by a [`TrackSource`].
pub trait TrackSink: Send {
    fn handle_track(&mut self, track: &Track);
}

/// Forwards playback commands to whatever is playing.
pub trait PlaybackControl: Send + Sync {
    fn send(&self, command: Command) -> Result<(), ControlError>;
}
