use std::sync::mpsc::SyncSender;

use log::debug;

use crate::{
    domain::track::Track,
    metadata::{
        assembler::{Effect, TrackAssembler},
        item::MetadataItem,
    },
    remote::worker::RemoteHandle,
};

/// Routes what the assembler produces: tracks to the sink channel, session
/// details to the remote-control worker.
pub struct Pipeline {
    assembler: TrackAssembler,
    tracks: SyncSender<Track>,
    remote: RemoteHandle,
}

impl Pipeline {
    pub fn new(tracks: SyncSender<Track>, remote: RemoteHandle) -> Self {
        Self {
            assembler: TrackAssembler::new(),
            tracks,
            remote,
        }
    }

    /// Returns `false` once nobody consumes tracks anymore.
    pub fn feed(&mut self, item: &MetadataItem) -> bool {
        match self.assembler.handle(item) {
            Some(Effect::Track(track)) => {
                if self.tracks.send(track).is_err() {
                    debug!("Track consumer is gone ({:?})", self.assembler.state());
                    return false;
                }
            }
            Some(Effect::Session(event)) => self.remote.update(event),
            None => {}
        }
        true
    }
}
