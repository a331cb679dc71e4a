//! Where tracks end up once assembled.

pub mod now_playing;
pub mod print;

use std::{
    sync::mpsc::Receiver,
    thread::{self, JoinHandle},
};

use log::debug;

use crate::{
    domain::{ports::TrackSink, track::Track},
    output::now_playing::NowPlayingHandle,
};

/// Runs the sink on its own thread, keeping the `display` state current.
/// Ends when the source side of `tracks` is dropped.
pub fn spawn_sink(
    tracks: Receiver<Track>,
    mut sink: Box<dyn TrackSink>,
    now_playing: NowPlayingHandle,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for track in tracks {
            now_playing.update(track.clone());
            sink.handle_track(&track);
        }
        debug!("Track sink stopped");
    })
}
