//! Answers `display` requests with the last announced track.

use std::{
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::domain::track::Track;

pub const NOTHING_PLAYING: &str = "Nothing playing";

enum Request {
    Update(Track),
    Describe(mpsc::SyncSender<String>),
}

pub struct NowPlaying {
    track: Track,
    show_album: bool,
}

#[derive(Clone)]
pub struct NowPlayingHandle {
    requests: Sender<Request>,
}

impl NowPlaying {
    pub fn new(show_album: bool) -> Self {
        Self {
            track: Track::stopped(),
            show_album,
        }
    }

    pub fn describe(&self) -> String {
        if self.track.is_stopped() {
            NOTHING_PLAYING.to_string()
        } else {
            self.track.describe(self.show_album)
        }
    }

    pub fn spawn(self) -> (NowPlayingHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel();
        let join = thread::spawn(move || self.run(rx));
        (NowPlayingHandle { requests: tx }, join)
    }

    fn run(mut self, requests: Receiver<Request>) {
        for request in requests {
            match request {
                Request::Update(track) => self.track = track,
                Request::Describe(reply) => {
                    let _ = reply.send(self.describe());
                }
            }
        }
    }
}

impl NowPlayingHandle {
    pub fn update(&self, track: Track) {
        let _ = self.requests.send(Request::Update(track));
    }

    /// `None` if the state thread is gone or does not answer in time.
    pub fn describe_timeout(&self, timeout: Duration) -> Option<String> {
        let (reply, response) = mpsc::sync_channel(1);
        self.requests.send(Request::Describe(reply)).ok()?;
        response.recv_timeout(timeout).ok()
    }
}
