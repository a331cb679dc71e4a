use std::io::{self, Write};

use log::warn;

use crate::domain::{ports::TrackSink, track::Track};

/// Prints one line per track, and optionally a blank line when playback
/// stops.
pub struct PrintSink<W: Write + Send = io::Stdout> {
    out: W,
    show_album: bool,
    show_playback_stop: bool,
}

impl PrintSink {
    pub fn stdout(show_album: bool, show_playback_stop: bool) -> Self {
        Self::new(io::stdout(), show_album, show_playback_stop)
    }
}

impl<W: Write + Send> PrintSink<W> {
    pub fn new(out: W, show_album: bool, show_playback_stop: bool) -> Self {
        Self {
            out,
            show_album,
            show_playback_stop,
        }
    }

    fn print(&mut self, track: &Track) -> io::Result<()> {
        if track.is_stopped() {
            if self.show_playback_stop {
                writeln!(self.out)?;
            }
        } else {
            writeln!(self.out, "{}", track.describe(self.show_album))?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send> TrackSink for PrintSink<W> {
    fn handle_track(&mut self, track: &Track) {
        if let Err(e) = self.print(track) {
            warn!("Cannot print track: {e}");
        }
    }
}
