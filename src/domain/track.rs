use std::fmt;

/// Represent a track announced by the sender.
///
/// A zero-valued track (see [`Track::stopped`]) is the marker for
/// "playback stopped".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    pub artist: String,
    pub album: String,
    pub name: String,
    pub composer: String,
    pub genre: String,
    /// Persistent item id (`mper`), used to detect repeated announcements.
    pub id: u64,
    /// Duration in milliseconds (`astm`).
    pub time: u32,
}

impl Track {
    pub fn stopped() -> Self {
        Self::default()
    }

    pub fn is_stopped(&self) -> bool {
        *self == Self::default()
    }

    /// One-line description, optionally including the album name.
    pub fn describe(&self, show_album: bool) -> String {
        if show_album {
            format!("{} - {} - {}", self.artist, self.album, self.name)
        } else {
            format!("{} - {}", self.artist, self.name)
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe(true))
    }
}
