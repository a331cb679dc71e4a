//! Builds [`Track`]s out of the item sequence sent between `mdst` and `mden`.

use log::{debug, info, warn};

use crate::{
    domain::track::Track,
    metadata::{
        binary::{be_u8, be_u32, be_u64},
        item::MetadataItem,
    },
    remote::session::SessionEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Assembling,
}

/// What handling one item asks the caller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// A new track started, or [`Track::stopped`] when playback ended.
    Track(Track),
    /// Remote-control details for the current sender.
    Session(SessionEvent),
}

pub struct TrackAssembler {
    state: State,
    track: Track,
    last_id: u64,
}

impl Default for TrackAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackAssembler {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            track: Track::default(),
            last_id: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn handle(&mut self, item: &MetadataItem) -> Option<Effect> {
        match item.code.as_str() {
            "mdst" => {
                debug!("Metadata start");
                self.track = Track::default();
                self.state = State::Assembling;
                None
            }
            "mden" => {
                debug!("Metadata end");
                self.finish()
            }
            "pend" => {
                info!("Play stream end");
                self.last_id = 0;
                self.track = Track::default();
                self.state = State::Idle;
                Some(Effect::Track(Track::stopped()))
            }
            "pbeg" => {
                debug!("Play stream begin");
                None
            }
            "pfls" => {
                debug!("Play stream flush");
                None
            }
            "prsm" => {
                debug!("Play stream resume");
                None
            }
            "asal" => {
                self.track.album = text_field("Album", item);
                None
            }
            "asar" => {
                self.track.artist = text_field("Artist", item);
                None
            }
            "ascp" => {
                self.track.composer = text_field("Composer", item);
                None
            }
            "asgn" => {
                self.track.genre = text_field("Genre", item);
                None
            }
            "minm" => {
                self.track.name = text_field("Name", item);
                None
            }
            "astm" => {
                match be_u32(&item.payload) {
                    Ok(time) => {
                        debug!("Time: {time}");
                        self.track.time = time;
                    }
                    Err(e) => warn!("bad astm: {e}"),
                }
                None
            }
            "mper" => {
                match be_u64(&item.payload) {
                    Ok(id) => {
                        debug!("ID: {id}");
                        self.track.id = id;
                    }
                    Err(e) => warn!("bad mper: {e}"),
                }
                None
            }
            "caps" => {
                match be_u8(&item.payload) {
                    Ok(status) => debug!("Play status: {status}"),
                    Err(e) => warn!("bad caps: {e}"),
                }
                None
            }
            "daid" => {
                let id = text_field("DACP-ID", item);
                Some(Effect::Session(SessionEvent::DacpId(id)))
            }
            "acre" => {
                let token = text_field("Active-Remote token", item);
                Some(Effect::Session(SessionEvent::ActiveRemote(token)))
            }
            "dapo" => {
                let port = text_field("Control port", item);
                Some(Effect::Session(SessionEvent::Port(port)))
            }
            _ => {
                debug!("Unhandled: {} {}", item.item_type, item.code);
                None
            }
        }
    }

    fn finish(&mut self) -> Option<Effect> {
        if self.state != State::Assembling {
            debug!("Metadata end without start, ignoring");
            return None;
        }
        self.state = State::Idle;

        let track = std::mem::take(&mut self.track);
        if track.id == self.last_id {
            debug!("Track {} already announced", track.id);
            return None;
        }
        self.last_id = track.id;
        info!("Now playing: {track}");
        Some(Effect::Track(track))
    }
}

fn text_field(label: &str, item: &MetadataItem) -> String {
    let value = item.text();
    debug!("{label}: {value}");
    value
}
