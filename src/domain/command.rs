use std::{fmt, str::FromStr};

use thiserror::Error;

/// Playback operations accepted on the control channel.
///
/// Every variant except [`Command::Display`] maps to a DACP `ctrl-int` verb
/// of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Play,
    Pause,
    PlayPause,
    NextItem,
    PrevItem,
    Stop,
    ShuffleSongs,
    BeginFf,
    BeginRew,
    PlayResume,
    VolumeDown,
    VolumeUp,
    MuteToggle,
    Display,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid command: {0}")]
pub struct InvalidCommand(pub String);

/// Canonical command names, in help order.
pub const COMMANDS: &[Command] = &[
    Command::Display,
    Command::Play,
    Command::Pause,
    Command::PlayPause,
    Command::NextItem,
    Command::PrevItem,
    Command::Stop,
    Command::ShuffleSongs,
    Command::BeginFf,
    Command::BeginRew,
    Command::PlayResume,
    Command::VolumeUp,
    Command::VolumeDown,
    Command::MuteToggle,
];

/// Friendly names resolved before validation.
const ALIASES: &[(&str, Command)] = &[
    ("next", Command::NextItem),
    ("skip", Command::NextItem),
    ("previous", Command::PrevItem),
    ("back", Command::PrevItem),
    ("shuffle", Command::ShuffleSongs),
    ("fastforward", Command::BeginFf),
    ("ff", Command::BeginFf),
    ("rewind", Command::BeginRew),
    ("rew", Command::BeginRew),
    ("up", Command::VolumeUp),
    ("volup", Command::VolumeUp),
    ("down", Command::VolumeDown),
    ("voldown", Command::VolumeDown),
    ("mute", Command::MuteToggle),
];

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::PlayPause => "playpause",
            Command::NextItem => "nextitem",
            Command::PrevItem => "previtem",
            Command::Stop => "stop",
            Command::ShuffleSongs => "shuffle_songs",
            Command::BeginFf => "beginff",
            Command::BeginRew => "beginrew",
            Command::PlayResume => "playresume",
            Command::VolumeDown => "volumedown",
            Command::VolumeUp => "volumeup",
            Command::MuteToggle => "mutetoggle",
            Command::Display => "display",
        }
    }

    pub fn aliases(self) -> impl Iterator<Item = &'static str> {
        ALIASES
            .iter()
            .filter(move |(_, cmd)| *cmd == self)
            .map(|(alias, _)| *alias)
    }

    /// Resolves an alias or canonical name. Surrounding whitespace is ignored,
    /// case is not.
    pub fn resolve(input: &str) -> Result<Self, InvalidCommand> {
        let input = input.trim();
        let name = ALIASES
            .iter()
            .find(|(alias, _)| *alias == input)
            .map(|(_, cmd)| cmd.name())
            .unwrap_or(input);

        COMMANDS
            .iter()
            .copied()
            .find(|cmd| cmd.name() == name)
            .ok_or_else(|| InvalidCommand(input.to_string()))
    }

    /// Whether the server answers this command with a reply line.
    pub fn expects_reply(self) -> bool {
        self == Command::Display
    }
}

impl FromStr for Command {
    type Err = InvalidCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
