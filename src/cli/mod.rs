use anyhow::Context;
use clap::Parser;
use log::info;
use std::{path::PathBuf, sync::mpsc};

use crate::config::{self, Config};
use crate::control::client;
use crate::daemon::{self, ServeOutcome};
use crate::domain::command::COMMANDS;
use crate::output::print::PrintSink;

#[derive(Parser)]
#[command(name = "airdeck")]
#[command(version = "0.1")]
#[command(about = "Shows what a shairport-sync receiver is playing and remote controls the sender")]
#[command(
    long_about = "When no command is given, airdeck runs in server mode and watches for track \
                  metadata. A server must be running to accept a command."
)]
pub struct Cli {
    /// Path to a config TOML file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Control port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to the shairport-sync metadata pipe or file
    #[arg(short, long)]
    pub metadata: Option<PathBuf>,

    /// Receive metadata on this UDP port instead of the pipe
    #[arg(short, long)]
    pub udp_port: Option<u16>,

    /// Display album name
    #[arg(short = 'a', long)]
    pub show_album: bool,

    /// Print a blank line when playback stops
    #[arg(short = 's', long)]
    pub show_playback_stop: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// List accepted commands and their aliases
    #[arg(long)]
    pub list_commands: bool,

    /// Command to send to a running server
    pub command: Option<String>,
}

impl Cli {
    /// File config (or defaults) with flags applied on top.
    pub fn config(&self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            cfg.control.port = port;
        }
        if let Some(path) = &self.metadata {
            cfg.metadata.path = path.clone();
        }
        if self.udp_port.is_some() {
            cfg.metadata.udp_port = self.udp_port;
        }
        cfg.display.show_album |= self.show_album;
        cfg.display.show_playback_stop |= self.show_playback_stop;
        Ok(cfg)
    }
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if cli.list_commands {
        print_commands();
        return Ok(());
    }

    let cfg = cli.config()?;

    match &cli.command {
        None => {
            info!("On air");
            let sink = PrintSink::stdout(cfg.display.show_album, cfg.display.show_playback_stop);

            let (stop_tx, stop_rx) = mpsc::channel();
            ctrlc::set_handler(move || {
                let _ = stop_tx.send(());
            })
            .context("Failed to install signal handler")?;

            match daemon::serve(&cfg, Box::new(sink), stop_rx)? {
                ServeOutcome::Stopped => {}
                ServeOutcome::AlreadyRunning => println!(
                    "airdeck is already running on port {}",
                    cfg.control.port
                ),
            }
        }

        Some(command) => {
            if let Some(reply) = client::request(cfg.control.addr(), command)? {
                println!("{reply}");
            }
        }
    }

    Ok(())
}

fn print_commands() {
    println!("COMMANDS (default port {})", config::DEFAULT_PORT);
    for command in COMMANDS {
        let names: Vec<&str> = command.aliases().chain([command.name()]).collect();
        println!("  {}", names.join(", "));
    }
}
