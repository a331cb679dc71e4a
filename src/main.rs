use crate::cli::run;

pub mod cli;
mod config;
pub mod control;
mod daemon;
pub mod domain;
pub mod metadata;
pub mod output;
pub mod remote;
mod shutdown;

fn main() -> anyhow::Result<()> {
    run()
}
