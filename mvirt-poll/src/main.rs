//! mvirt-poll: replays recorded backend states through the inventory pollers.
//!
//! Useful for checking what a sequence of backend changes looks like to the
//! bulk and legacy listing paths without a live hypervisor.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tabled::Table;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mvirt_poll::PollConfig;

mod replay;

use replay::{Fixture, replay};

#[derive(Parser)]
#[command(name = "mvirt-poll")]
#[command(about = "Replay backend inventory states through the mvirt pollers")]
struct Args {
    /// JSON fixture holding one backend state per tick
    fixture: PathBuf,

    /// Poll config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the legacy split listing even where bulk listing is available
    #[arg(long)]
    force_split: bool,

    /// Also print kinds that did not change
    #[arg(short, long)]
    all: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mvirt_poll=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PollConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PollConfig::default(),
    };
    if args.force_split {
        config.force_split_listing = true;
    }

    let fixture = Fixture::load(&args.fixture)?;
    info!(
        fixture = %args.fixture.display(),
        ticks = fixture.ticks.len(),
        force_split = config.force_split_listing,
        "Replaying fixture"
    );

    let ticks = replay(fixture, config)?;

    for (tick, reports) in ticks.into_iter().enumerate() {
        let rows: Vec<_> = reports
            .into_iter()
            .filter(|r| args.all || r.changed())
            .collect();

        if rows.is_empty() {
            println!("tick {}: no changes", tick);
        } else {
            println!("tick {}:", tick);
            println!("{}", Table::new(rows));
        }
    }

    Ok(())
}
