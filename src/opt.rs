use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[clap(
    name = "snemo-topology",
    about = "Build the topology pattern of an event and apply selection cuts"
)]
pub struct Opt {
    /// Verbosity level: 'off', 'error', 'warn', 'info', 'debug', 'trace'
    #[clap(short, long, default_value = "info")]
    pub verbosity: String,

    /// Configuration file with 'topology' and 'cuts' sections
    #[clap(short, long)]
    pub config: PathBuf,

    /// Event file with the particle tracks
    pub event: PathBuf,
}
