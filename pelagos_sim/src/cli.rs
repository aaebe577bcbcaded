// pelagos_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Pelagos: AUV survey ingestion and simulation node.
///
/// Streams a normalized bathymetric submap collection and a simulated
/// vehicle trajectory on the node's output topics.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/survey.toml")]
    pub scenario: PathBuf,

    /// Load simulator-produced submaps from this directory.
    #[arg(long, value_name = "DIR")]
    pub simulation: Option<PathBuf>,

    /// Extract the survey from this raw ground-truth archive.
    #[arg(long, value_name = "FILE")]
    pub original: Option<PathBuf>,

    /// Read a previously serialized collection; FILE contributes its stem,
    /// the fixed ".cereal" extension is appended.
    #[arg(long, value_name = "FILE")]
    pub serialized: Option<PathBuf>,
}
