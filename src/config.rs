// 🔧 Configuration - CSV locations + logging, shared by both binaries

use crate::data::Dataset;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_REGISTRY_CSV: &str = "cleaned_contractors.csv";
pub const DEFAULT_CONTRACTS_CSV: &str = "Matched_Contracts.csv";

#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    /// Contractor registry CSV
    #[arg(long, env = "LOOKUP_REGISTRY_CSV", default_value = DEFAULT_REGISTRY_CSV)]
    pub registry: PathBuf,

    /// Contracts ledger CSV
    #[arg(long, env = "LOOKUP_CONTRACTS_CSV", default_value = DEFAULT_CONTRACTS_CSV)]
    pub contracts: PathBuf,
}

impl DataArgs {
    pub fn load(&self) -> Result<Dataset> {
        Dataset::load(&self.registry, &self.contracts)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        data: DataArgs,
    }

    #[test]
    fn test_paths_override_defaults() {
        let cli = TestCli::parse_from(["test", "--registry", "/data/reg.csv", "--contracts", "/data/c.csv"]);

        assert_eq!(cli.data.registry, PathBuf::from("/data/reg.csv"));
        assert_eq!(cli.data.contracts, PathBuf::from("/data/c.csv"));
    }
}
