use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::constants::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(author, version, about = "Coal-to-solar replacement analysis over eGRID plant data", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, global = true, help = "Scenario config (TOML); built-in defaults when omitted")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, global = true, default_value_t = false, help = "Write outputs into a timestamped subdirectory")]
    timestamped: bool,

    #[arg(short, long, global = true, default_value_t = false, help = "Evaluate TCO chunks in parallel")]
    parallel: bool,

    #[arg(long, global = true, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, global = true, default_value_t = false)]
    debug_logging: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Coal subset, top 20% emitters and social cost of carbon
    Emissions {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// 40-year coal vs solar TCO per coal plant
    Tco {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// CO2 intensity vs PV gain: merged table, filter, correlation and plot
    Opportunity {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, help = "TCO table to join; defaults to the newest one under the output directory")]
        tco_table: Option<PathBuf>,
    },
    /// All three analyses in order
    All {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Write the default scenario config
    InitConfig {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

impl Args {
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn timestamped(&self) -> bool {
        self.timestamped
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "coalswap", "tco", "--input", "plnt23.csv", "--parallel", "-o", "out",
        ])
        .unwrap();
        assert_eq!(args.command(), &Command::Tco { input: PathBuf::from("plnt23.csv") });
        assert!(args.parallel());
        assert_eq!(args.output_dir(), Path::new("out"));
        assert_eq!(args.config(), None);
    }

    #[test]
    fn opportunity_tco_table_is_optional() {
        let args = Args::try_parse_from(["coalswap", "opportunity", "-i", "plnt23.csv"]).unwrap();
        assert_eq!(
            args.command(),
            &Command::Opportunity { input: PathBuf::from("plnt23.csv"), tco_table: None }
        );
    }

    #[test]
    fn init_config_default_path() {
        let args = Args::try_parse_from(["coalswap", "init-config"]).unwrap();
        assert_eq!(args.command(), &Command::InitConfig { path: PathBuf::from(DEFAULT_CONFIG_FILE) });
    }

    #[test]
    fn input_is_required() {
        assert!(Args::try_parse_from(["coalswap", "emissions"]).is_err());
    }
}
