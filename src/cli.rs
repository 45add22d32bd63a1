use std::path::PathBuf;

use clap::{CommandFactory, Parser};

use crate::config::DEFAULT_CONFIG_PATH;

/// Flushes all caches for a company or all companies
#[derive(Parser, Clone, Debug)]
#[command(name = "cache-flush-all", version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// The abbreviation of the company
    pub company: Option<String>,

    /// All companies
    #[arg(short, long, default_value_t = false)]
    pub all: bool,

    /// Path of the YAML config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH, env = "CACHE_FLUSH_CONFIG")]
    pub config: PathBuf,
}

/// What an invocation asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Neither or both of `company` and `--all` given
    Usage,
    All,
    Single(String),
}

impl Mode {
    /// An empty company is treated as absent
    pub fn from_args(company: Option<String>, all: bool) -> Self {
        let company = company.filter(|c| !c.is_empty());
        match (company, all) {
            (None, true) => Mode::All,
            (Some(company), false) => Mode::Single(company),
            (None, false) | (Some(_), true) => Mode::Usage,
        }
    }
}

impl From<&Args> for Mode {
    fn from(args: &Args) -> Self {
        Mode::from_args(args.company.clone(), args.all)
    }
}

/// Help text of the command
pub fn usage() -> String {
    Args::command().render_help().to_string()
}
