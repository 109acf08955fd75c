use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::roms::{DEFAULT_CONFIG_ROOT, DEFAULT_ROMS_DIR};

/// Environment variable consulted when `--roms-dir` is not given.
pub const ROMS_DIR_ENV: &str = "MBPACK_ROMS_DIR";
/// Environment variable consulted when `--config-root` is not given.
pub const CONFIG_ROOT_ENV: &str = "MBPACK_CONFIG_ROOT";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Package an AROMA template directory into a flashable zip.
    #[command(alias = "g")]
    Generate {
        /// Directory containing the installer template tree.
        template_dir: PathBuf,

        /// The path for the output zip.
        output: PathBuf,

        /// Directory whose subdirectories are the installed ROMs. [env: MBPACK_ROMS_DIR]
        #[arg(long)]
        roms_dir: Option<PathBuf>,

        /// Directory holding `<rom id>/config.json` display-name configs. [env: MBPACK_CONFIG_ROOT]
        #[arg(long)]
        config_root: Option<PathBuf>,

        /// Use this ROM id instead of scanning the ROMs directory. May be repeated; order is kept.
        #[arg(long = "rom", value_name = "ID")]
        roms: Vec<String>,
    },

    /// List the contents of a zip without extracting it.
    #[command(alias = "l")]
    List {
        /// The zip file to list contents of.
        #[arg(required = true)]
        archive: PathBuf,
    },
}

/// Resolves a directory option.
///
/// Priority:
/// 1. the command-line value,
/// 2. the environment variable `env_var` if set and non-empty,
/// 3. `default`.
pub fn resolve_dir_from_opt_or_env(opt: Option<PathBuf>, env_var: &str, default: &str) -> PathBuf {
    if let Some(dir) = opt {
        return dir;
    }
    match std::env::var_os(env_var) {
        Some(val) if !val.is_empty() => PathBuf::from(val),
        _ => PathBuf::from(default),
    }
}

pub fn resolve_roms_dir(opt: Option<PathBuf>) -> PathBuf {
    resolve_dir_from_opt_or_env(opt, ROMS_DIR_ENV, DEFAULT_ROMS_DIR)
}

pub fn resolve_config_root(opt: Option<PathBuf>) -> PathBuf {
    resolve_dir_from_opt_or_env(opt, CONFIG_ROOT_ENV, DEFAULT_CONFIG_ROOT)
}

/// Parses command-line arguments using `clap`.
pub fn run() -> Args {
    Args::parse()
}
