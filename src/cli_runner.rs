//! CLI dispatch shared by the `mbpack` binary: parses arguments, sets up
//! logging and runs the selected command.

use std::error::Error;
use std::path::Path;

use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::archive::list_entries;
use crate::cli::{self, Commands};
use crate::generate::generate_aroma_zip;
use crate::roms::{FsRomCatalog, RomCatalog, StaticRomCatalog};

/// Runs the CLI. `Ok(false)` means the command ran but failed; the details
/// have already been logged.
pub fn run_cli_app() -> Result<bool, Box<dyn Error>> {
    let args = cli::run();
    init_logging(args.verbose, args.quiet);

    match args.command {
        Commands::Generate { template_dir, output, roms_dir, config_root, roms } => {
            let config_root = cli::resolve_config_root(config_root);
            let catalog: Box<dyn RomCatalog> = if roms.is_empty() {
                Box::new(FsRomCatalog::new(cli::resolve_roms_dir(roms_dir), config_root))
            } else {
                Box::new(StaticRomCatalog::new(roms).with_config_root(config_root))
            };

            let ok = generate_aroma_zip(&template_dir, &output, catalog.as_ref());
            if !ok {
                error!("Failed to generate {}", output.display());
            }
            Ok(ok)
        }
        Commands::List { archive } => {
            print_listing(&archive)?;
            Ok(true)
        }
    }
}

fn print_listing(archive: &Path) -> Result<(), Box<dyn Error>> {
    let entries = list_entries(archive)?;

    println!("Archive Index ({} files):", entries.len());
    for entry in entries {
        match entry.mode {
            Some(mode) => println!("- {} ({} bytes, mode {:04o})", entry.name, entry.size, mode),
            None => println!("- {} ({} bytes)", entry.name, entry.size),
        }
    }

    Ok(())
}

/// Logs go to stderr so `list` output stays clean on stdout.
fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
