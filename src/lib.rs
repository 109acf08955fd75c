//! # mbpack Core Library
//!
//! This crate packages an AROMA installer template directory into a flashable
//! zip. The tree is copied verbatim except for the AROMA config template, which
//! is rewritten with the list of installed ROMs before being stored.
//!
//! ## Key Modules
//!
//! - [`walk`]: Pre-order directory traversal with per-node-kind callbacks.
//! - [`archive`]: Writes deflated zip members, choosing zip64 per member.
//! - [`template`]: Literal placeholder substitution for the AROMA config.
//! - [`roms`]: Injected lookup of installed ROMs and their display names.
//! - [`generate`]: Ties the three together.
//!
//! ## Examples
//!
//! ```no_run
//! use mbpack::generate::generate_aroma_zip;
//! use mbpack::roms::StaticRomCatalog;
//! use std::path::Path;
//!
//! let catalog = StaticRomCatalog::new(vec!["primary".into(), "dual".into()]);
//! let ok = generate_aroma_zip(Path::new("aroma-template"), Path::new("out.zip"), &catalog);
//! assert!(ok);
//! ```

pub mod archive;
pub mod cli;
pub mod cli_runner;
pub mod common;
pub mod error;
pub use error::ArchiverError;

pub mod generate;
pub mod roms;
pub mod template;
pub mod walk;

// Cross-platform filesystem wrapper
pub mod fsx;
