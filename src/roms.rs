//! Installed ROM discovery and display names.
//!
//! The generator only needs an ordered list of ROM ids and, for each, an
//! optional human readable name. Both come from a [`RomCatalog`] so callers
//! (and tests) can inject a fixed list instead of probing the device.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::ArchiverError;

/// Where installed ROMs live on the device.
pub const DEFAULT_ROMS_DIR: &str = "/data/multiboot";
/// Where per-ROM `config.json` files live on the device.
pub const DEFAULT_CONFIG_ROOT: &str = "/data/media/0/MultiBoot";

/// One ROM as shown in the installer menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomEntry {
    pub id: String,
    /// Display name, or the id when no config provides one.
    pub name: String,
}

/// Read-only lookup of installed ROMs.
pub trait RomCatalog {
    /// Installed ROM ids, in menu order.
    fn installed_roms(&self) -> Result<Vec<String>, ArchiverError>;

    /// Configured display name for `id`, if any.
    fn display_name(&self, id: &str) -> Option<String>;
}

/// Resolves every installed ROM to a [`RomEntry`], falling back to the id
/// when there is no usable display name.
pub fn collect_roms(catalog: &dyn RomCatalog) -> Result<Vec<RomEntry>, ArchiverError> {
    let roms = catalog
        .installed_roms()?
        .into_iter()
        .map(|id| {
            let name = catalog.display_name(&id).unwrap_or_else(|| id.clone());
            RomEntry { id, name }
        })
        .collect();
    Ok(roms)
}

#[derive(Deserialize)]
struct RomConfig {
    #[serde(default)]
    name: Option<String>,
}

/// Path of the config file for `id` under `config_root`.
pub fn config_path(config_root: &Path, id: &str) -> PathBuf {
    config_root.join(id).join("config.json")
}

/// Reads the `name` field of a ROM config. Missing, unreadable or malformed
/// files and empty names all yield `None`.
pub fn load_display_name(config_path: &Path) -> Option<String> {
    let data = match fs::read(config_path) {
        Ok(data) => data,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                debug!("{}: failed to read: {}", config_path.display(), e);
            }
            return None;
        }
    };

    match serde_json::from_slice::<RomConfig>(&data) {
        Ok(config) => config.name.filter(|name| !name.is_empty()),
        Err(e) => {
            debug!("{}: failed to parse: {}", config_path.display(), e);
            None
        }
    }
}

/// Discovers ROMs as the subdirectories of `roms_dir`, sorted by name.
#[derive(Debug, Clone)]
pub struct FsRomCatalog {
    roms_dir: PathBuf,
    config_root: PathBuf,
}

impl FsRomCatalog {
    pub fn new(roms_dir: impl Into<PathBuf>, config_root: impl Into<PathBuf>) -> Self {
        Self { roms_dir: roms_dir.into(), config_root: config_root.into() }
    }
}

impl Default for FsRomCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_ROMS_DIR, DEFAULT_CONFIG_ROOT)
    }
}

impl RomCatalog for FsRomCatalog {
    fn installed_roms(&self) -> Result<Vec<String>, ArchiverError> {
        let dir = match fs::read_dir(&self.roms_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{}: no ROMs installed", self.roms_dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(ArchiverError::io(&self.roms_dir, e)),
        };

        let mut ids = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| ArchiverError::io(&self.roms_dir, e))?;
            let file_type = entry.file_type().map_err(|e| ArchiverError::io(entry.path(), e))?;
            if file_type.is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn display_name(&self, id: &str) -> Option<String> {
        load_display_name(&config_path(&self.config_root, id))
    }
}

/// A fixed list of ROM ids. Names are still looked up under `config_root`
/// when one is set.
#[derive(Debug, Clone, Default)]
pub struct StaticRomCatalog {
    ids: Vec<String>,
    config_root: Option<PathBuf>,
}

impl StaticRomCatalog {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids, config_root: None }
    }

    pub fn with_config_root(mut self, config_root: impl Into<PathBuf>) -> Self {
        self.config_root = Some(config_root.into());
        self
    }
}

impl RomCatalog for StaticRomCatalog {
    fn installed_roms(&self) -> Result<Vec<String>, ArchiverError> {
        Ok(self.ids.clone())
    }

    fn display_name(&self, id: &str) -> Option<String> {
        let root = self.config_root.as_ref()?;
        load_display_name(&config_path(root, id))
    }
}
