//! Builds the flashable AROMA zip from a template directory.
//!
//! Every regular file under the template root is stored under its relative
//! path, except the AROMA config template, which is read into memory, rewritten
//! with the installed ROM list and stored under its final name. Symlinks and
//! special files are logged and left out.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::archive::ArchiveBuilder;
use crate::roms::{collect_roms, RomCatalog};
use crate::template::{rewrite, TemplateContext, TOOL_VERSION};
use crate::walk::{Action, TreeWalker, Visitor, WalkNode};
use crate::ArchiverError;

/// Relative path of the config template inside the template directory.
pub const AROMA_TEMPLATE_PATH: &str = "META-INF/com/google/android/aroma-config.in";
/// Relative path the generated config is stored under.
pub const AROMA_CONFIG_PATH: &str = "META-INF/com/google/android/aroma-config";

/// Tree visitor that writes every reached file into one zip.
pub struct AromaGenerator<'a> {
    zip_path: PathBuf,
    catalog: &'a dyn RomCatalog,
    version: String,
    archive: Option<ArchiveBuilder>,
}

impl<'a> AromaGenerator<'a> {
    pub fn new(zip_path: impl Into<PathBuf>, catalog: &'a dyn RomCatalog) -> Self {
        Self {
            zip_path: zip_path.into(),
            catalog,
            version: TOOL_VERSION.to_string(),
            archive: None,
        }
    }

    /// Overrides the version written into the config.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    fn add_aroma_config(&mut self, node: &WalkNode) -> Result<(), ArchiverError> {
        let data = fs::read(&node.path)
            .map_err(|source| ArchiverError::Read { path: node.path.clone(), source })?;

        // the ROM lookup is informational; a failing one leaves the menu empty
        let roms = collect_roms(self.catalog).unwrap_or_else(|e| {
            warn!("Failed to list installed ROMs, generating an empty menu: {}", e);
            Vec::new()
        });
        debug!("Generating {} with {} ROM(s)", AROMA_CONFIG_PATH, roms.len());
        let data = rewrite(&data, &TemplateContext::for_roms(&self.version, &roms));

        self.archive_mut()?.add_bytes(AROMA_CONFIG_PATH, &data)?;
        Ok(())
    }

    fn archive_mut(&mut self) -> Result<&mut ArchiveBuilder, ArchiverError> {
        let path = &self.zip_path;
        self.archive.as_mut().ok_or_else(|| {
            ArchiverError::io(path, std::io::Error::new(std::io::ErrorKind::Other, "archive is not open"))
        })
    }
}

impl Visitor for AromaGenerator<'_> {
    fn on_pre_execute(&mut self) -> Result<(), ArchiverError> {
        self.archive = Some(ArchiveBuilder::open(&self.zip_path)?);
        Ok(())
    }

    fn on_post_execute(&mut self, success: bool) -> Result<(), ArchiverError> {
        let Some(archive) = self.archive.take() else {
            return Ok(());
        };
        let written = archive.entries_written();
        archive.close()?;

        if success {
            info!("{}: wrote {} entries", self.zip_path.display(), written);
        } else {
            warn!("{}: incomplete, {} entries written before failure", self.zip_path.display(), written);
        }
        Ok(())
    }

    fn on_reached_file(&mut self, node: &WalkNode) -> Action {
        debug!("{} -> {}", node.path.display(), node.relative);

        let result = if node.relative == AROMA_TEMPLATE_PATH {
            self.add_aroma_config(node)
        } else {
            self.archive_mut()
                .and_then(|archive| archive.add_path(&node.relative, &node.path))
                .map(|_| ())
        };

        match result {
            Ok(()) => Action::Continue,
            Err(e) => {
                error!("{}", e);
                Action::Abort
            }
        }
    }

    fn on_reached_symlink(&mut self, node: &WalkNode) -> Action {
        warn!("Ignoring symlink when creating zip: {}", node.path.display());
        Action::Skip
    }

    fn on_reached_special_file(&mut self, node: &WalkNode) -> Action {
        warn!("Ignoring special file when creating zip: {}", node.path.display());
        Action::Skip
    }
}

/// Packages `template_dir` into `zip_path`. Returns `true` if every file was
/// stored and the archive was closed cleanly.
pub fn generate_aroma_zip(template_dir: &Path, zip_path: &Path, catalog: &dyn RomCatalog) -> bool {
    let mut generator = AromaGenerator::new(zip_path, catalog);
    TreeWalker::new(template_dir).run(&mut generator)
}
