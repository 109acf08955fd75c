//! Pre-order directory traversal with per-kind callbacks.
//!
//! [`TreeWalker`] visits every node under a root exactly once, directories
//! before their contents, siblings sorted by file name. Each node is classified
//! into a [`NodeKind`] and dispatched to the matching [`Visitor`] hook. Symlinks
//! are never followed.
//!
//! The walk is bracketed by [`Visitor::on_pre_execute`] and
//! [`Visitor::on_post_execute`]. The post hook runs whenever the pre hook
//! succeeded, including after a fatal error in the middle of the tree.

use std::fs::FileType;
use std::path::{Component, Path, PathBuf};

use tracing::{error, warn};
use walkdir::{DirEntry, WalkDir};

use crate::ArchiverError;

/// What the walker should do after a node was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep going.
    Continue,
    /// Ignore this node without failing. For a directory, its subtree is
    /// not descended into.
    Skip,
    /// Stop the walk and report failure.
    Abort,
}

/// Node types the zip format cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKind {
    CharDevice,
    BlockDevice,
    Fifo,
    Socket,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
    Symlink,
    Special(SpecialKind),
}

impl NodeKind {
    fn from_file_type(ft: FileType) -> Self {
        if ft.is_symlink() {
            NodeKind::Symlink
        } else if ft.is_dir() {
            NodeKind::Directory
        } else if ft.is_file() {
            NodeKind::File
        } else {
            NodeKind::Special(special_kind(ft))
        }
    }
}

#[cfg(unix)]
fn special_kind(ft: FileType) -> SpecialKind {
    use std::os::unix::fs::FileTypeExt;

    if ft.is_char_device() {
        SpecialKind::CharDevice
    } else if ft.is_block_device() {
        SpecialKind::BlockDevice
    } else if ft.is_fifo() {
        SpecialKind::Fifo
    } else if ft.is_socket() {
        SpecialKind::Socket
    } else {
        SpecialKind::Unknown
    }
}

#[cfg(not(unix))]
fn special_kind(_ft: FileType) -> SpecialKind {
    SpecialKind::Unknown
}

/// One visited node.
#[derive(Debug, Clone)]
pub struct WalkNode {
    /// Path as reached on disk (root joined with the relative path).
    pub path: PathBuf,
    /// Forward-slash separated path relative to the root; empty for the root.
    pub relative: String,
    pub kind: NodeKind,
    /// 0 for the root.
    pub depth: usize,
}

impl WalkNode {
    fn from_entry(root: &Path, entry: &DirEntry) -> Result<Self, ArchiverError> {
        let rel = entry.path().strip_prefix(root).map_err(|_| ArchiverError::StripPrefix {
            prefix: root.to_path_buf(),
            path: entry.path().to_path_buf(),
        })?;

        // The root is descended into even when it is reached through a symlink.
        let kind = if entry.depth() == 0 && entry.path().is_dir() {
            NodeKind::Directory
        } else {
            NodeKind::from_file_type(entry.file_type())
        };

        Ok(Self {
            path: entry.path().to_path_buf(),
            relative: to_slash_path(rel)?,
            kind,
            depth: entry.depth(),
        })
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }
}

/// Joins the normal components of `path` with `/`. Member names must be UTF-8;
/// a lossy conversion could map two distinct files onto one name.
pub fn to_slash_path(path: &Path) -> Result<String, ArchiverError> {
    let parts = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        })
        .map(|s| {
            s.to_str().ok_or_else(|| ArchiverError::InvalidName {
                name: path.to_string_lossy().into_owned(),
                reason: "not valid UTF-8",
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join("/"))
}

/// Callbacks driven by [`TreeWalker::run`].
pub trait Visitor {
    /// Runs before traversal. An error aborts the walk; `on_post_execute`
    /// is then not called.
    fn on_pre_execute(&mut self) -> Result<(), ArchiverError> {
        Ok(())
    }

    /// Runs after traversal with the traversal outcome. An error turns the
    /// overall result into a failure.
    fn on_post_execute(&mut self, success: bool) -> Result<(), ArchiverError> {
        let _ = success;
        Ok(())
    }

    fn on_reached_directory(&mut self, node: &WalkNode) -> Action {
        let _ = node;
        Action::Continue
    }

    fn on_reached_file(&mut self, node: &WalkNode) -> Action;

    fn on_reached_symlink(&mut self, node: &WalkNode) -> Action {
        warn!("Ignoring symlink: {}", node.path.display());
        Action::Skip
    }

    fn on_reached_special_file(&mut self, node: &WalkNode) -> Action {
        warn!("Ignoring special file: {}", node.path.display());
        Action::Skip
    }
}

/// Walks one directory tree.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
}

impl TreeWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs the full lifecycle. Returns `true` only if every handler succeeded
    /// and `on_post_execute` succeeded.
    pub fn run<V: Visitor + ?Sized>(&self, visitor: &mut V) -> bool {
        if let Err(e) = visitor.on_pre_execute() {
            error!("{}", e);
            return false;
        }

        let walked = self.walk(visitor);

        let finished = match visitor.on_post_execute(walked) {
            Ok(()) => true,
            Err(e) => {
                error!("{}", e);
                false
            }
        };

        walked && finished
    }

    fn walk<V: Visitor + ?Sized>(&self, visitor: &mut V) -> bool {
        let mut it = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(next) = it.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(e) => {
                    error!("{}", ArchiverError::from(e));
                    return false;
                }
            };
            let node = match WalkNode::from_entry(&self.root, &entry) {
                Ok(node) => node,
                Err(e) => {
                    error!("{}", e);
                    return false;
                }
            };

            if node.is_root() && node.kind != NodeKind::Directory {
                error!("{}: not a directory", node.path.display());
                return false;
            }

            let action = match node.kind {
                NodeKind::Directory => visitor.on_reached_directory(&node),
                NodeKind::File => visitor.on_reached_file(&node),
                NodeKind::Symlink => visitor.on_reached_symlink(&node),
                NodeKind::Special(_) => visitor.on_reached_special_file(&node),
            };

            match action {
                Action::Continue => {}
                Action::Skip => {
                    if node.kind == NodeKind::Directory {
                        it.skip_current_dir();
                    }
                }
                Action::Abort => return false,
            }
        }

        true
    }
}
