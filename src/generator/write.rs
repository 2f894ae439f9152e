use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::artifact::{Artifact, MutationPolicy};
use super::markers::{merge, MarkedDocument};
use super::templates::{RenderContext, TemplateRegistry};
use crate::error::ScaffoldError;

/// What happened to one destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    /// Rendered content matched the file on disk; nothing was written.
    Unchanged,
    /// The file exists and its policy leaves it to the user.
    Skipped,
}

impl WriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Created => "created",
            WriteOutcome::Updated => "updated",
            WriteOutcome::Unchanged => "unchanged",
            WriteOutcome::Skipped => "skipped",
        }
    }
}

/// A scaffolded destination and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaffolded {
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

/// Renders artifacts and applies them to disk under their mutation policy.
#[derive(Debug)]
pub struct Scaffolder<'a> {
    registry: &'a TemplateRegistry,
    force: bool,
    dry_run: bool,
}

impl<'a> Scaffolder<'a> {
    pub fn new(registry: &'a TemplateRegistry, force: bool, dry_run: bool) -> Self {
        Self {
            registry,
            force,
            dry_run,
        }
    }

    /// Scaffold one artifact.
    ///
    /// On error the destination is left as it was: content is staged in a
    /// temporary file next to the destination and renamed into place.
    pub fn scaffold(
        &self,
        artifact: &Artifact,
        ctx: &RenderContext,
    ) -> Result<Scaffolded, ScaffoldError> {
        let path = &artifact.destination;
        let exists = path.exists();

        match artifact.policy {
            MutationPolicy::SkipIfExists if exists => {
                debug!(path = %path.display(), "exists, leaving user-owned file alone");
                return Ok(Scaffolded {
                    path: path.clone(),
                    outcome: WriteOutcome::Skipped,
                });
            }
            MutationPolicy::OverwriteErrorUnlessForced if exists && !self.force => {
                return Err(ScaffoldError::DestinationExists { path: path.clone() });
            }
            _ => {}
        }

        let rendered = self.registry.render(&artifact.template, ctx)?;
        let fresh =
            MarkedDocument::parse(&rendered).map_err(|source| ScaffoldError::InvalidTemplate {
                id: artifact.template.clone(),
                source,
            })?;

        let existing = if exists {
            Some(fs::read_to_string(path).map_err(|e| ScaffoldError::io(path, e))?)
        } else {
            None
        };

        let content = match (&existing, artifact.policy) {
            (Some(current), MutationPolicy::Merge) => {
                let on_disk = MarkedDocument::parse(current).map_err(|source| {
                    ScaffoldError::MergeConflict {
                        path: path.clone(),
                        source,
                    }
                })?;
                let merged = merge(&fresh, &on_disk);
                for region in &merged.dropped {
                    warn!(
                        path = %path.display(),
                        region = %region,
                        "dropping marker region no longer produced by the template"
                    );
                }
                merged.content
            }
            _ => rendered,
        };

        let outcome = match &existing {
            Some(current) if *current == content => {
                debug!(path = %path.display(), "unchanged");
                return Ok(Scaffolded {
                    path: path.clone(),
                    outcome: WriteOutcome::Unchanged,
                });
            }
            Some(_) => WriteOutcome::Updated,
            None => WriteOutcome::Created,
        };

        if self.dry_run {
            info!(path = %path.display(), outcome = outcome.as_str(), "dry run, not written");
        } else {
            write_atomic(path, content.as_bytes())?;
            info!(path = %path.display(), outcome = outcome.as_str(), "scaffolded");
        }
        Ok(Scaffolded {
            path: path.clone(),
            outcome,
        })
    }
}

/// Write `bytes` to `path` through a sibling temporary file and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ScaffoldError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| ScaffoldError::io(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| ScaffoldError::io(parent, e))?;
    tmp.write_all(bytes).map_err(|e| ScaffoldError::io(path, e))?;
    carry_permissions(tmp.as_file(), path).map_err(|e| ScaffoldError::io(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| ScaffoldError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| ScaffoldError::io(path, e.error))?;
    Ok(())
}

/// Mode given to files that did not exist before.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Staged files start out owner-only; give them the permissions of the file
/// they replace, or [`NEW_FILE_MODE`] for new files.
fn carry_permissions(staged: &fs::File, path: &Path) -> io::Result<()> {
    match fs::metadata(path) {
        Ok(meta) => staged.set_permissions(meta.permissions()),
        Err(_) => set_new_file_mode(staged),
    }
}

#[cfg(unix)]
fn set_new_file_mode(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn set_new_file_mode(_file: &fs::File) -> io::Result<()> {
    Ok(())
}
