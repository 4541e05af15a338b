//! Ephemeral execution workspaces
//!
//! Each execution gets its own temporary directory holding the staged source
//! file. The directory is bind-mounted into the sandbox and removed once the
//! execution is over.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};
use tracing::{debug, warn};

use crate::config::{PathTranslation, SandboxConfig};
use crate::error::{Error, Result};
use crate::sandbox::language::LanguageProfile;
use crate::sandbox::runtime::BindMount;

const WORKSPACE_PREFIX: &str = "code-";

/// Creates workspaces under a common root
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    /// Parent directory; the OS temp dir when unset
    root: Option<PathBuf>,
    translation: PathTranslation,
}

impl Default for WorkspaceManager {
    fn default() -> Self {
        WorkspaceManager {
            root: None,
            translation: PathTranslation::Auto,
        }
    }
}

impl WorkspaceManager {
    /// Create a manager rooted at `root` (or the OS temp dir)
    pub fn new(root: Option<PathBuf>, translation: PathTranslation) -> Self {
        WorkspaceManager { root, translation }
    }

    /// Create a manager from sandbox configuration
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self::new(config.workspace_root.clone(), config.path_translation)
    }

    /// Allocate a fresh, uniquely named workspace for `profile`
    pub fn create(&self, profile: &LanguageProfile) -> Result<Workspace> {
        let mut builder = Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match &self.root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| Error::ResourceAllocation(e.to_string()))?;

        let root = dir.path().to_path_buf();
        let source_file = root.join(profile.source_file_name());
        debug!("Created workspace {}", root.display());

        Ok(Workspace {
            dir: Some(dir),
            root,
            source_file,
            translation: self.translation,
        })
    }

    /// Allocate a workspace and write `code` into its source file
    pub fn stage(&self, profile: &LanguageProfile, code: &str) -> Result<Workspace> {
        let mut workspace = self.create(profile)?;
        if let Err(e) = workspace.write_source(code) {
            workspace.destroy();
            return Err(e);
        }
        Ok(workspace)
    }
}

/// A staged source directory owned by exactly one execution
///
/// Dropping an undestroyed workspace removes the directory.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
    source_file: PathBuf,
    translation: PathTranslation,
}

impl Workspace {
    /// Host path of the workspace directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path of the staged source file
    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    /// Path at which the workspace is mounted inside the sandbox
    pub fn container_root(&self) -> String {
        translate(&self.root, self.translation)
    }

    /// Path of the source file inside the sandbox
    pub fn container_source_file(&self) -> String {
        translate(&self.source_file, self.translation)
    }

    /// Read/write bind mount of the workspace into the sandbox
    pub fn mount(&self) -> BindMount {
        BindMount {
            host: self.root.clone(),
            container: self.container_root(),
        }
    }

    /// Write the submitted source into the workspace
    pub fn write_source(&self, content: &str) -> Result<()> {
        std::fs::write(&self.source_file, content)?;
        Ok(())
    }

    /// Whether `destroy` already ran
    pub fn is_destroyed(&self) -> bool {
        self.dir.is_none()
    }

    /// Recursively remove the workspace. Safe to call more than once and
    /// when the directory has already vanished.
    pub fn destroy(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        match dir.close() {
            Ok(()) => debug!("Removed workspace {}", self.root.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Workspace {} was already gone", self.root.display())
            }
            Err(e) => warn!("Failed to remove workspace {}: {}", self.root.display(), e),
        }
    }
}

/// Map a host path to its in-sandbox location
pub fn translate(path: &Path, translation: PathTranslation) -> String {
    let windows = match translation {
        PathTranslation::Auto => cfg!(windows),
        PathTranslation::Identity => false,
        PathTranslation::Windows => true,
    };

    let raw = path.to_string_lossy();
    if windows {
        windows_to_container_path(&raw)
    } else {
        raw.into_owned()
    }
}

/// `C:\Users\Me\x` -> `/c/users/me/x`
fn windows_to_container_path(path: &str) -> String {
    let unix = path.replace('\\', "/").replacen(':', "", 1).to_lowercase();
    if unix.starts_with('/') {
        unix
    } else {
        format!("/{}", unix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::language::LanguageRegistry;

    fn python() -> LanguageProfile {
        LanguageRegistry::default().resolve("python").unwrap().clone()
    }

    #[test]
    fn test_stage_writes_source_with_extension() {
        let base = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(Some(base.path().to_path_buf()), PathTranslation::Identity);

        let workspace = manager.stage(&python(), "print('hi')").unwrap();

        assert!(workspace.root().starts_with(base.path()));
        assert!(workspace
            .root()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("code-"));
        assert_eq!(workspace.source_file().file_name().unwrap(), "code.py");
        assert_eq!(
            std::fs::read_to_string(workspace.source_file()).unwrap(),
            "print('hi')"
        );
        assert_eq!(
            workspace.mount().to_bind_string(),
            format!("{}:{}", workspace.root().display(), workspace.root().display())
        );
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let manager = WorkspaceManager::default();
        let mut workspace = manager.stage(&python(), "x = 1").unwrap();
        let root = workspace.root().to_path_buf();

        // Partially cleaned up by someone else first
        std::fs::remove_dir_all(&root).unwrap();

        workspace.destroy();
        workspace.destroy();
        assert!(workspace.is_destroyed());
        assert!(!root.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let manager = WorkspaceManager::default();
        let workspace = manager.stage(&python(), "x = 1").unwrap();
        let root = workspace.root().to_path_buf();
        assert!(root.exists());

        drop(workspace);
        assert!(!root.exists());
    }

    #[test]
    fn test_unusable_root_is_allocation_error() {
        let base = tempfile::tempdir().unwrap();
        let missing = base.path().join("does-not-exist");
        let manager = WorkspaceManager::new(Some(missing), PathTranslation::Identity);

        assert!(matches!(
            manager.create(&python()),
            Err(Error::ResourceAllocation(_))
        ));
    }

    #[test]
    fn test_windows_translation() {
        assert_eq!(
            windows_to_container_path(r"C:\Users\Me\AppData\Local\Temp\code-abc"),
            "/c/users/me/appdata/local/temp/code-abc"
        );
        assert_eq!(
            translate(Path::new("/tmp/code-abc"), PathTranslation::Identity),
            "/tmp/code-abc"
        );
    }
}
