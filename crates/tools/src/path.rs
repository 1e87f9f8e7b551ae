//! Path resolution — every file action is scoped to the target directory.
//!
//! Relative paths are joined onto the working directory, absolute paths are
//! taken as given. Both are then checked for `..` traversal and against the
//! forbidden path prefixes (e.g., ~/.ssh).

use std::path::{Path, PathBuf};

/// Error returned when path validation fails.
#[derive(Debug, thiserror::Error)]
pub enum PathValidationError {
    #[error("Path '{path}' matches forbidden pattern '{pattern}'")]
    ForbiddenPath { path: String, pattern: String },

    #[error("Path traversal detected in '{path}'")]
    PathTraversal { path: String },
}

/// Resolves tool path arguments against a working directory.
#[derive(Debug, Clone)]
pub struct PathPolicy {
    root: PathBuf,
    forbidden_paths: Vec<String>,
}

impl PathPolicy {
    pub fn new(root: impl Into<PathBuf>, forbidden_paths: Vec<String>) -> Self {
        Self {
            root: root.into(),
            forbidden_paths,
        }
    }

    /// The working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an optional path argument, defaulting to the working directory.
    pub fn resolve_or_root(&self, path: Option<&str>) -> Result<PathBuf, PathValidationError> {
        match path {
            Some(p) if !p.is_empty() => self.resolve(p),
            _ => Ok(self.root.clone()),
        }
    }

    /// Resolve a path argument and check it against the policy.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, PathValidationError> {
        let normalized = path.replace('\\', "/");
        if normalized == ".."
            || normalized.starts_with("../")
            || normalized.contains("/../")
            || normalized.ends_with("/..")
        {
            return Err(PathValidationError::PathTraversal { path: path.into() });
        }

        let input = Path::new(path);
        let resolved = if input.is_absolute() {
            input.to_path_buf()
        } else {
            self.root.join(input)
        };

        // Symlinks can point anywhere; check where an existing path really lands
        let canonical = resolved.canonicalize().ok();

        for pattern in &self.forbidden_paths {
            let forbidden = PathBuf::from(expand_tilde(pattern));
            let hit = resolved.starts_with(&forbidden)
                || canonical.as_ref().is_some_and(|c| c.starts_with(&forbidden));
            if hit {
                return Err(PathValidationError::ForbiddenPath {
                    path: path.into(),
                    pattern: pattern.clone(),
                });
            }
        }

        Ok(resolved)
    }
}

/// Expand ~ to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") || path == "~" {
        let home = tasksmith_config::dirs_home();
        return path.replacen('~', &home.to_string_lossy(), 1);
    }
    path.to_string()
}
