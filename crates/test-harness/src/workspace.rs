//! Working directories for harness runs and the filename globs they clean.
//!
//! Every harness operation takes a [`Workspace`] instead of touching the
//! process working directory. A scoped workspace is a private temporary
//! directory deleted on drop, so artifacts never outlive the run, whichever
//! way it exits.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::config::WorkspaceConfig;
use crate::helpers::HarnessError;

pub const STATEPOINT: &str = "statepoint*";
pub const MODEL_XML: &str = "*.xml";
pub const BINARY_OUTPUT: &str = "*.h5";
pub const VISUALIZATION: &str = "*.vtk";
pub const MESH_CONTAINER: &str = "*.h5m";
pub const FACE_INTERMEDIATES: &str = "vol*_face*";

/// Globs every harness removes during cleanup.
pub const STANDARD_PATTERNS: [&str; 3] = [MODEL_XML, BINARY_OUTPUT, VISUALIZATION];

/// A filename glob supporting `*` (any run) and `?` (one character).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern(String);

impl FilePattern {
    pub fn new(pattern: &str) -> Self {
        Self(pattern.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, name: &str) -> bool {
        let pat: Vec<char> = self.0.chars().collect();
        let text: Vec<char> = name.chars().collect();
        let (mut p, mut t) = (0, 0);
        let mut star: Option<(usize, usize)> = None;

        while t < text.len() {
            if p < pat.len() && (pat[p] == '?' || pat[p] == text[t]) {
                p += 1;
                t += 1;
            } else if p < pat.len() && pat[p] == '*' {
                star = Some((p, t));
                p += 1;
            } else if let Some((sp, st)) = star {
                p = sp + 1;
                t = st + 1;
                star = Some((sp, st + 1));
            } else {
                return false;
            }
        }
        pat[p..].iter().all(|&c| c == '*')
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilePattern {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A directory handle every harness operation works in.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    scoped: Option<TempDir>,
}

impl Workspace {
    /// A fresh private directory under the system temp dir, removed on drop.
    pub fn scoped() -> Result<Self, HarnessError> {
        Self::scoped_with_prefix(&std::env::temp_dir(), "mc-harness-")
    }

    pub fn scoped_with_prefix(parent: &Path, prefix: &str) -> Result<Self, HarnessError> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .map_err(|e| HarnessError::io(parent, e))?;
        Ok(Self {
            root: dir.path().to_path_buf(),
            scoped: Some(dir),
        })
    }

    /// Wrap an existing directory. Nothing is removed on drop; only
    /// [`Workspace::remove_matching`] deletes files here.
    pub fn at(path: impl Into<PathBuf>) -> Result<Self, HarnessError> {
        let root = path.into();
        let meta = fs::metadata(&root).map_err(|e| HarnessError::io(&root, e))?;
        if !meta.is_dir() {
            return Err(HarnessError::io(
                &root,
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }
        Ok(Self { root, scoped: None })
    }

    pub fn from_config(config: &WorkspaceConfig) -> Result<Self, HarnessError> {
        let parent = config.root.clone().unwrap_or_else(std::env::temp_dir);
        if config.scoped {
            Self::scoped_with_prefix(&parent, &config.prefix)
        } else {
            Self::at(parent)
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn is_scoped(&self) -> bool {
        self.scoped.is_some()
    }

    /// Regular files directly in the workspace whose names match, sorted.
    pub fn find(&self, pattern: &FilePattern) -> Result<Vec<PathBuf>, HarnessError> {
        let entries = fs::read_dir(&self.root).map_err(|e| HarnessError::io(&self.root, e))?;
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| HarnessError::io(&self.root, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name();
            if is_file && pattern.matches(&name.to_string_lossy()) {
                found.push(entry.path());
            }
        }
        found.sort();
        Ok(found)
    }

    /// Delete every file matching any pattern; returns what was removed.
    ///
    /// Files that vanish between listing and removal are skipped, so running
    /// this twice is harmless. Any other removal error propagates.
    pub fn remove_matching(&self, patterns: &[FilePattern]) -> Result<Vec<PathBuf>, HarnessError> {
        let mut removed = Vec::new();
        for pattern in patterns {
            for path in self.find(pattern)? {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        debug!(path = %path.display(), pattern = %pattern, "removed");
                        removed.push(path);
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(HarnessError::io(&path, e)),
                }
            }
        }
        Ok(removed)
    }
}

pub(crate) fn patterns(globs: &[&str]) -> Vec<FilePattern> {
    globs.iter().map(|g| FilePattern::new(g)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_any_run() {
        let p = FilePattern::new("statepoint*");
        assert!(p.matches("statepoint.20.h5"));
        assert!(p.matches("statepoint"));
        assert!(!p.matches("summary.h5"));
        assert!(!p.matches("my_statepoint.h5"));
    }

    #[test]
    fn extension_patterns() {
        let p = FilePattern::new("*.h5");
        assert!(p.matches("summary.h5"));
        assert!(!p.matches("out_cqstl.h5m"));
        assert!(FilePattern::new("*.h5m").matches("out_cqstl.h5m"));
    }

    #[test]
    fn face_intermediates_pattern() {
        let p = FilePattern::new(FACE_INTERMEDIATES);
        assert!(p.matches("vol1_face1.stl"));
        assert!(p.matches("vol12_face304.stl"));
        assert!(p.matches("vol_face"));
        assert!(!p.matches("volume.stl"));
        assert!(!p.matches("face1_vol1.stl"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        let p = FilePattern::new("a?c");
        assert!(p.matches("abc"));
        assert!(!p.matches("ac"));
        assert!(!p.matches("abbc"));
    }

    #[test]
    fn at_rejects_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "").unwrap();
        assert!(Workspace::at(&file).is_err());
    }
}
