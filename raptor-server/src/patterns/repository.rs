//! Storage for precomputed patterns.

use std::path::{Path, PathBuf};

use crate::domain::StopId;

use super::error::PatternError;
use super::strings::TransferPatterns;

/// Somewhere to put each origin's patterns once it is complete.
pub trait PatternRepository: Send + Sync {
    /// Store one origin's patterns.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the patterns could not be written.
    fn store(&self, patterns: &TransferPatterns) -> Result<(), PatternError>;
}

/// Writes one `{origin}.json` file per origin into a directory.
#[derive(Debug, Clone)]
pub struct JsonDirectoryRepository {
    dir: PathBuf,
}

impl JsonDirectoryRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, origin: &StopId) -> PathBuf {
        self.dir.join(format!("{}.json", origin))
    }

    /// Read back the patterns stored for `origin`, if any.
    pub fn load(&self, origin: &StopId) -> Result<Option<TransferPatterns>, PatternError> {
        let path = self.path_for(origin);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PatternError::Io { path, source }),
        }
    }
}

impl PatternRepository for JsonDirectoryRepository {
    fn store(&self, patterns: &TransferPatterns) -> Result<(), PatternError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| PatternError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(patterns)?;

        // Written aside then renamed so a reader never sees half a file
        let path = self.path_for(&patterns.origin);
        let partial = path.with_extension("json.partial");
        std::fs::write(&partial, json).map_err(|source| PatternError::Io {
            path: partial.clone(),
            source,
        })?;
        std::fs::rename(&partial, &path).map_err(|source| PatternError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use tempfile::tempdir;

    fn patterns(origin: &str) -> TransferPatterns {
        let mut patterns = BTreeMap::new();
        patterns.insert(
            StopId::new("B"),
            BTreeSet::from([format!("{origin}>B"), format!("{origin}>C>B")]),
        );
        TransferPatterns {
            origin: StopId::new(origin),
            patterns,
        }
    }

    #[test]
    fn store_then_load() {
        let dir = tempdir().unwrap();
        let repository = JsonDirectoryRepository::new(dir.path());

        repository.store(&patterns("A")).unwrap();

        let loaded = repository.load(&StopId::new("A")).unwrap();
        assert_eq!(loaded, Some(patterns("A")));
        assert!(dir.path().join("A.json").exists());
        assert!(!dir.path().join("A.json.partial").exists());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempdir().unwrap();
        let repository = JsonDirectoryRepository::new(dir.path().join("nested").join("out"));

        repository.store(&patterns("A")).unwrap();

        assert!(repository.dir().join("A.json").exists());
    }

    #[test]
    fn load_missing_origin() {
        let dir = tempdir().unwrap();
        let repository = JsonDirectoryRepository::new(dir.path());

        assert_eq!(repository.load(&StopId::new("Z")).unwrap(), None);
    }

    #[test]
    fn load_corrupt_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("A.json"), "not json").unwrap();
        let repository = JsonDirectoryRepository::new(dir.path());

        let result = repository.load(&StopId::new("A"));

        assert!(matches!(result, Err(PatternError::Json(_))));
    }

    #[test]
    fn store_overwrites() {
        let dir = tempdir().unwrap();
        let repository = JsonDirectoryRepository::new(dir.path());
        repository.store(&patterns("A")).unwrap();

        let replacement = TransferPatterns {
            origin: StopId::new("A"),
            patterns: BTreeMap::new(),
        };
        repository.store(&replacement).unwrap();

        assert_eq!(repository.load(&StopId::new("A")).unwrap(), Some(replacement));
    }
}
