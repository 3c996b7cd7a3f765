//! Numbered output file allocation
//!
//! Decks land next to the artifacts of earlier runs, so the file system
//! itself is the counter: candidates `0, 1, 2, ...` are probed in order and
//! the first absent one wins. Existing files are never overwritten; once
//! every index in the probe range is taken the allocator gives up with
//! [`ExportError::ResourceExhausted`].
//!
//! No locking is done. Two writers racing for the same base name are only
//! kept apart by the no-clobber persist in [`FileAllocator::write_new`].

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{ExportError, Result};

/// Number of suffix indices probed before giving up
pub const MAX_ATTEMPTS: usize = 100;

/// How a base name and a suffix index become a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePattern {
    /// `{base}{n}.txt`
    Numbered,
    /// `{base}_FasterCap_{n}.txt`
    FasterCap,
}

impl NamePattern {
    /// File name without the `.txt` extension; decks quote it in their header
    pub fn stem(&self, base: &str, index: usize) -> String {
        match self {
            NamePattern::Numbered => format!("{}{}", base, index),
            NamePattern::FasterCap => format!("{}_FasterCap_{}", base, index),
        }
    }
}

/// A free slot returned by the allocator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub path: PathBuf,
    pub stem: String,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct FileAllocator {
    base: String,
    pattern: NamePattern,
    max_attempts: usize,
}

impl FileAllocator {
    pub fn new(base: impl Into<String>, pattern: NamePattern) -> Result<Self> {
        let base = base.into();
        if base.is_empty() {
            return Err(ExportError::EmptyBaseName);
        }
        Ok(Self {
            base,
            pattern,
            max_attempts: MAX_ATTEMPTS,
        })
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn candidate(&self, index: usize) -> Allocation {
        let stem = self.pattern.stem(&self.base, index);
        Allocation {
            path: PathBuf::from(format!("{}.txt", stem)),
            stem,
            index,
        }
    }

    /// First candidate that does not exist yet
    pub fn allocate(&self) -> Result<Allocation> {
        self.allocate_from(0)
    }

    fn allocate_from(&self, start: usize) -> Result<Allocation> {
        for index in start..self.max_attempts {
            let candidate = self.candidate(index);
            if !candidate.path.try_exists()? {
                return Ok(candidate);
            }
            debug!("File {} already exists, trying next number", candidate.stem);
        }

        Err(ExportError::ResourceExhausted {
            base: self.base.clone(),
            attempts: self.max_attempts,
        })
    }

    /// Allocate a slot and write the text produced by `render` into it.
    ///
    /// `render` receives the slot's stem. The text goes to a temporary file
    /// in the target directory first and is moved into place only if the
    /// slot is still free, so a failed write never leaves a partial deck
    /// under a real deck name.
    pub fn write_new<F>(&self, mut render: F) -> Result<Allocation>
    where
        F: FnMut(&str) -> Result<String>,
    {
        let mut start = 0;
        loop {
            let slot = self.allocate_from(start)?;
            let contents = render(&slot.stem)?;

            match persist_new(&slot.path, contents.as_bytes()) {
                Ok(()) => {
                    info!("Wrote {} ({} bytes)", slot.path.display(), contents.len());
                    return Ok(slot);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    warn!("{} appeared while writing, trying next number", slot.path.display());
                    start = slot.index + 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn persist_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn base_in(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn test_name_patterns() {
        assert_eq!(NamePattern::Numbered.stem("qubit", 3), "qubit3");
        assert_eq!(NamePattern::FasterCap.stem("qubit", 0), "qubit_FasterCap_0");
    }

    #[test]
    fn test_empty_base_is_rejected() {
        assert!(matches!(
            FileAllocator::new("", NamePattern::Numbered),
            Err(ExportError::EmptyBaseName)
        ));
    }

    #[test]
    fn test_first_slot_in_empty_dir() {
        let dir = TempDir::new().unwrap();
        let allocator = FileAllocator::new(base_in(&dir, "loop"), NamePattern::Numbered).unwrap();

        let slot = allocator.allocate().unwrap();
        assert_eq!(slot.index, 0);
        assert_eq!(slot.path, dir.path().join("loop0.txt"));
        assert!(!slot.path.exists());
    }

    #[test]
    fn test_skips_existing_files() {
        let dir = TempDir::new().unwrap();
        let base = base_in(&dir, "cap");
        let allocator = FileAllocator::new(base, NamePattern::FasterCap).unwrap();

        for index in 0..5 {
            fs::write(allocator.candidate(index).path, "taken").unwrap();
        }

        let slot = allocator.allocate().unwrap();
        assert_eq!(slot.index, 5);
        assert_eq!(slot.path, dir.path().join("cap_FasterCap_5.txt"));
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let dir = TempDir::new().unwrap();
        let allocator = FileAllocator::new(base_in(&dir, "full"), NamePattern::Numbered).unwrap();

        for index in 0..MAX_ATTEMPTS {
            fs::write(allocator.candidate(index).path, "taken").unwrap();
        }

        match allocator.allocate() {
            Err(ExportError::ResourceExhausted { attempts, .. }) => assert_eq!(attempts, 100),
            other => panic!("expected ResourceExhausted, got {:?}", other),
        }
        // Nothing was overwritten
        assert_eq!(fs::read_to_string(allocator.candidate(99).path).unwrap(), "taken");
        assert!(!allocator.candidate(100).path.exists());
    }

    #[test]
    fn test_write_new_persists_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let allocator = FileAllocator::new(base_in(&dir, "deck"), NamePattern::Numbered).unwrap();

        let first = allocator.write_new(|stem| Ok(format!("* {}\n", stem))).unwrap();
        let second = allocator.write_new(|stem| Ok(format!("* {}\n", stem))).unwrap();

        assert_eq!(first.index, 0);
        assert_eq!(second.index, 1);
        assert_eq!(fs::read_to_string(&second.path).unwrap(), format!("* {}\n", second.stem));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_write_new_moves_on_when_slot_is_taken() {
        let dir = TempDir::new().unwrap();
        let allocator = FileAllocator::new(base_in(&dir, "race"), NamePattern::Numbered).unwrap();
        let squatter = allocator.candidate(0).path;

        // Another writer grabs slot 0 between the probe and the persist
        let slot = allocator
            .write_new(|stem| {
                if !squatter.exists() {
                    fs::write(&squatter, "other writer").unwrap();
                }
                Ok(stem.to_string())
            })
            .unwrap();

        assert_eq!(slot.index, 1);
        assert_eq!(fs::read_to_string(&squatter).unwrap(), "other writer");
        assert_eq!(fs::read_to_string(&slot.path).unwrap(), "race1");
    }

    #[test]
    fn test_render_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let allocator = FileAllocator::new(base_in(&dir, "bad"), NamePattern::Numbered).unwrap();

        let result = allocator.write_new(|_| Err(ExportError::invalid_polygon("empty")));
        assert!(matches!(result, Err(ExportError::InvalidPolygon { .. })));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_is_io_failure() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("missing").join("deck").to_string_lossy().into_owned();
        let allocator = FileAllocator::new(base, NamePattern::Numbered).unwrap();

        assert!(matches!(
            allocator.write_new(|stem| Ok(stem.to_string())),
            Err(ExportError::Io(_))
        ));
    }
}
