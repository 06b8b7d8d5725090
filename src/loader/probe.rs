//! Candidate readability checks.

use std::fs::File;
use std::io;
use std::path::Path;

/// Outcome of checking a single candidate file.
#[derive(Debug)]
pub enum Probe {
    /// The file exists and can be opened for reading.
    Readable,
    /// Nothing loadable at this location.
    Missing,
    /// The check itself failed (permissions, I/O). Treated as a non-match by
    /// the loader, but kept distinct so it can be reported.
    Error(io::Error),
}

impl Probe {
    pub fn is_readable(&self) -> bool {
        matches!(self, Probe::Readable)
    }
}

/// Checks whether a candidate file can be loaded.
pub trait FileProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Probe;
}

/// Probe backed by the real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsProbe;

impl FileProbe for OsProbe {
    fn probe(&self, path: &Path) -> Probe {
        match File::open(path) {
            Ok(file) => match file.metadata() {
                Ok(meta) if meta.is_file() => Probe::Readable,
                Ok(_) => Probe::Missing,
                Err(err) => Probe::Error(err),
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => Probe::Missing,
            Err(err) => Probe::Error(err),
        }
    }
}

impl<F> FileProbe for F
where
    F: Fn(&Path) -> Probe + Send + Sync,
{
    fn probe(&self, path: &Path) -> Probe {
        self(path)
    }
}
