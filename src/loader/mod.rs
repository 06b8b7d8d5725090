//! Class Loading Infrastructure
//!
//! - `Autoloader` - Search-path / extension registries, lazy resolve, loaded cache
//! - `FileProbe` - Tri-state readability check for candidates
//! - `FileLoader` - The load step run on a matched file
//! - Path and extension normalization helpers

mod autoloader;
mod path;
mod probe;
mod source;

pub use autoloader::{Autoloader, AutoloaderBuilder, Resolution};
pub use path::{
    candidate_path, normalize_extension, normalize_path, DEFAULT_EXTENSION, EXTENSION_SEPARATOR,
    PATH_SEPARATOR,
};
pub use probe::{FileProbe, OsProbe, Probe};
pub use source::{scan_declarations, DeclarationLoader, FileLoader, ReadLoader};
