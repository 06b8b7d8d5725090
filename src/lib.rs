//! Autoloader - lazy class-file resolution
//!
//! This library resolves a class name to its defining file the first time the
//! class is referenced, searching an ordered list of directories and file
//! extensions, and loads each file at most once.
//!
//! # Architecture
//!
//! 1. **Loader** (`loader` module)
//!    - Ordered, de-duplicated search paths (`./lib` == `./lib/`)
//!    - Ordered, de-duplicated extensions (`php` == `.php`, `.php` seeded)
//!    - Path-major, extension-minor search; first readable candidate wins
//!    - Loaded cache: repeat requests never touch the file system
//!
//! 2. **Hook chain** (`hook` module)
//!    - Explicit, ordered registry of resolvers consulted for unknown classes
//!    - `Autoloader::enable` / `disable` attach and detach a loader
//!
//! 3. **Host** (`host` module)
//!    - `ClassSpace`: defined-class table with the undefined-class error path
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use autoloader::{Autoloader, ClassSpace, DeclarationLoader};
//!
//! let loader = Autoloader::get_ready(None);
//! let space = Arc::new(ClassSpace::new(Arc::clone(loader.chain())));
//! loader
//!     .set_file_loader(Arc::new(DeclarationLoader::new(&space)))
//!     .add_path("./lib")
//!     .add_extension(".class.php");
//! loader.enable();
//!
//! space.require("Foo").expect("Foo should be autoloaded");
//! assert!(loader.is_loaded("Foo"));
//! ```
//!
//! # Failure
//!
//! A class with no readable candidate is reported as `ClassNotFound` and is
//! never recorded as loaded; the host's reference then fails normally with
//! `UndefinedClass`.

pub mod config;
pub mod error;
pub mod hook;
pub mod host;
pub mod loader;

pub use config::AutoloadConfig;
pub use error::{AutoloadError, AutoloadResult};
pub use hook::{ClassResolver, FnResolver, HookId, ResolverChain};
pub use host::ClassSpace;
pub use loader::{
    Autoloader, AutoloaderBuilder, DeclarationLoader, FileLoader, FileProbe, OsProbe, Probe,
    ReadLoader, Resolution,
};
