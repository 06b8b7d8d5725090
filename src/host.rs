//! Host-side class table.
//!
//! `ClassSpace` stands in for the environment that owns type definitions:
//! it knows which classes are defined and, when asked for one that is not,
//! consults its [`ResolverChain`] once before failing with
//! [`AutoloadError::UndefinedClass`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{AutoloadError, AutoloadResult};
use crate::hook::ResolverChain;

/// Table of defined classes backed by a resolver chain.
#[derive(Debug)]
pub struct ClassSpace {
    chain: Arc<ResolverChain>,
    /// Class name -> file that defined it.
    defined: RwLock<HashMap<String, PathBuf>>,
}

impl ClassSpace {
    pub fn new(chain: Arc<ResolverChain>) -> Self {
        Self {
            chain,
            defined: RwLock::new(HashMap::new()),
        }
    }

    /// The chain consulted for unknown classes.
    pub fn chain(&self) -> &Arc<ResolverChain> {
        &self.chain
    }

    /// Record a class definition. The first definition of a name wins.
    pub fn define(&self, class_name: impl Into<String>, origin: &Path) -> bool {
        let class_name = class_name.into();
        let mut defined = self.defined.write();
        if defined.contains_key(&class_name) {
            trace!(class = %class_name, "class already defined");
            return false;
        }
        defined.insert(class_name, origin.to_path_buf());
        true
    }

    pub fn is_defined(&self, class_name: &str) -> bool {
        self.defined.read().contains_key(class_name)
    }

    /// File that defined `class_name`, if any.
    pub fn origin(&self, class_name: &str) -> Option<PathBuf> {
        self.defined.read().get(class_name).cloned()
    }

    /// Snapshot of all defined classes.
    pub fn defined(&self) -> HashMap<String, PathBuf> {
        self.defined.read().clone()
    }

    /// Reference a class, resolving it through the chain if needed.
    ///
    /// The read lock is released before the chain runs so that loaders can
    /// define classes.
    pub fn require(&self, class_name: &str) -> AutoloadResult<()> {
        if self.is_defined(class_name) {
            return Ok(());
        }

        let resolution = self.chain.resolve(class_name);
        debug!(class = class_name, resolution = ?resolution, "chain consulted");

        if self.is_defined(class_name) {
            Ok(())
        } else {
            Err(AutoloadError::UndefinedClass(class_name.to_string()))
        }
    }
}
