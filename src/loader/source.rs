//! The load step: what happens to a class file once it has been found.
//!
//! The autoloader only decides *which* file satisfies a class name. Turning
//! that file into a defined type belongs to the host, so it is injected as a
//! [`FileLoader`].

use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock, Weak};

use regex::Regex;
use tracing::{debug, trace};

use crate::error::{AutoloadError, AutoloadResult};
use crate::host::ClassSpace;

/// Loads (executes, imports, registers) a matched class file.
pub trait FileLoader: Send + Sync {
    fn load(&self, class_name: &str, path: &Path) -> AutoloadResult<()>;
}

impl<F> FileLoader for F
where
    F: Fn(&str, &Path) -> AutoloadResult<()> + Send + Sync,
{
    fn load(&self, class_name: &str, path: &Path) -> AutoloadResult<()> {
        self(class_name, path)
    }
}

/// Default loader: reads the whole file and discards it.
///
/// Succeeds iff the file can actually be read, which is all the autoloader
/// promises about a loaded class.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadLoader;

impl FileLoader for ReadLoader {
    fn load(&self, class_name: &str, path: &Path) -> AutoloadResult<()> {
        let bytes = fs::read(path).map_err(|e| AutoloadError::LoadFailed {
            class: class_name.to_string(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        trace!(class = class_name, path = %path.display(), bytes = bytes.len(), "read class file");
        Ok(())
    }
}

fn declaration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:(?:abstract|final|readonly)\s+)*(?:class|interface|trait|enum)\s+([A-Za-z_][A-Za-z0-9_]*)",
        )
        .expect("declaration pattern is valid")
    })
}

/// Extract the type names declared in a source text, in order of appearance.
pub fn scan_declarations(source: &str) -> Vec<String> {
    declaration_pattern()
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Loader that defines every declared type of a file in a [`ClassSpace`].
///
/// Whether the requested class is among the declarations is not checked;
/// a file that declares something else simply leaves the class undefined.
#[derive(Debug, Clone)]
pub struct DeclarationLoader {
    space: Weak<ClassSpace>,
}

impl DeclarationLoader {
    pub fn new(space: &Arc<ClassSpace>) -> Self {
        Self {
            space: Arc::downgrade(space),
        }
    }
}

impl FileLoader for DeclarationLoader {
    fn load(&self, class_name: &str, path: &Path) -> AutoloadResult<()> {
        let failed = |reason: String| AutoloadError::LoadFailed {
            class: class_name.to_string(),
            path: path.to_path_buf(),
            reason,
        };

        let space = self
            .space
            .upgrade()
            .ok_or_else(|| failed("class space has been dropped".to_string()))?;
        let source = fs::read_to_string(path).map_err(|e| failed(e.to_string()))?;

        let declared = scan_declarations(&source);
        debug!(class = class_name, path = %path.display(), declared = ?declared, "defining declarations");
        for name in declared {
            space.define(name, path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::ResolverChain;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_scan_declarations() {
        let source = r#"<?php
class Foo
{
    private $property;
}

abstract class Base {}
final  class Leaf extends Base {}
interface Shape {}
trait Greets {}
// class Commented
$x = "class Fake";
"#;
        assert_eq!(
            scan_declarations(source),
            vec!["Foo", "Base", "Leaf", "Shape", "Greets"]
        );
    }

    #[test]
    fn test_scan_declarations_empty() {
        assert!(scan_declarations("<?php echo 'hi';").is_empty());
    }

    #[test]
    fn test_read_loader() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("Foo.php");
        fs::write(&file, "class Foo {}").unwrap();

        assert!(ReadLoader.load("Foo", &file).is_ok());

        let missing = dir.path().join("Missing.php");
        let err = ReadLoader.load("Missing", &missing).unwrap_err();
        assert!(matches!(err, AutoloadError::LoadFailed { .. }));
    }

    #[test]
    fn test_declaration_loader_defines_types() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("Foo.php");
        fs::write(&file, "class Foo {}\nclass FooHelper {}\n").unwrap();

        let space = Arc::new(ClassSpace::new(Arc::new(ResolverChain::new())));
        let loader = DeclarationLoader::new(&space);
        loader.load("Foo", &file).unwrap();

        assert!(space.is_defined("Foo"));
        assert!(space.is_defined("FooHelper"));
        assert_eq!(space.origin("Foo"), Some(PathBuf::from(&file)));
    }

    #[test]
    fn test_declaration_loader_after_space_dropped() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("Foo.php");
        fs::write(&file, "class Foo {}").unwrap();

        let space = Arc::new(ClassSpace::new(Arc::new(ResolverChain::new())));
        let loader = DeclarationLoader::new(&space);
        drop(space);

        assert!(loader.load("Foo", &file).is_err());
    }

    #[test]
    fn test_closure_loader() {
        let loader = |class: &str, _path: &Path| -> AutoloadResult<()> {
            if class == "Broken" {
                Err(AutoloadError::UndefinedClass(class.to_string()))
            } else {
                Ok(())
            }
        };
        assert!(loader.load("Foo", Path::new("x")).is_ok());
        assert!(loader.load("Broken", Path::new("x")).is_err());
    }
}
