//! Search Path and Extension Normalization
//!
//! Candidates are formed by plain string concatenation:
//! `search_path + class_name + extension`. Normalization makes that safe:
//! - search paths always end in exactly one `/`
//! - extensions always start with exactly one `.`

use std::path::PathBuf;

/// Separator appended to every search path.
pub const PATH_SEPARATOR: char = '/';

/// Separator prepended to every extension.
pub const EXTENSION_SEPARATOR: char = '.';

/// Extension seeded into every new loader.
pub const DEFAULT_EXTENSION: &str = ".php";

/// Normalize a search path to its canonical trailing-separator form.
///
/// # Examples
/// - `"./lib"` -> `"./lib/"`
/// - `"./lib///"` -> `"./lib/"`
/// - `"/"` -> `"/"`
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.trim_end_matches(PATH_SEPARATOR).to_string();
    normalized.push(PATH_SEPARATOR);
    normalized
}

/// Normalize an extension to start with a single separator.
///
/// # Examples
/// - `"php"` -> `".php"`
/// - `"..class.php"` -> `".class.php"`
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim_start_matches(EXTENSION_SEPARATOR);
    let mut normalized = String::with_capacity(trimmed.len() + 1);
    normalized.push(EXTENSION_SEPARATOR);
    normalized.push_str(trimmed);
    normalized
}

/// Build the candidate file location for a class.
///
/// Both `path` and `extension` are expected to be normalized already.
pub fn candidate_path(path: &str, class_name: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}{}{}", path, class_name, extension))
}

/// Append `item` to `list` unless it is already present.
///
/// Returns true if the list changed.
pub(crate) fn push_unique(list: &mut Vec<String>, item: String) -> bool {
    if list.contains(&item) {
        false
    } else {
        list.push(item);
        true
    }
}

/// Remove `item` from `list`, keeping the order of what remains.
///
/// Returns true if the list changed.
pub(crate) fn remove_item(list: &mut Vec<String>, item: &str) -> bool {
    let before = list.len();
    list.retain(|existing| existing != item);
    list.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_appends_separator() {
        assert_eq!(normalize_path("./lib"), "./lib/");
        assert_eq!(normalize_path("inc"), "inc/");
    }

    #[test]
    fn test_normalize_path_collapses_trailing_separators() {
        assert_eq!(normalize_path("./lib/"), "./lib/");
        assert_eq!(normalize_path("./lib///"), "./lib/");
    }

    #[test]
    fn test_normalize_path_root_and_empty() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("php"), ".php");
        assert_eq!(normalize_extension(".php"), ".php");
        assert_eq!(normalize_extension("..class.php"), ".class.php");
        assert_eq!(normalize_extension(".class.php"), ".class.php");
    }

    #[test]
    fn test_candidate_path() {
        assert_eq!(
            candidate_path("./lib/", "Foo", ".class.php"),
            PathBuf::from("./lib/Foo.class.php")
        );
    }

    #[test]
    fn test_push_unique_and_remove() {
        let mut list = vec!["a/".to_string()];
        assert!(push_unique(&mut list, "b/".to_string()));
        assert!(!push_unique(&mut list, "a/".to_string()));
        assert!(push_unique(&mut list, "c/".to_string()));
        assert_eq!(list, vec!["a/", "b/", "c/"]);

        assert!(remove_item(&mut list, "b/"));
        assert!(!remove_item(&mut list, "missing/"));
        assert_eq!(list, vec!["a/", "c/"]);
    }
}
