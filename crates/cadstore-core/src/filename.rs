//! Filename rules
//!
//! Client-supplied names are never used as paths directly. They are checked
//! against the extension allow-list and reduced to a single safe path
//! component with [`sanitize_filename`].

use unicode_normalization::UnicodeNormalization;

/// Return the suffix after the last `.`, or `None` if the name has no `.`
pub fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Check whether `name` carries one of the `allowed` extensions
///
/// Matching is case-insensitive on the name side; `allowed` is expected to be
/// lowercase already (see [`crate::StorageConfig::validate`]).
pub fn has_allowed_extension(name: &str, allowed: &[String]) -> bool {
    match extension(name) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            allowed.iter().any(|a| *a == ext)
        }
        None => false,
    }
}

/// Reduce a client-supplied filename to a safe single path component
///
/// The name is NFKD-normalized and whatever is still non-ASCII is dropped, so
/// `Café` becomes `Cafe`. Path separators (`/` and `\`) and whitespace runs
/// become `_`, anything outside `[A-Za-z0-9_.-]` is removed and leading or
/// trailing `.`/`_` are stripped. Returns `None` when nothing is left.
///
/// ```
/// use cadstore_core::sanitize_filename;
///
/// assert_eq!(
///     sanitize_filename("../../etc/passwd.stl").as_deref(),
///     Some("etc_passwd.stl")
/// );
/// assert_eq!(sanitize_filename(".."), None);
/// ```
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let spaced: String = raw
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_ascii_whitespace().collect::<Vec<_>>().join("_");

    let safe: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = safe.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["stl".to_string(), "obj".to_string()]
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("cube.stl"), Some("stl"));
        assert_eq!(extension("archive.tar.obj"), Some("obj"));
        assert_eq!(extension("cube."), Some(""));
        assert_eq!(extension("cube"), None);
    }

    #[test]
    fn test_allowed_extension_is_case_insensitive() {
        assert!(has_allowed_extension("cube.stl", &allowed()));
        assert!(has_allowed_extension("cube.STL", &allowed()));
        assert!(has_allowed_extension("teapot.Obj", &allowed()));
    }

    #[test]
    fn test_disallowed_extensions() {
        for name in ["virus.exe", "photo.png", "cube", "cube.", "cube.stl.exe", "stl"] {
            assert!(!has_allowed_extension(name, &allowed()), "{name} should be rejected");
        }
    }

    #[test]
    fn test_sanitize_keeps_plain_names() {
        assert_eq!(sanitize_filename("cube.stl").as_deref(), Some("cube.stl"));
        assert_eq!(sanitize_filename("part-01_v2.OBJ").as_deref(), Some("part-01_v2.OBJ"));
    }

    #[test]
    fn test_sanitize_strips_path_traversal() {
        assert_eq!(
            sanitize_filename("../../etc/passwd.stl").as_deref(),
            Some("etc_passwd.stl")
        );
        assert_eq!(
            sanitize_filename("/absolute/path/model.obj").as_deref(),
            Some("absolute_path_model.obj")
        );
        assert_eq!(
            sanitize_filename("..\\..\\windows\\model.stl").as_deref(),
            Some("windows_model.stl")
        );
        // Backslash separates on every platform, not only on Windows
        assert_eq!(sanitize_filename("..\\a\\b.stl").as_deref(), Some("a_b.stl"));
    }

    #[test]
    fn test_sanitize_whitespace_and_unsafe_chars() {
        assert_eq!(sanitize_filename("My Model.STL").as_deref(), Some("My_Model.STL"));
        assert_eq!(sanitize_filename("  a \t b.obj ").as_deref(), Some("a_b.obj"));
        assert_eq!(sanitize_filename("a\0b.obj").as_deref(), Some("ab.obj"));
        assert_eq!(sanitize_filename("c:model?*.stl").as_deref(), Some("cmodel.stl"));
    }

    #[test]
    fn test_sanitize_folds_unicode_to_ascii() {
        assert_eq!(sanitize_filename("Café.stl").as_deref(), Some("Cafe.stl"));
        assert_eq!(sanitize_filename("modèle.stl").as_deref(), Some("modele.stl"));
        assert_eq!(sanitize_filename("Ｍｏｄｅｌ.stl").as_deref(), Some("Model.stl"));
        assert_eq!(sanitize_filename("Ｍｏｄｅｌ．ｏｂｊ").as_deref(), Some("Model.obj"));
    }

    #[test]
    fn test_sanitize_leading_dots() {
        assert_eq!(sanitize_filename(".hidden.stl").as_deref(), Some("hidden.stl"));
        assert_eq!(sanitize_filename("...stl").as_deref(), Some("stl"));
        assert_eq!(sanitize_filename("_cube.obj_").as_deref(), Some("cube.obj"));
    }

    #[test]
    fn test_sanitize_empty_results() {
        for raw in ["", "..", "../..", "/", "\0", "   ", "._.", "日本語"] {
            assert_eq!(sanitize_filename(raw), None, "{raw:?} should sanitize to nothing");
        }
    }

    #[test]
    fn test_sanitized_names_are_single_components() {
        let inputs = [
            "../../etc/passwd.stl",
            "a/../../b.obj",
            "./.././x.stl",
            "\\\\server\\share\\y.obj",
            "..%2f..%2fz.stl",
        ];
        for raw in inputs {
            let name = sanitize_filename(raw).unwrap();
            assert!(!name.contains('/'), "{name}");
            assert!(!name.contains('\\'), "{name}");
            assert!(!name.starts_with('.'), "{name}");
            assert_ne!(name, "..");
        }
    }
}
