//! Entry filters applied while building a directory snapshot.
//!
//! These run on the producing side of the search: anything filtered here never becomes an
//! archive entry. Paths are relative to the snapshot root and compared with `/` separators.
use glob::Pattern;
use std::path::{Component, Path};

/// Directories that are never part of a snapshot
const ALWAYS_IGNORED_DIRS: &[&str] = &["target", ".git"];

/// Checks if a file should be included in the search based on its extension
pub fn has_valid_extension(path: &Path, extensions: &Option<Vec<String>>) -> bool {
    match extensions {
        None => true,
        Some(exts) => path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| exts.iter().any(|e| e.eq_ignore_ascii_case(ext))),
    }
}

/// Checks if a file should be ignored based on ignore patterns
pub fn should_ignore(path: &Path, ignore_patterns: &[String]) -> bool {
    let in_ignored_dir = path.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| ALWAYS_IGNORED_DIRS.contains(&name)),
        _ => false,
    });
    if in_ignored_dir {
        return true;
    }

    let normalized = path.to_string_lossy().replace('\\', "/");
    ignore_patterns.iter().any(|pattern| match Pattern::new(pattern) {
        Ok(p) => p.matches(&normalized),
        Err(_) => false,
    })
}

/// Checks if a file is likely to be binary
pub fn is_likely_binary(path: &Path) -> bool {
    const BINARY_EXTENSIONS: &[&str] = &[
        "exe", "dll", "so", "dylib", "bin", "obj", "o", "a", "class", "jar", "war", "ear", "png",
        "jpg", "jpeg", "gif", "bmp", "ico", "pdf", "doc", "docx", "xls", "xlsx", "zip", "tar",
        "gz", "7z", "rar", "wasm",
    ];

    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            BINARY_EXTENSIONS
                .iter()
                .any(|bin_ext| bin_ext.eq_ignore_ascii_case(ext))
        })
}

/// Determines if a file should become an archive entry
pub fn should_include_file(
    path: &Path,
    extensions: &Option<Vec<String>>,
    ignore_patterns: &[String],
) -> bool {
    !is_likely_binary(path)
        && has_valid_extension(path, extensions)
        && !should_ignore(path, ignore_patterns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_valid_extension() {
        let extensions = Some(vec!["rs".to_string()]);
        assert!(has_valid_extension(Path::new("test.rs"), &extensions));
        assert!(!has_valid_extension(Path::new("test.py"), &extensions));
        assert!(has_valid_extension(Path::new("test.RS"), &extensions));
        assert!(!has_valid_extension(Path::new("test"), &extensions));
        assert!(has_valid_extension(Path::new("test.rs"), &None));
    }

    #[test]
    fn test_should_ignore() {
        let ignore_patterns = vec!["**/test_[0-4].txt".to_string(), "**/*.tmp".to_string()];

        assert!(should_ignore(Path::new("test_0.txt"), &ignore_patterns));
        assert!(should_ignore(Path::new("dir/test_2.txt"), &ignore_patterns));
        assert!(should_ignore(Path::new("src/temp.tmp"), &ignore_patterns));
        assert!(should_ignore(Path::new("target/debug/main.rs"), &[]));
        assert!(should_ignore(Path::new("sub/.git/config"), &[]));

        assert!(!should_ignore(Path::new("test_5.txt"), &ignore_patterns));
        assert!(!should_ignore(Path::new("src/main.rs"), &ignore_patterns));
        assert!(!should_ignore(Path::new("targets/main.rs"), &ignore_patterns));
        assert!(!should_ignore(Path::new(".gitignore"), &ignore_patterns));
    }

    #[test]
    fn test_is_likely_binary() {
        assert!(is_likely_binary(Path::new("test.exe")));
        assert!(is_likely_binary(Path::new("test.PDF")));
        assert!(!is_likely_binary(Path::new("test.rs")));
        assert!(!is_likely_binary(Path::new("test")));
    }

    #[test]
    fn test_should_include_file() {
        let extensions = Some(vec!["rs".to_string()]);
        let ignore_patterns = vec!["gen/**".to_string()];

        assert!(should_include_file(
            Path::new("src/main.rs"),
            &extensions,
            &ignore_patterns
        ));
        assert!(!should_include_file(
            Path::new("src/main.py"),
            &extensions,
            &ignore_patterns
        ));
        assert!(!should_include_file(
            Path::new("gen/out.rs"),
            &extensions,
            &ignore_patterns
        ));
        assert!(!should_include_file(
            Path::new("src/test.exe"),
            &None,
            &ignore_patterns
        ));
    }
}
