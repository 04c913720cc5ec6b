//! Path filters applied while building the candidate list.
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Prefix of the lock files spreadsheet editors leave next to open workbooks
pub const LOCK_FILE_PREFIX: &str = "~$";

/// Format of a candidate file, fixed by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    Excel,
    #[serde(rename = "PDF")]
    Pdf,
}

impl FileType {
    /// Extensions (lowercase, without the dot) belonging to this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Excel => &["xlsx", "xls"],
            Self::Pdf => &["pdf"],
        }
    }

    /// Detects the format from the file extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        [Self::Excel, Self::Pdf]
            .into_iter()
            .find(|ft| ft.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excel => f.write_str("Excel"),
            Self::Pdf => f.write_str("PDF"),
        }
    }
}

/// Checks if a file's extension is one of `extensions`, ignoring case
pub fn has_valid_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Checks if a file is an editor lock file such as `~$Budget.xlsx`
pub fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(LOCK_FILE_PREFIX))
}

/// Checks if a path matches any of the glob ignore patterns
pub fn should_ignore(path: &Path, ignore_patterns: &[String]) -> bool {
    if ignore_patterns.is_empty() {
        return false;
    }
    let normalized_path = path.to_string_lossy().replace('\\', "/");
    ignore_patterns.iter().any(|pattern| {
        Pattern::new(pattern)
            .map(|p| p.matches(&normalized_path))
            .unwrap_or(false)
    })
}

/// Determines if a file is a search candidate by name alone
pub fn should_include_file(path: &Path, extensions: &[&str], ignore_patterns: &[String]) -> bool {
    !is_lock_file(path)
        && has_valid_extension(path, extensions)
        && !should_ignore(path, ignore_patterns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_valid_extension() {
        let extensions = ["xlsx", "xls"];
        assert!(has_valid_extension(Path::new("book.xlsx"), &extensions));
        assert!(has_valid_extension(Path::new("BOOK.XLS"), &extensions)); // Test case insensitivity
        assert!(!has_valid_extension(Path::new("report.pdf"), &extensions));
        assert!(!has_valid_extension(Path::new("xlsx"), &extensions)); // No extension
    }

    #[test]
    fn test_is_lock_file() {
        assert!(is_lock_file(Path::new("dir/~$Budget.xlsx")));
        assert!(!is_lock_file(Path::new("dir/Budget.xlsx")));
        assert!(!is_lock_file(Path::new("~$dir/Budget.xlsx")));
    }

    #[test]
    fn test_should_ignore() {
        let ignore_patterns = vec!["**/archive/**".to_string(), "**/*-draft.pdf".to_string()];

        assert!(should_ignore(Path::new("reports/archive/2019.xlsx"), &ignore_patterns));
        assert!(should_ignore(Path::new("reports/q1-draft.pdf"), &ignore_patterns));
        assert!(!should_ignore(Path::new("reports/q1.pdf"), &ignore_patterns));
        assert!(!should_ignore(Path::new("reports/q1.pdf"), &[]));
    }

    #[test]
    fn test_file_type_from_path() {
        assert_eq!(FileType::from_path(Path::new("a.xlsx")), Some(FileType::Excel));
        assert_eq!(FileType::from_path(Path::new("a.XLS")), Some(FileType::Excel));
        assert_eq!(FileType::from_path(Path::new("a.Pdf")), Some(FileType::Pdf));
        assert_eq!(FileType::from_path(Path::new("a.docx")), None);
        assert_eq!(FileType::from_path(Path::new("pdf")), None);
    }

    #[test]
    fn test_should_include_file() {
        let extensions = ["xlsx", "xls", "pdf"];
        let ignore_patterns = vec!["**/tmp/**".to_string()];

        assert!(should_include_file(Path::new("docs/a.pdf"), &extensions, &ignore_patterns));
        assert!(!should_include_file(Path::new("docs/~$a.xlsx"), &extensions, &ignore_patterns));
        assert!(!should_include_file(Path::new("docs/a.txt"), &extensions, &ignore_patterns));
        assert!(!should_include_file(Path::new("docs/tmp/a.pdf"), &extensions, &ignore_patterns));
    }
}
