use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::{SearchError, SearchResult};
use crate::filters::FileType;

/// Configuration for a document search.
///
/// # Configuration Locations
///
/// Values are merged from these locations, later ones winning:
/// 1. Global `$CONFIG_DIR/docscout/config.yaml`
/// 2. Local `.docscout.yaml` in the current directory
/// 3. A file passed with `--config`
///
/// # Configuration Format
///
/// ```yaml
/// root_path: "./reports"
/// keyword1: "Invoice"
/// keyword2: "Receipt"
/// logic: "or"            # and | or
/// whole_word: false
/// case_sensitive: false
/// content_only: true     # read cached formula values instead of formula text
/// file_type: "both"      # excel | pdf | both
/// recurse: true
/// ignore_patterns:
///   - "**/archive/**"
/// thread_count: 4
/// log_level: "info"
/// ```
///
/// Command-line arguments take precedence, see [`SearchConfig::merge_with_cli`].
/// A config is turned into the immutable [`SearchCriteria`] of a session by
/// [`SearchConfig::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Root directory to start the search from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Required keyword
    #[serde(default)]
    pub keyword1: String,

    /// Optional second keyword, combined with `keyword1` through `logic`
    #[serde(default)]
    pub keyword2: String,

    /// How the two keywords are combined
    #[serde(default)]
    pub logic: KeywordLogic,

    /// Only count occurrences bounded by word boundaries
    #[serde(default)]
    pub whole_word: bool,

    #[serde(default)]
    pub case_sensitive: bool,

    /// Search cached cell values rather than formula text
    #[serde(default = "default_true")]
    pub content_only: bool,

    /// Which document formats to search
    #[serde(default)]
    pub file_type: FileTypeFilter,

    /// Descend into subdirectories
    #[serde(default = "default_true")]
    pub recurse: bool,

    /// Patterns to ignore (glob syntax, matched against the full path)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Number of files evaluated concurrently; 1 evaluates strictly in order
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Values given on the command line; `None` leaves the file value alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub root_path: Option<PathBuf>,
    pub keyword1: Option<String>,
    pub keyword2: Option<String>,
    pub logic: Option<KeywordLogic>,
    pub whole_word: Option<bool>,
    pub case_sensitive: Option<bool>,
    pub content_only: Option<bool>,
    pub file_type: Option<FileTypeFilter>,
    pub recurse: Option<bool>,
    /// Replaces the file's patterns when not empty
    pub ignore_patterns: Vec<String>,
    pub thread_count: Option<NonZeroUsize>,
    pub log_level: Option<String>,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            keyword1: String::new(),
            keyword2: String::new(),
            logic: KeywordLogic::default(),
            whole_word: false,
            case_sensitive: false,
            content_only: true,
            file_type: FileTypeFilter::default(),
            recurse: true,
            ignore_patterns: Vec::new(),
            thread_count: default_thread_count(),
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let default_files = [
            dirs::config_dir().map(|p| p.join("docscout/config.yaml")),
            Some(PathBuf::from(".docscout.yaml")),
        ];

        for path in default_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file has to exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Writes the config as YAML, in the format [`SearchConfig::load_from`] reads
    pub fn save_to(&self, path: &Path) -> SearchResult<()> {
        let yaml = serde_yaml::to_string(self).map_err(|e| {
            SearchError::config_error(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Merges CLI arguments with configuration file values.
    ///
    /// Every value given on the command line wins, including one that
    /// restores a default the file changed.
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if let Some(keyword1) = cli.keyword1.filter(|k| !k.trim().is_empty()) {
            self.keyword1 = keyword1;
        }
        if let Some(keyword2) = cli.keyword2.filter(|k| !k.trim().is_empty()) {
            self.keyword2 = keyword2;
        }
        if let Some(logic) = cli.logic {
            self.logic = logic;
        }
        if let Some(whole_word) = cli.whole_word {
            self.whole_word = whole_word;
        }
        if let Some(case_sensitive) = cli.case_sensitive {
            self.case_sensitive = case_sensitive;
        }
        if let Some(content_only) = cli.content_only {
            self.content_only = content_only;
        }
        if let Some(file_type) = cli.file_type {
            self.file_type = file_type;
        }
        if let Some(recurse) = cli.recurse {
            self.recurse = recurse;
        }
        if !cli.ignore_patterns.is_empty() {
            self.ignore_patterns = cli.ignore_patterns;
        }
        if let Some(thread_count) = cli.thread_count {
            self.thread_count = thread_count;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }

    /// Checks the config and freezes it into the criteria of one session
    pub fn validate(&self) -> SearchResult<SearchCriteria> {
        let keyword1 = self.keyword1.trim();
        if keyword1.is_empty() {
            return Err(SearchError::invalid_criteria("keyword 1 must not be blank"));
        }
        if self.root_path.as_os_str().is_empty() {
            return Err(SearchError::invalid_criteria("no folder selected"));
        }
        if !self.root_path.is_dir() {
            return Err(SearchError::invalid_criteria(format!(
                "folder does not exist or is not a directory: {}",
                self.root_path.display()
            )));
        }
        for pattern in &self.ignore_patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                SearchError::invalid_criteria(format!("invalid ignore pattern '{}': {}", pattern, e))
            })?;
        }

        let keyword2 = self.keyword2.trim();
        Ok(SearchCriteria {
            root_path: self.root_path.clone(),
            keyword1: keyword1.to_string(),
            keyword2: (!keyword2.is_empty()).then(|| keyword2.to_string()),
            logic: self.logic,
            whole_word: self.whole_word,
            case_sensitive: self.case_sensitive,
            content_only: self.content_only,
            file_type: self.file_type,
            recurse: self.recurse,
            ignore_patterns: self.ignore_patterns.clone(),
            thread_count: self.thread_count,
        })
    }
}

/// The validated, immutable input of one scan session.
///
/// Keywords are trimmed; `keyword2` is `None` when blank, in which case
/// `logic` plays no part in the decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub root_path: PathBuf,
    pub keyword1: String,
    pub keyword2: Option<String>,
    pub logic: KeywordLogic,
    pub whole_word: bool,
    pub case_sensitive: bool,
    pub content_only: bool,
    pub file_type: FileTypeFilter,
    pub recurse: bool,
    pub ignore_patterns: Vec<String>,
    pub thread_count: NonZeroUsize,
}

impl SearchCriteria {
    /// File extensions admitted by the file type filter
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        self.file_type.extensions()
    }
}

/// How keyword 1 and keyword 2 combine into a file-level decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordLogic {
    #[default]
    #[serde(alias = "AND", alias = "And")]
    And,
    #[serde(alias = "OR", alias = "Or")]
    Or,
}

impl FromStr for KeywordLogic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            other => Err(format!("unknown keyword logic '{}', expected and|or", other)),
        }
    }
}

impl fmt::Display for KeywordLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Or => f.write_str("OR"),
        }
    }
}

/// Which document formats a search covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileTypeFilter {
    #[serde(alias = "Excel")]
    Excel,
    #[serde(alias = "PDF", alias = "Pdf")]
    Pdf,
    #[default]
    #[serde(alias = "Both")]
    Both,
}

impl FileTypeFilter {
    /// Extensions (lowercase, without the dot) this filter admits
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Excel => FileType::Excel.extensions(),
            Self::Pdf => FileType::Pdf.extensions(),
            Self::Both => &["xlsx", "xls", "pdf"],
        }
    }
}

impl FromStr for FileTypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "excel" => Ok(Self::Excel),
            "pdf" => Ok(Self::Pdf),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "unknown file type '{}', expected excel|pdf|both",
                other
            )),
        }
    }
}
