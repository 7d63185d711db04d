macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod error;
pub mod export;
pub mod rules;
pub mod tabular;
pub mod unstructured;

pub use error::ImportError;
pub use export::{export_csv, ExportError, EXPORT_HEADER};
pub use rules::{CategoryRuleEngine, RuleFileError};
pub use tabular::{parse_tabular, ColumnMapping};
pub use unstructured::extract_unstructured;

/// How an uploaded file is read, decided from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Tabular,
    Document,
}

impl SourceKind {
    pub fn from_file_name(name: &str) -> Result<Self, ImportError> {
        let ext = std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(SourceKind::Tabular),
            "pdf" => Ok(SourceKind::Document),
            _ => Err(ImportError::UnsupportedFileType(name.to_string())),
        }
    }
}
