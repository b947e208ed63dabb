// Versioned JSON export format and its integrity checks

pub mod payload;
pub mod validator;

pub use payload::{ExportPayload, EXPORT_VERSION};
pub use validator::{validate_export, IntegrityIssue, IssueKind, Severity, ValidationReport};
