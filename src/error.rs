use thiserror::Error;

/// Failures that abort a whole query or export.
///
/// Per-line parse and validation failures are not represented here. Those are
/// collected as [`ParseError`](crate::models::ParseError) diagnostics while
/// the pipeline keeps going, so one corrupt line never takes down a report.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to read order log '{path}': {source}")]
    Source {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write export '{path}': {source}")]
    Export {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
