use thiserror::Error;

pub type Result<T> = std::result::Result<T, KoralError>;

#[derive(Error, Debug, strum_macros::IntoStaticStr)]
#[non_exhaustive]
pub enum KoralError {
    /// The external parser front end could not derive a syntax tree for the
    /// query. Translation is abandoned, no partial result is produced.
    #[error("could not parse query: {0}")]
    ParseFailure(String),
    /// An explicit reference label was bound twice within one query.
    #[error("reference #{0} is already defined")]
    DuplicateReference(String),
    /// A consumed `#n`-style reference has no matching definition.
    #[error("reference #{0} could not be resolved")]
    UnresolvedReference(String),
    /// The query did not produce a top-level graph node, e.g. because it was
    /// empty. Reported as a failure, never as a null success.
    #[error("query is empty")]
    EmptyQuery,
    #[error(transparent)]
    Diagnostic(#[from] SruDiagnostic),
    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),
}

impl KoralError {
    /// Stable name of the error kind, independent of the carried detail.
    /// Useful as a log field or for counting failures by kind.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// A language-specific semantic error, mapped to the fixed numeric SRU
/// diagnostic vocabulary that calling protocols surface verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("SRU diagnostic {code}: {message}")]
pub struct SruDiagnostic {
    pub code: u16,
    pub message: String,
}

impl SruDiagnostic {
    pub fn new(code: u16, message: impl Into<String>) -> SruDiagnostic {
        SruDiagnostic {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_names_are_stable() {
        assert_eq!("EmptyQuery", KoralError::EmptyQuery.kind());
        assert_eq!(
            "UnresolvedReference",
            KoralError::UnresolvedReference("1".to_string()).kind()
        );
        assert_eq!(
            "Diagnostic",
            KoralError::from(SruDiagnostic::new(27, "An empty term is unsupported")).kind()
        );
    }
}
