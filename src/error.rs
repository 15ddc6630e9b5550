use thiserror::Error;

/// Failures that abort a whole mapping session. Resolver errors are never one
/// of these: they skip the node being expanded.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("mapping cancelled")]
    Cancelled,
}

pub type MapResult<T> = std::result::Result<T, MapError>;

/// Reasons a single candidate symbol could not be turned into an entry point.
///
/// These never abort a traversal. The mapping context logs them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveMiss {
    #[error("symbol {0} has no declaring syntax")]
    NoDeclaration(String),
    #[error("symbol {0} has multiple declaring syntax references")]
    MultipleDeclarations(String),
    #[error("symbol {0} was not declared in the analyzed workspace")]
    NotInSolution(String),
    #[error("symbol {0} has no source location")]
    NoLocation(String),
    #[error("symbol {0} has multiple source locations")]
    MultipleLocations(String),
    #[error("project {project} does not contain document {document}")]
    DocumentNotFound { project: String, document: String },
    #[error("no semantic binding for {0}")]
    MissingBinding(String),
}
