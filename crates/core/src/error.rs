use careplan_types::TextError;

/// Local failures detected before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: {source}")]
    Text {
        field: &'static str,
        source: TextError,
    },
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("no {0} could be resolved; select one first")]
    UnresolvedParent(&'static str),
    #[error("{field} must be a YYYY-MM-DD date, got '{value}'")]
    InvalidDate { field: &'static str, value: String },
}

/// Reasons a workflow action was refused outright.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("the workflow is not open")]
    Closed,
    #[error("a request is already in flight")]
    Busy,
    #[error("no request is in flight")]
    NothingPending,
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;
