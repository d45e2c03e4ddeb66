//! JSON wire models for the care plan HTTP API.
//!
//! This crate provides **wire models** and **parse helpers** for the HTTP boundary:
//! - the four authored entities (care plan, goal, intervention, review) and the staff directory
//! - request payloads for entity creation
//! - the `{ success, data }` response envelope and paginated collections
//!
//! Server responses are parsed leniently (unknown keys are ignored, optional fields default)
//! because the server is owned elsewhere and routinely carries extra bookkeeping fields.
//! Parse failures report the JSON path of the offending field.

pub mod entities;
pub mod envelope;
pub mod id;
pub mod payloads;

pub use entities::{CarePlan, CarePlanStatus, EntityKind, Goal, Intervention, Review, StaffMember};
pub use envelope::{Collection, Envelope, Page};
pub use id::EntityId;
pub use payloads::{CarePlanPayload, Created, GoalPayload, InterventionPayload, ReviewPayload};

/// Errors returned by the `careplan-wire` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Results that can fail with a [`WireError`].
pub type WireResult<T> = Result<T, WireError>;

/// Parse JSON text into `T`, reporting the path of the first mismatching field.
///
/// # Errors
///
/// Returns [`WireError::Translation`] naming the failing path (or `<root>`) when the text is not
/// valid JSON for `T`.
pub fn parse_json<T>(text: &str) -> WireResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let mut deserializer = serde_json::Deserializer::from_str(text);
    match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            Err(WireError::Translation(format!(
                "response schema mismatch at {path}: {source}"
            )))
        }
    }
}
