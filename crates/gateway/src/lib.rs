//! # Care Plan Gateway
//!
//! Authenticated HTTP access to the care plan API.
//!
//! This crate translates "create / list / get an entity" into a bearer-authenticated HTTP call
//! and a parsed result:
//! - [`EntityGateway`]: the seam the authoring workflow drives (one call in, one result out)
//! - [`HttpGateway`]: the reqwest implementation
//! - [`TokenSupplier`]: where bearer tokens come from
//!
//! The gateway never retries. A failed call is reported once and retrying is left to the operator.

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod config;
pub mod endpoints;
pub mod http;

pub use auth::{StaticToken, TokenSupplier};
pub use config::GatewayConfig;
pub use http::HttpGateway;

use async_trait::async_trait;
use careplan_wire::{
    CarePlan, CarePlanPayload, Created, EntityId, GoalPayload, Intervention, InterventionPayload,
    Review, ReviewPayload, StaffMember, WireError,
};
use std::sync::Arc;

/// Errors returned by gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("server rejected the request: {message}")]
    Rejected { message: String },

    #[error("unexpected response: {0}")]
    Decode(#[from] WireError),
}

impl GatewayError {
    /// Operator-facing description of the failure.
    pub fn message(&self) -> String {
        match self {
            GatewayError::Status { message, .. } | GatewayError::Rejected { message } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Type alias for Results that can fail with a [`GatewayError`].
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Create/read operations for the four authored entity types and the reference lists.
///
/// Implementations are stateless from the caller's point of view: each call is independent and
/// a failure leaves nothing behind on the caller's side.
#[async_trait]
pub trait EntityGateway: Send + Sync {
    async fn create_care_plan(&self, payload: &CarePlanPayload) -> GatewayResult<Created>;

    async fn create_goal(&self, payload: &GoalPayload) -> GatewayResult<Created>;

    async fn create_intervention(&self, payload: &InterventionPayload) -> GatewayResult<Created>;

    async fn create_review(&self, payload: &ReviewPayload) -> GatewayResult<Created>;

    /// All care plans, with goals nested, across every page.
    async fn list_care_plans(&self) -> GatewayResult<Vec<CarePlan>>;

    async fn get_care_plan(&self, id: &EntityId) -> GatewayResult<CarePlan>;

    async fn list_interventions(&self, goal_id: &EntityId) -> GatewayResult<Vec<Intervention>>;

    async fn list_reviews(&self, goal_id: &EntityId) -> GatewayResult<Vec<Review>>;

    /// The staff directory, across every page.
    async fn list_staff(&self) -> GatewayResult<Vec<StaffMember>>;
}

#[async_trait]
impl<G> EntityGateway for Arc<G>
where
    G: EntityGateway + ?Sized,
{
    async fn create_care_plan(&self, payload: &CarePlanPayload) -> GatewayResult<Created> {
        (**self).create_care_plan(payload).await
    }

    async fn create_goal(&self, payload: &GoalPayload) -> GatewayResult<Created> {
        (**self).create_goal(payload).await
    }

    async fn create_intervention(&self, payload: &InterventionPayload) -> GatewayResult<Created> {
        (**self).create_intervention(payload).await
    }

    async fn create_review(&self, payload: &ReviewPayload) -> GatewayResult<Created> {
        (**self).create_review(payload).await
    }

    async fn list_care_plans(&self) -> GatewayResult<Vec<CarePlan>> {
        (**self).list_care_plans().await
    }

    async fn get_care_plan(&self, id: &EntityId) -> GatewayResult<CarePlan> {
        (**self).get_care_plan(id).await
    }

    async fn list_interventions(&self, goal_id: &EntityId) -> GatewayResult<Vec<Intervention>> {
        (**self).list_interventions(goal_id).await
    }

    async fn list_reviews(&self, goal_id: &EntityId) -> GatewayResult<Vec<Review>> {
        (**self).list_reviews(goal_id).await
    }

    async fn list_staff(&self) -> GatewayResult<Vec<StaffMember>> {
        (**self).list_staff().await
    }
}
