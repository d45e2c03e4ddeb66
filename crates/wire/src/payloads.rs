//! Request bodies for entity creation.
//!
//! Every key of a payload is always sent; absent optional values are sent as `null`.

use crate::{CarePlanStatus, EntityId};
use serde::{Deserialize, Serialize};

/// Body returned by every creation endpoint.
///
/// Only the server-assigned id is required; the rest of the echoed entity is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Created {
    pub id: EntityId,
}

/// Body of `POST /care-plans`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CarePlanPayload {
    pub visit_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: CarePlanStatus,
}

/// Body of `POST /care-plans/goals`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GoalPayload {
    pub care_plan_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub target_metric: Option<String>,
    /// ISO `YYYY-MM-DD` date.
    #[serde(default)]
    pub deadline: Option<String>,
}

/// Body of `POST /care-plans/interventions`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct InterventionPayload {
    pub care_plan_goal_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub assigned_staff_id: Option<EntityId>,
    /// ISO `YYYY-MM-DD` date.
    #[serde(default)]
    pub deadline: Option<String>,
}

/// Body of `POST /care-plans/reviews`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ReviewPayload {
    pub care_plan_goal_id: EntityId,
    pub reviewed_by: EntityId,
    /// ISO `YYYY-MM-DD` date.
    pub review_date: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub updated_goals: Vec<EntityId>,
    #[serde(default)]
    pub updated_interventions: Vec<EntityId>,
}
