//! Endpoint paths, as segments relative to the configured base URL.
//!
//! | Entity | Create | Read |
//! |---|---|---|
//! | Care plan | POST `care-plans` | GET `care-plans`, GET `care-plans/{id}` |
//! | Goal | POST `care-plans/goals` | nested under care plans |
//! | Intervention | POST `care-plans/interventions` | GET `care-plans/interventions/{goal_id}` |
//! | Review | POST `care-plans/reviews` | GET `care-plans/reviews/{goal_id}` |
//! | Staff | | GET `doctors` |

use careplan_wire::{EntityId, EntityKind};

pub const CARE_PLANS: &[&str] = &["care-plans"];
pub const GOALS: &[&str] = &["care-plans", "goals"];
pub const INTERVENTIONS: &[&str] = &["care-plans", "interventions"];
pub const REVIEWS: &[&str] = &["care-plans", "reviews"];
pub const STAFF: &[&str] = &["doctors"];

/// Creation endpoint for an entity type.
pub fn create_path(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::CarePlan => CARE_PLANS,
        EntityKind::Goal => GOALS,
        EntityKind::Intervention => INTERVENTIONS,
        EntityKind::Review => REVIEWS,
    }
}

pub fn care_plan_path(id: &EntityId) -> Vec<&str> {
    vec!["care-plans", id.as_str()]
}

pub fn interventions_for_goal(goal_id: &EntityId) -> Vec<&str> {
    vec!["care-plans", "interventions", goal_id.as_str()]
}

pub fn reviews_for_goal(goal_id: &EntityId) -> Vec<&str> {
    vec!["care-plans", "reviews", goal_id.as_str()]
}
