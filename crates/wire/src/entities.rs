//! Entity wire models as returned by the server.
//!
//! Goals arrive nested under care plans, and interventions/reviews may arrive nested under goals
//! or from their own per-goal list endpoints. Nested collections default to empty when absent.

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four entity types the authoring workflow creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    CarePlan,
    Goal,
    Intervention,
    Review,
}

impl EntityKind {
    /// Human-readable label used in operator notifications.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::CarePlan => "Care plan",
            EntityKind::Goal => "Goal",
            EntityKind::Intervention => "Intervention",
            EntityKind::Review => "Review",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Care plan lifecycle status.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum CarePlanStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

impl fmt::Display for CarePlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CarePlanStatus::Active => "active",
            CarePlanStatus::Completed => "completed",
            CarePlanStatus::Cancelled => "cancelled",
        })
    }
}

/// Top-level clinical plan tied to a visit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CarePlan {
    pub id: EntityId,
    pub visit_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: CarePlanStatus,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

/// A measurable objective under a care plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Goal {
    pub id: EntityId,
    pub care_plan_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub target_metric: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub interventions: Vec<Intervention>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// An action prescribed to pursue a goal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Intervention {
    pub id: EntityId,
    pub care_plan_goal_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub assigned_staff_id: Option<EntityId>,
    #[serde(default)]
    pub deadline: Option<String>,
}

/// A periodic evaluation of progress on a goal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Review {
    pub id: EntityId,
    pub care_plan_goal_id: EntityId,
    #[serde(default)]
    pub reviewed_by: Option<EntityId>,
    #[serde(default)]
    pub review_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub updated_goals: Vec<EntityId>,
    #[serde(default)]
    pub updated_interventions: Vec<EntityId>,
}

/// Entry of the staff directory (served from `/doctors`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StaffMember {
    pub id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl StaffMember {
    /// Name shown in staff dropdowns.
    ///
    /// Prefers `name`, then `first_name last_name`, then the email address, then the id.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_owned();
        }

        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if !parts.is_empty() {
            return parts.join(" ");
        }

        self.email
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn care_plan_parses_nested_goals_and_ignores_unknown_keys() {
        let input = r#"{
            "id": 12,
            "visit_id": "V-3",
            "title": "Post-op Mobility Plan",
            "status": "active",
            "created_at": "2024-05-01T10:00:00Z",
            "goals": [
                {
                    "id": 9,
                    "care_plan_id": 12,
                    "title": "Walk unaided",
                    "interventions": [
                        { "id": 100, "care_plan_goal_id": 9, "title": "Ankle ROM exercises" }
                    ]
                }
            ]
        }"#;

        let plan: CarePlan = crate::parse_json(input).expect("parse care plan");
        assert_eq!(plan.id.as_str(), "12");
        assert_eq!(plan.description, None);
        assert_eq!(plan.goals.len(), 1);
        assert_eq!(plan.goals[0].care_plan_id, plan.id);
        assert_eq!(plan.goals[0].interventions[0].title, "Ankle ROM exercises");
        assert!(plan.goals[0].reviews.is_empty());
    }

    #[test]
    fn status_defaults_to_active() {
        let plan: CarePlan =
            serde_json::from_str(r#"{"id":"CP1","visit_id":"V1","title":"Plan"}"#)
                .expect("parse");
        assert_eq!(plan.status, CarePlanStatus::Active);
    }

    #[test]
    fn mismatch_reports_field_path() {
        let err = crate::parse_json::<CarePlan>(
            r#"{"id":"CP1","visit_id":"V1","title":"Plan","goals":[{"id":"G1","care_plan_id":"CP1","title":7}]}"#,
        )
        .expect_err("title has wrong type");
        match err {
            crate::WireError::Translation(msg) => assert!(msg.contains("goals[0].title")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn staff_display_name_falls_back_in_order() {
        let mut member = StaffMember {
            id: EntityId::new("D1").expect("id"),
            name: None,
            first_name: Some("Ada".into()),
            last_name: Some("Okafor".into()),
            email: Some("ada@example.org".into()),
        };
        assert_eq!(member.display_name(), "Ada Okafor");

        member.name = Some("Dr Okafor".into());
        assert_eq!(member.display_name(), "Dr Okafor");

        member.name = None;
        member.first_name = None;
        member.last_name = None;
        assert_eq!(member.display_name(), "ada@example.org");

        member.email = None;
        assert_eq!(member.display_name(), "D1");
    }
}
