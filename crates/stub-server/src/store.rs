//! In-memory record store behind the stub API.
//!
//! Care plans are held with their goals nested, and goals with their interventions and reviews
//! nested, which is the shape the list endpoints return.

use crate::{StubError, StubResult};
use careplan_types::{NonEmptyText, Title};
use careplan_wire::{
    CarePlan, CarePlanPayload, CarePlanStatus, EntityId, EntityKind, Goal, GoalPayload,
    Intervention, InterventionPayload, Review, ReviewPayload, StaffMember,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Page size used when none is configured.
pub const DEFAULT_PER_PAGE: u32 = 15;

/// How an injected failure presents to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StubFailure {
    /// `500` with a failure envelope.
    ServerError,
    /// `200` with `success: false`.
    Rejected,
    /// `500` with an empty body.
    Bare,
}

#[derive(Debug, Default)]
struct Inner {
    care_plans: Vec<CarePlan>,
    staff: Vec<StaffMember>,
    pending_failures: HashMap<EntityKind, StubFailure>,
    creation_attempts: HashMap<EntityKind, usize>,
}

/// Shared handle to the stub's records. Cloning shares the same records.
#[derive(Clone, Debug)]
pub struct StubStore {
    inner: Arc<Mutex<Inner>>,
    token: Option<Arc<str>>,
    per_page: u32,
}

fn new_id() -> StubResult<EntityId> {
    EntityId::new(uuid::Uuid::new_v4().simple().to_string())
        .map_err(|e| StubError::Internal(format!("generated id: {e}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl StubStore {
    /// Creates an empty store. When `token` is set, every API call must present it as a bearer
    /// token.
    pub fn new(token: Option<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            token: token.filter(|t| !t.is_empty()).map(Arc::from),
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub(crate) fn accepts_token(&self, presented: Option<&str>) -> bool {
        match &self.token {
            None => true,
            Some(expected) => presented == Some(expected.as_ref()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next creation of `kind` fail as described by `failure`.
    pub fn fail_next(&self, kind: EntityKind, failure: StubFailure) {
        self.lock().pending_failures.insert(kind, failure);
    }

    /// Number of creation requests received for `kind`, successful or not.
    pub fn creation_attempts(&self, kind: EntityKind) -> usize {
        self.lock()
            .creation_attempts
            .get(&kind)
            .copied()
            .unwrap_or_default()
    }

    pub fn care_plans(&self) -> Vec<CarePlan> {
        self.lock().care_plans.clone()
    }

    pub fn care_plan(&self, id: &EntityId) -> Option<CarePlan> {
        self.lock().care_plans.iter().find(|p| &p.id == id).cloned()
    }

    pub fn staff(&self) -> Vec<StaffMember> {
        self.lock().staff.clone()
    }

    pub fn interventions_for(&self, goal_id: &EntityId) -> StubResult<Vec<Intervention>> {
        let inner = self.lock();
        find_goal(&inner.care_plans, goal_id)
            .map(|g| g.interventions.clone())
            .ok_or_else(|| StubError::NotFound(format!("goal {goal_id} not found")))
    }

    pub fn reviews_for(&self, goal_id: &EntityId) -> StubResult<Vec<Review>> {
        let inner = self.lock();
        find_goal(&inner.care_plans, goal_id)
            .map(|g| g.reviews.clone())
            .ok_or_else(|| StubError::NotFound(format!("goal {goal_id} not found")))
    }

    /// Records a creation attempt and consumes any failure injected for `kind`.
    fn begin_creation(&self, kind: EntityKind) -> StubResult<()> {
        let mut inner = self.lock();
        *inner.creation_attempts.entry(kind).or_default() += 1;
        match inner.pending_failures.remove(&kind) {
            Some(StubFailure::ServerError) => Err(StubError::Injected(format!(
                "{} could not be saved",
                kind.label()
            ))),
            Some(StubFailure::Rejected) => Err(StubError::Rejected(format!(
                "{} was not accepted",
                kind.label()
            ))),
            Some(StubFailure::Bare) => Err(StubError::Bare),
            None => Ok(()),
        }
    }

    pub fn create_care_plan(&self, payload: CarePlanPayload) -> StubResult<CarePlan> {
        self.begin_creation(EntityKind::CarePlan)?;
        let title = Title::new(&payload.title)
            .map_err(|e| StubError::Invalid(format!("title: {e}")))?;

        let plan = CarePlan {
            id: new_id()?,
            visit_id: payload.visit_id,
            title: title.into_inner(),
            description: non_blank(payload.description),
            status: payload.status,
            goals: Vec::new(),
        };
        self.lock().care_plans.push(plan.clone());
        tracing::info!("created care plan {}", plan.id);
        Ok(plan)
    }

    pub fn create_goal(&self, payload: GoalPayload) -> StubResult<Goal> {
        self.begin_creation(EntityKind::Goal)?;
        let title = required(&payload.title, "title")?;

        let mut inner = self.lock();
        let plan = inner
            .care_plans
            .iter_mut()
            .find(|p| p.id == payload.care_plan_id)
            .ok_or_else(|| {
                StubError::NotFound(format!("care plan {} not found", payload.care_plan_id))
            })?;

        let goal = Goal {
            id: new_id()?,
            care_plan_id: payload.care_plan_id,
            title,
            notes: non_blank(payload.notes),
            target_metric: non_blank(payload.target_metric),
            deadline: non_blank(payload.deadline),
            interventions: Vec::new(),
            reviews: Vec::new(),
        };
        plan.goals.push(goal.clone());
        tracing::info!("created goal {}", goal.id);
        Ok(goal)
    }

    pub fn create_intervention(&self, payload: InterventionPayload) -> StubResult<Intervention> {
        self.begin_creation(EntityKind::Intervention)?;
        let title = required(&payload.title, "title")?;

        let mut inner = self.lock();
        let goal = find_goal_mut(&mut inner.care_plans, &payload.care_plan_goal_id)
            .ok_or_else(|| {
                StubError::NotFound(format!("goal {} not found", payload.care_plan_goal_id))
            })?;

        let intervention = Intervention {
            id: new_id()?,
            care_plan_goal_id: payload.care_plan_goal_id,
            title,
            instructions: non_blank(payload.instructions),
            assigned_staff_id: payload.assigned_staff_id,
            deadline: non_blank(payload.deadline),
        };
        goal.interventions.push(intervention.clone());
        tracing::info!("created intervention {}", intervention.id);
        Ok(intervention)
    }

    pub fn create_review(&self, payload: ReviewPayload) -> StubResult<Review> {
        self.begin_creation(EntityKind::Review)?;
        required(&payload.review_date, "review_date")?;

        let mut inner = self.lock();
        let goal = find_goal_mut(&mut inner.care_plans, &payload.care_plan_goal_id)
            .ok_or_else(|| {
                StubError::NotFound(format!("goal {} not found", payload.care_plan_goal_id))
            })?;

        let review = Review {
            id: new_id()?,
            care_plan_goal_id: payload.care_plan_goal_id,
            reviewed_by: Some(payload.reviewed_by),
            review_date: Some(payload.review_date),
            notes: non_blank(payload.notes),
            updated_goals: payload.updated_goals,
            updated_interventions: payload.updated_interventions,
        };
        goal.reviews.push(review.clone());
        tracing::info!("created review {}", review.id);
        Ok(review)
    }

    /// Seeding helpers insert records directly, without counting as creation attempts.
    pub fn seed_staff(&self, name: &str) -> StubResult<EntityId> {
        let member = StaffMember {
            id: new_id()?,
            name: Some(name.to_string()),
            first_name: None,
            last_name: None,
            email: None,
        };
        let id = member.id.clone();
        self.lock().staff.push(member);
        Ok(id)
    }

    pub fn seed_care_plan(&self, visit_id: &str, title: &str) -> StubResult<EntityId> {
        let visit_id =
            EntityId::new(visit_id).map_err(|e| StubError::Invalid(format!("visit_id: {e}")))?;
        let id = new_id()?;
        self.lock().care_plans.push(CarePlan {
            id: id.clone(),
            visit_id,
            title: title.to_string(),
            description: None,
            status: CarePlanStatus::Active,
            goals: Vec::new(),
        });
        Ok(id)
    }

    pub fn seed_goal(&self, care_plan_id: &EntityId, title: &str) -> StubResult<EntityId> {
        let mut inner = self.lock();
        let plan = inner
            .care_plans
            .iter_mut()
            .find(|p| &p.id == care_plan_id)
            .ok_or_else(|| StubError::NotFound(format!("care plan {care_plan_id} not found")))?;
        let id = new_id()?;
        plan.goals.push(Goal {
            id: id.clone(),
            care_plan_id: care_plan_id.clone(),
            title: title.to_string(),
            notes: None,
            target_metric: None,
            deadline: None,
            interventions: Vec::new(),
            reviews: Vec::new(),
        });
        Ok(id)
    }

    pub fn seed_intervention(&self, goal_id: &EntityId, title: &str) -> StubResult<EntityId> {
        let mut inner = self.lock();
        let goal = find_goal_mut(&mut inner.care_plans, goal_id)
            .ok_or_else(|| StubError::NotFound(format!("goal {goal_id} not found")))?;
        let id = new_id()?;
        goal.interventions.push(Intervention {
            id: id.clone(),
            care_plan_goal_id: goal_id.clone(),
            title: title.to_string(),
            instructions: None,
            assigned_staff_id: None,
            deadline: None,
        });
        Ok(id)
    }

    /// Loads a YAML seed file into the store.
    ///
    /// ```yaml
    /// staff:
    ///   - Dr Ada Okafor
    /// care_plans:
    ///   - visit_id: V1
    ///     title: Post-op Mobility Plan
    ///     goals:
    ///       - title: Walk unaided
    ///         interventions: [Ankle ROM exercises]
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`StubError::Seed`] if the file cannot be read or does not match the layout above.
    pub fn load_seed_file(&self, path: &Path) -> StubResult<()> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StubError::Seed(format!("failed to read {}: {e}", path.display())))?;
        let seed: SeedFile = serde_yaml::from_str(&text)
            .map_err(|e| StubError::Seed(format!("invalid seed file: {e}")))?;

        for name in &seed.staff {
            self.seed_staff(name.as_str())?;
        }
        for plan in seed.care_plans {
            let plan_id = self.seed_care_plan(&plan.visit_id, plan.title.as_str())?;
            for goal in plan.goals {
                let goal_id = self.seed_goal(&plan_id, goal.title.as_str())?;
                for intervention in goal.interventions {
                    self.seed_intervention(&goal_id, intervention.as_str())?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    staff: Vec<NonEmptyText>,
    #[serde(default)]
    care_plans: Vec<SeedCarePlan>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedCarePlan {
    visit_id: String,
    title: Title,
    #[serde(default)]
    goals: Vec<SeedGoal>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedGoal {
    title: NonEmptyText,
    #[serde(default)]
    interventions: Vec<NonEmptyText>,
}

fn required(value: &str, field: &str) -> StubResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StubError::Invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn find_goal<'a>(plans: &'a [CarePlan], goal_id: &EntityId) -> Option<&'a Goal> {
    plans
        .iter()
        .flat_map(|p| p.goals.iter())
        .find(|g| &g.id == goal_id)
}

fn find_goal_mut<'a>(plans: &'a mut [CarePlan], goal_id: &EntityId) -> Option<&'a mut Goal> {
    plans
        .iter_mut()
        .flat_map(|p| p.goals.iter_mut())
        .find(|g| &g.id == goal_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn goal_payload(care_plan_id: &EntityId) -> GoalPayload {
        GoalPayload {
            care_plan_id: care_plan_id.clone(),
            title: "Walk unaided".into(),
            notes: Some("  ".into()),
            target_metric: None,
            deadline: None,
        }
    }

    #[test]
    fn injected_failure_is_consumed_once() {
        let store = StubStore::new(None);
        let plan = store.seed_care_plan("V1", "Plan").expect("seed plan");
        store.fail_next(EntityKind::Goal, StubFailure::ServerError);

        let err = store
            .create_goal(goal_payload(&plan))
            .expect_err("injected failure");
        assert!(matches!(err, StubError::Injected(_)));

        let goal = store.create_goal(goal_payload(&plan)).expect("second try");
        assert_eq!(goal.notes, None);
        assert_eq!(store.creation_attempts(EntityKind::Goal), 2);
        assert_eq!(store.care_plan(&plan).expect("plan").goals.len(), 1);
    }

    #[test]
    fn bare_failure_is_injected_like_the_others() {
        let store = StubStore::new(None);
        let plan = store.seed_care_plan("V1", "Plan").expect("seed plan");
        store.fail_next(EntityKind::Goal, StubFailure::Bare);

        let err = store
            .create_goal(goal_payload(&plan))
            .expect_err("bare failure");
        assert!(matches!(err, StubError::Bare));
        assert!(store.care_plan(&plan).expect("plan").goals.is_empty());
    }

    #[test]
    fn seeded_staff_get_distinct_ids() {
        let store = StubStore::new(None);
        let first = store.seed_staff("Dr Okafor").expect("seed staff");
        let second = store.seed_staff("Nurse Ali").expect("seed staff");
        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 32);
        assert_eq!(store.staff().len(), 2);
    }

    #[test]
    fn care_plan_title_must_have_three_characters() {
        let store = StubStore::new(None);
        let err = store
            .create_care_plan(CarePlanPayload {
                visit_id: EntityId::new("V1").expect("id"),
                title: "ab".into(),
                description: None,
                status: CarePlanStatus::Active,
            })
            .expect_err("too short");
        assert!(matches!(err, StubError::Invalid(msg) if msg.contains("at least 3")));
        assert!(store.care_plans().is_empty());
    }

    #[test]
    fn intervention_requires_existing_goal() {
        let store = StubStore::new(None);
        let err = store
            .create_intervention(InterventionPayload {
                care_plan_goal_id: EntityId::new("nope").expect("id"),
                title: "Ankle ROM exercises".into(),
                instructions: None,
                assigned_staff_id: None,
                deadline: None,
            })
            .expect_err("unknown goal");
        assert!(matches!(err, StubError::NotFound(_)));
    }

    #[test]
    fn loads_seed_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "staff:\n  - Dr Ada Okafor\ncare_plans:\n  - visit_id: V1\n    title: Post-op Mobility Plan\n    goals:\n      - title: Walk unaided\n        interventions: [Ankle ROM exercises]\n"
        )
        .expect("write seed");

        let store = StubStore::new(None);
        store.load_seed_file(file.path()).expect("load seed");

        let plans = store.care_plans();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].goals[0].interventions[0].title, "Ankle ROM exercises");
        assert_eq!(store.staff()[0].display_name(), "Dr Ada Okafor");
    }

    #[test]
    fn seed_file_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "patients: []").expect("write seed");

        let err = StubStore::new(None)
            .load_seed_file(file.path())
            .expect_err("unknown key");
        assert!(matches!(err, StubError::Seed(msg) if msg.contains("patients")));
    }

    #[test]
    fn seed_file_titles_follow_field_rules() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "care_plans:\n  - visit_id: V1\n    title: ab\n").expect("write seed");

        let store = StubStore::new(None);
        let err = store.load_seed_file(file.path()).expect_err("short title");
        assert!(matches!(err, StubError::Seed(msg) if msg.contains("at least 3")));
        assert!(store.care_plans().is_empty());
    }
}
