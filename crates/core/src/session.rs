//! Session state for one authoring workflow.
//!
//! A [`Session`] is plain data. It is only ever replaced wholesale by the state machine in
//! [`crate::machine`]; nothing mutates it behind the machine's back.

use careplan_wire::{CarePlanStatus, EntityId, EntityKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which entity the host asked to author.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Single-step care plan creation.
    CarePlan,
    /// Four-step wizard: care plan, goal, intervention, review.
    #[default]
    Goal,
    /// Single-step intervention creation.
    Intervention,
    /// Single-step review creation.
    Review,
}

impl Mode {
    /// Only goal mode walks between steps.
    pub fn is_wizard(self) -> bool {
        matches!(self, Mode::Goal)
    }
}

/// Wizard position. Single-entity modes sit on the step of their entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    #[default]
    CarePlan,
    Goal,
    Intervention,
    Review,
}

impl Step {
    pub const LAST: Step = Step::Review;

    pub fn index(self) -> usize {
        match self {
            Step::CarePlan => 0,
            Step::Goal => 1,
            Step::Intervention => 2,
            Step::Review => 3,
        }
    }

    pub fn next(self) -> Option<Step> {
        match self {
            Step::CarePlan => Some(Step::Goal),
            Step::Goal => Some(Step::Intervention),
            Step::Intervention => Some(Step::Review),
            Step::Review => None,
        }
    }

    pub fn previous(self) -> Option<Step> {
        match self {
            Step::CarePlan => None,
            Step::Goal => Some(Step::CarePlan),
            Step::Intervention => Some(Step::Goal),
            Step::Review => Some(Step::Intervention),
        }
    }

    /// The entity created on this step.
    pub fn kind(self) -> EntityKind {
        match self {
            Step::CarePlan => EntityKind::CarePlan,
            Step::Goal => EntityKind::Goal,
            Step::Intervention => EntityKind::Intervention,
            Step::Review => EntityKind::Review,
        }
    }
}

/// Everything the host knows when it opens the workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenContext {
    pub mode: Mode,
    /// Initial step in goal mode. Ignored by the single-entity modes.
    #[serde(default)]
    pub start_step: Option<Step>,
    /// Visit a new care plan is attached to.
    #[serde(default)]
    pub visit_id: Option<EntityId>,
    /// Care plan the host is currently managing.
    #[serde(default)]
    pub care_plan_id: Option<EntityId>,
    /// Goal the host is currently managing.
    #[serde(default)]
    pub goal_id: Option<EntityId>,
    /// Default review date.
    pub today: NaiveDate,
}

impl OpenContext {
    pub fn new(mode: Mode, today: NaiveDate) -> Self {
        Self {
            mode,
            start_step: None,
            visit_id: None,
            care_plan_id: None,
            goal_id: None,
            today,
        }
    }

    pub fn for_visit(mut self, visit_id: EntityId) -> Self {
        self.visit_id = Some(visit_id);
        self
    }

    pub fn managing_care_plan(mut self, care_plan_id: EntityId) -> Self {
        self.care_plan_id = Some(care_plan_id);
        self
    }

    pub fn managing_goal(mut self, goal_id: EntityId) -> Self {
        self.goal_id = Some(goal_id);
        self
    }

    pub fn starting_at(mut self, step: Step) -> Self {
        self.start_step = Some(step);
        self
    }

    /// Step the session opens on.
    pub fn entry_step(&self) -> Step {
        match self.mode {
            Mode::CarePlan => Step::CarePlan,
            Mode::Goal => self.start_step.unwrap_or(Step::CarePlan),
            Mode::Intervention => Step::Intervention,
            Mode::Review => Step::Review,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CarePlanForm {
    pub title: String,
    pub description: String,
    pub status: CarePlanStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GoalForm {
    pub title: String,
    pub notes: String,
    pub target_metric: String,
    pub deadline: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterventionForm {
    /// Explicitly selected goal; `None` defers to the resolver.
    pub goal_id: Option<EntityId>,
    pub title: String,
    pub instructions: String,
    pub assigned_staff_id: Option<EntityId>,
    pub deadline: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReviewForm {
    /// Explicitly selected goal; `None` defers to the resolver.
    pub goal_id: Option<EntityId>,
    pub reviewed_by: Option<EntityId>,
    pub review_date: String,
    pub notes: String,
    pub updated_goals: BTreeSet<EntityId>,
    pub updated_interventions: BTreeSet<EntityId>,
}

/// Field values of all four steps. Values survive moving between steps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Forms {
    pub care_plan: CarePlanForm,
    pub goal: GoalForm,
    pub intervention: InterventionForm,
    pub review: ReviewForm,
}

/// A single field change. Dates stay raw text until a payload is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldEdit {
    CarePlanTitle(String),
    CarePlanDescription(String),
    CarePlanStatus(CarePlanStatus),
    GoalTitle(String),
    GoalNotes(String),
    GoalTargetMetric(String),
    GoalDeadline(String),
    InterventionGoal(Option<EntityId>),
    InterventionTitle(String),
    InterventionInstructions(String),
    InterventionStaff(Option<EntityId>),
    InterventionDeadline(String),
    ReviewGoal(Option<EntityId>),
    ReviewReviewer(Option<EntityId>),
    ReviewDate(String),
    ReviewNotes(String),
    /// Adds the goal to the review's updated set, or removes it if present.
    ReviewToggleGoal(EntityId),
    /// Adds the intervention to the review's updated set, or removes it if present.
    ReviewToggleIntervention(EntityId),
}

fn toggle(set: &mut BTreeSet<EntityId>, id: EntityId) {
    if !set.remove(&id) {
        set.insert(id);
    }
}

impl Forms {
    pub fn apply(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::CarePlanTitle(v) => self.care_plan.title = v,
            FieldEdit::CarePlanDescription(v) => self.care_plan.description = v,
            FieldEdit::CarePlanStatus(v) => self.care_plan.status = v,
            FieldEdit::GoalTitle(v) => self.goal.title = v,
            FieldEdit::GoalNotes(v) => self.goal.notes = v,
            FieldEdit::GoalTargetMetric(v) => self.goal.target_metric = v,
            FieldEdit::GoalDeadline(v) => self.goal.deadline = v,
            FieldEdit::InterventionGoal(v) => self.intervention.goal_id = v,
            FieldEdit::InterventionTitle(v) => self.intervention.title = v,
            FieldEdit::InterventionInstructions(v) => self.intervention.instructions = v,
            FieldEdit::InterventionStaff(v) => self.intervention.assigned_staff_id = v,
            FieldEdit::InterventionDeadline(v) => self.intervention.deadline = v,
            FieldEdit::ReviewGoal(v) => self.review.goal_id = v,
            FieldEdit::ReviewReviewer(v) => self.review.reviewed_by = v,
            FieldEdit::ReviewDate(v) => self.review.review_date = v,
            FieldEdit::ReviewNotes(v) => self.review.notes = v,
            FieldEdit::ReviewToggleGoal(id) => toggle(&mut self.review.updated_goals, id),
            FieldEdit::ReviewToggleIntervention(id) => {
                toggle(&mut self.review.updated_interventions, id)
            }
        }
    }
}

/// What happens once the in-flight creation call succeeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AfterCreate {
    /// Move to the next wizard step.
    Advance,
    /// Notify, refresh the host and close.
    Complete,
}

/// A creation call that has been requested but not yet resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pending {
    pub kind: EntityKind,
    pub then: AfterCreate,
}

/// The state of one workflow instance. `Session::default()` is the closed state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub(crate) open: bool,
    pub(crate) mode: Mode,
    pub(crate) step: Step,
    pub(crate) context: Option<OpenContext>,
    pub(crate) forms: Forms,
    pub(crate) created_care_plan_id: Option<EntityId>,
    pub(crate) created_goal_id: Option<EntityId>,
    pub(crate) pending: Option<Pending>,
}

impl Session {
    /// Fresh session for `context`. The review date starts at the context's `today`.
    pub fn opened(context: OpenContext) -> Self {
        let mut forms = Forms::default();
        forms.review.review_date = context.today.format("%Y-%m-%d").to_string();
        Self {
            open: true,
            mode: context.mode,
            step: context.entry_step(),
            context: Some(context),
            forms,
            created_care_plan_id: None,
            created_goal_id: None,
            pending: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn context(&self) -> Option<&OpenContext> {
        self.context.as_ref()
    }

    pub fn forms(&self) -> &Forms {
        &self.forms
    }

    pub fn created_care_plan_id(&self) -> Option<&EntityId> {
        self.created_care_plan_id.as_ref()
    }

    pub fn created_goal_id(&self) -> Option<&EntityId> {
        self.created_goal_id.as_ref()
    }

    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    /// True while a creation call is in flight.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// The care plan whose goals are listed first: created this session, else the host's.
    pub fn managed_care_plan_id(&self) -> Option<&EntityId> {
        self.created_care_plan_id
            .as_ref()
            .or_else(|| self.context.as_ref().and_then(|c| c.care_plan_id.as_ref()))
    }

    pub(crate) fn context_care_plan_id(&self) -> Option<&EntityId> {
        self.context.as_ref().and_then(|c| c.care_plan_id.as_ref())
    }

    pub(crate) fn context_goal_id(&self) -> Option<&EntityId> {
        self.context.as_ref().and_then(|c| c.goal_id.as_ref())
    }

    pub(crate) fn context_visit_id(&self) -> Option<&EntityId> {
        self.context.as_ref().and_then(|c| c.visit_id.as_ref())
    }

    pub(crate) fn today(&self) -> Option<NaiveDate> {
        self.context.as_ref().map(|c| c.today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    }

    fn id(value: &str) -> EntityId {
        EntityId::new(value).expect("valid id")
    }

    #[test]
    fn entry_step_follows_mode() {
        assert_eq!(OpenContext::new(Mode::CarePlan, today()).entry_step(), Step::CarePlan);
        assert_eq!(OpenContext::new(Mode::Goal, today()).entry_step(), Step::CarePlan);
        assert_eq!(
            OpenContext::new(Mode::Goal, today())
                .starting_at(Step::Goal)
                .entry_step(),
            Step::Goal
        );
        assert_eq!(
            OpenContext::new(Mode::Intervention, today())
                .starting_at(Step::Goal)
                .entry_step(),
            Step::Intervention
        );
        assert_eq!(OpenContext::new(Mode::Review, today()).entry_step(), Step::Review);
    }

    #[test]
    fn steps_walk_in_order() {
        assert_eq!(Step::CarePlan.next(), Some(Step::Goal));
        assert_eq!(Step::LAST.next(), None);
        assert_eq!(Step::CarePlan.previous(), None);
        assert_eq!(Step::Review.previous(), Some(Step::Intervention));
        assert_eq!(Step::Intervention.index(), 2);
    }

    #[test]
    fn opened_session_defaults_review_date_to_today() {
        let session = Session::opened(OpenContext::new(Mode::Review, today()));
        assert!(session.is_open());
        assert_eq!(session.forms().review.review_date, "2024-06-01");
        assert!(!session.is_busy());
    }

    #[test]
    fn toggles_flip_membership() {
        let mut forms = Forms::default();
        forms.apply(FieldEdit::ReviewToggleGoal(id("G1")));
        forms.apply(FieldEdit::ReviewToggleGoal(id("G2")));
        forms.apply(FieldEdit::ReviewToggleGoal(id("G1")));
        assert_eq!(forms.review.updated_goals.iter().collect::<Vec<_>>(), vec![&id("G2")]);
    }

    #[test]
    fn managed_plan_prefers_created_over_context() {
        let mut session = Session::opened(
            OpenContext::new(Mode::Goal, today()).managing_care_plan(id("CP-host")),
        );
        assert_eq!(session.managed_care_plan_id(), Some(&id("CP-host")));
        session.created_care_plan_id = Some(id("CP1"));
        assert_eq!(session.managed_care_plan_id(), Some(&id("CP1")));
    }

    #[test]
    fn field_edits_read_from_yaml_style_tags() {
        let edit: FieldEdit =
            serde_json::from_str(r#"{"intervention-goal":"G9"}"#).expect("parse edit");
        assert_eq!(edit, FieldEdit::InterventionGoal(Some(id("G9"))));
    }
}
