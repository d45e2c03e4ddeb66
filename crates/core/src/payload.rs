//! Payload builders.
//!
//! Each builder reads the session's form for one entity, resolves the parent id and validates
//! the Data Model's field rules. A builder that returns `Err` means no request may be sent.

use crate::error::ValidationError;
use crate::options::goal_options;
use crate::resolve::resolve_id;
use crate::session::Session;
use crate::ReferenceCache;
use careplan_types::{Description, NonEmptyText, Title};
use careplan_wire::{CarePlanPayload, EntityId, GoalPayload, InterventionPayload, ReviewPayload};
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    NonEmptyText::new(value)
        .map(NonEmptyText::into_inner)
        .map_err(|source| ValidationError::Text { field, source })
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        }
    })
}

fn optional_date(field: &'static str, value: &str) -> Result<Option<String>, ValidationError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_date(field, value).map(|date| Some(date.format(DATE_FORMAT).to_string()))
}

/// Care plan a new goal belongs to.
pub fn resolve_care_plan_id(session: &Session, refs: &ReferenceCache) -> Option<EntityId> {
    resolve_id(
        None,
        session.created_care_plan_id(),
        session.context_care_plan_id(),
        &refs.care_plan_ids(),
    )
}

/// Goal an intervention or review belongs to, given the goal picked on that step.
pub fn resolve_goal_id(
    selected: Option<&EntityId>,
    session: &Session,
    refs: &ReferenceCache,
) -> Option<EntityId> {
    let fallback: Vec<EntityId> = goal_options(session, refs)
        .into_iter()
        .map(|option| option.id)
        .collect();
    resolve_id(
        selected,
        session.created_goal_id(),
        session.context_goal_id(),
        &fallback,
    )
}

pub fn care_plan_payload(session: &Session) -> Result<CarePlanPayload, ValidationError> {
    let form = &session.forms().care_plan;
    let visit_id = session
        .context_visit_id()
        .cloned()
        .ok_or(ValidationError::Missing("visit"))?;
    let title = Title::new(&form.title)
        .map_err(|source| ValidationError::Text {
            field: "title",
            source,
        })?
        .into_inner();
    let description = Description::new(&form.description)
        .map_err(|source| ValidationError::Text {
            field: "description",
            source,
        })?
        .into_inner();

    Ok(CarePlanPayload {
        visit_id,
        title,
        description,
        status: form.status,
    })
}

pub fn goal_payload(
    session: &Session,
    refs: &ReferenceCache,
) -> Result<GoalPayload, ValidationError> {
    let form = &session.forms().goal;
    let title = required_text("title", &form.title)?;
    let deadline = optional_date("deadline", &form.deadline)?;
    let care_plan_id =
        resolve_care_plan_id(session, refs).ok_or(ValidationError::UnresolvedParent("care plan"))?;

    Ok(GoalPayload {
        care_plan_id,
        title,
        notes: optional_text(&form.notes),
        target_metric: optional_text(&form.target_metric),
        deadline,
    })
}

pub fn intervention_payload(
    session: &Session,
    refs: &ReferenceCache,
) -> Result<InterventionPayload, ValidationError> {
    let form = &session.forms().intervention;
    let title = required_text("title", &form.title)?;
    let deadline = optional_date("deadline", &form.deadline)?;
    let care_plan_goal_id = resolve_goal_id(form.goal_id.as_ref(), session, refs)
        .ok_or(ValidationError::UnresolvedParent("goal"))?;

    Ok(InterventionPayload {
        care_plan_goal_id,
        title,
        instructions: optional_text(&form.instructions),
        assigned_staff_id: form.assigned_staff_id.clone(),
        deadline,
    })
}

pub fn review_payload(
    session: &Session,
    refs: &ReferenceCache,
) -> Result<ReviewPayload, ValidationError> {
    let form = &session.forms().review;
    let reviewed_by = form
        .reviewed_by
        .clone()
        .ok_or(ValidationError::Missing("reviewer"))?;
    let review_date = if form.review_date.trim().is_empty() {
        session.today().ok_or(ValidationError::Missing("review date"))?
    } else {
        parse_date("review date", &form.review_date)?
    };
    let care_plan_goal_id = resolve_goal_id(form.goal_id.as_ref(), session, refs)
        .ok_or(ValidationError::UnresolvedParent("goal"))?;

    Ok(ReviewPayload {
        care_plan_goal_id,
        reviewed_by,
        review_date: review_date.format(DATE_FORMAT).to_string(),
        notes: optional_text(&form.notes),
        updated_goals: form.updated_goals.iter().cloned().collect(),
        updated_interventions: form.updated_interventions.iter().cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{FieldEdit, Mode, OpenContext};
    use crate::testing::{id, plan, today};
    use careplan_types::TextError;
    use careplan_wire::CarePlanStatus;

    fn session(context: OpenContext, edits: Vec<FieldEdit>) -> Session {
        let mut session = Session::opened(context);
        for edit in edits {
            session.forms.apply(edit);
        }
        session
    }

    fn refs() -> ReferenceCache {
        ReferenceCache::from_snapshots(
            Vec::new(),
            &[
                plan("CP7", "Mobility", &[("G1", "Walk unaided")]),
                plan("CP8", "Nutrition", &[("G9", "Gain weight")]),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn care_plan_requires_visit_and_long_enough_title() {
        let no_visit = session(
            OpenContext::new(Mode::CarePlan, today()),
            vec![FieldEdit::CarePlanTitle("Post-op Mobility Plan".into())],
        );
        assert_eq!(
            care_plan_payload(&no_visit),
            Err(ValidationError::Missing("visit"))
        );

        let short = session(
            OpenContext::new(Mode::CarePlan, today()).for_visit(id("V1")),
            vec![FieldEdit::CarePlanTitle("ab".into())],
        );
        assert_eq!(
            care_plan_payload(&short),
            Err(ValidationError::Text {
                field: "title",
                source: TextError::TooShort { min: 3 }
            })
        );
    }

    #[test]
    fn care_plan_payload_trims_and_drops_blank_description() {
        let s = session(
            OpenContext::new(Mode::CarePlan, today()).for_visit(id("V1")),
            vec![
                FieldEdit::CarePlanTitle("  Post-op Mobility Plan ".into()),
                FieldEdit::CarePlanDescription("   ".into()),
                FieldEdit::CarePlanStatus(CarePlanStatus::Completed),
            ],
        );
        let payload = care_plan_payload(&s).expect("valid payload");
        assert_eq!(payload.title, "Post-op Mobility Plan");
        assert_eq!(payload.description, None);
        assert_eq!(payload.status, CarePlanStatus::Completed);
        assert_eq!(payload.visit_id, id("V1"));
    }

    #[test]
    fn overlong_description_is_rejected() {
        let s = session(
            OpenContext::new(Mode::CarePlan, today()).for_visit(id("V1")),
            vec![
                FieldEdit::CarePlanTitle("Post-op Mobility Plan".into()),
                FieldEdit::CarePlanDescription("x".repeat(501)),
            ],
        );
        assert!(matches!(
            care_plan_payload(&s),
            Err(ValidationError::Text {
                field: "description",
                ..
            })
        ));
    }

    #[test]
    fn goal_parent_prefers_context_over_first_listed_plan() {
        let s = session(
            OpenContext::new(Mode::Goal, today()).managing_care_plan(id("CP8")),
            vec![FieldEdit::GoalTitle("Walk unaided".into())],
        );
        assert_eq!(goal_payload(&s, &refs()).expect("payload").care_plan_id, id("CP8"));

        let unpinned = session(
            OpenContext::new(Mode::Goal, today()),
            vec![FieldEdit::GoalTitle("Walk unaided".into())],
        );
        assert_eq!(
            goal_payload(&unpinned, &refs()).expect("payload").care_plan_id,
            id("CP7")
        );
    }

    #[test]
    fn goal_without_any_plan_fails_locally() {
        let s = session(
            OpenContext::new(Mode::Goal, today()),
            vec![FieldEdit::GoalTitle("Walk unaided".into())],
        );
        assert_eq!(
            goal_payload(&s, &ReferenceCache::default()),
            Err(ValidationError::UnresolvedParent("care plan"))
        );
    }

    #[test]
    fn malformed_dates_are_caught_before_sending() {
        let s = session(
            OpenContext::new(Mode::Goal, today()).managing_care_plan(id("CP7")),
            vec![
                FieldEdit::GoalTitle("Walk unaided".into()),
                FieldEdit::GoalDeadline("01/07/2024".into()),
            ],
        );
        assert_eq!(
            goal_payload(&s, &refs()),
            Err(ValidationError::InvalidDate {
                field: "deadline",
                value: "01/07/2024".into()
            })
        );
    }

    #[test]
    fn selected_goal_beats_created_and_context_goals() {
        let mut s = session(
            OpenContext::new(Mode::Goal, today()).managing_goal(id("C")),
            vec![
                FieldEdit::InterventionTitle("Ankle ROM exercises".into()),
                FieldEdit::InterventionGoal(Some(id("A"))),
            ],
        );
        s.created_goal_id = Some(id("B"));
        let payload = intervention_payload(&s, &refs()).expect("payload");
        assert_eq!(payload.care_plan_goal_id, id("A"));
    }

    #[test]
    fn intervention_keeps_staff_and_normalises_deadline() {
        let s = session(
            OpenContext::new(Mode::Intervention, today()).managing_goal(id("G1")),
            vec![
                FieldEdit::InterventionTitle("Ankle ROM exercises".into()),
                FieldEdit::InterventionStaff(Some(id("D4"))),
                FieldEdit::InterventionDeadline(" 2024-07-01 ".into()),
            ],
        );
        let payload = intervention_payload(&s, &refs()).expect("payload");
        assert_eq!(payload.care_plan_goal_id, id("G1"));
        assert_eq!(payload.assigned_staff_id, Some(id("D4")));
        assert_eq!(payload.deadline.as_deref(), Some("2024-07-01"));
        assert_eq!(payload.instructions, None);
    }

    #[test]
    fn review_requires_reviewer_and_defaults_date() {
        let no_reviewer = session(
            OpenContext::new(Mode::Review, today()).managing_goal(id("G1")),
            vec![],
        );
        assert_eq!(
            review_payload(&no_reviewer, &refs()),
            Err(ValidationError::Missing("reviewer"))
        );

        let s = session(
            OpenContext::new(Mode::Review, today()).managing_goal(id("G1")),
            vec![
                FieldEdit::ReviewReviewer(Some(id("D4"))),
                FieldEdit::ReviewDate(String::new()),
                FieldEdit::ReviewToggleIntervention(id("I2")),
                FieldEdit::ReviewToggleGoal(id("G1")),
            ],
        );
        let payload = review_payload(&s, &refs()).expect("payload");
        assert_eq!(payload.review_date, "2024-06-01");
        assert_eq!(payload.updated_goals, vec![id("G1")]);
        assert_eq!(payload.updated_interventions, vec![id("I2")]);
    }

    #[test]
    fn review_without_any_goal_fails_locally() {
        let s = session(
            OpenContext::new(Mode::Review, today()),
            vec![FieldEdit::ReviewReviewer(Some(id("D4")))],
        );
        assert_eq!(
            review_payload(&s, &ReferenceCache::default()),
            Err(ValidationError::UnresolvedParent("goal"))
        );
    }
}
