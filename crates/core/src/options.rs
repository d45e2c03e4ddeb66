//! Dropdown read models built from the session and the reference cache.

use crate::session::Session;
use crate::ReferenceCache;
use careplan_wire::EntityId;

/// Where a goal option comes from, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum GoalGroup {
    CreatedThisSession,
    CurrentCarePlan,
    OtherCarePlan,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoalOption {
    pub id: EntityId,
    pub label: String,
    pub group: GoalGroup,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectOption {
    pub id: EntityId,
    pub label: String,
}

/// Goals offered on the intervention and review steps.
///
/// The goal created in this session comes first, then the goals of the managed care plan,
/// then every other goal labelled with the care plan it belongs to. Each id appears once.
pub fn goal_options(session: &Session, refs: &ReferenceCache) -> Vec<GoalOption> {
    let mut options = Vec::new();

    let created = session.created_goal_id();
    if let Some(created) = created {
        let title = refs
            .goal(created)
            .map(|goal| goal.title.clone())
            .unwrap_or_else(|| session.forms().goal.title.trim().to_string());
        options.push(GoalOption {
            id: created.clone(),
            label: format!("{title} (just created)"),
            group: GoalGroup::CreatedThisSession,
        });
    }

    let managed = session.managed_care_plan_id();
    let (current, other): (Vec<_>, Vec<_>) = refs
        .goals()
        .iter()
        .filter(|goal| Some(&goal.id) != created)
        .partition(|goal| Some(&goal.care_plan_id) == managed);

    options.extend(current.into_iter().map(|goal| GoalOption {
        id: goal.id.clone(),
        label: goal.title.clone(),
        group: GoalGroup::CurrentCarePlan,
    }));
    options.extend(other.into_iter().map(|goal| GoalOption {
        id: goal.id.clone(),
        label: format!("{} (care plan: {})", goal.title, goal.care_plan_title),
        group: GoalGroup::OtherCarePlan,
    }));

    options
}

pub fn staff_options(refs: &ReferenceCache) -> Vec<SelectOption> {
    refs.staff()
        .iter()
        .map(|member| SelectOption {
            id: member.id.clone(),
            label: member.display_name(),
        })
        .collect()
}

pub fn intervention_options(refs: &ReferenceCache) -> Vec<SelectOption> {
    refs.interventions()
        .iter()
        .map(|intervention| SelectOption {
            id: intervention.id.clone(),
            label: intervention.title.clone(),
        })
        .collect()
}
