//! Reference data backing the workflow's dropdowns.

use careplan_gateway::EntityGateway;
use careplan_wire::{CarePlan, EntityId, Intervention, StaffMember};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarePlanRef {
    pub id: EntityId,
    pub title: String,
}

/// A goal flattened out of its care plan, remembering where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoalRef {
    pub id: EntityId,
    pub title: String,
    pub care_plan_id: EntityId,
    pub care_plan_title: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterventionRef {
    pub id: EntityId,
    pub title: String,
    pub goal_id: EntityId,
}

impl From<Intervention> for InterventionRef {
    fn from(intervention: Intervention) -> Self {
        Self {
            id: intervention.id,
            title: intervention.title,
            goal_id: intervention.care_plan_goal_id,
        }
    }
}

/// Snapshot of the staff directory and every known care plan, goal and intervention.
///
/// Ordering follows the server: care plans in list order, goals in care plan order then their
/// own order, interventions grouped by goal in that same order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceCache {
    staff: Vec<StaffMember>,
    care_plans: Vec<CarePlanRef>,
    goals: Vec<GoalRef>,
    interventions: Vec<InterventionRef>,
}

impl ReferenceCache {
    /// Builds a cache from lists that have already been fetched.
    pub fn from_snapshots(
        staff: Vec<StaffMember>,
        care_plans: &[CarePlan],
        interventions: Vec<Intervention>,
    ) -> Self {
        let goals = care_plans
            .iter()
            .flat_map(|plan| {
                plan.goals.iter().map(move |goal| GoalRef {
                    id: goal.id.clone(),
                    title: goal.title.clone(),
                    care_plan_id: plan.id.clone(),
                    care_plan_title: plan.title.clone(),
                })
            })
            .collect();

        Self {
            staff,
            care_plans: care_plans
                .iter()
                .map(|plan| CarePlanRef {
                    id: plan.id.clone(),
                    title: plan.title.clone(),
                })
                .collect(),
            goals,
            interventions: interventions.into_iter().map(InterventionRef::from).collect(),
        }
    }

    /// Replaces the snapshot with fresh data from `gateway`.
    ///
    /// Staff and care plans are fetched concurrently, then the interventions of every goal
    /// belonging to `pinned` (or of every goal when nothing is pinned) are fetched in parallel.
    /// A failed source is logged and left empty; it never fails the refresh.
    pub async fn refresh<G>(&mut self, gateway: &G, pinned: Option<&EntityId>)
    where
        G: EntityGateway + ?Sized,
    {
        let (staff, care_plans) = futures::join!(gateway.list_staff(), gateway.list_care_plans());

        let staff = staff.unwrap_or_else(|e| {
            tracing::warn!("staff directory unavailable: {}", e.message());
            Vec::new()
        });
        let care_plans = care_plans.unwrap_or_else(|e| {
            tracing::warn!("care plans unavailable: {}", e.message());
            Vec::new()
        });

        let visible: Vec<&EntityId> = care_plans
            .iter()
            .filter(|plan| pinned.map_or(true, |id| &plan.id == id))
            .flat_map(|plan| plan.goals.iter().map(|goal| &goal.id))
            .collect();

        let fetched = futures::future::join_all(
            visible.iter().map(|goal_id| gateway.list_interventions(goal_id)),
        )
        .await;

        let mut interventions = Vec::new();
        for (goal_id, result) in visible.iter().zip(fetched) {
            match result {
                Ok(list) => interventions.extend(list),
                Err(e) => {
                    tracing::warn!("interventions for goal {} unavailable: {}", goal_id, e.message())
                }
            }
        }

        *self = Self::from_snapshots(staff, &care_plans, interventions);
    }

    pub fn staff(&self) -> &[StaffMember] {
        &self.staff
    }

    pub fn care_plans(&self) -> &[CarePlanRef] {
        &self.care_plans
    }

    pub fn goals(&self) -> &[GoalRef] {
        &self.goals
    }

    pub fn interventions(&self) -> &[InterventionRef] {
        &self.interventions
    }

    pub fn care_plan_ids(&self) -> Vec<EntityId> {
        self.care_plans.iter().map(|plan| plan.id.clone()).collect()
    }

    pub fn goal(&self, id: &EntityId) -> Option<&GoalRef> {
        self.goals.iter().find(|goal| &goal.id == id)
    }
}
