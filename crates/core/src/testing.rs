//! Recording fakes shared by the unit tests.

use crate::machine::{CloseReason, CreateRequest, Notification, NotificationLevel};
use crate::workflow::HostSurface;
use async_trait::async_trait;
use careplan_gateway::{EntityGateway, GatewayError, GatewayResult};
use careplan_wire::{
    CarePlan, CarePlanPayload, CarePlanStatus, Created, EntityId, EntityKind, Goal, GoalPayload,
    Intervention, InterventionPayload, Review, ReviewPayload, StaffMember,
};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Notify;

pub fn id(value: &str) -> EntityId {
    EntityId::new(value).expect("valid id")
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

pub fn plan(plan_id: &str, title: &str, goals: &[(&str, &str)]) -> CarePlan {
    CarePlan {
        id: id(plan_id),
        visit_id: id("V1"),
        title: title.into(),
        description: None,
        status: CarePlanStatus::Active,
        goals: goals
            .iter()
            .map(|(goal_id, goal_title)| Goal {
                id: id(goal_id),
                care_plan_id: id(plan_id),
                title: (*goal_title).into(),
                notes: None,
                target_metric: None,
                deadline: None,
                interventions: Vec::new(),
                reviews: Vec::new(),
            })
            .collect(),
    }
}

pub fn staff(staff_id: &str, name: &str) -> StaffMember {
    StaffMember {
        id: id(staff_id),
        name: Some(name.into()),
        first_name: None,
        last_name: None,
        email: None,
    }
}

pub fn intervention(intervention_id: &str, goal_id: &str, title: &str) -> Intervention {
    Intervention {
        id: id(intervention_id),
        care_plan_goal_id: id(goal_id),
        title: title.into(),
        instructions: None,
        assigned_staff_id: None,
        deadline: None,
    }
}

#[derive(Default)]
struct FakeState {
    created: Vec<CreateRequest>,
    counters: HashMap<EntityKind, usize>,
    failures: HashMap<EntityKind, VecDeque<String>>,
    care_plans: Vec<CarePlan>,
    staff: Vec<StaffMember>,
    interventions: Vec<Intervention>,
    staff_down: bool,
    interventions_down: HashSet<EntityId>,
    intervention_fetches: Vec<EntityId>,
    holding_creations: bool,
}

/// In-memory gateway that records every creation request.
///
/// Created ids are `CP1`, `G1`, `I1`, `R1`, ... per kind.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
    creation_started: Notify,
}

impl FakeGateway {
    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_care_plans(self, care_plans: Vec<CarePlan>) -> Self {
        self.state().care_plans = care_plans;
        self
    }

    pub fn with_staff(self, staff: Vec<StaffMember>) -> Self {
        self.state().staff = staff;
        self
    }

    pub fn with_interventions(self, interventions: Vec<Intervention>) -> Self {
        self.state().interventions = interventions;
        self
    }

    pub fn without_staff(self) -> Self {
        self.state().staff_down = true;
        self
    }

    pub fn without_interventions_for(self, goal_id: EntityId) -> Self {
        self.state().interventions_down.insert(goal_id);
        self
    }

    /// Creation calls are recorded but never answer, like a server that stopped responding.
    pub fn holding_creations(self) -> Self {
        self.state().holding_creations = true;
        self
    }

    /// Resolves once a held creation call is outstanding.
    pub async fn creation_started(&self) {
        self.creation_started.notified().await;
    }

    /// The next creation of `kind` is rejected with `message`.
    pub fn fail_next(&self, kind: EntityKind, message: &str) {
        self.state()
            .failures
            .entry(kind)
            .or_default()
            .push_back(message.to_string());
    }

    pub fn created(&self) -> Vec<CreateRequest> {
        self.state().created.clone()
    }

    pub fn intervention_fetches(&self) -> Vec<EntityId> {
        self.state().intervention_fetches.clone()
    }

    fn record(&self, request: CreateRequest) -> GatewayResult<Created> {
        let kind = request.kind();
        let mut state = self.state();
        state.created.push(request);
        if let Some(message) = state.failures.get_mut(&kind).and_then(VecDeque::pop_front) {
            return Err(GatewayError::Rejected { message });
        }
        let counter = state.counters.entry(kind).or_default();
        *counter += 1;
        let prefix = match kind {
            EntityKind::CarePlan => "CP",
            EntityKind::Goal => "G",
            EntityKind::Intervention => "I",
            EntityKind::Review => "R",
        };
        Ok(Created {
            id: id(&format!("{prefix}{counter}")),
        })
    }

    async fn answer(&self, request: CreateRequest) -> GatewayResult<Created> {
        let result = self.record(request);
        let holding = self.state().holding_creations;
        if holding {
            self.creation_started.notify_one();
            std::future::pending::<()>().await;
        }
        result
    }
}

#[async_trait]
impl EntityGateway for FakeGateway {
    async fn create_care_plan(&self, payload: &CarePlanPayload) -> GatewayResult<Created> {
        self.answer(CreateRequest::CarePlan(payload.clone())).await
    }

    async fn create_goal(&self, payload: &GoalPayload) -> GatewayResult<Created> {
        self.answer(CreateRequest::Goal(payload.clone())).await
    }

    async fn create_intervention(&self, payload: &InterventionPayload) -> GatewayResult<Created> {
        self.answer(CreateRequest::Intervention(payload.clone())).await
    }

    async fn create_review(&self, payload: &ReviewPayload) -> GatewayResult<Created> {
        self.answer(CreateRequest::Review(payload.clone())).await
    }

    async fn list_care_plans(&self) -> GatewayResult<Vec<CarePlan>> {
        Ok(self.state().care_plans.clone())
    }

    async fn get_care_plan(&self, care_plan_id: &EntityId) -> GatewayResult<CarePlan> {
        self.state()
            .care_plans
            .iter()
            .find(|plan| &plan.id == care_plan_id)
            .cloned()
            .ok_or_else(|| GatewayError::Status {
                status: 404,
                message: "not found".into(),
            })
    }

    async fn list_interventions(&self, goal_id: &EntityId) -> GatewayResult<Vec<Intervention>> {
        let mut state = self.state();
        state.intervention_fetches.push(goal_id.clone());
        if state.interventions_down.contains(goal_id) {
            return Err(GatewayError::Status {
                status: 500,
                message: "Internal Server Error".into(),
            });
        }
        Ok(state
            .interventions
            .iter()
            .filter(|i| &i.care_plan_goal_id == goal_id)
            .cloned()
            .collect())
    }

    async fn list_reviews(&self, _goal_id: &EntityId) -> GatewayResult<Vec<Review>> {
        Ok(Vec::new())
    }

    async fn list_staff(&self) -> GatewayResult<Vec<StaffMember>> {
        let state = self.state();
        if state.staff_down {
            return Err(GatewayError::Status {
                status: 503,
                message: "Service Unavailable".into(),
            });
        }
        Ok(state.staff.clone())
    }
}

/// Host that remembers every signal it received.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub notifications: Vec<Notification>,
    pub refreshes: usize,
    pub closes: Vec<CloseReason>,
}

impl RecordingHost {
    pub fn levels(&self) -> Vec<NotificationLevel> {
        self.notifications.iter().map(|n| n.level).collect()
    }
}

impl HostSurface for RecordingHost {
    fn notify(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }

    fn closed(&mut self, reason: CloseReason) {
        self.closes.push(reason);
    }
}
