//! Pure transition functions.
//!
//! Every function takes the current [`Session`] by reference and returns a [`Transition`]: the
//! next session plus the effects the driver must carry out, in order. Nothing here performs I/O.

use crate::error::{ValidationError, WorkflowError, WorkflowResult};
use crate::payload;
use crate::session::{AfterCreate, FieldEdit, OpenContext, Pending, Session, Step};
use crate::ReferenceCache;
use careplan_wire::{
    CarePlanPayload, EntityId, EntityKind, GoalPayload, InterventionPayload, ReviewPayload,
};

/// Operator input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Edit(FieldEdit),
    Next,
    Back,
    /// Create the current step's entity, then close.
    SaveAndComplete,
    Cancel,
}

/// A creation call with its validated payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateRequest {
    CarePlan(CarePlanPayload),
    Goal(GoalPayload),
    Intervention(InterventionPayload),
    Review(ReviewPayload),
}

impl CreateRequest {
    pub fn kind(&self) -> EntityKind {
        match self {
            CreateRequest::CarePlan(_) => EntityKind::CarePlan,
            CreateRequest::Goal(_) => EntityKind::Goal,
            CreateRequest::Intervention(_) => EntityKind::Intervention,
            CreateRequest::Review(_) => EntityKind::Review,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// Operator-facing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// A save-and-complete creation succeeded.
    Completed,
    /// The operator cancelled.
    Cancelled,
    /// The host closed the workflow.
    Host,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Replace the reference cache, fetching interventions for the pinned plan's goals only.
    Hydrate { pinned_care_plan: Option<EntityId> },
    /// Issue one creation call and feed its outcome back through [`resume`].
    Create(CreateRequest),
    Notify(Notification),
    /// Ask the host to reload its own lists.
    RefreshHost,
    Close(CloseReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(session: &Session) -> Self {
        Self {
            session: session.clone(),
            effects: Vec::new(),
        }
    }

    fn with(session: Session, effects: Vec<Effect>) -> Self {
        Self { session, effects }
    }
}

/// Starts a fresh session. Anything left from a previous session is discarded.
pub fn open(context: OpenContext) -> Transition {
    let pinned_care_plan = context.care_plan_id.clone();
    Transition::with(
        Session::opened(context),
        vec![Effect::Hydrate { pinned_care_plan }],
    )
}

/// Ends the session. The returned session is the closed default.
pub fn close(reason: CloseReason) -> Transition {
    Transition::with(Session::default(), vec![Effect::Close(reason)])
}

/// Applies one operator action.
///
/// # Errors
///
/// [`WorkflowError::Closed`] when no session is open, and [`WorkflowError::Busy`] for anything
/// but [`Action::Cancel`] while a creation call is in flight.
pub fn apply(
    session: &Session,
    action: Action,
    refs: &ReferenceCache,
) -> WorkflowResult<Transition> {
    if !session.is_open() {
        return Err(WorkflowError::Closed);
    }
    if action == Action::Cancel {
        return Ok(close(CloseReason::Cancelled));
    }
    if session.is_busy() {
        return Err(WorkflowError::Busy);
    }

    Ok(match action {
        Action::Edit(edit) => {
            let mut next = session.clone();
            next.forms.apply(edit);
            Transition::with(next, Vec::new())
        }
        Action::Next => next(session, refs),
        Action::Back => back(session),
        Action::SaveAndComplete => save_and_complete(session, refs),
        Action::Cancel => close(CloseReason::Cancelled),
    })
}

fn next(session: &Session, refs: &ReferenceCache) -> Transition {
    if !session.mode().is_wizard() {
        return Transition::stay(session);
    }
    match session.step() {
        Step::CarePlan if session.created_care_plan_id().is_some() => {
            advance(session.clone(), Vec::new())
        }
        Step::CarePlan => match payload::care_plan_payload(session) {
            Ok(payload) => request(session, CreateRequest::CarePlan(payload), AfterCreate::Advance),
            Err(e) => rejected(session, EntityKind::CarePlan, &e),
        },
        Step::Goal
            if session.created_goal_id().is_some()
                || session.forms().goal.title.trim().is_empty() =>
        {
            advance(session.clone(), Vec::new())
        }
        Step::Goal => match payload::goal_payload(session, refs) {
            Ok(payload) => request(session, CreateRequest::Goal(payload), AfterCreate::Advance),
            Err(e) => advance(
                session.clone(),
                vec![Effect::Notify(Notification::warning(format!(
                    "Goal not saved: {e}. Choose an existing goal on the next steps."
                )))],
            ),
        },
        Step::Intervention | Step::Review => advance(session.clone(), Vec::new()),
    }
}

fn back(session: &Session) -> Transition {
    if !session.mode().is_wizard() {
        return Transition::stay(session);
    }
    let mut next = session.clone();
    if let Some(previous) = session.step().previous() {
        next.step = previous;
    }
    Transition::with(next, Vec::new())
}

fn save_and_complete(session: &Session, refs: &ReferenceCache) -> Transition {
    let step = session.step();
    let already_created = match step {
        Step::CarePlan => session.created_care_plan_id().is_some(),
        Step::Goal => session.created_goal_id().is_some(),
        Step::Intervention | Step::Review => false,
    };
    if already_created {
        let mut transition = close(CloseReason::Completed);
        transition.effects.insert(
            0,
            Effect::Notify(Notification::success(format!("{} already saved", step.kind()))),
        );
        return transition;
    }

    let built = match step {
        Step::CarePlan => payload::care_plan_payload(session).map(CreateRequest::CarePlan),
        Step::Goal => payload::goal_payload(session, refs).map(CreateRequest::Goal),
        Step::Intervention => {
            payload::intervention_payload(session, refs).map(CreateRequest::Intervention)
        }
        Step::Review => payload::review_payload(session, refs).map(CreateRequest::Review),
    };
    match built {
        Ok(create) => request(session, create, AfterCreate::Complete),
        Err(e) => rejected(session, step.kind(), &e),
    }
}

/// Feeds the outcome of the in-flight creation call back into the session.
///
/// # Errors
///
/// [`WorkflowError::Closed`] if the session was closed meanwhile, and
/// [`WorkflowError::NothingPending`] if no creation call was in flight.
pub fn resume(session: &Session, outcome: Result<EntityId, String>) -> WorkflowResult<Transition> {
    if !session.is_open() {
        return Err(WorkflowError::Closed);
    }
    let pending = session.pending().ok_or(WorkflowError::NothingPending)?;
    let mut next = session.clone();
    next.pending = None;

    let id = match outcome {
        Ok(id) => id,
        Err(message) if pending.kind == EntityKind::Goal && pending.then == AfterCreate::Advance => {
            return Ok(advance(
                next,
                vec![Effect::Notify(Notification::warning(format!(
                    "Goal could not be saved: {message}. Choose an existing goal on the next steps."
                )))],
            ));
        }
        Err(message) => {
            return Ok(Transition::with(
                next,
                vec![Effect::Notify(Notification::error(format!(
                    "{} could not be saved: {message}",
                    pending.kind
                )))],
            ));
        }
    };

    match pending.kind {
        EntityKind::CarePlan => next.created_care_plan_id = Some(id),
        EntityKind::Goal => next.created_goal_id = Some(id),
        EntityKind::Intervention | EntityKind::Review => {}
    }
    let mut effects = vec![
        Effect::Notify(Notification::success(format!("{} saved", pending.kind))),
        Effect::RefreshHost,
    ];

    Ok(match pending.then {
        AfterCreate::Advance => advance(next, effects),
        AfterCreate::Complete => {
            let closed = close(CloseReason::Completed);
            effects.extend(closed.effects);
            Transition::with(closed.session, effects)
        }
    })
}

fn advance(mut session: Session, effects: Vec<Effect>) -> Transition {
    if let Some(step) = session.step.next() {
        session.step = step;
    }
    Transition::with(session, effects)
}

fn request(session: &Session, create: CreateRequest, then: AfterCreate) -> Transition {
    let mut next = session.clone();
    next.pending = Some(Pending {
        kind: create.kind(),
        then,
    });
    Transition::with(next, vec![Effect::Create(create)])
}

fn rejected(session: &Session, kind: EntityKind, error: &ValidationError) -> Transition {
    Transition::with(
        session.clone(),
        vec![Effect::Notify(Notification::error(format!(
            "{kind} not saved: {error}"
        )))],
    )
}
