//! Async driver that carries out the effects produced by [`crate::machine`].

use crate::error::WorkflowResult;
use crate::machine::{
    self, Action, CloseReason, CreateRequest, Effect, Notification, NotificationLevel, Transition,
};
use crate::options::{self, GoalOption, SelectOption};
use crate::session::{OpenContext, Session};
use crate::ReferenceCache;
use careplan_gateway::EntityGateway;
use careplan_wire::{EntityId, EntityKind};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// The screen hosting the workflow.
pub trait HostSurface {
    fn notify(&mut self, notification: &Notification);
    /// Reload any lists the host shows; called after every successful creation.
    fn refresh(&mut self);
    fn closed(&mut self, reason: CloseReason);
}

/// Closes a [`Workflow`] from outside its `&mut` borrow, including while a creation call is
/// outstanding. Clones share one signal.
#[derive(Clone, Debug)]
pub struct CloseHandle {
    signal: Arc<watch::Sender<Option<CloseReason>>>,
    busy: Arc<AtomicBool>,
}

impl Default for CloseHandle {
    fn default() -> Self {
        let (signal, _) = watch::channel(None);
        Self {
            signal: Arc::new(signal),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl CloseHandle {
    /// Host-initiated close.
    pub fn close(&self) {
        self.request(CloseReason::Host);
    }

    /// Operator cancel.
    pub fn cancel(&self) {
        self.request(CloseReason::Cancelled);
    }

    /// True while a creation call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn request(&self, reason: CloseReason) {
        tracing::debug!("close requested ({:?})", reason);
        self.signal.send_replace(Some(reason));
    }

    fn take(&self) -> Option<CloseReason> {
        self.signal.send_replace(None)
    }

    fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }
}

/// Resolves with the first close requested through a [`CloseHandle`].
async fn close_requested(closing: &mut watch::Receiver<Option<CloseReason>>) -> CloseReason {
    loop {
        let requested = *closing.borrow_and_update();
        if let Some(reason) = requested {
            return reason;
        }
        if closing.changed().await.is_err() {
            // Sender gone: only the other branch can finish.
            std::future::pending::<()>().await;
        }
    }
}

/// One workflow instance. Owns its session and reference cache exclusively.
pub struct Workflow<G, H> {
    gateway: G,
    host: H,
    cache: ReferenceCache,
    session: Session,
    closer: CloseHandle,
}

impl<G, H> Workflow<G, H>
where
    G: EntityGateway,
    H: HostSurface,
{
    pub fn new(gateway: G, host: H) -> Self {
        Self {
            gateway,
            host,
            cache: ReferenceCache::default(),
            session: Session::default(),
            closer: CloseHandle::default(),
        }
    }

    /// Handle for closing or cancelling this workflow from another task or callback.
    ///
    /// A request made while a creation call is outstanding abandons the call: its late outcome
    /// is dropped and the session closes. A request made while idle takes effect before the next
    /// dispatched action, which is then refused with [`crate::WorkflowError::Closed`].
    pub fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }

    /// Opens a fresh session for `context` and hydrates the reference cache.
    pub async fn open(&mut self, context: OpenContext) {
        if self.session.is_open() {
            tracing::debug!("reopening: previous session discarded");
        }
        if let Some(reason) = self.closer.take() {
            tracing::debug!("stale close request ({:?}) discarded on open", reason);
        }
        tracing::info!("opening {:?} workflow", context.mode);
        self.run(machine::open(context)).await;
    }

    /// Applies one operator action and waits for any creation call it triggers.
    ///
    /// # Errors
    ///
    /// Returns the refusal from [`machine::apply`]; refused actions change nothing.
    pub async fn dispatch(&mut self, action: Action) -> WorkflowResult<()> {
        self.apply_requested_close().await;
        let transition = machine::apply(&self.session, action, &self.cache)?;
        self.run(transition).await;
        Ok(())
    }

    /// Host-initiated close. Does nothing when already closed.
    pub async fn close(&mut self) {
        self.closer.take();
        if self.session.is_open() {
            self.run(machine::close(CloseReason::Host)).await;
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn goal_options(&self) -> Vec<GoalOption> {
        options::goal_options(&self.session, &self.cache)
    }

    pub fn staff_options(&self) -> Vec<SelectOption> {
        options::staff_options(&self.cache)
    }

    pub fn intervention_options(&self) -> Vec<SelectOption> {
        options::intervention_options(&self.cache)
    }

    pub fn into_parts(self) -> (G, H) {
        (self.gateway, self.host)
    }

    async fn apply_requested_close(&mut self) {
        if let Some(reason) = self.closer.take() {
            if self.session.is_open() {
                self.run(machine::close(reason)).await;
            }
        }
    }

    async fn run(&mut self, transition: Transition) {
        self.session = transition.session;
        let mut queue = VecDeque::from(transition.effects);

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Hydrate { pinned_care_plan } => {
                    self.cache
                        .refresh(&self.gateway, pinned_care_plan.as_ref())
                        .await;
                }
                Effect::Create(request) => {
                    let kind = request.kind();
                    let mut closing = self.closer.signal.subscribe();
                    self.closer.set_busy(true);
                    let raced = tokio::select! {
                        outcome = self.create(&request) => Ok(outcome),
                        reason = close_requested(&mut closing) => Err(reason),
                    };
                    self.closer.set_busy(false);

                    match raced {
                        Ok(outcome) => {
                            if outcome.is_err() {
                                self.note_partial_hierarchy(kind);
                            }
                            match machine::resume(&self.session, outcome) {
                                Ok(next) => {
                                    self.session = next.session;
                                    queue.extend(next.effects);
                                }
                                Err(e) => tracing::warn!("{} outcome dropped: {}", kind, e),
                            }
                        }
                        Err(reason) => {
                            self.closer.take();
                            tracing::warn!(
                                "{} request abandoned: closed ({:?}) before it answered",
                                kind,
                                reason
                            );
                            let closed = machine::close(reason);
                            self.session = closed.session;
                            queue.clear();
                            queue.extend(closed.effects);
                        }
                    }
                }
                Effect::Notify(notification) => {
                    match notification.level {
                        NotificationLevel::Success => tracing::debug!("{}", notification.message),
                        NotificationLevel::Warning | NotificationLevel::Error => {
                            tracing::warn!("{}", notification.message)
                        }
                    }
                    self.host.notify(&notification);
                }
                Effect::RefreshHost => self.host.refresh(),
                Effect::Close(reason) => {
                    tracing::info!("workflow closed ({:?})", reason);
                    self.cache = ReferenceCache::default();
                    self.host.closed(reason);
                }
            }
        }
    }

    async fn create(&self, request: &CreateRequest) -> Result<EntityId, String> {
        let result = match request {
            CreateRequest::CarePlan(payload) => self.gateway.create_care_plan(payload).await,
            CreateRequest::Goal(payload) => self.gateway.create_goal(payload).await,
            CreateRequest::Intervention(payload) => {
                self.gateway.create_intervention(payload).await
            }
            CreateRequest::Review(payload) => self.gateway.create_review(payload).await,
        };
        match result {
            Ok(created) => {
                tracing::info!("{} created: {}", request.kind(), created.id);
                Ok(created.id)
            }
            Err(e) => Err(e.message()),
        }
    }

    /// Goals created earlier stay on the server when a later step fails; nothing rolls them back.
    fn note_partial_hierarchy(&self, failed: EntityKind) {
        if !matches!(failed, EntityKind::Intervention | EntityKind::Review) {
            return;
        }
        if let Some(goal_id) = self.session.created_goal_id() {
            tracing::warn!(
                "goal {} created in this session has no {} yet",
                goal_id,
                failed.label().to_lowercase()
            );
        }
    }
}
