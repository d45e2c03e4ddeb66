//! # Care Plan Core
//!
//! The authoring workflow for care plans, goals, interventions and reviews.
//!
//! This crate contains:
//! - the session model and pure transition functions (`machine`)
//! - payload builders that validate before anything is sent (`payload`)
//! - the single parent-id resolver every payload goes through (`resolve`)
//! - the reference cache behind the dropdowns (`cache`, `options`)
//! - the async [`Workflow`] driver that executes effects against an [`EntityGateway`]
//!
//! **No transport concerns**: HTTP lives in `careplan-gateway`; hosts supply a [`HostSurface`].
//!
//! [`EntityGateway`]: careplan_gateway::EntityGateway

#![warn(rust_2018_idioms)]

pub mod cache;
pub mod error;
pub mod machine;
pub mod options;
pub mod payload;
pub mod resolve;
pub mod session;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CarePlanRef, GoalRef, InterventionRef, ReferenceCache};
pub use error::{ValidationError, WorkflowError, WorkflowResult};
pub use machine::{Action, CloseReason, CreateRequest, Effect, Notification, NotificationLevel};
pub use options::{GoalGroup, GoalOption, SelectOption};
pub use resolve::resolve_id;
pub use session::{FieldEdit, Mode, OpenContext, Session, Step};
pub use workflow::{CloseHandle, HostSurface, Workflow};
