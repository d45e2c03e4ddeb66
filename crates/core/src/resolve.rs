//! Parent id resolution.
//!
//! Every payload that references a parent goes through [`resolve_id`], so the precedence is
//! identical whichever step or mode builds the payload.

use careplan_wire::EntityId;

/// Picks the parent id for a payload.
///
/// Precedence, first present wins:
/// 1. the id explicitly selected on the current step
/// 2. the id of the parent created earlier in this session
/// 3. the id supplied by the host when it opened the workflow
/// 4. the first entry of the fallback list
pub fn resolve_id(
    explicit: Option<&EntityId>,
    created: Option<&EntityId>,
    context: Option<&EntityId>,
    fallback: &[EntityId],
) -> Option<EntityId> {
    explicit
        .or(created)
        .or(context)
        .or_else(|| fallback.first())
        .cloned()
}
