//! Task lifecycle: the only legal way to change a task's status.
//!
//! ```text
//! open ──► in_progress ──► done
//!   └──────────────────────▲
//! ```
//!
//! `done` is terminal. Entering `in_progress` from `open` stamps the start
//! date; entering `done` stamps the end date. The database layer applies the
//! plan and appends the history entry in the same transaction.

use crate::types::TaskStatus;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("task is already {0}")]
    Unchanged(TaskStatus),
    #[error("cannot move task from {from} to {to}")]
    NotAllowed { from: TaskStatus, to: TaskStatus },
}

/// Side effects of an accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: TaskStatus,
    pub to: TaskStatus,
    /// New `start_date`, if this transition sets it.
    pub start_date: Option<i64>,
    /// New `end_date`, if this transition sets it.
    pub end_date: Option<i64>,
}

/// Whether `from -> to` is an edge of the lifecycle.
pub fn can_transition(from: TaskStatus, to: TaskStatus) -> bool {
    use TaskStatus::*;
    matches!(
        (from, to),
        (Open, InProgress) | (InProgress, Done) | (Open, Done)
    )
}

/// Validate a transition and compute its timestamp side effects.
pub fn plan_transition(
    from: TaskStatus,
    to: TaskStatus,
    now: i64,
) -> Result<TransitionPlan, TransitionError> {
    if from == to {
        return Err(TransitionError::Unchanged(from));
    }
    if !can_transition(from, to) {
        return Err(TransitionError::NotAllowed { from, to });
    }

    let start_date = (from == TaskStatus::Open && to == TaskStatus::InProgress).then_some(now);
    let end_date = (to == TaskStatus::Done).then_some(now);

    Ok(TransitionPlan {
        from,
        to,
        start_date,
        end_date,
    })
}

/// Statuses reachable from `from` in one step.
pub fn next_statuses(from: TaskStatus) -> Vec<TaskStatus> {
    TaskStatus::ALL
        .into_iter()
        .filter(|to| can_transition(from, *to))
        .collect()
}
