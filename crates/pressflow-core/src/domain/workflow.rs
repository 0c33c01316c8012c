//! Workflow step engine
//!
//! Pure computation over a job type's stage flags and a ticket's current step.
//! Nothing here touches storage: transitions are planned as
//! [`WorkflowTransition`] values carrying the [`TicketUpdate`] to persist, and
//! the caller applies them.
//!
//! Missing configuration and a missing or unknown current step are normal
//! inputs with defined results, never errors.

use serde::{Deserialize, Serialize};

use super::job_type::WorkflowSteps;
use super::stage::{WorkflowStage, CANONICAL_ORDER};
use super::ticket::{Ticket, TicketStatus, TicketUpdate};

/// Enabled stages in canonical order
pub fn active_steps(config: Option<&WorkflowSteps>) -> Vec<WorkflowStage> {
    match config {
        Some(config) => CANONICAL_ORDER
            .iter()
            .copied()
            .filter(|stage| config.is_enabled(*stage))
            .collect(),
        None => Vec::new(),
    }
}

/// First enabled stage
pub fn first_step(config: Option<&WorkflowSteps>) -> Option<WorkflowStage> {
    let config = config?;
    CANONICAL_ORDER
        .iter()
        .copied()
        .find(|stage| config.is_enabled(*stage))
}

#[inline]
fn canonical_position(step: &str) -> Option<usize> {
    CANONICAL_ORDER.iter().position(|stage| stage.as_str() == step)
}

/// Next enabled stage after `current` in canonical order.
///
/// A `current` that is not a canonical stage falls back to [`first_step`].
/// `None` means the workflow is complete (or an input is missing).
pub fn next_step(config: Option<&WorkflowSteps>, current: Option<&str>) -> Option<WorkflowStage> {
    let config = config?;
    let current = current?;

    match canonical_position(current) {
        Some(index) => CANONICAL_ORDER[index + 1..]
            .iter()
            .copied()
            .find(|stage| config.is_enabled(*stage)),
        None => first_step(Some(config)),
    }
}

/// Closest enabled stage before `current` in canonical order.
///
/// Unlike [`next_step`] there is no fallback: an unknown `current` yields `None`.
pub fn previous_step(
    config: Option<&WorkflowSteps>,
    current: Option<&str>,
) -> Option<WorkflowStage> {
    let config = config?;
    let index = canonical_position(current?)?;

    CANONICAL_ORDER[..index]
        .iter()
        .rev()
        .copied()
        .find(|stage| config.is_enabled(*stage))
}

/// Percentage of active steps reached, counting the current one.
///
/// 0 when there are no active steps or `current` is not one of them.
pub fn progress(config: Option<&WorkflowSteps>, current: Option<&str>) -> u8 {
    let active = active_steps(config);
    let Some(current) = current else {
        return 0;
    };
    if active.is_empty() {
        return 0;
    }
    let Some(index) = active.iter().position(|stage| stage.as_str() == current) else {
        return 0;
    };

    // round-half-up of 100 * (index + 1) / len
    let len = active.len();
    ((200 * (index + 1) + len) / (2 * len)) as u8
}

/// The part of a ticket the engine reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Ticket status
    pub status: TicketStatus,

    /// Current step name, possibly stale
    pub current_step: Option<String>,
}

impl WorkflowState {
    /// State of a ticket that has not started
    pub fn not_started() -> Self {
        Self {
            status: TicketStatus::Pending,
            current_step: None,
        }
    }

    /// State on a given stage
    pub fn at(stage: WorkflowStage) -> Self {
        Self {
            status: TicketStatus::InProgress,
            current_step: Some(stage.as_str().to_string()),
        }
    }

    fn current(&self) -> Option<&str> {
        self.current_step.as_deref()
    }

}

impl From<&Ticket> for WorkflowState {
    fn from(ticket: &Ticket) -> Self {
        Self {
            status: ticket.status,
            current_step: ticket.current_workflow_step.clone(),
        }
    }
}

/// A move from one step to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTransition {
    /// Step the ticket was on
    pub from: Option<String>,
    /// Stage the ticket moves to
    pub to: WorkflowStage,
    /// Fields to persist
    pub form: TicketUpdate,
}

/// The final forward move: no active step remains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteTransition {
    /// Step the ticket was on
    pub from: Option<String>,
    /// Fields to persist
    pub form: TicketUpdate,
}

/// A planned state change, to be persisted by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowTransition {
    /// Not started → first active stage
    Start(StepTransition),
    /// Stage → next active stage
    Advance(StepTransition),
    /// No further active stage: mark completed and clear the step
    Complete(CompleteTransition),
    /// Stage → previous active stage
    Revert(StepTransition),
}

impl WorkflowTransition {
    /// Fields to write on the ticket
    pub fn form(&self) -> &TicketUpdate {
        match self {
            WorkflowTransition::Start(t)
            | WorkflowTransition::Advance(t)
            | WorkflowTransition::Revert(t) => &t.form,
            WorkflowTransition::Complete(t) => &t.form,
        }
    }

    /// Stage the ticket ends up on, `None` when completed
    pub fn target(&self) -> Option<WorkflowStage> {
        match self {
            WorkflowTransition::Start(t)
            | WorkflowTransition::Advance(t)
            | WorkflowTransition::Revert(t) => Some(t.to),
            WorkflowTransition::Complete(_) => None,
        }
    }

    /// Step the ticket left
    pub fn source(&self) -> Option<&str> {
        match self {
            WorkflowTransition::Start(t)
            | WorkflowTransition::Advance(t)
            | WorkflowTransition::Revert(t) => t.from.as_deref(),
            WorkflowTransition::Complete(t) => t.from.as_deref(),
        }
    }

    /// Name used in logs and events
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowTransition::Start(_) => "start",
            WorkflowTransition::Advance(_) => "advance",
            WorkflowTransition::Complete(_) => "complete",
            WorkflowTransition::Revert(_) => "revert",
        }
    }

    /// Whether this moves the ticket forward onto a stage
    pub fn moved_forward(&self) -> bool {
        matches!(
            self,
            WorkflowTransition::Start(_) | WorkflowTransition::Advance(_)
        )
    }
}

/// Plan a forward move. Always yields a transition: either onto the next
/// active stage or to completion.
///
/// A ticket with no current step completes rather than starting; use
/// [`plan_initialize`] to start one.
pub fn plan_advance(config: Option<&WorkflowSteps>, state: &WorkflowState) -> WorkflowTransition {
    let from = state.current_step.clone();
    match next_step(config, state.current()) {
        Some(to) => WorkflowTransition::Advance(StepTransition {
            from,
            to,
            form: TicketUpdate::step(to),
        }),
        None => WorkflowTransition::Complete(CompleteTransition {
            from,
            form: TicketUpdate::completed(),
        }),
    }
}

/// Plan a backward move. `None` when there is no earlier active stage.
pub fn plan_revert(
    config: Option<&WorkflowSteps>,
    state: &WorkflowState,
) -> Option<WorkflowTransition> {
    let to = previous_step(config, state.current())?;
    Some(WorkflowTransition::Revert(StepTransition {
        from: state.current_step.clone(),
        to,
        form: TicketUpdate::step(to),
    }))
}

/// Plan the move onto the first active stage. `None` when the ticket already
/// has a step or the job type has no active stages.
pub fn plan_initialize(
    config: Option<&WorkflowSteps>,
    state: &WorkflowState,
) -> Option<WorkflowTransition> {
    if state.current_step.is_some() {
        return None;
    }
    let to = first_step(config)?;
    Some(WorkflowTransition::Start(StepTransition {
        from: None,
        to,
        form: TicketUpdate::step(to),
    }))
}

/// Read-only view of where a ticket stands, for dashboards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    /// Enabled stages in canonical order
    pub active_steps: Vec<WorkflowStage>,
    /// Current step name as stored
    pub current_step: Option<String>,
    /// Where an advance would go
    pub next_step: Option<WorkflowStage>,
    /// Where a revert would go
    pub previous_step: Option<WorkflowStage>,
    /// Percent of active steps reached
    pub progress: u8,
    /// Ticket status
    pub status: TicketStatus,
}

impl WorkflowSnapshot {
    /// Compute the view for a state under a configuration
    pub fn compute(config: Option<&WorkflowSteps>, state: &WorkflowState) -> Self {
        Self {
            active_steps: active_steps(config),
            current_step: state.current_step.clone(),
            next_step: next_step(config, state.current()),
            previous_step: previous_step(config, state.current()),
            progress: progress(config, state.current()),
            status: state.status,
        }
    }

    /// Whether the ticket finished its workflow
    pub fn is_completed(&self) -> bool {
        self.status == TicketStatus::Completed
    }
}
