use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::job_type::JobTypeId;
use super::stage::WorkflowStage;

/// Ticket status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Ticket is open and no stage has started
    Pending,

    /// Ticket is on one of its production stages
    InProgress,

    /// Every active stage is done
    Completed,

    /// Ticket was cancelled by the front desk
    Cancelled,
}

impl TicketStatus {
    /// Name stored on ticket records
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Completed => "completed",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a stored status name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pending" => Some(TicketStatus::Pending),
            "in_progress" => Some(TicketStatus::InProgress),
            "completed" => Some(TicketStatus::Completed),
            "cancelled" => Some(TicketStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value object: Ticket ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl TicketId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Descriptive fields supplied when a ticket is opened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDetails {
    /// Shop-facing ticket number, e.g. "JT-2024-0042"
    pub ticket_number: String,

    /// Customer the job is for
    pub customer_name: String,

    /// Free-form job description
    pub description: Option<String>,
}

/// Aggregate: Job ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier
    pub id: TicketId,

    /// Job type the ticket belongs to
    pub job_type_id: JobTypeId,

    /// Shop-facing ticket number
    pub ticket_number: String,

    /// Customer name
    pub customer_name: String,

    /// Job description
    pub description: Option<String>,

    /// Current status
    pub status: TicketStatus,

    /// Name of the stage the ticket is on. `None` before the workflow starts
    /// and after it completes; `status` tells the two apart.
    pub current_workflow_step: Option<String>,

    /// Bumped on every persisted update
    pub version: u64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Open a new pending ticket with no current step
    pub fn new(job_type_id: JobTypeId, details: TicketDetails) -> Self {
        let now = Utc::now();
        Self {
            id: TicketId::generate(),
            job_type_id,
            ticket_number: details.ticket_number,
            customer_name: details.customer_name,
            description: details.description,
            status: TicketStatus::Pending,
            current_workflow_step: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current step parsed as a stage, if it names one
    pub fn current_stage(&self) -> Option<WorkflowStage> {
        self.current_workflow_step
            .as_deref()
            .and_then(WorkflowStage::from_name)
    }

    /// Apply a partial update, bumping the version
    pub fn apply(&mut self, update: &TicketUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(step) = &update.current_workflow_step {
            self.current_workflow_step = step.clone();
        }
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// Partial-field update form for a ticket.
///
/// `None` leaves a field untouched. For the current step, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketUpdate {
    /// New status
    pub status: Option<TicketStatus>,

    /// New current step
    pub current_workflow_step: Option<Option<String>>,
}

impl TicketUpdate {
    /// Move onto a stage
    pub fn step(stage: WorkflowStage) -> Self {
        Self {
            current_workflow_step: Some(Some(stage.as_str().to_string())),
            ..Default::default()
        }
    }

    /// Mark completed and clear the current step
    pub fn completed() -> Self {
        Self {
            status: Some(TicketStatus::Completed),
            current_workflow_step: Some(None),
        }
    }

    /// Whether the update changes nothing
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.current_workflow_step.is_none()
    }
}
