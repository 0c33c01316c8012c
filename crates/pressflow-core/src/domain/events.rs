use crate::domain::stage::WorkflowStage;
use crate::domain::ticket::TicketId;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Domain event trait for all events in the system
pub trait DomainEvent: Debug + Send + Sync {
    /// Returns the type of the event as a string
    fn event_type(&self) -> &'static str;

    /// Returns the ticket this event is associated with
    fn ticket_id(&self) -> &TicketId;

    /// Returns the timestamp when the event occurred
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Event: Ticket moved onto its first stage
#[derive(Debug)]
pub struct TicketWorkflowStarted {
    /// The ticket
    pub ticket_id: TicketId,

    /// First active stage
    pub stage: WorkflowStage,

    /// The timestamp when the workflow started
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for TicketWorkflowStarted {
    fn event_type(&self) -> &'static str {
        "ticket.workflow_started"
    }

    fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Ticket moved forward to another stage
#[derive(Debug)]
pub struct TicketStepAdvanced {
    /// The ticket
    pub ticket_id: TicketId,

    /// Step the ticket left, as stored
    pub from: Option<String>,

    /// Stage the ticket is now on
    pub to: WorkflowStage,

    /// The timestamp when the ticket advanced
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for TicketStepAdvanced {
    fn event_type(&self) -> &'static str {
        "ticket.step_advanced"
    }

    fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Ticket moved back to an earlier stage
#[derive(Debug)]
pub struct TicketStepReverted {
    /// The ticket
    pub ticket_id: TicketId,

    /// Step the ticket left
    pub from: Option<String>,

    /// Stage the ticket is now on
    pub to: WorkflowStage,

    /// The timestamp when the ticket was reverted
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for TicketStepReverted {
    fn event_type(&self) -> &'static str {
        "ticket.step_reverted"
    }

    fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Ticket finished its workflow
#[derive(Debug)]
pub struct TicketCompleted {
    /// The ticket
    pub ticket_id: TicketId,

    /// Last step the ticket was on
    pub last_step: Option<String>,

    /// The timestamp when the ticket completed
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for TicketCompleted {
    fn event_type(&self) -> &'static str {
        "ticket.completed"
    }

    fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_types() {
        let ticket_id = TicketId("t1".to_string());
        let now = Utc::now();

        let events: Vec<Box<dyn DomainEvent>> = vec![
            Box::new(TicketWorkflowStarted {
                ticket_id: ticket_id.clone(),
                stage: WorkflowStage::Printing,
                timestamp: now,
            }),
            Box::new(TicketStepAdvanced {
                ticket_id: ticket_id.clone(),
                from: Some("printing".to_string()),
                to: WorkflowStage::Cutting,
                timestamp: now,
            }),
            Box::new(TicketStepReverted {
                ticket_id: ticket_id.clone(),
                from: Some("cutting".to_string()),
                to: WorkflowStage::Printing,
                timestamp: now,
            }),
            Box::new(TicketCompleted {
                ticket_id: ticket_id.clone(),
                last_step: Some("cutting".to_string()),
                timestamp: now,
            }),
        ];

        let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![
                "ticket.workflow_started",
                "ticket.step_advanced",
                "ticket.step_reverted",
                "ticket.completed"
            ]
        );
        assert!(events.iter().all(|e| e.ticket_id() == &ticket_id));
        assert!(events.iter().all(|e| e.timestamp() == now));
    }
}
