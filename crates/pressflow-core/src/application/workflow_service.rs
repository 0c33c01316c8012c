use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    config::WorkflowConfig,
    domain::events::{
        DomainEvent, TicketCompleted, TicketStepAdvanced, TicketStepReverted, TicketWorkflowStarted,
    },
    domain::job_type::{JobType, JobTypeId, WorkflowSteps},
    domain::repository::{JobTypeRepository, TicketRepository},
    domain::ticket::{Ticket, TicketDetails, TicketId},
    domain::workflow::{
        plan_advance, plan_initialize, plan_revert, WorkflowSnapshot, WorkflowState,
        WorkflowTransition,
    },
    logging::LogExt,
    CoreError,
};

/// Handler for domain events
#[async_trait]
pub trait DomainEventHandler: Send + Sync {
    /// Handle a domain event
    async fn handle_event(&self, event: Box<dyn DomainEvent>) -> Result<(), CoreError>;
}

/// Event handler that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventHandler;

#[async_trait]
impl DomainEventHandler for LoggingEventHandler {
    async fn handle_event(&self, event: Box<dyn DomainEvent>) -> Result<(), CoreError> {
        info!(
            event_type = event.event_type(),
            ticket_id = %event.ticket_id().0,
            "Domain event"
        );
        Ok(())
    }
}

/// Service that moves tickets through their job type's workflow.
///
/// Each mutating operation reads the ticket, plans a transition with the
/// workflow engine and writes it with an optimistic version check. A lost
/// version race is re-planned against fresh state up to
/// `max_conflict_retries` times; every other repository error is returned
/// unchanged.
#[derive(Clone)]
pub struct TicketWorkflowService {
    /// Repository for tickets
    ticket_repo: Arc<dyn TicketRepository>,

    /// Repository for job types
    job_type_repo: Arc<dyn JobTypeRepository>,

    /// Event handler
    event_handler: Arc<dyn DomainEventHandler>,

    /// Retry settings
    config: WorkflowConfig,
}

impl TicketWorkflowService {
    /// Create a new ticket workflow service
    pub fn new(
        ticket_repo: Arc<dyn TicketRepository>,
        job_type_repo: Arc<dyn JobTypeRepository>,
        event_handler: Arc<dyn DomainEventHandler>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            ticket_repo,
            job_type_repo,
            event_handler,
            config,
        }
    }

    /// Open a pending ticket for an existing job type
    pub async fn open_ticket(
        &self,
        job_type_id: &JobTypeId,
        details: TicketDetails,
    ) -> Result<Ticket, CoreError> {
        if details.ticket_number.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "ticket_number is required".to_string(),
            ));
        }

        self.job_type_repo
            .find_by_id(job_type_id)
            .await?
            .ok_or_else(|| CoreError::JobTypeNotFound(job_type_id.0.clone()))?;

        let ticket = Ticket::new(job_type_id.clone(), details);
        self.ticket_repo.create(&ticket).await?;

        info!(
            ticket_id = %ticket.id.0,
            ticket_number = %ticket.ticket_number,
            job_type = %job_type_id.0,
            "Ticket opened"
        );
        Ok(ticket)
    }

    /// Put a ticket on its first active stage.
    ///
    /// No write when the ticket already has a step or the job type has no
    /// active stages.
    pub async fn initialize(&self, ticket_id: &TicketId) -> Result<(), CoreError> {
        self.transition(ticket_id, plan_initialize).await?;
        Ok(())
    }

    /// Move a ticket to its next active stage.
    ///
    /// Returns `false` when no stage remains; the ticket is then marked
    /// completed and its step cleared. A ticket with no current step is
    /// completed as well, it is not started.
    pub async fn advance(&self, ticket_id: &TicketId) -> Result<bool, CoreError> {
        let applied = self
            .transition(ticket_id, |config, state| Some(plan_advance(config, state)))
            .await?;
        Ok(applied.map_or(false, |(transition, _)| transition.moved_forward()))
    }

    /// Move a ticket back to its previous active stage.
    ///
    /// Returns `false` without writing when there is no earlier stage.
    pub async fn revert(&self, ticket_id: &TicketId) -> Result<bool, CoreError> {
        let applied = self.transition(ticket_id, plan_revert).await?;
        Ok(applied.is_some())
    }

    /// Where a ticket stands in its workflow
    pub async fn snapshot(&self, ticket_id: &TicketId) -> Result<WorkflowSnapshot, CoreError> {
        let (ticket, job_type) = self.load(ticket_id).await?;
        Ok(WorkflowSnapshot::compute(
            job_type.as_ref().map(|j| &j.workflow_steps),
            &WorkflowState::from(&ticket),
        ))
    }

    async fn load(&self, ticket_id: &TicketId) -> Result<(Ticket, Option<JobType>), CoreError> {
        let ticket = self
            .ticket_repo
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| CoreError::TicketNotFound(ticket_id.0.clone()))?;

        let job_type = self.job_type_repo.find_by_id(&ticket.job_type_id).await?;
        if job_type.is_none() {
            warn!(
                ticket_id = %ticket_id.0,
                job_type = %ticket.job_type_id.0,
                "Job type missing, treating workflow as unconfigured"
            );
        }
        Ok((ticket, job_type))
    }

    async fn transition<F>(
        &self,
        ticket_id: &TicketId,
        plan: F,
    ) -> Result<Option<(WorkflowTransition, Ticket)>, CoreError>
    where
        F: Fn(Option<&WorkflowSteps>, &WorkflowState) -> Option<WorkflowTransition> + Send + Sync,
    {
        let mut retries = 0;
        loop {
            let (ticket, job_type) = self.load(ticket_id).await?;
            let state = WorkflowState::from(&ticket);

            let Some(transition) = plan(job_type.as_ref().map(|j| &j.workflow_steps), &state)
            else {
                debug!(
                    ticket_id = %ticket_id.0,
                    current_step = ?state.current_step,
                    "No workflow transition"
                );
                return Ok(None);
            };

            match self
                .ticket_repo
                .update(ticket_id, ticket.version, transition.form())
                .await
            {
                Ok(updated) => {
                    info!(
                        ticket_id = %ticket_id.0,
                        transition = transition.kind(),
                        from = ?transition.source(),
                        to = ?transition.target(),
                        version = updated.version,
                        "Workflow transition applied"
                    );
                    self.publish(ticket_id, &transition).await;
                    return Ok(Some((transition, updated)));
                }
                Err(e) if e.is_conflict() && retries < self.config.max_conflict_retries => {
                    retries += 1;
                    warn!(
                        ticket_id = %ticket_id.0,
                        transition = transition.kind(),
                        attempt = retries,
                        "Ticket changed concurrently, re-planning"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn publish(&self, ticket_id: &TicketId, transition: &WorkflowTransition) {
        let timestamp = Utc::now();
        let ticket_id = ticket_id.clone();

        let event: Box<dyn DomainEvent> = match transition {
            WorkflowTransition::Start(t) => Box::new(TicketWorkflowStarted {
                ticket_id,
                stage: t.to,
                timestamp,
            }),
            WorkflowTransition::Advance(t) => Box::new(TicketStepAdvanced {
                ticket_id,
                from: t.from.clone(),
                to: t.to,
                timestamp,
            }),
            WorkflowTransition::Revert(t) => Box::new(TicketStepReverted {
                ticket_id,
                from: t.from.clone(),
                to: t.to,
                timestamp,
            }),
            WorkflowTransition::Complete(t) => Box::new(TicketCompleted {
                ticket_id,
                last_step: t.from.clone(),
                timestamp,
            }),
        };

        // The write already happened; a failing subscriber must not undo it
        let _ = self
            .event_handler
            .handle_event(event)
            .await
            .log_err("Domain event handler failed");
    }
}
