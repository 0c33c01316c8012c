use async_trait::async_trait;
use mockall::{mock, predicate::eq};
use pressflow_core::{
    CoreError, JobType, JobTypeId, JobTypeRepository, LoggingEventHandler, Ticket,
    TicketDetails, TicketId, TicketRepository, TicketStatus, TicketUpdate,
    TicketWorkflowService, WorkflowConfig, WorkflowStage, WorkflowSteps,
};
use std::sync::Arc;

mock! {
    pub Tickets {}

    #[async_trait]
    impl TicketRepository for Tickets {
        async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, CoreError>;
        async fn create(&self, ticket: &Ticket) -> Result<(), CoreError>;
        async fn update(
            &self,
            id: &TicketId,
            expected_version: u64,
            update: &TicketUpdate,
        ) -> Result<Ticket, CoreError>;
        async fn list_by_status(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, CoreError>;
        async fn delete(&self, id: &TicketId) -> Result<(), CoreError>;
    }
}

mock! {
    pub JobTypes {}

    #[async_trait]
    impl JobTypeRepository for JobTypes {
        async fn find_by_id(&self, id: &JobTypeId) -> Result<Option<JobType>, CoreError>;
        async fn save(&self, job_type: &JobType) -> Result<(), CoreError>;
        async fn list(&self) -> Result<Vec<JobType>, CoreError>;
        async fn delete(&self, id: &JobTypeId) -> Result<(), CoreError>;
    }
}

fn ticket_on(step: Option<&str>) -> Ticket {
    let mut ticket = Ticket::new(
        JobTypeId("sign".to_string()),
        TicketDetails {
            ticket_number: "JT-0200".to_string(),
            customer_name: "Harbor Realty".to_string(),
            description: None,
        },
    );
    ticket.current_workflow_step = step.map(str::to_string);
    ticket.status = TicketStatus::InProgress;
    ticket.version = 4;
    ticket
}

fn job_types() -> MockJobTypes {
    let mut job_types = MockJobTypes::new();
    job_types.expect_find_by_id().returning(|id| {
        Ok(Some(JobType::new(
            id.clone(),
            "Yard Sign",
            WorkflowSteps::enabled([WorkflowStage::Printing, WorkflowStage::Cutting]),
        )))
    });
    job_types
}

fn service(tickets: MockTickets, retries: u32) -> TicketWorkflowService {
    TicketWorkflowService::new(
        Arc::new(tickets),
        Arc::new(job_types()),
        Arc::new(LoggingEventHandler),
        WorkflowConfig {
            max_conflict_retries: retries,
        },
    )
}

#[tokio::test]
async fn test_persistence_failure_is_returned_unchanged() {
    let ticket = ticket_on(Some("printing"));
    let id = ticket.id.clone();

    let mut tickets = MockTickets::new();
    tickets
        .expect_find_by_id()
        .times(1)
        .returning(move |_| Ok(Some(ticket.clone())));
    tickets
        .expect_update()
        .with(eq(id.clone()), eq(4), eq(TicketUpdate::step(WorkflowStage::Cutting)))
        .times(1)
        .returning(|_, _, _| Err(CoreError::StateStoreError("connection reset".to_string())));

    let err = service(tickets, 3).advance(&id).await.unwrap_err();
    assert_eq!(err, CoreError::StateStoreError("connection reset".to_string()));
}

#[tokio::test]
async fn test_initialize_on_pending_ticket_writes_only_the_step() {
    let mut ticket = ticket_on(None);
    ticket.status = TicketStatus::Pending;
    ticket.version = 0;
    let id = ticket.id.clone();
    let mut started = ticket.clone();
    started.apply(&TicketUpdate::step(WorkflowStage::Printing));

    let expected = TicketUpdate {
        status: None,
        current_workflow_step: Some(Some("printing".to_string())),
    };

    let mut tickets = MockTickets::new();
    tickets
        .expect_find_by_id()
        .returning(move |_| Ok(Some(ticket.clone())));
    tickets
        .expect_update()
        .with(eq(id.clone()), eq(0), eq(expected))
        .times(1)
        .returning(move |_, _, _| Ok(started.clone()));

    service(tickets, 3).initialize(&id).await.unwrap();
}

#[tokio::test]
async fn test_completion_writes_status_and_clears_step() {
    let ticket = ticket_on(Some("cutting"));
    let id = ticket.id.clone();
    let mut completed = ticket.clone();
    completed.apply(&TicketUpdate::completed());

    let mut tickets = MockTickets::new();
    tickets
        .expect_find_by_id()
        .returning(move |_| Ok(Some(ticket.clone())));
    tickets
        .expect_update()
        .with(eq(id.clone()), eq(4), eq(TicketUpdate::completed()))
        .times(1)
        .returning(move |_, _, _| Ok(completed.clone()));

    assert!(!service(tickets, 3).advance(&id).await.unwrap());
}

#[tokio::test]
async fn test_conflicts_are_retried_then_surface() {
    let ticket = ticket_on(Some("printing"));
    let id = ticket.id.clone();

    let mut tickets = MockTickets::new();
    tickets
        .expect_find_by_id()
        .times(3)
        .returning(move |_| Ok(Some(ticket.clone())));
    tickets.expect_update().times(3).returning(|id, expected, _| {
        Err(CoreError::ConcurrencyConflict {
            ticket_id: id.0.clone(),
            expected,
            actual: expected + 1,
        })
    });

    let err = service(tickets, 2).advance(&id).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_conflict_then_success_replans_from_fresh_state() {
    let stale = ticket_on(Some("printing"));
    let id = stale.id.clone();
    let mut fresh = stale.clone();
    fresh.current_workflow_step = Some("cutting".to_string());
    fresh.version = 5;
    let mut done = fresh.clone();
    done.apply(&TicketUpdate::completed());

    let mut seq = mockall::Sequence::new();
    let mut tickets = MockTickets::new();
    tickets
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_| Ok(Some(stale.clone())));
    tickets
        .expect_update()
        .with(eq(id.clone()), eq(4), eq(TicketUpdate::step(WorkflowStage::Cutting)))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|id, _, _| {
            Err(CoreError::ConcurrencyConflict {
                ticket_id: id.0.clone(),
                expected: 4,
                actual: 5,
            })
        });
    tickets
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_| Ok(Some(fresh.clone())));
    tickets
        .expect_update()
        .with(eq(id.clone()), eq(5), eq(TicketUpdate::completed()))
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_, _, _| Ok(done.clone()));

    // The other writer already moved to cutting, so this advance completes
    assert!(!service(tickets, 3).advance(&id).await.unwrap());
}

#[tokio::test]
async fn test_revert_without_previous_step_never_writes() {
    let ticket = ticket_on(Some("printing"));
    let id = ticket.id.clone();

    let mut tickets = MockTickets::new();
    tickets
        .expect_find_by_id()
        .returning(move |_| Ok(Some(ticket.clone())));
    tickets.expect_update().never();

    assert!(!service(tickets, 3).revert(&id).await.unwrap());
}

#[tokio::test]
async fn test_lookup_failure_is_returned_unchanged() {
    let mut tickets = MockTickets::new();
    tickets
        .expect_find_by_id()
        .returning(|_| Err(CoreError::StateStoreError("timeout".to_string())));
    tickets.expect_update().never();

    let err = service(tickets, 3)
        .initialize(&TicketId("t-9".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::StateStoreError("timeout".to_string()));
}
