use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pressflow_core::{
    CoreError, JobType, JobTypeId, JobTypeRepository, Ticket, TicketId, TicketRepository,
    TicketStatus, TicketUpdate, WorkflowSteps,
};
use sqlx::{postgres::PgRow, Row};
use tracing::debug;

use crate::PostgresConnection;

const TICKET_COLUMNS: &str = "id, job_type_id, ticket_number, customer_name, description, \
     status, current_workflow_step, version, created_at, updated_at";

fn db_error(context: &str, e: sqlx::Error) -> CoreError {
    CoreError::StateStoreError(format!("{}: {}", context, e))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map_or(false, |db| db.is_unique_violation())
}

fn column_error(e: sqlx::Error) -> CoreError {
    CoreError::SerializationError(format!("Error reading column: {}", e))
}

fn version_to_db(version: u64) -> Result<i64, CoreError> {
    i64::try_from(version)
        .map_err(|_| CoreError::SerializationError(format!("Version out of range: {}", version)))
}

/// Columns of a `tickets` row
#[derive(Debug, Clone)]
struct TicketRow {
    id: String,
    job_type_id: String,
    ticket_number: String,
    customer_name: String,
    description: Option<String>,
    status: String,
    current_workflow_step: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TicketRow {
    fn read(row: &PgRow) -> Result<Self, CoreError> {
        Ok(Self {
            id: row.try_get("id").map_err(column_error)?,
            job_type_id: row.try_get("job_type_id").map_err(column_error)?,
            ticket_number: row.try_get("ticket_number").map_err(column_error)?,
            customer_name: row.try_get("customer_name").map_err(column_error)?,
            description: row.try_get("description").map_err(column_error)?,
            status: row.try_get("status").map_err(column_error)?,
            current_workflow_step: row.try_get("current_workflow_step").map_err(column_error)?,
            version: row.try_get("version").map_err(column_error)?,
            created_at: row.try_get("created_at").map_err(column_error)?,
            updated_at: row.try_get("updated_at").map_err(column_error)?,
        })
    }
}

impl TryFrom<TicketRow> for Ticket {
    type Error = CoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status = TicketStatus::from_name(&row.status).ok_or_else(|| {
            CoreError::SerializationError(format!(
                "Unknown status '{}' on ticket {}",
                row.status, row.id
            ))
        })?;
        let version = u64::try_from(row.version).map_err(|_| {
            CoreError::SerializationError(format!(
                "Negative version {} on ticket {}",
                row.version, row.id
            ))
        })?;

        Ok(Ticket {
            id: TicketId(row.id),
            job_type_id: JobTypeId(row.job_type_id),
            ticket_number: row.ticket_number,
            customer_name: row.customer_name,
            description: row.description,
            status,
            current_workflow_step: row.current_workflow_step,
            version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn read_ticket(row: &PgRow) -> Result<Ticket, CoreError> {
    Ticket::try_from(TicketRow::read(row)?)
}

fn read_job_type(row: &PgRow) -> Result<JobType, CoreError> {
    let steps: serde_json::Value = row.try_get("workflow_steps").map_err(column_error)?;
    let workflow_steps: WorkflowSteps = serde_json::from_value(steps)?;

    Ok(JobType {
        id: JobTypeId(row.try_get("id").map_err(column_error)?),
        name: row.try_get("name").map_err(column_error)?,
        description: row.try_get("description").map_err(column_error)?,
        workflow_steps,
        created_at: row.try_get("created_at").map_err(column_error)?,
        updated_at: row.try_get("updated_at").map_err(column_error)?,
    })
}

/// Postgres implementation of the TicketRepository
#[derive(Clone)]
pub struct PostgresTicketRepository {
    conn: PostgresConnection,
}

impl PostgresTicketRepository {
    /// Create a new Postgres ticket repository
    pub fn new(conn: PostgresConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl TicketRepository for PostgresTicketRepository {
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, CoreError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: find_by_id called for ticket {}", id.0);
            return Ok(None);
        }

        let query = format!("SELECT {} FROM tickets WHERE id = $1", TICKET_COLUMNS);
        let row = sqlx::query(&query)
            .bind(&id.0)
            .fetch_optional(self.conn.pool()?)
            .await
            .map_err(|e| db_error("Database error", e))?;

        row.as_ref().map(read_ticket).transpose()
    }

    async fn create(&self, ticket: &Ticket) -> Result<(), CoreError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: create called for ticket {}", ticket.id.0);
            return Ok(());
        }

        let query = "
            INSERT INTO tickets (
                id, job_type_id, ticket_number, customer_name, description,
                status, current_workflow_step, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ";

        sqlx::query(query)
            .bind(&ticket.id.0)
            .bind(&ticket.job_type_id.0)
            .bind(&ticket.ticket_number)
            .bind(&ticket.customer_name)
            .bind(&ticket.description)
            .bind(ticket.status.as_str())
            .bind(&ticket.current_workflow_step)
            .bind(version_to_db(ticket.version)?)
            .bind(ticket.created_at)
            .bind(ticket.updated_at)
            .execute(self.conn.pool()?)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    CoreError::ValidationError(format!("Ticket already exists: {}", ticket.id.0))
                } else {
                    db_error("Failed to create ticket", e)
                }
            })?;

        Ok(())
    }

    async fn update(
        &self,
        id: &TicketId,
        expected_version: u64,
        update: &TicketUpdate,
    ) -> Result<Ticket, CoreError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: update called for ticket {}", id.0);
            return Err(CoreError::TicketNotFound(id.0.clone()));
        }

        let mut tx = self
            .conn
            .pool()?
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let query = format!(
            "SELECT {} FROM tickets WHERE id = $1 FOR UPDATE",
            TICKET_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(&id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error("Database error", e))?
            .ok_or_else(|| CoreError::TicketNotFound(id.0.clone()))?;

        // Returning early drops the transaction, which rolls it back
        let mut ticket = read_ticket(&row)?;
        if ticket.version != expected_version {
            return Err(CoreError::ConcurrencyConflict {
                ticket_id: id.0.clone(),
                expected: expected_version,
                actual: ticket.version,
            });
        }

        ticket.apply(update);

        let query = "
            UPDATE tickets
            SET status = $2, current_workflow_step = $3, version = $4, updated_at = $5
            WHERE id = $1 AND version = $6
        ";
        sqlx::query(query)
            .bind(&id.0)
            .bind(ticket.status.as_str())
            .bind(&ticket.current_workflow_step)
            .bind(version_to_db(ticket.version)?)
            .bind(ticket.updated_at)
            .bind(version_to_db(expected_version)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to update ticket", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit ticket update", e))?;

        Ok(ticket)
    }

    async fn list_by_status(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, CoreError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: list_by_status called");
            return Ok(vec![]);
        }

        let query = format!(
            "SELECT {} FROM tickets WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at",
            TICKET_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(self.conn.pool()?)
            .await
            .map_err(|e| db_error("Database error", e))?;

        rows.iter().map(read_ticket).collect()
    }

    async fn delete(&self, id: &TicketId) -> Result<(), CoreError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: delete called for ticket {}", id.0);
            return Ok(());
        }

        sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(&id.0)
            .execute(self.conn.pool()?)
            .await
            .map_err(|e| db_error("Failed to delete ticket", e))?;

        Ok(())
    }
}

/// Postgres implementation of the JobTypeRepository
#[derive(Clone)]
pub struct PostgresJobTypeRepository {
    conn: PostgresConnection,
}

impl PostgresJobTypeRepository {
    /// Create a new Postgres job type repository
    pub fn new(conn: PostgresConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl JobTypeRepository for PostgresJobTypeRepository {
    async fn find_by_id(&self, id: &JobTypeId) -> Result<Option<JobType>, CoreError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: find_by_id called for job type {}", id.0);
            return Ok(None);
        }

        let query = "
            SELECT id, name, description, workflow_steps, created_at, updated_at
            FROM job_types
            WHERE id = $1
        ";
        let row = sqlx::query(query)
            .bind(&id.0)
            .fetch_optional(self.conn.pool()?)
            .await
            .map_err(|e| db_error("Database error", e))?;

        row.as_ref().map(read_job_type).transpose()
    }

    async fn save(&self, job_type: &JobType) -> Result<(), CoreError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: save called for job type {}", job_type.id.0);
            return Ok(());
        }

        let steps = serde_json::to_value(&job_type.workflow_steps)?;

        let query = "
            INSERT INTO job_types (id, name, description, workflow_steps, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = $2,
                description = $3,
                workflow_steps = $4,
                updated_at = $6
        ";

        sqlx::query(query)
            .bind(&job_type.id.0)
            .bind(&job_type.name)
            .bind(&job_type.description)
            .bind(&steps)
            .bind(job_type.created_at)
            .bind(job_type.updated_at)
            .execute(self.conn.pool()?)
            .await
            .map_err(|e| db_error("Failed to save job type", e))?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<JobType>, CoreError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: list called for job types");
            return Ok(vec![]);
        }

        let query = "
            SELECT id, name, description, workflow_steps, created_at, updated_at
            FROM job_types
            ORDER BY name
        ";
        let rows = sqlx::query(query)
            .fetch_all(self.conn.pool()?)
            .await
            .map_err(|e| db_error("Database error", e))?;

        rows.iter().map(read_job_type).collect()
    }

    async fn delete(&self, id: &JobTypeId) -> Result<(), CoreError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: delete called for job type {}", id.0);
            return Ok(());
        }

        sqlx::query("DELETE FROM job_types WHERE id = $1")
            .bind(&id.0)
            .execute(self.conn.pool()?)
            .await
            .map_err(|e| db_error("Failed to delete job type", e))?;

        Ok(())
    }
}
