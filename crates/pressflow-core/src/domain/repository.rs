//! Repository traits for Pressflow Core
//!
//! This module defines the repository traits the workflow service writes
//! through. External crates implement them to provide different persistence
//! mechanisms.

use async_trait::async_trait;

use super::job_type::{JobType, JobTypeId};
use super::ticket::{Ticket, TicketId, TicketStatus, TicketUpdate};
use crate::CoreError;

/// Repository for job tickets
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Find a ticket by ID
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, CoreError>;

    /// Store a new ticket.
    ///
    /// Fails with [`CoreError::ValidationError`] when the ID is already taken.
    async fn create(&self, ticket: &Ticket) -> Result<(), CoreError>;

    /// Apply a partial update if the stored version still equals
    /// `expected_version`, returning the updated ticket.
    ///
    /// Fails with [`CoreError::ConcurrencyConflict`] when the version moved and
    /// [`CoreError::TicketNotFound`] when the ticket does not exist.
    async fn update(
        &self,
        id: &TicketId,
        expected_version: u64,
        update: &TicketUpdate,
    ) -> Result<Ticket, CoreError>;

    /// List tickets, optionally filtered by status
    async fn list_by_status(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, CoreError>;

    /// Delete a ticket
    async fn delete(&self, id: &TicketId) -> Result<(), CoreError>;
}

/// Repository for job types
#[async_trait]
pub trait JobTypeRepository: Send + Sync {
    /// Find a job type by ID
    async fn find_by_id(&self, id: &JobTypeId) -> Result<Option<JobType>, CoreError>;

    /// Save a job type
    async fn save(&self, job_type: &JobType) -> Result<(), CoreError>;

    /// List all job types
    async fn list(&self) -> Result<Vec<JobType>, CoreError>;

    /// Delete a job type
    async fn delete(&self, id: &JobTypeId) -> Result<(), CoreError>;
}

/// Memory implementations for testing and single-process deployments
#[cfg(feature = "testing")]
pub mod memory {
    use super::*;
    use dashmap::{mapref::entry::Entry, DashMap};
    use std::sync::Arc;

    /// In-memory ticket repository using a concurrent map.
    ///
    /// The version check and write in [`TicketRepository::update`] happen
    /// under the entry's shard lock.
    #[derive(Clone)]
    pub struct MemoryTicketRepository {
        tickets: Arc<DashMap<String, Ticket>>,
    }

    impl MemoryTicketRepository {
        /// Create a new memory ticket repository
        pub fn new() -> Self {
            Self {
                tickets: Arc::new(DashMap::with_capacity(64)),
            }
        }

        /// Number of stored tickets
        pub fn len(&self) -> usize {
            self.tickets.len()
        }

        /// Whether the repository is empty
        pub fn is_empty(&self) -> bool {
            self.tickets.is_empty()
        }
    }

    impl Default for MemoryTicketRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl TicketRepository for MemoryTicketRepository {
        async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, CoreError> {
            Ok(self.tickets.get(&id.0).map(|ticket| ticket.clone()))
        }

        async fn create(&self, ticket: &Ticket) -> Result<(), CoreError> {
            match self.tickets.entry(ticket.id.0.clone()) {
                Entry::Occupied(_) => Err(CoreError::ValidationError(format!(
                    "Ticket already exists: {}",
                    ticket.id.0
                ))),
                Entry::Vacant(slot) => {
                    slot.insert(ticket.clone());
                    Ok(())
                }
            }
        }

        async fn update(
            &self,
            id: &TicketId,
            expected_version: u64,
            update: &TicketUpdate,
        ) -> Result<Ticket, CoreError> {
            let mut entry = self
                .tickets
                .get_mut(&id.0)
                .ok_or_else(|| CoreError::TicketNotFound(id.0.clone()))?;

            if entry.version != expected_version {
                return Err(CoreError::ConcurrencyConflict {
                    ticket_id: id.0.clone(),
                    expected: expected_version,
                    actual: entry.version,
                });
            }

            entry.apply(update);
            Ok(entry.clone())
        }

        async fn list_by_status(
            &self,
            status: Option<TicketStatus>,
        ) -> Result<Vec<Ticket>, CoreError> {
            let mut tickets: Vec<Ticket> = self
                .tickets
                .iter()
                .filter(|entry| status.map_or(true, |s| entry.status == s))
                .map(|entry| entry.value().clone())
                .collect();
            tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(tickets)
        }

        async fn delete(&self, id: &TicketId) -> Result<(), CoreError> {
            self.tickets.remove(&id.0);
            Ok(())
        }
    }

    /// In-memory job type repository
    #[derive(Clone)]
    pub struct MemoryJobTypeRepository {
        job_types: Arc<DashMap<String, JobType>>,
    }

    impl MemoryJobTypeRepository {
        /// Create a new memory job type repository
        pub fn new() -> Self {
            Self {
                job_types: Arc::new(DashMap::with_capacity(16)),
            }
        }
    }

    impl Default for MemoryJobTypeRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl JobTypeRepository for MemoryJobTypeRepository {
        async fn find_by_id(&self, id: &JobTypeId) -> Result<Option<JobType>, CoreError> {
            Ok(self.job_types.get(&id.0).map(|job_type| job_type.clone()))
        }

        async fn save(&self, job_type: &JobType) -> Result<(), CoreError> {
            self.job_types
                .insert(job_type.id.0.clone(), job_type.clone());
            Ok(())
        }

        async fn list(&self) -> Result<Vec<JobType>, CoreError> {
            let mut job_types: Vec<JobType> =
                self.job_types.iter().map(|entry| entry.value().clone()).collect();
            job_types.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(job_types)
        }

        async fn delete(&self, id: &JobTypeId) -> Result<(), CoreError> {
            self.job_types.remove(&id.0);
            Ok(())
        }
    }

}
