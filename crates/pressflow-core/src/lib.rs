//!
//! Pressflow Core - Ticket workflow engine for the Pressflow print-shop platform
//!
//! This crate defines the domain model (production stages, job types,
//! tickets), the workflow step engine that sequences a ticket through its job
//! type's active stages, the repository interfaces it persists through, and
//! the application service that applies transitions atomically.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - core business models, entities, and rules
pub mod domain;

/// Application services - core application logic
pub mod application;

/// Configuration loading
pub mod config;

/// Structured logging setup
pub mod logging;

/// Error types
pub mod error;

// Re-export key types
pub use error::CoreError;

// Re-export main API types for easy use
pub use application::workflow_service::{
    DomainEventHandler, LoggingEventHandler, TicketWorkflowService,
};
pub use config::{DatabaseConfig, LoggingConfig, PressflowConfig, WorkflowConfig};
pub use domain::job_type::{JobType, JobTypeId, WorkflowSteps};
pub use domain::repository::{JobTypeRepository, TicketRepository};
pub use domain::stage::{WorkflowStage, CANONICAL_ORDER};
pub use domain::ticket::{Ticket, TicketDetails, TicketId, TicketStatus, TicketUpdate};
pub use domain::workflow::{
    active_steps, first_step, next_step, previous_step, progress, WorkflowSnapshot,
    WorkflowState, WorkflowTransition,
};
