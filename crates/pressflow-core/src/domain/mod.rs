/// Production stages and their canonical order
pub mod stage;

/// Job type domain models
pub mod job_type;

/// Ticket domain models
pub mod ticket;

/// Workflow step engine
pub mod workflow;

/// Domain events
pub mod events;

/// Repository interfaces
pub mod repository;
