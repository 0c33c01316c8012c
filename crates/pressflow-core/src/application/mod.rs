/// Ticket workflow service
pub mod workflow_service;
