use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::stage::WorkflowStage;

/// Value object: Job Type ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobTypeId(pub String);

/// Per-job-type map of stage name to enabled flag.
///
/// Stages missing from the map are disabled. Names that are not stages
/// (reserved or unknown) are kept as-is but never become active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowSteps(HashMap<String, bool>);

impl WorkflowSteps {
    /// Create an empty configuration with every stage disabled
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Build a configuration that enables exactly the given stages
    pub fn enabled<I>(stages: I) -> Self
    where
        I: IntoIterator<Item = WorkflowStage>,
    {
        Self(
            stages
                .into_iter()
                .map(|stage| (stage.as_str().to_string(), true))
                .collect(),
        )
    }

    /// Set a flag by stage name
    pub fn with_flag(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.0.insert(name.into(), enabled);
        self
    }

    /// Whether the stage is enabled
    #[inline]
    pub fn is_enabled(&self, stage: WorkflowStage) -> bool {
        self.0.get(stage.as_str()).copied().unwrap_or(false)
    }

    /// Raw flags as supplied
    pub fn flags(&self) -> &HashMap<String, bool> {
        &self.0
    }
}

impl From<HashMap<String, bool>> for WorkflowSteps {
    fn from(flags: HashMap<String, bool>) -> Self {
        Self(flags)
    }
}

/// A class of print job and the production stages it goes through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobType {
    /// Unique identifier
    pub id: JobTypeId,

    /// Display name, e.g. "Vinyl Banner"
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Which stages apply to this job type
    pub workflow_steps: WorkflowSteps,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl JobType {
    /// Create a new job type
    pub fn new(id: JobTypeId, name: impl Into<String>, workflow_steps: WorkflowSteps) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: None,
            workflow_steps,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
