use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// A production stage a ticket can pass through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// Large-format or sublimation printing
    Printing,
    /// Lamination or heat press
    LaminationHeatpress,
    /// Cutting and trimming
    Cutting,
    /// Sewing and hemming
    Sewing,
    /// DTF transfer pressing
    DtfPress,
}

/// Fixed order in which stages are always considered.
///
/// `design`, `assembly` and `quality_check` are reserved stage names and are
/// intentionally absent.
pub const CANONICAL_ORDER: [WorkflowStage; 5] = [
    WorkflowStage::Printing,
    WorkflowStage::LaminationHeatpress,
    WorkflowStage::Cutting,
    WorkflowStage::Sewing,
    WorkflowStage::DtfPress,
];

/// Stage names reserved for future use; never active.
pub const RESERVED_STAGE_NAMES: [&str; 3] = ["design", "assembly", "quality_check"];

impl WorkflowStage {
    /// Stable name used in job type configuration and on ticket records
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Printing => "printing",
            WorkflowStage::LaminationHeatpress => "lamination_heatpress",
            WorkflowStage::Cutting => "cutting",
            WorkflowStage::Sewing => "sewing",
            WorkflowStage::DtfPress => "dtf_press",
        }
    }

    /// Look up a stage by its configuration name.
    ///
    /// Returns `None` for reserved and unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        CANONICAL_ORDER
            .iter()
            .copied()
            .find(|stage| stage.as_str() == name)
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown workflow stage: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_name() {
        for stage in CANONICAL_ORDER {
            assert_eq!(WorkflowStage::from_name(stage.as_str()), Some(stage));
        }
    }

    #[test]
    fn test_reserved_names_are_not_stages() {
        for name in RESERVED_STAGE_NAMES {
            assert!(WorkflowStage::from_name(name).is_none());
            assert!(name.parse::<WorkflowStage>().is_err());
        }
    }

    #[test]
    fn test_ordering_matches_canonical_order() {
        assert!(CANONICAL_ORDER.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(CANONICAL_ORDER[0], WorkflowStage::Printing);
        assert_eq!(CANONICAL_ORDER[4], WorkflowStage::DtfPress);
    }

    #[test]
    fn test_serde_uses_snake_case_names() {
        let json = serde_json::to_string(&WorkflowStage::LaminationHeatpress).unwrap();
        assert_eq!(json, "\"lamination_heatpress\"");
        let stage: WorkflowStage = serde_json::from_str("\"dtf_press\"").unwrap();
        assert_eq!(stage, WorkflowStage::DtfPress);
    }
}
