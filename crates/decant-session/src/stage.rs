//! Workflow stage progression

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage of the ingestion workflow, in order. Transitions only move
/// forward; `reset` is the single way back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IngestionStage {
    #[default]
    ChooseSource,
    ConfigureSource,
    SelectColumns,
    ConfigureTarget,
    ReadyToTransfer,
    Complete,
}

impl IngestionStage {
    /// Zero-based position in the workflow, for progress display
    pub fn index(&self) -> usize {
        match self {
            IngestionStage::ChooseSource => 0,
            IngestionStage::ConfigureSource => 1,
            IngestionStage::SelectColumns => 2,
            IngestionStage::ConfigureTarget => 3,
            IngestionStage::ReadyToTransfer => 4,
            IngestionStage::Complete => 5,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            IngestionStage::ChooseSource => "Select Source",
            IngestionStage::ConfigureSource => "Configure Source",
            IngestionStage::SelectColumns => "Select Columns",
            IngestionStage::ConfigureTarget => "Configure Target",
            IngestionStage::ReadyToTransfer => "Review & Transfer",
            IngestionStage::Complete => "Complete",
        }
    }
}

impl fmt::Display for IngestionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
