use serde::{Deserialize, Serialize};

use super::run::PipelineRun;

/// The eight pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Generate,
    Refine,
    Store,
    AiProcessing,
    Workflow,
    Orchestration,
    Deployment,
    Monitoring,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Self::Generate,
        Self::Refine,
        Self::Store,
        Self::AiProcessing,
        Self::Workflow,
        Self::Orchestration,
        Self::Deployment,
        Self::Monitoring,
    ];

    /// 1-based position in the pipeline.
    pub fn step(&self) -> u8 {
        match self {
            Self::Generate => 1,
            Self::Refine => 2,
            Self::Store => 3,
            Self::AiProcessing => 4,
            Self::Workflow => 5,
            Self::Orchestration => 6,
            Self::Deployment => 7,
            Self::Monitoring => 8,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Generate => "UI Generation",
            Self::Refine => "Refinement",
            Self::Store => "Component Storage",
            Self::AiProcessing => "AI Processing",
            Self::Workflow => "Workflow Creation",
            Self::Orchestration => "Orchestration",
            Self::Deployment => "Deployment",
            Self::Monitoring => "Monitoring Setup",
        }
    }

    /// Only generation may abort a run; every later stage tolerates its own
    /// failure.
    pub fn is_fatal_on_failure(&self) -> bool {
        matches!(self, Self::Generate)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    /// Failed without stopping the run; the run lacks this stage's fields.
    Skipped { reason: String },
    Fatal { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub step: u8,
    #[serde(flatten)]
    pub status: StageStatus,
}

impl StageReport {
    pub fn new(stage: Stage, status: StageStatus) -> Self {
        Self {
            stage,
            step: stage.step(),
            status,
        }
    }
}

/// Outcome of one pipeline run: the stage-7 output plus one report per
/// stage reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run: PipelineRun,
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// True when any stage was skipped after a failure.
    pub fn is_degraded(&self) -> bool {
        self.stages
            .iter()
            .any(|r| matches!(r.status, StageStatus::Skipped { .. }))
    }

    pub fn status_of(&self, stage: Stage) -> Option<&StageStatus> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| &r.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_follow_declaration_order() {
        let steps: Vec<u8> = Stage::ALL.iter().map(Stage::step).collect();
        assert_eq!(steps, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn only_generation_is_fatal() {
        let fatal: Vec<Stage> = Stage::ALL
            .into_iter()
            .filter(Stage::is_fatal_on_failure)
            .collect();
        assert_eq!(fatal, vec![Stage::Generate]);
    }

    #[test]
    fn report_serializes_status_inline() {
        let report = StageReport::new(
            Stage::Deployment,
            StageStatus::Skipped {
                reason: "Deployment returned 500".to_string(),
            },
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["stage"], "deployment");
        assert_eq!(value["step"], 7);
        assert_eq!(value["status"], "skipped");
        assert_eq!(value["reason"], "Deployment returned 500");
    }
}
