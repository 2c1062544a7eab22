// ABOUTME: Sequences Scout -> Analyst -> Strategy -> Presenter for one job
// ABOUTME: Scout and Strategy run through LATS search unless bypassed; status callbacks are best-effort

use crate::heuristics::{ScoutHeuristic, SeverityReflection, StrategyHeuristic};
use crate::stages::{PipelineStages, ScoutCandidates, StrategyCandidates};
use athena_core::{
    AnalysisDepth, AnalystResult, DepthPreset, PipelineStage, PresenterResult, ScoutResult,
    StrategyResult,
};
use athena_lats::{LatsConfig, LatsEngine, SearchTrace};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Receives (stage, progress 0-100, message). Failures are logged and ignored.
pub type StatusCallback =
    Arc<dyn Fn(PipelineStage, u8, String) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{} stage failed for job {}", .stage.title(), .job_id)]
    StageFailed { stage: PipelineStage, job_id: String },

    #[error("{} stage failed for job {}: {}", .stage.title(), .job_id, .source)]
    StageError {
        stage: PipelineStage,
        job_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    fn no_result(stage: PipelineStage, job_id: &str) -> Self {
        PipelineError::StageFailed {
            stage,
            job_id: job_id.to_string(),
        }
    }

    fn collaborator(stage: PipelineStage, job_id: &str, source: anyhow::Error) -> Self {
        PipelineError::StageError {
            stage,
            job_id: job_id.to_string(),
            source,
        }
    }

    /// Stage that failed, if the error is stage-specific.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            PipelineError::StageFailed { stage, .. } | PipelineError::StageError { stage, .. } => {
                Some(*stage)
            }
            PipelineError::InvalidConfig(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Candidates per first expansion; `quick` forces 1 and `deep` forces 3
    pub n_candidates: usize,
    pub quality_threshold: f64,
    pub max_depth: usize,
    /// Master switch; when false every stage is a single direct call
    pub use_lats: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            n_candidates: 2,
            quality_threshold: 0.65,
            max_depth: 2,
            use_lats: true,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_preset(preset: DepthPreset, use_lats: bool) -> Self {
        Self {
            n_candidates: preset.n_candidates,
            quality_threshold: preset.quality_threshold,
            max_depth: preset.max_depth,
            use_lats,
        }
    }

    /// Engine configuration for one run at `depth`.
    pub fn engine_config(&self, depth: AnalysisDepth) -> LatsConfig {
        let n_candidates = match depth {
            AnalysisDepth::Quick => 1,
            AnalysisDepth::Standard => self.n_candidates,
            AnalysisDepth::Deep => 3,
        };
        LatsConfig {
            n_candidates,
            max_depth: self.max_depth,
            quality_threshold: self.quality_threshold,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        self.engine_config(AnalysisDepth::Standard)
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))
    }
}

/// Per-stage search record: the full trace, or a marker for single-shot stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageTrace {
    Search(SearchTrace),
    Bypassed { score: f64, lats_used: bool },
}

impl StageTrace {
    pub fn bypassed() -> Self {
        StageTrace::Bypassed {
            score: 1.0,
            lats_used: false,
        }
    }

    pub fn lats_used(&self) -> bool {
        matches!(self, StageTrace::Search(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub job_id: String,
    pub target: String,
    pub depth: AnalysisDepth,
    pub scout: ScoutResult,
    pub analyst: AnalystResult,
    pub strategy: StrategyResult,
    pub presenter: PresenterResult,
    /// Keyed by lowercase stage name (`scout`, `strategy`)
    pub lats_traces: BTreeMap<String, StageTrace>,
}

pub struct PipelineOrchestrator {
    config: OrchestratorConfig,
    stages: PipelineStages,
}

impl PipelineOrchestrator {
    pub fn new(config: OrchestratorConfig, stages: PipelineStages) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config, stages })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run all four stages for `target`.
    ///
    /// The orchestrator is never mutated, so one instance can serve concurrent jobs.
    /// On failure a best-effort `ERROR` status is emitted before the error is returned.
    pub async fn run(
        &self,
        job_id: &str,
        target: &str,
        depth: AnalysisDepth,
        status_callback: Option<&StatusCallback>,
    ) -> Result<PipelineOutput, PipelineError> {
        let started = Instant::now();
        let mut reached = PipelineStage::Pending;

        info!(
            target: "pipeline::orchestrator",
            job_id = %job_id,
            target_name = %target,
            depth = %depth,
            use_lats = self.config.use_lats,
            "Pipeline started"
        );

        match self
            .run_stages(job_id, target, depth, status_callback, &mut reached)
            .await
        {
            Ok(output) => {
                info!(
                    target: "pipeline::orchestrator",
                    job_id = %job_id,
                    depth = %depth,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Pipeline complete"
                );
                Ok(output)
            }
            Err(err) => {
                error!(
                    target: "pipeline::orchestrator",
                    job_id = %job_id,
                    stage = %reached,
                    error = %err,
                    "Pipeline failed"
                );
                emit(
                    status_callback,
                    PipelineStage::Error,
                    reached.checkpoint().unwrap_or(0),
                    err.to_string(),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        job_id: &str,
        target: &str,
        depth: AnalysisDepth,
        status_callback: Option<&StatusCallback>,
        reached: &mut PipelineStage,
    ) -> Result<PipelineOutput, PipelineError> {
        let use_search = self.config.use_lats && depth != AnalysisDepth::Quick;
        let engine = LatsEngine::new(self.config.engine_config(depth));
        let mut lats_traces = BTreeMap::new();

        // Scout
        advance(
            status_callback,
            reached,
            PipelineStage::Scout,
            format!("Gathering intelligence on {}...", target),
        )
        .await;

        let scout = if use_search {
            let candidates = ScoutCandidates::new(self.stages.scout.as_ref(), target);
            let (result, score, trace) = engine
                .search::<ScoutResult, _, _, _>(
                    &candidates,
                    &ScoutHeuristic,
                    &SeverityReflection,
                    target,
                    job_id,
                )
                .await
                .into_parts();
            info!(
                target: "pipeline::orchestrator",
                job_id = %job_id,
                score,
                "Scout search finished"
            );
            lats_traces.insert("scout".to_string(), StageTrace::Search(trace));
            result
        } else {
            let result = self
                .stages
                .scout
                .scout(target, target)
                .await
                .map_err(|e| PipelineError::collaborator(PipelineStage::Scout, job_id, e))?;
            lats_traces.insert("scout".to_string(), StageTrace::bypassed());
            result
        };
        let scout = scout.ok_or_else(|| PipelineError::no_result(PipelineStage::Scout, job_id))?;

        // Analyst
        advance(
            status_callback,
            reached,
            PipelineStage::Analyst,
            "Structuring intelligence data...".to_string(),
        )
        .await;

        let analyst = self
            .stages
            .analyst
            .analyze(&scout)
            .await
            .map_err(|e| PipelineError::collaborator(PipelineStage::Analyst, job_id, e))?
            .ok_or_else(|| PipelineError::no_result(PipelineStage::Analyst, job_id))?;

        // Strategy
        advance(
            status_callback,
            reached,
            PipelineStage::Strategy,
            "Generating strategic analysis...".to_string(),
        )
        .await;

        let strategy = if use_search {
            let candidates = StrategyCandidates::new(self.stages.strategy.as_ref(), &analyst);
            let (result, score, trace) = engine
                .search::<StrategyResult, _, _, _>(
                    &candidates,
                    &StrategyHeuristic,
                    &SeverityReflection,
                    &analyst.analysis_summary,
                    job_id,
                )
                .await
                .into_parts();
            info!(
                target: "pipeline::orchestrator",
                job_id = %job_id,
                score,
                "Strategy search finished"
            );
            lats_traces.insert("strategy".to_string(), StageTrace::Search(trace));
            result
        } else {
            let result = self
                .stages
                .strategy
                .strategize(&analyst, &analyst.analysis_summary)
                .await
                .map_err(|e| PipelineError::collaborator(PipelineStage::Strategy, job_id, e))?;
            lats_traces.insert("strategy".to_string(), StageTrace::bypassed());
            result
        };
        let strategy =
            strategy.ok_or_else(|| PipelineError::no_result(PipelineStage::Strategy, job_id))?;
        debug!(
            target: "pipeline::orchestrator",
            job_id = %job_id,
            positioning = strategy
                .recommended_positioning()
                .map(|option| option.name.as_str())
                .unwrap_or("none"),
            "Recommended positioning"
        );

        // Presenter
        advance(
            status_callback,
            reached,
            PipelineStage::Presenter,
            "Generating reports and deck...".to_string(),
        )
        .await;

        let presenter = self
            .stages
            .presenter
            .present(job_id, &analyst, &strategy)
            .await
            .map_err(|e| PipelineError::collaborator(PipelineStage::Presenter, job_id, e))?;

        advance(
            status_callback,
            reached,
            PipelineStage::Done,
            "Analysis complete!".to_string(),
        )
        .await;

        Ok(PipelineOutput {
            job_id: job_id.to_string(),
            target: target.to_string(),
            depth,
            scout,
            analyst,
            strategy,
            presenter,
            lats_traces,
        })
    }
}

async fn advance(
    callback: Option<&StatusCallback>,
    reached: &mut PipelineStage,
    stage: PipelineStage,
    message: String,
) {
    *reached = stage;
    let progress = stage.checkpoint().unwrap_or(0);
    info!(
        target: "pipeline::orchestrator",
        stage = %stage,
        activity = stage.label(),
        progress,
        "{}",
        message
    );
    emit(callback, stage, progress, message).await;
}

async fn emit(
    callback: Option<&StatusCallback>,
    stage: PipelineStage,
    progress: u8,
    message: String,
) {
    let Some(callback) = callback else {
        return;
    };
    if let Err(e) = callback(stage, progress, message).await {
        warn!(
            target: "pipeline::orchestrator",
            stage = %stage,
            error = %e,
            "Status callback failed"
        );
    }
}
