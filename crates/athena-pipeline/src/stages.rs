// ABOUTME: Stage collaborator traits for the four pipeline stages
// ABOUTME: Plus adapters exposing the LLM-driven stages as LATS candidate generators

use async_trait::async_trait;
use athena_core::{AnalystResult, PresenterResult, ScoutResult, StrategyResult};
use athena_lats::CandidateGenerator;
use std::sync::Arc;

/// Collects market intelligence on a target, typically via an LLM agent.
///
/// `prompt` is the target on the first attempt and carries appended quality
/// feedback on refinement attempts. `Ok(None)` means no usable result.
#[async_trait]
pub trait ScoutAgent: Send + Sync {
    async fn scout(&self, target: &str, prompt: &str) -> anyhow::Result<Option<ScoutResult>>;
}

/// Deterministic structuring of Scout output.
#[async_trait]
pub trait AnalystService: Send + Sync {
    async fn analyze(&self, scout: &ScoutResult) -> anyhow::Result<Option<AnalystResult>>;
}

/// Produces SWOT, positioning and GTM strategy from the structured analysis.
///
/// `prompt` starts as the analysis summary and gains quality feedback on refinement.
#[async_trait]
pub trait StrategyAgent: Send + Sync {
    async fn strategize(
        &self,
        analyst: &AnalystResult,
        prompt: &str,
    ) -> anyhow::Result<Option<StrategyResult>>;
}

/// Renders the report and slide deck.
#[async_trait]
pub trait PresenterService: Send + Sync {
    async fn present(
        &self,
        job_id: &str,
        analyst: &AnalystResult,
        strategy: &StrategyResult,
    ) -> anyhow::Result<PresenterResult>;
}

/// The four collaborators one orchestrator drives.
#[derive(Clone)]
pub struct PipelineStages {
    pub scout: Arc<dyn ScoutAgent>,
    pub analyst: Arc<dyn AnalystService>,
    pub strategy: Arc<dyn StrategyAgent>,
    pub presenter: Arc<dyn PresenterService>,
}

impl PipelineStages {
    pub fn new(
        scout: Arc<dyn ScoutAgent>,
        analyst: Arc<dyn AnalystService>,
        strategy: Arc<dyn StrategyAgent>,
        presenter: Arc<dyn PresenterService>,
    ) -> Self {
        Self {
            scout,
            analyst,
            strategy,
            presenter,
        }
    }

    /// Use the built-in [`GraphAnalyst`](crate::analyst::GraphAnalyst) for the Analyst stage.
    pub fn with_graph_analyst(
        scout: Arc<dyn ScoutAgent>,
        strategy: Arc<dyn StrategyAgent>,
        presenter: Arc<dyn PresenterService>,
    ) -> Self {
        Self::new(
            scout,
            Arc::new(crate::analyst::GraphAnalyst),
            strategy,
            presenter,
        )
    }
}

/// Scout agent bound to one target.
pub struct ScoutCandidates<'a> {
    agent: &'a dyn ScoutAgent,
    target: &'a str,
}

impl<'a> ScoutCandidates<'a> {
    pub fn new(agent: &'a dyn ScoutAgent, target: &'a str) -> Self {
        Self { agent, target }
    }
}

#[async_trait]
impl<'a> CandidateGenerator<ScoutResult> for ScoutCandidates<'a> {
    async fn generate(&self, prompt: &str) -> anyhow::Result<Option<ScoutResult>> {
        self.agent.scout(self.target, prompt).await
    }
}

/// Strategy agent bound to one analysis.
pub struct StrategyCandidates<'a> {
    agent: &'a dyn StrategyAgent,
    analyst: &'a AnalystResult,
}

impl<'a> StrategyCandidates<'a> {
    pub fn new(agent: &'a dyn StrategyAgent, analyst: &'a AnalystResult) -> Self {
        Self { agent, analyst }
    }
}

#[async_trait]
impl<'a> CandidateGenerator<StrategyResult> for StrategyCandidates<'a> {
    async fn generate(&self, prompt: &str) -> anyhow::Result<Option<StrategyResult>> {
        self.agent.strategize(self.analyst, prompt).await
    }
}
