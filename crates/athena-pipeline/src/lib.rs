// ABOUTME: Four-stage intelligence pipeline with LATS-driven quality search
// ABOUTME: Scout (search) -> Analyst (deterministic) -> Strategy (search) -> Presenter

pub mod analyst;
pub mod factory;
pub mod heuristics;
pub mod orchestrator;
pub mod stages;

pub use analyst::{analyze_scout, GraphAnalyst};
pub use factory::create_orchestrator;
pub use heuristics::{
    scout_value, severity_reflection, strategy_value, ScoutHeuristic, SeverityReflection,
    StrategyHeuristic,
};
pub use orchestrator::{
    OrchestratorConfig, PipelineError, PipelineOrchestrator, PipelineOutput, StageTrace,
    StatusCallback,
};
pub use stages::{
    AnalystService, PipelineStages, PresenterService, ScoutAgent, ScoutCandidates, StrategyAgent,
    StrategyCandidates,
};
