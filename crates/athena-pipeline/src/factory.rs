use crate::orchestrator::{OrchestratorConfig, PipelineError, PipelineOrchestrator};
use crate::stages::PipelineStages;
use athena_core::{AnalysisDepth, LatsSettings};
use tracing::debug;

/// Build an orchestrator using the preset for `depth`.
///
/// Unknown depths fall back to the `standard` preset. Search is enabled
/// according to `settings.enabled`.
pub fn create_orchestrator(
    depth: &str,
    settings: &LatsSettings,
    stages: PipelineStages,
) -> Result<PipelineOrchestrator, PipelineError> {
    let depth = AnalysisDepth::parse_or_standard(depth);
    let config = OrchestratorConfig::from_preset(settings.preset(depth), settings.enabled);

    debug!(
        target: "pipeline::orchestrator",
        depth = %depth,
        n_candidates = config.n_candidates,
        max_depth = config.max_depth,
        quality_threshold = config.quality_threshold,
        use_lats = config.use_lats,
        "Creating orchestrator"
    );

    PipelineOrchestrator::new(config, stages)
}
