use async_trait::async_trait;
use athena_core::{
    AnalysisDepth, AnalystResult, ConfidenceLevel, GtmPlan, LatsSettings, PipelineStage,
    PositioningOption, PresenterResult, RiskLevel, ScoutCompetitor, ScoutResult, ScoutTrend,
    StrategyResult, Swot,
};
use athena_lats::QUALITY_FEEDBACK_HEADER;
use athena_pipeline::{
    create_orchestrator, AnalystService, GraphAnalyst, OrchestratorConfig, PipelineError,
    PipelineOrchestrator, PipelineStages, PresenterService, ScoutAgent, StageTrace,
    StatusCallback, StrategyAgent,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

// ============================================================================
// Mock stages
// ============================================================================

fn rich_scout(target: &str) -> ScoutResult {
    let mut scout = ScoutResult::new(target);
    scout.competitors = (0..5)
        .map(|i| ScoutCompetitor {
            name: format!("Competitor {}", i),
            description: "Rival".to_string(),
            market_position: None,
            strengths: vec![],
            weaknesses: vec![],
            source_url: None,
            confidence: ConfidenceLevel::High,
            is_assumption: false,
        })
        .collect();
    scout.trends = (0..5)
        .map(|i| ScoutTrend {
            title: format!("Trend {}", i),
            description: "Growing".to_string(),
            impact: ConfidenceLevel::Medium,
            timeframe: None,
            source_url: None,
            is_assumption: false,
        })
        .collect();
    scout
}

fn rich_strategy(target: &str) -> StrategyResult {
    let mut strategy = StrategyResult::new(target);
    strategy.swot = Some(Swot {
        strengths: vec!["s".to_string(); 4],
        weaknesses: vec!["w".to_string(); 4],
        opportunities: vec!["o".to_string(); 4],
        threats: vec!["t".to_string(); 4],
    });
    strategy.gtm_plan = Some(GtmPlan::default());
    strategy.positioning_options = vec![PositioningOption {
        name: "Challenger".to_string(),
        statement: "Faster and cheaper".to_string(),
        target_audience: "Mid-market".to_string(),
        key_differentiator: "Price".to_string(),
        risk_level: RiskLevel::Medium,
        rationale: None,
    }];
    strategy
}

#[derive(Clone, Copy)]
enum Quality {
    Rich,
    Sparse,
    Missing,
}

struct MockScout {
    quality: Quality,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockScout {
    fn new(quality: Quality) -> Arc<Self> {
        Arc::new(Self {
            quality,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ScoutAgent for MockScout {
    async fn scout(&self, target: &str, prompt: &str) -> anyhow::Result<Option<ScoutResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());
        Ok(match self.quality {
            Quality::Rich => Some(rich_scout(target)),
            Quality::Sparse => Some(ScoutResult::new(target)),
            Quality::Missing => None,
        })
    }
}

struct CountingAnalyst {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl AnalystService for CountingAnalyst {
    async fn analyze(&self, scout: &ScoutResult) -> anyhow::Result<Option<AnalystResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("graph store unavailable");
        }
        GraphAnalyst.analyze(scout).await
    }
}

struct MockStrategy {
    quality: Quality,
    calls: AtomicUsize,
}

impl MockStrategy {
    fn new(quality: Quality) -> Arc<Self> {
        Arc::new(Self {
            quality,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl StrategyAgent for MockStrategy {
    async fn strategize(
        &self,
        analyst: &AnalystResult,
        _prompt: &str,
    ) -> anyhow::Result<Option<StrategyResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match self.quality {
            Quality::Rich => Some(rich_strategy(&analyst.target)),
            Quality::Sparse => Some(StrategyResult::new(analyst.target.clone())),
            Quality::Missing => None,
        })
    }
}

#[derive(Default)]
struct MockPresenter {
    calls: AtomicUsize,
}

#[async_trait]
impl PresenterService for MockPresenter {
    async fn present(
        &self,
        job_id: &str,
        analyst: &AnalystResult,
        strategy: &StrategyResult,
    ) -> anyhow::Result<PresenterResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PresenterResult {
            job_id: job_id.to_string(),
            target: strategy.target.clone(),
            report_markdown: format!("# {}\n\n{}", analyst.target, analyst.analysis_summary),
            ..Default::default()
        })
    }
}

struct Harness {
    scout: Arc<MockScout>,
    analyst: Arc<CountingAnalyst>,
    strategy: Arc<MockStrategy>,
    presenter: Arc<MockPresenter>,
}

impl Harness {
    fn new(scout: Quality, strategy: Quality) -> Self {
        Self {
            scout: MockScout::new(scout),
            analyst: Arc::new(CountingAnalyst {
                calls: AtomicUsize::new(0),
                fail: false,
            }),
            strategy: MockStrategy::new(strategy),
            presenter: Arc::new(MockPresenter::default()),
        }
    }

    fn stages(&self) -> PipelineStages {
        PipelineStages::new(
            self.scout.clone(),
            self.analyst.clone(),
            self.strategy.clone(),
            self.presenter.clone(),
        )
    }

    fn orchestrator(&self, use_lats: bool) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            OrchestratorConfig {
                use_lats,
                ..Default::default()
            },
            self.stages(),
        )
        .unwrap()
    }
}

type Events = Arc<Mutex<Vec<(PipelineStage, u8, String)>>>;

fn recording_callback() -> (StatusCallback, Events) {
    let events: Events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    let callback: StatusCallback =
        Arc::new(move |stage: PipelineStage, progress: u8, message: String| {
            let events = events_clone.clone();
            Box::pin(async move {
                events.lock().await.push((stage, progress, message));
                Ok::<(), anyhow::Error>(())
            })
        });
    (callback, events)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_linear_run_reports_stages_in_order() {
    let harness = Harness::new(Quality::Rich, Quality::Rich);
    let (callback, events) = recording_callback();

    let output = harness
        .orchestrator(false)
        .run("pipe-001", "Acme", AnalysisDepth::Standard, Some(&callback))
        .await
        .unwrap();

    assert_eq!(output.scout.target, "Acme");
    assert_eq!(output.analyst.target, "Acme");
    assert_eq!(output.strategy.target, "Acme");
    assert_eq!(output.presenter.job_id, "pipe-001");
    assert_eq!(output.lats_traces["scout"], StageTrace::bypassed());
    assert_eq!(output.lats_traces["strategy"], StageTrace::bypassed());

    let events = events.lock().await;
    let stages: Vec<PipelineStage> = events.iter().map(|(stage, _, _)| *stage).collect();
    assert_eq!(
        stages,
        vec![
            PipelineStage::Scout,
            PipelineStage::Analyst,
            PipelineStage::Strategy,
            PipelineStage::Presenter,
            PipelineStage::Done,
        ]
    );
    let progress: Vec<u8> = events.iter().map(|(_, progress, _)| *progress).collect();
    assert_eq!(progress, vec![10, 35, 55, 80, 100]);
    assert_eq!(events[0].2, "Gathering intelligence on Acme...");
    assert_eq!(events[4].2, "Analysis complete!");

    assert_eq!(harness.scout.calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.strategy.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_output_serializes_with_all_stage_keys() {
    let harness = Harness::new(Quality::Rich, Quality::Rich);
    let output = harness
        .orchestrator(false)
        .run("pipe-002", "Acme", AnalysisDepth::Standard, None)
        .await
        .unwrap();

    let value = serde_json::to_value(&output).unwrap();
    for key in ["scout", "analyst", "strategy", "presenter", "lats_traces"] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(value["lats_traces"]["scout"]["lats_used"], false);
    assert_eq!(value["lats_traces"]["scout"]["score"], 1.0);
}

#[tokio::test]
async fn test_missing_scout_result_fails_before_analyst() {
    let harness = Harness::new(Quality::Missing, Quality::Rich);
    let (callback, events) = recording_callback();

    let err = harness
        .orchestrator(false)
        .run("pipe-003", "Acme", AnalysisDepth::Standard, Some(&callback))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Scout stage failed"));
    assert!(matches!(
        err,
        PipelineError::StageFailed {
            stage: PipelineStage::Scout,
            ..
        }
    ));
    assert_eq!(harness.analyst.calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.presenter.calls.load(Ordering::SeqCst), 0);

    let events = events.lock().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].0, PipelineStage::Error);
    assert_eq!(events[1].1, 10);
    assert!(events[1].2.contains("Scout stage failed for job pipe-003"));
}

#[tokio::test]
async fn test_search_exhaustion_on_strategy_stops_before_presenter() {
    let harness = Harness::new(Quality::Rich, Quality::Missing);

    let err = harness
        .orchestrator(true)
        .run("pipe-004", "Acme", AnalysisDepth::Standard, None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Strategy stage failed for job pipe-004");
    assert_eq!(err.stage(), Some(PipelineStage::Strategy));
    assert_eq!(harness.presenter.calls.load(Ordering::SeqCst), 0);
    // Only the first expansion runs when every candidate is missing
    assert_eq!(harness.strategy.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_analyst_error_is_wrapped_with_stage() {
    let harness = Harness {
        analyst: Arc::new(CountingAnalyst {
            calls: AtomicUsize::new(0),
            fail: true,
        }),
        ..Harness::new(Quality::Rich, Quality::Rich)
    };

    let err = harness
        .orchestrator(false)
        .run("pipe-005", "Acme", AnalysisDepth::Standard, None)
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("Analyst stage failed for job pipe-005"));
    assert!(err.to_string().contains("graph store unavailable"));
    assert_eq!(harness.strategy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_mode_records_traces() {
    let harness = Harness::new(Quality::Rich, Quality::Rich);

    let output = harness
        .orchestrator(true)
        .run("pipe-006", "Acme", AnalysisDepth::Standard, None)
        .await
        .unwrap();

    for stage in ["scout", "strategy"] {
        match &output.lats_traces[stage] {
            StageTrace::Search(trace) => {
                assert_eq!(trace.job_id, "pipe-006");
                assert!(!trace.reflection_triggered);
                assert!(trace.best_score >= 0.65);
            }
            other => panic!("expected search trace for {}, got {:?}", stage, other),
        }
    }
    // Rich candidates exit on the first scored candidate of a concurrent round
    assert_eq!(harness.scout.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_quick_depth_bypasses_search() {
    let harness = Harness::new(Quality::Sparse, Quality::Sparse);

    let output = harness
        .orchestrator(true)
        .run("pipe-007", "Acme", AnalysisDepth::Quick, None)
        .await
        .unwrap();

    assert!(!output.lats_traces["scout"].lats_used());
    assert!(!output.lats_traces["strategy"].lats_used());
    assert_eq!(harness.scout.calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.strategy.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sparse_scout_receives_reflection_feedback() {
    let harness = Harness::new(Quality::Sparse, Quality::Rich);

    let output = harness
        .orchestrator(true)
        .run("pipe-008", "Acme", AnalysisDepth::Standard, None)
        .await
        .unwrap();

    let prompts = harness.scout.prompts.lock().await;
    // 2 initial candidates then 2 refinements
    assert_eq!(prompts.len(), 4);
    assert_eq!(prompts[0], "Acme");
    assert!(prompts[2].starts_with("Acme\n\n---\n"));
    assert!(prompts[2].contains(QUALITY_FEEDBACK_HEADER));
    assert!(prompts[2].contains("significantly incomplete"));

    match &output.lats_traces["scout"] {
        StageTrace::Search(trace) => {
            assert!(trace.reflection_triggered);
            assert_eq!(trace.total_candidates, 4);
        }
        other => panic!("expected search trace, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failing_callback_does_not_abort_pipeline() {
    let harness = Harness::new(Quality::Rich, Quality::Rich);
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();
    let callback: StatusCallback = Arc::new(move |_: PipelineStage, _: u8, _: String| {
        attempts_clone.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err::<(), _>(anyhow::anyhow!("websocket closed")) })
    });

    let output = harness
        .orchestrator(false)
        .run("pipe-009", "Acme", AnalysisDepth::Standard, Some(&callback))
        .await;

    assert!(output.is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_depth_adjustment_does_not_leak_between_runs() {
    let harness = Harness::new(Quality::Sparse, Quality::Rich);
    let orchestrator =
        create_orchestrator("standard", &LatsSettings::default(), harness.stages()).unwrap();

    let deep = orchestrator
        .run("pipe-010", "Acme", AnalysisDepth::Deep, None)
        .await
        .unwrap();
    let standard = orchestrator
        .run("pipe-011", "Acme", AnalysisDepth::Standard, None)
        .await
        .unwrap();

    let first_round = |trace: &StageTrace| match trace {
        StageTrace::Search(trace) => trace.nodes_at_depth(1).count(),
        StageTrace::Bypassed { .. } => 0,
    };
    assert_eq!(first_round(&deep.lats_traces["scout"]), 3);
    assert_eq!(first_round(&standard.lats_traces["scout"]), 2);
    assert_eq!(orchestrator.config().n_candidates, 2);
}

#[tokio::test]
async fn test_concurrent_jobs_are_independent() {
    let harness = Harness::new(Quality::Rich, Quality::Rich);
    let orchestrator = harness.orchestrator(true);

    let (a, b) = tokio::join!(
        orchestrator.run("job-a", "Acme", AnalysisDepth::Standard, None),
        orchestrator.run("job-b", "Globex", AnalysisDepth::Deep, None),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.presenter.target, "Acme");
    assert_eq!(b.presenter.target, "Globex");
    match (&a.lats_traces["scout"], &b.lats_traces["scout"]) {
        (StageTrace::Search(ta), StageTrace::Search(tb)) => {
            assert_eq!(ta.job_id, "job-a");
            assert_eq!(tb.job_id, "job-b");
        }
        other => panic!("expected search traces, got {:?}", other),
    }
}

#[tokio::test]
async fn test_factory_presets() {
    let harness = Harness::new(Quality::Rich, Quality::Rich);
    let settings = LatsSettings::default();

    let deep = create_orchestrator("deep", &settings, harness.stages()).unwrap();
    assert_eq!(deep.config().n_candidates, 3);
    assert_eq!(deep.config().max_depth, 3);
    assert_eq!(deep.config().quality_threshold, 0.75);

    let quick = create_orchestrator("quick", &settings, harness.stages()).unwrap();
    assert_eq!(quick.config().n_candidates, 1);
    assert_eq!(quick.config().quality_threshold, 0.50);

    let unknown = create_orchestrator("exhaustive", &settings, harness.stages()).unwrap();
    assert_eq!(unknown.config(), &OrchestratorConfig::default());

    let disabled = LatsSettings {
        enabled: false,
        ..Default::default()
    };
    let linear = create_orchestrator("deep", &disabled, harness.stages()).unwrap();
    assert!(!linear.config().use_lats);
}

#[tokio::test]
async fn test_built_in_graph_analyst_feeds_strategy() {
    let harness = Harness::new(Quality::Rich, Quality::Rich);
    let stages = PipelineStages::with_graph_analyst(
        harness.scout.clone(),
        harness.strategy.clone(),
        harness.presenter.clone(),
    );
    let orchestrator = PipelineOrchestrator::new(OrchestratorConfig::default(), stages).unwrap();

    let output = orchestrator
        .run("pipe-graph", "Acme", AnalysisDepth::Standard, None)
        .await
        .unwrap();

    assert_eq!(output.analyst.competitors.len(), 5);
    assert_eq!(output.analyst.high_confidence_competitors.len(), 5);
    assert!(!output.analyst.graph_spec.nodes.is_empty());
    assert!(output
        .analyst
        .analysis_summary
        .contains("COMPETITIVE LANDSCAPE ANALYSIS | TARGET: Acme"));
    assert_eq!(
        output
            .strategy
            .recommended_positioning()
            .map(|option| option.name.as_str()),
        Some("Challenger")
    );
    // The counting analyst is bypassed entirely
    assert_eq!(harness.analyst.calls.load(Ordering::SeqCst), 0);
}
