// ABOUTME: Result contracts exchanged between the Scout, Analyst, Strategy and Presenter stages
// ABOUTME: Lenient serde models: every collection and optional field defaults when absent

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    #[default]
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Edge weight used when the level annotates a graph relation.
    pub fn weight(&self) -> f64 {
        match self {
            Self::High => 1.0,
            Self::Medium => 0.6,
            Self::Low => 0.3,
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

// ============================================================================
// Scout
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutCompetitor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub market_position: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub confidence: ConfidenceLevel,
    #[serde(default)]
    pub is_assumption: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutTrend {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub impact: ConfidenceLevel,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub is_assumption: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutCustomerSegment {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub estimated_size: Option<String>,
    #[serde(default)]
    pub is_assumption: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutLink {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub relevance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoutDataQuality {
    /// 0..=10
    #[serde(default)]
    pub coverage_score: u8,
    #[serde(default)]
    pub freshness: Option<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoutResult {
    pub target: String,
    #[serde(default)]
    pub competitors: Vec<ScoutCompetitor>,
    #[serde(default)]
    pub trends: Vec<ScoutTrend>,
    #[serde(default)]
    pub customer_segments: Vec<ScoutCustomerSegment>,
    #[serde(default)]
    pub links: Vec<ScoutLink>,
    #[serde(default)]
    pub data_quality: Option<ScoutDataQuality>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub scouted_at: Option<DateTime<Utc>>,
}

impl ScoutResult {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Analyst
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphNodeType {
    Company,
    Competitor,
    Market,
    Trend,
    CustomerSegment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique slug, e.g. `company-openai`
    pub id: String,
    pub label: String,
    pub node_type: GraphNodeType,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source_id: String,
    pub target_id: String,
    pub relation: String,
    /// 0.0..=1.0
    #[serde(default = "default_edge_weight")]
    pub weight: f64,
}

fn default_edge_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub description: String,
}

impl GraphSpec {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystCompetitorSummary {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub market_position: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub confidence: ConfidenceLevel,
    #[serde(default)]
    pub is_assumption: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystTrendSummary {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub impact: ConfidenceLevel,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub is_assumption: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystSegmentSummary {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub estimated_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalystResult {
    pub target: String,
    #[serde(default)]
    pub competitors: Vec<AnalystCompetitorSummary>,
    #[serde(default)]
    pub trends: Vec<AnalystTrendSummary>,
    #[serde(default)]
    pub segments: Vec<AnalystSegmentSummary>,
    #[serde(default)]
    pub graph_spec: GraphSpec,
    #[serde(default)]
    pub analysis_summary: String,
    #[serde(default)]
    pub high_confidence_competitors: Vec<String>,
    #[serde(default)]
    pub key_pain_points: Vec<String>,
    #[serde(default)]
    pub analyzed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_scouted_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Strategy
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Swot {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub threats: Vec<String>,
}

impl Swot {
    pub fn total_items(&self) -> usize {
        self.strengths.len() + self.weaknesses.len() + self.opportunities.len() + self.threats.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositioningOption {
    pub name: String,
    pub statement: String,
    pub target_audience: String,
    pub key_differentiator: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// Ideal customer profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icp {
    pub description: String,
    #[serde(default)]
    pub company_size: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub geography: Option<String>,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub buying_triggers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GtmPhase {
    pub name: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub success_metrics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GtmPlan {
    #[serde(default)]
    pub icp: Option<Icp>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub messaging_pillars: Vec<String>,
    #[serde(default)]
    pub value_proposition: Option<String>,
    #[serde(default)]
    pub launch_phases: Vec<GtmPhase>,
    #[serde(default)]
    pub competitive_moat: Option<String>,
}

impl GtmPlan {
    /// Actions of the first launch phase.
    pub fn immediate_actions(&self) -> &[String] {
        self.launch_phases
            .first()
            .map(|phase| phase.actions.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StrategyResult {
    pub target: String,
    #[serde(default)]
    pub swot: Option<Swot>,
    #[serde(default)]
    pub positioning_options: Vec<PositioningOption>,
    #[serde(default)]
    pub gtm_plan: Option<GtmPlan>,
    #[serde(default)]
    pub strategic_summary: String,
    #[serde(default)]
    pub recommended_positioning_index: usize,
    #[serde(default)]
    pub strategized_at: Option<DateTime<Utc>>,
}

impl StrategyResult {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn recommended_positioning(&self) -> Option<&PositioningOption> {
        self.positioning_options
            .get(self.recommended_positioning_index)
    }
}

// ============================================================================
// Presenter
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSlide {
    pub slide_number: u32,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub speaker_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PresenterResult {
    pub job_id: String,
    pub target: String,
    #[serde(default)]
    pub report_markdown: String,
    #[serde(default)]
    pub deck_outline: Vec<DeckSlide>,
    #[serde(default)]
    pub report_path: String,
    #[serde(default)]
    pub report_url: String,
    #[serde(default)]
    pub presented_at: Option<DateTime<Utc>>,
}
