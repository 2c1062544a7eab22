// ABOUTME: Pipeline stage state machine and analysis depth presets
// ABOUTME: Stage names serialise in UPPERCASE; depths in lowercase

use serde::{Deserialize, Serialize};

/// PENDING → SCOUT → ANALYST → STRATEGY → PRESENTER → DONE, with ERROR reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PipelineStage {
    #[default]
    Pending,
    Scout,
    Analyst,
    Strategy,
    Presenter,
    Done,
    Error,
}

impl PipelineStage {
    /// Ordered stages a successful run passes through.
    pub const RUN_ORDER: [PipelineStage; 5] = [
        Self::Scout,
        Self::Analyst,
        Self::Strategy,
        Self::Presenter,
        Self::Done,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "SCOUT" => Some(Self::Scout),
            "ANALYST" => Some(Self::Analyst),
            "STRATEGY" => Some(Self::Strategy),
            "PRESENTER" => Some(Self::Presenter),
            "DONE" => Some(Self::Done),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    /// Fixed progress percentage reported when the stage starts. `None` for ERROR.
    pub fn checkpoint(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Scout => Some(10),
            Self::Analyst => Some(35),
            Self::Strategy => Some(55),
            Self::Presenter => Some(80),
            Self::Done => Some(100),
            Self::Error => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Human-readable name used in error messages ("Scout", "Strategy", ...).
    pub fn title(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Scout => "Scout",
            Self::Analyst => "Analyst",
            Self::Strategy => "Strategy",
            Self::Presenter => "Presenter",
            Self::Done => "Done",
            Self::Error => "Error",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Job queued, waiting to start",
            Self::Scout => "Scout Agent collecting web/news data",
            Self::Analyst => "Analyst Service structuring data and building knowledge graph",
            Self::Strategy => "Strategy Agent generating SWOT and GTM recommendations",
            Self::Presenter => "Presenter Service producing report and pitch deck",
            Self::Done => "Analysis complete, results ready",
            Self::Error => "Pipeline failed",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Scout => write!(f, "SCOUT"),
            Self::Analyst => write!(f, "ANALYST"),
            Self::Strategy => write!(f, "STRATEGY"),
            Self::Presenter => write!(f, "PRESENTER"),
            Self::Done => write!(f, "DONE"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    /// Single-shot stages, no search
    Quick,
    #[default]
    Standard,
    Deep,
}

impl AnalysisDepth {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Some(Self::Quick),
            "standard" => Some(Self::Standard),
            "deep" => Some(Self::Deep),
            _ => None,
        }
    }

    /// Parse, treating anything unrecognised as `Standard`.
    pub fn parse_or_standard(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }
}

impl std::fmt::Display for AnalysisDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quick => write!(f, "quick"),
            Self::Standard => write!(f, "standard"),
            Self::Deep => write!(f, "deep"),
        }
    }
}
