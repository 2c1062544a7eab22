// ABOUTME: Shared foundation for the Athena pipeline crates
// ABOUTME: Stage models, stage state machine, settings, logging and agent JSON extraction

pub mod config;
pub mod error;
pub mod json_extract;
pub mod logging;
pub mod models;
pub mod stage;

pub use config::{AthenaSettings, DepthPreset, LatsSettings, LogFormat, LoggingSettings};
pub use error::{AthenaError, Result};
pub use json_extract::{extract_json, parse_agent_json};
pub use logging::init_tracing;
pub use models::*;
pub use stage::{AnalysisDepth, PipelineStage};
