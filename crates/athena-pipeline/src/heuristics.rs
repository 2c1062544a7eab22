// ABOUTME: Completeness heuristics scoring Scout and Strategy output in [0, 1]
// ABOUTME: Severity-banded reflection text fed back into refinement prompts

use async_trait::async_trait;
use athena_core::{ScoutResult, StrategyResult};
use athena_lats::{ReflectFunction, ValueFunction};

/// Scout completeness: competitors (≤0.35), trends (≤0.30), segments (≤0.20),
/// data-quality coverage (≤0.15, 0.5 coverage assumed when unreported).
pub fn scout_value(result: &ScoutResult) -> f64 {
    let competitors = (result.competitors.len() as f64 * 0.07).min(0.35);
    let trends = (result.trends.len() as f64 * 0.06).min(0.30);
    let segments = (result.customer_segments.len() as f64 * 0.10).min(0.20);
    let completeness = result
        .data_quality
        .as_ref()
        .map(|dq| (f64::from(dq.coverage_score) / 10.0).clamp(0.0, 1.0))
        .unwrap_or(0.5);

    (competitors + trends + segments + 0.15 * completeness).min(1.0)
}

/// Strategy completeness: SWOT items (≤0.40), GTM plan (0.25), positioning
/// options (≤0.20), first-phase launch actions (≤0.15).
pub fn strategy_value(result: &StrategyResult) -> f64 {
    let swot = result
        .swot
        .as_ref()
        .map(|swot| (swot.total_items() as f64 * 0.025).min(0.40))
        .unwrap_or(0.0);
    let gtm = if result.gtm_plan.is_some() { 0.25 } else { 0.0 };
    let positioning = (result.positioning_options.len() as f64 * 0.067).min(0.20);
    let actions = result
        .gtm_plan
        .as_ref()
        .map(|plan| (plan.immediate_actions().len() as f64 * 0.05).min(0.15))
        .unwrap_or(0.0);

    (swot + gtm + positioning + actions).min(1.0)
}

pub fn severity_reflection(score: f64) -> String {
    let bullets: [&str; 4] = if score < 0.40 {
        [
            "- The output is significantly incomplete. Ensure all required sections are populated.",
            "- Provide at least 5 competitors with detailed profiles and confidence scores.",
            "- Include minimum 4 market trends with supporting evidence and URLs.",
            "- Add at least 3 customer segments with pain points and personas.",
        ]
    } else if score < 0.65 {
        [
            "- Add more specific data points with source attribution for each claim.",
            "- Strengthen the SWOT analysis with concrete, evidence-backed examples.",
            "- Expand the GTM strategy with clear timelines and success metrics.",
            "- Add quantitative estimates (market size, growth rate, percentages).",
        ]
    } else {
        [
            "- Add quantitative metrics (market sizes, growth rates, funding data).",
            "- Include more specific competitive differentiation analysis with examples.",
            "- Strengthen success metrics with measurable, time-bound KPIs.",
            "- Add contingency strategies for the top 2 identified risks.",
        ]
    };

    let mut lines = vec![format!(
        "The analysis scored {:.2}/1.00. Specific improvements needed:",
        score
    )];
    lines.extend(bullets.iter().map(|b| b.to_string()));
    lines.join("\n")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoutHeuristic;

#[async_trait]
impl ValueFunction<ScoutResult> for ScoutHeuristic {
    async fn score(&self, candidate: &ScoutResult) -> anyhow::Result<f64> {
        Ok(scout_value(candidate))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyHeuristic;

#[async_trait]
impl ValueFunction<StrategyResult> for StrategyHeuristic {
    async fn score(&self, candidate: &StrategyResult) -> anyhow::Result<f64> {
        Ok(strategy_value(candidate))
    }
}

/// Score-banded critique; ignores the candidate itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeverityReflection;

#[async_trait]
impl<T: Sync> ReflectFunction<T> for SeverityReflection {
    async fn reflect(&self, _candidate: &T, score: f64) -> anyhow::Result<String> {
        Ok(severity_reflection(score))
    }
}
