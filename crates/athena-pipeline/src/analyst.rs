// ABOUTME: Deterministic Analyst stage turning Scout output into a knowledge graph and summary
// ABOUTME: No external calls; the summary becomes the Strategy stage's initial prompt

use crate::stages::AnalystService;
use async_trait::async_trait;
use athena_core::{
    AnalystCompetitorSummary, AnalystResult, AnalystSegmentSummary, AnalystTrendSummary,
    ConfidenceLevel, GraphEdge, GraphNode, GraphNodeType, GraphSpec, ScoutCompetitor,
    ScoutCustomerSegment, ScoutResult, ScoutTrend,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::info;

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

const SEGMENT_EDGE_WEIGHT: f64 = 0.8;
const SUMMARY_PAIN_POINTS: usize = 6;

fn slugify(text: &str) -> String {
    NON_SLUG
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

fn node_type_key(node_type: GraphNodeType) -> &'static str {
    match node_type {
        GraphNodeType::Company => "company",
        GraphNodeType::Competitor => "competitor",
        GraphNodeType::Market => "market",
        GraphNodeType::Trend => "trend",
        GraphNodeType::CustomerSegment => "customer_segment",
    }
}

fn node_id(node_type: GraphNodeType, label: &str) -> String {
    format!("{}-{}", node_type_key(node_type), slugify(label))
}

fn properties(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn edge(source_id: &str, target_id: &str, relation: &str, weight: f64) -> GraphEdge {
    GraphEdge {
        source_id: source_id.to_string(),
        target_id: target_id.to_string(),
        relation: relation.to_string(),
        weight,
    }
}

pub fn build_graph_spec(
    target: &str,
    competitors: &[ScoutCompetitor],
    trends: &[ScoutTrend],
    segments: &[ScoutCustomerSegment],
) -> GraphSpec {
    let mut nodes = Vec::with_capacity(2 + competitors.len() + trends.len() + segments.len());
    let mut edges = Vec::new();

    let target_id = node_id(GraphNodeType::Company, target);
    nodes.push(GraphNode {
        id: target_id.clone(),
        label: target.to_string(),
        node_type: GraphNodeType::Company,
        properties: properties(json!({ "role": "analysis_target" })),
    });

    let market_label = format!("{} Market", target);
    let market_id = node_id(GraphNodeType::Market, &market_label);
    nodes.push(GraphNode {
        id: market_id.clone(),
        label: market_label,
        node_type: GraphNodeType::Market,
        properties: properties(json!({ "inferred": true })),
    });
    edges.push(edge(&target_id, &market_id, "OPERATES_IN", 1.0));

    for comp in competitors {
        let comp_id = node_id(GraphNodeType::Competitor, &comp.name);
        let weight = comp.confidence.weight();
        nodes.push(GraphNode {
            id: comp_id.clone(),
            label: comp.name.clone(),
            node_type: GraphNodeType::Competitor,
            properties: properties(json!({
                "description": comp.description,
                "market_position": comp.market_position,
                "confidence": comp.confidence,
                "is_assumption": comp.is_assumption,
                "source_url": comp.source_url,
            })),
        });
        edges.push(edge(&comp_id, &market_id, "OPERATES_IN", weight));
        edges.push(edge(&target_id, &comp_id, "COMPETES_WITH", weight));
    }

    for trend in trends {
        let trend_id = node_id(GraphNodeType::Trend, &trend.title);
        nodes.push(GraphNode {
            id: trend_id.clone(),
            label: trend.title.clone(),
            node_type: GraphNodeType::Trend,
            properties: properties(json!({
                "description": trend.description,
                "impact": trend.impact,
                "timeframe": trend.timeframe,
                "is_assumption": trend.is_assumption,
            })),
        });
        edges.push(edge(&trend_id, &market_id, "SHAPES", trend.impact.weight()));
    }

    for seg in segments {
        let seg_id = node_id(GraphNodeType::CustomerSegment, &seg.name);
        nodes.push(GraphNode {
            id: seg_id.clone(),
            label: seg.name.clone(),
            node_type: GraphNodeType::CustomerSegment,
            properties: properties(json!({
                "description": seg.description,
                "pain_points": seg.pain_points,
                "estimated_size": seg.estimated_size,
                "is_assumption": seg.is_assumption,
            })),
        });
        edges.push(edge(&seg_id, &target_id, "TARGETED_BY", SEGMENT_EDGE_WEIGHT));
    }

    let description = format!(
        "Knowledge graph for '{}': {} nodes, {} edges.",
        target,
        nodes.len(),
        edges.len()
    );

    GraphSpec {
        nodes,
        edges,
        description,
    }
}

/// Pain points across all segments, first occurrence wins.
fn unique_pain_points(segments: &[ScoutCustomerSegment]) -> Vec<String> {
    let mut seen = Vec::new();
    for point in segments.iter().flat_map(|s| s.pain_points.iter()) {
        if !seen.contains(point) {
            seen.push(point.clone());
        }
    }
    seen
}

fn names<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

pub fn build_analysis_summary(
    target: &str,
    competitors: &[ScoutCompetitor],
    trends: &[ScoutTrend],
    segments: &[ScoutCustomerSegment],
) -> String {
    let confirmed = |level: ConfidenceLevel| {
        competitors
            .iter()
            .filter(move |c| c.confidence == level && !c.is_assumption)
            .map(|c| c.name.as_str())
    };

    let mut lines = vec![
        format!("COMPETITIVE LANDSCAPE ANALYSIS | TARGET: {}", target),
        String::new(),
    ];

    let high = names(confirmed(ConfidenceLevel::High));
    if !high.is_empty() {
        lines.push(format!(
            "Confirmed primary competitors (high confidence): {}.",
            high
        ));
    }
    let medium = names(confirmed(ConfidenceLevel::Medium));
    if !medium.is_empty() {
        lines.push(format!(
            "Secondary competitors (medium confidence): {}.",
            medium
        ));
    }
    let inferred = names(
        competitors
            .iter()
            .filter(|c| c.is_assumption)
            .map(|c| c.name.as_str()),
    );
    if !inferred.is_empty() {
        lines.push(format!("Inferred competitors (assumptions): {}.", inferred));
    }
    if competitors.is_empty() {
        lines.push("No competitors identified.".to_string());
    }
    lines.push(String::new());

    let high_trends = names(
        trends
            .iter()
            .filter(|t| t.impact == ConfidenceLevel::High)
            .map(|t| t.title.as_str()),
    );
    if !high_trends.is_empty() {
        lines.push(format!("High-impact trends: {}.", high_trends));
    }
    if trends.is_empty() {
        lines.push("No trends identified.".to_string());
    } else {
        lines.push(format!(
            "All trends ({}): {}.",
            trends.len(),
            names(trends.iter().map(|t| t.title.as_str()))
        ));
    }
    lines.push(String::new());

    if segments.is_empty() {
        lines.push("No customer segments identified.".to_string());
    } else {
        lines.push(format!(
            "Customer segments ({}): {}.",
            segments.len(),
            names(segments.iter().map(|s| s.name.as_str()))
        ));
    }

    let pain_points = unique_pain_points(segments);
    if !pain_points.is_empty() {
        let shown: Vec<&str> = pain_points
            .iter()
            .take(SUMMARY_PAIN_POINTS)
            .map(String::as_str)
            .collect();
        lines.push(format!("Key pain points: {}.", shown.join("; ")));
    }

    lines.join("\n")
}

/// Pure transformation of a Scout result.
pub fn analyze_scout(scout: &ScoutResult) -> AnalystResult {
    let competitors = scout
        .competitors
        .iter()
        .map(|c| AnalystCompetitorSummary {
            name: c.name.clone(),
            description: c.description.clone(),
            market_position: c.market_position.clone(),
            strengths: c.strengths.clone(),
            weaknesses: c.weaknesses.clone(),
            confidence: c.confidence,
            is_assumption: c.is_assumption,
        })
        .collect();

    let trends = scout
        .trends
        .iter()
        .map(|t| AnalystTrendSummary {
            title: t.title.clone(),
            description: t.description.clone(),
            impact: t.impact,
            timeframe: t.timeframe.clone(),
            is_assumption: t.is_assumption,
        })
        .collect();

    let segments = scout
        .customer_segments
        .iter()
        .map(|s| AnalystSegmentSummary {
            name: s.name.clone(),
            description: s.description.clone(),
            pain_points: s.pain_points.clone(),
            estimated_size: s.estimated_size.clone(),
        })
        .collect();

    let high_confidence_competitors = scout
        .competitors
        .iter()
        .filter(|c| c.confidence == ConfidenceLevel::High && !c.is_assumption)
        .map(|c| c.name.clone())
        .collect();

    let graph_spec = build_graph_spec(
        &scout.target,
        &scout.competitors,
        &scout.trends,
        &scout.customer_segments,
    );
    let analysis_summary = build_analysis_summary(
        &scout.target,
        &scout.competitors,
        &scout.trends,
        &scout.customer_segments,
    );

    AnalystResult {
        target: scout.target.clone(),
        competitors,
        trends,
        segments,
        graph_spec,
        analysis_summary,
        high_confidence_competitors,
        key_pain_points: unique_pain_points(&scout.customer_segments),
        analyzed_at: Some(Utc::now()),
        source_scouted_at: scout.scouted_at,
    }
}

/// Built-in [`AnalystService`] backed by [`analyze_scout`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphAnalyst;

#[async_trait]
impl AnalystService for GraphAnalyst {
    async fn analyze(&self, scout: &ScoutResult) -> anyhow::Result<Option<AnalystResult>> {
        let result = analyze_scout(scout);
        info!(
            target: "pipeline::analyst",
            target_name = %result.target,
            nodes = result.graph_spec.nodes.len(),
            edges = result.graph_spec.edges.len(),
            "Analysis complete"
        );
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn competitor(name: &str, confidence: ConfidenceLevel, is_assumption: bool) -> ScoutCompetitor {
        ScoutCompetitor {
            name: name.to_string(),
            description: format!("{} does things", name),
            market_position: Some("leader".to_string()),
            strengths: vec!["brand".to_string()],
            weaknesses: vec![],
            source_url: None,
            confidence,
            is_assumption,
        }
    }

    fn segment(name: &str, pain_points: &[&str]) -> ScoutCustomerSegment {
        ScoutCustomerSegment {
            name: name.to_string(),
            description: String::new(),
            pain_points: pain_points.iter().map(|p| p.to_string()).collect(),
            estimated_size: None,
            is_assumption: false,
        }
    }

    fn sample_scout() -> ScoutResult {
        let mut scout = ScoutResult::new("Open AI");
        scout.competitors = vec![
            competitor("Anthropic", ConfidenceLevel::High, false),
            competitor("Google DeepMind", ConfidenceLevel::Medium, false),
            competitor("Stealth Co", ConfidenceLevel::High, true),
        ];
        scout.trends = vec![ScoutTrend {
            title: "Agentic AI".to_string(),
            description: "Agents everywhere".to_string(),
            impact: ConfidenceLevel::High,
            timeframe: Some("2025".to_string()),
            source_url: None,
            is_assumption: false,
        }];
        scout.customer_segments = vec![
            segment("Enterprises", &["cost", "compliance"]),
            segment("Developers", &["latency", "cost"]),
        ];
        scout
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Open AI, Inc."), "open-ai-inc");
        assert_eq!(slugify("  --Hello--  "), "hello");
    }

    #[test]
    fn test_graph_spec_structure() {
        let scout = sample_scout();
        let graph = build_graph_spec(
            &scout.target,
            &scout.competitors,
            &scout.trends,
            &scout.customer_segments,
        );

        // company + market + 3 competitors + 1 trend + 2 segments
        assert_eq!(graph.nodes.len(), 8);
        // operates_in + 2 per competitor + 1 trend + 2 segments
        assert_eq!(graph.edges.len(), 10);
        assert_eq!(graph.description, "Knowledge graph for 'Open AI': 8 nodes, 10 edges.");

        assert!(graph.node("company-open-ai").is_some());
        let market = graph.node("market-open-ai-market").unwrap();
        assert_eq!(market.properties["inferred"], json!(true));

        let deepmind_edge = graph
            .edges
            .iter()
            .find(|e| e.target_id == "competitor-google-deepmind")
            .unwrap();
        assert_eq!(deepmind_edge.relation, "COMPETES_WITH");
        assert_eq!(deepmind_edge.weight, 0.6);

        let segment_edge = graph
            .edges
            .iter()
            .find(|e| e.source_id == "customer_segment-developers")
            .unwrap();
        assert_eq!(segment_edge.relation, "TARGETED_BY");
        assert_eq!(segment_edge.weight, 0.8);
    }

    #[test]
    fn test_analyze_scout_fields() {
        let result = analyze_scout(&sample_scout());

        assert_eq!(result.high_confidence_competitors, vec!["Anthropic".to_string()]);
        assert_eq!(
            result.key_pain_points,
            vec!["cost".to_string(), "compliance".to_string(), "latency".to_string()]
        );
        assert_eq!(result.competitors.len(), 3);
        assert!(result.analyzed_at.is_some());
    }

    #[test]
    fn test_summary_sections() {
        let result = analyze_scout(&sample_scout());
        let summary = &result.analysis_summary;

        assert!(summary.starts_with("COMPETITIVE LANDSCAPE ANALYSIS | TARGET: Open AI"));
        assert!(summary.contains("Confirmed primary competitors (high confidence): Anthropic."));
        assert!(summary.contains("Secondary competitors (medium confidence): Google DeepMind."));
        assert!(summary.contains("Inferred competitors (assumptions): Stealth Co."));
        assert!(summary.contains("High-impact trends: Agentic AI."));
        assert!(summary.contains("Customer segments (2): Enterprises, Developers."));
        assert!(summary.contains("Key pain points: cost; compliance; latency."));
    }

    #[test]
    fn test_summary_for_empty_scout() {
        let summary = analyze_scout(&ScoutResult::new("Acme")).analysis_summary;
        assert!(summary.contains("No competitors identified."));
        assert!(summary.contains("No trends identified."));
        assert!(summary.contains("No customer segments identified."));
        assert!(!summary.contains("Key pain points"));
    }

    #[tokio::test]
    async fn test_graph_analyst_service() {
        let result = GraphAnalyst.analyze(&sample_scout()).await.unwrap().unwrap();
        assert_eq!(result.target, "Open AI");
        assert_eq!(result.graph_spec.nodes.len(), 8);
    }
}
