// ABOUTME: Append-only audit trail of every candidate scored during one LATS search
// ABOUTME: Serializes to a flat JSON document independent of the (discarded) search tree

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::time::Instant;

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn serialize_4dp<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 4))
}

fn serialize_2dp<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 2))
}

/// One scored candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceNode {
    pub depth: usize,
    /// 1-based index of the candidate within its expansion round
    pub candidate: usize,
    /// Score rounded to 4 decimal places
    pub score: f64,
    #[serde(flatten)]
    pub tags: Map<String, Value>,
}

impl TraceNode {
    pub fn tag(&self, key: &str) -> Option<&Value> {
        self.tags.get(key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchTrace {
    pub job_id: String,
    pub total_candidates: usize,
    #[serde(serialize_with = "serialize_4dp")]
    pub best_score: f64,
    pub reflection_triggered: bool,
    #[serde(serialize_with = "serialize_2dp")]
    pub duration_ms: f64,
    pub nodes: Vec<TraceNode>,
}

impl SearchTrace {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            ..Default::default()
        }
    }

    /// Record a candidate without extra tags.
    pub fn add_node(&mut self, depth: usize, candidate: usize, score: f64) {
        self.add_tagged_node(depth, candidate, score, std::iter::empty::<(String, Value)>());
    }

    /// Record a candidate along with arbitrary tags (e.g. `early_exit`).
    pub fn add_tagged_node<K, I>(&mut self, depth: usize, candidate: usize, score: f64, tags: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.nodes.push(TraceNode {
            depth,
            candidate,
            score: round_to(score, 4),
            tags: tags.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        });
        self.total_candidates += 1;
        if score > self.best_score {
            self.best_score = score;
        }
    }

    /// Sticky: once set it is never cleared.
    pub fn mark_reflection(&mut self) {
        self.reflection_triggered = true;
    }

    pub fn finish(&mut self, started: Instant) {
        self.duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    }

    pub fn nodes_at_depth(&self, depth: usize) -> impl Iterator<Item = &TraceNode> {
        self.nodes.iter().filter(move |node| node.depth == depth)
    }

    /// Flat JSON form shipped alongside pipeline results.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
