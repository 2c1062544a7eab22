// ABOUTME: LATS engine running expansion, scoring, reflection and backpropagation rounds
// ABOUTME: Never fails on collaborator errors; only total candidate exhaustion yields an empty result

use crate::collaborators::{CandidateGenerator, ReflectFunction, ValueFunction};
use crate::search_tree::{NodeId, SearchTree, SearchTreeError};
use crate::trace::SearchTrace;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// UCB1 exploration constant (≈ sqrt(2)).
pub const DEFAULT_EXPLORATION_WEIGHT: f64 = 1.414;

/// Substituted when a value function fails.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Substituted when a reflection function fails.
pub const FALLBACK_REFLECTION: &str = "Improve comprehensiveness and accuracy of the analysis.";

pub const QUALITY_FEEDBACK_HEADER: &str = "## Quality Feedback from previous attempt:";

#[derive(Error, Debug)]
pub enum LatsError {
    #[error("Invalid LATS configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Tree(#[from] SearchTreeError),
}

/// LATS algorithm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatsConfig {
    /// Candidates generated by the first expansion
    pub n_candidates: usize,
    /// Maximum depth; depths 2..=max_depth are reflection rounds
    pub max_depth: usize,
    /// Score at or above which the search exits early
    pub quality_threshold: f64,
    /// UCB1 exploration weight, kept for selection policies built on the tree
    pub exploration_weight: f64,
    /// Generate the candidates of one round concurrently
    pub concurrent_expand: bool,
}

impl Default for LatsConfig {
    fn default() -> Self {
        Self {
            n_candidates: 3,
            max_depth: 2,
            quality_threshold: 0.65,
            exploration_weight: DEFAULT_EXPLORATION_WEIGHT,
            concurrent_expand: true,
        }
    }
}

impl LatsConfig {
    pub fn validate(&self) -> Result<(), LatsError> {
        if self.n_candidates == 0 {
            return Err(LatsError::InvalidConfig(
                "n_candidates must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(LatsError::InvalidConfig(format!(
                "quality_threshold {} outside [0, 1]",
                self.quality_threshold
            )));
        }
        if !self.exploration_weight.is_finite() || self.exploration_weight < 0.0 {
            return Err(LatsError::InvalidConfig(format!(
                "exploration_weight {} must be finite and non-negative",
                self.exploration_weight
            )));
        }
        Ok(())
    }

    /// Candidates requested by each reflection round: `max(2, n_candidates - 1)`.
    pub fn refinement_width(&self) -> usize {
        self.n_candidates.saturating_sub(1).max(2)
    }
}

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// A candidate met the quality threshold at this depth
    EarlyExit { depth: usize },
    /// All depths ran; the best candidate seen is returned
    DepthExhausted,
    /// Every first-level candidate failed
    NoCandidates,
}

#[derive(Debug)]
pub struct SearchOutcome<S> {
    pub result: Option<S>,
    pub score: f64,
    pub trace: SearchTrace,
    pub termination: TerminationReason,
}

impl<S> SearchOutcome<S> {
    pub fn into_parts(self) -> (Option<S>, f64, SearchTrace) {
        (self.result, self.score, self.trace)
    }
}

/// Append reflection feedback to the original prompt.
pub fn build_improved_prompt(original_prompt: &str, reflection: &str) -> String {
    format!(
        "{}\n\n---\n{}\n{}\n\nPlease address the above feedback to produce a higher-quality analysis.",
        original_prompt, QUALITY_FEEDBACK_HEADER, reflection
    )
}

/// Tree-search-with-reflection engine
///
/// Each search:
/// 1. Expands `n_candidates` candidates from the initial prompt and scores them
///    in generation order, exiting on the first one meeting the threshold
/// 2. For depths 2..=max_depth, reflects on the best node, appends the critique
///    to the original prompt and expands `refinement_width()` children under it
/// 3. Backpropagates the selected node's score to the root
///
/// `exploration_weight` is carried for UCB1-based selection but the loop
/// itself always advances from the best-scoring node.
#[derive(Debug, Clone, Default)]
pub struct LatsEngine {
    config: LatsConfig,
}

impl LatsEngine {
    pub fn new(config: LatsConfig) -> Self {
        debug!(
            target: "lats::engine",
            n_candidates = config.n_candidates,
            max_depth = config.max_depth,
            quality_threshold = config.quality_threshold,
            exploration_weight = config.exploration_weight,
            concurrent_expand = config.concurrent_expand,
            "LATS engine configured"
        );
        Self { config }
    }

    pub fn config(&self) -> &LatsConfig {
        &self.config
    }

    /// Run one search. Collaborator failures are absorbed; an empty result with
    /// score 0.0 means no candidate was ever produced.
    pub async fn search<S, A, V, R>(
        &self,
        agent: &A,
        value_fn: &V,
        reflect_fn: &R,
        initial_prompt: &str,
        job_id: &str,
    ) -> SearchOutcome<S>
    where
        S: Send + Sync,
        A: CandidateGenerator<S> + ?Sized,
        V: ValueFunction<S> + ?Sized,
        R: ReflectFunction<S> + ?Sized,
    {
        self.search_with_tree(agent, value_fn, reflect_fn, initial_prompt, job_id)
            .await
            .0
    }

    pub(crate) async fn search_with_tree<S, A, V, R>(
        &self,
        agent: &A,
        value_fn: &V,
        reflect_fn: &R,
        initial_prompt: &str,
        job_id: &str,
    ) -> (SearchOutcome<S>, SearchTree<S>)
    where
        S: Send + Sync,
        A: CandidateGenerator<S> + ?Sized,
        V: ValueFunction<S> + ?Sized,
        R: ReflectFunction<S> + ?Sized,
    {
        let started = Instant::now();

        info!(
            target: "lats::engine",
            job_id = %job_id,
            candidates = self.config.n_candidates,
            max_depth = self.config.max_depth,
            threshold = self.config.quality_threshold,
            "LATS search started"
        );

        let mut run = SearchRun {
            config: &self.config,
            agent,
            value_fn,
            reflect_fn,
            job_id,
            tree: SearchTree::new(),
            trace: SearchTrace::new(job_id),
        };

        let (selected, termination) = match run.execute(initial_prompt).await {
            Ok(selected) => selected,
            Err(e) => {
                error!(
                    target: "lats::engine",
                    job_id = %job_id,
                    error = %e,
                    "LATS search aborted on inconsistent tree"
                );
                (None, TerminationReason::NoCandidates)
            }
        };

        let SearchRun {
            mut tree,
            mut trace,
            ..
        } = run;

        let (result, score) = match selected {
            Some(node_id) => {
                let score = tree.get_node(node_id).map(|n| n.score()).unwrap_or(0.0);
                match tree.take_state(node_id) {
                    Some(state) => (Some(state), score),
                    None => (None, 0.0),
                }
            }
            None => (None, 0.0),
        };

        trace.finish(started);

        info!(
            target: "lats::engine",
            job_id = %job_id,
            best_score = score,
            nodes = trace.total_candidates,
            reflection = trace.reflection_triggered,
            duration_ms = trace.duration_ms,
            termination = ?termination,
            "LATS search complete"
        );

        (
            SearchOutcome {
                result,
                score,
                trace,
                termination,
            },
            tree,
        )
    }
}

/// State owned by a single `search` call.
struct SearchRun<'a, S, A: ?Sized, V: ?Sized, R: ?Sized> {
    config: &'a LatsConfig,
    agent: &'a A,
    value_fn: &'a V,
    reflect_fn: &'a R,
    job_id: &'a str,
    tree: SearchTree<S>,
    trace: SearchTrace,
}

impl<'a, S, A, V, R> SearchRun<'a, S, A, V, R>
where
    S: Send + Sync,
    A: CandidateGenerator<S> + ?Sized,
    V: ValueFunction<S> + ?Sized,
    R: ReflectFunction<S> + ?Sized,
{
    async fn execute(
        &mut self,
        initial_prompt: &str,
    ) -> Result<(Option<NodeId>, TerminationReason), SearchTreeError> {
        let root = self.tree.root_id();
        let threshold = self.config.quality_threshold;
        let mut best: Option<(NodeId, f64)> = None;

        let candidates = self.expand(initial_prompt, self.config.n_candidates).await;

        for (idx, candidate) in candidates.into_iter().enumerate() {
            let score = self.safe_score(&candidate).await;
            let node = self.tree.add_scored_child(root, candidate, score)?;
            let early_exit = score >= threshold;

            self.trace
                .add_tagged_node(1, idx + 1, score, [("early_exit", Value::Bool(early_exit))]);
            debug!(
                target: "lats::engine",
                job_id = %self.job_id,
                depth = 1,
                candidate = idx + 1,
                score,
                "Candidate scored"
            );

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((node, score));
            }

            if early_exit {
                info!(
                    target: "lats::engine",
                    job_id = %self.job_id,
                    depth = 1,
                    score,
                    "Quality threshold reached, exiting early"
                );
                self.tree.backpropagate(node, score)?;
                return Ok((Some(node), TerminationReason::EarlyExit { depth: 1 }));
            }
        }

        for depth in 2..=self.config.max_depth {
            let Some((parent, parent_score)) = best else {
                break;
            };

            let reflection = self.reflect_on(parent, parent_score).await?;
            self.tree.set_reflection(parent, reflection.as_str())?;
            self.trace.mark_reflection();

            info!(
                target: "lats::engine",
                job_id = %self.job_id,
                depth,
                prev_score = parent_score,
                "Reflection triggered"
            );

            let improved_prompt = build_improved_prompt(initial_prompt, &reflection);
            let refined = self
                .expand(&improved_prompt, self.config.refinement_width())
                .await;

            // `parent` stays fixed for the whole round; a refinement that overtakes
            // it becomes the parent of the next round, not of its own siblings.
            for (idx, candidate) in refined.into_iter().enumerate() {
                let score = self.safe_score(&candidate).await;
                let node = self.tree.add_scored_child(parent, candidate, score)?;

                self.trace.add_tagged_node(
                    depth,
                    idx + 1,
                    score,
                    [("reflection_applied", Value::Bool(true))],
                );
                debug!(
                    target: "lats::engine",
                    job_id = %self.job_id,
                    depth,
                    candidate = idx + 1,
                    score,
                    "Candidate scored"
                );

                if best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((node, score));
                }

                if score >= threshold {
                    info!(
                        target: "lats::engine",
                        job_id = %self.job_id,
                        depth,
                        score,
                        "Quality threshold reached, exiting early"
                    );
                    self.tree.backpropagate(node, score)?;
                    return Ok((Some(node), TerminationReason::EarlyExit { depth }));
                }
            }
        }

        match best {
            Some((node, score)) => {
                self.tree.backpropagate(node, score)?;
                Ok((Some(node), TerminationReason::DepthExhausted))
            }
            None => {
                warn!(
                    target: "lats::engine",
                    job_id = %self.job_id,
                    "No candidate survived expansion"
                );
                Ok((None, TerminationReason::NoCandidates))
            }
        }
    }

    /// Generate `n` candidates. Results keep issue order; failed candidates are dropped.
    async fn expand(&self, prompt: &str, n: usize) -> Vec<S> {
        let outcomes: Vec<Option<S>> = if self.config.concurrent_expand {
            join_all((1..=n).map(|attempt| self.safe_generate(prompt, attempt))).await
        } else {
            let mut outcomes = Vec::with_capacity(n);
            for attempt in 1..=n {
                outcomes.push(self.safe_generate(prompt, attempt).await);
            }
            outcomes
        };

        let produced: Vec<S> = outcomes.into_iter().flatten().collect();

        debug!(
            target: "lats::expand",
            job_id = %self.job_id,
            requested = n,
            produced = produced.len(),
            concurrent = self.config.concurrent_expand,
            "Expansion round completed"
        );

        produced
    }

    async fn safe_generate(&self, prompt: &str, attempt: usize) -> Option<S> {
        match self.agent.generate(prompt).await {
            Ok(Some(candidate)) => Some(candidate),
            Ok(None) => {
                debug!(
                    target: "lats::expand",
                    job_id = %self.job_id,
                    attempt,
                    "Agent produced no candidate"
                );
                None
            }
            Err(e) => {
                warn!(
                    target: "lats::expand",
                    job_id = %self.job_id,
                    attempt,
                    error = %e,
                    "Candidate generation failed, dropping candidate"
                );
                None
            }
        }
    }

    async fn safe_score(&self, candidate: &S) -> f64 {
        match self.value_fn.score(candidate).await {
            Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
            Ok(score) => {
                warn!(
                    target: "lats::engine",
                    job_id = %self.job_id,
                    score,
                    "Value function returned a non-finite score, using neutral score"
                );
                NEUTRAL_SCORE
            }
            Err(e) => {
                warn!(
                    target: "lats::engine",
                    job_id = %self.job_id,
                    error = %e,
                    "Value function failed, using neutral score"
                );
                NEUTRAL_SCORE
            }
        }
    }

    async fn reflect_on(&self, node_id: NodeId, score: f64) -> Result<String, SearchTreeError> {
        let node = self.tree.get_node(node_id)?;
        let Some(state) = node.state() else {
            return Ok(FALLBACK_REFLECTION.to_string());
        };

        match self.reflect_fn.reflect(state, score).await {
            Ok(reflection) => Ok(reflection),
            Err(e) => {
                warn!(
                    target: "lats::engine",
                    job_id = %self.job_id,
                    error = %e,
                    "Reflection function failed, using fallback reflection"
                );
                Ok(FALLBACK_REFLECTION.to_string())
            }
        }
    }
}
