// ABOUTME: Caller-supplied collaborators driving a LATS search
// ABOUTME: Candidate generation, value scoring and reflection, plus closure adapters

use async_trait::async_trait;
use std::future::Future;

/// Produces one candidate per call, typically by calling an LLM.
///
/// Must be safe to call concurrently when concurrent expansion is enabled.
/// `Ok(None)` and `Err(_)` both drop the candidate.
#[async_trait]
pub trait CandidateGenerator<S: Send>: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<Option<S>>;
}

/// Scores a candidate. Results are clamped to [0, 1] by the engine.
#[async_trait]
pub trait ValueFunction<S: Sync>: Send + Sync {
    async fn score(&self, candidate: &S) -> anyhow::Result<f64>;
}

/// Produces natural-language improvement feedback for a candidate.
#[async_trait]
pub trait ReflectFunction<S: Sync>: Send + Sync {
    async fn reflect(&self, candidate: &S, score: f64) -> anyhow::Result<String>;
}

/// Adapts an async closure `Fn(String) -> Future<Output = anyhow::Result<Option<S>>>`.
pub struct FnGenerator<F>(pub F);

#[async_trait]
impl<S, F, Fut> CandidateGenerator<S> for FnGenerator<F>
where
    S: Send,
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Option<S>>> + Send,
{
    async fn generate(&self, prompt: &str) -> anyhow::Result<Option<S>> {
        (self.0)(prompt.to_string()).await
    }
}

/// Adapts a synchronous scoring closure.
pub struct FnValue<F>(pub F);

#[async_trait]
impl<S, F> ValueFunction<S> for FnValue<F>
where
    S: Sync,
    F: Fn(&S) -> anyhow::Result<f64> + Send + Sync,
{
    async fn score(&self, candidate: &S) -> anyhow::Result<f64> {
        (self.0)(candidate)
    }
}

/// Adapts a synchronous reflection closure.
pub struct FnReflect<F>(pub F);

#[async_trait]
impl<S, F> ReflectFunction<S> for FnReflect<F>
where
    S: Sync,
    F: Fn(&S, f64) -> anyhow::Result<String> + Send + Sync,
{
    async fn reflect(&self, candidate: &S, score: f64) -> anyhow::Result<String> {
        (self.0)(candidate, score)
    }
}
