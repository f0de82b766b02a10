//! Word-count adherence loop.
//!
//! A bounded revise-and-recheck cycle around the provider gateway:
//!
//! ```text
//! Idle → Requesting → Checking → Satisfied
//!                         ↓
//!                      Revising → Requesting → … → Exhausted
//! ```
//!
//! The budget is `1 + max_revisions` requests. On exhaustion the draft
//! closest to the target is returned instead of an error.

use tokio_util::sync::CancellationToken;

use crate::core::{count_words, WordPolicy};
use crate::error::{Error, ProviderError, Result};
use crate::prompt::{revision_prompt, PromptPair};
use crate::provider::ProviderGateway;
use crate::{llog_debug, llog_warn};

/// Slack for float comparison at the band edges.
const EPSILON: f64 = 1e-9;

/// Accepted deviation from the target word count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Within this many percent of the target, inclusive.
    Percent(f64),
    Exact,
}

impl Tolerance {
    /// Pick the tolerance for `target` under `policy`.
    ///
    /// Short targets always get the wide band, strict or not.
    pub fn select(target: u32, policy: &WordPolicy, strict: bool) -> Self {
        if target < policy.short_threshold {
            Tolerance::Percent(policy.short_tolerance_percent)
        } else if strict {
            Tolerance::Exact
        } else {
            Tolerance::Percent(policy.tolerance_percent)
        }
    }

    fn allowed(&self, target: u32) -> f64 {
        match self {
            Tolerance::Percent(pct) => target as f64 * pct / 100.0,
            Tolerance::Exact => 0.0,
        }
    }

    pub fn accepts(&self, actual: u32, target: u32) -> bool {
        (actual as f64 - target as f64).abs() <= self.allowed(target) + EPSILON
    }

    /// Inclusive range of accepted word counts.
    pub fn band(&self, target: u32) -> (u32, u32) {
        let allowed = self.allowed(target);
        let low = (target as f64 - allowed - EPSILON).ceil().max(0.0) as u32;
        let high = (target as f64 + allowed + EPSILON).floor() as u32;
        (low, high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Requesting,
    Checking,
    Revising,
    Satisfied,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdherenceOutcome {
    pub text: String,
    pub word_count: u32,
    /// Provider requests issued, failed ones included.
    pub attempts: u32,
    /// `Satisfied` or `Exhausted`.
    pub state: LoopState,
    pub tokens_used: u64,
    /// Every state the loop passed through, in order.
    pub trace: Vec<LoopState>,
}

#[derive(Debug)]
struct Candidate {
    text: String,
    word_count: u32,
}

fn distance(actual: u32, target: u32) -> u32 {
    actual.abs_diff(target)
}

#[derive(Debug, Clone)]
pub struct AdherenceLoop<'a> {
    gateway: &'a ProviderGateway,
    target: u32,
    tolerance: Tolerance,
    max_revisions: u32,
}

impl<'a> AdherenceLoop<'a> {
    pub fn new(gateway: &'a ProviderGateway, target: u32, tolerance: Tolerance, max_revisions: u32) -> Self {
        Self {
            gateway,
            target,
            tolerance,
            max_revisions,
        }
    }

    /// Loop configured from a brief's word policy.
    pub fn from_policy(gateway: &'a ProviderGateway, target: u32, policy: &WordPolicy, strict: bool) -> Self {
        Self::new(
            gateway,
            target,
            Tolerance::select(target, policy, strict),
            policy.max_revisions,
        )
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub async fn run(
        &self,
        prompt: &PromptPair,
        cancel: &CancellationToken,
        progress: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<AdherenceOutcome> {
        let max_attempts = self.max_revisions.saturating_add(1);
        let band = self.tolerance.band(self.target);
        let mut trace = vec![LoopState::Idle];
        let mut request = prompt.clone();
        let mut best: Option<Candidate> = None;
        let mut last_error: Option<ProviderError> = None;
        let mut tokens_used = 0u64;
        let mut attempts = 0u32;
        let mut revisions = 0u32;
        let mut retrying = false;

        llog_debug!(
            "adherence: target={} band={:?} budget={}",
            self.target,
            band,
            max_attempts
        );

        while attempts < max_attempts {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            attempts += 1;
            trace.push(LoopState::Requesting);
            // `request` is a revision only once a draft has been checked.
            let line = match (revisions, retrying) {
                (0, false) => format!("Drafting copy (target {} words)", self.target),
                (0, true) => format!(
                    "Retrying first draft (attempt {} of {})",
                    attempts, max_attempts
                ),
                (n, false) => format!("Revision {} of {}", n, self.max_revisions),
                (n, true) => format!(
                    "Retrying revision {} (attempt {} of {})",
                    n, attempts, max_attempts
                ),
            };
            progress(&line);

            let reply = match self.gateway.generate(&request, cancel).await {
                Ok(reply) => reply,
                Err(Error::Provider(err)) if err.is_retryable() => {
                    llog_warn!("adherence: attempt {} failed: {}", attempts, err);
                    progress(&format!("Provider hiccup, retrying ({})", err.message));
                    last_error = Some(err);
                    retrying = true;
                    continue;
                }
                Err(err) => return Err(err),
            };
            tokens_used += reply.tokens_used;
            retrying = false;

            trace.push(LoopState::Checking);
            let word_count = count_words(&reply.text);
            llog_debug!(
                "adherence: attempt {} -> {} words (target {})",
                attempts,
                word_count,
                self.target
            );

            if self.tolerance.accepts(word_count, self.target) {
                trace.push(LoopState::Satisfied);
                progress(&format!("Length on target: {} words", word_count));
                return Ok(AdherenceOutcome {
                    text: reply.text,
                    word_count,
                    attempts,
                    state: LoopState::Satisfied,
                    tokens_used,
                    trace,
                });
            }

            if attempts < max_attempts {
                trace.push(LoopState::Revising);
                progress(&format!(
                    "Draft has {} words, wanted {}-{}; revising",
                    word_count, band.0, band.1
                ));
                request = revision_prompt(prompt, &reply.text, word_count, self.target, band);
                revisions += 1;
            }

            // Ties keep the earlier draft.
            let closer = best
                .as_ref()
                .map_or(true, |b| distance(word_count, self.target) < distance(b.word_count, self.target));
            if closer {
                best = Some(Candidate {
                    text: reply.text,
                    word_count,
                });
            }
        }

        trace.push(LoopState::Exhausted);
        match best {
            Some(candidate) => {
                llog_debug!(
                    "adherence: exhausted after {} attempts, keeping {} words",
                    attempts,
                    candidate.word_count
                );
                progress(&format!(
                    "Revision budget spent; keeping closest draft ({} words)",
                    candidate.word_count
                ));
                Ok(AdherenceOutcome {
                    text: candidate.text,
                    word_count: candidate.word_count,
                    attempts,
                    state: LoopState::Exhausted,
                    tokens_used,
                    trace,
                })
            }
            None => Err(last_error
                .unwrap_or_else(|| ProviderError::transient("no draft was produced"))
                .into()),
        }
    }
}
