//! Fuzzy chat command matching.
//!
//! Every registered command is scored against the user's text with a
//! normalized Levenshtein similarity:
//!
//! ```text
//! similarity = 100 * (len(candidate) - distance) / len(candidate)
//! ```
//!
//! floored at zero. The best score is then classified into a [`MatchTier`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// Confidence of the best match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTier {
    /// Identical after normalization.
    Exact,
    /// At or above the configured threshold.
    Close,
    /// Below the threshold, or nothing to compare against.
    NoMatch,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchTier::Exact => "exact",
            MatchTier::Close => "close",
            MatchTier::NoMatch => "no-match",
        };
        f.write_str(name)
    }
}

/// A registered command with its similarity to the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub command: String,
    /// 0 to 100.
    pub similarity: f64,
}

/// Result of matching one chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Best scoring command, empty when there were no candidates.
    pub candidate: String,
    pub similarity: f64,
    pub tier: MatchTier,
    /// All candidates, best first. Equal scores keep registration order.
    pub ranked: Vec<ScoredCandidate>,
}

impl MatchResult {
    /// The `n` best candidates.
    pub fn top(&self, n: usize) -> &[ScoredCandidate] {
        &self.ranked[..n.min(self.ranked.len())]
    }
}

/// Scores chat input against a candidate list.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    threshold: f64,
}

impl FuzzyMatcher {
    /// `threshold` is the minimum similarity percentage of a close match.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Rank `candidates` against `raw_input` and classify the best score.
    pub fn match_command(&self, raw_input: &str, candidates: &[String]) -> MatchResult {
        let input = normalize(strip_annotation(raw_input));

        let mut ranked: Vec<ScoredCandidate> = candidates
            .iter()
            .map(|command| ScoredCandidate {
                command: command.clone(),
                similarity: similarity(&input, &normalize(command)),
            })
            .collect();

        // Stable: equal scores stay in registration order.
        ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        let (candidate, similarity) = ranked
            .first()
            .map(|best| (best.command.clone(), best.similarity))
            .unwrap_or_default();

        let tier = if ranked.is_empty() {
            MatchTier::NoMatch
        } else {
            self.classify(similarity)
        };

        tracing::debug!(
            input = %input,
            best = %candidate,
            similarity,
            %tier,
            "Matched chat input"
        );

        MatchResult {
            candidate,
            similarity,
            tier,
            ranked,
        }
    }

    /// Map a similarity percentage to a tier.
    pub fn classify(&self, similarity: f64) -> MatchTier {
        if similarity >= 100.0 {
            MatchTier::Exact
        } else if similarity >= self.threshold {
            MatchTier::Close
        } else {
            MatchTier::NoMatch
        }
    }
}

/// Remove the chat command prefix and any trailing `(...)` annotation.
///
/// Suggestion buttons carry their score, e.g. `den (85.00 %)`; stripping it
/// lets a tapped suggestion match its command exactly.
pub fn strip_annotation(raw_input: &str) -> &str {
    let trimmed = raw_input.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    match trimmed.find('(') {
        Some(index) => trimmed[..index].trim_end(),
        None => trimmed,
    }
}

/// Similarity percentage of two already-normalized strings.
///
/// An empty candidate scores 0.
pub fn similarity(input: &str, candidate: &str) -> f64 {
    let len = candidate.chars().count();
    if len == 0 {
        return 0.0;
    }

    let distance = strsim::levenshtein(input, candidate);
    if distance > len {
        return 0.0;
    }

    (len - distance) as f64 * 100.0 / len as f64
}
