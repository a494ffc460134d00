//! Weighted voting consensus with Elo-adjusted agent weights (§4.6),
//! grounded on `voting_consensus.py::WeightedVotingConsensus`.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_K_FACTOR: f64 = 32.0;
pub const DEFAULT_INITIAL_RATING: f64 = 1500.0;

#[derive(Debug, Error)]
pub enum VotingError {
    #[error("confidence must be in [0, 1], got {0}")]
    InvalidConfidence(f64),
    #[error("no votes to aggregate")]
    NoVotes,
}

#[derive(Debug, Clone)]
pub struct Vote {
    pub agent_id: String,
    pub decision: String,
    pub confidence: f64,
    pub domain: String,
}

#[derive(Debug, Clone)]
pub struct ConsensusResult {
    pub decision: String,
    pub total_weight: f64,
    pub vote_distribution: Vec<(String, f64)>,
    pub winning_margin: f64,
}

/// Tracks per-(agent, domain) Elo ratings and the full vote history, and
/// aggregates votes into a single decision weighted by confidence and,
/// optionally, normalized Elo.
pub struct WeightedVotingConsensus {
    k_factor: f64,
    initial_rating: f64,
    ratings: HashMap<(String, String), f64>,
    vote_history: Vec<Vote>,
}

impl Default for WeightedVotingConsensus {
    fn default() -> Self {
        Self::new(DEFAULT_K_FACTOR, DEFAULT_INITIAL_RATING)
    }
}

impl WeightedVotingConsensus {
    pub fn new(k_factor: f64, initial_rating: f64) -> Self {
        Self {
            k_factor,
            initial_rating,
            ratings: HashMap::new(),
            vote_history: Vec::new(),
        }
    }

    pub fn register_vote(
        &mut self,
        agent_id: impl Into<String>,
        decision: impl Into<String>,
        confidence: f64,
        domain: impl Into<String>,
    ) -> Result<(), VotingError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(VotingError::InvalidConfidence(confidence));
        }
        let vote = Vote {
            agent_id: agent_id.into(),
            decision: decision.into(),
            confidence,
            domain: domain.into(),
        };
        debug!(agent = %vote.agent_id, decision = %vote.decision, confidence, "vote registered");
        self.vote_history.push(vote);
        Ok(())
    }

    fn rating_of(&self, agent_id: &str, domain: &str) -> f64 {
        self.ratings
            .get(&(agent_id.to_string(), domain.to_string()))
            .copied()
            .unwrap_or(self.initial_rating)
    }

    /// Aggregates `votes` (or the full history if `None`) into a
    /// `ConsensusResult`. Ties are broken by first-encountered decision,
    /// matching Python `dict` insertion order plus `max()`'s
    /// first-maximal semantics.
    pub fn compute_decision(
        &self,
        votes: Option<&[Vote]>,
        use_elo: bool,
    ) -> Result<ConsensusResult, VotingError> {
        let votes = votes.unwrap_or(&self.vote_history);
        if votes.is_empty() {
            return Err(VotingError::NoVotes);
        }

        let mut order: Vec<String> = Vec::new();
        let mut weights: HashMap<String, f64> = HashMap::new();

        for vote in votes {
            let mut weight = vote.confidence;
            if use_elo {
                let elo = self.rating_of(&vote.agent_id, &vote.domain);
                weight *= elo / self.initial_rating;
            }
            if !weights.contains_key(&vote.decision) {
                order.push(vote.decision.clone());
            }
            *weights.entry(vote.decision.clone()).or_insert(0.0) += weight;
        }

        let mut best_decision = order[0].clone();
        let mut best_weight = weights[&best_decision];
        for decision in &order {
            let w = weights[decision];
            if w > best_weight {
                best_weight = w;
                best_decision = decision.clone();
            }
        }

        let mut sorted_weights: Vec<f64> = order.iter().map(|d| weights[d]).collect();
        sorted_weights.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let margin = if sorted_weights.len() > 1 {
            sorted_weights[0] - sorted_weights[1]
        } else {
            sorted_weights[0]
        };

        info!(decision = %best_decision, weight = best_weight, margin, "consensus computed");

        Ok(ConsensusResult {
            decision: best_decision,
            total_weight: best_weight,
            vote_distribution: order.into_iter().map(|d| (d.clone(), weights[&d])).collect(),
            winning_margin: margin,
        })
    }

    /// Standard Elo update against `opponent_rating` (or the initial
    /// rating if none given), K = `self.k_factor`.
    pub fn update_elo(
        &mut self,
        agent_id: &str,
        was_correct: bool,
        domain: &str,
        opponent_rating: Option<f64>,
    ) -> f64 {
        let current = self.rating_of(agent_id, domain);
        let opponent = opponent_rating.unwrap_or(self.initial_rating);
        let expected = 1.0 / (1.0 + 10f64.powf((opponent - current) / 400.0));
        let actual = if was_correct { 1.0 } else { 0.0 };
        let new_rating = current + self.k_factor * (actual - expected);
        self.ratings
            .insert((agent_id.to_string(), domain.to_string()), new_rating);
        info!(agent = agent_id, domain, from = current, to = new_rating, "elo updated");
        new_rating
    }

    pub fn agent_rating(&self, agent_id: &str, domain: &str) -> f64 {
        self.rating_of(agent_id, domain)
    }

    pub fn clear_votes(&mut self) {
        self.vote_history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_confidence_outside_unit_range() {
        let mut council = WeightedVotingConsensus::default();
        let err = council.register_vote("a1", "approve", 1.5, "general").unwrap_err();
        assert!(matches!(err, VotingError::InvalidConfidence(_)));
    }

    #[test]
    fn empty_vote_set_is_an_error() {
        let council = WeightedVotingConsensus::default();
        assert!(matches!(council.compute_decision(None, true), Err(VotingError::NoVotes)));
    }

    #[test]
    fn first_seen_decision_wins_exact_ties() {
        let mut council = WeightedVotingConsensus::default();
        council.register_vote("a1", "approve", 0.5, "general").unwrap();
        council.register_vote("a2", "reject", 0.5, "general").unwrap();
        let result = council.compute_decision(None, false).unwrap();
        assert_eq!(result.decision, "approve");
        assert_eq!(result.winning_margin, 0.0);
    }

    #[test]
    fn elo_weighting_favors_the_higher_rated_agent() {
        let mut council = WeightedVotingConsensus::default();
        council.update_elo("a1", true, "general", Some(1500.0));
        council.register_vote("a1", "approve", 0.5, "general").unwrap();
        council.register_vote("a2", "reject", 0.5, "general").unwrap();
        let result = council.compute_decision(None, true).unwrap();
        assert_eq!(result.decision, "approve");
    }

    #[test]
    fn elo_update_increases_rating_on_a_correct_call_against_a_stronger_opponent() {
        let mut council = WeightedVotingConsensus::default();
        let new_rating = council.update_elo("a1", true, "general", Some(1600.0));
        assert!(new_rating > DEFAULT_INITIAL_RATING);
    }

    #[test]
    fn single_decision_margin_equals_its_own_weight() {
        let mut council = WeightedVotingConsensus::default();
        council.register_vote("a1", "approve", 0.8, "general").unwrap();
        let result = council.compute_decision(None, false).unwrap();
        assert_eq!(result.winning_margin, 0.8);
    }
}
