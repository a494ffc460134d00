//! Sparse multi-agent debate state machine (§4.6), grounded on
//! `debate_engine.py::DebateEngine`. Speaker selection deviates from the
//! source's arbitrary `list(available)[0]` pick: per §4.6 it is the
//! deterministic smallest identifier among the agents the constraints
//! don't exclude.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const DEFAULT_MAX_ROUNDS: u32 = 5;

#[derive(Debug, Error)]
pub enum DebateError {
    #[error("debate {0} not found")]
    NotFound(String),
    #[error("debate not in {expected} phase")]
    WrongPhase { expected: &'static str },
    #[error("debate requires at least 2 agents")]
    TooFewAgents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebatePhase {
    BlindDraft,
    Critique,
    Revision,
    Converged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Ring,
    Pairs,
    Tree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Blocking,
    Suggestion,
    Clarification,
}

#[derive(Debug, Clone)]
pub struct Critique {
    pub from_agent: String,
    pub to_agent: String,
    pub round_num: u32,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone)]
pub struct DebateState {
    pub agents: Vec<String>,
    pub phase: DebatePhase,
    pub current_round: u32,
    pub drafts: HashMap<String, String>,
    pub critiques: Vec<Critique>,
    pub revisions: HashMap<String, Vec<String>>,
    pub topology: Topology,
}

#[derive(Debug, Clone, Default)]
pub struct SpeakerConstraints {
    pub no_consecutive_repeats: bool,
    pub max_turns_per_agent: Option<usize>,
    pub previous_speaker: Option<String>,
}

/// Generates a critique text for `critic_id`, seeing only the drafts in
/// `visible_drafts` (sparse visibility, per the topology pairing).
#[async_trait]
pub trait CritiqueGenerator: Send + Sync {
    async fn generate(
        &self,
        critic_id: &str,
        visible_drafts: &HashMap<String, String>,
    ) -> anyhow::Result<String>;
}

pub struct MockCritiqueGenerator;

#[async_trait]
impl CritiqueGenerator for MockCritiqueGenerator {
    async fn generate(
        &self,
        critic_id: &str,
        visible_drafts: &HashMap<String, String>,
    ) -> anyhow::Result<String> {
        let target = visible_drafts.keys().next().cloned().unwrap_or_default();
        Ok(format!("{critic_id} reviewed {target}'s draft"))
    }
}

pub struct DebateEngine {
    max_rounds: u32,
    active_debates: Arc<RwLock<HashMap<String, DebateState>>>,
}

impl DebateEngine {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            max_rounds,
            active_debates: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn start_debate(
        &self,
        debate_id: impl Into<String>,
        agents: Vec<String>,
        topology: Topology,
    ) -> Result<DebateState, DebateError> {
        if agents.len() < 2 {
            return Err(DebateError::TooFewAgents);
        }
        let debate_id = debate_id.into();
        let state = DebateState {
            agents,
            phase: DebatePhase::BlindDraft,
            current_round: 0,
            drafts: HashMap::new(),
            critiques: Vec::new(),
            revisions: HashMap::new(),
            topology,
        };
        info!(debate_id, agents = state.agents.len(), "debate started");
        self.active_debates.write().await.insert(debate_id, state.clone());
        Ok(state)
    }

    pub async fn blind_draft_phase(
        &self,
        debate_id: &str,
        drafts: HashMap<String, String>,
    ) -> Result<(), DebateError> {
        let mut debates = self.active_debates.write().await;
        let state = debates.get_mut(debate_id).ok_or_else(|| DebateError::NotFound(debate_id.to_string()))?;
        if state.phase != DebatePhase::BlindDraft {
            return Err(DebateError::WrongPhase { expected: "BLIND_DRAFT" });
        }
        info!(debate_id, drafts = drafts.len(), "blind drafts collected");
        state.drafts = drafts;
        state.phase = DebatePhase::Critique;
        Ok(())
    }

    pub async fn sparse_critique_phase(
        &self,
        debate_id: &str,
        generator: &dyn CritiqueGenerator,
    ) -> Result<Vec<Critique>, DebateError> {
        let pairings = {
            let debates = self.active_debates.read().await;
            let state = debates.get(debate_id).ok_or_else(|| DebateError::NotFound(debate_id.to_string()))?;
            if state.phase != DebatePhase::Critique {
                return Err(DebateError::WrongPhase { expected: "CRITIQUE" });
            }
            topology_pairings(state)
        };

        let mut critiques = Vec::new();
        for (critic_id, target_id) in pairings {
            let current_round = self
                .active_debates
                .read()
                .await
                .get(debate_id)
                .map(|s| s.current_round)
                .unwrap_or(0);
            let target_draft = self
                .active_debates
                .read()
                .await
                .get(debate_id)
                .and_then(|s| s.drafts.get(&target_id).cloned())
                .unwrap_or_default();
            let mut visible = HashMap::new();
            visible.insert(target_id.clone(), target_draft);

            let message = generator
                .generate(&critic_id, &visible)
                .await
                .unwrap_or_else(|_| String::new());

            critiques.push(Critique {
                from_agent: critic_id,
                to_agent: target_id,
                round_num: current_round,
                message,
                severity: Severity::Suggestion,
            });
        }

        let mut debates = self.active_debates.write().await;
        let state = debates.get_mut(debate_id).ok_or_else(|| DebateError::NotFound(debate_id.to_string()))?;
        state.critiques.extend(critiques.clone());
        state.phase = DebatePhase::Revision;
        info!(debate_id, count = critiques.len(), "critiques generated");
        Ok(critiques)
    }

    pub async fn revision_phase(
        &self,
        debate_id: &str,
        revisions: HashMap<String, String>,
    ) -> Result<bool, DebateError> {
        let mut debates = self.active_debates.write().await;
        let state = debates.get_mut(debate_id).ok_or_else(|| DebateError::NotFound(debate_id.to_string()))?;
        if state.phase != DebatePhase::Revision {
            return Err(DebateError::WrongPhase { expected: "REVISION" });
        }

        let mut unchanged_count = 0usize;
        for (agent_id, new_draft) in &revisions {
            state.revisions.entry(agent_id.clone()).or_default().push(new_draft.clone());
            let old_draft = state.drafts.get(agent_id).cloned().unwrap_or_default();
            if &old_draft == new_draft {
                unchanged_count += 1;
            }
        }

        state.drafts.extend(revisions);
        state.current_round += 1;

        let converged = unchanged_count >= state.agents.len().saturating_sub(1)
            || state.current_round >= self.max_rounds;

        if converged {
            state.phase = DebatePhase::Converged;
            info!(debate_id, rounds = state.current_round, "debate converged");
        } else {
            state.phase = DebatePhase::Critique;
            info!(debate_id, round = state.current_round, unchanged_count, "round completed");
        }

        Ok(converged)
    }

    /// Deterministic speaker selection (§4.6): the smallest identifier
    /// among agents not excluded by `constraints`.
    pub fn select_next_speaker(state: &DebateState, constraints: &SpeakerConstraints) -> Option<String> {
        let mut available: BTreeSet<String> = state.agents.iter().cloned().collect();

        if constraints.no_consecutive_repeats {
            if let Some(prev) = &constraints.previous_speaker {
                available.remove(prev);
            }
        }

        if let Some(max_turns) = constraints.max_turns_per_agent {
            for agent_id in &state.agents {
                let turn_count = state.critiques.iter().filter(|c| &c.from_agent == agent_id).count();
                if turn_count >= max_turns {
                    available.remove(agent_id);
                }
            }
        }

        available.into_iter().next()
    }

    pub async fn final_consensus(&self, debate_id: &str) -> Result<HashMap<String, String>, DebateError> {
        let debates = self.active_debates.read().await;
        let state = debates.get(debate_id).ok_or_else(|| DebateError::NotFound(debate_id.to_string()))?;
        if state.phase != DebatePhase::Converged {
            warn!(debate_id, "debate not yet converged");
        }
        Ok(state.drafts.clone())
    }
}

fn topology_pairings(state: &DebateState) -> Vec<(String, String)> {
    let agents = &state.agents;
    let n = agents.len();

    match state.topology {
        Topology::Ring => (0..n).map(|i| (agents[i].clone(), agents[(i + 1) % n].clone())).collect(),
        Topology::Pairs => {
            let mid = n / 2;
            agents[..mid]
                .iter()
                .zip(agents[mid..mid + mid].iter())
                .map(|(a, b)| (a.clone(), b.clone()))
                .collect()
        }
        Topology::Tree => {
            let mut pairings = Vec::new();
            for i in 0..n {
                let left = 2 * i + 1;
                let right = 2 * i + 2;
                if left < n {
                    pairings.push((agents[i].clone(), agents[left].clone()));
                }
                if right < n {
                    pairings.push((agents[i].clone(), agents[right].clone()));
                }
            }
            pairings
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agents(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("agent-{i}")).collect()
    }

    #[tokio::test]
    async fn starting_a_debate_with_one_agent_is_an_error() {
        let engine = DebateEngine::new(DEFAULT_MAX_ROUNDS);
        let err = engine.start_debate("d1", vec!["a".to_string()], Topology::Ring).await.unwrap_err();
        assert!(matches!(err, DebateError::TooFewAgents));
    }

    #[tokio::test]
    async fn full_lifecycle_converges_when_revisions_stop_changing() {
        let engine = DebateEngine::new(DEFAULT_MAX_ROUNDS);
        engine.start_debate("d1", agents(3), Topology::Ring).await.unwrap();

        let mut drafts = HashMap::new();
        for a in agents(3) {
            drafts.insert(a, "v1".to_string());
        }
        engine.blind_draft_phase("d1", drafts.clone()).await.unwrap();

        engine.sparse_critique_phase("d1", &MockCritiqueGenerator).await.unwrap();
        let converged = engine.revision_phase("d1", drafts.clone()).await.unwrap();
        assert!(converged);
    }

    #[tokio::test]
    async fn ring_topology_pairs_each_agent_with_the_next() {
        let engine = DebateEngine::new(DEFAULT_MAX_ROUNDS);
        let state = engine.start_debate("d1", agents(3), Topology::Ring).await.unwrap();
        let pairings = topology_pairings(&state);
        assert_eq!(pairings, vec![
            ("agent-0".to_string(), "agent-1".to_string()),
            ("agent-1".to_string(), "agent-2".to_string()),
            ("agent-2".to_string(), "agent-0".to_string()),
        ]);
    }

    #[test]
    fn speaker_selection_picks_the_smallest_available_identifier() {
        let state = DebateState {
            agents: vec!["b".to_string(), "a".to_string(), "c".to_string()],
            phase: DebatePhase::Critique,
            current_round: 0,
            drafts: HashMap::new(),
            critiques: Vec::new(),
            revisions: HashMap::new(),
            topology: Topology::Ring,
        };
        let constraints = SpeakerConstraints::default();
        assert_eq!(DebateEngine::select_next_speaker(&state, &constraints), Some("a".to_string()));
    }

    #[test]
    fn excludes_previous_speaker_when_no_consecutive_repeats() {
        let state = DebateState {
            agents: vec!["a".to_string(), "b".to_string()],
            phase: DebatePhase::Critique,
            current_round: 0,
            drafts: HashMap::new(),
            critiques: Vec::new(),
            revisions: HashMap::new(),
            topology: Topology::Ring,
        };
        let constraints = SpeakerConstraints {
            no_consecutive_repeats: true,
            max_turns_per_agent: None,
            previous_speaker: Some("a".to_string()),
        };
        assert_eq!(DebateEngine::select_next_speaker(&state, &constraints), Some("b".to_string()));
    }

    #[test]
    fn empty_available_set_returns_none() {
        let state = DebateState {
            agents: vec!["a".to_string()],
            phase: DebatePhase::Critique,
            current_round: 0,
            drafts: HashMap::new(),
            critiques: Vec::new(),
            revisions: HashMap::new(),
            topology: Topology::Ring,
        };
        let constraints = SpeakerConstraints {
            no_consecutive_repeats: true,
            max_turns_per_agent: None,
            previous_speaker: Some("a".to_string()),
        };
        assert_eq!(DebateEngine::select_next_speaker(&state, &constraints), None);
    }
}
