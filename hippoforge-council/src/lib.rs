//! C6: weighted-voting consensus with Elo reputation, and the sparse
//! multi-agent debate state machine.

mod debate;
mod voting;

pub use debate::{
    Critique, CritiqueGenerator, DebateEngine, DebateError, DebatePhase, DebateState,
    MockCritiqueGenerator, Severity, SpeakerConstraints, Topology, DEFAULT_MAX_ROUNDS,
};
pub use voting::{
    ConsensusResult, Vote, VotingError, WeightedVotingConsensus, DEFAULT_INITIAL_RATING,
    DEFAULT_K_FACTOR,
};
