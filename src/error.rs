//! Error taxonomy for the Soul Engine.
//!
//! Every variant here is a programmer error or a configuration error, never
//! a transient runtime condition — the engine fails loudly at the call site
//! instead of silently coercing bad input. `apply_shock`'s "blocked by
//! inertia" outcome is deliberately not represented here: it is a normal,
//! expected result and stays a `bool` return at the call site.

use thiserror::Error;

/// Errors surfaced at Soul Engine API boundaries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SoulError {
    /// `apply_interaction` was called with a name absent from the interaction catalogue.
    #[error("unknown interaction: {0}")]
    UnknownInteraction(String),

    /// An operation referenced an emotion name that doesn't exist in the fixed emotion set.
    #[error("unknown emotion: {0}")]
    UnknownEmotion(String),

    /// An operation referenced a personality tag absent from the personality table.
    #[error("unknown personality: {0}")]
    UnknownPersonality(String),

    /// `enter_situation` was called with a name absent from the situation catalogue.
    #[error("unknown situation: {0}")]
    UnknownSituation(String),

    /// `trigger_topic` was called with a name absent from the topic registry.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// A belief index did not resolve to a live entry in the character's belief sequence.
    #[error("invalid belief index: {0}")]
    InvalidBeliefIndex(usize),

    /// `Beliefs::evaluate` was called with no evaluator backend registered.
    #[error("no belief evaluator backend configured")]
    EvaluatorNotConfigured,

    /// An operation required a sub-layer that was never initialized on this character.
    #[error("{0} layer not initialized on this character")]
    LayerNotInitialized(&'static str),
}

/// Convenience `Result` alias using [`SoulError`].
pub type Result<T> = std::result::Result<T, SoulError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_stable() {
        assert_eq!(
            SoulError::UnknownInteraction("dance".into()).to_string(),
            "unknown interaction: dance"
        );
        assert_eq!(
            SoulError::LayerNotInitialized("history").to_string(),
            "history layer not initialized on this character"
        );
        assert_eq!(
            SoulError::InvalidBeliefIndex(7).to_string(),
            "invalid belief index: 7"
        );
    }
}
