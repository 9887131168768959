//! Soul Engine
//!
//! A per-character data layer modelling the inner life of non-player
//! characters for interactive narrative systems. Given a stream of
//! interactions, scene descriptions, and conversation text, it produces
//! queryable state describing what a character feels, what they believe,
//! what they outwardly present, and how these have drifted over time.
//!
//! # Overview
//!
//! The engine is a per-character bundle of six layered stores plus a thin
//! facade that wires them together:
//!
//! - **Core Emotions** ([`emotion`]): eight scalar emotions, a deterministic
//!   interaction pipeline (scale, pre-hooks, cross-effects, personality
//!   scaling, commit, post-hooks), and a hook-less `nudge` path.
//! - **History** ([`history`]): EMA-smoothed baselines and sustained-shift
//!   detection, plus designer-driven snapshots.
//! - **Presentation** ([`presentation`]): a situation-and-person-modified
//!   facade derived from core emotion, with a masking-strain signal.
//! - **Beliefs** ([`beliefs`]): a text-based belief store with a pluggable
//!   evaluator and a scripted, inertia-gated shock path.
//! - **Erosion** ([`erosion`]): hidden per-belief pressure, tipping points,
//!   and threshold hardening.
//! - **Triggers** ([`triggers`]): word-boundary keyword scanning with
//!   per-character sensitivity, cooldowns, and desensitisation.
//!
//! Dependency order (leaves first): Core -> (History, Presentation,
//! Triggers) -> Beliefs -> Erosion -> Facade. [`character::Character`] is
//! the root entity; [`character::CharacterOptions`] plus
//! [`Character::from_options`] is the canonically-wired Facade
//! construction path.
//!
//! # Out of scope
//!
//! This crate does not generate dialogue, render a prompt, or drive
//! animation. The LLM client realising [`beliefs::Evaluator`], the prompt
//! builder that consumes this crate's state, terminal colouring and CLI
//! harnesses, the host's time source, and persistence/serialisation are all
//! external collaborators the engine interacts with only through the
//! interfaces this crate defines.
//!
//! # Example
//!
//! ```
//! use soul_engine::{Character, CharacterOptions, Emotion, Personality};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI64, Ordering};
//!
//! let counter = Arc::new(AtomicI64::new(0));
//! let handle = counter.clone();
//! let options = CharacterOptions::new()
//!     .with_time_fn(Arc::new(move || handle.fetch_add(1, Ordering::SeqCst)));
//! let mut npc = Character::from_options(Personality::Social, options);
//!
//! npc.apply_interaction("social", 1.0).unwrap();
//! assert!(npc.emotion(Emotion::Happiness) > 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Text-based belief store: pluggable evaluator, tags, scripted shock.
pub mod beliefs;
/// Character facade: root entity, option bag, canonical hook wiring.
pub mod character;
/// Core Emotions: the eight-scalar vector, personality scaling, the
/// interaction pipeline, and the hook-less `nudge` path.
pub mod emotion;
/// Error taxonomy used at every Soul Engine API boundary.
pub mod error;
/// Hidden per-belief pressure, tipping points, and threshold hardening.
pub mod erosion;
/// EMA-smoothed baselines and significant-shift detection.
pub mod history;
/// Situational masking of core emotion behind a presented facade.
pub mod presentation;
/// The injected time-source abstraction consumed by History and Erosion.
pub mod time;
/// Word-boundary keyword triggers with cooldown and desensitisation.
pub mod triggers;

pub use beliefs::{Belief, BeliefImpacts, BeliefStore, Evaluator, Impact, KeywordClusters, KeywordEvaluator};
pub use character::{Character, CharacterOptions};
pub use emotion::{register_cross_effect, register_interaction, Emotion, EmotionDeltas, Emotions, Personality, PostHook, PreHook};
pub use error::{Result, SoulError};
pub use erosion::{ErosionState, ShiftEvent};
pub use history::{ShiftRecord, Snapshot};
pub use presentation::{register_situation, PersonModifier, PresentationState, SituationEntry};
pub use time::{system_clock, TimeFn, Timestamp};
pub use triggers::{register_topic, FiredTopic, Sensitivity, TopicDefinition, TriggerState};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    fn counting_clock() -> TimeFn {
        let counter = Arc::new(AtomicI64::new(0));
        Arc::new(move || counter.fetch_add(1, Ordering::SeqCst))
    }

    #[test]
    fn readme_example_smoke_test() {
        let options = CharacterOptions::new().with_time_fn(counting_clock());
        let mut npc = Character::from_options(Personality::Social, options);
        npc.apply_interaction("social", 1.0).unwrap();
        assert!(npc.emotion(Emotion::Happiness) > 0.0);
    }

    #[test]
    fn facade_construction_wires_every_layer_with_no_pre_hooks() {
        let options = CharacterOptions::new().with_time_fn(counting_clock());
        let npc = Character::from_options(Personality::Default, options);
        assert!(npc.history().is_some());
        assert!(npc.presentation().is_some());
        assert!(npc.beliefs().is_some());
        assert!(npc.triggers().is_some());
    }
}
