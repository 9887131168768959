//! Facade — character construction and canonical hook-registration order.
//!
//! The Facade wires a fully-assembled character from a
//! personality tag and an option bag, registering post-hooks in the
//! canonical order *History first, Presentation second* so baselines update
//! on the just-committed emotions before Presentation recomputes from them.
//! No pre-hooks are registered by default.

use crate::beliefs::{Belief, BeliefStore};
use crate::emotion::{Emotions, Personality, PostHook, PreHook};
use crate::history::HistoryState;
use crate::presentation::PresentationState;
use crate::time::{system_clock, TimeFn};
use crate::triggers::{Sensitivity, TriggerState};
use std::collections::HashMap;

/// The root entity. Owns the emotion vector, personality tag, and every
/// optional per-layer sub-state exclusively; never shared between
/// characters.
pub struct Character {
    pub(crate) personality: Personality,
    pub(crate) emotions: Emotions,
    pub(crate) pre_hooks: Vec<PreHook>,
    pub(crate) post_hooks: Vec<PostHook>,
    pub(crate) history: Option<HistoryState>,
    pub(crate) presentation: Option<PresentationState>,
    pub(crate) beliefs: Option<BeliefStore>,
    pub(crate) triggers: Option<TriggerState>,
}

impl std::fmt::Debug for Character {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Character")
            .field("personality", &self.personality)
            .field("emotions", &self.emotions)
            .field("history_installed", &self.history.is_some())
            .field("presentation_installed", &self.presentation.is_some())
            .field("beliefs_installed", &self.beliefs.is_some())
            .field("triggers_installed", &self.triggers.is_some())
            .finish_non_exhaustive()
    }
}

impl Character {
    /// Construct a bare character: just a personality tag and a zeroed
    /// emotion vector, with no optional layers installed and no hooks
    /// registered. Layers are opted into individually via their `init_*`
    /// methods — use [`Character::from_options`] for the canonically-wired
    /// Facade construction instead.
    pub fn new(personality: Personality) -> Self {
        Self {
            personality,
            emotions: Emotions::new(),
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
            history: None,
            presentation: None,
            beliefs: None,
            triggers: None,
        }
    }

    /// This character's immutable personality tag.
    pub fn personality(&self) -> Personality {
        self.personality
    }

    /// Construct a fully-wired character per the Facade:
    /// installs History, Presentation, Beliefs, and Triggers per
    /// `options`, then registers the canonical post-hooks in order
    /// (History, Presentation). No pre-hooks are registered by default;
    /// advanced integrations may call [`Character::register_pre_hook`]
    /// afterwards to modulate incoming deltas.
    pub fn from_options(personality: Personality, options: CharacterOptions) -> Self {
        let mut character = Self::new(personality);

        character.init_history(options.ema_alpha, options.time_fn);
        character.init_presentation();
        character.init_beliefs(options.initial_beliefs);
        character.init_triggers(options.sensitivities);

        character.register_history_hook();
        character.register_presentation_hook();

        character
    }
}

/// The option bag the Facade consumes: EMA alpha override, initial belief
/// list, per-topic sensitivity overrides, and the injected History time
/// source. A plain builder-style struct with `with_*` methods and a
/// `Default` impl, scoped to exactly what the Facade names.
pub struct CharacterOptions {
    ema_alpha: f32,
    time_fn: TimeFn,
    initial_beliefs: Vec<Belief>,
    sensitivities: HashMap<String, Sensitivity>,
}

impl std::fmt::Debug for CharacterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterOptions")
            .field("ema_alpha", &self.ema_alpha)
            .field("initial_beliefs", &self.initial_beliefs)
            .field("sensitivities", &self.sensitivities)
            .finish_non_exhaustive()
    }
}

impl Default for CharacterOptions {
    fn default() -> Self {
        Self {
            ema_alpha: crate::history::DEFAULT_EMA_ALPHA,
            time_fn: system_clock(),
            initial_beliefs: Vec::new(),
            sensitivities: HashMap::new(),
        }
    }
}

impl CharacterOptions {
    /// Start from the defaults: EMA alpha `0.05`, the system wall-clock time
    /// source, no initial beliefs, no sensitivity overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the History EMA smoothing factor.
    pub fn with_ema_alpha(mut self, alpha: f32) -> Self {
        self.ema_alpha = alpha;
        self
    }

    /// Inject a custom time source for History (and for callers driving Erosion's `tick`).
    pub fn with_time_fn(mut self, time_fn: TimeFn) -> Self {
        self.time_fn = time_fn;
        self
    }

    /// Seed the Beliefs layer with an initial belief list.
    pub fn with_initial_beliefs(mut self, beliefs: Vec<Belief>) -> Self {
        self.initial_beliefs = beliefs;
        self
    }

    /// Register a per-topic sensitivity override for Triggers.
    pub fn with_sensitivity(mut self, topic: impl Into<String>, sensitivity: Sensitivity) -> Self {
        self.sensitivities.insert(topic.into(), sensitivity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Personality;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[test]
    fn from_options_wires_all_layers() {
        let counter = Arc::new(AtomicI64::new(0));
        let handle = counter.clone();
        let options = CharacterOptions::new().with_time_fn(Arc::new(move || handle.fetch_add(1, Ordering::SeqCst)));
        let c = Character::from_options(Personality::Default, options);

        assert!(c.history().is_some());
        assert!(c.presentation().is_some());
        assert!(c.beliefs().is_some());
        assert!(c.triggers().is_some());
    }

    #[test]
    fn commit_fans_out_to_both_history_and_presentation() {
        // A full apply_interaction under Facade wiring should update both
        // History's baseline and Presentation's recomputed cache from the
        // same committed emotions.
        let counter = Arc::new(AtomicI64::new(0));
        let handle = counter.clone();
        let options = CharacterOptions::new().with_time_fn(Arc::new(move || handle.fetch_add(1, Ordering::SeqCst)));
        let mut c = Character::from_options(Personality::Default, options);

        c.enter_situation("loud_party", vec![]).unwrap();
        c.apply_interaction("achievement", 1.0).unwrap();

        assert!(c.history().unwrap().baseline(crate::Emotion::Happiness) > 0.0);
        let perceived = c.get_perceived().get(crate::Emotion::Happiness);
        assert!((perceived - c.emotion(crate::Emotion::Happiness)).abs() <= 1.0);
    }

    #[test]
    fn bare_character_has_no_layers() {
        let c = Character::new(Personality::Stoic);
        assert!(c.history().is_none());
        assert!(c.presentation().is_none());
        assert!(c.beliefs().is_none());
        assert!(c.triggers().is_none());
    }
}
