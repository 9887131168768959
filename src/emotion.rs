//! Core Emotions — the innermost layer.
//!
//! Eight scalar emotions, clamped to `[-1, 1]`, mutated through two paths:
//! a full `apply_interaction` pipeline (scale → pre-hooks → cross-effects →
//! personality scaling → commit → post-hooks) and a hook-less, cross-effect-
//! less `nudge` used for scripted events and Triggers.
//!
//! The interaction catalogue and cross-effect matrix are process-wide
//! registries, populated with shipped defaults at first access and safe to
//! extend only before the first [`crate::Character`] is constructed —
//! treated as process-wide immutable-after-init state.

use crate::error::{Result, SoulError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

/// The fixed, ordered emotion set `E`. Iteration over `Emotion::ALL` is the
/// canonical order every formula in this crate sums and clamps against —
/// determinism depends on always materializing sparse maps in this order
/// before folding them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Happiness,
    Anger,
    Fear,
    Trust,
    Energy,
    Loneliness,
    Anxiety,
    Confidence,
}

impl Emotion {
    /// Canonical iteration order over the full emotion set.
    pub const ALL: [Emotion; 8] = [
        Emotion::Happiness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Trust,
        Emotion::Energy,
        Emotion::Loneliness,
        Emotion::Anxiety,
        Emotion::Confidence,
    ];

    pub(crate) fn index(self) -> usize {
        Self::ALL.iter().position(|e| *e == self).expect("Emotion::ALL is exhaustive")
    }

    /// Lowercase name, used for parsing and for human-readable contexts.
    pub fn name(self) -> &'static str {
        match self {
            Emotion::Happiness => "happiness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Trust => "trust",
            Emotion::Energy => "energy",
            Emotion::Loneliness => "loneliness",
            Emotion::Anxiety => "anxiety",
            Emotion::Confidence => "confidence",
        }
    }

    /// Parse an emotion from its lowercase name. Used at data-driven
    /// boundaries (config-supplied interaction/situation tables) where
    /// emotions arrive as strings rather than the typed enum.
    pub fn parse(name: &str) -> Result<Emotion> {
        Self::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| SoulError::UnknownEmotion(name.to_string()))
    }
}

/// The emotion vector: one scalar per [`Emotion`], always clamped to `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Emotions([f32; 8]);

impl Default for Emotions {
    fn default() -> Self {
        Self([0.0; 8])
    }
}

impl Emotions {
    /// All emotions at zero (neutral).
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a single emotion.
    pub fn get(&self, e: Emotion) -> f32 {
        self.0[e.index()]
    }

    /// Set a single emotion, clamping to `[-1, 1]`.
    pub fn set(&mut self, e: Emotion, value: f32) {
        self.0[e.index()] = value.clamp(-1.0, 1.0);
    }

    /// Add a delta to a single emotion, clamping the result.
    pub(crate) fn add_clamped(&mut self, e: Emotion, delta: f32) {
        self.set(e, self.get(e) + delta);
    }

    /// Iterate the full vector in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        Emotion::ALL.into_iter().map(move |e| (e, self.get(e)))
    }
}

/// A sparse set of per-emotion deltas — the shape interaction catalogue
/// entries, cross-effect rows, and evaluator/trigger outputs all share.
pub type EmotionDeltas = HashMap<Emotion, f32>;

/// Materialize a sparse delta map into canonical-order `(Emotion, value)`
/// pairs, defaulting absent entries to `0.0`. Centralizes the determinism
/// rule so every summation in this module goes through it.
pub(crate) fn materialize(deltas: &EmotionDeltas) -> [f32; 8] {
    let mut out = [0.0f32; 8];
    for e in Emotion::ALL {
        out[e.index()] = deltas.get(&e).copied().unwrap_or(0.0);
    }
    out
}

/// An immutable personality tag indexing the multiplier table below.
/// An immutable tag drawn from a small enumerated set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    #[default]
    Default,
    Worrier,
    Hothead,
    Stoic,
    Social,
}

impl Personality {
    /// All personality tags, for iteration (e.g. the S2 scenario in `tests/scenarios.rs`).
    pub const ALL: [Personality; 5] = [
        Personality::Default,
        Personality::Worrier,
        Personality::Hothead,
        Personality::Stoic,
        Personality::Social,
    ];

    fn name(self) -> &'static str {
        match self {
            Personality::Default => "default",
            Personality::Worrier => "worrier",
            Personality::Hothead => "hothead",
            Personality::Stoic => "stoic",
            Personality::Social => "social",
        }
    }

    /// Parse a personality tag from its lowercase name (data-driven configs).
    pub fn parse(name: &str) -> Result<Personality> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| SoulError::UnknownPersonality(name.to_string()))
    }

    /// Per-emotion multiplier applied during `apply_interaction`'s
    /// sum-and-scale step and during `nudge`. Absent entries default to `1.0`.
    pub fn multiplier(self, emotion: Emotion) -> f32 {
        use Emotion::*;
        match (self, emotion) {
            (Personality::Worrier, Fear) => 1.5,
            (Personality::Worrier, Anxiety) => 1.5,
            (Personality::Worrier, Loneliness) => 1.2,

            (Personality::Hothead, Anger) => 1.6,
            (Personality::Hothead, Energy) => 1.2,
            (Personality::Hothead, Fear) => 0.6,

            (Personality::Stoic, Fear) => 0.4,
            (Personality::Stoic, Anger) => 0.5,
            (Personality::Stoic, Anxiety) => 0.5,

            (Personality::Social, Happiness) => 1.3,
            (Personality::Social, Loneliness) => 1.2,
            (Personality::Social, Trust) => 1.2,

            _ => 1.0,
        }
    }
}

/// A single interaction's base per-emotion deltas, before intensity scaling.
fn default_interactions() -> HashMap<String, EmotionDeltas> {
    use Emotion::*;
    let mut m = HashMap::new();
    m.insert(
        "social".to_string(),
        HashMap::from([(Happiness, 0.3), (Loneliness, -0.3), (Trust, 0.1), (Energy, 0.05)]),
    );
    m.insert(
        "conflict".to_string(),
        HashMap::from([(Anger, 0.3), (Trust, -0.15), (Happiness, -0.1), (Energy, 0.1)]),
    );
    m.insert(
        "achievement".to_string(),
        HashMap::from([(Happiness, 0.3), (Confidence, 0.3), (Energy, 0.1)]),
    );
    m.insert(
        "loss".to_string(),
        HashMap::from([(Happiness, -0.3), (Loneliness, 0.2), (Anxiety, 0.1), (Energy, -0.1)]),
    );
    m.insert(
        "rest".to_string(),
        HashMap::from([(Energy, 0.3), (Anxiety, -0.1), (Anger, -0.05)]),
    );
    m.insert(
        "threat".to_string(),
        HashMap::from([
            (Fear, 0.3),
            (Anger, 0.15),
            (Anxiety, 0.2),
            (Energy, 0.1),
            (Confidence, -0.1),
        ]),
    );
    m
}

/// The cross-effect matrix `X`: source emotion → (target emotion → factor).
/// `|factor| <= 0.3` throughout.
fn default_cross_effects() -> HashMap<Emotion, HashMap<Emotion, f32>> {
    use Emotion::*;
    let mut m: HashMap<Emotion, HashMap<Emotion, f32>> = HashMap::new();
    m.insert(Fear, HashMap::from([(Anxiety, 0.3), (Confidence, -0.2)]));
    m.insert(Anger, HashMap::from([(Trust, -0.2), (Happiness, -0.15)]));
    m.insert(Happiness, HashMap::from([(Confidence, 0.2), (Loneliness, -0.1)]));
    m.insert(Loneliness, HashMap::from([(Anxiety, 0.2), (Happiness, -0.15)]));
    m.insert(Trust, HashMap::from([(Anxiety, -0.2), (Loneliness, -0.15)]));
    m.insert(Confidence, HashMap::from([(Anxiety, -0.15), (Fear, -0.1)]));
    m.insert(Energy, HashMap::from([(Confidence, 0.1)]));
    m.insert(Anxiety, HashMap::from([(Energy, -0.1), (Confidence, -0.15)]));
    m
}

static INTERACTIONS: LazyLock<RwLock<HashMap<String, EmotionDeltas>>> =
    LazyLock::new(|| RwLock::new(default_interactions()));

static CROSS_EFFECTS: LazyLock<RwLock<HashMap<Emotion, HashMap<Emotion, f32>>>> =
    LazyLock::new(|| RwLock::new(default_cross_effects()));

/// Register or overwrite an interaction in the process-wide catalogue.
/// Safe to call before the first `Character` is constructed; undefined
/// behaviour afterwards.
pub fn register_interaction(name: impl Into<String>, deltas: EmotionDeltas) {
    INTERACTIONS
        .write()
        .expect("interaction registry poisoned")
        .insert(name.into(), deltas);
}

/// Register or overwrite a single cross-effect factor `source -> target`.
pub fn register_cross_effect(source: Emotion, target: Emotion, factor: f32) {
    CROSS_EFFECTS
        .write()
        .expect("cross-effect registry poisoned")
        .entry(source)
        .or_default()
        .insert(target, factor);
}

/// A pre-hook transforms the scaled base deltas before cross-effects run.
/// Registered in order; each hook's output becomes the next hook's input.
pub type PreHook = Arc<dyn Fn(&crate::Character, &str, EmotionDeltas) -> EmotionDeltas + Send + Sync>;

/// A post-hook observes the committed `applied` deltas. By contract
/// it "must not mutate core emotions" — that's a documented contract, not
/// one the type system enforces, since History/Presentation post-hooks
/// legitimately need `&mut Character` to update their own sub-state.
pub type PostHook = Arc<dyn Fn(&mut crate::Character, &str, &EmotionDeltas) + Send + Sync>;

impl crate::Character {
    /// Read a single emotion's current value.
    pub fn emotion(&self, e: Emotion) -> f32 {
        self.emotions.get(e)
    }

    /// Read the full emotion vector.
    pub fn emotions(&self) -> &Emotions {
        &self.emotions
    }

    /// Register a pre-hook. Registration order is the dispatch order.
    pub fn register_pre_hook(&mut self, hook: PreHook) {
        self.pre_hooks.push(hook);
    }

    /// Register a post-hook. Registration order is the dispatch order.
    pub fn register_post_hook(&mut self, hook: PostHook) {
        self.post_hooks.push(hook);
    }

    /// Run the full `apply_interaction` pipeline: scale, pre-hooks,
    /// cross-effects (computed from the post-pre-hook base only — never
    /// from other cross-effects or prior runs), sum-and-scale by
    /// personality, commit, post-hooks. Returns the `applied` deltas after
    /// personality scaling, before clamping against the character's prior
    /// state (callers observe the pipeline's output, not the commit delta).
    pub fn apply_interaction(&mut self, name: &str, intensity: f32) -> Result<EmotionDeltas> {
        let base_template = {
            let registry = INTERACTIONS.read().expect("interaction registry poisoned");
            registry
                .get(name)
                .cloned()
                .ok_or_else(|| SoulError::UnknownInteraction(name.to_string()))?
        };

        let mut base: EmotionDeltas =
            base_template.into_iter().map(|(e, v)| (e, v * intensity)).collect();

        let pre_hooks = std::mem::take(&mut self.pre_hooks);
        for hook in &pre_hooks {
            base = hook(self, name, base);
        }
        self.pre_hooks = pre_hooks;

        let materialized_base = materialize(&base);
        let cross_effects = CROSS_EFFECTS.read().expect("cross-effect registry poisoned");
        let mut cross = [0.0f32; 8];
        for source in Emotion::ALL {
            let source_value = materialized_base[source.index()];
            if source_value == 0.0 {
                continue;
            }
            if let Some(targets) = cross_effects.get(&source) {
                for (&target, &factor) in targets {
                    cross[target.index()] += source_value * factor;
                }
            }
        }
        drop(cross_effects);

        let mut applied: EmotionDeltas = HashMap::new();
        for e in Emotion::ALL {
            let value = (materialized_base[e.index()] + cross[e.index()]) * self.personality.multiplier(e);
            applied.insert(e, value);
        }

        for e in Emotion::ALL {
            self.emotions.add_clamped(e, applied[&e]);
        }

        tracing::debug!(interaction = name, intensity, "applied interaction");

        let post_hooks = std::mem::take(&mut self.post_hooks);
        for hook in &post_hooks {
            hook(self, name, &applied);
        }
        self.post_hooks = post_hooks;

        Ok(applied)
    }

    /// A single-emotion path: scale by personality, clamp, commit. Skips
    /// cross-effects and hooks entirely — the surgical tool used by
    /// scripted events and by Triggers, so a burst of keyword hits doesn't
    /// re-fire history-shift detection or presentation recomputation on
    /// every hit. Returns the final applied delta.
    pub fn nudge(&mut self, emotion: Emotion, delta: f32) -> f32 {
        let scaled = delta * self.personality.multiplier(emotion);
        let before = self.emotions.get(emotion);
        self.emotions.add_clamped(emotion, scaled);
        self.emotions.get(emotion) - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Character;

    #[test]
    fn emotions_clamp_on_set() {
        let mut e = Emotions::new();
        e.set(Emotion::Fear, 5.0);
        assert_eq!(e.get(Emotion::Fear), 1.0);
        e.set(Emotion::Fear, -5.0);
        assert_eq!(e.get(Emotion::Fear), -1.0);
    }

    #[test]
    fn emotion_parse_roundtrips_through_name() {
        for e in Emotion::ALL {
            assert_eq!(Emotion::parse(e.name()).unwrap(), e);
        }
        assert!(Emotion::parse("nonexistent").is_err());
    }

    #[test]
    fn unknown_interaction_errors() {
        let mut c = Character::new(Personality::Default);
        let err = c.apply_interaction("dance_party", 1.0).unwrap_err();
        assert_eq!(err, SoulError::UnknownInteraction("dance_party".to_string()));
    }

    #[test]
    fn zero_intensity_is_a_no_op() {
        let mut c = Character::new(Personality::Default);
        let applied = c.apply_interaction("social", 0.0).unwrap();
        for e in Emotion::ALL {
            assert_eq!(applied[&e], 0.0);
            assert_eq!(c.emotion(e), 0.0);
        }
    }

    #[test]
    fn s1_social_on_lonely_social_character() {
        let mut c = Character::new(Personality::Social);
        c.emotions.set(Emotion::Loneliness, 0.6);
        c.apply_interaction("social", 1.0).unwrap();
        assert!(c.emotion(Emotion::Loneliness) < 0.6, "loneliness should strictly decrease");
        assert!(c.emotion(Emotion::Happiness) > 0.0, "happiness should strictly increase above 0");
    }

    #[test]
    fn s2_threat_across_personalities() {
        let mut worrier = Character::new(Personality::Worrier);
        let mut hothead = Character::new(Personality::Hothead);
        let mut stoic = Character::new(Personality::Stoic);

        worrier.apply_interaction("threat", 1.0).unwrap();
        hothead.apply_interaction("threat", 1.0).unwrap();
        stoic.apply_interaction("threat", 1.0).unwrap();

        assert!(worrier.emotion(Emotion::Fear) > hothead.emotion(Emotion::Fear));
        assert!(hothead.emotion(Emotion::Anger) > worrier.emotion(Emotion::Anger));
        assert!(stoic.emotion(Emotion::Fear) < worrier.emotion(Emotion::Fear));
    }

    #[test]
    fn s3_clamping_under_extreme_intensity() {
        let mut c = Character::new(Personality::Default);
        c.apply_interaction("threat", 10.0).unwrap();
        for e in Emotion::ALL {
            let v = c.emotion(e);
            assert!((-1.0..=1.0).contains(&v), "{:?} out of range: {}", e, v);
        }
    }

    #[test]
    fn linearity_before_clamping() {
        let mut a_then_b = Character::new(Personality::Default);
        a_then_b.apply_interaction("achievement", 0.2).unwrap();
        a_then_b.apply_interaction("achievement", 0.3).unwrap();

        let mut combined = Character::new(Personality::Default);
        combined.apply_interaction("achievement", 0.5).unwrap();

        for e in Emotion::ALL {
            assert!((a_then_b.emotion(e) - combined.emotion(e)).abs() < 1e-5);
        }
    }

    #[test]
    fn nudge_skips_cross_effects_and_hooks() {
        let mut c = Character::new(Personality::Default);
        let fired = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let fired_clone = fired.clone();
        c.register_post_hook(Arc::new(move |_, _, _| {
            fired_clone.store(true, std::sync::atomic::Ordering::SeqCst);
        }));
        c.nudge(Emotion::Fear, 0.2);
        assert!(!fired.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(c.emotion(Emotion::Anxiety), 0.0, "cross-effects must not run on nudge");
    }

    #[test]
    fn register_interaction_extends_the_catalogue() {
        register_interaction(
            "test_only_interaction_emotion_rs",
            HashMap::from([(Emotion::Happiness, 0.42)]),
        );
        let mut c = Character::new(Personality::Default);
        let applied = c.apply_interaction("test_only_interaction_emotion_rs", 1.0).unwrap();
        assert!((applied[&Emotion::Happiness] - 0.42).abs() < 1e-5);
    }

    #[test]
    fn register_cross_effect_extends_the_matrix() {
        register_interaction(
            "test_only_interaction_cross_effect",
            HashMap::from([(Emotion::Trust, 0.4)]),
        );
        register_cross_effect(Emotion::Trust, Emotion::Energy, 0.25);

        let mut c = Character::new(Personality::Default);
        let applied = c.apply_interaction("test_only_interaction_cross_effect", 1.0).unwrap();
        assert!(
            (applied[&Emotion::Energy] - 0.1).abs() < 1e-5,
            "expected the registered cross-effect (0.4 * 0.25 = 0.1), got {}",
            applied[&Emotion::Energy]
        );
    }
}
