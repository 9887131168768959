//! Beliefs — a text-based belief store with a pluggable evaluator.
//!
//! Beliefs are opaque text plus tags, strength, and inertia; the engine
//! never infers their content, only evaluates a scene+conversation against
//! them through a swappable [`Evaluator`] capability.

use crate::emotion::EmotionDeltas;
use crate::erosion::ErosionState;
use crate::error::{Result, SoulError};
use crate::Emotion;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// The evaluator's verdict on a single belief for a given scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    /// The scene/conversation contradicts or undermines this belief.
    Challenged,
    /// The scene/conversation supports or confirms this belief.
    Reinforced,
    /// No bearing on this belief either way.
    Neutral,
}

/// Mapping from belief index to the evaluator's verdict. `Neutral` entries
/// may be omitted entirely.
pub type BeliefImpacts = HashMap<usize, Impact>;

/// A single belief held by a character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Belief {
    /// Opaque text; never parsed or generated by the engine itself.
    pub text: String,
    /// Conviction, clamped to `[0, 1]`.
    strength: f32,
    /// Resistance to discontinuous change via `apply_shock`, clamped to `[0, 1]`.
    inertia: f32,
    /// Short symbolic labels used by the default evaluator and for filtering.
    pub tags: Vec<String>,
    /// Hidden per-belief erosion sub-state.
    pub(crate) erosion: ErosionState,
}

impl Belief {
    /// Construct a belief with clamped strength/inertia and default erosion state.
    pub fn new(text: impl Into<String>, strength: f32, inertia: f32, tags: Vec<String>) -> Self {
        Self {
            text: text.into(),
            strength: strength.clamp(0.0, 1.0),
            inertia: inertia.clamp(0.0, 1.0),
            tags,
            erosion: ErosionState::default(),
        }
    }

    /// Current conviction strength, in `[0, 1]`.
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Current resistance to shock, in `[0, 1]`.
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    /// The belief's hidden erosion sub-state (pressure, threshold, decay).
    pub fn erosion(&self) -> &ErosionState {
        &self.erosion
    }

    pub(crate) fn set_strength(&mut self, value: f32) {
        self.strength = value.clamp(0.0, 1.0);
    }

    pub(crate) fn set_inertia(&mut self, value: f32) {
        self.inertia = value.clamp(0.0, 1.0);
    }
}

/// The swappable evaluator capability: scans a scene and conversation
/// against a character's beliefs and emotions, returning emotion deltas to
/// apply (via `nudge`) and per-belief impact verdicts.
#[cfg_attr(test, mockall::automock)]
pub trait Evaluator: Send + Sync {
    /// Evaluate `beliefs` against `emotions`, `scene`, and `conversation`.
    fn evaluate(
        &self,
        beliefs: &[Belief],
        emotions: &crate::Emotions,
        scene: &str,
        conversation: &str,
    ) -> (EmotionDeltas, BeliefImpacts);
}

/// Per-tag keyword clusters driving the shipped default evaluator.
#[derive(Debug, Clone, Default)]
pub struct KeywordClusters {
    challenge: HashMap<String, Vec<String>>,
    reinforce: HashMap<String, Vec<String>>,
}

impl KeywordClusters {
    /// Register the challenge-keyword cluster for a tag.
    pub fn with_challenge(mut self, tag: impl Into<String>, keywords: Vec<String>) -> Self {
        self.challenge.insert(tag.into(), keywords);
        self
    }

    /// Register the reinforce-keyword cluster for a tag.
    pub fn with_reinforce(mut self, tag: impl Into<String>, keywords: Vec<String>) -> Self {
        self.reinforce.insert(tag.into(), keywords);
        self
    }
}

/// Deterministic, dependency-free default evaluator ("fake LLM") used for
/// testability and as the engine's out-of-the-box behavior: lowercase the
/// text and scan for keyword-cluster membership, keyed per belief tag
/// instead of a single global polarity score.
pub struct KeywordEvaluator {
    clusters: KeywordClusters,
}

impl KeywordEvaluator {
    /// Construct a keyword evaluator from per-tag challenge/reinforce clusters.
    pub fn new(clusters: KeywordClusters) -> Self {
        Self { clusters }
    }
}

impl Evaluator for KeywordEvaluator {
    fn evaluate(
        &self,
        beliefs: &[Belief],
        _emotions: &crate::Emotions,
        scene: &str,
        conversation: &str,
    ) -> (EmotionDeltas, BeliefImpacts) {
        let haystack = format!("{scene} {conversation}").to_lowercase();
        let mut deltas: EmotionDeltas = HashMap::new();
        let mut impacts = BeliefImpacts::new();

        for (idx, belief) in beliefs.iter().enumerate() {
            let s = belief.strength;
            let verdict = belief.tags.iter().find_map(|tag| {
                if self.clusters.challenge.get(tag).is_some_and(|kw| kw.iter().any(|k| haystack.contains(k.as_str()))) {
                    Some(Impact::Challenged)
                } else if self.clusters.reinforce.get(tag).is_some_and(|kw| kw.iter().any(|k| haystack.contains(k.as_str()))) {
                    Some(Impact::Reinforced)
                } else {
                    None
                }
            });

            match verdict {
                Some(Impact::Challenged) => {
                    *deltas.entry(Emotion::Anxiety).or_insert(0.0) += 0.1 * s;
                    *deltas.entry(Emotion::Fear).or_insert(0.0) += 0.05 * s;
                    *deltas.entry(Emotion::Anger).or_insert(0.0) += 0.03 * s;
                    *deltas.entry(Emotion::Happiness).or_insert(0.0) -= 0.05 * s;
                    impacts.insert(idx, Impact::Challenged);
                }
                Some(Impact::Reinforced) => {
                    *deltas.entry(Emotion::Happiness).or_insert(0.0) += 0.05 * s;
                    *deltas.entry(Emotion::Confidence).or_insert(0.0) += 0.05 * s;
                    *deltas.entry(Emotion::Anxiety).or_insert(0.0) -= 0.025 * s;
                    impacts.insert(idx, Impact::Reinforced);
                }
                Some(Impact::Neutral) | None => {}
            }
        }

        (deltas, impacts)
    }
}

/// Per-character Beliefs sub-state.
pub struct BeliefStore {
    beliefs: Vec<Belief>,
    evaluator: Option<Arc<dyn Evaluator>>,
}

impl std::fmt::Debug for BeliefStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeliefStore")
            .field("beliefs", &self.beliefs)
            .field("evaluator_configured", &self.evaluator.is_some())
            .finish()
    }
}

impl BeliefStore {
    /// Construct a belief store seeded with an initial belief list and no evaluator.
    pub fn new(initial: Vec<Belief>) -> Self {
        Self { beliefs: initial, evaluator: None }
    }

    /// All beliefs, addressed by stable index (never reordered).
    pub fn beliefs(&self) -> &[Belief] {
        &self.beliefs
    }

    /// Beliefs carrying a given tag, alongside their stable index.
    pub fn beliefs_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = (usize, &'a Belief)> + 'a {
        self.beliefs.iter().enumerate().filter(move |(_, b)| b.tags.iter().any(|t| t == tag))
    }
}

impl crate::Character {
    /// Install the Beliefs layer with an initial belief list (no evaluator configured yet).
    pub fn init_beliefs(&mut self, initial: Vec<Belief>) {
        self.beliefs = Some(BeliefStore::new(initial));
    }

    /// Read-only access to the Beliefs sub-state, if installed.
    pub fn beliefs(&self) -> Option<&BeliefStore> {
        self.beliefs.as_ref()
    }

    /// Append a new belief to the store, returning its stable index.
    pub fn add_belief(&mut self, belief: Belief) -> Result<usize> {
        let store = self.beliefs.as_mut().ok_or(SoulError::LayerNotInitialized("beliefs"))?;
        store.beliefs.push(belief);
        Ok(store.beliefs.len() - 1)
    }

    /// All beliefs, addressed by stable index.
    pub fn get_beliefs(&self) -> Result<&[Belief]> {
        Ok(self.beliefs.as_ref().ok_or(SoulError::LayerNotInitialized("beliefs"))?.beliefs())
    }

    /// Beliefs carrying a given tag, alongside their stable index.
    pub fn get_beliefs_by_tag<'a>(&'a self, tag: &'a str) -> Result<Vec<(usize, &'a Belief)>> {
        let store = self.beliefs.as_ref().ok_or(SoulError::LayerNotInitialized("beliefs"))?;
        Ok(store.beliefs_by_tag(tag).collect())
    }

    /// Install or replace the evaluator backend.
    pub fn set_evaluator_backend(&mut self, evaluator: Arc<dyn Evaluator>) -> Result<()> {
        let store = self.beliefs.as_mut().ok_or(SoulError::LayerNotInitialized("beliefs"))?;
        store.evaluator = Some(evaluator);
        Ok(())
    }

    /// Run the configured evaluator against this character's beliefs and
    /// current emotions. Errors with `EvaluatorNotConfigured` if no backend
    /// has been installed.
    pub fn evaluate(&self, scene: &str, conversation: &str) -> Result<(EmotionDeltas, BeliefImpacts)> {
        let store = self.beliefs.as_ref().ok_or(SoulError::LayerNotInitialized("beliefs"))?;
        let evaluator = store.evaluator.as_ref().ok_or(SoulError::EvaluatorNotConfigured)?;
        Ok(evaluator.evaluate(&store.beliefs, self.emotions(), scene, conversation))
    }

    /// Scripted, evaluator-bypassing discontinuous belief change gated by
    /// inertia. `threshold = 1 - inertia`; a `magnitude` at or below that
    /// threshold is blocked (returns `false`, no mutation). Otherwise
    /// strength moves by `direction * (magnitude - threshold)`, inertia
    /// decrements by `0.05` ("cracking"); the belief's erosion pressure also
    /// resets to zero as part of the shock's own contract.
    pub fn apply_shock(&mut self, index: usize, direction: i8, magnitude: f32) -> Result<bool> {
        let store = self.beliefs.as_mut().ok_or(SoulError::LayerNotInitialized("beliefs"))?;
        let belief = store.beliefs.get_mut(index).ok_or(SoulError::InvalidBeliefIndex(index))?;

        let threshold = 1.0 - belief.inertia();
        if magnitude <= threshold {
            return Ok(false);
        }

        let direction = direction.signum() as f32;
        let new_strength = belief.strength() + direction * (magnitude - threshold);
        belief.set_strength(new_strength);
        belief.set_inertia(belief.inertia() - 0.05);
        belief.erosion.reset_pressure();
        tracing::debug!(index, direction, magnitude, "belief shocked");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Character, Personality};

    #[test]
    fn mocked_evaluator_backend_is_dispatched_through() {
        let mut mock = MockEvaluator::new();
        mock.expect_evaluate().times(1).returning(|_, _, _, _| {
            (HashMap::from([(Emotion::Confidence, 0.2)]), HashMap::from([(0, Impact::Reinforced)]))
        });

        let mut c = Character::new(Personality::Default);
        c.init_beliefs(vec![Belief::new("x", 0.5, 0.5, vec![])]);
        c.set_evaluator_backend(Arc::new(mock)).unwrap();

        let (deltas, impacts) = c.evaluate("scene", "conversation").unwrap();
        assert_eq!(deltas[&Emotion::Confidence], 0.2);
        assert_eq!(impacts[&0], Impact::Reinforced);
    }

    fn default_clusters() -> KeywordClusters {
        KeywordClusters::default()
            .with_challenge("trust_in_others", vec!["betrayed".to_string(), "lied".to_string()])
            .with_reinforce("trust_in_others", vec!["loyal".to_string(), "kept their word".to_string()])
    }

    #[test]
    fn beliefs_layer_not_initialized_errors() {
        let c = Character::new(Personality::Default);
        let err = c.get_beliefs().unwrap_err();
        assert_eq!(err, SoulError::LayerNotInitialized("beliefs"));
    }

    #[test]
    fn evaluator_not_configured_errors() {
        let mut c = Character::new(Personality::Default);
        c.init_beliefs(vec![Belief::new("people are trustworthy", 0.8, 0.5, vec!["trust_in_others".into()])]);
        let err = c.evaluate("scene", "conversation").unwrap_err();
        assert_eq!(err, SoulError::EvaluatorNotConfigured);
    }

    #[test]
    fn default_evaluator_challenged_and_reinforced_deltas() {
        let mut c = Character::new(Personality::Default);
        c.init_beliefs(vec![Belief::new("people are trustworthy", 0.8, 0.5, vec!["trust_in_others".into()])]);
        c.set_evaluator_backend(Arc::new(KeywordEvaluator::new(default_clusters()))).unwrap();

        let (deltas, impacts) = c.evaluate("", "I can't believe I was betrayed by my closest friend").unwrap();
        assert_eq!(impacts.get(&0), Some(&Impact::Challenged));
        assert!((deltas[&Emotion::Anxiety] - 0.08).abs() < 1e-5);

        let (deltas, impacts) = c.evaluate("", "she has always kept their word").unwrap();
        assert_eq!(impacts.get(&0), Some(&Impact::Reinforced));
        assert!((deltas[&Emotion::Happiness] - 0.04).abs() < 1e-5);
    }

    #[test]
    fn neutral_scenes_omit_the_belief_entirely() {
        let mut c = Character::new(Personality::Default);
        c.init_beliefs(vec![Belief::new("people are trustworthy", 0.8, 0.5, vec!["trust_in_others".into()])]);
        c.set_evaluator_backend(Arc::new(KeywordEvaluator::new(default_clusters()))).unwrap();
        let (deltas, impacts) = c.evaluate("", "the weather today is sunny").unwrap();
        assert!(impacts.is_empty());
        assert!(deltas.is_empty());
    }

    #[test]
    fn shock_blocked_below_threshold() {
        let mut c = Character::new(Personality::Default);
        c.init_beliefs(vec![Belief::new("x", 0.5, 0.9, vec![])]);
        // threshold = 1 - 0.9 = 0.1; magnitude 0.1 is not > threshold
        let fired = c.apply_shock(0, 1, 0.1).unwrap();
        assert!(!fired);
        assert_eq!(c.get_beliefs().unwrap()[0].strength(), 0.5);
    }

    #[test]
    fn shock_above_threshold_updates_strength_and_cracks_inertia() {
        let mut c = Character::new(Personality::Default);
        c.init_beliefs(vec![Belief::new("x", 0.5, 0.9, vec![])]);
        c.beliefs.as_mut().unwrap().beliefs[0].erosion.apply_pressure(1, 0.5);
        let fired = c.apply_shock(0, 1, 0.5).unwrap();
        assert!(fired);
        let belief = &c.get_beliefs().unwrap()[0];
        assert!((belief.strength() - 0.9).abs() < 1e-5);
        assert!((belief.inertia() - 0.85).abs() < 1e-5);
        assert_eq!(belief.erosion().pressure(), 0.0, "shock resets erosion pressure");
    }

    #[test]
    fn invalid_belief_index_errors() {
        let mut c = Character::new(Personality::Default);
        c.init_beliefs(vec![]);
        let err = c.apply_shock(3, 1, 0.9).unwrap_err();
        assert_eq!(err, SoulError::InvalidBeliefIndex(3));
    }
}
