//! Presentation — situational masking of core emotion behind a presented facade.
//!
//! Presented emotion is a pure function of core emotion, the active
//! situation's bias/strength table, and any present people's modifiers; it
//! is cached for reads but recomputed on every core-emotion change while a
//! situation is active, never a second source of truth.

use crate::emotion::{EmotionDeltas, Emotions};
use crate::error::{Result, SoulError};
use crate::{Emotion, Personality};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

/// A situation's per-emotion pull: push the presented value toward `bias`
/// with force `strength` (both modulated further by masking ability).
pub type SituationEntry = HashMap<Emotion, (f32, f32)>;

fn default_situations() -> HashMap<String, SituationEntry> {
    let mut m = HashMap::new();
    m.insert(
        "loud_party".to_string(),
        HashMap::from([
            (Emotion::Happiness, (0.5, 0.4)),
            (Emotion::Energy, (0.4, 0.3)),
        ]),
    );
    m.insert(
        "quiet_library".to_string(),
        HashMap::from([
            (Emotion::Anxiety, (-0.1, 0.2)),
            (Emotion::Energy, (-0.2, 0.2)),
        ]),
    );
    m.insert(
        "formal_meeting".to_string(),
        HashMap::from([
            (Emotion::Anger, (-0.4, 0.5)),
            (Emotion::Confidence, (0.2, 0.3)),
        ]),
    );
    m.insert(
        "confrontation".to_string(),
        HashMap::from([
            (Emotion::Fear, (-0.3, 0.3)),
            (Emotion::Anger, (0.2, 0.2)),
        ]),
    );
    m
}

static SITUATIONS: LazyLock<RwLock<HashMap<String, SituationEntry>>> =
    LazyLock::new(|| RwLock::new(default_situations()));

/// Register or overwrite a situation in the process-wide catalogue. Safe to
/// call before the first `Character` is constructed only.
pub fn register_situation(name: impl Into<String>, entry: SituationEntry) {
    SITUATIONS.write().expect("situation registry poisoned").insert(name.into(), entry);
}

/// Per-personality masking ability: how far a situation can pull presented
/// emotion away from core.
pub fn masking_ability(personality: Personality) -> f32 {
    match personality {
        Personality::Default => 0.5,
        Personality::Stoic => 0.9,
        Personality::Hothead => 0.2,
        Personality::Worrier => 0.3,
        Personality::Social => 0.6,
    }
}

/// A person-specific modifier layered on top of the active situation's base
/// bias/strength for a given emotion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonModifier {
    /// Additive directional pressure, stacked across all present people.
    pub bias: f32,
    /// How hard this person pushes; the *maximum* across present people wins.
    pub strength: f32,
}

/// Per-character Presentation sub-state.
#[derive(Debug, Clone, Default)]
pub struct PresentationState {
    active_situation: Option<String>,
    presented: Option<Emotions>,
    person_modifiers: HashMap<String, HashMap<Emotion, PersonModifier>>,
    active_people: Vec<String>,
}

impl PresentationState {
    /// The active situation tag, if any.
    pub fn active_situation(&self) -> Option<&str> {
        self.active_situation.as_deref()
    }

    /// The people currently present.
    pub fn active_people(&self) -> &[String] {
        &self.active_people
    }

    /// Register a person's per-emotion modifier, available the next time
    /// that person is listed as present via `enter_situation`.
    pub fn set_person_modifier(&mut self, person_id: impl Into<String>, emotion: Emotion, modifier: PersonModifier) {
        self.person_modifiers.entry(person_id.into()).or_default().insert(emotion, modifier);
    }
}

fn effective_bias_strength(
    situation: &SituationEntry,
    person_modifiers: &HashMap<String, HashMap<Emotion, PersonModifier>>,
    active_people: &[String],
    e: Emotion,
) -> Option<(f32, f32)> {
    let (mut bias, mut strength) = *situation.get(&e)?;
    for person in active_people {
        if let Some(modifiers) = person_modifiers.get(person) {
            if let Some(modifier) = modifiers.get(&e) {
                bias += modifier.bias;
                strength = strength.max(modifier.strength);
            }
        }
    }
    Some((bias, strength))
}

fn compute_presented(core: &Emotions, state: &PresentationState, personality: Personality) -> Emotions {
    let mut presented = *core;
    let Some(situation_name) = &state.active_situation else {
        return presented;
    };
    let situations = SITUATIONS.read().expect("situation registry poisoned");
    let Some(situation) = situations.get(situation_name) else {
        return presented;
    };
    let masking = masking_ability(personality);
    for e in Emotion::ALL {
        if let Some((bias, strength)) =
            effective_bias_strength(situation, &state.person_modifiers, &state.active_people, e)
        {
            let core_value = core.get(e);
            presented.set(e, core_value + (bias - core_value) * strength * masking);
        }
    }
    presented
}

impl crate::Character {
    /// Install the Presentation layer on this character (empty, no active
    /// situation). Must be called before presentation operations; otherwise
    /// those return `LayerNotInitialized`.
    pub fn init_presentation(&mut self) {
        self.presentation = Some(PresentationState::default());
    }

    /// Read-only access to the Presentation sub-state, if installed.
    pub fn presentation(&self) -> Option<&PresentationState> {
        self.presentation.as_ref()
    }

    /// Mutable access to the Presentation sub-state (e.g. to register
    /// person modifiers before entering a situation).
    pub fn presentation_mut(&mut self) -> Option<&mut PresentationState> {
        self.presentation.as_mut()
    }

    /// Activate a situation by name, populate the present-people list, and
    /// recompute the presented cache. Errors with `UnknownSituation` if the
    /// name isn't in the process-wide catalogue.
    pub fn enter_situation(&mut self, name: &str, people: Vec<String>) -> Result<()> {
        {
            let situations = SITUATIONS.read().expect("situation registry poisoned");
            if !situations.contains_key(name) {
                return Err(SoulError::UnknownSituation(name.to_string()));
            }
        }
        let core = *self.emotions();
        let personality = self.personality();
        let state = self.presentation.as_mut().ok_or(SoulError::LayerNotInitialized("presentation"))?;
        state.active_situation = Some(name.to_string());
        state.active_people = people;
        state.presented = Some(compute_presented(&core, state, personality));
        tracing::debug!(situation = name, "entered situation");
        Ok(())
    }

    /// Clear the active situation; presented emotion reverts to core.
    pub fn leave_situation(&mut self) -> Result<()> {
        let state = self.presentation.as_mut().ok_or(SoulError::LayerNotInitialized("presentation"))?;
        state.active_situation = None;
        state.active_people.clear();
        state.presented = None;
        Ok(())
    }

    /// The presented (outward-facing) emotion vector: core when no
    /// situation is active, otherwise a lerp toward the situation+person
    /// bias toward the active situation, weighted by masking ability.
    pub fn get_perceived(&self) -> Emotions {
        match &self.presentation {
            Some(state) if state.active_situation.is_some() => {
                state.presented.unwrap_or_else(|| compute_presented(self.emotions(), state, self.personality()))
            }
            _ => *self.emotions(),
        }
    }

    /// Masking strain: the normalized average gap between core and
    /// presented, in `[0, 1]`. Zero whenever no situation is active, since
    /// presented then equals core exactly.
    pub fn get_masking_strain(&self) -> f32 {
        let core = *self.emotions();
        let presented = self.get_perceived();
        let sum: f32 = Emotion::ALL.iter().map(|&e| (core.get(e) - presented.get(e)).abs()).sum();
        let mean = sum / Emotion::ALL.len() as f32;
        (mean / 0.5).clamp(0.0, 1.0)
    }

    /// Register Presentation's post-hook at Facade-construction time.
    /// Presentation runs second among the canonically-wired hooks
    /// after History, so it recomputes from the
    /// just-updated core emotions on any commit while a situation is active.
    pub(crate) fn register_presentation_hook(&mut self) {
        self.register_post_hook(Arc::new(|char: &mut crate::Character, _name: &str, _applied: &EmotionDeltas| {
            let Some(state) = char.presentation.as_ref() else { return };
            if state.active_situation.is_none() {
                return;
            }
            let core = *char.emotions();
            let personality = char.personality();
            if let Some(state) = char.presentation.as_mut() {
                state.presented = Some(compute_presented(&core, state, personality));
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Character;

    #[test]
    fn presentation_layer_not_initialized_errors() {
        let mut c = Character::new(Personality::Default);
        let err = c.enter_situation("loud_party", vec![]).unwrap_err();
        assert_eq!(err, SoulError::LayerNotInitialized("presentation"));
    }

    #[test]
    fn unknown_situation_errors() {
        let mut c = Character::new(Personality::Default);
        c.init_presentation();
        let err = c.enter_situation("nonexistent_situation", vec![]).unwrap_err();
        assert_eq!(err, SoulError::UnknownSituation("nonexistent_situation".to_string()));
    }

    #[test]
    fn no_active_situation_perceived_equals_core_and_zero_strain() {
        let mut c = Character::new(Personality::Default);
        c.init_presentation();
        c.emotions.set(Emotion::Fear, 0.4);
        assert_eq!(c.get_perceived(), *c.emotions());
        assert_eq!(c.get_masking_strain(), 0.0);
    }

    #[test]
    fn s4_masking_lerp() {
        let mut c = Character::new(Personality::Default);
        c.init_presentation();
        c.emotions.set(Emotion::Happiness, -0.5);
        c.enter_situation("loud_party", vec![]).unwrap();
        let perceived = c.get_perceived().get(Emotion::Happiness);
        assert!((perceived - (-0.3)).abs() < 1e-4, "expected -0.3, got {perceived}");
    }

    #[test]
    fn s8_person_modifier_stack() {
        let mut c = Character::new(Personality::Default);
        c.init_presentation();
        c.presentation_mut().unwrap().set_person_modifier(
            "alice",
            Emotion::Anxiety,
            PersonModifier { bias: 0.6, strength: 0.5 },
        );
        c.enter_situation("quiet_library", vec!["alice".to_string()]).unwrap();
        let perceived = c.get_perceived().get(Emotion::Anxiety);
        assert!((perceived - 0.125).abs() < 1e-4, "expected 0.125, got {perceived}");
    }

    #[test]
    fn leave_situation_reverts_to_core() {
        let mut c = Character::new(Personality::Default);
        c.init_presentation();
        c.emotions.set(Emotion::Happiness, -0.5);
        c.enter_situation("loud_party", vec![]).unwrap();
        c.leave_situation().unwrap();
        assert_eq!(c.get_perceived(), *c.emotions());
        assert_eq!(c.get_masking_strain(), 0.0);
    }

    #[test]
    fn register_situation_extends_the_catalogue() {
        register_situation(
            "test_only_situation_presentation_rs",
            HashMap::from([(Emotion::Trust, (0.8, 0.5))]),
        );
        let mut c = Character::new(Personality::Default);
        c.init_presentation();
        c.emotions.set(Emotion::Trust, 0.0);
        c.enter_situation("test_only_situation_presentation_rs", vec![]).unwrap();
        let perceived = c.get_perceived().get(Emotion::Trust);
        assert!(
            (perceived - 0.2).abs() < 1e-4,
            "expected 0 + (0.8 - 0) * 0.5 * 0.5 = 0.2, got {perceived}"
        );
    }
}
