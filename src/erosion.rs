//! Erosion — hidden per-belief pressure, tipping points, and threshold hardening.
//!
//! Each belief accumulates sub-threshold pressure from evaluator impacts;
//! crossing the threshold tips the belief's strength and hardens the
//! threshold against the next tip. Decay relaxes pressure toward zero only
//! when `tick` is invoked — the engine never schedules time itself.

use crate::beliefs::{BeliefImpacts, Impact};
use crate::emotion::EmotionDeltas;
use crate::error::{Result, SoulError};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Default tipping threshold.
pub const DEFAULT_THRESHOLD: f32 = 0.3;
/// Default strength shift applied on a tip.
pub const DEFAULT_SHIFT_AMOUNT: f32 = 0.1;
/// Default pressure decay rate per unit time.
pub const DEFAULT_DECAY_RATE: f32 = 0.01;
/// Default threshold-hardening multiplier applied after every tip.
pub const DEFAULT_HARDENING_FACTOR: f32 = 1.1;
/// Cap applied to a single evaluation's derived pressure magnitude.
const MAX_EVALUATION_PRESSURE: f32 = 0.15;

/// A record of a belief crossing its tipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftEvent {
    /// The belief whose strength shifted.
    pub belief_index: usize,
    /// `+1` if pressure tipped positive (reinforcing), `-1` if negative (challenging).
    pub direction: i8,
    /// Strength before the tip.
    pub old_strength: f32,
    /// Strength after the tip.
    pub new_strength: f32,
}

/// Hidden erosion sub-state owned by a single [`crate::beliefs::Belief`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErosionState {
    pressure: f32,
    threshold: f32,
    shift_amount: f32,
    decay_rate: f32,
    last_event_time: Timestamp,
    /// Multiplier applied to `threshold` after each tip. Exposed as a public
    /// field so a belief can be configured to harden faster or slower than
    /// the default `1.1`.
    pub hardening_factor: f32,
}

impl Default for ErosionState {
    fn default() -> Self {
        Self {
            pressure: 0.0,
            threshold: DEFAULT_THRESHOLD,
            shift_amount: DEFAULT_SHIFT_AMOUNT,
            decay_rate: DEFAULT_DECAY_RATE,
            last_event_time: 0,
            hardening_factor: DEFAULT_HARDENING_FACTOR,
        }
    }
}

impl ErosionState {
    /// Current hidden pressure, in `[-1, 1]`.
    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    /// Current tipping threshold. Uncapped upward: a belief that keeps
    /// tipping keeps hardening.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Accumulate pressure: `pressure <- clamp(pressure + direction * |amount|)`.
    pub fn apply_pressure(&mut self, direction: i8, amount: f32) {
        self.pressure = (self.pressure + direction.signum() as f32 * amount.abs()).clamp(-1.0, 1.0);
    }

    /// `min(1, |pressure| / threshold)` — a gradual behavioural signal.
    pub fn tipping_proximity(&self) -> f32 {
        (self.pressure.abs() / self.threshold).min(1.0)
    }

    /// Resets pressure to zero. Used by both a tip and by `Beliefs::apply_shock`.
    pub fn reset_pressure(&mut self) {
        self.pressure = 0.0;
    }

    /// Move pressure toward zero by `decay_rate * dt`, never crossing sign,
    /// and advance `last_event_time`. A no-op when `dt == 0`.
    fn decay(&mut self, current_time: Timestamp) {
        let dt = (current_time - self.last_event_time).max(0) as f32;
        if dt > 0.0 {
            let step = self.decay_rate * dt;
            if self.pressure > 0.0 {
                self.pressure = (self.pressure - step).max(0.0);
            } else if self.pressure < 0.0 {
                self.pressure = (self.pressure + step).min(0.0);
            }
        }
        self.last_event_time = current_time;
    }
}

impl crate::Character {
    /// Accumulate pressure on a single belief's erosion state.
    pub fn apply_pressure(&mut self, index: usize, direction: i8, amount: f32) -> Result<()> {
        let belief = self
            .beliefs
            .as_mut()
            .ok_or(SoulError::LayerNotInitialized("beliefs"))?
            .beliefs
            .get_mut(index)
            .ok_or(SoulError::InvalidBeliefIndex(index))?;
        belief.erosion.apply_pressure(direction, amount);
        Ok(())
    }

    /// Check a single belief for a tip: if `|pressure| >= threshold`, record
    /// a [`ShiftEvent`], move strength by `direction * shift_amount`, reset
    /// pressure to zero, and harden the threshold by `hardening_factor`.
    pub fn check_tipping_point(&mut self, index: usize) -> Result<Option<ShiftEvent>> {
        let belief = self
            .beliefs
            .as_mut()
            .ok_or(SoulError::LayerNotInitialized("beliefs"))?
            .beliefs
            .get_mut(index)
            .ok_or(SoulError::InvalidBeliefIndex(index))?;

        let pressure = belief.erosion.pressure;
        let threshold = belief.erosion.threshold;
        let shift_amount = belief.erosion.shift_amount;
        let hardening_factor = belief.erosion.hardening_factor;
        if pressure.abs() < threshold {
            return Ok(None);
        }

        let direction: i8 = if pressure >= 0.0 { 1 } else { -1 };
        let old_strength = belief.strength();
        let new_strength = old_strength + direction as f32 * shift_amount;
        belief.set_strength(new_strength);
        let new_strength = belief.strength();

        belief.erosion.pressure = 0.0;
        belief.erosion.threshold = threshold * hardening_factor;

        let event = ShiftEvent { belief_index: index, direction, old_strength, new_strength };
        tracing::debug!(?event, "belief erosion tipped");
        Ok(Some(event))
    }

    /// Decay every belief's pressure toward zero given the current time.
    /// A no-op when `current_time` equals `last_event_time`.
    pub fn tick(&mut self, current_time: Timestamp) -> Result<()> {
        let store = self.beliefs.as_mut().ok_or(SoulError::LayerNotInitialized("beliefs"))?;
        for belief in &mut store.beliefs {
            belief.erosion.decay(current_time);
        }
        Ok(())
    }

    /// `min(1, |pressure| / threshold)` for a single belief.
    pub fn get_tipping_proximity(&self, index: usize) -> Result<f32> {
        let store = self.beliefs.as_ref().ok_or(SoulError::LayerNotInitialized("beliefs"))?;
        let belief = store.beliefs.get(index).ok_or(SoulError::InvalidBeliefIndex(index))?;
        Ok(belief.erosion.tipping_proximity())
    }

    /// Every belief index paired with its tipping proximity, ordered
    /// closest-to-tipping first — the ranking a downstream prompt builder
    /// would use to decide which belief is "most at risk" right now.
    pub fn beliefs_by_tipping_proximity(&self) -> Result<Vec<(usize, f32)>> {
        use ordered_float::OrderedFloat;
        let store = self.beliefs.as_ref().ok_or(SoulError::LayerNotInitialized("beliefs"))?;
        let mut ranked: Vec<(usize, f32)> = store
            .beliefs
            .iter()
            .enumerate()
            .map(|(idx, b)| (idx, b.erosion.tipping_proximity()))
            .collect();
        ranked.sort_by_key(|&(_, proximity)| std::cmp::Reverse(OrderedFloat(proximity)));
        Ok(ranked)
    }

    /// Feed evaluator output into Erosion: derive a capped pressure amount
    /// from the total delta magnitude, apply it per-belief per impact
    /// (`Challenged` -> negative, `Reinforced` -> positive, `Neutral` ->
    /// no-op), check each touched belief for a tip, and collect fired
    /// events.
    pub fn process_evaluation(&mut self, impacts: &BeliefImpacts, deltas: &EmotionDeltas) -> Result<Vec<ShiftEvent>> {
        let magnitude: f32 = deltas.values().map(|v| v.abs()).sum();
        let amount = (magnitude * 0.3).min(MAX_EVALUATION_PRESSURE);

        let mut events = Vec::new();
        for (&index, impact) in impacts {
            let direction = match impact {
                Impact::Challenged => -1,
                Impact::Reinforced => 1,
                Impact::Neutral => continue,
            };
            self.apply_pressure(index, direction, amount)?;
            if let Some(event) = self.check_tipping_point(index)? {
                events.push(event);
            }
        }
        Ok(events)
    }
}
