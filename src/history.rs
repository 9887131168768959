//! History — EMA-smoothed baselines and significant-shift detection.
//!
//! The middle layer of the pipeline: every committed emotion change is fed
//! here as a post-hook so the character's long-run baseline tracks the
//! short-run emotion vector, and a shift record is appended only when the
//! baseline has moved past a reset-on-record threshold since the last
//! recorded shift.

use crate::emotion::{EmotionDeltas, Emotions};
use crate::error::{Result, SoulError};
use crate::time::{TimeFn, Timestamp};
use crate::Emotion;
use serde::{Deserialize, Serialize};

/// A recorded, sustained baseline change for one emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    /// When the shift was recorded, per the injected time source.
    pub timestamp: Timestamp,
    /// Which emotion shifted.
    pub emotion: Emotion,
    /// The prior reference baseline.
    pub from: f32,
    /// The new reference baseline.
    pub to: f32,
    /// The interaction name (or other cause label) active when detected.
    pub cause_label: String,
}

/// An explicit, designer-driven capture of the full emotion vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was taken, per the injected time source.
    pub timestamp: Timestamp,
    /// A caller-supplied label for the moment (e.g. "end_of_act_one").
    pub label: String,
    /// The full emotion vector at that moment.
    pub emotions: Emotions,
}

/// Default EMA smoothing factor: a ~20-step memory horizon.
pub const DEFAULT_EMA_ALPHA: f32 = 0.05;

/// The threshold for "has this emotion drifted significantly".
pub const DEFAULT_SHIFT_THRESHOLD: f32 = 0.3;

/// Per-character History sub-state.
#[derive(Clone)]
pub struct HistoryState {
    baselines: Emotions,
    reference: Emotions,
    shifts: Vec<ShiftRecord>,
    snapshots: Vec<Snapshot>,
    alpha: f32,
    #[allow(clippy::type_complexity)]
    time_fn: TimeFn,
}

impl std::fmt::Debug for HistoryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryState")
            .field("baselines", &self.baselines)
            .field("reference", &self.reference)
            .field("shifts", &self.shifts)
            .field("snapshots", &self.snapshots)
            .field("alpha", &self.alpha)
            .finish_non_exhaustive()
    }
}

impl HistoryState {
    /// Construct a fresh History layer with baselines and reference both at
    /// zero, using `alpha` as the EMA smoothing factor and `time_fn` as the
    /// injected, monotonic time source.
    pub fn new(alpha: f32, time_fn: TimeFn) -> Self {
        Self {
            baselines: Emotions::new(),
            reference: Emotions::new(),
            shifts: Vec::new(),
            snapshots: Vec::new(),
            alpha,
            time_fn,
        }
    }

    /// Current EMA baseline for a single emotion.
    pub fn baseline(&self, e: Emotion) -> f32 {
        self.baselines.get(e)
    }

    /// All recorded shifts, in append order (monotonic in timestamp).
    pub fn shifts(&self) -> &[ShiftRecord] {
        &self.shifts
    }

    /// All recorded snapshots, in append order.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }
}

impl crate::Character {
    /// Install the History layer on this character. Must be called before
    /// any History operation; otherwise those return `LayerNotInitialized`.
    pub fn init_history(&mut self, alpha: f32, time_fn: TimeFn) {
        self.history = Some(HistoryState::new(alpha, time_fn));
    }

    /// Read-only access to the History sub-state, if installed.
    pub fn history(&self) -> Option<&HistoryState> {
        self.history.as_ref()
    }

    /// EMA-update the baseline for every emotion touched by `applied`
    /// against the character's *current* emotion vector (post-commit), then
    /// check for a significant shift against the held reference baseline.
    /// Appends a [`ShiftRecord`] and resets the reference whenever
    /// `|baseline[e] - reference[e]| > 0.3`. Typically
    /// wired as a post-hook so it runs after `apply_interaction` commits.
    pub fn update_history(&mut self, cause_label: &str, _applied: &EmotionDeltas) -> Result<()> {
        let current = *self.emotions();
        let state = self
            .history
            .as_mut()
            .ok_or(SoulError::LayerNotInitialized("history"))?;

        for e in Emotion::ALL {
            let updated = state.alpha * current.get(e) + (1.0 - state.alpha) * state.baselines.get(e);
            state.baselines.set(e, updated);

            let reference = state.reference.get(e);
            if (state.baselines.get(e) - reference).abs() > DEFAULT_SHIFT_THRESHOLD {
                let new_reference = state.baselines.get(e);
                state.shifts.push(ShiftRecord {
                    timestamp: (state.time_fn)(),
                    emotion: e,
                    from: reference,
                    to: new_reference,
                    cause_label: cause_label.to_string(),
                });
                state.reference.set(e, new_reference);
                tracing::debug!(emotion = e.name(), from = reference, to = new_reference, "recorded history shift");
            }
        }
        Ok(())
    }

    /// Capture the full emotion vector under a designer-supplied label,
    /// independent of shift detection.
    pub fn take_snapshot(&mut self, label: impl Into<String>) -> Result<()> {
        let emotions = *self.emotions();
        let state = self
            .history
            .as_mut()
            .ok_or(SoulError::LayerNotInitialized("history"))?;
        let snapshot = Snapshot {
            timestamp: (state.time_fn)(),
            label: label.into(),
            emotions,
        };
        state.snapshots.push(snapshot);
        Ok(())
    }

    /// The most recent recorded shift for a given emotion, if any.
    pub fn find_shift(&self, emotion: Emotion) -> Result<Option<&ShiftRecord>> {
        let state = self.history.as_ref().ok_or(SoulError::LayerNotInitialized("history"))?;
        Ok(state.shifts.iter().rev().find(|s| s.emotion == emotion))
    }

    /// All shifts whose magnitude `|to - from|` meets or exceeds `threshold`
    /// (default `0.3`) — the subset a downstream narrative layer would
    /// surface as "worth mentioning".
    pub fn get_narrative_shifts(&self, threshold: f32) -> Result<Vec<&ShiftRecord>> {
        let state = self.history.as_ref().ok_or(SoulError::LayerNotInitialized("history"))?;
        Ok(state
            .shifts
            .iter()
            .filter(|s| (s.to - s.from).abs() >= threshold)
            .collect())
    }

    /// Register History's post-hook at Facade-construction time. History
    /// runs first among the canonically-wired hooks so its
    /// baselines reflect the just-committed emotions before Presentation
    /// recomputes from them.
    pub(crate) fn register_history_hook(&mut self) {
        self.register_post_hook(std::sync::Arc::new(|char: &mut crate::Character, name: &str, applied: &EmotionDeltas| {
            if char.history.is_some() {
                if let Err(err) = char.update_history(name, applied) {
                    tracing::warn!(?err, "history post-hook skipped");
                }
            }
        }));
    }
}
