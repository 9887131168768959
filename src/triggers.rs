//! Triggers — fast, deterministic keyword-driven emotion nudges.
//!
//! Word-boundary keyword scanning over free text, with per-character
//! sensitivity overrides, cooldowns, and desensitisation. Unlike Beliefs,
//! Triggers are surface-level and evaluator-free: the same turn of text may
//! fire both layers with no ordering dependency between them other than
//! "advance_turn before process_text on a new turn".

use crate::emotion::EmotionDeltas;
use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

/// Turns a cooldown lasts after a topic fires.
pub const DEFAULT_COOLDOWN: u32 = 3;

/// A process-wide topic definition: its keyword list and default deltas.
#[derive(Debug, Clone)]
pub struct TopicDefinition {
    /// Keywords matched with word-boundary semantics, case-insensitively.
    pub keywords: Vec<String>,
    /// Default per-emotion deltas applied (scaled by intensity) when this topic fires.
    pub default_deltas: EmotionDeltas,
}

fn default_topics() -> (Vec<String>, HashMap<String, TopicDefinition>) {
    use crate::Emotion::*;
    let mut order = Vec::new();
    let mut m = HashMap::new();

    let mut insert = |order: &mut Vec<String>, m: &mut HashMap<String, TopicDefinition>, name: &str, def: TopicDefinition| {
        order.push(name.to_string());
        m.insert(name.to_string(), def);
    };

    insert(
        &mut order,
        &mut m,
        "father",
        TopicDefinition {
            keywords: vec!["father".to_string(), "dad".to_string()],
            default_deltas: HashMap::from([(Loneliness, -0.1), (Trust, 0.05)]),
        },
    );
    insert(
        &mut order,
        &mut m,
        "death",
        TopicDefinition {
            keywords: vec!["death".to_string(), "died".to_string(), "funeral".to_string()],
            default_deltas: HashMap::from([(Fear, 0.2), (Anxiety, 0.15), (Happiness, -0.1)]),
        },
    );
    insert(
        &mut order,
        &mut m,
        "betrayal",
        TopicDefinition {
            keywords: vec!["betrayed".to_string(), "backstab".to_string(), "lied to me".to_string()],
            default_deltas: HashMap::from([(Anger, 0.2), (Trust, -0.25)]),
        },
    );
    insert(
        &mut order,
        &mut m,
        "praise",
        TopicDefinition {
            keywords: vec!["proud of you".to_string(), "well done".to_string()],
            default_deltas: HashMap::from([(Happiness, 0.2), (Confidence, 0.15)]),
        },
    );

    (order, m)
}

struct TopicRegistry {
    order: Vec<String>,
    topics: HashMap<String, TopicDefinition>,
}

static TOPIC_REGISTRY: LazyLock<RwLock<TopicRegistry>> = LazyLock::new(|| {
    let (order, topics) = default_topics();
    RwLock::new(TopicRegistry { order, topics })
});

/// Register or overwrite a topic in the process-wide registry. Safe to call
/// before the first `Character` is constructed only.
pub fn register_topic(name: impl Into<String>, definition: TopicDefinition) {
    let mut registry = TOPIC_REGISTRY.write().expect("topic registry poisoned");
    let name = name.into();
    if !registry.topics.contains_key(&name) {
        registry.order.push(name.clone());
    }
    registry.topics.insert(name, definition);
}

fn word_boundary_regex(keyword: &str) -> Regex {
    let escaped = regex::escape(keyword);
    Regex::new(&format!(r"(?i)(?:^|[^\w]){escaped}(?:[^\w]|$)")).expect("valid generated regex")
}

fn keyword_matches(text: &str, keyword: &str) -> bool {
    word_boundary_regex(keyword).is_match(text)
}

/// Per-character sensitivity override for a topic.
#[derive(Debug, Clone)]
pub struct Sensitivity {
    /// Per-character override deltas; falls back to the topic default when absent.
    pub override_deltas: Option<EmotionDeltas>,
    /// Current multiplier applied to the effective deltas.
    pub intensity: f32,
    /// How much `intensity` decreases per fire.
    pub desensitize_rate: f32,
    /// The floor `intensity` may never cross.
    pub min_intensity: f32,
    /// Count of times this topic has fired for this character.
    pub times_triggered: u32,
}

impl Sensitivity {
    /// A sensitivity starting at full intensity with a given desensitisation rate and floor.
    pub fn new(desensitize_rate: f32, min_intensity: f32) -> Self {
        Self { override_deltas: None, intensity: 1.0, desensitize_rate, min_intensity, times_triggered: 0 }
    }

    /// Override the topic's default deltas for this character.
    pub fn with_override_deltas(mut self, deltas: EmotionDeltas) -> Self {
        self.override_deltas = Some(deltas);
        self
    }
}

/// A topic that fired on a scan, with the deltas actually applied after
/// personality scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredTopic {
    /// The topic name that fired.
    pub topic: String,
    /// Actually-applied per-emotion deltas, after personality scaling via `nudge`.
    pub applied: EmotionDeltas,
}

/// Per-character Triggers sub-state.
#[derive(Debug, Clone, Default)]
pub struct TriggerState {
    sensitivities: HashMap<String, Sensitivity>,
    cooldowns: HashMap<String, u32>,
}

impl TriggerState {
    /// All topics carrying a per-character sensitivity override.
    pub fn sensitive_topics(&self) -> Vec<&str> {
        self.sensitivities.keys().map(String::as_str).collect()
    }
}

impl crate::Character {
    /// Install the Triggers layer with optional per-topic sensitivity overrides.
    pub fn init_triggers(&mut self, sensitivities: HashMap<String, Sensitivity>) {
        self.triggers = Some(TriggerState { sensitivities, cooldowns: HashMap::new() });
    }

    /// Read-only access to the Triggers sub-state, if installed.
    pub fn triggers(&self) -> Option<&TriggerState> {
        self.triggers.as_ref()
    }

    /// Decrement every positive cooldown by one turn; zero values stay zero.
    /// Call before `process_text` on a new turn.
    pub fn advance_turn(&mut self) -> Result<()> {
        let state = self
            .triggers
            .as_mut()
            .ok_or(crate::SoulError::LayerNotInitialized("triggers"))?;
        for cooldown in state.cooldowns.values_mut() {
            if *cooldown > 0 {
                *cooldown -= 1;
            }
        }
        Ok(())
    }

    /// Scan `text` for every topic not currently on cooldown, firing the
    /// first keyword match per topic in registration order. Each fired
    /// topic nudges core emotions and is placed on cooldown.
    pub fn process_text(&mut self, text: &str) -> Result<Vec<FiredTopic>> {
        if self.triggers.is_none() {
            return Err(crate::SoulError::LayerNotInitialized("triggers"));
        }

        let registry = TOPIC_REGISTRY.read().expect("topic registry poisoned");
        let candidates: Vec<String> = registry
            .order
            .iter()
            .filter(|name| {
                let on_cooldown = self
                    .triggers
                    .as_ref()
                    .and_then(|s| s.cooldowns.get(*name))
                    .copied()
                    .unwrap_or(0)
                    > 0;
                !on_cooldown
                    && registry
                        .topics
                        .get(*name)
                        .is_some_and(|def| def.keywords.iter().any(|kw| keyword_matches(text, kw)))
            })
            .cloned()
            .collect();
        drop(registry);

        let mut fired = Vec::new();
        for topic in candidates {
            if let Some(result) = self.trigger_topic(&topic)? {
                fired.push(result);
            }
        }
        Ok(fired)
    }

    /// Fire a single named topic directly, bypassing the text scan.
    /// Errors with `UnknownTopic` if the name isn't in the process-wide
    /// registry. Returns `None` if the topic is currently on cooldown.
    pub fn trigger_topic(&mut self, name: &str) -> Result<Option<FiredTopic>> {
        if self.triggers.is_none() {
            return Err(crate::SoulError::LayerNotInitialized("triggers"));
        }

        let on_cooldown = self
            .triggers
            .as_ref()
            .and_then(|s| s.cooldowns.get(name))
            .copied()
            .unwrap_or(0)
            > 0;
        if on_cooldown {
            return Ok(None);
        }

        let default_deltas = {
            let registry = TOPIC_REGISTRY.read().expect("topic registry poisoned");
            registry
                .topics
                .get(name)
                .ok_or_else(|| crate::SoulError::UnknownTopic(name.to_string()))?
                .default_deltas
                .clone()
        };

        let (effective_deltas, effective_intensity) = {
            let state = self.triggers.as_ref().unwrap();
            match state.sensitivities.get(name) {
                Some(sens) => (sens.override_deltas.clone().unwrap_or(default_deltas), sens.intensity),
                None => (default_deltas, 1.0),
            }
        };

        let mut applied = EmotionDeltas::new();
        for (emotion, delta) in effective_deltas {
            let actual = self.nudge(emotion, delta * effective_intensity);
            applied.insert(emotion, actual);
        }

        let state = self.triggers.as_mut().unwrap();
        if let Some(sens) = state.sensitivities.get_mut(name) {
            sens.times_triggered += 1;
            sens.intensity = (sens.intensity - sens.desensitize_rate).max(sens.min_intensity);
        }
        state.cooldowns.insert(name.to_string(), DEFAULT_COOLDOWN);

        tracing::debug!(topic = name, "trigger fired");
        Ok(Some(FiredTopic { topic: name.to_string(), applied }))
    }

    /// Names of every topic carrying a per-character sensitivity override.
    pub fn get_sensitive_topics(&self) -> Result<Vec<String>> {
        let state = self.triggers.as_ref().ok_or(crate::SoulError::LayerNotInitialized("triggers"))?;
        Ok(state.sensitive_topics().into_iter().map(String::from).collect())
    }

    /// Sensitive topics ordered most-desensitised first (lowest current
    /// intensity) — the ranking a downstream prompt builder would use to
    /// surface which topics this character has grown numb to.
    pub fn most_desensitized_topics(&self) -> Result<Vec<(String, f32)>> {
        use ordered_float::OrderedFloat;
        let state = self.triggers.as_ref().ok_or(crate::SoulError::LayerNotInitialized("triggers"))?;
        let mut ranked: Vec<(String, f32)> = state
            .sensitivities
            .iter()
            .map(|(topic, sens)| (topic.clone(), sens.intensity))
            .collect();
        ranked.sort_by_key(|(_, intensity)| OrderedFloat(*intensity));
        Ok(ranked)
    }
}
