//! Blendshape gesture classification
//!
//! Turns a stream of per-frame blendshape scores into discrete, debounced
//! gesture events. The classifier only reports which gestures fired on a tick;
//! it knows nothing about navigation. Dispatch lives in [`crate::session`].
//!
//! A gesture fires when every one of its conditions holds for
//! `frames_required` consecutive ticks. Firing resets the run counter, so a
//! condition held steadily fires once per `frames_required` window rather
//! than on every frame.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single named blendshape score produced by the face model (0.0 - 1.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendshapeScore {
    pub name: String,
    pub score: f32,
}

impl BlendshapeScore {
    pub fn new(name: impl Into<String>, score: f32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Threshold comparison for a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Comparison {
    #[default]
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greater => ">",
            Self::Less => "<",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One threshold test against a named metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub metric: String,
    pub threshold: f32,
    #[serde(default)]
    pub comparison: Comparison,
}

impl Condition {
    pub fn above(metric: impl Into<String>, threshold: f32) -> Self {
        Self {
            metric: metric.into(),
            threshold,
            comparison: Comparison::Greater,
        }
    }

    pub fn below(metric: impl Into<String>, threshold: f32) -> Self {
        Self {
            metric: metric.into(),
            threshold,
            comparison: Comparison::Less,
        }
    }

    /// Evaluate against a score. Strict comparison in both directions.
    pub fn holds(&self, value: f32) -> bool {
        match self.comparison {
            Comparison::Greater => value > self.threshold,
            Comparison::Less => value < self.threshold,
        }
    }
}

/// Static description of a gesture: AND of all conditions, held for a run of frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureSpec {
    pub name: String,
    pub conditions: Vec<Condition>,
    #[serde(default = "default_frames_required")]
    pub frames_required: u32,
}

fn default_frames_required() -> u32 {
    1
}

impl GestureSpec {
    pub fn new(name: impl Into<String>, conditions: Vec<Condition>, frames_required: u32) -> Self {
        Self {
            name: name.into(),
            conditions,
            frames_required,
        }
    }
}

/// Built-in gesture vocabulary, in dispatch order
pub fn default_gestures() -> Vec<GestureSpec> {
    vec![
        GestureSpec::new("Select", vec![Condition::above("jawOpen", 0.4)], 1),
        GestureSpec::new("Left", vec![Condition::above("mouthLeft", 0.5)], 1),
        GestureSpec::new("Right", vec![Condition::above("mouthRight", 0.5)], 1),
        GestureSpec::new("Up", vec![Condition::above("browOuterUpLeft", 0.7)], 1),
        GestureSpec::new(
            "Down",
            vec![
                Condition::above("browDownLeft", 0.025),
                Condition::above("browDownRight", 0.025),
            ],
            1,
        ),
        GestureSpec::new(
            "Open keyboard",
            vec![
                Condition::above("mouthSmileLeft", 0.5),
                Condition::below("jawOpen", 0.15),
            ],
            1,
        ),
        GestureSpec::new(
            "Left Wink",
            vec![
                Condition::above("eyeBlinkLeft", 0.4),
                Condition::below("eyeBlinkRight", 0.3),
            ],
            1,
        ),
        GestureSpec::new(
            "Right Wink",
            vec![
                Condition::above("eyeBlinkRight", 0.4),
                Condition::below("eyeBlinkLeft", 0.3),
            ],
            1,
        ),
    ]
}

/// Edge-triggered classifier over a fixed gesture list
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    specs: Vec<GestureSpec>,
    /// Consecutive satisfied ticks, parallel to `specs`
    runs: Vec<u32>,
}

impl GestureClassifier {
    pub fn new(specs: Vec<GestureSpec>) -> Self {
        let specs: Vec<GestureSpec> = specs
            .into_iter()
            .map(|mut spec| {
                spec.frames_required = spec.frames_required.max(1);
                spec
            })
            .collect();
        let runs = vec![0; specs.len()];
        Self { specs, runs }
    }

    /// Feed one frame of scores. Returns the names of gestures that fired on
    /// this tick, in vocabulary order.
    ///
    /// A metric absent from the frame reads as 0.0. When a name appears more
    /// than once the last score wins.
    pub fn tick(&mut self, scores: &[BlendshapeScore]) -> Vec<String> {
        let latest: HashMap<&str, f32> = scores
            .iter()
            .map(|s| (s.name.as_str(), s.score))
            .collect();

        let mut fired = Vec::new();
        for (spec, run) in self.specs.iter().zip(self.runs.iter_mut()) {
            let satisfied = spec.conditions.iter().all(|condition| {
                let value = latest
                    .get(condition.metric.as_str())
                    .copied()
                    .unwrap_or(0.0);
                condition.holds(value)
            });

            if satisfied {
                *run += 1;
            } else {
                *run = 0;
            }

            if *run >= spec.frames_required {
                tracing::trace!(gesture = %spec.name, "gesture fired");
                fired.push(spec.name.clone());
                *run = 0;
            }
        }
        fired
    }

    /// Forget all partial runs
    pub fn reset(&mut self) {
        self.runs.iter_mut().for_each(|run| *run = 0);
    }
}
