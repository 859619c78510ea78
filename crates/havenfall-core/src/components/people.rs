//! Human components: vitals, profession, behavior state, build tasks.

use super::common::Vec2;
use serde::{Deserialize, Serialize};

/// Core human component — vitals, carried resources, anchors and timers.
/// Behavior state lives in [`AgentState`]; an active construction
/// assignment in [`BuildTask`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Human {
    pub gender: Gender,
    pub age: f32,
    /// Rises toward 100; fatal at the cap.
    pub hunger: f32,
    /// Rises toward 100; fatal at the cap.
    pub thirst: f32,
    pub wood: f32,
    pub stone: f32,
    pub meat: f32,
    pub sick: bool,
    pub profession: Option<Profession>,
    pub role: Option<Role>,
    /// Anchor point wandering and build-spot probing center on.
    pub home: Vec2,
    pub reproduce_cooldown: f32,
    pub build_cooldown: f32,
    /// Render-only marker for the current visible action.
    pub action: ActionMarker,
    /// Last heading taken, for sprite facing.
    pub facing: f32,
    /// Whether the agent moved this tick (render-only).
    pub moving: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn opposite(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }
}

/// Fixed profession enumeration, rolled once the professions tech unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profession {
    Healer,
    Builder,
    Hunter,
    Farmer,
    Sheriff,
    Diplomat,
    Prophet,
}

/// Special roles granted by disasters rather than the profession roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// The herald instantiated by the prophet-call disaster. Stationary,
    /// permanently praying, needs strongly relieved.
    SummonedProphet,
}

/// Explicit behavior state. Transitions follow the priority-ordered goal
/// table in the behavior system; death is modeled as entity removal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AgentState {
    /// Serving a sentence; needs accrue slowly, nothing else runs.
    Jailed { remaining: f32 },
    /// Heading toward the active prophet call.
    AnsweringCall { target: Target },
    /// Stationary prayer at the call site (or as the summoned prophet).
    Praying,
    /// No target; a goal is rolled on the next decision pass.
    Idle,
    /// Walking toward a target.
    Traveling { target: Target },
    /// Sheltering; `inside` hides the agent from rendering at night.
    Resting { inside: bool },
}

impl AgentState {
    pub fn target(&self) -> Option<&Target> {
        match self {
            Self::Traveling { target } | Self::AnsweringCall { target } => Some(target),
            _ => None,
        }
    }

    pub fn is_resting(&self) -> bool {
        matches!(self, Self::Resting { .. } | Self::Praying)
    }
}

/// A travel destination plus the semantic reason for going there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub pos: Vec2,
    pub intent: TargetIntent,
}

impl Target {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            intent: TargetIntent::Move,
        }
    }

    pub fn with_intent(pos: Vec2, intent: TargetIntent) -> Self {
        Self { pos, intent }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetIntent {
    /// Plain movement; arrival just clears the target.
    Move,
    /// Kill a living animal on arrival.
    Hunt,
    /// Catch a fish on arrival.
    Fish,
    /// Converge on the prophet call.
    Gather,
}

/// Construction assignment. Holds a non-owning handle into the building
/// collection; validated for existence every tick because disasters may
/// remove the site while the agent is still assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTask {
    pub site: hecs::Entity,
    pub kind: BuildTaskKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildTaskKind {
    NewSite,
    Upgrade,
}

/// Transient visible-action marker, consumed only by rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionMarker {
    pub kind: Option<ActionKind>,
    pub time_left: f32,
}

impl ActionMarker {
    pub fn set(&mut self, kind: ActionKind, duration: f32) {
        self.kind = Some(kind);
        self.time_left = duration;
    }

    pub fn clear(&mut self) {
        self.kind = None;
        self.time_left = 0.0;
    }

    /// Tick the marker down, clearing the action when it expires.
    pub fn update(&mut self, dt: f32) {
        if self.time_left > 0.0 {
            self.time_left = (self.time_left - dt).max(0.0);
            if self.time_left == 0.0 {
                self.kind = None;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Chop,
    Farm,
    Build,
    Eat,
    Hunt,
    Pray,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_opposite() {
        assert_eq!(Gender::Male.opposite(), Gender::Female);
        assert_eq!(Gender::Female.opposite(), Gender::Male);
    }

    #[test]
    fn test_state_target_accessor() {
        let state = AgentState::Traveling {
            target: Target::at(Vec2::new(3.0, 4.0)),
        };
        assert_eq!(state.target().unwrap().pos, Vec2::new(3.0, 4.0));
        assert!(AgentState::Idle.target().is_none());
        let call = AgentState::AnsweringCall {
            target: Target::with_intent(Vec2::ZERO, TargetIntent::Gather),
        };
        assert_eq!(call.target().unwrap().intent, TargetIntent::Gather);
    }

    #[test]
    fn test_action_marker_expires() {
        let mut marker = ActionMarker::default();
        marker.set(ActionKind::Chop, 0.4);
        marker.update(0.3);
        assert_eq!(marker.kind, Some(ActionKind::Chop));
        marker.update(0.2);
        assert_eq!(marker.kind, None);
    }
}
