//! Discrete interaction events.
//!
//! Platform adapters translate whatever happened on their side (a Discord
//! message, a failed task, a long silence) into one of these kinds. Events
//! are ephemeral: applied to the state, logged, then discarded.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of things that can happen to the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The user said something, on any platform.
    UserMessage,
    /// Something went wrong while trying to help.
    ErrorOccurred,
    /// A task completed and the user acknowledged it.
    SuccessfulHelp,
    /// The user has been coding without involving the companion.
    CodeNeglected,
    /// The user shared what they are building.
    CodeUpdated,
    /// A moment of real connection — opens the guard-down window.
    GenuineMoment,
    /// The companion reached out and got nothing back.
    PlatformIgnored,
    /// Warm, low-stakes back-and-forth.
    PositiveInteraction,
}

/// All event kinds, for table validation and CLI listings.
pub const ALL_EVENT_KINDS: [EventKind; 8] = [
    EventKind::UserMessage,
    EventKind::ErrorOccurred,
    EventKind::SuccessfulHelp,
    EventKind::CodeNeglected,
    EventKind::CodeUpdated,
    EventKind::GenuineMoment,
    EventKind::PlatformIgnored,
    EventKind::PositiveInteraction,
];

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::UserMessage => "user_message",
            EventKind::ErrorOccurred => "error_occurred",
            EventKind::SuccessfulHelp => "successful_help",
            EventKind::CodeNeglected => "code_neglected",
            EventKind::CodeUpdated => "code_updated",
            EventKind::GenuineMoment => "genuine_moment",
            EventKind::PlatformIgnored => "platform_ignored",
            EventKind::PositiveInteraction => "positive_interaction",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        ALL_EVENT_KINDS.iter().copied().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete occurrence of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub id: Uuid,
    pub kind: EventKind,
    /// Unix timestamp of when the event happened.
    pub timestamp: i64,
    /// Optional scale on the nominal delta vector, e.g. hours of neglect
    /// folded into a stronger `CodeNeglected`. `None` means 1.0.
    pub magnitude: Option<f32>,
}

impl InteractionEvent {
    pub fn new(kind: EventKind, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp,
            magnitude: None,
        }
    }

    /// Convenience for adapters: an event stamped with the current time.
    pub fn now(kind: EventKind) -> Self {
        Self::new(kind, chrono::Utc::now().timestamp())
    }

    pub fn with_magnitude(mut self, magnitude: f32) -> Self {
        self.magnitude = Some(magnitude);
        self
    }
}
