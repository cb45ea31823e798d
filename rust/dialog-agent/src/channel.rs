//! Logical channel names within a federation.
//!
//! Every agent role has a channel named `<federation>_<Role>`. The user agent
//! listens on three of them: problem solver feedback, speech input and text
//! input.

use std::fmt;

pub const SOLVER_SUFFIX: &str = "ProblemSolver";
pub const SPEECH_SUFFIX: &str = "SpeechAgent";
pub const TEXT_SUFFIX: &str = "TextAgent";

/// The role a channel plays for the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Solver,
    Speech,
    Text,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Solver => write!(f, "solver"),
            ChannelKind::Speech => write!(f, "speech"),
            ChannelKind::Text => write!(f, "text"),
        }
    }
}

/// Build a federation channel name from a role suffix.
pub fn channel_name(federation: &str, suffix: &str) -> String {
    format!("{federation}_{suffix}")
}

/// The three channel names of one federation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channels {
    pub solver: String,
    pub speech: String,
    pub text: String,
}

impl Channels {
    pub fn for_federation(federation: &str) -> Self {
        Channels {
            solver: channel_name(federation, SOLVER_SUFFIX),
            speech: channel_name(federation, SPEECH_SUFFIX),
            text: channel_name(federation, TEXT_SUFFIX),
        }
    }

    pub fn name(&self, kind: ChannelKind) -> &str {
        match kind {
            ChannelKind::Solver => &self.solver,
            ChannelKind::Speech => &self.speech,
            ChannelKind::Text => &self.text,
        }
    }

    /// Which of our channels a delivery arrived on, if any.
    pub fn classify(&self, name: &str) -> Option<ChannelKind> {
        [ChannelKind::Solver, ChannelKind::Speech, ChannelKind::Text]
            .into_iter()
            .find(|kind| self.name(*kind) == name)
    }

    pub fn all(&self) -> [&str; 3] {
        [&self.solver, &self.speech, &self.text]
    }
}
