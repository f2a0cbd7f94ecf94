//! Debate formats - named round structures

use rand::Rng;
use serde::Serialize;
use thiserror::Error;

/// Format lookup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Round index {index} is out of range for a {len}-round format")]
    OutOfRange { index: usize, len: usize },
}

/// One round of a format: a type tag and what speakers should do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundDescriptor {
    /// Round type tag recorded on transcript entries
    pub kind: &'static str,
    /// Instructions given to speakers
    pub description: &'static str,
}

const fn round(kind: &'static str, description: &'static str) -> RoundDescriptor {
    RoundDescriptor { kind, description }
}

/// A named, ordered round structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DebateFormat {
    pub name: &'static str,
    pub description: &'static str,
    pub rounds: &'static [RoundDescriptor],
}

impl DebateFormat {
    /// Number of rounds in the structure
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Descriptor for a 0-based round index
    pub fn descriptor_at(&self, index: usize) -> Result<&RoundDescriptor, FormatError> {
        self.rounds.get(index).ok_or(FormatError::OutOfRange {
            index,
            len: self.rounds.len(),
        })
    }
}

static FORMATS: &[DebateFormat] = &[
    DebateFormat {
        name: "classical",
        description: "Opening statements, rebuttals and closing arguments",
        rounds: &[
            round("opening", "Present your initial position on the topic."),
            round("rebuttal", "Respond directly to the arguments made by the others."),
            round("closing", "Summarize your position and make your final case."),
        ],
    },
    DebateFormat {
        name: "socratic",
        description: "Inquiry through questions, examination and refinement",
        rounds: &[
            round("initial_position", "State what you believe about the topic and why."),
            round("questioning", "Pose probing questions that test the positions stated so far."),
            round("examination", "Answer the questions put to you and examine their assumptions."),
            round("refinement", "Refine or revise your position in light of the inquiry."),
        ],
    },
    DebateFormat {
        name: "cross-examination",
        description: "Constructive speeches followed by direct cross-examination",
        rounds: &[
            round("constructive", "Build your case with clear claims and supporting reasons."),
            round("cross_examination", "Challenge a specific claim made by another participant."),
            round("defense", "Defend your case against the challenges raised."),
            round("closing", "Explain why your case survived the examination."),
        ],
    },
    DebateFormat {
        name: "value-based",
        description: "Debate over which values should govern the question",
        rounds: &[
            round("value_premise", "Name the value you believe matters most here and why."),
            round("criterion", "Propose how we should measure whether that value is upheld."),
            round("value_clash", "Weigh your value against those proposed by the others."),
            round("resolution", "Explain how your value best resolves the topic."),
        ],
    },
    DebateFormat {
        name: "policy-analysis",
        description: "Problem, proposal, consequences and recommendation",
        rounds: &[
            round("problem_analysis", "Describe the problem and what causes it."),
            round("proposal", "Propose a concrete course of action."),
            round("impact_assessment", "Assess the consequences and costs of the proposals made."),
            round("recommendation", "Give your final recommendation and its justification."),
        ],
    },
    DebateFormat {
        name: "parliamentary",
        description: "Government and opposition style exchange with points of information",
        rounds: &[
            round("opening_government", "Define the motion and make the case for it."),
            round("opening_opposition", "Contest the motion and the case made for it."),
            round("points_of_information", "Raise brief, pointed objections to specific arguments."),
            round("extension", "Introduce a new line of argument not yet covered."),
            round("whip", "Summarize the clash and explain why your side prevails."),
        ],
    },
];

/// Fixed catalog of debate formats
#[derive(Debug, Clone, Copy)]
pub struct FormatCatalog {
    formats: &'static [DebateFormat],
}

impl FormatCatalog {
    /// The built-in catalog
    pub fn builtin() -> Self {
        Self { formats: FORMATS }
    }

    pub fn formats(&self) -> &'static [DebateFormat] {
        self.formats
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Pick a format uniformly at random
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static DebateFormat {
        &self.formats[rng.random_range(0..self.formats.len())]
    }

    /// Find a format by name, case-insensitively
    pub fn by_name(&self, name: &str) -> Option<&'static DebateFormat> {
        self.formats
            .iter()
            .find(|format| format.name.eq_ignore_ascii_case(name))
    }
}

impl Default for FormatCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
