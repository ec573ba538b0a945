//! Debate format tables.
//!
//! The engine runs three parliamentary formats (Asian Parliamentary,
//! British Parliamentary, World Schools) plus a freeform one-on-one
//! exchange. A format is a fixed table: an ordered list of speaker slots,
//! per-slot timings, and the rules text shown before a session starts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DebateError;

/// Identifies a debate format in session documents and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatKind {
    /// Asian Parliamentary: two teams of three.
    #[serde(rename = "AP")]
    Ap,
    /// British Parliamentary: four benches of two.
    #[serde(rename = "BP")]
    Bp,
    /// World Schools: three substantive speakers a side plus reply speeches.
    #[serde(rename = "WS")]
    Ws,
    /// Freeform one-on-one exchange with no fixed order or clock.
    #[serde(rename = "freeform")]
    OneVOne,
}

/// One position in a format's speaking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerSlot {
    pub role: String,
    pub team: String,
}

impl SpeakerSlot {
    fn new(role: &str, team: &str) -> Self {
        Self {
            role: role.to_string(),
            team: team.to_string(),
        }
    }
}

/// A role with the longer job description shown on the rules screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDescription {
    pub role: String,
    pub description: String,
}

impl RoleDescription {
    fn new(role: &str, description: &str) -> Self {
        Self {
            role: role.to_string(),
            description: description.to_string(),
        }
    }
}

/// The display document for a format, sent with the create-session payload
/// and rendered by the rules screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDetails {
    pub name: String,
    pub teams: String,
    pub structure: String,
    pub prep_time: String,
    pub speech_time: String,
    pub speaker_order: Vec<SpeakerSlot>,
    pub rules: Vec<String>,
    pub roles: Vec<String>,
    pub total_speakers: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speaker_roles_detailed: Vec<RoleDescription>,
}

impl FormatKind {
    /// Parses a user-facing format token.
    pub fn parse(token: &str) -> Result<Self, DebateError> {
        match token.to_lowercase().as_str() {
            "ap" | "asian" => Ok(FormatKind::Ap),
            "bp" | "british" => Ok(FormatKind::Bp),
            "ws" | "worlds" | "world-schools" => Ok(FormatKind::Ws),
            "1v1" | "freeform" => Ok(FormatKind::OneVOne),
            _ => Err(DebateError::UnknownFormat(token.to_string())),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FormatKind::Ap => "Asian Parliamentary (AP)",
            FormatKind::Bp => "British Parliamentary (BP)",
            FormatKind::Ws => "World Schools (WS)",
            FormatKind::OneVOne => "Freeform 1v1",
        }
    }

    /// The fixed speaking order. Empty for the freeform exchange.
    pub fn speaker_order(&self) -> Vec<SpeakerSlot> {
        match self {
            FormatKind::Ap => vec![
                SpeakerSlot::new("Prime Minister", "Government"),
                SpeakerSlot::new("Leader Of Opposition", "Opposition"),
                SpeakerSlot::new("Deputy Prime Minister", "Government"),
                SpeakerSlot::new("Deputy Leader of Opposition", "Opposition"),
                SpeakerSlot::new("Government Whip", "Government"),
                SpeakerSlot::new("Opposition Whip", "Opposition"),
            ],
            FormatKind::Bp => vec![
                SpeakerSlot::new("Prime Minister", "Opening Government"),
                SpeakerSlot::new("Leader of Opposition", "Opening Opposition"),
                SpeakerSlot::new("Deputy Prime Minister", "Opening Government"),
                SpeakerSlot::new("Deputy Leader of Opposition", "Opening Opposition"),
                SpeakerSlot::new("Member of Government", "Closing Government"),
                SpeakerSlot::new("Member of Opposition", "Closing Opposition"),
                SpeakerSlot::new("Government Whip", "Closing Government"),
                SpeakerSlot::new("Opposition Whip", "Closing Opposition"),
            ],
            FormatKind::Ws => vec![
                SpeakerSlot::new("First Proposition", "Proposition"),
                SpeakerSlot::new("First Opposition", "Opposition"),
                SpeakerSlot::new("Second Proposition", "Proposition"),
                SpeakerSlot::new("Second Opposition", "Opposition"),
                SpeakerSlot::new("Third Proposition", "Proposition"),
                SpeakerSlot::new("Third Opposition", "Opposition"),
                SpeakerSlot::new("Opposition Reply", "Opposition"),
                SpeakerSlot::new("Proposition Reply", "Proposition"),
            ],
            FormatKind::OneVOne => Vec::new(),
        }
    }

    /// Preparation time before the first speech.
    pub fn prep_secs(&self) -> u32 {
        match self {
            FormatKind::Ap => 25 * 60,
            FormatKind::Bp => 15 * 60,
            FormatKind::Ws => 30 * 60,
            FormatKind::OneVOne => 0,
        }
    }

    /// Allotted speaking time for the slot at `index` in the speaking order.
    pub fn speech_secs(&self, index: usize) -> u32 {
        match self {
            FormatKind::Ap | FormatKind::Bp => 7 * 60,
            // Slots 6 and 7 are the reply speeches.
            FormatKind::Ws if index >= 6 => 4 * 60,
            FormatKind::Ws => 8 * 60,
            FormatKind::OneVOne => 0,
        }
    }

    pub fn total_speakers(&self) -> usize {
        match self {
            FormatKind::Ap => 6,
            FormatKind::Bp | FormatKind::Ws => 8,
            FormatKind::OneVOne => 0,
        }
    }

    /// Role names with their abbreviations, as offered on the setup screen.
    pub fn role_names(&self) -> Vec<&'static str> {
        match self {
            FormatKind::Ap => vec![
                "Prime Minister (PM)",
                "Leader Of Opposition (LO)",
                "Deputy Prime Minister (DPM)",
                "Deputy Leader of Opposition (DLO)",
                "Government Whip (GW)",
                "Opposition Whip (OW)",
            ],
            FormatKind::Bp => vec![
                "Prime Minister (PM)",
                "Deputy Prime Minister (DPM)",
                "Leader of Opposition (LO)",
                "Deputy Leader of Opposition (DLO)",
                "Member of Government (MG)",
                "Government Whip (GW)",
                "Member of Opposition (MO)",
                "Opposition Whip (OW)",
            ],
            FormatKind::Ws => vec![
                "First Proposition",
                "First Opposition",
                "Second Proposition",
                "Second Opposition",
                "Third Proposition",
                "Third Opposition",
                "Opposition Reply",
                "Proposition Reply",
            ],
            FormatKind::OneVOne => vec!["Government", "Opposition"],
        }
    }

    /// Builds the display document for this format.
    pub fn details(&self) -> FormatDetails {
        let (name, teams, structure, prep_time, speech_time) = match self {
            FormatKind::Ap => (
                "Asian Parliamentary (AP)",
                "Government vs Opposition",
                "3 speakers per team",
                "25 minute prep time",
                "7-minute speeches, with Points of Information allowed",
            ),
            FormatKind::Bp => (
                "British Parliamentary (BP)",
                "4 teams of 2 speakers each",
                "Opening Government, Opening Opposition, Closing Government, Closing Opposition",
                "15 minute prep time",
                "7-minute speeches",
            ),
            FormatKind::Ws => (
                "World Schools (WS)",
                "2 teams of 3 speakers each",
                "3 speakers per team plus reply speeches",
                "Preparation time for some motions, impromptu for others",
                "8-minute substantive speeches, 4-minute reply speeches",
            ),
            FormatKind::OneVOne => (
                "Freeform 1v1",
                "Government vs Opposition",
                "Open exchange, one speaker per side",
                "No prep time",
                "Untimed turns",
            ),
        };
        FormatDetails {
            name: name.to_string(),
            teams: teams.to_string(),
            structure: structure.to_string(),
            prep_time: prep_time.to_string(),
            speech_time: speech_time.to_string(),
            speaker_order: self.speaker_order(),
            rules: self.rules().into_iter().map(str::to_string).collect(),
            roles: self.role_names().into_iter().map(str::to_string).collect(),
            total_speakers: self.total_speakers(),
            speaker_roles_detailed: self.role_descriptions(),
        }
    }

    fn rules(&self) -> Vec<&'static str> {
        match self {
            FormatKind::Ap => vec![
                "The first speakers on each side set the arguments and their bases.",
                "The second speakers extend on these arguments and rebuts opposing views.",
                "The third speaker defends their case and opposes the other case.",
                "No new content allowed in the whip speeches.",
                "Emphasis on substantive argumentation and case building.",
            ],
            FormatKind::Bp => vec![
                "Opening benches provide a case and build on it.",
                "Closing benches try to undo opposing cases and make their own cases and prove their uniqueness.",
                "No new content allowed in whip speeches.",
                "All 4 teams ranked 1st -> 4th, giving 24 possible outcomes.",
                "Each position has specific roles and responsibilities.",
            ],
            FormatKind::Ws => vec![
                "Popular in school competitions.",
                "Each speaker has specific roles in building and rebutting cases.",
                "Reply speeches summarize the debate and weigh arguments, no new arguments allowed.",
            ],
            FormatKind::OneVOne => vec![
                "Turns alternate between the two sides.",
                "No fixed speaking order or clock.",
            ],
        }
    }

    fn role_descriptions(&self) -> Vec<RoleDescription> {
        match self {
            FormatKind::Ap => vec![
                RoleDescription::new(
                    "PM",
                    "characterises and establishes ideas, stakeholders and narratives that the government expects to be followed throughout the debate.",
                ),
                RoleDescription::new(
                    "LO",
                    "lays out the necessary characterisation for side opp. Also challenges uncharitable characterisation on the government's part, if any.",
                ),
                RoleDescription::new(
                    "DPM/DLO",
                    "argumentation, raises points that are in their favour.",
                ),
                RoleDescription::new(
                    "Whips (both)",
                    "rebut the other side. If rebuttal is not possible then show why the clash is won by neither side. If that too is out of scope then show why the point the other side wins on is less significant than what your side wins on. Basically weighs and identifies the clashes based on factors such as scale, vulnerability of stakeholders, frequency of harm etc.",
                ),
            ],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            FormatKind::Ap => "AP",
            FormatKind::Bp => "BP",
            FormatKind::Ws => "WS",
            FormatKind::OneVOne => "freeform",
        };
        write!(f, "{token}")
    }
}

/// List the format tokens accepted by [`FormatKind::parse`].
pub fn available_formats() -> Vec<&'static str> {
    vec!["ap", "bp", "ws", "1v1"]
}
