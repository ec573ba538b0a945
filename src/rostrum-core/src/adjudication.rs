//! Adjudication documents and transcript upload.
//!
//! The adjudicator is an AI judge living behind the backend. This module
//! carries its verdict documents plus the client side of the transcript
//! upload flow: file validation before anything touches the network, and
//! the team rosters a user can assign speaker names to.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DebateError, Result};
use crate::format::FormatKind;

const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// A full verdict for a debate session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjudication {
    pub overall_winner: String,
    #[serde(default)]
    pub team_rankings: Vec<TeamRanking>,
    #[serde(default)]
    pub scorecard: BTreeMap<String, TeamScore>,
    #[serde(default)]
    pub chain_of_thought: Option<ChainOfThought>,
    #[serde(default)]
    pub detailed_feedback: Option<DetailedFeedback>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRanking {
    pub rank: u32,
    pub team: String,
    pub score: f64,
}

/// Matter, manner and method marks for one team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamScore {
    pub matter: f64,
    pub manner: f64,
    pub method: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// The judge's reasoning: the clashes it identified and how it weighed them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainOfThought {
    pub title: String,
    #[serde(default)]
    pub clashes: Vec<Clash>,
}

/// A point of contention between the teams. `weight` is the share of the
/// decision this clash carried, in `0..=1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clash {
    #[serde(default)]
    pub id: Option<u32>,
    pub title: String,
    pub weight: f64,
    pub winner: String,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedFeedback {
    #[serde(default)]
    pub speakers: Vec<SpeakerFeedback>,
    #[serde(default)]
    pub reply_speeches: Option<ReplySpeeches>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerFeedback {
    pub name: String,
    pub team: String,
    pub scores: SpeakerScores,
    #[serde(default)]
    pub role_fulfillment: Option<String>,
    #[serde(default)]
    pub rhetorical_analysis: Option<String>,
    #[serde(default)]
    pub timestamped_comments: Vec<TimestampedComment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerScores {
    pub total: f64,
    pub matter: f64,
    pub manner: f64,
    pub method: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedComment {
    pub time: String,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplySpeeches {
    pub proposition: ReplySpeech,
    pub opposition: ReplySpeech,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplySpeech {
    pub speaker: String,
    pub score: f64,
    pub summary: String,
}

/// What comes back from a transcript upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAdjudication {
    #[serde(rename = "_id")]
    pub id: String,
    pub overall_winner: String,
    pub format_name: String,
    #[serde(default)]
    pub original_file_name: Option<String>,
    #[serde(default)]
    pub motion: Option<String>,
}

/// A transcript upload in the making: the file, the format it was debated
/// under, and optionally the motion and who spoke for each team.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: PathBuf,
    pub format_name: String,
    pub motion: Option<String>,
    pub teams: BTreeMap<String, Vec<String>>,
}

impl UploadRequest {
    pub fn new(file: impl Into<PathBuf>, format_name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            format_name: format_name.into(),
            motion: None,
            teams: BTreeMap::new(),
        }
    }

    pub fn with_motion(mut self, motion: impl Into<String>) -> Self {
        self.motion = Some(motion.into());
        self
    }

    /// Assigns speaker names to a team. The key is normalized the way the
    /// backend expects it.
    pub fn with_team(mut self, team: &str, speakers: Vec<String>) -> Self {
        self.teams.insert(team_key(team), speakers);
        self
    }

    /// Checks the transcript file before any network traffic: it must
    /// exist, be non-empty, carry a `.pdf` or `.txt` extension, stay under
    /// the upload cap, and a text file must contain something besides
    /// whitespace.
    pub fn validate(&self) -> Result<()> {
        let meta = fs::metadata(&self.file).map_err(|_| {
            DebateError::Validation(format!("transcript file not found: {}", self.file.display()))
        })?;
        if meta.len() == 0 {
            return Err(DebateError::Validation(
                "the selected file appears to be empty".to_string(),
            ));
        }
        if meta.len() > MAX_UPLOAD_BYTES {
            return Err(DebateError::Validation(format!(
                "transcript file exceeds the {} MB upload limit",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }
        match self.extension().as_deref() {
            Some("pdf") => Ok(()),
            Some("txt") => {
                let content = fs::read_to_string(&self.file)?;
                if content.trim().is_empty() {
                    Err(DebateError::Validation(
                        "the selected text file appears to be empty".to_string(),
                    ))
                } else {
                    Ok(())
                }
            }
            _ => Err(DebateError::Validation(
                "please select a PDF or TXT file".to_string(),
            )),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("pdf") => "application/pdf",
            _ => "text/plain",
        }
    }

    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "transcript.txt".to_string())
    }

    /// The `teams` multipart field, or `None` when no names were assigned.
    pub fn teams_json(&self) -> Option<String> {
        let assigned: BTreeMap<&String, &Vec<String>> = self
            .teams
            .iter()
            .filter(|(_, speakers)| !speakers.is_empty())
            .collect();
        if assigned.is_empty() {
            return None;
        }
        serde_json::to_string(&assigned).ok()
    }

    fn extension(&self) -> Option<String> {
        self.file
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// Normalizes a team name into the backend's map key: lowercased, spaces
/// removed.
pub fn team_key(team: &str) -> String {
    team.to_lowercase().replace(' ', "")
}

/// The format name expected by the upload endpoint.
pub fn upload_format_name(format: FormatKind) -> Result<&'static str> {
    match format {
        FormatKind::Ap => Ok("Asian Parliamentary"),
        FormatKind::Bp => Ok("British Parliamentary"),
        FormatKind::Ws => Ok("World Schools"),
        FormatKind::OneVOne => Err(DebateError::Validation(
            "freeform debates cannot be adjudicated from an upload".to_string(),
        )),
    }
}

/// A team with the speaker positions a user can fill in for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRoster {
    pub team: &'static str,
    pub speakers: Vec<&'static str>,
}

/// The teams each upload format expects names for.
pub fn team_rosters(format: FormatKind) -> Vec<TeamRoster> {
    match format {
        FormatKind::Ap => vec![
            TeamRoster {
                team: "Government",
                speakers: vec![
                    "Prime Minister",
                    "Deputy Prime Minister",
                    "Government Whip",
                ],
            },
            TeamRoster {
                team: "Opposition",
                speakers: vec![
                    "Leader of Opposition",
                    "Deputy Leader of Opposition",
                    "Opposition Whip",
                ],
            },
        ],
        FormatKind::Bp => vec![
            TeamRoster {
                team: "Opening Government",
                speakers: vec!["Prime Minister", "Deputy Prime Minister"],
            },
            TeamRoster {
                team: "Opening Opposition",
                speakers: vec!["Leader of Opposition", "Deputy Leader of Opposition"],
            },
            TeamRoster {
                team: "Closing Government",
                speakers: vec!["Member of Government", "Government Whip"],
            },
            TeamRoster {
                team: "Closing Opposition",
                speakers: vec!["Member of Opposition", "Opposition Whip"],
            },
        ],
        FormatKind::Ws => vec![
            TeamRoster {
                team: "Proposition",
                speakers: vec!["1st Speaker", "2nd Speaker", "3rd Speaker", "Reply Speaker"],
            },
            TeamRoster {
                team: "Opposition",
                speakers: vec!["1st Speaker", "2nd Speaker", "3rd Speaker", "Reply Speaker"],
            },
        ],
        FormatKind::OneVOne => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_adjudication_json() -> serde_json::Value {
        serde_json::json!({
            "overallWinner": "Opening Government",
            "teamRankings": [
                { "rank": 1, "team": "Opening Government", "score": 82.5 },
                { "rank": 2, "team": "Closing Opposition", "score": 79.0 }
            ],
            "scorecard": {
                "Opening Government": { "matter": 84, "manner": 80, "method": 83, "color": "cyan" }
            },
            "chainOfThought": {
                "title": "Chain of Thought Analysis",
                "clashes": [
                    {
                        "id": 1,
                        "title": "Does the policy reduce harm?",
                        "weight": 0.65,
                        "winner": "Opening Government",
                        "summary": "Government's mechanism survived the rebuttal."
                    }
                ]
            },
            "detailedFeedback": {
                "speakers": [
                    {
                        "name": "Prime Minister",
                        "team": "Opening Government",
                        "scores": { "total": 82, "matter": 84, "manner": 80, "method": 83 },
                        "roleFulfillment": "Set up the case cleanly.",
                        "rhetoricalAnalysis": "Strong signposting.",
                        "timestampedComments": [
                            { "time": "01:12", "comment": "Good framing of the stakeholders." }
                        ]
                    }
                ],
                "replySpeeches": {
                    "proposition": { "speaker": "Proposition Reply", "score": 39, "summary": "Tidy weighing." },
                    "opposition": { "speaker": "Opposition Reply", "score": 37, "summary": "Missed the main clash." }
                }
            }
        })
    }

    #[test]
    fn test_adjudication_decodes_full_document() {
        let adj: Adjudication = serde_json::from_value(sample_adjudication_json()).unwrap();
        assert_eq!(adj.overall_winner, "Opening Government");
        assert_eq!(adj.team_rankings.len(), 2);
        let cot = adj.chain_of_thought.unwrap();
        assert_eq!(cot.clashes[0].weight, 0.65);
        let feedback = adj.detailed_feedback.unwrap();
        assert_eq!(feedback.speakers[0].scores.total, 82.0);
        assert_eq!(
            feedback.reply_speeches.unwrap().opposition.speaker,
            "Opposition Reply"
        );
    }

    #[test]
    fn test_adjudication_tolerates_minimal_document() {
        let adj: Adjudication =
            serde_json::from_value(serde_json::json!({ "overallWinner": "Government" })).unwrap();
        assert!(adj.team_rankings.is_empty());
        assert!(adj.chain_of_thought.is_none());
    }

    #[test]
    fn test_validate_rejects_missing_and_empty_files() {
        let missing = UploadRequest::new("/no/such/file.txt", "Asian Parliamentary");
        assert!(matches!(
            missing.validate(),
            Err(DebateError::Validation(_))
        ));

        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let empty = UploadRequest::new(file.path(), "Asian Parliamentary");
        assert!(matches!(empty.validate(), Err(DebateError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_oversized_file() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.as_file().set_len(11 * 1024 * 1024).unwrap();
        let request = UploadRequest::new(file.path(), "Asian Parliamentary");
        let err = request.validate().unwrap_err();
        assert!(matches!(err, DebateError::Validation(_)));
        assert!(err.to_string().contains("10 MB upload limit"));
    }

    #[test]
    fn test_validate_rejects_wrong_extension() {
        let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        writeln!(file, "some transcript").unwrap();
        let request = UploadRequest::new(file.path(), "World Schools");
        assert!(matches!(
            request.validate(),
            Err(DebateError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_text_content() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "   \n\t  ").unwrap();
        let request = UploadRequest::new(file.path(), "Asian Parliamentary");
        assert!(matches!(
            request.validate(),
            Err(DebateError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_accepts_real_transcript() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "PM: This House believes...").unwrap();
        let request = UploadRequest::new(file.path(), "Asian Parliamentary");
        assert!(request.validate().is_ok());
        assert_eq!(request.mime_type(), "text/plain");
    }

    #[test]
    fn test_team_key_normalization() {
        assert_eq!(team_key("Opening Government"), "openinggovernment");
        assert_eq!(team_key("Proposition"), "proposition");
    }

    #[test]
    fn test_teams_json_skips_empty_assignments() {
        let request = UploadRequest::new("t.txt", "Asian Parliamentary")
            .with_team("Government", vec!["Alice".to_string(), "Bob".to_string()])
            .with_team("Opposition", vec![]);
        let json = request.teams_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["government"][0], "Alice");
        assert!(value.get("opposition").is_none());

        let none = UploadRequest::new("t.txt", "Asian Parliamentary");
        assert!(none.teams_json().is_none());
    }

    #[test]
    fn test_rosters_per_format() {
        assert_eq!(team_rosters(FormatKind::Ap).len(), 2);
        assert_eq!(team_rosters(FormatKind::Bp).len(), 4);
        let ws = team_rosters(FormatKind::Ws);
        assert_eq!(ws[0].speakers.last(), Some(&"Reply Speaker"));
        assert!(team_rosters(FormatKind::OneVOne).is_empty());
    }

    #[test]
    fn test_upload_format_names() {
        assert_eq!(
            upload_format_name(FormatKind::Bp).unwrap(),
            "British Parliamentary"
        );
        assert!(upload_format_name(FormatKind::OneVOne).is_err());
    }
}
