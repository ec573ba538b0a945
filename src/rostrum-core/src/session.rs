//! Session documents and their wire representation.
//!
//! These types mirror the backend's debate documents field for field, so a
//! fetched session deserializes straight into the engine's working state.
//! Tagged fields (status, entry kind, format) are enumerated types; anything
//! the backend could hand us that violates the model is caught by
//! [`DebateSession::validate`] right after decoding.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DebateError, Result};
use crate::format::{FormatDetails, FormatKind};

/// Lifecycle of a session: created in prep, ongoing once the first speaker
/// takes the floor, completed when the debate concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Prep,
    Ongoing,
    Completed,
}

/// What a transcript entry records: a delivered speech, or procedural
/// information (announcements, placeholders, error notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Speech,
    Info,
}

/// A single transcript line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn speech(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            kind: EntryKind::Speech,
            timestamp: Utc::now(),
        }
    }

    pub fn info(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            kind: EntryKind::Info,
            timestamp: Utc::now(),
        }
    }

    #[cfg(test)]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// One speaker slot filled with either the human user or an AI debater.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub role: String,
    pub team: String,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
}

impl Participant {
    /// Builds the full roster for a format, marking every slot except the
    /// user's own role as an AI debater.
    pub fn roster(format: FormatKind, user_role: &str) -> Vec<Participant> {
        format
            .speaker_order()
            .into_iter()
            .map(|slot| Participant {
                is_ai: slot.role != user_role,
                role: slot.role,
                team: slot.team,
            })
            .collect()
    }
}

/// Serde adapter for the backend's speaker-index convention: `-1` on the
/// wire means no active speaker.
pub(crate) mod wire_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(index: &Option<usize>, ser: S) -> Result<S::Ok, S::Error> {
        match index {
            Some(i) => ser.serialize_i64(*i as i64),
            None => ser.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(de)?;
        if raw < 0 { Ok(None) } else { Ok(Some(raw as usize)) }
    }
}

/// Same adapter lifted over a patch field, where the outer `Option` encodes
/// "field absent from the patch".
mod wire_index_field {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        field: &Option<Option<usize>>,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        match field {
            Some(index) => super::wire_index::serialize(index, ser),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<Option<Option<usize>>, D::Error> {
        super::wire_index::deserialize(de).map(Some)
    }
}

/// A debate session as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateSession {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub motion: String,
    #[serde(rename = "debateType")]
    pub format: FormatKind,
    pub user_role: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
    #[serde(default, with = "wire_index")]
    pub current_speaker_index: Option<usize>,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_details: Option<FormatDetails>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ai_skill_levels: BTreeMap<String, SkillLevel>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ai_personalities: BTreeMap<String, Personality>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ai_benchmarks: BTreeMap<String, Vec<Benchmark>>,
}

impl DebateSession {
    /// Boundary validation for documents coming off the wire.
    pub fn validate(&self) -> Result<()> {
        if let Some(index) = self.current_speaker_index {
            if index >= self.participants.len() {
                return Err(DebateError::Validation(format!(
                    "speaker index {index} out of bounds for {} participants",
                    self.participants.len()
                )));
            }
        }
        for participant in &self.participants {
            if participant.role.trim().is_empty() {
                return Err(DebateError::Validation(
                    "participant with empty role".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn current_speaker(&self) -> Option<&Participant> {
        self.current_speaker_index
            .and_then(|i| self.participants.get(i))
    }

    /// True while the human user holds the floor.
    pub fn is_user_turn(&self) -> bool {
        self.current_speaker()
            .is_some_and(|p| !p.is_ai && p.role == self.user_role)
    }

    /// Plain-text debrief: delivered speeches grouped by speaker in order of
    /// first appearance.
    pub fn summary(&self) -> String {
        summarize(&self.transcript)
    }
}

/// Groups delivered speeches by speaker, in order of first appearance.
pub fn summarize(entries: &[TranscriptEntry]) -> String {
    let mut speakers: Vec<&str> = Vec::new();
    for entry in entries {
        if entry.kind == EntryKind::Speech && !speakers.contains(&entry.speaker.as_str()) {
            speakers.push(&entry.speaker);
        }
    }
    let mut out = String::new();
    for speaker in speakers {
        out.push_str(speaker);
        out.push_str(":\n");
        for entry in entries {
            if entry.kind == EntryKind::Speech && entry.speaker == speaker {
                out.push_str("  ");
                out.push_str(&entry.text);
                out.push('\n');
            }
        }
        out.push('\n');
    }
    out
}

/// Partial update for `PUT /debates/{id}`; absent fields are left untouched
/// by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptEntry>>,
    #[serde(
        default,
        with = "wire_index_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_speaker_index: Option<Option<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
}

impl SessionPatch {
    pub fn transcript(entries: Vec<TranscriptEntry>) -> Self {
        Self {
            transcript: Some(entries),
            ..Self::default()
        }
    }

    pub fn with_speaker_index(mut self, index: Option<usize>) -> Self {
        self.current_speaker_index = Some(index);
        self
    }

    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Payload for `POST /debates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDebateRequest {
    pub title: String,
    #[serde(rename = "debateType")]
    pub debate_type: FormatKind,
    pub motion: String,
    pub user_role: String,
    pub status: SessionStatus,
    pub ai_skill_levels: BTreeMap<String, SkillLevel>,
    pub ai_personalities: BTreeMap<String, Personality>,
    pub ai_benchmarks: BTreeMap<String, Vec<Benchmark>>,
    pub format_details: FormatDetails,
}

impl CreateDebateRequest {
    /// A default-settings request: the motion doubles as the title, every AI
    /// slot debates at the given skill, and the custom maps stay empty.
    pub fn new(format: FormatKind, motion: impl Into<String>, user_role: impl Into<String>) -> Self {
        let motion = motion.into();
        Self {
            title: motion.clone(),
            debate_type: format,
            motion,
            user_role: user_role.into(),
            status: SessionStatus::Prep,
            ai_skill_levels: BTreeMap::new(),
            ai_personalities: BTreeMap::new(),
            ai_benchmarks: BTreeMap::new(),
            format_details: format.details(),
        }
    }

    /// Applies one skill level to every AI slot.
    pub fn with_skill(mut self, skill: SkillLevel) -> Self {
        for slot in self.debate_type.speaker_order() {
            if slot.role != self.user_role {
                self.ai_skill_levels.insert(slot.role.clone(), skill);
            }
        }
        self
    }

    /// Applies one personality to every AI slot.
    pub fn with_personality(mut self, personality: Personality) -> Self {
        for slot in self.debate_type.speaker_order() {
            if slot.role != self.user_role {
                self.ai_personalities.insert(slot.role.clone(), personality);
            }
        }
        self
    }

    /// Adds a benchmark focus to every AI slot. Slots carry a list, so
    /// repeated calls build it up; a focus appears at most once per slot.
    pub fn with_benchmark(mut self, benchmark: Benchmark) -> Self {
        for slot in self.debate_type.speaker_order() {
            if slot.role != self.user_role {
                let focuses = self.ai_benchmarks.entry(slot.role.clone()).or_default();
                if !focuses.contains(&benchmark) {
                    focuses.push(benchmark);
                }
            }
        }
        self
    }
}

/// How strong an AI debater should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn parse(token: &str) -> Result<Self> {
        match token.to_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            _ => Err(DebateError::Validation(format!(
                "unknown skill level: {token}"
            ))),
        }
    }
}

/// Speaking persona for an AI debater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Personality {
    Neutral,
    Aggressive,
    Calm,
    Analytical,
    Persuasive,
    Humorous,
}

impl Personality {
    pub fn parse(token: &str) -> Result<Self> {
        match token.to_lowercase().as_str() {
            "neutral" => Ok(Personality::Neutral),
            "aggressive" => Ok(Personality::Aggressive),
            "calm" => Ok(Personality::Calm),
            "analytical" => Ok(Personality::Analytical),
            "persuasive" => Ok(Personality::Persuasive),
            "humorous" => Ok(Personality::Humorous),
            _ => Err(DebateError::Validation(format!(
                "unknown personality: {token}"
            ))),
        }
    }
}

/// Which skill an AI debater should emphasise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Benchmark {
    #[serde(rename = "Focus on Rebuttals")]
    Rebuttals,
    #[serde(rename = "Focus on Case Building")]
    CaseBuilding,
    #[serde(rename = "Focus on POIs")]
    PointsOfInformation,
    #[serde(rename = "Focus on Summaries")]
    Summaries,
    #[serde(rename = "Focus on POOs")]
    PointsOfOrder,
}

impl Benchmark {
    pub fn parse(token: &str) -> Result<Self> {
        match token.to_lowercase().as_str() {
            "rebuttals" => Ok(Benchmark::Rebuttals),
            "case-building" | "case building" => Ok(Benchmark::CaseBuilding),
            "pois" => Ok(Benchmark::PointsOfInformation),
            "summaries" => Ok(Benchmark::Summaries),
            "poos" => Ok(Benchmark::PointsOfOrder),
            _ => Err(DebateError::Validation(format!(
                "unknown benchmark: {token}"
            ))),
        }
    }
}

/// Strips the abbreviation suffix from a role picked off a setup list, so
/// "Prime Minister (PM)" and "Prime Minister" name the same slot.
pub fn normalize_role(role: &str) -> &str {
    match role.split_once(" (") {
        Some((name, _)) => name,
        None => role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session_json() -> serde_json::Value {
        serde_json::json!({
            "_id": "64fa12",
            "title": "This House would ban targeted advertising",
            "motion": "This House would ban targeted advertising",
            "debateType": "AP",
            "userRole": "Prime Minister",
            "participants": [
                { "role": "Prime Minister", "team": "Government", "isAI": false },
                { "role": "Leader Of Opposition", "team": "Opposition", "isAI": true }
            ],
            "transcript": [],
            "currentSpeakerIndex": -1,
            "status": "prep",
            "aiBenchmarks": { "Leader Of Opposition": ["Focus on POIs"] }
        })
    }

    #[test]
    fn test_session_decodes_wire_document() {
        let session: DebateSession = serde_json::from_value(sample_session_json()).unwrap();
        assert_eq!(session.id, "64fa12");
        assert_eq!(session.format, FormatKind::Ap);
        assert_eq!(session.current_speaker_index, None);
        assert_eq!(session.status, SessionStatus::Prep);
        assert_eq!(
            session.ai_benchmarks["Leader Of Opposition"],
            [Benchmark::PointsOfInformation]
        );
        assert!(session.validate().is_ok());
    }

    #[test]
    fn test_cleared_index_serializes_as_minus_one() {
        let session: DebateSession = serde_json::from_value(sample_session_json()).unwrap();
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["currentSpeakerIndex"], -1);
    }

    #[test]
    fn test_validate_rejects_out_of_bounds_index() {
        let mut json = sample_session_json();
        json["currentSpeakerIndex"] = serde_json::json!(7);
        let session: DebateSession = serde_json::from_value(json).unwrap();
        assert!(matches!(
            session.validate(),
            Err(DebateError::Validation(_))
        ));
    }

    #[test]
    fn test_patch_omits_absent_fields() {
        let patch = SessionPatch::default().with_status(SessionStatus::Ongoing);
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value["status"], "ongoing");
        assert!(value.get("transcript").is_none());
        assert!(value.get("currentSpeakerIndex").is_none());
    }

    #[test]
    fn test_patch_writes_minus_one_for_cleared_index() {
        let patch = SessionPatch::default()
            .with_speaker_index(None)
            .with_status(SessionStatus::Completed);
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value["currentSpeakerIndex"], -1);

        let patch = SessionPatch::default().with_speaker_index(Some(3));
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value["currentSpeakerIndex"], 3);
    }

    #[test]
    fn test_roster_marks_only_user_as_human() {
        let roster = Participant::roster(FormatKind::Ap, "Government Whip");
        assert_eq!(roster.len(), 6);
        let humans: Vec<_> = roster.iter().filter(|p| !p.is_ai).collect();
        assert_eq!(humans.len(), 1);
        assert_eq!(humans[0].role, "Government Whip");
        assert_eq!(humans[0].team, "Government");
    }

    #[test]
    fn test_create_request_wire_names() {
        let request = CreateDebateRequest::new(
            FormatKind::Bp,
            "This House would tax meat",
            "Prime Minister",
        )
        .with_skill(SkillLevel::Advanced)
        .with_benchmark(Benchmark::Rebuttals);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["debateType"], "BP");
        assert_eq!(value["status"], "prep");
        assert_eq!(value["userRole"], "Prime Minister");
        assert_eq!(value["aiSkillLevels"]["Leader of Opposition"], "Advanced");
        assert!(value["aiSkillLevels"].get("Prime Minister").is_none());
        assert_eq!(
            value["aiBenchmarks"]["Government Whip"],
            serde_json::json!(["Focus on Rebuttals"])
        );
        assert_eq!(value["formatDetails"]["totalSpeakers"], 8);
    }

    #[test]
    fn test_benchmarks_accumulate_per_role() {
        let request = CreateDebateRequest::new(
            FormatKind::Ap,
            "This House would ban zoos",
            "Prime Minister",
        )
        .with_benchmark(Benchmark::Rebuttals)
        .with_benchmark(Benchmark::PointsOfInformation)
        .with_benchmark(Benchmark::Rebuttals);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["aiBenchmarks"]["Leader Of Opposition"],
            serde_json::json!(["Focus on Rebuttals", "Focus on POIs"])
        );
        assert!(value["aiBenchmarks"].get("Prime Minister").is_none());
    }

    #[test]
    fn test_summary_groups_by_first_appearance() {
        let mut session: DebateSession =
            serde_json::from_value(sample_session_json()).unwrap();
        session.transcript = vec![
            TranscriptEntry::info("Moderator", "Welcome"),
            TranscriptEntry::speech("Prime Minister", "Opening case."),
            TranscriptEntry::speech("Leader Of Opposition", "Our rebuttal."),
            TranscriptEntry::speech("Prime Minister", "A reply."),
        ];
        let summary = session.summary();
        let pm = summary.find("Prime Minister:").unwrap();
        let lo = summary.find("Leader Of Opposition:").unwrap();
        assert!(pm < lo);
        assert!(summary.contains("  Opening case.\n"));
        assert!(summary.contains("  A reply.\n"));
        assert!(!summary.contains("Welcome"));
    }

    #[test]
    fn test_normalize_role_strips_abbreviation() {
        assert_eq!(normalize_role("Prime Minister (PM)"), "Prime Minister");
        assert_eq!(normalize_role("First Proposition"), "First Proposition");
    }

    #[test]
    fn test_is_user_turn() {
        let mut session: DebateSession =
            serde_json::from_value(sample_session_json()).unwrap();
        assert!(!session.is_user_turn());
        session.current_speaker_index = Some(0);
        assert!(session.is_user_turn());
        session.current_speaker_index = Some(1);
        assert!(!session.is_user_turn());
    }
}
