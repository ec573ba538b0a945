//! Live session controller.
//!
//! Owns a session snapshot, the speech timer, the transcript log, and the
//! backend handle, and runs the turn state machine over them. The driving
//! front end calls `tick` once per second, forwards user commands, and
//! resolves spawned speech generation through `take_generation` /
//! `apply_generated`; everything else happens inside the controller.
//!
//! Advances are serialized: while a generated speech is unresolved, both
//! manual and timer-driven advances are refused (`Busy`) or deferred, so
//! the sequencer can never skip or repeat a slot. Persistence is
//! best-effort: each transcript or status mutation is written once, and a
//! failed write becomes a notice while the in-memory log stays
//! authoritative.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::DebateApi;
use crate::error::{DebateError, Result};
use crate::sequencer::{Turn, next_turn};
use crate::session::{
    DebateSession, EntryKind, SessionPatch, SessionStatus, TranscriptEntry, summarize,
};
use crate::timer::{SpeechTimer, TimerTick};
use crate::transcript::TranscriptLog;
use crate::voice::{self, Narrator};

/// Speaker name used for procedural entries.
pub const MODERATOR: &str = "Moderator";

const THINKING_PLACEHOLDER: &str = "Thinking...";
const GENERATION_FAILED: &str = "(AI Error: Could not generate speech)";
const CONCLUSION: &str = "The debate has concluded.";
const SAVE_FAILED_NOTICE: &str = "Failed to save debate progress.";

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenPhase {
    /// No speaker has taken the floor yet.
    Idle,
    /// A speaker holds the floor and the clock runs.
    Speaking,
    /// The current slot has ended but the next has not started.
    BetweenSpeakers,
    /// The debate is over.
    Concluded,
}

/// Events emitted while the session runs.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session moved to a new phase.
    PhaseChanged(ScreenPhase),
    /// The floor passed to a new speaker (`None` clears the floor).
    SpeakerChanged {
        index: Option<usize>,
        role: Option<String>,
    },
    /// One second elapsed on the active clock.
    TimerTick { remaining: u32 },
    /// The active speaker's time ran out.
    TimerExpired,
    /// An entry was appended to the transcript.
    EntryAdded(TranscriptEntry),
    /// The final transcript entry was overwritten.
    EntryReplaced(TranscriptEntry),
    /// Another piece of a generated speech was revealed.
    TypingDelta {
        speaker: String,
        chunk: String,
        done: bool,
    },
    /// A non-blocking message for the user.
    Notice(String),
    /// The debate concluded.
    Concluded,
}

pub type SessionCallback = Box<dyn Fn(SessionEvent) + Send + Sync>;

/// Result of an advance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The floor passed to the next speaker.
    Advanced,
    /// The roster is exhausted; the debate is over.
    Concluded,
    /// A previous advance or a generated speech is still unresolved.
    Busy,
}

/// Incremental reveal of a generated speech.
struct RevealState {
    speaker: String,
    chars: Vec<char>,
    shown: usize,
}

/// The session state machine.
pub struct DebateController {
    api: Arc<dyn DebateApi>,
    session: DebateSession,
    log: TranscriptLog,
    timer: SpeechTimer,
    phase: ScreenPhase,
    /// Characters revealed per second; zero reveals instantly.
    reveal_cps: u32,
    reveal: Option<RevealState>,
    /// Role whose speech is being generated, while unresolved.
    generating: Option<String>,
    /// Set when the clock expires mid-generation; consumed on settle.
    advance_when_settled: bool,
    pending: Option<JoinHandle<Result<String>>>,
    narrator: Option<Narrator>,
    callback: Option<SessionCallback>,
}

impl DebateController {
    /// Fetches the session and builds a ready controller. A fetch or
    /// validation failure is terminal; there is no half-loaded controller.
    pub async fn load(
        api: Arc<dyn DebateApi>,
        session_id: &str,
        reveal_cps: u32,
    ) -> Result<Self> {
        debug!(session_id, "loading debate session");
        let session = api.fetch_debate(session_id).await?;
        Ok(Self::from_session(api, session, reveal_cps))
    }

    /// Builds a controller around an already-fetched session document.
    pub fn from_session(api: Arc<dyn DebateApi>, session: DebateSession, reveal_cps: u32) -> Self {
        let log = TranscriptLog::from_entries(session.transcript.clone());
        let mut timer = SpeechTimer::new();
        let phase = match (session.status, session.current_speaker_index) {
            (SessionStatus::Completed, _) => ScreenPhase::Concluded,
            (_, Some(index)) => {
                timer.reset(session.format.speech_secs(index), false);
                ScreenPhase::BetweenSpeakers
            }
            _ => ScreenPhase::Idle,
        };
        Self {
            api,
            session,
            log,
            timer,
            phase,
            reveal_cps,
            reveal: None,
            generating: None,
            advance_when_settled: false,
            pending: None,
            narrator: None,
            callback: None,
        }
    }

    /// Set a callback for session events.
    pub fn with_callback(mut self, callback: SessionCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Attach a narrator so the finished debate can be exported as audio.
    pub fn with_narrator(mut self, narrator: Narrator) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn session(&self) -> &DebateSession {
        &self.session
    }

    pub fn phase(&self) -> ScreenPhase {
        self.phase
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.log
    }

    pub fn remaining(&self) -> u32 {
        self.timer.remaining()
    }

    /// True while a generated speech is unresolved.
    pub fn generation_pending(&self) -> bool {
        self.generating.is_some()
    }

    /// Hands the spawned generation task to the caller's select loop. The
    /// controller still counts the speech as unresolved until
    /// `apply_generated` is called with the task's outcome.
    pub fn take_generation(&mut self) -> Option<JoinHandle<Result<String>>> {
        self.pending.take()
    }

    /// Moves the floor to the next speaker, or concludes past the last one.
    pub async fn advance(&mut self) -> AdvanceOutcome {
        if self.phase == ScreenPhase::Concluded {
            return AdvanceOutcome::Concluded;
        }
        if self.generating.is_some() {
            return AdvanceOutcome::Busy;
        }
        self.finish_reveal();

        match next_turn(
            self.session.current_speaker_index,
            self.session.participants.len(),
        ) {
            Turn::Speaker { index } => {
                self.session.current_speaker_index = Some(index);
                self.session.status = SessionStatus::Ongoing;
                self.timer.reset(self.session.format.speech_secs(index), true);

                let role = self.session.participants[index].role.clone();
                let is_ai = self.session.participants[index].is_ai;
                self.set_phase(ScreenPhase::Speaking);
                self.emit_event(SessionEvent::SpeakerChanged {
                    index: Some(index),
                    role: Some(role.clone()),
                });
                self.persist(
                    SessionPatch::default()
                        .with_speaker_index(Some(index))
                        .with_status(SessionStatus::Ongoing),
                )
                .await;
                self.emit_event(SessionEvent::Notice(format!("Next up: {role}!")));

                if is_ai {
                    self.begin_generation(role).await;
                }
                AdvanceOutcome::Advanced
            }
            Turn::Exhausted => {
                self.conclude().await;
                AdvanceOutcome::Concluded
            }
        }
    }

    /// One-second heartbeat: progresses the reveal and the clock. Expiry
    /// rings once and advances, unless a speech is still being generated,
    /// in which case the advance waits for the speech to settle.
    pub async fn tick(&mut self) {
        self.step_reveal();
        match self.timer.tick() {
            TimerTick::Running { remaining } => {
                self.emit_event(SessionEvent::TimerTick { remaining });
            }
            TimerTick::Expired => {
                self.emit_event(SessionEvent::TimerExpired);
                if self.generating.is_some() {
                    self.advance_when_settled = true;
                    self.set_phase(ScreenPhase::BetweenSpeakers);
                } else {
                    let _ = self.advance().await;
                }
            }
            TimerTick::Idle => {}
        }
    }

    /// Records a speech delivered by the user. Refused while an AI speaker
    /// holds the floor or no one does.
    pub async fn submit_speech(&mut self, text: &str) -> Result<()> {
        let role = match self.session.current_speaker() {
            Some(p) if !p.is_ai => p.role.clone(),
            Some(_) => {
                return Err(DebateError::Validation(
                    "an AI speaker holds the floor".to_string(),
                ));
            }
            None => {
                return Err(DebateError::Validation(
                    "no speaker holds the floor".to_string(),
                ));
            }
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DebateError::Validation("speech text is empty".to_string()));
        }
        self.append_entry(TranscriptEntry::speech(role, trimmed)).await;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.timer.pause();
    }

    pub fn resume(&mut self) {
        self.timer.resume();
    }

    /// Ends the debate early, keeping everything delivered so far.
    pub async fn force_complete(&mut self) {
        if self.phase == ScreenPhase::Concluded {
            return;
        }
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        if let Some(role) = self.generating.take() {
            self.log
                .replace_last(TranscriptEntry::info(role, GENERATION_FAILED));
        }
        self.advance_when_settled = false;
        self.finish_reveal();
        self.conclude().await;
    }

    /// Plain-text debrief of the speeches delivered so far.
    pub fn summary(&self) -> String {
        summarize(self.log.entries())
    }

    /// Applies the outcome of the spawned generation task. Success replaces
    /// the placeholder with the speech and starts the reveal; failure leaves
    /// an error note so the debate can move on. A deferred advance is
    /// performed once the outcome lands.
    pub async fn apply_generated(&mut self, outcome: Result<String>) {
        let Some(role) = self.generating.take() else {
            return;
        };
        self.pending = None;
        let deferred = self.advance_when_settled;
        self.advance_when_settled = false;

        match outcome {
            Ok(text) => {
                let entry = TranscriptEntry::speech(role, text);
                let announce = self.reveal_cps == 0 || deferred;
                self.replace_last_entry(entry.clone(), announce).await;
                if !announce {
                    self.begin_reveal(entry);
                }
            }
            Err(e) => {
                warn!(error = %e, "speech generation failed");
                self.replace_last_entry(TranscriptEntry::info(role, GENERATION_FAILED), true)
                    .await;
                self.emit_event(SessionEvent::Notice(format!(
                    "Speech generation failed: {e}"
                )));
            }
        }

        if deferred {
            let _ = self.advance().await;
        }
    }

    /// Teardown: aborts any in-flight generation and stops narration and
    /// the clock. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generating = None;
        self.advance_when_settled = false;
        if let Some(narrator) = &self.narrator {
            narrator.cancel();
        }
        self.timer.stop();
    }

    /// Narrates every delivered speech and writes the combined recording
    /// into `dir`, named after the motion.
    pub fn export_recording(&mut self, dir: &Path) -> Result<PathBuf> {
        let narrator = self
            .narrator
            .as_mut()
            .ok_or(DebateError::CapabilityUnavailable("Voice narration"))?;
        let mut segments = Vec::new();
        for entry in self.log.entries() {
            if entry.kind != EntryKind::Speech {
                continue;
            }
            let team = self
                .session
                .participants
                .iter()
                .find(|p| p.role == entry.speaker)
                .map(|p| p.team.as_str())
                .unwrap_or(MODERATOR);
            segments.push(narrator.narrate_for_team(team, &entry.text)?);
        }
        if segments.is_empty() {
            return Err(DebateError::Validation(
                "no delivered speeches to narrate".to_string(),
            ));
        }
        let combined = voice::combine_segments(segments, 0.5);
        let path = dir.join(voice::output_filename(&self.session.motion));
        voice::export_wav(&path, &combined)?;
        Ok(path)
    }

    async fn begin_generation(&mut self, role: String) {
        self.append_entry(TranscriptEntry::info(role.clone(), THINKING_PLACEHOLDER))
            .await;
        debug!(role, "generating speech");
        let api = Arc::clone(&self.api);
        let session_id = self.session.id.clone();
        let speaker_role = role.clone();
        self.generating = Some(role);
        self.pending = Some(tokio::spawn(async move {
            api.generate_speech(&session_id, &speaker_role).await
        }));
    }

    async fn conclude(&mut self) {
        self.session.current_speaker_index = None;
        self.session.status = SessionStatus::Completed;
        self.timer.stop();
        self.emit_event(SessionEvent::SpeakerChanged {
            index: None,
            role: None,
        });

        let entry = TranscriptEntry::info(MODERATOR, CONCLUSION);
        self.log.append(entry.clone());
        self.emit_event(SessionEvent::EntryAdded(entry));
        self.persist(
            SessionPatch::transcript(self.log.to_vec())
                .with_speaker_index(None)
                .with_status(SessionStatus::Completed),
        )
        .await;

        self.set_phase(ScreenPhase::Concluded);
        self.emit_event(SessionEvent::Concluded);
    }

    fn begin_reveal(&mut self, entry: TranscriptEntry) {
        self.log.set_last_text("");
        self.reveal = Some(RevealState {
            speaker: entry.speaker,
            chars: entry.text.chars().collect(),
            shown: 0,
        });
    }

    fn step_reveal(&mut self) {
        let Some(reveal) = self.reveal.as_mut() else {
            return;
        };
        let end = (reveal.shown + self.reveal_cps as usize).min(reveal.chars.len());
        let chunk: String = reveal.chars[reveal.shown..end].iter().collect();
        let shown: String = reveal.chars[..end].iter().collect();
        let speaker = reveal.speaker.clone();
        let done = end == reveal.chars.len();
        reveal.shown = end;
        if done {
            self.reveal = None;
        }
        self.log.set_last_text(&shown);
        self.emit_event(SessionEvent::TypingDelta {
            speaker,
            chunk,
            done,
        });
    }

    /// Completes a reveal in one step, as when the floor moves on.
    fn finish_reveal(&mut self) {
        if let Some(reveal) = self.reveal.take() {
            let full: String = reveal.chars.iter().collect();
            let chunk: String = reveal.chars[reveal.shown..].iter().collect();
            self.log.set_last_text(&full);
            self.emit_event(SessionEvent::TypingDelta {
                speaker: reveal.speaker,
                chunk,
                done: true,
            });
        }
    }

    async fn append_entry(&mut self, entry: TranscriptEntry) {
        self.log.append(entry.clone());
        self.emit_event(SessionEvent::EntryAdded(entry));
        self.persist(SessionPatch::transcript(self.log.to_vec())).await;
    }

    async fn replace_last_entry(&mut self, entry: TranscriptEntry, announce: bool) {
        if !self.log.replace_last(entry.clone()) {
            return;
        }
        if announce {
            self.emit_event(SessionEvent::EntryReplaced(entry));
        }
        self.persist(SessionPatch::transcript(self.log.to_vec())).await;
    }

    /// One write per mutation, no retry. Failure becomes a notice; the
    /// in-memory log stays authoritative.
    async fn persist(&self, patch: SessionPatch) {
        if let Err(e) = self.api.update_debate(&self.session.id, &patch).await {
            warn!(error = %e, "failed to persist session update");
            self.emit_event(SessionEvent::Notice(SAVE_FAILED_NOTICE.to_string()));
        }
    }

    fn set_phase(&mut self, phase: ScreenPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.emit_event(SessionEvent::PhaseChanged(phase));
        }
    }

    /// Emit an event if a callback is registered.
    fn emit_event(&self, event: SessionEvent) {
        if let Some(ref callback) = self.callback {
            callback(event);
        }
    }
}
