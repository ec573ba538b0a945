//! Freeform one-on-one sparring.
//!
//! A sparring session is a quick practice debate against a generated
//! opponent: no backend document, no speaker clock, just alternating turns
//! on a motion. The opponent argues whichever side the user did not take,
//! seeing a short window of recent turns for context. When the user is
//! done, the session hands the full exchange to the coach for analysis.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::coach::{self, DebateAnalysis};
use crate::error::{DebateError, Result};
use crate::generative::GenerativeClient;

/// How many trailing turns the opponent sees when composing a counter
/// argument.
const CONTEXT_TURNS: usize = 4;

/// The opponent's fixed reply when generation fails; the session stays
/// usable afterwards.
pub const AI_ERROR_REPLY: &str = "I encountered an error and can't respond right now.";

/// A side of the house.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Government,
    Opposition,
}

impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::Government => Side::Opposition,
            Side::Opposition => Side::Government,
        }
    }

    pub fn parse(token: &str) -> Result<Self> {
        match token.to_lowercase().as_str() {
            "government" | "gov" | "proposition" => Ok(Side::Government),
            "opposition" | "opp" => Ok(Side::Opposition),
            _ => Err(DebateError::Validation(format!("unknown side: {token}"))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Government => write!(f, "Government"),
            Side::Opposition => write!(f, "Opposition"),
        }
    }
}

/// Who produced a sparring turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SparringSpeaker {
    User,
    Ai,
    System,
}

/// One exchange in the sparring log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparringTurn {
    pub speaker: SparringSpeaker,
    pub text: String,
}

impl SparringTurn {
    fn new(speaker: SparringSpeaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// A live sparring exchange.
pub struct SparringSession {
    motion: String,
    user_side: Side,
    turns: Vec<SparringTurn>,
}

impl SparringSession {
    /// Opens the session and announces which side the user argues.
    pub fn new(motion: impl Into<String>, user_side: Side) -> Self {
        let mut session = Self {
            motion: motion.into(),
            user_side,
            turns: Vec::new(),
        };
        session.turns.push(SparringTurn::new(
            SparringSpeaker::System,
            format!("Debate started. You are the {user_side}."),
        ));
        session
    }

    pub fn motion(&self) -> &str {
        &self.motion
    }

    pub fn user_side(&self) -> Side {
        self.user_side
    }

    pub fn turns(&self) -> &[SparringTurn] {
        &self.turns
    }

    /// Records the user's point and produces the opponent's counter
    /// argument. A generation failure becomes the fixed apology turn
    /// instead of an error, so the exchange can continue.
    pub async fn user_turn(
        &mut self,
        client: &GenerativeClient,
        text: impl Into<String>,
    ) -> SparringTurn {
        self.submit_user(text);
        let prompt = self.reply_prompt();
        let reply = client.generate_text(&prompt).await;
        self.record_reply(reply)
    }

    /// Closes the exchange and asks the coach for the full analysis.
    pub async fn finish(&self, client: &GenerativeClient) -> Result<DebateAnalysis> {
        coach::analyze_debate(client, &self.motion, self.user_side, &self.turns).await
    }

    pub(crate) fn submit_user(&mut self, text: impl Into<String>) {
        self.turns
            .push(SparringTurn::new(SparringSpeaker::User, text));
    }

    /// The counter-argument prompt for the opponent's next turn, carrying
    /// the last few turns as context.
    pub(crate) fn reply_prompt(&self) -> String {
        let start = self.turns.len().saturating_sub(CONTEXT_TURNS);
        let context =
            serde_json::to_string(&self.turns[start..]).unwrap_or_else(|_| "[]".to_string());
        format!(
            "You are the {ai_side} in a debate on the motion: \"{motion}\". The user is the {user_side}. \
             Here is the debate transcript so far: {context}. Provide a concise, compelling, and direct \
             counter-argument to the user's last point. Your response should be a single paragraph.",
            ai_side = self.user_side.opponent(),
            motion = self.motion,
            user_side = self.user_side,
        )
    }

    pub(crate) fn record_reply(&mut self, reply: Result<String>) -> SparringTurn {
        let turn = match reply {
            Ok(text) => SparringTurn::new(SparringSpeaker::Ai, text),
            Err(e) => {
                warn!(error = %e, "sparring opponent failed to respond");
                SparringTurn::new(SparringSpeaker::Ai, AI_ERROR_REPLY)
            }
        };
        self.turns.push(turn.clone());
        turn
    }
}
