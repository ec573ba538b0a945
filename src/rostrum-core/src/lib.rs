//! Rostrum Core Library
//!
//! Provides the debate session engine (timer, turn sequencing, transcript,
//! controller), competitive format definitions, backend and generative
//! API clients, adjudication, coaching, sparring, and voice capabilities.

pub mod adjudication;
pub mod api;
pub mod coach;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod generative;
pub mod motions;
pub mod sequencer;
pub mod session;
pub mod sparring;
pub mod timer;
pub mod transcript;
pub mod voice;

pub use api::{BackendClient, DebateApi};
pub use config::Config;
pub use controller::{AdvanceOutcome, DebateController, ScreenPhase, SessionCallback, SessionEvent};
pub use error::{DebateError, Result};
pub use format::FormatKind;
pub use generative::GenerativeClient;
pub use session::{DebateSession, Participant, SessionStatus, TranscriptEntry};
