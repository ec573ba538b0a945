//! The interactive session loop: stdin commands, the one-second
//! heartbeat, and the console event callback.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval, timeout_at};

use rostrum_core::controller::{
    AdvanceOutcome, DebateController, ScreenPhase, SessionCallback, SessionEvent,
};
use rostrum_core::error::{DebateError, Result};
use rostrum_core::session::EntryKind;
use rostrum_core::timer::format_clock;
use rostrum_core::voice::VoiceCapture;

use crate::render;

pub type InputLines = Lines<BufReader<Stdin>>;

/// One line reader shared across prep, the session loop, and capture.
pub fn input_lines() -> InputLines {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Create a callback that prints session events to the console.
pub fn console_callback() -> SessionCallback {
    let streaming = AtomicBool::new(false);
    Box::new(move |event| match event {
        SessionEvent::SpeakerChanged {
            role: Some(role), ..
        } => {
            render::print_divider();
            println!("{}", format!("Now speaking: {role}").bold());
        }
        SessionEvent::SpeakerChanged { .. } => {
            // The floor was cleared; the conclusion entry follows.
        }
        SessionEvent::TimerTick { remaining } => {
            if remaining % 60 == 0 || remaining <= 5 {
                println!("  {}", format_clock(remaining).dimmed());
            }
        }
        SessionEvent::TimerExpired => {
            render::bell();
            println!("{}", "Time's up!".bright_red().bold());
        }
        SessionEvent::EntryAdded(entry) | SessionEvent::EntryReplaced(entry) => match entry.kind {
            EntryKind::Speech => render::print_speech(&entry.speaker, &entry.text),
            EntryKind::Info => render::print_info(&entry.text),
        },
        SessionEvent::TypingDelta {
            speaker,
            chunk,
            done,
        } => {
            if !streaming.swap(true, Ordering::Relaxed) {
                render::print_speaker(&speaker);
            }
            print!("{chunk}");
            let _ = io::stdout().flush();
            if done {
                println!();
                println!();
                streaming.store(false, Ordering::Relaxed);
            }
        }
        SessionEvent::Notice(text) => render::print_notice(&text),
        SessionEvent::PhaseChanged(_) => {}
        SessionEvent::Concluded => {
            // Summary and reports are handled in main.
        }
    })
}

/// Counts down preparation time, announcing each minute and the final
/// seconds. Pressing Enter skips ahead.
pub async fn prep_countdown(seconds: u32, lines: &mut InputLines) {
    if seconds == 0 {
        return;
    }
    println!(
        "{}",
        format!(
            "Prep time: {}. Press Enter to skip.",
            format_clock(seconds)
        )
        .bold()
    );

    let mut remaining = seconds;
    let mut clock = interval(Duration::from_secs(1));
    clock.tick().await;
    loop {
        tokio::select! {
            _ = clock.tick() => {
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
                if remaining % 60 == 0 || remaining <= 5 {
                    println!("  {}", format_clock(remaining).dimmed());
                }
            }
            line = lines.next_line() => {
                if let Ok(Some(_)) = line {
                    println!("{}", "Skipping prep.".yellow());
                }
                break;
            }
        }
    }
    render::bell();
    println!("{}", "Prep time is over!".bright_green().bold());
    println!();
}

/// Runs the session until it concludes or the user quits. Returns `true`
/// when the user quit early.
pub async fn drive(controller: &mut DebateController, lines: &mut InputLines) -> bool {
    let mut clock = interval(Duration::from_secs(1));
    clock.tick().await;
    let mut pending = controller.take_generation();

    loop {
        tokio::select! {
            _ = clock.tick() => {
                controller.tick().await;
            }
            outcome = generation_settled(&mut pending) => {
                controller.apply_generated(outcome).await;
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else {
                    abort_pending(&mut pending);
                    return true;
                };
                if handle_line(controller, line.trim()).await {
                    abort_pending(&mut pending);
                    return true;
                }
            }
        }
        if pending.is_none() {
            pending = controller.take_generation();
        }
        if controller.phase() == ScreenPhase::Concluded {
            abort_pending(&mut pending);
            return false;
        }
    }
}

/// Resolves once the in-flight generation task settles. With no task in
/// flight this never resolves, parking its select branch.
async fn generation_settled(pending: &mut Option<JoinHandle<Result<String>>>) -> Result<String> {
    match pending {
        Some(handle) => {
            let outcome = handle.await;
            *pending = None;
            match outcome {
                Ok(result) => result,
                Err(join_error) => Err(DebateError::Generation(join_error.to_string())),
            }
        }
        None => std::future::pending().await,
    }
}

fn abort_pending(pending: &mut Option<JoinHandle<Result<String>>>) {
    if let Some(handle) = pending.take() {
        handle.abort();
    }
}

/// Dispatches one line of input. Returns `true` when the user asked to
/// quit.
async fn handle_line(controller: &mut DebateController, line: &str) -> bool {
    match line {
        "" => {}
        "/next" => {
            if controller.advance().await == AdvanceOutcome::Busy {
                println!(
                    "{}",
                    "A speech is still being prepared; try again shortly.".yellow()
                );
            }
        }
        "/pause" => {
            controller.pause();
            println!("{}", "Clock paused.".yellow());
        }
        "/resume" => {
            controller.resume();
            println!("{}", "Clock resumed.".yellow());
        }
        "/rules" => render::print_rules(controller.session().format),
        "/summary" => {
            render::print_banner("Summary So Far");
            println!("{}", controller.summary());
        }
        "/finish" => controller.force_complete().await,
        "/quit" => return true,
        "/help" => print_help(),
        command if command.starts_with('/') => {
            println!("{}", format!("Unknown command: {command}").yellow());
            print_help();
        }
        text => {
            if let Err(e) = controller.submit_speech(text).await {
                println!("{}", e.to_string().yellow());
            }
        }
    }
    false
}

pub fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  {}     move to the next speaker", "/next".bright_cyan());
    println!("  {}    pause the speech clock", "/pause".bright_cyan());
    println!("  {}   resume the speech clock", "/resume".bright_cyan());
    println!("  {}    show the format rules", "/rules".bright_cyan());
    println!("  {}  recap the debate so far", "/summary".bright_cyan());
    println!("  {}   end the debate now", "/finish".bright_cyan());
    println!("  {}     leave without finishing", "/quit".bright_cyan());
    println!("Anything else is delivered as your speech when you hold the floor.");
    println!();
}

/// Captures a typed rebuttal: lines are collected until a blank line,
/// end of input, or the window closing, then joined into one argument.
pub struct TypedCapture<'a> {
    lines: &'a mut InputLines,
}

impl<'a> TypedCapture<'a> {
    pub fn new(lines: &'a mut InputLines) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl VoiceCapture for TypedCapture<'_> {
    async fn capture(&mut self, window: Duration) -> Result<String> {
        let deadline = Instant::now() + window;
        let mut collected: Vec<String> = Vec::new();
        loop {
            match timeout_at(deadline, self.lines.next_line()).await {
                Ok(Ok(Some(line))) => {
                    let line = line.trim();
                    if line.is_empty() {
                        break;
                    }
                    collected.push(line.to_string());
                }
                Ok(Ok(None)) => break,
                Ok(Err(e)) => return Err(DebateError::Io(e)),
                Err(_) => {
                    render::bell();
                    println!("{}", "Time's up!".bright_red().bold());
                    break;
                }
            }
        }
        Ok(collected.join(" "))
    }
}
