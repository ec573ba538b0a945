//! Console rendering for sessions, reports, and the motion library.

use colored::{ColoredString, Colorize};
use std::io::{self, Write};

use rostrum_core::adjudication::{Adjudication, SpeakerFeedback};
use rostrum_core::coach::{DebateAnalysis, RebuttalFeedback};
use rostrum_core::format::FormatKind;
use rostrum_core::motions::{Difficulty, Motion};
use rostrum_core::session::DebateSession;

const RULE_WIDTH: usize = 70;
const WRAP_WIDTH: usize = 66;

pub fn print_banner(title: &str) {
    println!();
    println!("{}", "═".repeat(RULE_WIDTH).bright_blue());
    println!("{}", format!("  {title}").bright_blue().bold());
    println!("{}", "═".repeat(RULE_WIDTH).bright_blue());
    println!();
}

pub fn print_divider() {
    println!("{}", "─".repeat(RULE_WIDTH).dimmed());
}

/// Roster grouped by team, with the user's slot marked.
pub fn print_roster(session: &DebateSession) {
    println!("{}", "Speakers:".bold());
    let mut teams: Vec<&str> = Vec::new();
    for participant in &session.participants {
        if !teams.contains(&participant.team.as_str()) {
            teams.push(&participant.team);
        }
    }
    for team in teams {
        println!("  {}", team.bright_cyan().bold());
        for participant in session.participants.iter().filter(|p| p.team == team) {
            let tag = if participant.is_ai {
                "AI".yellow()
            } else {
                "You".bright_green().bold()
            };
            println!("    {} ({})", participant.role, tag);
        }
    }
    println!();
}

pub fn print_rules(format: FormatKind) {
    let details = format.details();
    println!("{}", format!("{} Rules", details.name).bold());
    println!("  {} {}", "Teams:".bold(), details.teams);
    println!("  {} {}", "Structure:".bold(), details.structure);
    println!("  {} {}", "Prep:".bold(), details.prep_time);
    println!("  {} {}", "Speeches:".bold(), details.speech_time);
    for rule in &details.rules {
        println!("  - {rule}");
    }
    if !details.speaker_roles_detailed.is_empty() {
        println!("  {}", "Roles:".bold());
        for role in &details.speaker_roles_detailed {
            println!("    {}: {}", role.role.bright_cyan(), role.description);
        }
    }
    println!();
}

/// A speaker header followed by the wrapped, indented body.
pub fn print_speech(speaker: &str, text: &str) {
    print_speaker(speaker);
    for line in wrap_text(text, WRAP_WIDTH).lines() {
        println!("  {line}");
    }
    println!();
}

pub fn print_speaker(speaker: &str) {
    println!("{} {}", "▶".bright_cyan(), speaker.bright_cyan().bold());
}

pub fn print_info(text: &str) {
    println!("  {}", text.dimmed());
}

pub fn print_notice(text: &str) {
    println!("{}", format!("• {text}").yellow());
}

/// Rings the terminal bell.
pub fn bell() {
    print!("\x07");
    let _ = io::stdout().flush();
}

pub fn print_motion(motion: &Motion) {
    let difficulty = match motion.difficulty {
        Difficulty::Beginner => "Beginner".green(),
        Difficulty::Intermediate => "Intermediate".yellow(),
        Difficulty::Advanced => "Advanced".red(),
    };
    println!(
        "{:>4}  {} {} {}",
        format!("#{}", motion.id).dimmed(),
        motion.text.bright_white(),
        format!("[{}]", motion.category).bright_cyan(),
        format!("[{difficulty}]")
    );
}

pub fn print_adjudication(adjudication: &Adjudication) {
    print_banner("Adjudication");
    println!(
        "{} {}",
        "Winner:".bold(),
        adjudication.overall_winner.bright_green().bold()
    );
    println!();

    if !adjudication.team_rankings.is_empty() {
        println!("{}", "Rankings:".bold());
        for ranking in &adjudication.team_rankings {
            println!(
                "  {}. {} {}",
                ranking.rank,
                ranking.team.bright_cyan(),
                format!("({:.1})", ranking.score).dimmed()
            );
        }
        println!();
    }

    if !adjudication.scorecard.is_empty() {
        println!("{}", "Scorecard:".bold());
        for (team, score) in &adjudication.scorecard {
            println!(
                "  {}: matter {:.1}, manner {:.1}, method {:.1}",
                team.bright_cyan(),
                score.matter,
                score.manner,
                score.method
            );
        }
        println!();
    }

    if let Some(chain) = &adjudication.chain_of_thought {
        println!("{}", chain.title.bold());
        for clash in &chain.clashes {
            println!(
                "  {} {}",
                clash.title.bright_white(),
                format!("(weight {:.0}%)", clash.weight * 100.0).dimmed()
            );
            println!("    {} {}", "Won by:".bold(), clash.winner.bright_green());
            for line in wrap_text(&clash.summary, WRAP_WIDTH).lines() {
                println!("    {line}");
            }
        }
        println!();
    }

    if let Some(feedback) = &adjudication.detailed_feedback {
        println!("{}", "Speaker Feedback:".bold());
        for speaker in &feedback.speakers {
            print_speaker_feedback(speaker);
        }
        if let Some(replies) = &feedback.reply_speeches {
            println!("{}", "Reply Speeches:".bold());
            for (side, reply) in [
                ("Proposition", &replies.proposition),
                ("Opposition", &replies.opposition),
            ] {
                println!(
                    "  {} {} {}",
                    side.bright_cyan(),
                    reply.speaker.bold(),
                    score_colored(reply.score)
                );
                for line in wrap_text(&reply.summary, WRAP_WIDTH).lines() {
                    println!("    {line}");
                }
            }
            println!();
        }
    }
}

fn print_speaker_feedback(speaker: &SpeakerFeedback) {
    println!(
        "  {} {} {}",
        speaker.name.bright_cyan().bold(),
        format!("({})", speaker.team).dimmed(),
        score_colored(speaker.scores.total)
    );
    println!(
        "    matter {:.1}, manner {:.1}, method {:.1}",
        speaker.scores.matter, speaker.scores.manner, speaker.scores.method
    );
    if let Some(fulfillment) = &speaker.role_fulfillment {
        for line in wrap_text(fulfillment, WRAP_WIDTH).lines() {
            println!("    {line}");
        }
    }
    if let Some(analysis) = &speaker.rhetorical_analysis {
        for line in wrap_text(analysis, WRAP_WIDTH).lines() {
            println!("    {}", line.dimmed());
        }
    }
    for comment in &speaker.timestamped_comments {
        println!("    [{}] {}", comment.time.dimmed(), comment.comment);
    }
    println!();
}

pub fn print_analysis(analysis: &DebateAnalysis) {
    print_banner("Debate Analysis");
    if !analysis.key_strengths.is_empty() {
        println!("{}", "Key Strengths:".bold());
        for strength in &analysis.key_strengths {
            println!("  {} {}", "+".bright_green(), strength);
        }
        println!();
    }
    if !analysis.areas_for_improvement.is_empty() {
        println!("{}", "Areas for Improvement:".bold());
        for area in &analysis.areas_for_improvement {
            println!("  {} {}", "-".yellow(), area);
        }
        println!();
    }
    if !analysis.best_argument.is_empty() {
        println!("{}", "Best Argument:".bold());
        for line in wrap_text(&analysis.best_argument, WRAP_WIDTH).lines() {
            println!("  {line}");
        }
        println!();
    }
    if !analysis.overall_feedback.is_empty() {
        println!("{}", "Overall:".bold());
        for line in wrap_text(&analysis.overall_feedback, WRAP_WIDTH).lines() {
            println!("  {line}");
        }
        println!();
    }
}

pub fn print_feedback(feedback: &RebuttalFeedback) {
    println!();
    println!(
        "  {} {}   {} {}   {} {}",
        "Clarity:".bold(),
        score_colored(feedback.clarity),
        "Relevance:".bold(),
        score_colored(feedback.relevance),
        "Persuasiveness:".bold(),
        score_colored(feedback.persuasiveness)
    );
    println!();
    println!("{}", "What worked:".bold());
    for line in wrap_text(&feedback.positive_feedback, WRAP_WIDTH).lines() {
        println!("  {line}");
    }
    println!("{}", "One suggestion:".bold());
    for line in wrap_text(&feedback.constructive_feedback, WRAP_WIDTH).lines() {
        println!("  {line}");
    }
    println!();
}

fn score_colored(score: f64) -> ColoredString {
    let text = format!("{score:.1}/10");
    if score >= 8.0 {
        text.bright_green()
    } else if score >= 5.0 {
        text.yellow()
    } else {
        text.red()
    }
}

/// Simple text wrapping function.
pub fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut current_line_len = 0;

    for word in text.split_whitespace() {
        if current_line_len + word.len() + 1 > width && current_line_len > 0 {
            result.push('\n');
            current_line_len = 0;
        }
        if current_line_len > 0 {
            result.push(' ');
            current_line_len += 1;
        }
        result.push_str(word);
        current_line_len += word.len();
    }

    result
}
