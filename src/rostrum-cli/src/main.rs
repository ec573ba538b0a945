//! Rostrum CLI - Parliamentary Debate Practice
//!
//! A command-line tool for practicing competitive debate against AI
//! opponents, with motion browsing, adjudication, and rebuttal drills.

mod interactive;
mod render;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgGroup, Args, Parser, Subcommand};
use colored::Colorize;

use rostrum_core::adjudication::{UploadRequest, team_rosters, upload_format_name};
use rostrum_core::coach;
use rostrum_core::format::available_formats;
use rostrum_core::motions::{Category, Difficulty, MotionFilter, MotionLibrary};
use rostrum_core::session::{
    Benchmark, CreateDebateRequest, Personality, SkillLevel, normalize_role,
};
use rostrum_core::sparring::{Side, SparringSession};
use rostrum_core::timer::format_clock;
use rostrum_core::voice::{Narrator, VoiceCapture};
use rostrum_core::{
    BackendClient, Config, DebateApi, DebateController, DebateError, FormatKind, GenerativeClient,
};

use interactive::TypedCapture;

#[derive(Parser)]
#[command(
    name = "rostrum",
    version,
    about = "Parliamentary debate practice at the terminal",
    long_about = "Practice competitive debate against AI opponents: formatted rounds, \
                  freeform sparring, motion browsing, adjudication, and rebuttal drills."
)]
struct Cli {
    /// Path to a configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a formatted debate round against AI opponents
    Debate(DebateArgs),
    /// Spar freeform against a single AI opponent
    Spar(SparArgs),
    /// Browse the motion library
    Motions(MotionsArgs),
    /// Adjudicate a concluded debate or an uploaded recording
    Adjudicate(AdjudicateArgs),
    /// Drill rebuttals against generated arguments
    Train(TrainArgs),
}

#[derive(Args)]
struct DebateArgs {
    /// The motion to debate
    #[arg(value_name = "MOTION")]
    motion: Option<String>,

    /// Pick a built-in motion by its id
    #[arg(long, value_name = "ID", conflicts_with = "motion")]
    motion_id: Option<u32>,

    /// Draw a random motion from the library
    #[arg(long, conflicts_with_all = ["motion", "motion_id"])]
    random_motion: bool,

    /// Debate format
    #[arg(long, default_value = "ap", value_name = "FORMAT")]
    format: String,

    /// The role you will speak; defaults to the format's first slot
    #[arg(long, value_name = "ROLE")]
    role: Option<String>,

    /// Skill level for the AI speakers
    #[arg(long, value_name = "LEVEL")]
    skill: Option<String>,

    /// Personality for the AI speakers
    #[arg(long, value_name = "STYLE")]
    personality: Option<String>,

    /// Focus area for the AI speakers (repeatable)
    #[arg(long, value_name = "FOCUS")]
    benchmark: Vec<String>,

    /// Narrate speeches and save a recording when the debate concludes
    #[arg(long, overrides_with = "no_voice")]
    voice: bool,

    /// Disable narration
    #[arg(long, overrides_with = "voice")]
    no_voice: bool,

    /// Request an adjudication when the debate concludes
    #[arg(long)]
    adjudicate: bool,
}

#[derive(Args)]
struct SparArgs {
    /// The motion to spar on; defaults to a random one
    #[arg(value_name = "MOTION")]
    motion: Option<String>,

    /// The side you argue
    #[arg(long, default_value = "government", value_name = "SIDE")]
    side: String,
}

#[derive(Args)]
struct MotionsArgs {
    /// Filter motions by a search phrase
    #[arg(long, value_name = "QUERY")]
    search: Option<String>,

    /// Filter motions by category
    #[arg(long, value_name = "CATEGORY")]
    category: Option<String>,

    /// Filter motions by difficulty
    #[arg(long, value_name = "LEVEL")]
    difficulty: Option<String>,

    /// Show one random match instead of the whole list
    #[arg(long)]
    random: bool,

    /// Read motions from a TOML pack instead of the built-in library
    #[arg(long, value_name = "PATH")]
    pack: Option<PathBuf>,
}

#[derive(Args)]
#[command(group = ArgGroup::new("source").required(true).args(["session", "id", "file"]))]
struct AdjudicateArgs {
    /// Adjudicate a concluded session by its id
    #[arg(long, value_name = "SESSION_ID")]
    session: Option<String>,

    /// Fetch an existing adjudication by its id
    #[arg(long, value_name = "ID")]
    id: Option<String>,

    /// Upload a debate recording or transcript for adjudication
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Format of the uploaded debate
    #[arg(long = "format-name", default_value = "ap", value_name = "FORMAT")]
    format_name: String,

    /// Motion of the uploaded debate
    #[arg(long, value_name = "MOTION")]
    motion: Option<String>,

    /// Team roster as Name=speaker,speaker (repeatable)
    #[arg(long, value_name = "ROSTER")]
    team: Vec<String>,
}

#[derive(Args)]
struct TrainArgs {
    /// Topic to drill rebuttals on
    #[arg(value_name = "TOPIC")]
    topic: String,

    /// Rebuttal window in seconds
    #[arg(long, value_name = "SECONDS")]
    time: Option<u32>,

    /// Number of argument-and-rebuttal rounds
    #[arg(long, default_value_t = 1, value_name = "COUNT")]
    rounds: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Debate(args) => run_debate(&config, args).await,
        Command::Spar(args) => run_spar(&config, args).await,
        Command::Motions(args) => run_motions(args),
        Command::Adjudicate(args) => run_adjudicate(&config, args).await,
        Command::Train(args) => run_train(&config, args).await,
    }
}

async fn run_debate(config: &Config, args: DebateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let format = parse_format(&args.format)?;
    if format == FormatKind::OneVOne {
        return Err(DebateError::Validation(
            "freeform 1v1 runs through the spar command".to_string(),
        )
        .into());
    }

    let motion = if args.random_motion {
        random_builtin_motion()?
    } else {
        resolve_motion(args.motion.as_deref(), args.motion_id)?
    };
    let role = resolve_role(format, args.role.as_deref())?;

    let mut request = CreateDebateRequest::new(format, &motion, &role);
    if let Some(token) = &args.skill {
        request = request.with_skill(SkillLevel::parse(token)?);
    }
    if let Some(token) = &args.personality {
        request = request.with_personality(Personality::parse(token)?);
    }
    for token in &args.benchmark {
        request = request.with_benchmark(Benchmark::parse(token)?);
    }

    let api: Arc<dyn DebateApi> = Arc::new(BackendClient::new(config)?);
    let session = api.create_debate(&request).await?;

    render::print_banner(format.display_name());
    println!("{} {}", "Motion:".bold(), motion.bright_white());
    println!();
    render::print_roster(&session);
    render::print_rules(format);
    interactive::print_help();

    let mut lines = interactive::input_lines();
    interactive::prep_countdown(format.prep_secs(), &mut lines).await;

    let narrator = if args.voice {
        init_narrator(config).await
    } else {
        None
    };
    let voice_on = narrator.is_some();

    let mut controller =
        DebateController::from_session(Arc::clone(&api), session, config.session.reveal_cps)
            .with_callback(interactive::console_callback());
    if let Some(narrator) = narrator {
        controller = controller.with_narrator(narrator);
    }

    controller.advance().await;
    let quit = interactive::drive(&mut controller, &mut lines).await;

    if quit {
        println!("{}", "Leaving the debate.".yellow());
    } else {
        render::print_banner("Debate Summary");
        println!("{}", controller.summary());

        if voice_on {
            match controller.export_recording(Path::new(".")) {
                Ok(path) => {
                    println!("{} {}", "Recording saved:".bold(), path.display());
                }
                Err(e) => println!("{}", format!("Recording failed: {e}").yellow()),
            }
        }
        if args.adjudicate {
            println!("{}", "Requesting adjudication...".dimmed());
            let session_id = controller.session().id.clone();
            match api.create_adjudication(&session_id).await {
                Ok(adjudication) => render::print_adjudication(&adjudication),
                Err(e) => println!("{}", format!("Adjudication failed: {e}").yellow()),
            }
        }
    }

    controller.shutdown();
    Ok(())
}

/// Sets up narration, degrading to a warning when the engine or a
/// configured voice is unavailable.
async fn init_narrator(config: &Config) -> Option<Narrator> {
    match Narrator::new(config.voices.clone()).await {
        Ok(narrator) => match narrator.validate_all() {
            Ok(()) => Some(narrator),
            Err(e) => {
                eprintln!("{}", format!("Voice disabled: {e}").yellow());
                None
            }
        },
        Err(e) => {
            eprintln!("{}", format!("Voice disabled: {e}").yellow());
            None
        }
    }
}

async fn run_spar(config: &Config, args: SparArgs) -> Result<(), Box<dyn std::error::Error>> {
    let side = Side::parse(&args.side)?;
    let motion = match args.motion {
        Some(motion) => motion,
        None => random_builtin_motion()?,
    };

    let client = GenerativeClient::new(&config.generative)?;
    let mut session = SparringSession::new(&motion, side);
    let opponent = format!("Opponent ({})", side.opponent());

    render::print_banner("Sparring Session");
    println!("{} {}", "Motion:".bold(), motion.bright_white());
    println!("{} {}", "Your side:".bold(), side.to_string().bright_cyan());
    println!();
    println!(
        "Make your points one message at a time. {} ends the round",
        "/finish".bright_cyan()
    );
    println!(
        "with a full analysis; {} leaves without one.",
        "/quit".bright_cyan()
    );
    println!();

    let mut lines = interactive::input_lines();
    loop {
        print!("{} ", ">".bright_cyan());
        let _ = io::stdout().flush();
        let Ok(Some(line)) = lines.next_line().await else {
            break;
        };
        let line = line.trim();
        match line {
            "" => {}
            "/quit" => break,
            "/finish" => {
                println!("{}", "Analyzing the exchange...".dimmed());
                match session.finish(&client).await {
                    Ok(analysis) => render::print_analysis(&analysis),
                    Err(e) => {
                        println!("{}", format!("Could not generate analysis: {e}").yellow());
                    }
                }
                break;
            }
            text => {
                let reply = session.user_turn(&client, text).await;
                println!();
                render::print_speech(&opponent, &reply.text);
            }
        }
    }
    Ok(())
}

fn run_motions(args: MotionsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let library = match &args.pack {
        Some(path) => MotionLibrary::load(path)?,
        None => MotionLibrary::builtin(),
    };

    let mut filter = MotionFilter::default();
    if let Some(search) = args.search {
        filter = filter.with_search(search);
    }
    if let Some(token) = &args.category {
        filter = filter.with_category(Category::parse(token)?);
    }
    if let Some(token) = &args.difficulty {
        filter = filter.with_difficulty(Difficulty::parse(token)?);
    }

    if args.random {
        match library.random(&filter) {
            Some(motion) => render::print_motion(motion),
            None => println!("{}", "No motions match.".yellow()),
        }
        return Ok(());
    }

    let matches = library.filter(&filter);
    if matches.is_empty() {
        println!("{}", "No motions match.".yellow());
        return Ok(());
    }
    for motion in &matches {
        render::print_motion(motion);
    }
    println!();
    println!(
        "{}",
        format!("{} of {} motions", matches.len(), library.len()).dimmed()
    );
    Ok(())
}

async fn run_adjudicate(
    config: &Config,
    args: AdjudicateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = BackendClient::new(config)?;

    let adjudication = if let Some(session_id) = &args.session {
        println!("{}", "Requesting adjudication...".dimmed());
        api.create_adjudication(session_id).await?
    } else if let Some(id) = &args.id {
        api.fetch_adjudication(id).await?
    } else if let Some(file) = &args.file {
        let format = parse_format(&args.format_name)?;
        let mut request = UploadRequest::new(file, upload_format_name(format)?);
        if let Some(motion) = &args.motion {
            request = request.with_motion(motion);
        }
        for entry in &args.team {
            let (team, speakers) = parse_team(entry)?;
            request = request.with_team(team, speakers);
        }
        if args.team.is_empty() {
            println!(
                "{}",
                "Tip: name the speakers with --team, for example:".dimmed()
            );
            for roster in team_rosters(format) {
                println!(
                    "  {}",
                    format!("--team \"{}={}\"", roster.team, roster.speakers.join(","))
                        .dimmed()
                );
            }
        }
        println!("{}", "Uploading for adjudication...".dimmed());
        let uploaded = api.upload_adjudication(&request).await?;
        println!(
            "{} {}",
            "Uploaded.".bright_green(),
            format!("(id: {})", uploaded.id).dimmed()
        );
        api.fetch_adjudication(&uploaded.id).await?
    } else {
        return Err(DebateError::Validation(
            "one of --session, --id, or --file is required".to_string(),
        )
        .into());
    };

    render::print_adjudication(&adjudication);
    Ok(())
}

async fn run_train(config: &Config, args: TrainArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = GenerativeClient::new(&config.generative)?;
    let window_secs = args.time.unwrap_or(config.session.rebuttal_secs);
    let window = Duration::from_secs(u64::from(window_secs));

    render::print_banner("Rebuttal Trainer");
    println!("{} {}", "Topic:".bold(), args.topic.bright_white());
    println!();

    let mut lines = interactive::input_lines();
    for round in 1..=args.rounds {
        if args.rounds > 1 {
            println!("{}", format!("Round {round} of {}", args.rounds).bold());
            println!();
        }
        println!("{}", "Generating an argument...".dimmed());
        let argument = coach::generate_argument(&client, &args.topic).await?;
        render::print_speech("Argument", &argument);

        println!(
            "{}",
            format!(
                "You have {} to rebut. Finish with a blank line.",
                format_clock(window_secs)
            )
            .bold()
        );
        let mut capture = TypedCapture::new(&mut lines);
        let rebuttal = capture.capture(window).await?;
        if rebuttal.is_empty() {
            println!("{}", "No rebuttal captured.".yellow());
            continue;
        }

        println!("{}", "Scoring your rebuttal...".dimmed());
        let feedback = coach::score_rebuttal(&client, &argument, &rebuttal).await?;
        render::print_feedback(&feedback);
    }
    Ok(())
}

fn parse_format(token: &str) -> Result<FormatKind, Box<dyn std::error::Error>> {
    FormatKind::parse(token).map_err(|_| {
        format!(
            "Unknown debate format: '{}'. Available formats: {}",
            token,
            available_formats().join(", ")
        )
        .into()
    })
}

fn resolve_motion(text: Option<&str>, id: Option<u32>) -> Result<String, DebateError> {
    if let Some(text) = text {
        return Ok(text.to_string());
    }
    if let Some(id) = id {
        let library = MotionLibrary::builtin();
        return library
            .motions()
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.text.clone())
            .ok_or_else(|| DebateError::Validation(format!("no motion with id {id}")));
    }
    random_builtin_motion()
}

fn random_builtin_motion() -> Result<String, DebateError> {
    MotionLibrary::builtin()
        .random(&MotionFilter::default())
        .map(|m| m.text.clone())
        .ok_or_else(|| DebateError::Validation("the motion library is empty".to_string()))
}

/// Maps a requested role onto the format's slot name. Role listings carry
/// abbreviation suffixes ("Prime Minister (PM)") while rosters use the
/// bare slot name, so both sides are normalized before comparing.
fn resolve_role(format: FormatKind, requested: Option<&str>) -> Result<String, DebateError> {
    let roles = format.role_names();
    let Some(requested) = requested else {
        return Ok(normalize_role(roles[0]).to_string());
    };
    let wanted = normalize_role(requested);
    roles
        .iter()
        .find(|role| normalize_role(role).eq_ignore_ascii_case(wanted))
        .map(|role| normalize_role(role).to_string())
        .ok_or_else(|| {
            DebateError::Validation(format!(
                "'{requested}' is not a {} role; pick one of: {}",
                format.display_name(),
                roles.join(", ")
            ))
        })
}

fn parse_team(entry: &str) -> Result<(&str, Vec<String>), DebateError> {
    let malformed = || {
        DebateError::Validation(format!(
            "team rosters look like Name=speaker,speaker (got '{entry}')"
        ))
    };
    let (team, speakers) = entry.split_once('=').ok_or_else(malformed)?;
    let team = team.trim();
    let speakers: Vec<String> = speakers
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if team.is_empty() || speakers.is_empty() {
        return Err(malformed());
    }
    Ok((team, speakers))
}
