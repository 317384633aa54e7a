use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use researchintake::chat::ConsolePrompt;
use researchintake::interview::ConversationState;
use researchintake::logging;
use researchintake::orchestration::{InterviewContext, Orchestrator, StopReason};
use researchintake::proposers::{HttpProposer, HttpProposerConfig, OfflineProposer, TextProposer};
use researchintake::storage::SessionStore;
use researchintake::workspace::{load_from, load_or_default, save, save_to, AppConfig};

const SUMMARY_VALUE_CHARS: usize = 100;

fn main() -> Result<()> {
    let args = CliArgs::parse()?;
    let config = match &args.config {
        Some(path) => load_from(path)?,
        None => load_or_default()?,
    };
    logging::init(&config.logging)?;

    if args.write_config {
        let path = match &args.config {
            Some(path) => {
                save_to(&config, path)?;
                path.clone()
            }
            None => save(&config)?,
        };
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let store = SessionStore::open_default()?;
    if args.list {
        return list_sessions(&store);
    }

    let orchestrator = Orchestrator::new(&config, build_proposer(&config, args.offline)?)
        .with_store(store.clone());

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut state = match &args.resume {
        Some(session_id) => store
            .load(session_id)?
            .with_context(|| format!("No saved session '{session_id}'"))?,
        None => {
            let query = match args.query.clone() {
                Some(query) => query,
                None => read_query(&mut stdin.lock(), &mut stdout.lock())?,
            };
            orchestrator.initialize(&query, ConversationState::new_session_id())
        }
    };
    store.save(&state)?;

    println!(
        "Session {} ({} mode, up to {} questions). Type /quit to stop.",
        state.session_id, state.mode, state.max_turns
    );

    let ctx = InterviewContext::new();
    let mut prompt = ConsolePrompt::new(stdin.lock(), stdout.lock());
    let outcome = orchestrator.run(&mut state, &mut prompt, &ctx)?;
    drop(prompt);

    match outcome.stop_reason {
        StopReason::Sufficient => println!("\nThanks, that gives me enough to go on."),
        StopReason::TurnCap => println!("\nThat's all the questions for this session."),
        StopReason::FallbacksExhausted => println!("\nI'm out of questions for now."),
        StopReason::Cancelled => println!(
            "\nInterview paused. Resume with --resume {}",
            state.session_id
        ),
    }
    print_profile(&state);
    println!(
        "Completion confidence {} ({}): {}",
        outcome.assessment.confidence,
        outcome.assessment.recommendation,
        outcome.assessment.reasoning
    );
    Ok(())
}

fn build_proposer(config: &AppConfig, offline: bool) -> Result<Box<dyn TextProposer>> {
    if offline {
        return Ok(Box::new(OfflineProposer));
    }
    match HttpProposerConfig::from_settings(&config.proposer) {
        Some(settings) => {
            let proposer = HttpProposer::new(settings)
                .map_err(|err| anyhow!("Failed to create proposer client: {err}"))?;
            Ok(Box::new(proposer))
        }
        None => {
            tracing::info!("no proposer endpoint configured; using template questions");
            Ok(Box::new(OfflineProposer))
        }
    }
}

fn read_query(input: &mut impl BufRead, output: &mut impl Write) -> Result<String> {
    write!(output, "What can I help you research? ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let query = line.trim().to_string();
    if query.is_empty() {
        return Err(anyhow!("A query is required to start an interview."));
    }
    Ok(query)
}

fn list_sessions(store: &SessionStore) -> Result<()> {
    let sessions = store.list()?;
    if sessions.is_empty() {
        println!("No saved sessions in {}", store.root().display());
        return Ok(());
    }
    for session in sessions {
        println!(
            "{}  {}  {} turns  {}",
            session.session_id,
            session.updated_at.format("%Y-%m-%d %H:%M"),
            session.turns,
            session.query
        );
    }
    Ok(())
}

fn print_profile(state: &ConversationState) {
    if state.profile.is_empty() {
        println!("No profile details recorded yet.");
        return;
    }
    println!("\nWhat I learned:");
    for (category, value) in &state.profile {
        let confidence = state
            .confidence_scores
            .get(category)
            .map(|score| score.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {category:<18} {} (confidence {confidence})",
            value.summary(SUMMARY_VALUE_CHARS)
        );
    }
    if !state.information_gaps.is_empty() {
        println!("Still open: {}", state.information_gaps.join(", "));
    }
}

struct CliArgs {
    query: Option<String>,
    resume: Option<String>,
    config: Option<PathBuf>,
    offline: bool,
    list: bool,
    write_config: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut query = None;
        let mut resume = None;
        let mut config = None;
        let mut offline = false;
        let mut list = false;
        let mut write_config = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--query" | "-q" => {
                    let value = args.next().context("Expected text after --query")?;
                    query = Some(value);
                }
                "--resume" => {
                    let value = args.next().context("Expected a session id after --resume")?;
                    resume = Some(value);
                }
                "--config" => {
                    let value = args.next().context("Expected a path after --config")?;
                    config = Some(PathBuf::from(value));
                }
                "--offline" => offline = true,
                "--list" => list = true,
                "--write-config" => write_config = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument '{other}'. Run with --help for usage instructions."
                    ));
                }
            }
        }
        if query.is_some() && resume.is_some() {
            return Err(anyhow!("--query and --resume cannot be combined."));
        }
        Ok(Self {
            query,
            resume,
            config,
            offline,
            list,
            write_config,
        })
    }
}

fn print_usage() {
    println!("ResearchIntake interview");
    println!("Asks clarifying questions until your request is understood well enough.");
    println!();
    println!("Usage: intake [--query <text>] [--resume <session-id>] [--offline] [--config <path>]");
    println!("       intake --list | --write-config");
    println!();
    println!("  --query <text>      Start a new interview for this request");
    println!("  --resume <id>       Continue a saved session");
    println!("  --offline           Use template questions only");
    println!("  --config <path>     Read settings from this config.toml");
    println!("  --list              Show saved sessions");
    println!("  --write-config      Save the effective settings (to --config if given, else the workspace config.toml)");
}
