//! Subcommand execution.
//!
//! Each command loads the router once; the `session` command owns the only
//! `SearchContext` and threads it through every turn.

use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::info;
use voucher_router::{
    classify_detailed, detect_ui_language, extract_parameters, ConfigSource, Language, RouterConfig,
    SearchContext, SearchParams, Session, TwoTierRouter,
};

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::output;

/// Shared settings resolved from global flags.
pub struct Runtime {
    pub config: RouterConfig,
    pub source: ConfigSource,
    pub language: Option<Language>,
    pub json: bool,
}

impl Runtime {
    pub fn load(cli: &Cli) -> Result<Self> {
        let (mut config, source) = RouterConfig::load(cli.config.as_deref())?;
        if cli.no_llm {
            config.llm.enabled = false;
        }
        Ok(Self {
            config,
            source,
            language: cli.language,
            json: cli.json,
        })
    }

    fn router(&self) -> Result<TwoTierRouter> {
        TwoTierRouter::from_config(&self.config).context("Failed to build router")
    }

    fn language_for(&self, message: &str) -> Language {
        self.language.unwrap_or_else(|| detect_ui_language(message))
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let runtime = Runtime::load(&cli)?;
    info!(source = %runtime.source, llm = runtime.config.llm.enabled, "configuration loaded");

    match cli.command {
        Commands::Route { message, previous } => route(&runtime, &message, previous.as_deref()),
        Commands::Classify {
            message,
            with_context,
        } => classify(&runtime, &message, with_context),
        Commands::Extract { message } => extract(&runtime, &message),
        Commands::Session => session(&runtime),
        Commands::Config { action } => match action {
            ConfigCommands::Show => config_show(&runtime),
            ConfigCommands::Init { path, force } => config_init(&path, force),
        },
    }
}

/// Context for a one-shot route: the `--previous` search, if given.
pub fn previous_context(previous: Option<&str>, history_limit: usize) -> Result<Option<SearchContext>> {
    let Some(json) = previous else {
        return Ok(None);
    };
    let params: SearchParams =
        serde_json::from_str(json).context("--previous must be a JSON search object")?;
    let mut context = SearchContext::with_history_limit(history_limit);
    context.commit(&params);
    Ok(Some(context))
}

fn route(runtime: &Runtime, message: &str, previous: Option<&str>) -> Result<()> {
    let router = runtime.router()?;
    let context = previous_context(previous, runtime.config.context.history_limit)?;
    let response = router.route(message, context.as_ref(), runtime.language_for(message));

    if runtime.json {
        return output::print_json(&response);
    }
    output::print_response(&response);
    Ok(())
}

fn classify(runtime: &Runtime, message: &str, with_context: bool) -> Result<()> {
    let context = with_context.then(SearchContext::new);
    let result = classify_detailed(message, context.as_ref());

    if runtime.json {
        return output::print_json(&result);
    }
    output::print_classification(&result);
    Ok(())
}

fn extract(runtime: &Runtime, message: &str) -> Result<()> {
    let params = extract_parameters(message);

    if runtime.json {
        return output::print_json(&params);
    }
    output::print_params(&params);
    Ok(())
}

/// A line typed at the session prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionInput {
    Message(String),
    Results(u32),
    ShowContext,
    Reset,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub fn parse_session_input(line: &str) -> SessionInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return SessionInput::Empty;
    }
    let Some(command) = trimmed.strip_prefix(':') else {
        return SessionInput::Message(trimmed.to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("results"), Some(n)) => match n.parse() {
            Ok(count) => SessionInput::Results(count),
            Err(_) => SessionInput::Invalid(format!("not a result count: {}", n)),
        },
        (Some("results"), None) => SessionInput::Invalid("usage: :results N".to_string()),
        (Some("context"), _) => SessionInput::ShowContext,
        (Some("reset"), _) => SessionInput::Reset,
        (Some("help"), _) => SessionInput::Help,
        (Some("quit") | Some("q") | Some("exit"), _) => SessionInput::Quit,
        (Some(other), _) => SessionInput::Invalid(format!("unknown command :{}", other)),
        (None, _) => SessionInput::Empty,
    }
}

const SESSION_HELP: &str = "Type a message to route it against the current search.\n\
  :results N   report how many listings the last search returned\n\
  :context     show the current search and history\n\
  :reset       forget the current search\n\
  :quit        leave the session";

fn session(runtime: &Runtime) -> Result<()> {
    let router = runtime.router()?;
    let context = SearchContext::with_history_limit(runtime.config.context.history_limit);
    let mut session = Session::with_context(context, runtime.language.unwrap_or_default());
    let mut language_fixed = runtime.language.is_some();

    if !runtime.json {
        println!("{}", "voucherctl session".bold());
        println!("{}", SESSION_HELP.dimmed());
        println!();
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if !runtime.json {
            print!("{} ", ">".cyan());
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        match parse_session_input(&line) {
            SessionInput::Empty => {}
            SessionInput::Quit => break,
            SessionInput::Help => println!("{}", SESSION_HELP),
            SessionInput::Invalid(reason) => println!("{} {}", "[ERROR]".bright_red(), reason),
            SessionInput::Reset => {
                session.reset();
                println!("Search cleared.");
            }
            SessionInput::ShowContext => {
                if runtime.json {
                    output::print_json(session.context())?;
                } else {
                    output::print_context(session.context());
                }
            }
            SessionInput::Results(count) => {
                session.record_result_count(count);
                println!("Recorded {} result(s) for the current search.", count);
            }
            SessionInput::Message(message) => {
                if !language_fixed {
                    session.set_language(detect_ui_language(&message));
                    language_fixed = true;
                }
                let found_nothing = session.context().last_result_count() == Some(0);
                let outcome = session.turn(&router, &message);
                if runtime.json {
                    output::print_json(&outcome)?;
                } else {
                    output::print_turn(&outcome, session.context(), found_nothing);
                }
            }
        }
    }

    Ok(())
}

fn config_show(runtime: &Runtime) -> Result<()> {
    let mut shown = runtime.config.clone();
    if shown.llm.api_key.is_some() {
        shown.llm.api_key = Some("********".to_string());
    }

    if runtime.json {
        return output::print_json(&shown);
    }
    println!("# source: {}", runtime.source);
    print!("{}", shown.to_toml()?);
    Ok(())
}

fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    RouterConfig::default().save(path)?;
    println!("{} wrote defaults to {}", "[OK]".bright_green(), path.display());
    Ok(())
}
