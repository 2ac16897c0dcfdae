//! Command-line interface for `iterion`.
//!
//! This module provides the CLI parsing and command routing using clap.

pub mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use tracing::debug;

use iterion_lib::model::{ItemKind, Organization, Priority, StoryStatus};
use iterion_lib::{IterionError, OrgScope, SprintFilter, Workspace, seed};

use crate::config::{CliOverrides, Config};
use crate::logging;

/// `iterion` (itr) - agile delivery core.
#[derive(Parser, Debug)]
#[command(name = "itr")]
#[command(
    author,
    version,
    about = "Agile delivery core: org dashboards, discovery search and kanban board",
    long_about = None,
    after_help = "Reads the built-in demo workspace unless --seed points at a JSON fixture. Nothing is written back."
)]
pub struct Cli {
    /// Output format: text (default) or json
    #[arg(long, global = true)]
    pub json: bool,

    /// Organization id or name (defaults to the first organization)
    #[arg(long, global = true)]
    pub org: Option<String>,

    /// Load this JSON fixture instead of the demo workspace
    #[arg(long, global = true, value_name = "FIXTURE")]
    pub seed: Option<PathBuf>,

    /// Assistant model override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit log events as JSON lines on stderr
    #[arg(long, global = true, env = "ITERION_LOG_JSON")]
    pub log_json: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Org dashboard: completion, velocity, priority mix, epic delivery
    Dashboard(DashboardArgs),

    /// Search epics, stories and tasks together
    #[command(alias = "search")]
    Discover(DiscoverArgs),

    /// Kanban board of the org's stories
    Board(BoardArgs),

    /// List org members and what an acting user may change
    Team(TeamArgs),

    /// List organizations
    Orgs,

    /// AI executive summary of a story
    Summarize(SummarizeArgs),

    /// Chat with the AI assistant
    Chat(ChatArgs),

    /// Check workspace consistency and assistant setup
    Doctor,

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Show version information
    Version(VersionArgs),
}

#[derive(Args, Debug, Default)]
pub struct DashboardArgs {
    /// Number of epics in the delivery chart
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct DiscoverArgs {
    /// Case-insensitive text to match against names and titles
    pub text: Option<String>,

    /// Item type: epic, story, task or bug
    #[arg(long = "type", short = 't')]
    pub kind: Option<ItemKind>,

    /// Status label, e.g. "In Progress"
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Priority: low, medium, high or urgent
    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,

    /// Owner or assignee (user id or name)
    #[arg(long, short = 'a')]
    pub assignee: Option<String>,

    /// Sprint id, "backlog" or "any"
    #[arg(long, value_parser = parse_sprint_filter)]
    pub sprint: Option<SprintFilter>,

    /// List the status labels present instead of items
    #[arg(long)]
    pub statuses: bool,
}

#[derive(Args, Debug, Default)]
pub struct BoardArgs {
    /// Sprint id, "backlog" or "any" (defaults to the active sprint)
    #[arg(long, value_parser = parse_sprint_filter)]
    pub sprint: Option<SprintFilter>,

    /// Assignee (user id or name)
    #[arg(long, short = 'a')]
    pub assignee: Option<String>,

    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,

    /// Epic id or name
    #[arg(long, short = 'e')]
    pub epic: Option<String>,

    #[arg(long, short = 's')]
    pub status: Option<StoryStatus>,

    /// Text to match against story titles
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct TeamArgs {
    /// Acting user id; annotates who they may modify
    #[arg(long = "as", value_name = "USER")]
    pub as_user: Option<String>,
}

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Story id
    pub story_id: String,
}

#[derive(Args, Debug, Default)]
pub struct ChatArgs {
    /// Message to send; repeat for several turns. Reads stdin when omitted.
    #[arg(long, short = 'm')]
    pub message: Vec<String>,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Print only the version number
    #[arg(long)]
    pub short: bool,
}

/// Parse `any`, `backlog` or a sprint id.
///
/// # Errors
///
/// Returns an error for an empty value.
pub fn parse_sprint_filter(value: &str) -> Result<SprintFilter, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("sprint cannot be empty".to_string());
    }
    Ok(match value.to_ascii_lowercase().as_str() {
        "any" | "all" => SprintFilter::Any,
        "backlog" | "none" => SprintFilter::Backlog,
        _ => SprintFilter::Sprint(value.to_string()),
    })
}

/// A loaded workspace with its selected organization.
#[derive(Debug)]
pub struct Session {
    pub config: Config,
    pub workspace: Workspace,
    pub org: Organization,
}

impl Session {
    /// Load the workspace named by `config` and select its org.
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture cannot be loaded or no organization
    /// matches.
    pub fn open(config: Config) -> Result<Self> {
        let workspace = load_workspace(&config)?;
        let org = select_org(&workspace, config.default_org.as_deref())?.clone();
        debug!(org = %org.id, "organization selected");
        Ok(Self {
            config,
            workspace,
            org,
        })
    }

    #[must_use]
    pub fn scope(&self) -> OrgScope<'_> {
        OrgScope::resolve(&self.workspace, &self.org.id)
    }
}

/// The fixture from `config.seed`, or the demo workspace.
///
/// # Errors
///
/// Returns an error if the fixture is missing or malformed.
pub fn load_workspace(config: &Config) -> Result<Workspace> {
    match config.seed {
        Some(ref path) => seed::load_fixture(path)
            .with_context(|| format!("Failed to load fixture {}", path.display())),
        None => Ok(seed::demo_workspace()),
    }
}

/// Find an org by exact id, then by case-insensitive name.
///
/// With no selector the first organization wins.
///
/// # Errors
///
/// Returns an error if nothing matches or the workspace has no orgs.
pub fn select_org<'a>(workspace: &'a Workspace, selector: Option<&str>) -> Result<&'a Organization> {
    let Some(selector) = selector else {
        return workspace
            .orgs()
            .first()
            .context("Workspace has no organizations");
    };
    let found = workspace.get_org(selector).or_else(|| {
        workspace
            .orgs()
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(selector))
    });
    found.ok_or_else(|| {
        IterionError::OrgNotFound {
            id: selector.to_string(),
        }
        .into()
    })
}

/// Run the CLI.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet, cli.log_json)
        .context("Failed to initialize logging")?;

    let overrides = CliOverrides {
        org: cli.org,
        seed: cli.seed,
        model: cli.model,
    };
    let json = cli.json;
    let session = || -> Result<Session> { Session::open(Config::load(&overrides)?) };

    let Some(command) = cli.command else {
        println!("itr - agile delivery core. Use --help for usage.");
        return Ok(());
    };
    debug!(command = command.name(), "dispatching");

    match command {
        Commands::Dashboard(args) => commands::dashboard::execute(&args, &session()?, json),
        Commands::Discover(args) => commands::discover::execute(&args, &session()?, json),
        Commands::Board(args) => commands::board::execute(&args, &session()?, json),
        Commands::Team(args) => commands::team::execute(&args, &session()?, json),
        Commands::Orgs => commands::orgs::execute(&session()?, json),
        Commands::Summarize(args) => commands::summarize::execute(&args, &session()?, json),
        Commands::Chat(args) => commands::chat::execute(&args, &session()?, json),
        Commands::Doctor => commands::doctor::execute(&Config::load(&overrides)?, json),
        Commands::Completions(args) => commands::completions::execute(&args),
        Commands::Version(args) => commands::version::execute(&args, json),
    }
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Dashboard(_) => "dashboard",
            Self::Discover(_) => "discover",
            Self::Board(_) => "board",
            Self::Team(_) => "team",
            Self::Orgs => "orgs",
            Self::Summarize(_) => "summarize",
            Self::Chat(_) => "chat",
            Self::Doctor => "doctor",
            Self::Completions(_) => "completions",
            Self::Version(_) => "version",
        }
    }
}
