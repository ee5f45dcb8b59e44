use std::env;
use std::fs;
use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context as _};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use directories::BaseDirs;
use fete::ai::AiPlanner;
use fete::save::{save_selections, AssumeYes, Confirm, StdinConfirm};
use fete::store::{open_store, FileStore};
use fete::text::{plan_lines, saved_event_lines, stored_event_lines, to_plain};
use fete::{config_store, plans, tui};
use fete_core::catalog::Catalog;
use fete_core::paths::{compute_paths, FetePaths, PathInputs};
use fete_core::save::SaveOutcome;
use fete_core::session::{build_plan_ui, RenderSession};
use fete_protocol::EventDetails;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fete",
    version,
    about = "fete — plan an event with an AI collaborator and pick the options you like"
)]
struct Cli {
    #[arg(long, global = true, value_name = "DIR", env = "FETE_DIR")]
    fete_dir: Option<PathBuf>,

    #[arg(long, global = true, env = "FETE_LOG", value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the AI for a plan, store it, and browse it.
    Plan(PlanArgs),
    /// Browse a stored plan interactively.
    Open { file: PathBuf },
    /// Print a stored plan as text.
    Render { file: PathBuf },
    /// Save selections from a stored plan without the TUI.
    Save {
        file: PathBuf,
        /// Section picks as `key=1` or `key=1,3` (positions start at 1).
        #[arg(long = "select", value_name = "KEY=POS[,POS]")]
        selections: Vec<String>,
        /// Save even when single-choice sections are left unpicked.
        #[arg(long)]
        yes: bool,
    },
    Events {
        #[command(subcommand)]
        command: EventsCommand,
    },
    Version,
    Completion {
        #[command(subcommand)]
        command: CompletionCommand,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, value_name = "DATE", default_value = "")]
    date: String,
    #[arg(long, value_name = "N", default_value_t = 10)]
    guests: u32,
    #[arg(long, value_name = "AMOUNT", default_value_t = 0.0)]
    budget: f64,
    #[arg(long, default_value = "home")]
    venue: String,
    #[arg(long)]
    setting: Option<String>,
    /// Print the plan instead of opening the TUI.
    #[arg(long)]
    print: bool,
}

#[derive(Subcommand, Debug)]
enum EventsCommand {
    List,
    Show {
        id: String,
    },
    /// Delete a saved event.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CompletionCommand {
    Bash,
    Fish,
    Powershell,
    Zsh,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let paths = resolve_paths(cli.fete_dir.as_ref())?;
    let owns_terminal = match &cli.command {
        Command::Plan(args) => !args.print,
        Command::Open { .. } => true,
        _ => false,
    };
    init_logging(&paths, cli.log_level.as_deref(), !owns_terminal)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "fete starting");

    dispatch(cli.command, &paths).await
}

fn resolve_paths(fete_dir_override: Option<&PathBuf>) -> anyhow::Result<FetePaths> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not determine home directory"))?;
    let home_dir = base_dirs.home_dir().to_path_buf();

    let xdg_config_home = match env::var_os("XDG_CONFIG_HOME") {
        Some(v) => Some(PathBuf::from(v)),
        None => Some(base_dirs.config_dir().to_path_buf()),
    };

    let fete_dir_override = fete_dir_override
        .cloned()
        .or_else(|| env::var_os("FETE_DIR").map(PathBuf::from));

    Ok(compute_paths(PathInputs {
        home_dir,
        xdg_config_home,
        fete_dir_override,
    }))
}

fn init_logging(
    paths: &FetePaths,
    log_level: Option<&str>,
    enable_stderr_logging: bool,
) -> anyhow::Result<()> {
    let dir_ok = fs::create_dir_all(&paths.base_dir).is_ok();

    let env_level = env::var("RUST_LOG").ok();
    let level = log_level
        .map(str::to_owned)
        .or_else(|| env::var("FETE_LOG").ok())
        .or(env_level)
        .unwrap_or_else(|| "info".to_owned());

    let filter = EnvFilter::try_new(level).context("parse log level")?;

    let file_layer = if dir_ok {
        tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(tracing_appender::rolling::Rotation::NEVER)
            .filename_prefix("fete")
            .filename_suffix("log")
            .build(&paths.base_dir)
            .ok()
            .map(|file_appender| {
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(file_appender)
            })
    } else {
        None
    };

    if enable_stderr_logging {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_writer(io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(stderr_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    Ok(())
}

async fn dispatch(command: Command, paths: &FetePaths) -> anyhow::Result<()> {
    match command {
        Command::Plan(args) => plan(args, paths).await,
        Command::Open { file } => open(file, paths).await,
        Command::Render { file } => render(file, paths).await,
        Command::Save {
            file,
            selections,
            yes,
        } => save(file, selections, yes, paths).await,
        Command::Events { command } => dispatch_events(command, paths).await,
        Command::Version => version(),
        Command::Completion { command } => completion(command),
    }
}

fn version() -> anyhow::Result<()> {
    println!("{}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn completion(command: CompletionCommand) -> anyhow::Result<()> {
    let shell = match command {
        CompletionCommand::Bash => Shell::Bash,
        CompletionCommand::Fish => Shell::Fish,
        CompletionCommand::Powershell => Shell::PowerShell,
        CompletionCommand::Zsh => Shell::Zsh,
    };

    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    generate(shell, &mut cmd, "fete", &mut buf);
    write_stdout(&buf).context("write completion script to stdout")
}

fn write_stdout(bytes: &[u8]) -> io::Result<()> {
    match io::stdout().write_all(bytes) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err),
    }
}

async fn load_catalog(paths: &FetePaths) -> anyhow::Result<Catalog> {
    let cfg = config_store::load(paths).await?;
    Ok(cfg.catalog()?)
}

async fn plan(args: PlanArgs, paths: &FetePaths) -> anyhow::Result<()> {
    let cfg = config_store::load(paths).await?;
    let catalog = cfg.catalog()?;
    let planner = AiPlanner::from_env(&cfg.effective_ai())?;

    let details = EventDetails {
        title: args.title,
        description: args.description,
        event_date: args.date,
        guest_count: args.guests,
        total_budget: args.budget,
        venue_type: args.venue,
        event_setting: args.setting,
    };
    if args.print {
        eprintln!("Asking the planner about {}…", details.title);
    }

    let reply = planner.plan(&details).await?;
    let stored = plans::store_raw(paths, &reply.raw).await?;
    let session = build_plan_ui(reply.plan, &catalog);

    if args.print {
        eprintln!("Plan stored at {}", stored.display());
        print_session(&session)
    } else {
        let store = open_store(&cfg.effective_storage(), paths)?;
        tui::run(session, store.as_ref()).await
    }
}

async fn open(file: PathBuf, paths: &FetePaths) -> anyhow::Result<()> {
    let cfg = config_store::load(paths).await?;
    let catalog = cfg.catalog()?;
    let plan = plans::load(&file).await?;
    let store = open_store(&cfg.effective_storage(), paths)?;
    tui::run(build_plan_ui(plan, &catalog), store.as_ref()).await
}

async fn render(file: PathBuf, paths: &FetePaths) -> anyhow::Result<()> {
    let catalog = load_catalog(paths).await?;
    let plan = plans::load(&file).await?;
    print_session(&build_plan_ui(plan, &catalog))
}

fn print_session(session: &RenderSession) -> anyhow::Result<()> {
    let (lines, _) = plan_lines(session.view(), session.selections(), None, true);
    write_stdout(to_plain(&lines).as_bytes()).context("write plan to stdout")
}

async fn save(
    file: PathBuf,
    selections: Vec<String>,
    yes: bool,
    paths: &FetePaths,
) -> anyhow::Result<()> {
    let cfg = config_store::load(paths).await?;
    let catalog = cfg.catalog()?;
    let plan = plans::load(&file).await?;
    let mut session = build_plan_ui(plan, &catalog);

    for raw in &selections {
        let (key, positions) = parse_selection(raw)?;
        for position in positions {
            session
                .choose(&key, position - 1)
                .with_context(|| format!("select {raw}"))?;
        }
    }

    let store = open_store(&cfg.effective_storage(), paths)?;
    let mut confirm: Box<dyn Confirm> = if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinConfirm)
    };

    match save_selections(&session, store.as_ref(), confirm.as_mut()).await? {
        SaveOutcome::Saved {
            event_id,
            tasks_saved,
            budget_items_saved,
        } => {
            let lines = saved_event_lines(
                &event_id,
                tasks_saved,
                budget_items_saved,
                &session.selected_options(),
            );
            print!("{}", to_plain(&lines));
        }
        SaveOutcome::Declined => println!("Not saved"),
    }
    Ok(())
}

/// `themes=2` or `activities=1,3`; positions start at 1.
fn parse_selection(raw: &str) -> anyhow::Result<(String, Vec<usize>)> {
    let (key, positions) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid selection {raw:?}: expected KEY=POS[,POS]"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("invalid selection {raw:?}: missing section key"));
    }

    let mut out = Vec::new();
    for part in positions.split(',') {
        let position: usize = part
            .trim()
            .parse()
            .with_context(|| format!("invalid position {part:?} in {raw:?}"))?;
        if position == 0 {
            return Err(anyhow!("invalid selection {raw:?}: positions start at 1"));
        }
        out.push(position);
    }
    Ok((key.to_owned(), out))
}

async fn dispatch_events(command: EventsCommand, paths: &FetePaths) -> anyhow::Result<()> {
    let store = FileStore::new(paths);
    match command {
        EventsCommand::List => {
            let events = store.list().await?;
            if events.is_empty() {
                println!("No saved events");
                return Ok(());
            }

            let fmt = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]");
            println!("ID\tCREATED\tTYPE\tPICKS");
            for event in events {
                let created = time::OffsetDateTime::parse(&event.created_at, &Rfc3339)
                    .ok()
                    .and_then(|t| t.format(fmt).ok())
                    .unwrap_or_else(|| "-".to_owned());
                println!(
                    "{}\t{}\t{}\t{}",
                    event.id,
                    created,
                    event.event_classification,
                    event.selected_options.len()
                );
            }
            Ok(())
        }
        EventsCommand::Show { id } => {
            let event = store.load(&id).await?;
            print!("{}", to_plain(&stored_event_lines(&event)));
            Ok(())
        }
        EventsCommand::Delete { id, yes } => {
            let event = store.load(&id).await?;
            if !yes && !StdinConfirm.confirm(&format!("Delete event {}?", event.id)) {
                println!("Not deleted");
                return Ok(());
            }
            store.delete(&event.id).await?;
            println!("Deleted event {}", event.id);
            Ok(())
        }
    }
}
