//! Binary entry point for the coachgraph CLI.
#![forbid(unsafe_code)]

mod config;
mod ui;

use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use coachgraph::{
    cli::import_export::{load_graph, save_graph},
    generator::{random_coaching_graph, seeded_rng, GeneratorConfig},
    infection::CounterMetrics,
    CoachingGraph, InfectionEngine, InfectionOptions, InfectionOutcome, InfectionReport,
};
use rand::Rng;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::{CliConfig, Profile, ProfileUpdate};
use ui::{format_duration, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "coachgraph",
    version,
    about = "Roll out features across coaching graphs",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        env = "COACHGRAPH_CONFIG",
        value_name = "FILE",
        help = "CLI config file (defaults to the user config directory)"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_name = "NAME", help = "Config profile to apply")]
    profile: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "N",
        help = "Cap on exact-search expansions"
    )]
    max_search_steps: Option<u64>,

    #[arg(long, global = true, value_enum, help = "Color theme for text output")]
    theme: Option<ThemeArg>,

    #[arg(long, short, global = true, help = "Suppress decorations and spinners")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Infect the whole component around a user")]
    Total(TotalCmd),

    #[command(about = "Infect whole components totalling exactly N users")]
    Exact(ExactCmd),

    #[command(about = "Infect between MIN and MAX users")]
    Limited(LimitedCmd),

    #[command(about = "Summarize the connected components of a graph")]
    Components {
        #[arg(value_name = "GRAPH")]
        graph: PathBuf,
    },

    #[command(about = "Generate a random coaching graph")]
    Generate(GenerateCmd),

    #[command(about = "Manage CLI config profiles")]
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

#[derive(Args, Debug)]
struct InfectArgs {
    #[arg(value_name = "GRAPH", help = "Graph document to read")]
    graph: PathBuf,

    #[arg(long, help = "Feature to apply; prefix with '!' to remove it")]
    feature: String,

    #[arg(long, value_name = "FILE", help = "Write the updated graph here")]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TotalCmd {
    #[command(flatten)]
    target: InfectArgs,

    #[arg(long, value_name = "ID", help = "User whose component is infected")]
    user: String,
}

#[derive(Args, Debug)]
struct ExactCmd {
    #[command(flatten)]
    target: InfectArgs,

    #[arg(long, value_name = "N")]
    count: usize,
}

#[derive(Args, Debug)]
struct LimitedCmd {
    #[command(flatten)]
    target: InfectArgs,

    #[arg(long, value_name = "N")]
    min: usize,

    #[arg(long, value_name = "N")]
    max: usize,
}

#[derive(Args, Debug)]
struct GenerateCmd {
    #[arg(value_name = "OUT")]
    out: PathBuf,

    #[arg(long, value_name = "N")]
    classes: usize,

    #[arg(long, value_name = "N", default_value_t = 1)]
    min_size: usize,

    #[arg(long, value_name = "N", default_value_t = 30)]
    max_size: usize,

    #[arg(long, value_name = "RATE", default_value_t = 0.0)]
    existing_rate: f64,

    #[arg(long, help = "RNG seed; random when omitted")]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    #[command(about = "List configured profiles")]
    List,

    #[command(about = "Show one profile")]
    Show { name: String },

    #[command(about = "Create or update a profile from --max-search-steps, --theme and --log-level")]
    Set {
        name: String,

        #[arg(long, value_name = "FILTER")]
        log_level: Option<String>,
    },

    #[command(about = "Delete a profile")]
    Delete { name: String },

    #[command(about = "Set or clear the default profile")]
    Default {
        name: Option<String>,

        #[arg(long, conflicts_with = "name")]
        clear: bool,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ThemeArg {
    Auto,
    Light,
    Dark,
    Plain,
}

#[derive(Serialize)]
struct ComponentsReport {
    users: usize,
    edges: usize,
    components: usize,
    sizes: Vec<usize>,
    parents: usize,
    singletons: usize,
}

#[derive(Serialize)]
struct GenerateReport {
    path: PathBuf,
    seed: u64,
    users: usize,
    edges: usize,
    components: usize,
}

#[derive(Serialize)]
struct ProfileView<'a> {
    name: &'a str,
    default: bool,
    max_search_steps: Option<u64>,
    log_level: Option<&'a str>,
    theme: Option<String>,
}

impl<'a> ProfileView<'a> {
    fn new(profile: &'a Profile, config: &CliConfig) -> Self {
        Self {
            name: &profile.name,
            default: config.default_profile_name() == Some(profile.name.as_str()),
            max_search_steps: profile.max_search_steps,
            log_level: profile.log_level.as_deref(),
            theme: profile.theme.map(|t| format!("{t:?}").to_lowercase()),
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.clone())?;
    let profile = config.active_profile(cli.profile.as_deref())?.cloned();
    install_tracing(profile.as_ref().and_then(|p| p.log_level.as_deref()));

    let theme = cli
        .theme
        .or(profile.as_ref().and_then(|p| p.theme))
        .unwrap_or(ThemeArg::Auto);
    let ui = Ui::new(theme, cli.quiet);
    let max_steps = cli
        .max_search_steps
        .or(profile.as_ref().and_then(|p| p.max_search_steps));
    let metrics = Arc::new(CounterMetrics::default());
    let engine = InfectionEngine::new(InfectionOptions::new().max_search_steps(max_steps))
        .with_metrics(metrics.clone());
    debug!(
        profile = profile.as_ref().map(|p| p.name.as_str()),
        max_steps, "cli.started"
    );

    match cli.command {
        Command::Total(cmd) => {
            let target = cmd.target;
            infect(&cli.format, &ui, &target, |graph| {
                engine.total_infection(graph, &target.feature, &cmd.user)
            })?;
        }
        Command::Exact(cmd) => {
            let target = cmd.target;
            infect(&cli.format, &ui, &target, |graph| {
                engine.exact_limited_infection(graph, &target.feature, cmd.count)
            })?;
        }
        Command::Limited(cmd) => {
            let target = cmd.target;
            infect(&cli.format, &ui, &target, |graph| {
                engine.limited_infection(graph, &target.feature, cmd.min, cmd.max)
            })?;
        }
        Command::Components { graph } => {
            let graph = load_graph(&graph)?;
            let report = components_report(&graph);
            emit(&cli.format, &report, |_| print_components_text(&ui, &report))?;
        }
        Command::Generate(cmd) => {
            let report = run_generate(&ui, &cmd)?;
            emit(&cli.format, &report, |_| {
                ui.success(&format!(
                    "Generated {} users and {} edges into {}",
                    report.users,
                    report.edges,
                    report.path.display()
                ));
                ui.section(
                    "Graph",
                    [
                        ("seed", report.seed),
                        ("components", report.components as u64),
                    ],
                );
            })?;
        }
        Command::Profile { command } => {
            let defaults = ProfileUpdate {
                max_search_steps: cli.max_search_steps,
                log_level: None,
                theme: cli.theme,
            };
            run_profile(&cli.format, &ui, &mut config, command, defaults)?;
        }
    }

    debug!(
        component_scans = metrics.component_scans.load(Ordering::Relaxed),
        exact_steps = metrics.exact_steps.load(Ordering::Relaxed),
        frontier_passes = metrics.frontier_passes.load(Ordering::Relaxed),
        frontier_peak = metrics.frontier_peak.load(Ordering::Relaxed),
        "cli.finished"
    );
    Ok(())
}

fn install_tracing(profile_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(profile_level.unwrap_or("warn")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Loads the graph, runs one policy and writes the graph back on success.
///
/// Exits with status 2 after printing the report when the target is
/// infeasible.
fn infect<F>(
    format: &OutputFormat,
    ui: &Ui,
    target: &InfectArgs,
    policy: F,
) -> Result<(), Box<dyn Error>>
where
    F: FnOnce(&mut CoachingGraph) -> coachgraph::Result<InfectionReport>,
{
    let mut graph = load_graph(&target.graph)?;
    let task = ui.task(format!("Infecting '{}'", target.feature));
    let report = policy(&mut graph)?;
    let elapsed = task.finish();

    if report.is_success() {
        if let Some(out) = &target.out {
            save_graph(&graph, out)?;
        }
    }
    emit(format, &report, |_| {
        print_report_text(ui, &report, target.out.as_ref(), elapsed)
    })?;
    if !report.is_success() {
        std::process::exit(2);
    }
    Ok(())
}

fn components_report(graph: &CoachingGraph) -> ComponentsReport {
    let mut sizes: Vec<usize> = graph
        .all_connected_components()
        .iter()
        .map(Vec::len)
        .collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    ComponentsReport {
        users: graph.len(),
        edges: graph.edge_count(),
        components: sizes.len(),
        sizes,
        parents: graph.all_parents().len(),
        singletons: graph.all_singletons().len(),
    }
}

fn run_generate(ui: &Ui, cmd: &GenerateCmd) -> Result<GenerateReport, Box<dyn Error>> {
    let seed = cmd.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let cfg = GeneratorConfig {
        classes: cmd.classes,
        min_class_size: cmd.min_size,
        max_class_size: cmd.max_size,
        existing_rate: cmd.existing_rate,
    };
    let task = ui.task(format!("Generating {} classes", cmd.classes));
    let graph = random_coaching_graph(&mut seeded_rng(seed), &cfg)?;
    save_graph(&graph, &cmd.out)?;
    task.finish();
    Ok(GenerateReport {
        path: cmd.out.clone(),
        seed,
        users: graph.len(),
        edges: graph.edge_count(),
        components: graph.all_connected_components().len(),
    })
}

fn run_profile(
    format: &OutputFormat,
    ui: &Ui,
    config: &mut CliConfig,
    command: ProfileCommand,
    update: ProfileUpdate,
) -> Result<(), Box<dyn Error>> {
    match command {
        ProfileCommand::List => {
            let shared: &CliConfig = config;
            let views: Vec<ProfileView<'_>> = shared
                .profiles()
                .map(|p| ProfileView::new(p, shared))
                .collect();
            emit(format, &views, |_| {
                if views.is_empty() {
                    ui.warn("No profiles configured");
                }
                ui.list(
                    "Profiles",
                    views.iter().map(|v| {
                        let marker = if v.default { " (default)" } else { "" };
                        format!("{}{marker}", v.name)
                    }),
                );
            })?;
        }
        ProfileCommand::Show { name } => {
            let profile = config
                .profile(&name)
                .ok_or_else(|| config::ConfigError::ProfileNotFound { name: name.clone() })?;
            let view = ProfileView::new(profile, config);
            emit(format, &view, |_| print_profile_text(ui, &view))?;
        }
        ProfileCommand::Set { name, log_level } => {
            config.upsert_profile(&name, ProfileUpdate { log_level, ..update })?;
            let path = config.persist()?;
            ui.success(&format!("Saved profile '{name}' to {}", path.display()));
        }
        ProfileCommand::Delete { name } => {
            config.delete_profile(&name)?;
            let path = config.persist()?;
            ui.success(&format!("Deleted profile '{name}' from {}", path.display()));
        }
        ProfileCommand::Default { name, clear } => {
            if clear {
                config.set_default_profile(None)?;
            } else if let Some(name) = name.as_deref() {
                config.set_default_profile(Some(name))?;
            }
            if clear || name.is_some() {
                config.persist()?;
            }
            match config.default_profile_name() {
                Some(current) => ui.success(&format!("Default profile: {current}")),
                None => ui.warn("No default profile"),
            }
        }
    }
    Ok(())
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: FnOnce(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}

fn print_report_text(
    ui: &Ui,
    report: &InfectionReport,
    out: Option<&PathBuf>,
    elapsed: std::time::Duration,
) {
    match &report.outcome {
        InfectionOutcome::Infected => ui.success(&format!(
            "Infected {} users with '{}' in {}",
            report.infected,
            report.feature,
            format_duration(elapsed)
        )),
        InfectionOutcome::Infeasible { reason } => {
            ui.failure(&format!("Cannot apply '{}': {reason}", report.feature))
        }
    }
    ui.section(
        "Selection",
        [
            ("policy", report.policy.name().to_string()),
            ("components", report.components_selected.to_string()),
            ("classes", report.classes_selected.to_string()),
            ("solver steps", report.solver_steps.to_string()),
        ],
    );
    ui.list("Users", report.users.iter().cloned());
    if let (Some(out), true) = (out, report.is_success()) {
        ui.success(&format!("Wrote {}", out.display()));
    }
}

fn print_components_text(ui: &Ui, report: &ComponentsReport) {
    ui.section(
        "Graph",
        [
            ("users", report.users),
            ("edges", report.edges),
            ("components", report.components),
            ("parents", report.parents),
            ("singletons", report.singletons),
        ],
    );
    let sizes: Vec<String> = report.sizes.iter().map(usize::to_string).collect();
    ui.section("Component sizes", [("largest first", sizes.join(" "))]);
}

fn print_profile_text(ui: &Ui, view: &ProfileView<'_>) {
    let unset = || "-".to_string();
    ui.section(
        &format!("Profile {}", view.name),
        [
            ("default", view.default.to_string()),
            (
                "max_search_steps",
                view.max_search_steps.map_or_else(unset, |s| s.to_string()),
            ),
            (
                "log_level",
                view.log_level.map_or_else(unset, str::to_string),
            ),
            ("theme", view.theme.clone().unwrap_or_else(unset)),
        ],
    );
}
