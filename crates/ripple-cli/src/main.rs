//! # Ripple CLI
//!
//! Command-line driver for the reference models. `simulate` runs an actor
//! world and prints its delivery log; `check` evaluates CTL formulas
//! against a Kripke graph.

use clap::{Parser, Subcommand, ValueEnum};
use ripple::models::{bounded_buffer, counter, producer_consumer};
use ripple::{
    CtlChecker, Formula, Graph, MetricsError, ParseError, RunMetrics, RunOutcome,
    SimulationConfig, World, WorldError,
};
use serde::Serialize;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ripple")]
#[command(about = "Deterministic actor simulation and CTL model checking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reference actor model and print its delivery log
    Simulate {
        #[arg(short, long, value_enum, default_value_t = SimModel::ProducerConsumer)]
        model: SimModel,

        /// Scheduler seed; 0 picks a time-derived seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum number of steps
        #[arg(long)]
        steps: Option<usize>,

        /// JSON simulation config; flags override its fields
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Messages sent by the producer
        #[arg(long, default_value_t = 3)]
        messages: u32,

        /// Capacity of the consumer inbox
        #[arg(long, default_value_t = 1)]
        capacity: usize,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },

    /// Check CTL formulas against every initial state of a graph
    Check {
        /// Built-in graph, used when --graph is absent
        #[arg(short, long, value_enum, default_value_t = GraphModel::BoundedBuffer)]
        model: GraphModel,

        /// Capacity of the bounded-buffer graph; must be positive
        #[arg(long, default_value_t = 2)]
        capacity: usize,

        /// JSON graph description
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Formula to check; repeatable. Defaults to the model's own
        /// properties, and is required with --graph
        #[arg(short, long = "formula")]
        formulas: Vec<String>,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SimModel {
    ProducerConsumer,
    Counter,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GraphModel {
    BoundedBuffer,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode report: {0}")]
    Report(#[from] serde_json::Error),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error("Invalid formula {text:?}: {source}")]
    Formula { text: String, source: ParseError },

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error("--graph requires at least one --formula")]
    MissingFormula,

    #[error("Bounded-buffer capacity must be positive")]
    ZeroCapacity,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Simulate {
            model,
            seed,
            steps,
            config,
            messages,
            capacity,
            json,
        } => load_config(config.as_deref(), seed, steps)
            .and_then(|config| simulate(model, config, messages, capacity, json))
            .map(|()| true),
        Commands::Check {
            model,
            capacity,
            graph,
            formulas,
            json,
        } => check(model, capacity, graph.as_deref(), &formulas, json),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::from(2)
        }
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(
    path: Option<&Path>,
    seed: Option<u64>,
    steps: Option<usize>,
) -> Result<SimulationConfig, CliError> {
    let mut config = match path {
        Some(path) => serde_json::from_str(&read(path)?).map_err(|source| CliError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if let Some(steps) = steps {
        config.max_steps = steps;
    }
    config.validate()?;
    debug!(?config, "loaded simulation config");
    Ok(config)
}

#[derive(Serialize)]
struct SimulationReport<'a, P> {
    seed: u64,
    outcome: RunOutcome,
    time: u64,
    refused_sends: u64,
    events: &'a [ripple::Event<P>],
    metrics: RunMetrics,
}

fn simulate(
    model: SimModel,
    config: SimulationConfig,
    messages: u32,
    capacity: usize,
    json: bool,
) -> Result<(), CliError> {
    info!(?model, "starting simulation");
    match model {
        SimModel::ProducerConsumer => {
            let mut world = producer_consumer::world(config, messages, capacity)?;
            let outcome = world.run();
            report(&world, outcome, json)?;
            if !json {
                if let Some(consumer) =
                    world.process::<producer_consumer::Consumer>(producer_consumer::CONSUMER)
                {
                    println!("consumer received {:?}", consumer.received());
                }
            }
        }
        SimModel::Counter => {
            let mut world = counter::world(config)?;
            let outcome = world.run();
            report(&world, outcome, json)?;
            if !json {
                if let Some(counter) = world.process::<counter::Counter>(counter::COUNTER) {
                    println!(
                        "counter x={} after {} increments and {} decrements",
                        counter.value(),
                        counter.increments(),
                        counter.decrements()
                    );
                }
            }
        }
    }
    Ok(())
}

fn report<P>(world: &World<P>, outcome: RunOutcome, json: bool) -> Result<(), CliError>
where
    P: Serialize + Debug + Clone + 'static,
{
    let metrics = RunMetrics::from_events(world.events())?;
    if json {
        let report = SimulationReport {
            seed: world.seed(),
            outcome,
            time: world.time(),
            refused_sends: world.refused_sends(),
            events: world.events(),
            metrics,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for event in world.events() {
        println!("{}", event);
    }
    println!(
        "seed {}: {} steps, {}",
        world.seed(),
        outcome.steps,
        if outcome.quiescent {
            "quiescent"
        } else {
            "step limit reached"
        }
    );
    println!(
        "{} deliveries, mean queue delay {:.2}, max {}",
        metrics.deliveries, metrics.mean_queue_delay, metrics.max_queue_delay
    );
    for (address, channel) in &metrics.per_address {
        println!(
            "  {}: {} deliveries, mean delay {:.2}",
            address,
            channel.deliveries,
            channel.mean_queue_delay()
        );
    }
    for violation in world.violations() {
        println!("violation {}", violation);
    }
    println!("log digest {}", metrics.digest_hex());
    Ok(())
}

#[derive(Serialize)]
struct FormulaReport {
    formula: String,
    holds: bool,
    satisfying: Vec<String>,
    violating_initial: Vec<String>,
    fixpoint_rounds: usize,
}

fn load_graph(
    model: GraphModel,
    capacity: usize,
    graph_path: Option<&Path>,
) -> Result<Graph, CliError> {
    match graph_path {
        Some(path) => serde_json::from_str(&read(path)?).map_err(|source| CliError::Json {
            path: path.to_path_buf(),
            source,
        }),
        None => match model {
            GraphModel::BoundedBuffer if capacity == 0 => Err(CliError::ZeroCapacity),
            GraphModel::BoundedBuffer => Ok(bounded_buffer::graph(capacity)),
        },
    }
}

/// Formulas named on the command line, or the built-in model's properties
fn select_properties(
    graph_path: Option<&Path>,
    formulas: &[String],
) -> Result<Vec<(String, Formula)>, CliError> {
    if formulas.is_empty() {
        if graph_path.is_some() {
            return Err(CliError::MissingFormula);
        }
        return Ok(bounded_buffer::properties()
            .into_iter()
            .map(|(name, formula)| (name.to_string(), formula))
            .collect());
    }
    formulas
        .iter()
        .map(|text| {
            text.parse()
                .map(|formula| (text.clone(), formula))
                .map_err(|source| CliError::Formula {
                    text: text.clone(),
                    source,
                })
        })
        .collect()
}

fn check(
    model: GraphModel,
    capacity: usize,
    graph_path: Option<&Path>,
    formulas: &[String],
    json: bool,
) -> Result<bool, CliError> {
    let properties = select_properties(graph_path, formulas)?;
    let graph = load_graph(model, capacity, graph_path)?;
    info!(
        states = graph.len(),
        edges = graph.edge_count(),
        initial = graph.initial().len(),
        "loaded graph"
    );

    let checker = CtlChecker::new(&graph);
    let reports: Vec<FormulaReport> = properties
        .iter()
        .map(|(name, formula)| {
            let result = checker.check(formula);
            FormulaReport {
                formula: name.clone(),
                holds: result.holds(),
                satisfying: graph.names_of(&result.satisfying).map(String::from).collect(),
                violating_initial: result
                    .violating_initial
                    .iter()
                    .map(|&id| graph.name(id).to_string())
                    .collect(),
                fixpoint_rounds: result.stats.total_rounds(),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            let verdict = if report.holds { "holds" } else { "FAILS" };
            println!("{:<6} {}", verdict, report.formula);
            println!("       satisfied at: {}", report.satisfying.join(", "));
            if !report.holds {
                println!(
                    "       violated at initial: {}",
                    report.violating_initial.join(", ")
                );
            }
        }
    }
    Ok(reports.iter().all(|r| r.holds))
}
