//! Six-bar rolling controller CLI.
//!
//! Provides two modes of operation:
//! - `run`: roll the kinematic rig headless toward a face or a direction and
//!   print run statistics
//! - `info`: print the hull tables (faces, normals, adjacency, policy sizes)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tumble_core::{
    CLOSED_FACE_COUNT, ConfigError, FACE_COUNT, FaceId, GoalConfig, GoalMode, RollingConfig,
    TumbleError,
};
use tumble_geometry::{ActuationPolicy, FaceGraph, Icosahedron};
use tumble_sim::{HeadlessRunner, RunOutcome};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Rolling locomotion for a six-bar tensegrity.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll the kinematic rig headless and print statistics.
    Run {
        /// Goal mode: `face` or `dr`. Overrides the config file goal.
        #[arg(short, long)]
        mode: Option<GoalMode>,

        /// Goal face for `--mode face`.
        #[arg(short, long, default_value_t = 0)]
        face: usize,

        /// Travel direction for `--mode dr`, as `x,y,z`.
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        direction: Vec<f64>,

        /// Face the rig starts on.
        #[arg(short, long, default_value_t = 0)]
        start: usize,

        /// Tick budget.
        #[arg(long, default_value_t = 20_000)]
        max_ticks: u64,

        /// Stop after this many completed rolls.
        #[arg(long)]
        max_rolls: Option<u32>,

        /// Control timestep in seconds.
        #[arg(long, default_value_t = 0.01)]
        dt: f64,

        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the hull tables.
    Info {
        /// Rod length in meters.
        #[arg(long, default_value_t = 1.7)]
        rod_length: f64,
    },
}

/// Arguments of the `run` mode.
struct RunArgs {
    mode: Option<GoalMode>,
    face: usize,
    direction: Vec<f64>,
    start: usize,
    max_ticks: u64,
    max_rolls: Option<u32>,
    dt: f64,
    config: Option<PathBuf>,
    json: bool,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn goal_from_args(args: &RunArgs, mode: GoalMode) -> Result<GoalConfig, ConfigError> {
    match mode {
        GoalMode::Face => Ok(GoalConfig::Face { face: args.face }),
        GoalMode::DeadReckoning => match args.direction.as_slice() {
            &[x, y, z] => Ok(GoalConfig::DeadReckoning {
                direction: [x, y, z],
            }),
            &[x, y] => Ok(GoalConfig::DeadReckoning {
                direction: [x, y, 0.0],
            }),
            _ => Err(ConfigError::InvalidValue {
                field: "direction".into(),
                message: "expected x,y or x,y,z".into(),
            }),
        },
    }
}

fn build_config(args: &RunArgs) -> Result<RollingConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => RollingConfig::from_file(path)?,
        None => RollingConfig::face(9.81, 0),
    };
    let mode = match (args.mode, &args.config) {
        (Some(mode), _) => Some(mode),
        (None, None) => Some(GoalMode::Face),
        (None, Some(_)) => None,
    };
    if let Some(mode) = mode {
        config.goal = goal_from_args(args, mode)?;
    }
    config.validate()?;
    Ok(config)
}

fn run_headless(args: &RunArgs) -> Result<RunOutcome, TumbleError> {
    if args.start >= FACE_COUNT {
        return Err(ConfigError::InvalidValue {
            field: "start".into(),
            message: format!("must be below {FACE_COUNT}"),
        }
        .into());
    }
    let config = build_config(args)?;
    info!(goal = ?config.goal, start = args.start, "starting headless run");

    let mut runner = HeadlessRunner::new(config, FaceId(args.start))?
        .with_dt(args.dt)
        .with_max_ticks(args.max_ticks);
    if let Some(max_rolls) = args.max_rolls {
        runner = runner.with_max_rolls(max_rolls);
    }
    runner.run()
}

fn print_outcome(outcome: &RunOutcome, json: bool) {
    if json {
        match serde_json::to_string_pretty(outcome) {
            Ok(text) => println!("{text}"),
            Err(err) => error!("failed to serialize outcome: {err}"),
        }
        return;
    }
    let stats = &outcome.stats;
    println!(
        "goal reached: {}, final face: {}",
        outcome.goal_reached,
        outcome
            .final_face
            .map_or_else(|| "-".to_string(), |f| f.to_string())
    );
    println!(
        "ticks={}, rolls={}, stalls={}, replans={}, unexpected={}",
        stats.ticks,
        stats.rolls,
        stats.stalls,
        stats.replans(),
        stats.unexpected_contacts
    );
    println!("faces: {:?}", stats.faces_visited);
    println!(
        "displacement: ({:.3}, {:.3}) m",
        outcome.displacement[0], outcome.displacement[1]
    );
    if let Some(mean) = stats.mean_roll_ticks() {
        println!("mean ticks per roll: {mean:.1}");
    }
}

fn run_info(rod_length: f64) {
    let geometry = Icosahedron::new(rod_length);
    let graph = FaceGraph::<FACE_COUNT>::from_icosahedron(&geometry);
    let mut defaults = RollingConfig::face(9.81, 0);
    defaults.geometry.rod_length = rod_length;
    let policy =
        ActuationPolicy::from_icosahedron(&geometry, &graph, defaults.contracted_length());

    println!("tumble v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!(
        "rod length {rod_length:.3} m, edge length {:.3} m",
        geometry.edge_length()
    );
    println!(
        "faces: {FACE_COUNT} ({CLOSED_FACE_COUNT} closed), cables: {}, graph edges: {}, diameter: {}",
        geometry.cables().len(),
        graph.edge_count(),
        graph
            .diameter()
            .map_or_else(|| "-".to_string(), |d| d.to_string())
    );
    println!();
    println!("face  nodes         normal                    neighbors (cables per roll)");
    for face in (0..FACE_COUNT).map(FaceId) {
        let [a, b, c] = geometry.face_nodes(face);
        let n = geometry.normal(face);
        let neighbors: Vec<String> = graph
            .neighbors(face)
            .map(|to| format!("{to}({})", policy.commands(face, to).len()))
            .collect();
        println!(
            "{:<5} {:>2} {:>2} {:>2}      ({:+.3}, {:+.3}, {:+.3})  {}{}",
            face.to_string(),
            a,
            b,
            c,
            n.x,
            n.y,
            n.z,
            neighbors.join(" "),
            if face.is_closed() { "  closed" } else { "" }
        );
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            mode,
            face,
            direction,
            start,
            max_ticks,
            max_rolls,
            dt,
            config,
            json,
        }) => {
            let args = RunArgs {
                mode,
                face,
                direction,
                start,
                max_ticks,
                max_rolls,
                dt,
                config,
                json,
            };
            match run_headless(&args) {
                Ok(outcome) => {
                    print_outcome(&outcome, args.json);
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    error!("{err}");
                    ExitCode::FAILURE
                }
            }
        }
        Some(Commands::Info { rod_length }) => {
            run_info(rod_length);
            ExitCode::SUCCESS
        }
        None => {
            run_info(1.7);
            ExitCode::SUCCESS
        }
    }
}
