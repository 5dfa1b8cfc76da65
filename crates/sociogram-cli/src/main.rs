//! Sociogram CLI
//!
//! - `plan`: generate a random acquaintance graph and print the statements
//! - `load`: generate and push the statements to a Gremlin endpoint, fail-fast
//!   (`--dry-run` swaps the endpoint for an in-memory channel)

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use sociogram_core::{
    execute_scoped, summarize, Operation, RecordingChannel, RunReport, SamplingRange,
    StatementRunner, TopologyGenerator,
};
use sociogram_gremlin::{GremlinHttpConnector, GremlinWsConnector, Transport};

mod config;
mod output;

use config::SociogramConfig;
use output::ConsoleObserver;

#[derive(Parser)]
#[command(name = "sociogram")]
#[command(
    author,
    version,
    about = "Generate a random social graph and load it into a Gremlin endpoint"
)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the generated operation sequence without contacting a server.
    Plan {
        #[command(flatten)]
        generate: GenerateArgs,
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Generate the graph and execute it statement by statement.
    ///
    /// Stops at the first failed statement; nothing is retried or rolled back.
    Load {
        #[command(flatten)]
        generate: GenerateArgs,
        #[command(flatten)]
        server: ServerArgs,
        /// Run against an in-memory channel instead of the network.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    /// JSON config file (server settings + names).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Names file, one per line (overrides config names).
    #[arg(long)]
    names_file: Option<PathBuf>,
    /// Comma-separated names (overrides config names and --names-file).
    #[arg(long, value_delimiter = ',')]
    names: Option<Vec<String>>,
    /// Seed for a reproducible topology. Omit for a fresh random graph.
    #[arg(long)]
    seed: Option<u64>,
    /// Exclude the last name from edge-target sampling.
    #[arg(long)]
    legacy_sampling: bool,
}

#[derive(Args, Debug, Clone)]
struct ServerArgs {
    /// Wire protocol: `websocket` (Cosmos DB, Gremlin Server) or `http`.
    #[arg(long)]
    transport: Option<Transport>,
    #[arg(long)]
    hostname: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    /// Disable TLS (`ws://` / `http://`).
    #[arg(long)]
    no_ssl: bool,
    /// Auth key (prefer the SOCIOGRAM_AUTH_KEY environment variable).
    #[arg(long)]
    auth_key: Option<String>,
    #[arg(long)]
    database: Option<String>,
    #[arg(long)]
    collection: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            2
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Plan { generate, json } => {
            cmd_plan(&generate, json)?;
            Ok(0)
        }
        Commands::Load {
            generate,
            server,
            dry_run,
        } => {
            let report = cmd_load(&generate, &server, dry_run)?;
            Ok(if report.state.is_completed() { 0 } else { 1 })
        }
    }
}

fn resolve_config(generate: &GenerateArgs, server: Option<&ServerArgs>) -> Result<SociogramConfig> {
    let mut config = SociogramConfig::load_or_default(generate.config.as_deref())?;
    config.apply_env();

    if let Some(path) = &generate.names_file {
        config.names = config::read_names_file(path)?;
    }
    if let Some(names) = &generate.names {
        config.names = names.iter().map(|n| n.trim().to_string()).collect();
    }

    if let Some(args) = server {
        let s = &mut config.server;
        if let Some(transport) = args.transport {
            s.transport = transport;
        }
        if let Some(hostname) = &args.hostname {
            s.hostname = hostname.clone();
        }
        if let Some(port) = args.port {
            s.port = port;
        }
        if args.no_ssl {
            s.enable_ssl = false;
        }
        if let Some(key) = &args.auth_key {
            s.auth_key = Some(key.clone());
        }
        if let Some(database) = &args.database {
            s.database = database.clone();
        }
        if let Some(collection) = &args.collection {
            s.collection = collection.clone();
        }
        if let Some(secs) = args.timeout_secs {
            s.timeout_secs = Some(secs);
        }
    }

    config.validate()?;
    Ok(config)
}

fn generate_operations(generate: &GenerateArgs, names: &[String]) -> Vec<Operation> {
    let sampling = if generate.legacy_sampling {
        SamplingRange::Legacy
    } else {
        SamplingRange::Full
    };
    let mut rng = match generate.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    TopologyGenerator::new(sampling).generate(names, &mut rng)
}

fn cmd_plan(generate: &GenerateArgs, json: bool) -> Result<()> {
    let config = resolve_config(generate, None)?;
    let operations = generate_operations(generate, &config.names);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    output::write_plan(&mut out, &operations, summarize(&operations), json)?;
    out.flush()?;
    Ok(())
}

fn cmd_load(generate: &GenerateArgs, server: &ServerArgs, dry_run: bool) -> Result<RunReport> {
    let config = resolve_config(generate, Some(server))?;
    let operations = generate_operations(generate, &config.names);
    let summary = summarize(&operations);
    tracing::info!(
        vertices = summary.vertices,
        edges = summary.edges,
        hostname = %config.server.hostname,
        transport = %config.server.transport,
        dry_run,
        "loading sociogram"
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;

    let mut observer = ConsoleObserver::new(io::stdout());
    let report = if dry_run {
        let mut channel = RecordingChannel::new();
        rt.block_on(StatementRunner::new().run(&operations, &mut channel, &mut observer))
    } else {
        let server = config.server.to_gremlin_server();
        let scoped = match config.server.transport {
            Transport::WebSocket => rt.block_on(execute_scoped(
                &GremlinWsConnector::new(server),
                &operations,
                &mut observer,
            )),
            Transport::Http => rt.block_on(execute_scoped(
                &GremlinHttpConnector::new(server),
                &operations,
                &mut observer,
            )),
        };
        scoped.map_err(|e| anyhow!("failed to open gremlin channel: {e}"))?
    };

    let mut out = observer
        .finish()
        .context("failed to write run progress")?;
    output::write_run_summary(&mut out, &report)?;
    out.flush()?;
    Ok(report)
}
