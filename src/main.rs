//! Cement-AI backend entry point.

use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cement_ai_backend::config::Config;
use cement_ai_backend::metrics;
use cement_ai_backend::plant::{run_feed, simulated_updates, KpiSimulator, PlantFeed};
use cement_ai_backend::state::AppState;
use cement_ai_backend::utils::shutdown_signal;
use cement_ai_backend::create_app;

/// Cement-AI backend.
#[derive(Parser, Debug)]
#[command(name = "cement-ai-backend")]
#[command(about = "Live kiln KPIs, reports, plant assistant and setpoint optimizer")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// HTTP server port (overrides PORT).
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server and live feed (default).
    Serve,

    /// Check configuration validity.
    CheckConfig,

    /// Print simulated live updates as JSON lines.
    Simulate {
        /// Number of updates to print.
        #[arg(short, long, default_value = "10")]
        samples: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Configuration errors are reported after logging is up
    let config = Config::load();

    let (verbose, json, default_filter) = match &config {
        Ok(c) => (args.verbose || c.verbose, c.log_json, c.rust_log.clone()),
        Err(_) => (args.verbose, false, "info".to_string()),
    };
    init_tracing(verbose, json, &default_filter);

    let mut config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(port) = args.port {
        config.port = port;
    }

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Simulate { samples }) => cmd_simulate(&config, samples),
        Some(Command::Serve) | None => cmd_serve(config).await,
    }
}

fn init_tracing(verbose: bool, json: bool, default_filter: &str) {
    let filter = if verbose {
        EnvFilter::new("cement_ai_backend=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    };

    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .with(filter)
        .init();
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CEMENT-AI BACKEND - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Bind Address: {}", config.bind_addr());
    if config.cors_is_wildcard() {
        println!("  CORS: all origins (credentials not sent with wildcard)");
    } else {
        println!("  CORS: {}", config.cors_allowed_origins.join(", "));
        println!("  CORS Credentials: {}", config.cors_allow_credentials);
    }
    println!("  Feed Interval: {} ms", config.feed_interval_ms);
    println!(
        "  History: {} samples, {} log entries ({} seeded)",
        config.history_capacity, config.log_capacity, config.history_seed_points
    );
    println!(
        "  SPC Thresholds: warning > {} kWh/t, alert > {} kWh/t",
        config.spc_warning_threshold, config.spc_alert_threshold
    );
    match config.simulator_seed {
        Some(seed) => println!("  Simulator Seed: {}", seed),
        None => println!("  Simulator Seed: random"),
    }
    println!("  Chat History Limit: {} turns", config.chat_history_limit);
    println!("  Chat Sessions Kept: {}", config.chat_max_sessions);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Print simulated live updates without starting the server.
fn cmd_simulate(config: &Config, samples: u32) -> anyhow::Result<()> {
    let updates = simulated_updates(config, OffsetDateTime::now_utc(), samples).map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    for update in updates {
        println!("{}", serde_json::to_string(&update)?);
    }

    Ok(())
}

/// Run the HTTP server and live feed until shutdown.
async fn cmd_serve(config: Config) -> anyhow::Result<()> {
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Configuration loaded successfully");
    info!("Feed interval: {} ms", config.feed_interval_ms);
    info!("CORS origins: {}", config.cors_allowed_origins.join(", "));

    // Initialize metrics
    let handle = metrics::install_recorder()?;
    metrics::init_metrics();

    // Create app state
    let state = AppState::from_config(&config).with_metrics(handle);

    // Back-fill history and start the live feed
    let mut feed = PlantFeed::new(
        KpiSimulator::from_seed(config.simulator_seed),
        state.settings.thresholds,
    );
    {
        let mut history = state.history.write().await;
        feed.seed(&mut history, config.history_seed_points);
    }
    let feed_handle = tokio::spawn(run_feed(
        state.clone(),
        feed,
        state.settings.feed_interval,
    ));

    // Start HTTP server
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    let app = create_app(state, &config);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    feed_handle.abort();
    info!("Server stopped");
    Ok(())
}
