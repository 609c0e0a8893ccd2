//! LWR-DRBG CLI
//!
//! Command-line interface for demonstrating the lattice-based generator:
//! initialize from the entropy source (warm-starting from a checkpoint
//! when present), draw output, and report health.

use clap::Parser;
use lwr_drbg::{
    metrics::{MetricsRegistry, MetricsSnapshot},
    CollectorKind, FileConfig, MobileRng,
};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "lwr-drbg", version, about = "Lattice-based DRBG demonstration")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Checkpoint file, overriding the configured path.
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Raw noise collector, overriding the configured one.
    #[arg(long, value_parser = parse_source)]
    source: Option<CollectorKind>,

    /// Number of generate calls.
    #[arg(short = 'n', long, default_value_t = 4)]
    count: usize,

    /// Bytes per generate call.
    #[arg(short, long, default_value_t = 32)]
    bytes: usize,

    /// Print Prometheus metrics after running.
    #[arg(long)]
    metrics: bool,
}

fn parse_source(value: &str) -> Result<CollectorKind, String> {
    match value {
        "jitter" => Ok(CollectorKind::Jitter),
        "os" => Ok(CollectorKind::Os),
        other => Err(format!("unknown source '{}' (expected jitter or os)", other)),
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("LWR-DRBG v{}", lwr_drbg::VERSION);

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    if let Some(path) = args.state_file {
        config.store.path = path;
    }
    if let Some(source) = args.source {
        config.entropy.collector = source;
    }

    let rng = match MobileRng::from_config(&config) {
        Ok(rng) => rng,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        state_file = %config.store.path.display(),
        collector = ?config.entropy.collector,
        "Initializing generator"
    );
    if !rng.initialize() {
        error!("Initialization failed; entropy source rejected");
        std::process::exit(2);
    }

    // A reseed writes the checkpoint used by the next run
    if !rng.reseed(None) {
        warn!("Initial reseed failed; no checkpoint written");
    }

    for i in 0..args.count {
        let (bytes, status) = rng.generate(args.bytes);
        if !status.is_success() {
            error!(call = i, %status, "Generate failed");
            std::process::exit(3);
        }
        println!("{}", hex::encode(&bytes));
    }

    let health = rng.health_check();
    info!(
        module = health.module,
        initialized = health.initialized,
        reseed_counter = health.reseed_counter,
        entropy_startup_complete = health.entropy_startup_complete,
        entropy_source = %health.entropy_source,
        "Health check"
    );

    let stats = rng.stats();
    info!(
        "Done. {} calls, {} bytes, {} reseeds",
        stats.generate_calls, stats.bytes_generated, stats.reseeds
    );

    if args.metrics {
        let registry = match MetricsRegistry::new() {
            Ok(registry) => registry,
            Err(e) => {
                eprintln!("Failed to create metrics registry: {}", e);
                std::process::exit(1);
            }
        };
        registry.update(&MetricsSnapshot::capture(&rng));
        match registry.encode() {
            Ok(text) => print!("{}", text),
            Err(e) => warn!("Failed to encode metrics: {}", e),
        }
    }
}
