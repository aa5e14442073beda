//! MIEN server binary - bootstrap and lifecycle
//!
//! Wires the pipeline to the HTTP app: load config and presets, start the
//! animator/encoder pair, serve until ctrl-c, then stop the pipeline in
//! order (animator first, encoder second).

use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mien_core::SharedControls;
use mien_pipeline::{Pipeline, PipelineConfig};
use mien_pose::{DriverConfig, EmotionRegistry, PoseDriver};
use mien_render::{load_or_placeholder, IdentityPoser, NoopPostEffect};
use mien_server::{app, AppState, Config, StreamConfig};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1);
    let config = match Config::load(config_path.as_deref().map(Path::new)) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let registry = match &config.emotions_dir {
        Some(dir) => EmotionRegistry::load(dir),
        None => EmotionRegistry::builtin(),
    };
    info!(emotions = registry.names().len(), "emotion presets loaded");

    let controls = Arc::new(SharedControls::new());
    let driver = PoseDriver::new(registry.clone(), DriverConfig::default());
    let source = load_or_placeholder(config.character.as_deref(), config.image_size);

    // The neural posing model plugs in behind the Poser trait; the
    // identity stand-in keeps the feed alive without it.
    let pipeline = match Pipeline::start(
        Box::new(IdentityPoser::new(config.image_size)),
        Box::new(NoopPostEffect),
        driver,
        Arc::clone(&controls),
        Some(source),
        PipelineConfig::default(),
    ) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "failed to start pipeline");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let state = AppState {
        controls,
        registry: Arc::new(registry),
        frames: pipeline.frames(),
        delivery: pipeline.delivery(),
        stats: pipeline.stats(),
        stream: StreamConfig {
            target_fps: config.target_fps,
            ..StreamConfig::default()
        },
        image_size: config.image_size,
        shutdown: Arc::clone(&shutdown),
    };

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind, error = %e, "failed to bind");
            pipeline.stop();
            return ExitCode::FAILURE;
        }
    };
    info!(addr = %config.bind, "serving live character feed");

    let serve = axum::serve(listener, app(state)).with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
    });
    if let Err(e) = serve.await {
        error!(error = %e, "server error");
    }

    // End the per-client sender loops, then join the pipeline threads.
    shutdown.store(true, Ordering::SeqCst);
    pipeline.stop();
    ExitCode::SUCCESS
}
