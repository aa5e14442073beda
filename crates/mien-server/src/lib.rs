//! MIEN Server - HTTP surface for the live character feed
//!
//! One long-lived streaming endpoint plus a small JSON control surface.
//! All shared state travels in [`AppState`]; nothing is ambient.

pub mod api;
pub mod config;
pub mod stream;

pub use config::Config;
pub use stream::StreamConfig;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use mien_core::{DeliveryMark, SharedControls};
use mien_pipeline::{FrameReceiver, PipelineStats};
use mien_pose::EmotionRegistry;

/// Everything the handlers and sender loops share.
#[derive(Clone)]
pub struct AppState {
    pub controls: Arc<SharedControls>,
    pub registry: Arc<EmotionRegistry>,
    /// Latest encoded frame, replace-only (published by the encoder loop)
    pub frames: FrameReceiver,
    pub delivery: Arc<DeliveryMark>,
    pub stats: Arc<PipelineStats>,
    pub stream: StreamConfig,
    /// Expected source image side length, for the placeholder fallback
    pub image_size: u32,
    /// Set once at server shutdown; every sender loop checks it
    pub shutdown: Arc<AtomicBool>,
}

/// Build the application router with the provided state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/stream", get(stream::stream_feed))
        .route("/api/emotion", post(api::set_emotion))
        .route("/api/talking/start", post(api::start_talking))
        .route("/api/talking/stop", post(api::stop_talking))
        .route("/api/pause", post(api::pause))
        .route("/api/resume", post(api::resume))
        .route("/api/reload", post(api::reload))
        .route("/api/status", get(api::status))
        .with_state(state)
}
