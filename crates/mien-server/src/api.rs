//! Control surface - everything except the stream itself
//!
//! Control calls never hard-fail on bad input from the classifier side:
//! unknown emotion labels fall back to neutral with a warning, and an
//! unusable uploaded image falls back to the placeholder. The feed must
//! keep running.

use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use mien_pose::{EmotionRegistry, DEFAULT_EMOTION};
use mien_render::{decode_png, placeholder};

use crate::AppState;

/// One sentiment classification, as produced by the upstream classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct EmotionScore {
    pub label: String,
    pub score: f64,
}

/// Pick the emotion to apply from a classification result: the
/// highest-score label, downgraded to the default when unknown.
pub(crate) fn select_emotion(registry: &EmotionRegistry, scores: &[EmotionScore]) -> String {
    let best = scores
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|s| s.label.as_str());

    match best {
        Some(label) if registry.contains(label) => label.to_string(),
        Some(label) => {
            warn!(label = %label, fallback = DEFAULT_EMOTION, "unknown emotion label");
            DEFAULT_EMOTION.to_string()
        }
        None => {
            warn!(fallback = DEFAULT_EMOTION, "empty classification result");
            DEFAULT_EMOTION.to_string()
        }
    }
}

/// `POST /api/emotion` - set the active emotion from classifier output.
pub async fn set_emotion(
    State(state): State<AppState>,
    Json(scores): Json<Vec<EmotionScore>>,
) -> Json<Value> {
    let emotion = select_emotion(&state.registry, &scores);
    info!(emotion = %emotion, "applying emotion");
    state.controls.set_emotion(&emotion);
    Json(json!({ "emotion": emotion }))
}

/// `POST /api/talking/start`
pub async fn start_talking(State(state): State<AppState>) -> &'static str {
    state.controls.start_talking();
    "started"
}

/// `POST /api/talking/stop`
pub async fn stop_talking(State(state): State<AppState>) -> &'static str {
    state.controls.stop_talking();
    "stopped"
}

/// `POST /api/pause`
pub async fn pause(State(state): State<AppState>) -> &'static str {
    state.controls.pause();
    info!("animation paused");
    "Animation Paused"
}

/// `POST /api/resume`
pub async fn resume(State(state): State<AppState>) -> &'static str {
    state.controls.resume();
    info!("animation resumed");
    "Animation Resumed"
}

/// `POST /api/reload` - replace the character with the PNG in the body.
///
/// Animation pauses for the staging and resumes after; the animator picks
/// the staged image up on its next tick.
pub async fn reload(State(state): State<AppState>, body: Bytes) -> &'static str {
    state.controls.pause();
    let image = match decode_png(&body) {
        Ok(image) => {
            info!(
                width = image.width,
                height = image.height,
                "staging uploaded character image"
            );
            image
        }
        Err(e) => {
            warn!(error = %e, "uploaded image unusable; staging placeholder");
            placeholder(state.image_size)
        }
    };
    state.controls.stage_reload(image);
    state.controls.resume();
    "OK"
}

/// `GET /api/status` - diagnostics snapshot.
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let snap = state.stats.snapshot();
    Json(json!({
        "emotion": state.controls.emotion(),
        "paused": state.controls.is_paused(),
        "talking": state.controls.is_talking(),
        "emotions": state.registry.names(),
        "render": {
            "avg_ms": snap.render_avg_secs * 1000.0,
            "fps_available": snap.render_fps_available,
            "frames": snap.frames_rendered,
        },
        "encode": {
            "avg_ms": snap.encode_avg_secs * 1000.0,
            "fps_available": snap.encode_fps_available,
            "delivery_wait_ms": snap.delivery_wait_avg_secs * 1000.0,
            "frames": snap.frames_encoded,
        },
        "delivery": {
            "last_sent_generation": state.delivery.latest(),
        },
    }))
}
