//! The streaming endpoint - one cooperative sender loop per client
//!
//! Each connected client gets its own task that emits the latest encoded
//! frame as one part of a `multipart/x-mixed-replace` response at the
//! target cadence. The loop never blocks on the encoder: it reads whatever
//! frame is currently published, re-sending the same frame as often as
//! needed to hold the target FPS on slow hardware, and reports every
//! delivered generation through the DeliveryMark - the signal the encoder
//! rate-matches against.

use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use mien_core::RunningAverage;

use crate::AppState;

/// Multipart boundary; also baked into the content type below.
const BOUNDARY: &str = "frame";

/// Sender cadence tuning.
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Target inter-frame rate per client
    pub target_fps: f64,
    /// Poll interval while no frame has ever been published
    pub first_frame_poll: Duration,
    /// How often the per-client FPS statistic is logged
    pub report_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            target_fps: 25.0,
            first_frame_poll: Duration::from_millis(100),
            report_interval: Duration::from_secs(5),
        }
    }
}

/// `GET /stream` - a long-lived multipart PNG feed.
pub async fn stream_feed(State(state): State<AppState>) -> impl IntoResponse {
    // Capacity 1: the channel exists to decouple the loop from hyper's
    // write timing, not to queue frames.
    let (tx, rx) = mpsc::channel::<Result<Bytes, Infallible>>(1);
    tokio::spawn(send_loop(state, tx));

    (
        [(
            header::CONTENT_TYPE,
            "multipart/x-mixed-replace; boundary=frame",
        )],
        Body::from_stream(ReceiverStream::new(rx)),
    )
}

/// Frame one PNG as a multipart part.
fn multipart_chunk(png: &[u8]) -> Bytes {
    let mut chunk = BytesMut::with_capacity(png.len() + 64);
    chunk.extend_from_slice(format!("--{BOUNDARY}\r\nContent-Type: image/png\r\n\r\n").as_bytes());
    chunk.extend_from_slice(png);
    chunk.extend_from_slice(b"\r\n");
    chunk.freeze()
}

/// The per-client cooperative loop. Ends when the client disconnects or
/// the server shuts down.
pub(crate) async fn send_loop(state: AppState, tx: mpsc::Sender<Result<Bytes, Infallible>>) {
    let config = state.stream;
    let target = Duration::from_secs_f64(1.0 / config.target_fps);

    let mut last_send_complete: Option<Instant> = None;
    let mut send_duration = Duration::ZERO;
    let mut cadence = RunningAverage::default();
    let mut last_report: Option<Instant> = None;

    info!("stream client connected");
    loop {
        if state.shutdown.load(Ordering::SeqCst) {
            break;
        }

        // Grab the frame reference once; it is replaced atomically by the
        // encoder, never mutated.
        let frame = state.frames.borrow().clone();
        let Some(frame) = frame else {
            // Nothing published yet; there is no deadline to compute.
            tokio::time::sleep(config.first_frame_poll).await;
            continue;
        };

        // Deadline accounting: the doubled previous send duration is a
        // safety margin - a frame slightly early is fine, a late one is
        // not.
        if let Some(at) = last_send_complete {
            let due_in = target
                .saturating_sub(at.elapsed())
                .saturating_sub(2 * send_duration);
            if due_in > Duration::ZERO {
                tokio::time::sleep(due_in).await;
                continue; // re-read: a newer frame may have landed
            }
        }

        let send_start = Instant::now();
        if tx.send(Ok(multipart_chunk(&frame.bytes))).await.is_err() {
            info!("stream client disconnected");
            break;
        }
        send_duration = send_start.elapsed();
        state.delivery.mark(frame.generation);

        let now = Instant::now();
        if let Some(at) = last_send_complete {
            cadence.add_duration(now.duration_since(at));
        }
        last_send_complete = Some(now);

        let report_due = !state.controls.is_paused()
            && last_report.map_or(true, |at| now.duration_since(at) > config.report_interval);
        if report_due {
            info!(
                "output: {:.1}ms [{:.1} FPS]; target {:.1}ms [{:.1} FPS]",
                cadence.average() * 1000.0,
                cadence.as_fps(),
                target.as_secs_f64() * 1000.0,
                config.target_fps
            );
            last_report = Some(now);
        }
    }
    debug!("send loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use tokio::sync::watch;

    use mien_core::{DeliveryMark, EncodedFrame, SharedControls};
    use mien_pipeline::PipelineStats;
    use mien_pose::EmotionRegistry;

    fn test_state(
        target_fps: f64,
    ) -> (AppState, watch::Sender<Option<Arc<EncodedFrame>>>) {
        let (frame_tx, frame_rx) = watch::channel(None);
        let state = AppState {
            controls: Arc::new(SharedControls::new()),
            registry: Arc::new(EmotionRegistry::builtin()),
            frames: frame_rx,
            delivery: Arc::new(DeliveryMark::new()),
            stats: Arc::new(PipelineStats::new()),
            stream: StreamConfig {
                target_fps,
                first_frame_poll: Duration::from_millis(5),
                report_interval: Duration::from_secs(60),
            },
            image_size: 8,
            shutdown: Arc::new(AtomicBool::new(false)),
        };
        (state, frame_tx)
    }

    fn frame(generation: u64) -> Option<Arc<EncodedFrame>> {
        Some(Arc::new(EncodedFrame {
            bytes: vec![1, 2, 3],
            generation,
        }))
    }

    #[test]
    fn test_multipart_chunk_framing() {
        let chunk = multipart_chunk(&[0xAA, 0xBB]);
        let expected: &[u8] = b"--frame\r\nContent-Type: image/png\r\n\r\n\xAA\xBB\r\n";
        assert_eq!(&chunk[..], expected);
    }

    #[tokio::test]
    async fn test_send_loop_emits_and_marks_delivery() {
        let (state, frame_tx) = test_state(200.0);
        frame_tx.send_replace(frame(1));

        let delivery = Arc::clone(&state.delivery);
        let (tx, mut rx) = mpsc::channel(1);
        let handle = tokio::spawn(send_loop(state, tx));

        let chunk = rx.recv().await.unwrap().unwrap();
        assert!(chunk.starts_with(b"--frame\r\n"));
        assert_eq!(delivery.latest(), 1);

        frame_tx.send_replace(frame(2));
        // Drain until the new generation is marked delivered.
        let deadline = Instant::now() + Duration::from_secs(5);
        while delivery.latest() < 2 {
            assert!(Instant::now() < deadline);
            let _ = rx.recv().await.unwrap();
        }

        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_loop_waits_for_first_frame() {
        let (state, frame_tx) = test_state(200.0);
        let (tx, mut rx) = mpsc::channel(1);
        tokio::spawn(send_loop(state, tx));

        // No frame published: nothing may arrive.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());

        frame_tx.send_replace(frame(1));
        let chunk = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(chunk.starts_with(b"--frame\r\n"));
    }

    #[tokio::test]
    async fn test_send_loop_paces_to_target_fps() {
        // 50 FPS target: 6 sends need at least 5 * 20 ms.
        let (state, frame_tx) = test_state(50.0);
        frame_tx.send_replace(frame(1));

        let (tx, mut rx) = mpsc::channel(1);
        let handle = tokio::spawn(send_loop(state, tx));

        let start = Instant::now();
        for _ in 0..6 {
            rx.recv().await.unwrap().unwrap();
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(80), "too fast: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "too slow: {elapsed:?}");

        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_loop_stops_on_shutdown() {
        let (state, frame_tx) = test_state(200.0);
        frame_tx.send_replace(frame(1));
        let shutdown = Arc::clone(&state.shutdown);

        let (tx, mut rx) = mpsc::channel(1);
        let handle = tokio::spawn(send_loop(state, tx));
        rx.recv().await.unwrap().unwrap();

        shutdown.store(true, Ordering::SeqCst);
        // Keep draining so the loop is not parked on a full channel.
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop exits after shutdown")
            .unwrap();
        drain.await.unwrap();
    }
}
