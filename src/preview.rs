//! Background preview rendering with latest-wins scheduling.
//!
//! Slider drags submit render requests faster than the pipeline can
//! process them. Rather than queueing every request, a single worker
//! thread drains its inbox down to the newest request before rendering,
//! and stale completions are dropped on receive: a frame is only
//! surfaced if no newer request was submitted after it. Every submitted
//! request gets a monotonically increasing generation number; the
//! newest generation wins, always.
//!
//! Not compiled for wasm targets, which are single-threaded; there the
//! caller drives [`apply_filters`](crate::pipeline::apply_filters)
//! directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use ndarray::Array3;
use tracing::debug;

use crate::error::EditorError;
use crate::noise::NoiseSeed;
use crate::pipeline::apply_filters;
use crate::settings::Settings;

/// One self-contained render job: everything the worker needs, owned.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub buffer: Array3<u8>,
    pub settings: Settings,
    pub seed: f32,
    pub noise_scale: f32,
}

/// A completed render tagged with the generation that produced it.
#[derive(Debug)]
pub struct PreviewFrame {
    pub generation: u64,
    pub buffer: Array3<u8>,
}

struct RenderPass {
    generation: u64,
    request: RenderRequest,
}

/// Handle to the preview worker thread.
pub struct PreviewRenderer {
    next_generation: AtomicU64,
    latest_generation: Arc<AtomicU64>,
    submit_tx: mpsc::Sender<RenderPass>,
    result_rx: Mutex<mpsc::Receiver<PreviewFrame>>,
}

impl PreviewRenderer {
    pub fn new() -> Self {
        let (submit_tx, submit_rx) = mpsc::channel::<RenderPass>();
        let (result_tx, result_rx) = mpsc::channel::<PreviewFrame>();
        let latest_generation = Arc::new(AtomicU64::new(0));

        spawn_worker(submit_rx, result_tx, Arc::clone(&latest_generation));

        Self {
            next_generation: AtomicU64::new(0),
            latest_generation,
            submit_tx,
            result_rx: Mutex::new(result_rx),
        }
    }

    /// Queue a render. Any in-flight older request becomes stale.
    pub fn submit(&self, request: RenderRequest) -> Result<u64, EditorError> {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest_generation.store(generation, Ordering::SeqCst);
        self.submit_tx
            .send(RenderPass {
                generation,
                request,
            })
            .map_err(|_| EditorError::RendererDisconnected)?;
        Ok(generation)
    }

    /// Poll for the newest completed frame, if any.
    ///
    /// Intermediate completed frames that were superseded while waiting
    /// in the result channel are discarded.
    pub fn try_receive(&self) -> Result<Option<PreviewFrame>, EditorError> {
        let receiver = self
            .result_rx
            .lock()
            .map_err(|_| EditorError::RendererDisconnected)?;

        let first = match receiver.try_recv() {
            Ok(frame) => frame,
            Err(mpsc::TryRecvError::Empty) => return Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => {
                return Err(EditorError::RendererDisconnected)
            }
        };

        let mut newest = first;
        let mut dropped = 0u64;
        while let Ok(next) = receiver.try_recv() {
            dropped += 1;
            newest = next;
        }
        if dropped > 0 {
            debug!(dropped, kept = newest.generation, "dropped superseded preview frames");
        }
        Ok(Some(newest))
    }
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_worker(
    submit_rx: mpsc::Receiver<RenderPass>,
    result_tx: mpsc::Sender<PreviewFrame>,
    latest_generation: Arc<AtomicU64>,
) {
    thread::spawn(move || {
        while let Ok(mut pass) = submit_rx.recv() {
            // Drain the inbox: only the newest queued request matters.
            while let Ok(next) = submit_rx.try_recv() {
                debug!(stale = pass.generation, "skipped queued preview request");
                pass = next;
            }
            if pass.generation < latest_generation.load(Ordering::SeqCst) {
                debug!(stale = pass.generation, "discarded stale preview request");
                continue;
            }

            let mut seed = NoiseSeed::new(pass.request.seed);
            let buffer = apply_filters(
                pass.request.buffer.view(),
                &pass.request.settings,
                &mut seed,
                pass.request.noise_scale,
            );

            // A newer request may have arrived while rendering.
            if pass.generation < latest_generation.load(Ordering::SeqCst) {
                debug!(stale = pass.generation, "discarded stale preview frame");
                continue;
            }
            if result_tx
                .send(PreviewFrame {
                    generation: pass.generation,
                    buffer,
                })
                .is_err()
            {
                return;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(brightness: f32) -> RenderRequest {
        let mut settings = Settings::default();
        settings.brightness = brightness;
        RenderRequest {
            buffer: Array3::from_elem((16, 16, 4), 100),
            settings,
            seed: 0.0,
            noise_scale: 1.0,
        }
    }

    fn wait_for_frame(renderer: &PreviewRenderer) -> PreviewFrame {
        for _ in 0..200 {
            if let Some(frame) = renderer.try_receive().expect("poll") {
                return frame;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("no preview frame arrived");
    }

    #[test]
    fn test_latest_request_wins() {
        let renderer = PreviewRenderer::new();
        let mut last = 0;
        for i in 0..8 {
            last = renderer.submit(request(100.0 + i as f32 * 10.0)).unwrap();
        }

        let mut newest = wait_for_frame(&renderer);
        // Older frames may have slipped through before later submits
        // landed; keep polling until the final generation arrives.
        while newest.generation < last {
            newest = wait_for_frame(&renderer);
        }
        assert_eq!(newest.generation, last);
        // brightness 170 on a 100-gray buffer.
        assert_eq!(newest.buffer[[0, 0, 0]], 170);
    }

    #[test]
    fn test_single_submit_renders() {
        let renderer = PreviewRenderer::new();
        let generation = renderer.submit(request(150.0)).unwrap();
        let frame = wait_for_frame(&renderer);
        assert_eq!(frame.generation, generation);
        assert_eq!(frame.buffer[[3, 3, 0]], 150);
        assert_eq!(frame.buffer[[3, 3, 3]], 100);
    }
}
