//! Hand-gesture classification adapter.
//!
//! Wraps a third-party landmark tracker behind a narrow interface and
//! turns raw hand geometry into debounced OPEN/CLOSE events. The tracker
//! arrives over a one-shot readiness channel; per-frame tracker failures
//! are logged and dropped, never propagated into the mode controller.

use crate::config::GestureConfig;
use anyhow::Result;
use crossbeam_channel::{Receiver, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// Landmark indices, matching the MediaPipe hand model.
pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_BASE: usize = 5;
pub const PINKY_TIP: usize = 20;
pub const LANDMARK_COUNT: usize = 21;

/// Normalized image-space landmark.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Landmark set for one tracked hand.
#[derive(Clone, Debug)]
pub struct HandLandmarks {
    pub points: [Landmark; LANDMARK_COUNT],
}

/// Discrete classification of one camera frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    Open,
    Close,
    None,
}

/// One camera frame handed to the tracker. Opaque to this module.
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Narrow boundary over the external landmark tracker, so it can be
/// swapped or mocked without touching the mode controller.
pub trait HandTracker: Send {
    /// Landmarks for the most prominent hand, or None when no hand is
    /// visible in the frame.
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<HandLandmarks>>;
}

/// External frame source feeding the pipeline (camera capture).
pub trait CameraFeed: Send {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>>;
}

/// Scale-invariant "hand openness": thumb-tip-to-pinky-tip span divided
/// by the wrist-to-index-base reference, thresholded into OPEN / CLOSE
/// with an ambiguous band in between.
pub fn classify_openness(hand: &HandLandmarks, cfg: &GestureConfig) -> Gesture {
    let wrist = hand.points[WRIST];
    let index_base = hand.points[INDEX_BASE];
    let hand_size = wrist.distance(index_base);

    let span = hand.points[THUMB_TIP].distance(hand.points[PINKY_TIP]);
    // Degenerate landmarks would divide by zero.
    let normalized = span / hand_size.max(1e-3);

    if normalized > cfg.open_threshold {
        Gesture::Open
    } else if normalized < cfg.close_threshold {
        Gesture::Close
    } else {
        Gesture::None
    }
}

/// Edge-trigger plus minimum-interval filter. Frame-rate jitter produces
/// the same classification many times per second; only state-changing
/// transitions separated by the cooldown get through.
pub struct Debouncer {
    last_emitted: Gesture,
    last_emit_at: Option<Instant>,
    cooldown: Duration,
}

impl Debouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_emitted: Gesture::None,
            last_emit_at: None,
            cooldown,
        }
    }

    pub fn filter(&mut self, gesture: Gesture, now: Instant) -> Option<Gesture> {
        if gesture == Gesture::None || gesture == self.last_emitted {
            return None;
        }
        if let Some(t) = self.last_emit_at {
            if now.duration_since(t) < self.cooldown {
                return None;
            }
        }
        self.last_emitted = gesture;
        self.last_emit_at = Some(now);
        Some(gesture)
    }
}

enum TrackerSlot {
    /// Waiting on the external loader; checked once per frame, no retry
    /// timer.
    Pending(Receiver<Box<dyn HandTracker>>),
    Ready(Box<dyn HandTracker>),
    Released,
}

/// The adapter: tracker slot plus debounce state.
pub struct GesturePipeline {
    slot: TrackerSlot,
    debounce: Debouncer,
}

impl GesturePipeline {
    /// Build against a readiness channel; the tracker is delivered once
    /// when its external loader finishes.
    pub fn new(tracker_rx: Receiver<Box<dyn HandTracker>>, cfg: &GestureConfig) -> Self {
        Self {
            slot: TrackerSlot::Pending(tracker_rx),
            debounce: Debouncer::new(Duration::from_millis(cfg.cooldown_ms)),
        }
    }

    /// Build with a tracker already in hand.
    pub fn with_tracker(tracker: Box<dyn HandTracker>, cfg: &GestureConfig) -> Self {
        Self {
            slot: TrackerSlot::Ready(tracker),
            debounce: Debouncer::new(Duration::from_millis(cfg.cooldown_ms)),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.slot, TrackerSlot::Ready(_))
    }

    /// One camera frame in, at most one debounced event out. Tracker
    /// errors drop the frame: a single missed classification is
    /// inconsequential and must not halt the pipeline.
    pub fn process_frame(
        &mut self,
        frame: &VideoFrame,
        cfg: &GestureConfig,
        now: Instant,
    ) -> Option<Gesture> {
        if let TrackerSlot::Pending(rx) = &self.slot {
            match rx.try_recv() {
                Ok(tracker) => {
                    debug!("hand tracker ready");
                    self.slot = TrackerSlot::Ready(tracker);
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    warn!("hand tracker loader went away");
                    self.slot = TrackerSlot::Released;
                    return None;
                }
            }
        }
        let tracker = match &mut self.slot {
            TrackerSlot::Ready(t) => t,
            _ => return None,
        };

        let hand = match tracker.detect(frame) {
            Ok(hand) => hand?,
            Err(err) => {
                warn!("hand tracker failed, dropping frame: {err:#}");
                return None;
            }
        };

        let gesture = classify_openness(&hand, cfg);
        self.debounce.filter(gesture, now)
    }

    /// Drop the tracker (and with it the camera resources), independently
    /// of the render loop's lifetime.
    pub fn release(&mut self) {
        self.slot = TrackerSlot::Released;
    }
}

#[cfg(test)]
fn hand_with(normalized_span: f32) -> HandLandmarks {
    // Wrist to index base is 1.0, so the thumb-pinky span IS the
    // normalized metric.
    let mut points = [Landmark::default(); LANDMARK_COUNT];
    points[WRIST] = Landmark { x: 0.0, y: 0.0 };
    points[INDEX_BASE] = Landmark { x: 0.0, y: 1.0 };
    points[THUMB_TIP] = Landmark { x: 0.0, y: 0.0 };
    points[PINKY_TIP] = Landmark {
        x: normalized_span,
        y: 0.0,
    };
    HandLandmarks { points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureConfig;

    fn frame() -> VideoFrame {
        VideoFrame {
            width: 2,
            height: 2,
            rgb: vec![0; 12],
        }
    }

    struct FixedTracker(Option<HandLandmarks>);
    impl HandTracker for FixedTracker {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<Option<HandLandmarks>> {
            Ok(self.0.clone())
        }
    }

    struct FailingTracker;
    impl HandTracker for FailingTracker {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<Option<HandLandmarks>> {
            anyhow::bail!("tracker backend crashed")
        }
    }

    #[test]
    fn openness_thresholds() {
        let cfg = GestureConfig::default();
        assert_eq!(classify_openness(&hand_with(1.5), &cfg), Gesture::Open);
        assert_eq!(classify_openness(&hand_with(0.5), &cfg), Gesture::Close);
        assert_eq!(classify_openness(&hand_with(1.0), &cfg), Gesture::None);
    }

    #[test]
    fn degenerate_landmarks_do_not_divide_by_zero() {
        let cfg = GestureConfig::default();
        let hand = HandLandmarks {
            points: [Landmark::default(); LANDMARK_COUNT],
        };
        // All-zero geometry reads as a closed fist, never NaN or panic.
        assert_eq!(classify_openness(&hand, &cfg), Gesture::Close);
    }

    #[test]
    fn debounce_is_edge_triggered() {
        let mut d = Debouncer::new(Duration::from_millis(300));
        let t0 = Instant::now();
        assert_eq!(d.filter(Gesture::Open, t0), Some(Gesture::Open));
        // Same gesture again: no edge, no event, at any interval.
        assert_eq!(d.filter(Gesture::Open, t0 + Duration::from_secs(5)), None);
        // NONE never emits.
        assert_eq!(d.filter(Gesture::None, t0 + Duration::from_secs(6)), None);
    }

    #[test]
    fn debounce_bounds_emissions_by_cooldown_not_input_rate() {
        let cooldown = Duration::from_millis(300);
        let mut d = Debouncer::new(cooldown);
        let t0 = Instant::now();

        // Alternate OPEN/CLOSE every 50 ms for 3 s: 60 inputs.
        let mut emitted = 0;
        let mut inputs = 0;
        let mut t = t0;
        while t < t0 + Duration::from_secs(3) {
            let g = if inputs % 2 == 0 {
                Gesture::Open
            } else {
                Gesture::Close
            };
            if d.filter(g, t).is_some() {
                emitted += 1;
            }
            inputs += 1;
            t += Duration::from_millis(50);
        }
        assert_eq!(inputs, 60);
        // Bounded by elapsed / cooldown (3 s / 300 ms = 10), plus the
        // leading edge.
        assert!(emitted <= 11, "emitted {emitted} events");
        assert!(emitted >= 2);
    }

    #[test]
    fn pipeline_swallows_tracker_errors() {
        let cfg = GestureConfig::default();
        let mut pipeline = GesturePipeline::with_tracker(Box::new(FailingTracker), &cfg);
        assert_eq!(pipeline.process_frame(&frame(), &cfg, Instant::now()), None);
        // The pipeline is still alive and usable.
        assert!(pipeline.is_ready());
    }

    #[test]
    fn pipeline_waits_for_tracker_readiness() {
        let cfg = GestureConfig::default();
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut pipeline = GesturePipeline::new(rx, &cfg);

        assert!(!pipeline.is_ready());
        assert_eq!(pipeline.process_frame(&frame(), &cfg, Instant::now()), None);

        let tracker: Box<dyn HandTracker> = Box::new(FixedTracker(Some(hand_with(1.5))));
        tx.send(tracker).unwrap();

        let got = pipeline.process_frame(&frame(), &cfg, Instant::now());
        assert_eq!(got, Some(Gesture::Open));
        assert!(pipeline.is_ready());
    }

    #[test]
    fn release_drops_the_tracker() {
        let cfg = GestureConfig::default();
        let mut pipeline =
            GesturePipeline::with_tracker(Box::new(FixedTracker(Some(hand_with(1.5)))), &cfg);
        pipeline.release();
        assert!(!pipeline.is_ready());
        assert_eq!(pipeline.process_frame(&frame(), &cfg, Instant::now()), None);
    }

    #[test]
    fn no_hand_means_no_event() {
        let cfg = GestureConfig::default();
        let mut pipeline = GesturePipeline::with_tracker(Box::new(FixedTracker(None)), &cfg);
        assert_eq!(pipeline.process_frame(&frame(), &cfg, Instant::now()), None);
    }
}
