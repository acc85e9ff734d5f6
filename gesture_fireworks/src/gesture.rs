//! Landmark frame sources — LeapMotion hardware or keyboard/mouse simulation.
//!
//! A source runs on its own thread and reports each detection through
//! [`Detections::deliver`], which classifies the landmarks and forwards a
//! [`HandFrame`] over an `mpsc` channel. The render loop drains the channel
//! and keeps only the newest frame, so detection never blocks rendering and
//! rendering never blocks detection.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use hand_gesture::{Classifier, HandLandmarks, HandPose, HandState};
use log::debug;

// ════════════════════════════════════════════════════════════════════════════
// HandFrame
// ════════════════════════════════════════════════════════════════════════════

/// One detection: the classified state plus the raw landmarks for the
/// skeleton overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandFrame {
    pub state:     HandState,
    pub landmarks: Option<HandLandmarks>,
}

// ════════════════════════════════════════════════════════════════════════════
// Detections — the callback handed to every source
// ════════════════════════════════════════════════════════════════════════════

pub struct Detections {
    classifier: Classifier,
    tx:         Sender<HandFrame>,
}

impl Detections {
    pub fn new(classifier: Classifier, tx: Sender<HandFrame>) -> Self {
        Detections { classifier, tx }
    }

    /// Classify one detection and publish it. Returns false once the
    /// receiving side has gone away.
    pub fn deliver(&self, hand: Option<&HandLandmarks>) -> bool {
        let state = self.classifier.classify(hand);
        self.tx.send(HandFrame { state, landmarks: hand.copied() }).is_ok()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait — unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can report hand detections.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, detections: Detections);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_hand_source<S: LandmarkSource>(source: S, classifier: Classifier) -> Receiver<HandFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(Detections::new(classifier, tx)));
    rx
}

/// Drain every pending frame and keep the newest. `Err(())` once the source
/// thread has exited.
pub fn latest_frame(rx: &Receiver<HandFrame>) -> Result<Option<HandFrame>, ()> {
    let mut latest = None;
    loop {
        match rx.try_recv() {
            Ok(frame)                            => latest = Some(frame),
            Err(mpsc::TryRecvError::Empty)        => return Ok(latest),
            Err(mpsc::TryRecvError::Disconnected) => {
                return if latest.is_some() { Ok(latest) } else { Err(()) };
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapHandSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hand tracking backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// Each tracking frame's first hand (right preferred) is converted from bone
/// joints in millimetres into the 21-point normalized landmark layout.
/// The camera-mirror flip applied by the classifier is pre-cancelled here
/// because LeapMotion coordinates are not mirrored.
#[cfg(feature = "leap")]
pub struct LeapHandSource;

#[cfg(feature = "leap")]
impl LandmarkSource for LeapHandSource {
    fn run(self: Box<Self>, detections: Detections) {
        use leaprs::*;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => { log::error!("LeapC connection failed: {:?}", e); return; }
        };
        if let Err(e) = connection.open() {
            log::error!("cannot open LeapMotion device: {:?}", e);
            return;
        }

        let mut had_hand = false;
        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<_> = frame.hands().collect();
                let hand = hands.iter()
                    .find(|h| h.hand_type() == HandType::Right)
                    .or_else(|| hands.first());

                let alive = match hand.and_then(|h| leap_landmarks(h)) {
                    Some(lm) => { had_hand = true; detections.deliver(Some(&lm)) }
                    None if had_hand => { had_hand = false; detections.deliver(None) }
                    None => true,
                };
                if !alive { return; }
            }
        }
    }
}

/// Map LeapMotion bones onto the 21-point landmark layout.
#[cfg(feature = "leap")]
fn leap_landmarks(hand: &leaprs::Hand) -> Option<HandLandmarks> {
    use hand_gesture::{Landmark, LANDMARK_COUNT};

    // Tracking volume (mm) that maps onto the unit square.
    const HALF_WIDTH: f32 = 200.0;
    const FLOOR:      f32 = 50.0;
    const SPAN:       f32 = 400.0;

    let to_landmark = |x: f32, y: f32, z: f32| Landmark::new(
        1.0 - (x + HALF_WIDTH) / SPAN,
        1.0 - (y - FLOOR) / SPAN,
        z / SPAN,
    );

    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 { return None; }

    let mut pts = [Landmark::default(); LANDMARK_COUNT];
    let (mut wx, mut wy, mut wz) = (0.0, 0.0, 0.0);
    for (f, digit) in digits.iter().take(5).enumerate() {
        let joints = [
            digit.proximal().prev_joint(),
            digit.intermediate().prev_joint(),
            digit.distal().prev_joint(),
            digit.distal().next_joint(),
        ];
        for (k, j) in joints.iter().enumerate() {
            pts[1 + 4 * f + k] = to_landmark(j.x, j.y, j.z);
        }
        if f > 0 {
            let base = digit.metacarpal().prev_joint();
            wx += base.x / 4.0;
            wy += base.y / 4.0;
            wz += base.z / 4.0;
        }
    }
    pts[0] = to_landmark(wx, wy, wz);
    Some(HandLandmarks::new(pts))
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource — keyboard/mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Where the on-screen cursor should be, normalized `[0, 1]`.
    Pointer { x: f32, y: f32 },
    /// Hold up a different pose.
    Pose(HandPose),
    /// Pull the hand out of view / bring it back.
    ToggleHand,
}

/// Landmark source driven by [`SimInput`] events from the visualizer's
/// window. Every input produces one synthetic detection.
pub struct SimHandSource {
    rx:      Receiver<SimInput>,
    pose:    HandPose,
    cursor:  (f32, f32),
    present: bool,
}

impl SimHandSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimHandSource { rx, pose: HandPose::Point, cursor: (0.5, 0.5), present: true }
    }

    /// Apply one input to the simulated hand.
    fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::Pointer { x, y } => self.cursor = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)),
            SimInput::Pose(p)          => { self.pose = p; self.present = true; }
            SimInput::ToggleHand       => self.present = !self.present,
        }
    }

    /// The landmarks a camera would report right now.
    fn detect(&self) -> Option<HandLandmarks> {
        // The classifier mirrors x, so place the fingertip mirrored.
        self.present.then(|| self.pose.synthesize(1.0 - self.cursor.0, self.cursor.1))
    }
}

impl LandmarkSource for SimHandSource {
    fn run(mut self: Box<Self>, detections: Detections) {
        if !detections.deliver(self.detect().as_ref()) { return; }
        while let Ok(input) = self.rx.recv() {
            if let SimInput::Pose(p) = input {
                debug!("sim pose → {}", p.name());
            }
            self.apply(input);
            if !detections.deliver(self.detect().as_ref()) { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
