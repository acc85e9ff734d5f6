//! Gesture classification — a pure function of one landmark frame.
//!
//! The classifier keeps no history. Every call returns a complete
//! [`HandState`] snapshot that replaces the previous one wholesale.

use log::trace;

use crate::landmark::{
    HandLandmarks, Landmark, FINGER_TIPS, INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP,
};

// ════════════════════════════════════════════════════════════════════════════
// GestureKind
// ════════════════════════════════════════════════════════════════════════════

/// A discrete hand pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GestureKind {
    #[default]
    Idle,
    /// Thumb tip touching index tip, other fingers not all extended.
    Pinch,
    /// All four fingers extended.
    OpenPalm,
    /// Index and middle extended, pinky curled.
    VSign,
    /// Thumb tip touching index tip with middle, ring and pinky extended.
    OkSign,
    /// All four fingers curled.
    Fist,
}

impl GestureKind {
    pub fn label(&self) -> &'static str {
        match self {
            GestureKind::Idle     => "IDLE",
            GestureKind::Pinch    => "PINCH",
            GestureKind::OpenPalm => "OPEN PALM",
            GestureKind::VSign    => "V SIGN",
            GestureKind::OkSign   => "OK SIGN",
            GestureKind::Fist     => "FIST",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandState
// ════════════════════════════════════════════════════════════════════════════

/// The classifier's output for one frame.
///
/// When `present` is false the gesture is always `Idle` and the pointer sits
/// at the centre `(0.5, 0.5, 0)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandState {
    pub gesture: GestureKind,
    pub x:       f32,
    pub y:       f32,
    pub z:       f32,
    pub present: bool,
}

impl HandState {
    /// The "no hand in view" snapshot.
    pub const fn absent() -> Self {
        HandState { gesture: GestureKind::Idle, x: 0.5, y: 0.5, z: 0.0, present: false }
    }

    /// A present hand whose pose could not be judged.
    const fn unreadable() -> Self {
        HandState { gesture: GestureKind::Idle, x: 0.5, y: 0.5, z: 0.0, present: true }
    }
}

impl Default for HandState {
    fn default() -> Self { HandState::absent() }
}

// ════════════════════════════════════════════════════════════════════════════
// Classifier
// ════════════════════════════════════════════════════════════════════════════

/// Tunable thresholds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifierConfig {
    /// A finger counts as extended when wrist→tip exceeds this multiple of
    /// wrist→knuckle.
    pub extension_ratio: f32,
    /// Thumb-tip to index-tip distance below which the fingers touch.
    pub pinch_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            extension_ratio: 1.3,
            pinch_threshold: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Classifier {
    pub config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Classifier { config }
    }

    /// Classify one frame: `None` means no hand was detected.
    pub fn classify(&self, hand: Option<&HandLandmarks>) -> HandState {
        let Some(hand) = hand else { return HandState::absent() };
        if !hand.is_finite() || !Self::has_palm(hand) {
            return HandState::unreadable();
        }

        let gesture = self.gesture_of(hand);
        let tip = hand.index_tip();
        trace!("classified {:?} at index tip ({:.3}, {:.3})", gesture, tip.x, tip.y);

        HandState {
            gesture,
            // Mirrored camera feed: flip x so the pointer follows the user.
            x: 1.0 - tip.x,
            y: tip.y,
            z: tip.z,
            present: true,
        }
    }

    /// Classify a raw detector slice. Anything other than 21 points is
    /// treated as an unreadable hand.
    pub fn classify_points(&self, points: Option<&[Landmark]>) -> HandState {
        match points {
            None => HandState::absent(),
            Some(pts) => match HandLandmarks::from_slice(pts) {
                Some(hand) => self.classify(Some(&hand)),
                None       => HandState::unreadable(),
            },
        }
    }

    /// Thumb tip to index tip, in landmark units.
    pub fn pinch_distance(hand: &HandLandmarks) -> f32 {
        hand.thumb_tip().distance(hand.index_tip())
    }

    /// Every knuckle must sit away from the wrist, or the extension ratio
    /// has nothing to measure against.
    fn has_palm(hand: &HandLandmarks) -> bool {
        let wrist = hand.wrist();
        FINGER_TIPS.iter().all(|&tip| wrist.distance(hand.get(tip - 3)) > f32::EPSILON)
    }

    /// Scale-invariant extension test for the finger ending at `tip`.
    /// False for anything that is not one of the four finger tips.
    pub fn is_extended(&self, hand: &HandLandmarks, tip: usize) -> bool {
        if !FINGER_TIPS.contains(&tip) {
            return false;
        }
        let wrist = hand.wrist();
        let to_tip     = wrist.distance(hand.get(tip));
        let to_knuckle = wrist.distance(hand.get(tip - 3));
        to_tip > self.config.extension_ratio * to_knuckle
    }

    // First match wins; the predicates overlap, so the order is load-bearing.
    fn gesture_of(&self, hand: &HandLandmarks) -> GestureKind {
        let ext = |tip| self.is_extended(hand, tip);

        if FINGER_TIPS.iter().all(|&t| !ext(t)) {
            return GestureKind::Fist;
        }

        if Self::pinch_distance(hand) < self.config.pinch_threshold {
            return if ext(MIDDLE_TIP) && ext(RING_TIP) && ext(PINKY_TIP) {
                GestureKind::OkSign
            } else {
                GestureKind::Pinch
            };
        }

        if ext(INDEX_TIP) && ext(MIDDLE_TIP) && !ext(PINKY_TIP) {
            return GestureKind::VSign;
        }

        if FINGER_TIPS.iter().all(|&t| ext(t)) {
            return GestureKind::OpenPalm;
        }

        GestureKind::Idle
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{THUMB_TIP, LANDMARK_COUNT};
    use crate::pose::HandPose;

    fn classify(pose: HandPose) -> HandState {
        Classifier::default().classify(Some(&pose.synthesize(0.5, 0.5)))
    }

    #[test]
    fn no_hand_is_absent_idle_centre() {
        let s = Classifier::default().classify(None);
        assert_eq!(s, HandState { gesture: GestureKind::Idle, x: 0.5, y: 0.5, z: 0.0, present: false });
    }

    #[test]
    fn each_pose_classifies() {
        assert_eq!(classify(HandPose::Open).gesture,   GestureKind::OpenPalm);
        assert_eq!(classify(HandPose::Fist).gesture,   GestureKind::Fist);
        assert_eq!(classify(HandPose::Pinch).gesture,  GestureKind::Pinch);
        assert_eq!(classify(HandPose::VSign).gesture,  GestureKind::VSign);
        assert_eq!(classify(HandPose::OkSign).gesture, GestureKind::OkSign);
        assert_eq!(classify(HandPose::Point).gesture,  GestureKind::Idle);
    }

    #[test]
    fn fist_wins_regardless_of_thumb() {
        let base = HandPose::Fist.synthesize(0.5, 0.5);
        let index_tip = base.index_tip();
        // Sweep the thumb tip around, including right onto the index tip.
        for i in 0..=20 {
            for j in 0..=20 {
                let mut pts = *base.points();
                pts[THUMB_TIP] = Landmark::new(
                    index_tip.x - 0.2 + 0.02 * i as f32,
                    index_tip.y - 0.2 + 0.02 * j as f32,
                    0.0,
                );
                let s = Classifier::default().classify(Some(&HandLandmarks::new(pts)));
                assert_eq!(s.gesture, GestureKind::Fist);
            }
        }
    }

    #[test]
    fn wide_thumb_never_pinches() {
        let c = Classifier::default();
        for pose in [HandPose::Open, HandPose::VSign, HandPose::Point, HandPose::Pinch, HandPose::OkSign] {
            let base = pose.synthesize(0.5, 0.5);
            let tip = base.index_tip();
            for k in 0..16 {
                let angle = k as f32 * std::f32::consts::TAU / 16.0;
                let mut pts = *base.points();
                pts[THUMB_TIP] = Landmark::new(tip.x + 0.06 * angle.cos(), tip.y + 0.06 * angle.sin(), 0.0);
                let hand = HandLandmarks::new(pts);
                assert!(Classifier::pinch_distance(&hand) >= 0.05);
                let g = c.classify(Some(&hand)).gesture;
                assert!(g != GestureKind::Pinch && g != GestureKind::OkSign, "{:?} gave {:?}", pose, g);
            }
        }
    }

    #[test]
    fn pointer_is_mirrored_index_tip() {
        let hand = HandPose::Open.synthesize(0.3, 0.42);
        let s = Classifier::default().classify(Some(&hand));
        assert!((hand.index_tip().x - 0.3).abs() < 1e-6);
        assert!((s.x - 0.7).abs() < 1e-6);
        assert!((s.y - 0.42).abs() < 1e-6);
        assert!(s.present);
    }

    #[test]
    fn extension_is_scale_invariant() {
        let c = Classifier::default();
        let hand = HandPose::VSign.synthesize(0.5, 0.5);
        let mut big = *hand.points();
        for p in &mut big {
            p.x *= 2.5;
            p.y *= 2.5;
        }
        let big = HandLandmarks::new(big);
        for tip in FINGER_TIPS {
            assert_eq!(c.is_extended(&hand, tip), c.is_extended(&big, tip));
        }
    }

    #[test]
    fn degenerate_frames_fall_back_to_idle() {
        let c = Classifier::default();
        let short = vec![Landmark::default(); 12];
        let s = c.classify_points(Some(&short));
        assert_eq!(s.gesture, GestureKind::Idle);
        assert!(s.present);

        let mut pts = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        pts[INDEX_TIP].x = f32::NAN;
        let s = c.classify(Some(&HandLandmarks::new(pts)));
        assert_eq!(s.gesture, GestureKind::Idle);
        assert_eq!((s.x, s.y), (0.5, 0.5));

        // Every point on top of each other: no palm to measure against.
        let collapsed = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        let s = c.classify(Some(&HandLandmarks::new(collapsed)));
        assert_eq!(s, HandState { gesture: GestureKind::Idle, x: 0.5, y: 0.5, z: 0.0, present: true });

        // One finger's knuckle folded onto the wrist.
        let mut pts = *HandPose::Fist.synthesize(0.5, 0.5).points();
        pts[RING_TIP - 3] = pts[crate::landmark::WRIST];
        let s = c.classify(Some(&HandLandmarks::new(pts)));
        assert_eq!(s.gesture, GestureKind::Idle);
    }

    #[test]
    fn pinch_threshold_is_exclusive() {
        let c = Classifier::default();
        for pose in [HandPose::Pinch, HandPose::OkSign] {
            // Index tip at the origin so the thumb offset is exact.
            let mut pts = *pose.synthesize(0.0, 0.0).points();
            pts[INDEX_TIP] = Landmark::new(0.0, 0.0, 0.0);
            pts[THUMB_TIP] = Landmark::new(0.05, 0.0, 0.0);
            let hand = HandLandmarks::new(pts);
            assert_eq!(Classifier::pinch_distance(&hand), c.config.pinch_threshold);
            let g = c.classify(Some(&hand)).gesture;
            assert!(g != GestureKind::Pinch && g != GestureKind::OkSign, "{:?} gave {:?}", pose, g);

            pts[THUMB_TIP] = Landmark::new(0.049, 0.0, 0.0);
            let g = c.classify(Some(&HandLandmarks::new(pts))).gesture;
            assert!(g == GestureKind::Pinch || g == GestureKind::OkSign, "{:?} gave {:?}", pose, g);
        }
    }

    #[test]
    fn extension_only_measures_finger_tips() {
        let c = Classifier::default();
        let hand = HandPose::Open.synthesize(0.5, 0.5);
        for tip in [0, 1, 2, THUMB_TIP, 5, 9, LANDMARK_COUNT, usize::MAX] {
            assert!(!c.is_extended(&hand, tip), "tip {}", tip);
        }
        assert!(FINGER_TIPS.iter().all(|&t| c.is_extended(&hand, t)));
    }

    #[test]
    fn tighter_pinch_threshold_changes_outcome() {
        let hand = HandPose::Pinch.synthesize(0.5, 0.5);
        let strict = Classifier::new(ClassifierConfig { pinch_threshold: 0.001, ..Default::default() });
        assert_ne!(strict.classify(Some(&hand)).gesture, GestureKind::Pinch);
    }
}
