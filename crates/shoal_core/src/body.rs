//! Kinematic body of a fish: a freely steered head dragging a chain of
//! segments behind it.
//!
//! Segments are stored head first in one vector; segment `i`'s predecessor is
//! `i - 1`. Only the head moves on its own, every other segment is pulled
//! along by a single-pass distance constraint and a joint bend limit.

use crate::config::FishConfig;
use shoal_data::{Bounds, Decision};
use std::f64::consts::{PI, TAU};

/// Wraps an angle into `(-PI, PI]`.
#[must_use]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + 3.0 * PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub x: f64,
    pub y: f64,
    /// Body half-width at this segment, used for contours and eat distance.
    pub radius: f64,
}

impl Segment {
    #[must_use]
    pub fn distance_to(&self, other: &Segment) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    segments: Vec<Segment>,
    heading: f64,
    wave_phase: f64,
    segment_length: f64,
    max_bend_angle: f64,
}

impl Body {
    /// Lays a straight body out behind `(x, y)`, pointing along `heading`.
    #[must_use]
    pub fn new(x: f64, y: f64, heading: f64, config: &FishConfig, visual_scale: f64) -> Self {
        let count = config.segment_count.max(2);
        let head_radius = config.head_radius * visual_scale;
        let segments = (0..count)
            .map(|i| {
                let t = i as f64 / (count - 1) as f64;
                let radius = if i == 0 {
                    head_radius
                } else {
                    head_radius * (1.0 - t.powf(1.1))
                };
                let back = i as f64 * config.segment_length;
                Segment {
                    x: x - heading.cos() * back,
                    y: y - heading.sin() * back,
                    radius,
                }
            })
            .collect();
        Self {
            segments,
            heading: wrap_angle(heading),
            wave_phase: 0.4,
            segment_length: config.segment_length,
            max_bend_angle: config.max_bend_angle,
        }
    }

    #[must_use]
    pub fn head(&self) -> &Segment {
        &self.segments[0]
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn heading(&self) -> f64 {
        self.heading
    }

    #[must_use]
    pub fn segment_length(&self) -> f64 {
        self.segment_length
    }

    #[must_use]
    pub fn max_bend_angle(&self) -> f64 {
        self.max_bend_angle
    }

    /// Mutable access for tests and tools that need to pose a body.
    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    /// Steers and advances the head by one tick.
    ///
    /// `speed` is the distance covered this tick. Without a decision the head
    /// keeps its heading. Inside the wall margin the heading snaps toward the
    /// tank centre, and the head is always clamped inside the padded tank.
    pub fn move_head(
        &mut self,
        bounds: &Bounds,
        decision: Option<Decision>,
        speed: f64,
        config: &FishConfig,
    ) {
        if let Some(decision) = decision {
            let decision = decision.clamped();
            self.heading = wrap_angle(self.heading + decision.turn * config.max_turn_rate);
        }

        self.wave_phase = (self.wave_phase + config.wave_increment) % TAU;
        let wave_offset = self.wave_phase.sin() * config.wave_amplitude;
        let speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };

        let head = &mut self.segments[0];
        head.x += (self.heading + wave_offset).cos() * speed;
        head.y += (self.heading + wave_offset).sin() * speed;

        let margin = config.wall_margin;
        if head.x < margin
            || head.x > bounds.width - margin
            || head.y < margin
            || head.y > bounds.height - margin
        {
            let (cx, cy) = bounds.center();
            self.heading = wrap_angle((cy - head.y).atan2(cx - head.x));
        }

        let pad = config.edge_padding;
        head.x = head.x.clamp(pad, (bounds.width - pad).max(pad));
        head.y = head.y.clamp(pad, (bounds.height - pad).max(pad));
    }

    /// Pulls every segment back within `segment_length` of its predecessor.
    pub fn constrain(&mut self) {
        for i in 1..self.segments.len() {
            self.constrain_segment(i);
        }
    }

    fn constrain_segment(&mut self, i: usize) {
        let prev = self.segments[i - 1];
        let seg = &mut self.segments[i];
        let dx = seg.x - prev.x;
        let dy = seg.y - prev.y;
        let distance = dx.hypot(dy);
        if distance > self.segment_length {
            let angle = dy.atan2(dx);
            seg.x = prev.x + angle.cos() * self.segment_length;
            seg.y = prev.y + angle.sin() * self.segment_length;
        }
    }

    /// Clamps the bend at the joint formed by segments `i`, `i+1`, `i+2` by
    /// relocating segment `i+2`.
    pub fn limit_joint_angle(&mut self, i: usize) {
        let p1 = self.segments[i];
        let p2 = self.segments[i + 1];
        let p3 = self.segments[i + 2];
        let angle1 = (p2.y - p1.y).atan2(p2.x - p1.x);
        let angle2 = (p3.y - p2.y).atan2(p3.x - p2.x);
        let diff = wrap_angle(angle2 - angle1);

        if diff.abs() > self.max_bend_angle {
            let new_angle = angle1 + self.max_bend_angle * diff.signum();
            let tail = &mut self.segments[i + 2];
            tail.x = p2.x + new_angle.cos() * self.segment_length;
            tail.y = p2.y + new_angle.sin() * self.segment_length;
        }
    }

    /// Drags the chain after the head moved: constrain and bend-limit each
    /// segment in head-to-tail order, so both hold for the whole chain.
    pub fn follow(&mut self) {
        for i in 1..self.segments.len() {
            self.constrain_segment(i);
            if i >= 2 {
                self.limit_joint_angle(i - 2);
            }
        }
    }

    /// Signed bend at interior joint `i` (between segments `i..=i+2`).
    #[must_use]
    pub fn joint_angle(&self, i: usize) -> f64 {
        let p1 = self.segments[i];
        let p2 = self.segments[i + 1];
        let p3 = self.segments[i + 2];
        let angle1 = (p2.y - p1.y).atan2(p2.x - p1.x);
        let angle2 = (p3.y - p2.y).atan2(p3.x - p2.x);
        wrap_angle(angle2 - angle1)
    }
}
