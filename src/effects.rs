//! Slide animations for the pan/zoom effect.
//!
//! Each motion is a fixed combination of a slide across a 1920x1080 canvas
//! and a zoom, chosen by index.

use std::time::Duration;

use rand::Rng;

pub const CANVAS_WIDTH: f64 = 1920.0;
pub const CANVAS_HEIGHT: f64 = 1080.0;

/// Duration handed to every animation, in milliseconds.
pub const ANIMATION_TIME_MS: u32 = 250_000;

pub const PAN_ZOOM_MOTIONS: usize = 9;

/// Slide direction per motion index as (x, y) unit steps; index 0 only zooms.
const DIRECTIONS: [(i32, i32); PAN_ZOOM_MOTIONS] = [
    (0, 0),
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Animation {
    Zoom {
        start: u32,
        end: u32,
        time_ms: u32,
    },
    Slide {
        start: (i32, i32),
        end: (i32, i32),
        time_ms: u32,
    },
}

/// Where to place the slide and how to animate it.
#[derive(Debug, Clone, PartialEq)]
pub struct PanZoomMotion {
    pub index: usize,
    pub position: (i32, i32),
    pub animations: Vec<Animation>,
}

pub fn random_pan_zoom<R: Rng + ?Sized>(rng: &mut R, slide_time: Duration) -> PanZoomMotion {
    pan_zoom(rng.random_range(0..PAN_ZOOM_MOTIONS), slide_time)
}

/// Builds motion `index` (taken modulo [`PAN_ZOOM_MOTIONS`]) for a slide shown
/// for `slide_time`.
pub fn pan_zoom(index: usize, slide_time: Duration) -> PanZoomMotion {
    let index = index % PAN_ZOOM_MOTIONS;
    // one extra second covers the fade out
    let anim_secs = slide_time.as_secs_f64() + 1.0;

    if index == 0 {
        return PanZoomMotion {
            index,
            position: (0, 0),
            animations: vec![Animation::Zoom {
                start: 100,
                end: 400,
                time_ms: ANIMATION_TIME_MS,
            }],
        };
    }

    let (dx, dy) = DIRECTIONS[index];
    let x_travel = CANVAS_WIDTH - CANVAS_WIDTH / 100.0 * anim_secs;
    let y_travel = CANVAS_HEIGHT - CANVAS_HEIGHT / 100.0 * anim_secs;
    let position = (
        round_half_up(-f64::from(dx) * x_travel),
        round_half_up(-f64::from(dy) * y_travel),
    );
    let slide_start = (dx * CANVAS_WIDTH as i32, dy * CANVAS_HEIGHT as i32);
    let zoom = round_half_up(110.0 + anim_secs).max(0) as u32;

    PanZoomMotion {
        index,
        position,
        animations: vec![
            Animation::Slide {
                start: slide_start,
                end: (-slide_start.0, -slide_start.1),
                time_ms: ANIMATION_TIME_MS,
            },
            Animation::Zoom {
                start: zoom,
                end: zoom,
                time_ms: ANIMATION_TIME_MS,
            },
        ],
    }
}

fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
