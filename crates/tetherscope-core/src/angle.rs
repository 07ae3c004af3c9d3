//! Angle helpers for a rig that crosses the 0/2π seam once per revolution.

use crate::vector::Vector2D;
use std::f64::consts::{PI, TAU};

/// Maps any angular difference into `(-π, π]`, the shortest signed path.
///
/// `((Δ + π) mod 2π) - π` with a Euclidean remainder; an exact `-π` comes out
/// as `+π` so the interval stays half-open on the left.
#[inline]
pub fn wrap_angle(delta: f64) -> f64 {
    let wrapped = (delta + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Maps any angle into `[0, 2π)`.
#[inline]
pub fn normalize_angle(theta: f64) -> f64 {
    let r = theta.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if r >= TAU {
        0.0
    } else {
        r
    }
}

/// Angle of `point` as seen from `center`, in `[0, 2π)`.
pub fn angle_from_center(center: Vector2D, point: Vector2D) -> f64 {
    let d = point - center;
    normalize_angle(d.y.atan2(d.x))
}
