//! Frame-rate independent smoothing toward a moving target.
//!
//! A critically damped spring with velocity carried between frames. Values
//! within [`EPSILON`] of the target snap onto it, so a still target is
//! reached exactly and held.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

pub const EPSILON: f32 = 0.001;

fn ease(t: f32) -> f32 {
    1.0 / (1.0 + t + 0.48 * t * t + 0.235 * t * t * t)
}

/// Moves `current` toward `target`. Returns `false` once settled.
pub fn damp(current: &mut f32, velocity: &mut f32, target: f32, smooth_time: f32, dt: f32) -> bool {
    if (*current - target).abs() <= EPSILON {
        *current = target;
        *velocity = 0.0;
        return false;
    }
    if dt <= 0.0 {
        return true;
    }

    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;
    let t = ease(omega * dt);
    let change = *current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * t;
    let mut output = target + (change + temp) * t;

    // never overshoot
    if (target - *current > 0.0) == (output > target) {
        output = target;
        *velocity = (output - target) / dt;
    }
    *current = output;
    true
}

/// Component-wise [`damp`] for vectors.
pub fn damp3(current: &mut Vec3, velocity: &mut Vec3, target: Vec3, smooth_time: f32, dt: f32) -> bool {
    let x = damp(&mut current.x, &mut velocity.x, target.x, smooth_time, dt);
    let y = damp(&mut current.y, &mut velocity.y, target.y, smooth_time, dt);
    let z = damp(&mut current.z, &mut velocity.z, target.z, smooth_time, dt);
    x || y || z
}

/// Colors are linear RGB in a `Vec3`; channels may exceed 1.0 for glow.
pub fn damp_color(current: &mut Vec3, velocity: &mut Vec3, target: Vec3, smooth_time: f32, dt: f32) -> bool {
    damp3(current, velocity, target, smooth_time, dt)
}

fn delta_angle(current: f32, target: f32) -> f32 {
    let d = (target - current).rem_euclid(TAU);
    if d > PI {
        d - TAU
    } else {
        d
    }
}

/// Like [`damp`], but takes the short way around the circle.
pub fn damp_angle(current: &mut f32, velocity: &mut f32, target: f32, smooth_time: f32, dt: f32) -> bool {
    let target = *current + delta_angle(*current, target);
    damp(current, velocity, target, smooth_time, dt)
}

/// Euler angles damped per axis with [`damp_angle`].
pub fn damp_euler(current: &mut Vec3, velocity: &mut Vec3, target: Vec3, smooth_time: f32, dt: f32) -> bool {
    let x = damp_angle(&mut current.x, &mut velocity.x, target.x, smooth_time, dt);
    let y = damp_angle(&mut current.y, &mut velocity.y, target.y, smooth_time, dt);
    let z = damp_angle(&mut current.z, &mut velocity.z, target.z, smooth_time, dt);
    x || y || z
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn settle(start: f32, target: f32, dt: f32, frames: usize) -> f32 {
        let mut v = start;
        let mut vel = 0.0;
        for _ in 0..frames {
            damp(&mut v, &mut vel, target, 0.3, dt);
        }
        v
    }

    #[test]
    fn reaches_and_holds_target() {
        let mut v = 0.0;
        let mut vel = 0.0;
        for _ in 0..600 {
            damp(&mut v, &mut vel, 5.0, 0.3, 1.0 / 60.0);
        }
        assert_eq!(v, 5.0);
        assert!(!damp(&mut v, &mut vel, 5.0, 0.3, 1.0 / 60.0));
        assert_eq!(v, 5.0);
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let mut v = 1.0;
        let mut vel = 0.0;
        damp(&mut v, &mut vel, 3.0, 0.3, 0.0);
        assert_eq!(v, 1.0);
    }

    #[test]
    fn frame_rate_independent() {
        // one second of motion at 30 vs 120 fps lands in the same place
        let a = settle(0.0, 10.0, 1.0 / 30.0, 30);
        let b = settle(0.0, 10.0, 1.0 / 120.0, 120);
        assert!((a - b).abs() < 0.1, "{a} vs {b}");
    }

    #[test]
    fn angles_take_the_short_way() {
        let mut a = 0.1;
        let mut vel = 0.0;
        damp_angle(&mut a, &mut vel, TAU - 0.1, 0.2, 1.0 / 60.0);
        assert!(a < 0.1);
    }

    #[test]
    fn vectors_settle_componentwise() {
        let mut p = Vec3::ZERO;
        let mut vel = Vec3::ZERO;
        let target = Vec3::new(1.0, -2.0, 3.0);
        for _ in 0..600 {
            damp3(&mut p, &mut vel, target, 0.3, 1.0 / 60.0);
        }
        assert_eq!(p, target);
    }

    proptest! {
        #[test]
        fn converges_without_overshoot(start in -50.0f32..50.0, target in -50.0f32..50.0) {
            let mut v = start;
            let mut vel = 0.0;
            for _ in 0..900 {
                damp(&mut v, &mut vel, target, 0.3, 1.0 / 60.0);
                let lo = start.min(target) - EPSILON;
                let hi = start.max(target) + EPSILON;
                prop_assert!(v >= lo && v <= hi);
            }
            prop_assert!((v - target).abs() <= EPSILON);
        }
    }
}
