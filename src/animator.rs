//! Per-frame particle animation.

use crate::damp::{damp3, damp_color};
use crate::field::{Particle, ParticleField};
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::rc::Rc;

pub const POSITION_SMOOTH_TIME: f32 = 0.3;
pub const COLOR_SMOOTH_TIME: f32 = 0.15;
pub const NORMAL_DRIFT: f32 = 1.0;
pub const DETAIL_DRIFT: f32 = 0.2;
/// Per-particle spin, radians per (scaled) second.
pub const SPIN_RATE: f32 = 0.2;
pub const HIGHLIGHT: Vec3 = Vec3::splat(1.5);
/// Cursor position used when the pointer is not over the field.
pub const CURSOR_SENTINEL: Vec3 = Vec3::splat(10_000.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Repulsion {
    /// Radius inside which particles get pushed.
    pub displacement: f32,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
    pub elapsed: f32,
    pub dt: f32,
    /// Cursor in field-local space.
    pub cursor: Vec3,
    pub pointer_over: bool,
}

/// Per-instance transforms and colors plus upload flags.
#[derive(Clone, Debug, Default)]
pub struct InstanceBuffer {
    transforms: Vec<Mat4>,
    colors: Vec<Vec3>,
    transforms_dirty: bool,
    colors_dirty: bool,
}

impl InstanceBuffer {
    fn with_len(len: usize) -> Self {
        Self {
            transforms: vec![Mat4::IDENTITY; len],
            colors: vec![Vec3::ZERO; len],
            transforms_dirty: true,
            colors_dirty: true,
        }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn needs_upload(&self) -> bool {
        self.transforms_dirty || self.colors_dirty
    }

    pub fn mark_uploaded(&mut self) {
        self.transforms_dirty = false;
        self.colors_dirty = false;
    }
}

#[derive(Clone, Copy, Debug)]
struct ParticleState {
    position: Vec3,
    velocity: Vec3,
    color: Vec3,
    color_velocity: Vec3,
}

/// Drift target of a particle at scaled time `t`.
pub fn ambient_target(p: &Particle, t: f32) -> Vec3 {
    let m = if p.high_detail { DETAIL_DRIFT } else { NORMAL_DRIFT };
    let s = p.speed_factor;
    p.anchor
        + Vec3::new(
            (t * s + p.seeds.x).sin(),
            (t * s * 0.9 + p.seeds.y).cos(),
            (t * s * 0.7 + p.seeds.z).sin(),
        ) * m
}

pub struct AnimationState {
    field: Rc<ParticleField>,
    states: Vec<ParticleState>,
    buffer: InstanceBuffer,
}

impl AnimationState {
    pub fn new(field: Rc<ParticleField>) -> Self {
        let states = field
            .particles
            .iter()
            .map(|p| ParticleState {
                position: p.anchor,
                velocity: Vec3::ZERO,
                color: p.color,
                color_velocity: Vec3::ZERO,
            })
            .collect();
        let buffer = InstanceBuffer::with_len(field.len());
        Self {
            field,
            states,
            buffer,
        }
    }

    pub fn field(&self) -> &Rc<ParticleField> {
        &self.field
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn position(&self, i: usize) -> Vec3 {
        self.states[i].position
    }

    pub fn color(&self, i: usize) -> Vec3 {
        self.states[i].color
    }

    pub fn buffer(&self) -> &InstanceBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut InstanceBuffer {
        &mut self.buffer
    }

    /// One frame. `speed` scales elapsed time for drift, pulse and spin.
    pub fn advance(&mut self, frame: &FrameInput, repulsion: Repulsion, speed: f32) {
        let t = frame.elapsed * speed;
        let field = Rc::clone(&self.field);

        for (i, (p, st)) in field.particles.iter().zip(self.states.iter_mut()).enumerate() {
            let ambient = ambient_target(p, t);
            let dist = ambient.distance(frame.cursor);
            let hovered = frame.pointer_over && dist < repulsion.displacement;

            let target = if hovered {
                let dir = (ambient - frame.cursor).normalize_or_zero();
                let pulse = 1.0 + (t * 3.0 + i as f32).sin();
                ambient + dir * ((repulsion.displacement - dist) * repulsion.intensity + pulse / 4.0)
            } else {
                ambient
            };
            damp3(
                &mut st.position,
                &mut st.velocity,
                target,
                POSITION_SMOOTH_TIME,
                frame.dt,
            );

            let spin = Quat::from_euler(
                EulerRot::XYZ,
                t * SPIN_RATE + p.seeds.x,
                t * SPIN_RATE + p.seeds.y,
                0.0,
            );
            self.buffer.transforms[i] = Mat4::from_rotation_translation(spin, st.position);

            let color_target = if hovered { HIGHLIGHT } else { p.color };
            damp_color(
                &mut st.color,
                &mut st.color_velocity,
                color_target,
                COLOR_SMOOTH_TIME,
                frame.dt,
            );
            self.buffer.colors[i] = st.color;
        }

        self.buffer.transforms_dirty = true;
        self.buffer.colors_dirty = true;
    }
}
