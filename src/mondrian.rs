//! Mondrian block composition.

use crate::damp::{damp, damp3, damp_euler};
use crate::glyph::Rgba;
use crate::hit_test::{HitVolume, Ray};
use crate::zone::boosted;
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use rand::Rng;

pub const LINE_THICK: f32 = 0.3;
/// Uniform scale of the whole composition.
pub const COMPOSITION_SCALE: f32 = 4.0;

pub const RED: Rgba = Rgba::rgb(0xC6, 0x26, 0x20);
pub const YELLOW: Rgba = Rgba::rgb(0xF0, 0xC6, 0x2D);
pub const BLUE: Rgba = Rgba::rgb(0x20, 0x46, 0x86);
pub const BLACK: Rgba = Rgba::rgb(0x11, 0x11, 0x11);
pub const DARK_GRAY: Rgba = Rgba::rgb(0x33, 0x33, 0x33);
pub const GREEN: Rgba = Rgba::rgb(0x00, 0x66, 0x00);
pub const GRAY: Rgba = Rgba::rgb(0xD9, 0xD9, 0xD9);
pub const WHITE: Rgba = Rgba::rgb(0xFF, 0xFF, 0xFF);

const GRID_DEPTH: f32 = 0.4;
const GRID_NOISE: f32 = 0.25;

const POSITION_SMOOTH_TIME: f32 = 0.3;
const ROTATION_SMOOTH_TIME: f32 = 0.2;
const SCALE_SMOOTH_TIME: f32 = 0.1;

const HOVER_TILT: f32 = 0.5;
const IDLE_TILT: f32 = 0.1;
const HOVER_SCALE: f32 = 1.05;
const HOVER_BRIGHTNESS: f32 = 1.3;
const IDLE_BRIGHTNESS: f32 = 0.65;

/// Slab centered at `(x, y)` with size `w x h x depth`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Block {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub color: Rgba,
    pub depth: f32,
}

const fn block(x: f32, y: f32, w: f32, h: f32, color: Rgba, depth: f32) -> Block {
    Block {
        x,
        y,
        w,
        h,
        color,
        depth,
    }
}

pub const BLOCKS: [Block; 22] = [
    // color planes
    block(-1.8, 1.8, 5.0, 5.0, RED, 2.5),
    block(3.2, 3.25, 2.8, 3.5, YELLOW, 1.2),
    block(-4.3, -4.1, 1.4, 1.8, YELLOW, 1.2),
    block(3.2, -4.1, 2.8, 1.8, BLUE, 1.2),
    block(-3.05, -1.6, 2.5, 1.8, GREEN, 1.2),
    block(-0.55, -1.6, 2.5, 1.8, GRAY, 1.2),
    block(4.6, -4.1, 0.8, 1.8, RED, 1.2),
    // white sections
    block(-4.3, 4.3, 1.4, 1.4, WHITE, 0.8),
    block(-1.8, 4.3, 5.0, 1.4, WHITE, 0.8),
    block(3.2, 4.3, 1.0, 1.4, WHITE, 0.8),
    block(-4.3, 0.9, 1.4, 2.5, WHITE, 0.8),
    block(3.2, -0.7, 2.8, 3.4, WHITE, 0.8),
    block(-0.55, -3.2, 3.75, 0.9, WHITE, 0.8),
    block(4.6, -0.7, 0.8, 3.4, WHITE, 0.8),
    // vertical lines
    block(-4.3, 0.9, LINE_THICK, 8.2, DARK_GRAY, GRID_DEPTH),
    block(0.7, 0.0, LINE_THICK, 10.0, DARK_GRAY, GRID_DEPTH),
    block(4.2, 0.0, LINE_THICK, 10.0, DARK_GRAY, GRID_DEPTH),
    block(-1.8, -1.6, LINE_THICK, 1.8, DARK_GRAY, GRID_DEPTH),
    // horizontal lines
    block(-0.4, 4.3, 9.2, LINE_THICK, DARK_GRAY, GRID_DEPTH),
    block(-0.4, -0.7, 9.2, LINE_THICK, DARK_GRAY, GRID_DEPTH),
    block(0.0, -3.2, 10.0, LINE_THICK, DARK_GRAY, GRID_DEPTH),
    block(-4.3, -0.7, 1.4, LINE_THICK, DARK_GRAY, GRID_DEPTH),
];

impl Block {
    pub fn is_grid_line(&self) -> bool {
        self.color == DARK_GRAY && self.depth == GRID_DEPTH
    }

    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.w, self.h, self.depth) / 2.0
    }
}

#[derive(Clone, Debug)]
pub struct BlockState {
    pub block: Block,
    seed: f32,
    noise: Vec3,
    position: Vec3,
    velocity: Vec3,
    rotation: Vec3,
    spin: Vec3,
    scale: f32,
    scale_velocity: f32,
    brightness: f32,
    hovered: bool,
}

impl BlockState {
    fn new(block: Block, seed: f32, rng: &mut impl Rng) -> Self {
        Self {
            block,
            seed,
            noise: Vec3::new(
                rng.gen::<f32>() * 100.0,
                rng.gen::<f32>() * 100.0,
                rng.gen::<f32>() * 100.0,
            ),
            position: Vec3::new(block.x, block.y, 0.0),
            velocity: Vec3::ZERO,
            rotation: Vec3::ZERO,
            spin: Vec3::ZERO,
            scale: 1.0,
            scale_velocity: 0.0,
            brightness: IDLE_BRIGHTNESS,
            hovered: false,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Euler angles (XYZ order).
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Block transform inside the composition group.
    pub fn local_transform(&self) -> Mat4 {
        let q = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), q, self.position)
    }

    /// Base color lit by the current brightness.
    pub fn shade(&self) -> Vec3 {
        boosted(self.block.color, self.brightness.max(0.0))
    }

    fn advance(&mut self, t: f32, dt: f32, pointer: Vec2) {
        let m = if self.block.is_grid_line() { GRID_NOISE } else { 1.0 };
        let n = Vec3::new(
            (t * 0.3 + self.noise.x).sin() * 0.08 * m,
            (t * 0.4 + self.noise.y).cos() * 0.08 * m,
            (t * 0.25 + self.noise.z).sin() * 0.05 * m,
        );
        let base = Vec3::new(self.block.x, self.block.y, 0.0);
        damp3(&mut self.position, &mut self.velocity, base + n, POSITION_SMOOTH_TIME, dt);

        let tilt = if self.hovered { HOVER_TILT } else { IDLE_TILT };
        let target = Vec3::new(
            -pointer.y * tilt + n.x * 0.3,
            pointer.x * tilt + n.y * 0.3,
            n.z * 0.2,
        );
        damp_euler(&mut self.rotation, &mut self.spin, target, ROTATION_SMOOTH_TIME, dt);

        let scale = if self.hovered { HOVER_SCALE } else { 1.0 };
        damp(&mut self.scale, &mut self.scale_velocity, scale, SCALE_SMOOTH_TIME, dt);

        self.brightness = if self.hovered {
            HOVER_BRIGHTNESS
        } else {
            IDLE_BRIGHTNESS + (t * 2.0 + self.seed).sin() * 0.05
        };
    }
}

pub struct Mondrian {
    blocks: Vec<BlockState>,
    pointer: Vec2,
    elapsed: f32,
}

impl Mondrian {
    pub fn new(rng: &mut impl Rng) -> Self {
        let blocks = BLOCKS
            .iter()
            .enumerate()
            .map(|(i, b)| BlockState::new(*b, i as f32 * 0.1, rng))
            .collect();
        Self {
            blocks,
            pointer: Vec2::ZERO,
            elapsed: 0.0,
        }
    }

    pub fn blocks(&self) -> &[BlockState] {
        &self.blocks
    }

    pub fn group_transform(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(COMPOSITION_SCALE))
    }

    /// World transform of block `i`.
    pub fn block_transform(&self, i: usize) -> Mat4 {
        self.group_transform() * self.blocks[i].local_transform()
    }

    pub fn any_hovered(&self) -> bool {
        self.blocks.iter().any(|b| b.hovered)
    }

    /// One frame. `pointer` is the last known pointer in NDC and `ray` the
    /// pick ray through it; both `None` while the pointer is elsewhere.
    pub fn frame(&mut self, dt: f32, pointer: Option<Vec2>, ray: Option<&Ray>) {
        self.elapsed += dt;
        if let Some(p) = pointer {
            self.pointer = p;
        }

        // every block under the pointer counts, not only the front one
        let group = self.group_transform();
        for b in &mut self.blocks {
            let hit = ray.is_some_and(|ray| {
                let volume = HitVolume {
                    model: group * b.local_transform(),
                    half_extents: b.block.half_extents(),
                };
                volume.intersect(ray).is_some()
            });
            if hit != b.hovered {
                log::trace!("mondrian block at ({}, {}) hover {hit}", b.block.x, b.block.y);
            }
            b.hovered = hit;
        }

        let t = self.elapsed;
        let pointer = self.pointer;
        for b in &mut self.blocks {
            b.advance(t, dt, pointer);
        }
    }
}
