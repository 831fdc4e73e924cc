//! Particle field construction from a classified pixel grid.

use crate::glyph::{rasterize, Glyph, PixelGrid};
use crate::zone::Classifier;
use glam::Vec3;
use rand::Rng;
use std::rc::Rc;

/// Number of lattice layers, counted from the viewer side, that get particles.
pub const DEPTH_LAYERS: u32 = 30;

/// Upper bound (exclusive) of the per-axis animation seeds.
pub const SEED_RANGE: f32 = 100.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Rest position in field-local space.
    pub anchor: Vec3,
    pub color: Vec3,
    /// Drift phase offsets, one per axis.
    pub seeds: Vec3,
    /// Drift frequency multiplier in `[0.4, 1.0)`.
    pub speed_factor: f32,
    /// Glyph detail: drifts less.
    pub high_detail: bool,
}

#[derive(Clone, Debug)]
pub struct ParticleField {
    pub particles: Vec<Particle>,
    pub resolution: u32,
    pub gap: f32,
    /// Edge length of the full lattice.
    pub box_size: f32,
    pub half_depth: f32,
    /// Midpoint of the occupied depth layers; the field is shifted by
    /// `-z_center` so it rotates about its own middle.
    pub z_center: f32,
}

impl ParticleField {
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

fn jitter(rng: &mut impl Rng, amount: f32) -> f32 {
    if amount == 0.0 {
        0.0
    } else {
        rng.gen::<f32>() * amount - amount / 2.0
    }
}

/// Emits particles for every non-background pixel of `grid`.
pub fn build_field(
    grid: &PixelGrid,
    classifier: Classifier,
    gap: f32,
    depth_layers: u32,
    rng: &mut impl Rng,
) -> ParticleField {
    let res = grid.size();
    let center = (res as f32 * gap) / 2.0 - gap / 2.0;
    let z_start = res.saturating_sub(depth_layers);

    let mut particles = Vec::new();

    for x in 0..res {
        for y in 0..res {
            // lattice y grows upward, canvas y grows downward
            let canvas_y = res - 1 - y;
            let zone = classifier.classify(grid, x, canvas_y);
            let Some(style) = classifier.style(zone) else {
                continue;
            };

            for z in z_start..res {
                if rng.gen::<f32>() > style.keep_rate {
                    continue;
                }
                for _ in 0..style.multiplier {
                    let anchor = Vec3::new(
                        x as f32 * gap - center + jitter(rng, style.jitter),
                        y as f32 * gap - center + jitter(rng, style.jitter),
                        z as f32 * gap - center + jitter(rng, style.jitter),
                    );
                    particles.push(Particle {
                        anchor,
                        color: style.color,
                        seeds: Vec3::new(
                            rng.gen::<f32>() * SEED_RANGE,
                            rng.gen::<f32>() * SEED_RANGE,
                            rng.gen::<f32>() * SEED_RANGE,
                        ),
                        speed_factor: 0.4 + rng.gen::<f32>() * 0.6,
                        high_detail: style.high_detail,
                    });
                }
            }
        }
    }

    let box_size = res as f32 * gap;
    let z_min = z_start as f32 * gap - center;
    let z_max = res.saturating_sub(1) as f32 * gap - center;

    ParticleField {
        particles,
        resolution: res,
        gap,
        box_size,
        half_depth: box_size / 2.0,
        z_center: (z_min + z_max) / 2.0,
    }
}

/// Glyph + classification scheme for one kind of emblem.
#[derive(Clone, Debug)]
pub struct FieldBuilder {
    pub glyph: Glyph,
    pub classifier: Classifier,
    pub depth_layers: u32,
}

impl FieldBuilder {
    pub fn new(glyph: Glyph, classifier: Classifier) -> Self {
        Self {
            glyph,
            classifier,
            depth_layers: DEPTH_LAYERS,
        }
    }

    pub fn github() -> Self {
        Self::new(Glyph::octocat(), Classifier::RingedMark)
    }

    pub fn linkedin() -> Self {
        Self::new(Glyph::linkedin_badge(), Classifier::Badge)
    }

    pub fn build(&self, resolution: u32, gap: f32, rng: &mut impl Rng) -> ParticleField {
        let grid = rasterize(resolution, &self.glyph);
        let field = build_field(&grid, self.classifier, gap, self.depth_layers, rng);
        log::debug!(
            "built {} particles (resolution {resolution}, gap {gap})",
            field.len()
        );
        field
    }
}

/// Memoizes the last built field on `(resolution, gap)`.
#[derive(Default)]
pub struct FieldCache {
    key: Option<(u32, u32)>,
    field: Option<Rc<ParticleField>>,
    builds: usize,
}

impl FieldCache {
    pub fn get_or_build(
        &mut self,
        builder: &FieldBuilder,
        resolution: u32,
        gap: f32,
        rng: &mut impl Rng,
    ) -> Rc<ParticleField> {
        let key = (resolution, gap.to_bits());
        if self.key == Some(key) {
            if let Some(field) = &self.field {
                log::trace!("field cache hit ({resolution}, {gap})");
                return Rc::clone(field);
            }
        }
        let field = Rc::new(builder.build(resolution, gap, rng));
        self.key = Some(key);
        self.field = Some(Rc::clone(&field));
        self.builds += 1;
        field
    }

    /// Forces the next lookup to rebuild.
    pub fn invalidate(&mut self) {
        self.key = None;
        self.field = None;
    }

    pub fn builds(&self) -> usize {
        self.builds
    }
}
