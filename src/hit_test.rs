//! Pointer picking against an emblem.

use crate::animator::CURSOR_SENTINEL;
use crate::field::ParticleField;
use glam::{Mat4, Vec2, Vec3};

/// Hit box size relative to the field extents (per half axis).
pub const HIT_BOX_SCALE: f32 = 1.2;
/// Hits farther than this fraction of the field size from its center get
/// pulled back in.
pub const CLAMP_RADIUS: f32 = 0.7;
/// Where a clamped hit ends up, as a fraction of the clamp radius.
pub const CLAMP_PULLBACK: f32 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn looking_at_origin(distance: f32, fov_y: f32, aspect: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, distance),
            target: Vec3::ZERO,
            fov_y,
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect.max(1e-3), self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Ray through normalized device coordinates (`[-1, 1]`, y up).
    pub fn ray(&self, ndc: Vec2) -> Ray {
        let inv = self.view_projection().inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray {
            origin: near,
            dir: (far - near).normalize_or_zero(),
        }
    }

    /// World point to `(ndc.x, ndc.y, depth)`; `None` behind the camera.
    pub fn project(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Box with the given half extents, placed in the world by `model`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitVolume {
    pub model: Mat4,
    pub half_extents: Vec3,
}

impl HitVolume {
    /// The generous pick box around a particle field.
    pub fn around(field: &ParticleField, group: Mat4) -> Self {
        Self {
            model: group,
            half_extents: Vec3::new(
                field.box_size * HIT_BOX_SCALE,
                field.box_size * HIT_BOX_SCALE,
                field.half_depth * HIT_BOX_SCALE,
            ),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.model.transform_point3(Vec3::ZERO)
    }

    /// First point where `ray` enters the box, in world space.
    ///
    /// A ray starting inside the box does not count as a hit.
    pub fn intersect(&self, ray: &Ray) -> Option<Vec3> {
        let inv = self.model.inverse();
        let o = inv.transform_point3(ray.origin);
        // not normalized, so `t` stays in world units
        let d = inv.transform_vector3(ray.dir);
        let t = slab(o, d, self.half_extents)?;
        Some(ray.at(t))
    }
}

fn slab(o: Vec3, d: Vec3, half: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let (o, d, h) = (o[axis], d[axis], half[axis]);
        if d.abs() < 1e-8 {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let a = (-h - o) / d;
        let b = (h - o) / d;
        t_min = t_min.max(a.min(b));
        t_max = t_max.min(a.max(b));
    }
    if t_max < t_min || t_min < 0.0 {
        None
    } else {
        Some(t_min)
    }
}

/// Fires once per hover transition, never per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct HoverTracker {
    hovered: bool,
}

impl HoverTracker {
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn update(&mut self, over: bool) -> Option<bool> {
        if over == self.hovered {
            return None;
        }
        self.hovered = over;
        Some(over)
    }

    pub fn force_leave(&mut self) -> Option<bool> {
        self.update(false)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pick {
    pub over: bool,
    /// Cursor in field-local space, or the sentinel on a miss.
    pub cursor: Vec3,
}

impl Pick {
    pub const MISS: Pick = Pick {
        over: false,
        cursor: CURSOR_SENTINEL,
    };
}

/// Casts `ray` against the field placed by `group`.
///
/// `group` is the emblem transform (scale and rotation); the particles sit
/// inside it shifted by `-z_center` along z.
pub fn pick(field: &ParticleField, group: Mat4, ray: &Ray) -> Pick {
    let volume = HitVolume::around(field, group);
    let Some(mut point) = volume.intersect(ray) else {
        return Pick::MISS;
    };

    let center = volume.center();
    let max_dist = field.box_size.max(field.half_depth) * CLAMP_RADIUS;
    if point.distance(center) > max_dist {
        let dir = (point - center).normalize_or_zero();
        point = center + dir * max_dist * CLAMP_PULLBACK;
    }

    let particles = group * Mat4::from_translation(Vec3::new(0.0, 0.0, -field.z_center));
    Pick {
        over: true,
        cursor: particles.inverse().transform_point3(point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{EulerRot, Quat};

    fn field() -> ParticleField {
        ParticleField {
            particles: Vec::new(),
            resolution: 60,
            gap: 0.45,
            box_size: 27.0,
            half_depth: 13.5,
            z_center: 6.75,
        }
    }

    fn camera() -> Camera {
        Camera::looking_at_origin(50.0, 35.0, 1.0)
    }

    #[test]
    fn center_ray_points_down_the_axis() {
        let ray = camera().ray(Vec2::ZERO);
        assert!((ray.dir - Vec3::NEG_Z).length() < 1e-4);
        assert!(ray.origin.x.abs() < 1e-4 && ray.origin.y.abs() < 1e-4);
    }

    #[test]
    fn project_inverts_ray() {
        let cam = camera();
        let p = Vec3::new(3.0, -2.0, 1.0);
        let ndc = cam.project(p).unwrap();
        let ray = cam.ray(ndc.truncate());
        let closest = ray.at((p - ray.origin).dot(ray.dir));
        assert!(closest.distance(p) < 1e-2);
    }

    #[test]
    fn box_entry_point_faces_the_camera() {
        let vol = HitVolume::around(&field(), Mat4::IDENTITY);
        let hit = vol.intersect(&camera().ray(Vec2::ZERO)).unwrap();
        assert!((hit.z - 13.5 * HIT_BOX_SCALE).abs() < 1e-3);
    }

    #[test]
    fn misses_outside_the_box() {
        let vol = HitVolume::around(&field(), Mat4::IDENTITY);
        let ray = Ray {
            origin: Vec3::new(100.0, 0.0, 50.0),
            dir: Vec3::NEG_Z,
        };
        assert!(vol.intersect(&ray).is_none());
        // pointing away
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 50.0),
            dir: Vec3::Z,
        };
        assert!(vol.intersect(&ray).is_none());
    }

    #[test]
    fn rotated_box_is_still_hit() {
        let group = Mat4::from_quat(Quat::from_euler(EulerRot::XYZ, 0.4, 1.2, 0.0));
        let vol = HitVolume::around(&field(), group);
        assert!(vol.intersect(&camera().ray(Vec2::new(0.3, -0.2))).is_some());
    }

    #[test]
    fn miss_uses_the_sentinel() {
        let ray = Ray {
            origin: Vec3::new(500.0, 500.0, 50.0),
            dir: Vec3::NEG_Z,
        };
        assert_eq!(pick(&field(), Mat4::IDENTITY, &ray), Pick::MISS);
    }

    #[test]
    fn far_hits_are_pulled_in() {
        let f = field();
        // enters the front face near a corner
        let ray = Ray {
            origin: Vec3::new(30.0, 30.0, 50.0),
            dir: Vec3::NEG_Z,
        };
        let p = pick(&f, Mat4::IDENTITY, &ray);
        assert!(p.over);
        let world = p.cursor + Vec3::new(0.0, 0.0, -f.z_center);
        let expected = f.box_size * CLAMP_RADIUS * CLAMP_PULLBACK;
        assert!((world.length() - expected).abs() < 1e-3);
    }

    #[test]
    fn near_hits_map_into_particle_space() {
        let f = field();
        let ray = Ray {
            origin: Vec3::new(1.0, 2.0, 50.0),
            dir: Vec3::NEG_Z,
        };
        let p = pick(&f, Mat4::IDENTITY, &ray);
        // entry at z = 16.2, shifted by z_center into particle space
        assert!(p.cursor.distance(Vec3::new(1.0, 2.0, 16.2 + f.z_center)) < 1e-3);
    }

    #[test]
    fn scaled_group_scales_the_cursor() {
        let f = field();
        let ray = Ray {
            origin: Vec3::new(2.0, 0.0, 50.0),
            dir: Vec3::NEG_Z,
        };
        let group = Mat4::from_scale(Vec3::splat(0.5));
        let p = pick(&f, group, &ray);
        assert!((p.cursor.x - 4.0).abs() < 1e-3);
    }

    #[test]
    fn hover_fires_once_per_transition() {
        let mut h = HoverTracker::default();
        assert_eq!(h.update(false), None);
        assert_eq!(h.update(true), Some(true));
        assert_eq!(h.update(true), None);
        assert_eq!(h.force_leave(), Some(false));
        assert_eq!(h.force_leave(), None);
        assert!(!h.is_hovered());
    }
}
