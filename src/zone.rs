//! Pixel zone classification. The thresholds and keep-rates are hand-tuned.

use crate::glyph::{PixelGrid, Rgba, LINKEDIN_BLUE};
use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Zone {
    Background,
    Ring,
    /// Glyph detail (letterforms, the mark itself).
    GlyphFill,
    /// Solid filler around the glyph.
    PlainFill,
}

/// How a zone turns into particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneStyle {
    pub color: Vec3,
    /// Probability that a voxel in this zone spawns anything.
    pub keep_rate: f32,
    /// Full width of the uniform per-axis jitter.
    pub jitter: f32,
    /// Particles emitted per kept voxel.
    pub multiplier: u32,
    pub high_detail: bool,
}

/// Which classification scheme an emblem uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Classifier {
    /// Thin light ring around a dark field with a light mark inside.
    RingedMark,
    /// Light disc with a colored mark; everything else is background.
    Badge,
    /// Any lit pixel is plain fill with the given keep-rate.
    Uniform { keep_rate: f32 },
}

/// Minimum 8-bit channel value that counts as lit.
pub const CHANNEL_THRESHOLD: u8 = 100;
pub const RED_THRESHOLD: u8 = CHANNEL_THRESHOLD;
pub const BLUE_THRESHOLD: u8 = CHANNEL_THRESHOLD;

/// Outer ring radius as a divisor of the resolution.
pub const RING_OUTER_DIV: f32 = 2.2;
/// Inner ring radius as a divisor of the resolution.
pub const RING_INNER_DIV: f32 = 2.25;

pub const LIGHT_GREY: Vec3 = Vec3::new(0.878 * 1.2, 0.878 * 1.2, 0.878 * 1.2);
pub const DARK_GREY: Vec3 = Vec3::new(0.125 * 1.2, 0.125 * 1.2, 0.125 * 1.2);
pub const BOOSTED_WHITE: Vec3 = Vec3::new(1.5, 1.5, 1.5);

const DEFAULT_JITTER: f32 = 0.5;

pub fn boosted(c: Rgba, gain: f32) -> Vec3 {
    Vec3::new(c.r as f32, c.g as f32, c.b as f32) / 255.0 * gain
}

impl Classifier {
    /// Zone of pixel `(x, canvas_y)`; `canvas_y` counts from the top.
    pub fn classify(&self, grid: &PixelGrid, x: u32, canvas_y: u32) -> Zone {
        let p = grid.get(x, canvas_y);
        match self {
            Classifier::RingedMark => {
                let res = grid.size() as f32;
                let c = res / 2.0;
                let dx = x as f32 - c;
                let dy = canvas_y as f32 - c;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > res / RING_OUTER_DIV {
                    Zone::Background
                } else if dist > res / RING_INNER_DIV {
                    Zone::Ring
                } else if p.r > RED_THRESHOLD {
                    Zone::GlyphFill
                } else {
                    Zone::PlainFill
                }
            }
            Classifier::Badge => {
                if p.r > RED_THRESHOLD {
                    Zone::PlainFill
                } else if p.b > BLUE_THRESHOLD {
                    Zone::GlyphFill
                } else {
                    Zone::Background
                }
            }
            Classifier::Uniform { .. } => {
                if [p.r, p.g, p.b].iter().any(|&c| c > CHANNEL_THRESHOLD) {
                    Zone::PlainFill
                } else {
                    Zone::Background
                }
            }
        }
    }

    /// Particle style for a zone; `None` for zones that never spawn.
    pub fn style(&self, zone: Zone) -> Option<ZoneStyle> {
        let plain = |color, keep_rate| ZoneStyle {
            color,
            keep_rate,
            jitter: DEFAULT_JITTER,
            multiplier: 1,
            high_detail: false,
        };
        match (self, zone) {
            (_, Zone::Background) => None,
            (Classifier::RingedMark, Zone::Ring) => Some(plain(LIGHT_GREY, 0.25)),
            (Classifier::RingedMark, Zone::PlainFill) => Some(plain(DARK_GREY, 0.25)),
            (Classifier::RingedMark, Zone::GlyphFill) => Some(ZoneStyle {
                color: LIGHT_GREY,
                keep_rate: 0.25,
                jitter: 0.0,
                multiplier: 1,
                high_detail: true,
            }),
            (Classifier::Badge, Zone::PlainFill) => Some(plain(BOOSTED_WHITE, 0.12)),
            (Classifier::Badge, Zone::GlyphFill) => Some(ZoneStyle {
                color: boosted(LINKEDIN_BLUE, 1.5),
                keep_rate: 1.0,
                jitter: 0.0,
                multiplier: 2,
                high_detail: true,
            }),
            (Classifier::Badge, Zone::Ring) => None,
            (Classifier::Uniform { keep_rate }, Zone::PlainFill) => {
                Some(plain(BOOSTED_WHITE, *keep_rate))
            }
            (Classifier::Uniform { .. }, _) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{rasterize, Glyph};

    #[test]
    fn ringed_mark_zones_by_radius() {
        let grid = PixelGrid::filled(90, Rgba::BLACK);
        let cls = Classifier::RingedMark;
        // corner is far outside the ring
        assert_eq!(cls.classify(&grid, 0, 0), Zone::Background);
        // ring band is 90/2.25 = 40 < d <= 90/2.2 = 40.9
        assert_eq!(cls.classify(&grid, 45 + 41, 45), Zone::Background);
        assert_eq!(cls.classify(&grid, 45 + 40, 45 + 5), Zone::Ring);
        assert_eq!(cls.classify(&grid, 45 + 40, 45), Zone::PlainFill);
        assert_eq!(cls.classify(&grid, 45, 45), Zone::PlainFill);
    }

    #[test]
    fn ringed_mark_lit_pixels_are_glyph() {
        let grid = PixelGrid::filled(90, Rgba::WHITE);
        assert_eq!(
            Classifier::RingedMark.classify(&grid, 45, 45),
            Zone::GlyphFill
        );
    }

    #[test]
    fn badge_splits_white_and_blue() {
        let grid = rasterize(60, &Glyph::linkedin_badge());
        let cls = Classifier::Badge;
        assert_eq!(cls.classify(&grid, 0, 0), Zone::Background);
        assert_eq!(cls.classify(&grid, 30, 8), Zone::PlainFill);

        let blue = PixelGrid::filled(4, LINKEDIN_BLUE);
        assert_eq!(cls.classify(&blue, 1, 1), Zone::GlyphFill);
    }

    #[test]
    fn uniform_lights_up_on_any_channel() {
        let cls = Classifier::Uniform { keep_rate: 0.5 };
        let green = PixelGrid::filled(2, Rgba::rgb(0, CHANNEL_THRESHOLD + 1, 0));
        assert_eq!(cls.classify(&green, 0, 0), Zone::PlainFill);
        let dim = PixelGrid::filled(2, Rgba::rgb(CHANNEL_THRESHOLD, CHANNEL_THRESHOLD, CHANNEL_THRESHOLD));
        assert_eq!(cls.classify(&dim, 0, 0), Zone::Background);
    }

    #[test]
    fn background_never_has_a_style() {
        for cls in [
            Classifier::RingedMark,
            Classifier::Badge,
            Classifier::Uniform { keep_rate: 1.0 },
        ] {
            assert!(cls.style(Zone::Background).is_none());
        }
    }

    #[test]
    fn detail_zones_are_sharp() {
        let s = Classifier::RingedMark.style(Zone::GlyphFill).unwrap();
        assert_eq!(s.jitter, 0.0);
        assert!(s.high_detail);
        let s = Classifier::Badge.style(Zone::GlyphFill).unwrap();
        assert_eq!(s.multiplier, 2);
        assert_eq!(s.keep_rate, 1.0);
    }
}
