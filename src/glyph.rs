//! Off-screen rasterization of brand marks.
//!
//! A [`Glyph`] is drawn onto a square [`PixelGrid`] in a tiny palette, the
//! same way a 2D canvas would be used: black background, an optional filled
//! disc, then a vector mark filled (and optionally stroked) on top. No
//! antialiasing: every pixel center is either inside a shape or not.

use crate::error::EmblemError;
use kurbo::{BezPath, ParamCurveNearest, Point, Rect, Shape};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Square RGBA buffer, row-major, `y = 0` at the top (canvas orientation).
#[derive(Clone, Debug, PartialEq)]
pub struct PixelGrid {
    size: u32,
    px: Vec<Rgba>,
}

impl PixelGrid {
    pub fn filled(size: u32, color: Rgba) -> Self {
        Self {
            size,
            px: vec![color; (size as usize) * (size as usize)],
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.size as usize) + (x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> Rgba {
        self.px[self.idx(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, c: Rgba) {
        if x < self.size && y < self.size {
            let i = self.idx(x, y);
            self.px[i] = c;
        }
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.px
    }
}

/// Filled circle centered on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct Disc {
    /// Radius as a fraction of the canvas side.
    pub radius: f64,
    pub color: Rgba,
}

/// Vector mark given as SVG path data inside a square view box.
#[derive(Clone, Debug, PartialEq)]
pub struct Mark {
    pub path: String,
    /// Side of the square the path coordinates live in.
    pub view_box: f64,
    /// Fraction of the canvas side the view box is scaled to.
    pub fit: f64,
    /// Extra offset of the view box, as a fraction of the canvas side.
    pub offset: (f64, f64),
    /// Stroke width in path units; 0 disables stroking.
    pub stroke_width: f64,
    pub color: Rgba,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Glyph {
    pub disc: Option<Disc>,
    pub mark: Option<Mark>,
}

/// Simplified octocat silhouette (24x24 view box).
pub const OCTOCAT_PATH: &str = "M12 .297c-6.63 0-12 5.373-12 12 0 5.303 3.438 9.8 8.205 11.385.6.113.82-.258.82-.577 0-.285-.01-1.04-.015-2.04-3.338.724-4.8-1.61-4.8-1.61C3.5 18.07 2.8 17.7 2.8 17.7c-1.087-.744.084-.729.084-.729 1.205.084 1.838 1.236 1.838 1.236 1.07 1.835 2.809 1.305 3.495.998.108-.776.417-1.305.76-1.605-2.665-.3-5.466-1.332-5.466-5.93 0-1.31.465-2.38 1.235-3.22-.135-.303-.54-1.523.105-3.176 0 0 1.005-.322 3.3 1.23.96-.267 1.98-.399 3-.405 1.02.006 2.04.138 3 .405 2.28-1.552 3.285-1.23 3.285-1.23.645 1.653.24 2.873.12 3.176.765.84 1.23 1.91 1.23 3.22 0 4.61-2.805 5.625-5.475 5.92.42.36.81 1.096.81 2.22 0 1.606-.015 2.896-.015 3.286 0 .315.21.69.825.57C20.565 22.092 24 17.592 24 12.297c0-6.627-5.373-12-12-12";

/// Bold lowercase "in" letterforms (24x24 view box).
pub const IN_LETTERS_PATH: &str = "M9.1 6.3C9.1 7.184 8.384 7.9 7.5 7.9C6.616 7.9 5.9 7.184 5.9 6.3C5.9 5.416 6.616 4.7 7.5 4.7C8.384 4.7 9.1 5.416 9.1 6.3Z M6.1 9H8.9V19H6.1Z M10.6 9H13.2V10.4C13.8 9.4 15 8.8 16.3 8.8C18.3 8.8 19.3 10 19.3 12.3V19H16.5V12.9C16.5 11.7 16 11.1 15 11.1C13.9 11.1 13.3 11.9 13.3 13.1V19H10.6Z";

pub const LINKEDIN_BLUE: Rgba = Rgba::rgb(0x00, 0x77, 0xb5);

impl Glyph {
    /// White octocat mark at half the canvas, filled and stroked. The cat
    /// itself is negative space inside the disc.
    pub fn octocat() -> Self {
        Self {
            disc: None,
            mark: Some(Mark {
                path: OCTOCAT_PATH.to_string(),
                view_box: 24.0,
                fit: 0.5,
                offset: (0.0, 0.0),
                stroke_width: 0.6,
                color: Rgba::WHITE,
            }),
        }
    }

    /// White disc with blue "in" letters, nudged down like centered text.
    pub fn linkedin_badge() -> Self {
        Self {
            disc: Some(Disc {
                radius: 1.0 / 2.5,
                color: Rgba::WHITE,
            }),
            mark: Some(Mark {
                path: IN_LETTERS_PATH.to_string(),
                view_box: 24.0,
                fit: 0.8,
                offset: (0.0, 0.05),
                stroke_width: 0.0,
                color: LINKEDIN_BLUE,
            }),
        }
    }
}

/// Rasterizes `glyph` onto a `resolution`x`resolution` grid.
///
/// A mark whose path data cannot be parsed yields an all-background grid.
pub fn rasterize(resolution: u32, glyph: &Glyph) -> PixelGrid {
    let mut grid = PixelGrid::filled(resolution, Rgba::BLACK);

    let mark = match glyph.mark.as_ref().map(prepare_mark).transpose() {
        Ok(m) => m,
        Err(err) => {
            log::warn!("{err}; rendering empty glyph");
            return grid;
        }
    };

    let r = resolution as f64;
    let c = r / 2.0;

    for y in 0..resolution {
        for x in 0..resolution {
            let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);

            if let Some(disc) = &glyph.disc {
                let rad = disc.radius * r;
                if (p - Point::new(c, c)).hypot2() <= rad * rad {
                    grid.set(x, y, disc.color);
                }
            }

            if let Some((m, path, bounds)) = &mark {
                let scale = r * m.fit / m.view_box;
                let margin = (r - m.view_box * scale) / 2.0;
                let local = Point::new(
                    (p.x - margin - m.offset.0 * r) / scale,
                    (p.y - margin - m.offset.1 * r) / scale,
                );
                if bounds.contains(local) && covers(path, local, m.stroke_width) {
                    grid.set(x, y, m.color);
                }
            }
        }
    }

    grid
}

fn prepare_mark(m: &Mark) -> Result<(&Mark, BezPath, Rect), EmblemError> {
    if m.path.trim().is_empty() {
        return Err(EmblemError::GlyphPath("empty path data".to_string()));
    }
    let path = BezPath::from_svg(&m.path).map_err(|e| EmblemError::GlyphPath(e.to_string()))?;
    let half = m.stroke_width / 2.0;
    let bounds = path.bounding_box().inflate(half, half);
    Ok((m, path, bounds))
}

fn covers(path: &BezPath, p: Point, stroke_width: f64) -> bool {
    if path.contains(p) {
        return true;
    }
    if stroke_width <= 0.0 {
        return false;
    }
    let half_sq = (stroke_width / 2.0) * (stroke_width / 2.0);
    path.segments()
        .any(|seg| seg.nearest(p, 1e-3).distance_sq <= half_sq)
}
