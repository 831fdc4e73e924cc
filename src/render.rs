use crossterm::{
    cursor,
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use emblem::animator::InstanceBuffer;
use emblem::hit_test::Camera;
use glam::{Mat4, Vec2, Vec3};
use std::io::{self, Write};

/// Bright channels above this spill a halo, scaled by the bloom gain.
const BLOOM_THRESHOLD: f32 = 1.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            c.ch = ' ';
            c.fg = Color::White;
            c.bg = bg;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Pixel {
    /// Linear color (channels may exceed 1.0) to an opaque pixel.
    pub(crate) fn from_shade(c: Vec3) -> Self {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        Self {
            r: q(c.x),
            g: q(c.y),
            b: q(c.z),
            a: 255,
        }
    }
}

/// Braille-resolution canvas with a depth buffer (smaller is nearer).
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
    depth: Vec<f32>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        let n = (w as usize) * (h as usize);
        Self {
            w,
            h,
            px: vec![Pixel::default(); n],
            depth: vec![f32::INFINITY; n],
        }
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn clear(&mut self, p: Pixel) {
        self.px.fill(p);
        self.depth.fill(f32::INFINITY);
    }

    /// Writes `p` if it is nearer than what is already there.
    fn plot(&mut self, x: i32, y: i32, depth: f32, p: Pixel) {
        if x < 0 || y < 0 || x as u32 >= self.w || y as u32 >= self.h {
            return;
        }
        let i = self.idx(x as u32, y as u32);
        if depth < self.depth[i] {
            self.depth[i] = depth;
            self.px[i] = p;
        }
    }

    fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableFocusChange,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        let prev = CellBuffer::new(cols, rows);
        let cur = CellBuffer::new(cols, rows);

        // Braille: 2×4 pixels per cell
        let canvas = PixelCanvas::new(cols as u32 * 2, rows as u32 * 4);

        Ok(Self {
            out,
            cols,
            rows,
            prev,
            cur,
            canvas,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            DisableFocusChange,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        log::debug!("terminal resized to {c}x{r}");
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// Packs the canvas into braille cells, one cell per 2×4 pixel block.
/// Cells are colored with the average of their lit pixels.
pub(crate) fn canvas_to_cells(
    canvas: &PixelCanvas,
    out: &mut CellBuffer,
    enable_color: bool,
    bg: Color,
) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let mut mask: u8 = 0;
            let mut sum = [0u32; 3];
            let mut ink: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let x = cx * 2 + dx;
                    let y = cy * 4 + dy;
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum[0] += p.r as u32;
                        sum[1] += p.g as u32;
                        sum[2] += p.b as u32;
                        ink += 1;
                    }
                }
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');
            let fg = if enable_color && ink > 0 {
                Color::Rgb {
                    r: (sum[0] / ink) as u8,
                    g: (sum[1] / ink) as u8,
                    b: (sum[2] / ink) as u8,
                }
            } else {
                Color::White
            };

            out.set(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

/// Pixel-space rectangle of the canvas a scene is drawn into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) w: i32,
    pub(crate) h: i32,
}

impl Viewport {
    /// Braille cells are twice as tall as wide, so each braille pixel is
    /// square only if the terminal cell is 1:2.
    pub(crate) fn aspect(&self, cell_px: [u16; 2]) -> f32 {
        let px_w = cell_px[0] as f32 / 2.0;
        let px_h = cell_px[1] as f32 / 4.0;
        (self.w as f32 * px_w) / (self.h.max(1) as f32 * px_h)
    }

    pub(crate) fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x as f32
            && p.y >= self.y as f32
            && p.x < (self.x + self.w) as f32
            && p.y < (self.y + self.h) as f32
    }

    /// Canvas pixel to normalized device coordinates (y up).
    pub(crate) fn to_ndc(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            (p.x - self.x as f32) / self.w.max(1) as f32 * 2.0 - 1.0,
            1.0 - (p.y - self.y as f32) / self.h.max(1) as f32 * 2.0,
        )
    }

    fn to_canvas(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            self.x as f32 + (ndc.x + 1.0) * 0.5 * self.w as f32,
            self.y as f32 + (1.0 - ndc.y) * 0.5 * self.h as f32,
        )
    }

    fn clip(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.w && y < self.y + self.h
    }
}

/// Plots every particle of an instance buffer, depth tested.
///
/// `bloom` scales the halo around over-bright particles.
pub(crate) fn draw_particles(
    canvas: &mut PixelCanvas,
    vp: Viewport,
    camera: &Camera,
    model: Mat4,
    instances: &InstanceBuffer,
    bloom: f32,
) {
    for (m, c) in instances.transforms().iter().zip(instances.colors()) {
        let world = model.transform_point3(m.w_axis.truncate());
        let Some(ndc) = camera.project(world) else {
            continue;
        };
        if ndc.z > 1.0 {
            continue;
        }
        let s = vp.to_canvas(ndc.truncate());
        let (x, y) = (s.x as i32, s.y as i32);
        if !vp.clip(x, y) {
            continue;
        }
        canvas.plot(x, y, ndc.z, Pixel::from_shade(*c));

        let excess = c.max_element() - BLOOM_THRESHOLD;
        if excess > 0.0 && bloom > 0.0 {
            let a = (excess * bloom * 255.0 * 8.0).clamp(0.0, 255.0) as u8;
            let glow = Pixel {
                a,
                ..Pixel::from_shade(*c)
            };
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                if vp.clip(x + dx, y + dy) {
                    canvas.blend_over(x + dx, y + dy, glow);
                }
            }
        }
    }
}

/* -----------------------------
   Solid boxes: edge-function triangle fill
------------------------------ */

const LIGHT_DIR: Vec3 = Vec3::new(-0.4, 0.8, 0.8);

fn edge(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Corners (as indices into the 8 box vertices) of each face, wound
/// counter-clockwise seen from outside.
const FACES: [[usize; 4]; 6] = [
    [4, 5, 7, 6], // +z
    [1, 0, 2, 3], // -z
    [5, 1, 3, 7], // +x
    [0, 4, 6, 2], // -x
    [6, 7, 3, 2], // +y
    [0, 1, 5, 4], // -y
];

/// Draws a lit box of the given half extents placed by `model`.
pub(crate) fn draw_box(
    canvas: &mut PixelCanvas,
    vp: Viewport,
    camera: &Camera,
    model: Mat4,
    half: Vec3,
    shade: Vec3,
) {
    let corners: [Vec3; 8] = std::array::from_fn(|i| {
        let s = Vec3::new(
            if i & 1 == 0 { -1.0 } else { 1.0 },
            if i & 2 == 0 { -1.0 } else { 1.0 },
            if i & 4 == 0 { -1.0 } else { 1.0 },
        );
        model.transform_point3(s * half)
    });
    let mut screen = [Vec3::ZERO; 8];
    for (s, w) in screen.iter_mut().zip(corners) {
        let Some(ndc) = camera.project(w) else {
            return;
        };
        let p = vp.to_canvas(ndc.truncate());
        *s = p.extend(ndc.z);
    }

    let light = LIGHT_DIR.normalize();
    for face in FACES {
        let [a, b, _, d] = face.map(|i| corners[i]);
        let normal = (b - a).cross(d - a).normalize_or_zero();
        if normal.dot(camera.eye - a) <= 0.0 {
            continue;
        }
        let lit = 0.45 + 0.55 * normal.dot(light).max(0.0);
        let p = Pixel::from_shade(shade * lit);
        let [sa, sb, sc, sd] = face.map(|i| screen[i]);
        fill_triangle(canvas, vp, sa, sb, sc, p);
        fill_triangle(canvas, vp, sa, sc, sd, p);
    }
}

fn fill_triangle(canvas: &mut PixelCanvas, vp: Viewport, v0: Vec3, v1: Vec3, v2: Vec3, p: Pixel) {
    let (a, b, c) = (v0.truncate(), v1.truncate(), v2.truncate());
    let area = edge(a, b, c);
    if area.abs() < 1e-6 {
        return;
    }

    let min_x = a.x.min(b.x).min(c.x).floor().max(vp.x as f32) as i32;
    let max_x = a.x.max(b.x).max(c.x).ceil().min((vp.x + vp.w - 1) as f32) as i32;
    let min_y = a.y.min(b.y).min(c.y).floor().max(vp.y as f32) as i32;
    let max_y = a.y.max(b.y).max(c.y).ceil().min((vp.y + vp.h - 1) as f32) as i32;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let q = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(b, c, q) / area;
            let w1 = edge(c, a, q) / area;
            let w2 = edge(a, b, q) / area;
            // either winding; back faces are culled before this
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                let z = v0.z * w0 + v1.z * w1 + v2.z * w2;
                canvas.plot(x, y, z, p);
            }
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}
