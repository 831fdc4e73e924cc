use crate::input::{collect_input_nonblocking, map_event_to_action, Action, CellPos};
use crate::render::{
    canvas_to_cells, draw_box, draw_particles, draw_text, Pixel, Terminal, Viewport,
};
use crate::Args;
use anyhow::Context;
use crossterm::style::Color;
use emblem::hit_test::Camera;
use emblem::mondrian::Mondrian;
use emblem::settings::{load_settings, save_settings_atomic, Paths};
use emblem::{DragArbiter, Emblem, Settings};
use glam::Vec2;
use rand::{rngs::StdRng, SeedableRng};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

const EMBLEM_CAMERA_DISTANCE: f32 = 50.0;
const EMBLEM_FOV: f32 = 35.0;
const EMBLEM_BACKGROUND: Color = Color::Rgb {
    r: 0x0a,
    g: 0x0a,
    b: 0x0a,
};
const MONDRIAN_CAMERA_DISTANCE: f32 = 75.0;
const MONDRIAN_FOV: f32 = 45.0;
const MONDRIAN_BACKGROUND: Color = Color::Rgb {
    r: 0x11,
    g: 0x11,
    b: 0x11,
};
const BLOOM_HOVERED: f32 = 0.08;
const BLOOM_IDLE: f32 = 0.02;
/// Longest frame step fed to the animation, in seconds.
const MAX_DT: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum SceneKind {
    Emblems,
    Mondrian,
}

/// Flags flipped by emblem observers and read by the HUD.
#[derive(Clone, Default)]
struct Feedback {
    hovered: [Rc<Cell<bool>>; 2],
    dragging: Rc<Cell<bool>>,
}

impl Feedback {
    fn cursor_label(&self) -> &'static str {
        if self.dragging.get() {
            "grabbing"
        } else if self.hovered.iter().any(|h| h.get()) {
            "grab"
        } else {
            "default"
        }
    }

    fn bloom(&self, i: usize) -> f32 {
        if self.hovered[i].get() {
            BLOOM_HOVERED
        } else {
            BLOOM_IDLE
        }
    }
}

pub(crate) struct App {
    settings: Settings,
    term: Terminal,
    rng: StdRng,
    emblems: [Emblem; 2],
    mondrian: Mondrian,
    feedback: Feedback,
    scene: SceneKind,
    /// Last pointer position in canvas pixels, `None` once it left.
    pointer: Option<Vec2>,
    inside: [bool; 2],
    hud: bool,
    paused: bool,
    should_quit: bool,
}

fn settings_path(args: &Args, paths: Option<&Paths>) -> Option<PathBuf> {
    args.config
        .clone()
        .or_else(|| paths.map(|p| p.settings_path.clone()))
}

fn effective_settings(args: &Args, path: Option<&PathBuf>) -> anyhow::Result<Settings> {
    let mut settings = path.map(|p| load_settings(p)).unwrap_or_default();
    if let Some(fps) = args.fps {
        settings.fps_cap = fps;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    if args.no_color {
        settings.enable_color = false;
    }
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

impl App {
    fn init(args: &Args, settings: Settings) -> anyhow::Result<Self> {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let arbiter = DragArbiter::new();
        let mut linkedin = Emblem::linkedin(settings.linkedin.clone(), arbiter.clone(), &mut rng)?;
        let mut github = Emblem::github(settings.github.clone(), arbiter, &mut rng)?;

        let feedback = Feedback::default();
        for (emblem, hovered) in [&mut linkedin, &mut github].into_iter().zip(&feedback.hovered) {
            let hovered = Rc::clone(hovered);
            emblem.on_hover_change(move |h| hovered.set(h));
            let dragging = Rc::clone(&feedback.dragging);
            emblem.on_drag_change(move |d| dragging.set(d));
        }
        log::info!(
            "built {} + {} particles",
            linkedin.field().len(),
            github.field().len()
        );

        let mondrian = Mondrian::new(&mut rng);
        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            term,
            rng,
            emblems: [linkedin, github],
            mondrian,
            feedback,
            scene: args.scene,
            pointer: None,
            inside: [false; 2],
            hud: true,
            paused: false,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            let frame_start = Instant::now();
            if self.term.resize_if_needed()? {
                self.pointer_left();
            }

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(ev) {
                    self.apply(action);
                }
                if self.should_quit {
                    break;
                }
            }

            let now = Instant::now();
            let dt = now.saturating_duration_since(last_frame).as_secs_f32().min(MAX_DT);
            last_frame = now;
            if !self.paused {
                self.update(dt);
            }

            self.render_frame()?;

            // frame cap
            spin_sleep(frame_dt, frame_start);
        }

        self.term.end()?;
        Ok(())
    }

    /// Terminal cell to canvas (braille) pixels.
    fn canvas_point(c: CellPos) -> Vec2 {
        Vec2::new(c.col * 2.0, c.row * 4.0)
    }

    /// Terminal cell to screen pixels, the unit drag thresholds use.
    fn screen_point(&self, c: CellPos) -> Vec2 {
        let [w, h] = self.settings.cell_pixels;
        Vec2::new(c.col * w as f32, c.row * h as f32)
    }

    fn emblem_viewports(&self) -> [Viewport; 2] {
        let w = self.term.canvas.w as i32;
        let h = self.term.canvas.h as i32;
        let half = w / 2;
        [
            Viewport {
                x: 0,
                y: 0,
                w: half,
                h,
            },
            Viewport {
                x: half,
                y: 0,
                w: w - half,
                h,
            },
        ]
    }

    fn full_viewport(&self) -> Viewport {
        Viewport {
            x: 0,
            y: 0,
            w: self.term.canvas.w as i32,
            h: self.term.canvas.h as i32,
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SwitchScene => {
                self.pointer_left();
                self.scene = match self.scene {
                    SceneKind::Emblems => SceneKind::Mondrian,
                    SceneKind::Mondrian => SceneKind::Emblems,
                };
            }
            Action::ToggleHud => self.hud = !self.hud,
            Action::TogglePause => self.paused = !self.paused,
            Action::Rebuild => {
                for e in &mut self.emblems {
                    e.rebuild(&mut self.rng);
                }
                self.mondrian = Mondrian::new(&mut self.rng);
            }
            Action::PointerDown(c) => {
                self.track_pointer(c);
                if self.scene != SceneKind::Emblems {
                    return;
                }
                let p = self.screen_point(c);
                for (e, inside) in self.emblems.iter_mut().zip(self.inside) {
                    if inside {
                        e.pointer_down(p);
                    }
                }
            }
            Action::PointerMove(c) => {
                self.track_pointer(c);
                if self.scene != SceneKind::Emblems {
                    return;
                }
                let p = self.screen_point(c);
                for e in &mut self.emblems {
                    e.pointer_move(p);
                }
            }
            Action::PointerUp(c) => {
                self.track_pointer(c);
                for e in &mut self.emblems {
                    e.pointer_up();
                }
            }
            Action::PointerLeave => self.pointer_left(),
        }
    }

    fn track_pointer(&mut self, c: CellPos) {
        let p = Self::canvas_point(c);
        self.pointer = Some(p);
        let vps = self.emblem_viewports();
        for i in 0..2 {
            let inside = vps[i].contains(p);
            if self.inside[i] && !inside {
                self.emblems[i].pointer_left();
            }
            self.inside[i] = inside;
        }
    }

    fn pointer_left(&mut self) {
        self.pointer = None;
        self.inside = [false; 2];
        for e in &mut self.emblems {
            e.pointer_left();
        }
    }

    fn update(&mut self, dt: f32) {
        let cell_px = self.settings.cell_pixels;
        match self.scene {
            SceneKind::Emblems => {
                let vps = self.emblem_viewports();
                for i in 0..2 {
                    let cam = Camera::looking_at_origin(
                        EMBLEM_CAMERA_DISTANCE,
                        EMBLEM_FOV,
                        vps[i].aspect(cell_px),
                    );
                    let ray = self
                        .pointer
                        .filter(|_| self.inside[i])
                        .map(|p| cam.ray(vps[i].to_ndc(p)));
                    self.emblems[i].frame(dt, ray.as_ref());
                }
            }
            SceneKind::Mondrian => {
                let vp = self.full_viewport();
                let cam = Camera::looking_at_origin(
                    MONDRIAN_CAMERA_DISTANCE,
                    MONDRIAN_FOV,
                    vp.aspect(cell_px),
                );
                let ndc = self.pointer.map(|p| vp.to_ndc(p));
                let ray = ndc.map(|n| cam.ray(n));
                self.mondrian.frame(dt, ndc, ray.as_ref());
            }
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let color = self.settings.enable_color;
        let cell_px = self.settings.cell_pixels;
        let bg = match (color, self.scene) {
            (false, _) => Color::Black,
            (true, SceneKind::Emblems) => EMBLEM_BACKGROUND,
            (true, SceneKind::Mondrian) => MONDRIAN_BACKGROUND,
        };
        self.term.cur.clear(bg);
        self.term.canvas.clear(Pixel::default());

        match self.scene {
            SceneKind::Emblems => {
                let vps = self.emblem_viewports();
                for (i, vp) in vps.into_iter().enumerate() {
                    let cam =
                        Camera::looking_at_origin(EMBLEM_CAMERA_DISTANCE, EMBLEM_FOV, vp.aspect(cell_px));
                    let model = self.emblems[i].particle_transform();
                    let bloom = self.feedback.bloom(i);
                    let instances = self.emblems[i].instances_mut();
                    draw_particles(&mut self.term.canvas, vp, &cam, model, instances, bloom);
                    instances.mark_uploaded();
                }
            }
            SceneKind::Mondrian => {
                let vp = self.full_viewport();
                let cam = Camera::looking_at_origin(
                    MONDRIAN_CAMERA_DISTANCE,
                    MONDRIAN_FOV,
                    vp.aspect(cell_px),
                );
                for (i, b) in self.mondrian.blocks().iter().enumerate() {
                    draw_box(
                        &mut self.term.canvas,
                        vp,
                        &cam,
                        self.mondrian.block_transform(i),
                        b.block.half_extents(),
                        b.shade(),
                    );
                }
            }
        }

        canvas_to_cells(&self.term.canvas, &mut self.term.cur, color, bg);

        if self.hud {
            self.draw_hud(bg);
        }

        self.term.present(true)?;
        Ok(())
    }

    fn draw_hud(&mut self, bg: Color) {
        let fg = Color::White;
        let status = match self.scene {
            SceneKind::Emblems => format!(
                "emblem  |  particles {} + {}  |  cursor: {}{}",
                self.emblems[0].field().len(),
                self.emblems[1].field().len(),
                self.feedback.cursor_label(),
                if self.paused { "  |  paused" } else { "" },
            ),
            SceneKind::Mondrian => format!(
                "mondrian  |  cursor: {}{}",
                if self.mondrian.any_hovered() { "pointer" } else { "default" },
                if self.paused { "  |  paused" } else { "" },
            ),
        };
        draw_text(&mut self.term.cur, 1, 0, &status, fg, bg);

        let help = "q quit | tab scene | h hud | p pause | r rebuild | click a logo to open it";
        let y = self.term.cur.h.saturating_sub(1);
        draw_text(&mut self.term.cur, 1, y, help, fg, bg);
    }
}

pub(crate) fn run(args: Args, paths: Option<Paths>) -> anyhow::Result<()> {
    let path = settings_path(&args, paths.as_ref());
    let settings = effective_settings(&args, path.as_ref())?;

    if args.write_config {
        let path = path.context("no settings location available; pass --config")?;
        save_settings_atomic(&path, &settings)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let mut app = App::init(&args, settings)?;
    let result = app.run();
    if result.is_err() {
        // leave the terminal usable even when the loop failed
        let _ = app.term.end();
    }
    result
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
