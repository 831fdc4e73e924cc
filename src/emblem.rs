//! One interactive particle emblem.
//!
//! Ties the field builder, animator, picker, rotation controller and click
//! gate together behind a pointer/frame interface. Hosts feed it pointer
//! events in pixels, a pick ray per frame, and read back the instance
//! buffer and group transform to draw.

use crate::animator::{AnimationState, FrameInput, InstanceBuffer, Repulsion};
use crate::click::{ClickGate, LinkOpener, SystemBrowser};
use crate::error::Result;
use crate::field::{FieldBuilder, FieldCache, ParticleField};
use crate::hit_test::{pick, HoverTracker, Pick, Ray};
use crate::rotation::{DragArbiter, EmblemId, RotationController};
use crate::settings::EmblemSettings;
use glam::{Mat4, Vec2, Vec3};
use rand::Rng;
use std::rc::Rc;

type HoverListener = Box<dyn FnMut(bool)>;

pub struct Emblem {
    settings: EmblemSettings,
    builder: FieldBuilder,
    cache: FieldCache,
    anim: AnimationState,
    rotation: RotationController,
    hover: HoverTracker,
    clicks: ClickGate,
    opener: Box<dyn LinkOpener>,
    hover_listeners: Vec<HoverListener>,
    pick: Pick,
    elapsed: f32,
}

impl Emblem {
    pub fn new(
        builder: FieldBuilder,
        settings: EmblemSettings,
        arbiter: DragArbiter,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        settings.validate()?;
        let mut cache = FieldCache::default();
        let field = cache.get_or_build(&builder, settings.resolution, settings.gap, rng);
        let rotation = RotationController::new(arbiter, settings.reverse);
        Ok(Self {
            anim: AnimationState::new(field),
            settings,
            builder,
            cache,
            rotation,
            hover: HoverTracker::default(),
            clicks: ClickGate::default(),
            opener: Box::new(SystemBrowser),
            hover_listeners: Vec::new(),
            pick: Pick::MISS,
            elapsed: 0.0,
        })
    }

    pub fn linkedin(settings: EmblemSettings, arbiter: DragArbiter, rng: &mut impl Rng) -> Result<Self> {
        Self::new(FieldBuilder::linkedin(), settings, arbiter, rng)
    }

    pub fn github(settings: EmblemSettings, arbiter: DragArbiter, rng: &mut impl Rng) -> Result<Self> {
        Self::new(FieldBuilder::github(), settings, arbiter, rng)
    }

    /// Replaces the system browser, mostly for tests.
    pub fn with_opener(mut self, opener: impl LinkOpener + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    pub fn on_hover_change(&mut self, f: impl FnMut(bool) + 'static) {
        self.hover_listeners.push(Box::new(f));
    }

    pub fn on_drag_change(&mut self, f: impl FnMut(bool) + 'static) {
        self.rotation.on_drag_change(f);
    }

    pub fn id(&self) -> EmblemId {
        self.rotation.id()
    }

    pub fn settings(&self) -> &EmblemSettings {
        &self.settings
    }

    pub fn field(&self) -> &Rc<ParticleField> {
        self.anim.field()
    }

    pub fn animation(&self) -> &AnimationState {
        &self.anim
    }

    pub fn instances_mut(&mut self) -> &mut InstanceBuffer {
        self.anim.buffer_mut()
    }

    pub fn rotation(&self) -> &RotationController {
        &self.rotation
    }

    pub fn is_hovered(&self) -> bool {
        self.hover.is_hovered()
    }

    pub fn is_dragging(&self) -> bool {
        self.rotation.is_dragging()
    }

    pub fn cursor(&self) -> Vec3 {
        self.pick.cursor
    }

    pub fn builds(&self) -> usize {
        self.cache.builds()
    }

    pub fn group_transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.settings.scale),
            self.rotation.orientation(),
            Vec3::ZERO,
        )
    }

    /// Model matrix of the particle instances (group plus depth re-centering).
    pub fn particle_transform(&self) -> Mat4 {
        self.group_transform() * Mat4::from_translation(Vec3::new(0.0, 0.0, -self.field().z_center))
    }

    fn set_hover(&mut self, change: Option<bool>) {
        if let Some(hovered) = change {
            log::trace!("{} hover {hovered}", self.id());
            for f in &mut self.hover_listeners {
                f(hovered);
            }
        }
    }

    /// Advances one frame. `ray` is `None` while the pointer is outside the
    /// emblem's viewport.
    pub fn frame(&mut self, dt: f32, ray: Option<&Ray>) {
        self.rotation.tick(dt);
        self.elapsed += dt;

        self.pick = match ray {
            Some(ray) => pick(self.anim.field(), self.group_transform(), ray),
            None => Pick::MISS,
        };
        let change = self.hover.update(self.pick.over);
        self.set_hover(change);

        let input = FrameInput {
            elapsed: self.elapsed,
            dt,
            cursor: self.pick.cursor,
            pointer_over: self.pick.over,
        };
        let repulsion = Repulsion {
            displacement: self.settings.displacement,
            intensity: self.settings.intensity,
        };
        self.anim.advance(&input, repulsion, self.settings.speed);
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        self.clicks.pointer_down(pos);
        self.rotation.pointer_down(pos);
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.clicks.pointer_move(pos);
        self.rotation.pointer_move(pos);
    }

    /// Button released. Returns `true` if the gesture was a click that
    /// opened the profile link.
    pub fn pointer_up(&mut self) -> bool {
        let pressed_here = self.clicks.is_pressed();
        let rotating = self.rotation.is_dragging();
        self.clicks.pointer_up();
        self.rotation.pointer_up();
        pressed_here && self.click(rotating)
    }

    fn click(&mut self, rotating: bool) -> bool {
        if !self.clicks.click(self.hover.is_hovered(), rotating) {
            return false;
        }
        let url = self.settings.url.clone();
        match self.opener.open(&url) {
            Ok(()) => {
                log::info!("opened {url}");
                true
            }
            Err(err) => {
                log::warn!("{err}");
                false
            }
        }
    }

    /// Pointer left the viewport: hover ends, cursor goes to the sentinel.
    pub fn pointer_left(&mut self) {
        self.pick = Pick::MISS;
        let change = self.hover.force_leave();
        self.set_hover(change);
    }

    /// Applies new settings, rebuilding the field only when its shape changed.
    pub fn update_settings(&mut self, settings: EmblemSettings, rng: &mut impl Rng) -> Result<()> {
        settings.validate()?;
        let reshape = settings.resolution != self.settings.resolution || settings.gap != self.settings.gap;
        self.rotation.set_reverse(settings.reverse);
        self.settings = settings;
        if reshape {
            self.reload(rng);
        }
        Ok(())
    }

    pub fn rebuild(&mut self, rng: &mut impl Rng) {
        self.cache.invalidate();
        self.reload(rng);
    }

    fn reload(&mut self, rng: &mut impl Rng) {
        let field = self
            .cache
            .get_or_build(&self.builder, self.settings.resolution, self.settings.gap, rng);
        self.anim = AnimationState::new(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmblemError;
    use crate::hit_test::Camera;
    use crate::glyph::{Disc, Glyph, Rgba};
    use crate::zone::Classifier;
    use rand::{rngs::StdRng, SeedableRng};
    use std::cell::RefCell;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl LinkOpener for Recorder {
        fn open(&mut self, url: &str) -> Result<()> {
            self.0.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    struct Broken;

    impl LinkOpener for Broken {
        fn open(&mut self, url: &str) -> Result<()> {
            Err(EmblemError::LinkOpen {
                url: url.to_string(),
                source: std::io::Error::other("no browser"),
            })
        }
    }

    fn small_settings() -> EmblemSettings {
        EmblemSettings {
            resolution: 16,
            ..EmblemSettings::linkedin()
        }
    }

    fn emblem(rng: &mut StdRng) -> Emblem {
        let glyph = Glyph {
            disc: Some(Disc {
                radius: 0.4,
                color: Rgba::WHITE,
            }),
            mark: None,
        };
        let builder = FieldBuilder::new(glyph, Classifier::Uniform { keep_rate: 0.5 });
        Emblem::new(builder, small_settings(), DragArbiter::new(), rng).unwrap()
    }

    fn center_ray() -> Ray {
        Camera::looking_at_origin(50.0, 35.0, 1.0).ray(Vec2::ZERO)
    }

    #[test]
    fn hover_listeners_fire_once_per_transition() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut e = emblem(&mut rng);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        e.on_hover_change(move |h| log.borrow_mut().push(h));

        let ray = center_ray();
        for _ in 0..3 {
            e.frame(1.0 / 60.0, Some(&ray));
        }
        assert!(e.is_hovered());
        e.pointer_left();
        e.frame(1.0 / 60.0, None);
        e.frame(1.0 / 60.0, None);
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn click_on_hovered_emblem_opens_link() {
        let mut rng = StdRng::seed_from_u64(2);
        let rec = Recorder::default();
        let mut e = emblem(&mut rng).with_opener(rec.clone());
        e.frame(1.0 / 60.0, Some(&center_ray()));

        e.pointer_down(Vec2::new(100.0, 100.0));
        e.pointer_move(Vec2::new(102.0, 101.0));
        assert!(e.pointer_up());
        assert_eq!(*rec.0.borrow(), vec![small_settings().url]);
    }

    #[test]
    fn click_off_the_emblem_does_nothing() {
        let mut rng = StdRng::seed_from_u64(3);
        let rec = Recorder::default();
        let mut e = emblem(&mut rng).with_opener(rec.clone());
        e.frame(1.0 / 60.0, None);
        e.pointer_down(Vec2::ZERO);
        assert!(!e.pointer_up());
        assert!(rec.0.borrow().is_empty());
    }

    #[test]
    fn release_without_press_is_not_a_click() {
        let mut rng = StdRng::seed_from_u64(4);
        let rec = Recorder::default();
        let mut e = emblem(&mut rng).with_opener(rec.clone());
        e.frame(1.0 / 60.0, Some(&center_ray()));
        assert!(!e.pointer_up());
        assert!(rec.0.borrow().is_empty());
    }

    #[test]
    fn opener_failure_is_swallowed() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut e = emblem(&mut rng).with_opener(Broken);
        e.frame(1.0 / 60.0, Some(&center_ray()));
        e.pointer_down(Vec2::ZERO);
        assert!(!e.pointer_up());
    }

    #[test]
    fn only_shape_changes_rebuild() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut e = emblem(&mut rng);
        assert_eq!(e.builds(), 1);

        let mut s = small_settings();
        s.displacement = 3.0;
        s.reverse = true;
        e.update_settings(s.clone(), &mut rng).unwrap();
        assert_eq!(e.builds(), 1);

        s.gap = 0.5;
        e.update_settings(s.clone(), &mut rng).unwrap();
        assert_eq!(e.builds(), 2);

        e.rebuild(&mut rng);
        assert_eq!(e.builds(), 3);

        s.speed = -1.0;
        assert!(e.update_settings(s, &mut rng).is_err());
        assert_eq!(e.settings().speed, small_settings().speed);
    }

    #[test]
    fn pointer_left_resets_cursor() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut e = emblem(&mut rng);
        e.frame(1.0 / 60.0, Some(&center_ray()));
        assert_ne!(e.cursor(), crate::animator::CURSOR_SENTINEL);
        e.pointer_left();
        assert_eq!(e.cursor(), crate::animator::CURSOR_SENTINEL);
        assert!(!e.is_hovered());
    }
}
