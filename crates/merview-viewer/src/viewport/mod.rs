//! Zoom, pan, drag and fullscreen on top of a displayed artifact.
//!
//! The controller never re-renders anything. It owns a [`ViewportState`], writes the resulting
//! [`Transform`] to its [`ViewportSurface`] on every change, and binds a drag listener on an
//! [`InputHub`] for as long as it is active.

pub mod input;
pub mod transform;

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use euclid::default::Vector2D;
use serde::{Deserialize, Serialize};

pub use input::{DragInput, InputHub, InputTarget, ListenerId, MouseButton, Point, RawInput};
pub use transform::Transform;

/// The element hosting a rendered artifact, as seen by the controller.
pub trait ViewportSurface {
    /// Whether an artifact element is currently present (e.g. the SVG has been mounted).
    fn has_artifact(&self) -> bool;

    /// Mounts `markup` as the hosted artifact, or removes the current one.
    fn set_artifact(&mut self, markup: Option<&str>);

    fn apply_transform(&mut self, transform: &Transform);

    fn is_fullscreen(&self) -> bool;

    fn request_fullscreen(&mut self);

    fn exit_fullscreen(&mut self);

    /// Enables or disables text selection for the whole document.
    fn set_text_selection(&mut self, enabled: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportOptions {
    pub scale_step: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            scale_step: 0.2,
            min_scale: 0.1,
            max_scale: 10.0,
        }
    }
}

impl ViewportOptions {
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.max(self.min_scale).min(self.max_scale)
    }
}

/// Pointer position minus the offset at press time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    anchor: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    scale: f64,
    offset: Vector2D<f64>,
    drag: Option<DragSession>,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vector2D::zero(),
            drag: None,
        }
    }
}

impl ViewportState {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> Vector2D<f64> {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn transform(&self) -> Transform {
        Transform {
            offset: self.offset,
            scale: self.scale,
        }
    }

    pub fn zoom_by(&mut self, delta: f64, options: &ViewportOptions) {
        self.scale = options.clamp_scale(self.scale + delta);
    }

    pub fn begin_drag(&mut self, pointer: Point) {
        self.drag = Some(DragSession {
            anchor: pointer - self.offset,
        });
    }

    /// Moves the artifact with the pointer. Returns `false` when no drag is in progress.
    pub fn drag_to(&mut self, pointer: Point) -> bool {
        let Some(session) = self.drag else {
            return false;
        };
        self.offset = pointer - session.anchor;
        true
    }

    pub fn end_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }
}

struct Inner<S> {
    surface: S,
    options: ViewportOptions,
    state: ViewportState,
}

impl<S: ViewportSurface> Inner<S> {
    fn apply(&mut self) {
        let transform = self.state.transform();
        self.surface.apply_transform(&transform);
    }

    fn on_drag(&mut self, input: DragInput) {
        match input {
            DragInput::Start(p) => {
                self.state.begin_drag(p);
                self.surface.set_text_selection(false);
            }
            DragInput::Move(p) => {
                if self.state.drag_to(p) {
                    self.apply();
                }
            }
            DragInput::End => {
                self.state.end_drag();
                self.surface.set_text_selection(true);
            }
        }
    }
}

/// Per-surface viewport controller.
///
/// Uninitialized -> [`initialize`](Self::initialize) -> active ->
/// [`destroy`](Self::destroy) -> uninitialized. Dropping the controller destroys it.
pub struct ViewportController<S: ViewportSurface + 'static> {
    inner: Rc<RefCell<Inner<S>>>,
    input: Rc<InputHub>,
    binding: Option<ListenerId>,
}

impl<S: ViewportSurface + 'static> ViewportController<S> {
    pub fn new(surface: S, input: Rc<InputHub>, options: ViewportOptions) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                surface,
                options,
                state: ViewportState::default(),
            })),
            input,
            binding: None,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.inner.borrow().state.clone()
    }

    pub fn options(&self) -> ViewportOptions {
        self.inner.borrow().options
    }

    pub fn is_active(&self) -> bool {
        self.binding.is_some()
    }

    pub fn surface(&self) -> Ref<'_, S> {
        Ref::map(self.inner.borrow(), |inner| &inner.surface)
    }

    pub fn with_surface_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.borrow_mut().surface)
    }

    /// Resets state and, when an artifact is present, binds the drag listener and applies the
    /// identity transform. Tears down a previous binding first.
    pub fn initialize(&mut self) {
        self.unbind();
        let mut inner = self.inner.borrow_mut();
        inner.state = ViewportState::default();
        if !inner.surface.has_artifact() {
            return;
        }

        let weak = Rc::downgrade(&self.inner);
        let id = self.input.listen(move |raw| {
            let translated = input::translate(raw);
            if let (Some(drag), Some(inner)) = (translated.input, weak.upgrade()) {
                inner.borrow_mut().on_drag(drag);
            }
            translated.prevent_default
        });
        self.binding = Some(id);
        inner.apply();
    }

    /// Unbinds everything [`initialize`](Self::initialize) bound and resets state. Safe to call
    /// repeatedly.
    pub fn destroy(&mut self) {
        self.unbind();
        self.inner.borrow_mut().state = ViewportState::default();
    }

    fn unbind(&mut self) {
        if let Some(id) = self.binding.take() {
            self.input.unlisten(id);
            self.inner.borrow_mut().surface.set_text_selection(true);
        }
    }

    /// Swaps the hosting surface. The controller is left destroyed; the owner re-initializes.
    pub fn replace_surface(&mut self, surface: S) -> S {
        self.destroy();
        std::mem::replace(&mut self.inner.borrow_mut().surface, surface)
    }

    pub fn zoom_in(&mut self) {
        let step = self.options().scale_step;
        self.zoom_by(step);
    }

    pub fn zoom_out(&mut self) {
        let step = self.options().scale_step;
        self.zoom_by(-step);
    }

    fn zoom_by(&mut self, delta: f64) {
        let mut inner = self.inner.borrow_mut();
        if !inner.surface.has_artifact() {
            return;
        }
        let options = inner.options;
        inner.state.zoom_by(delta, &options);
        inner.apply();
    }

    pub fn reset(&mut self) {
        let mut inner = self.inner.borrow_mut();
        if !inner.surface.has_artifact() {
            return;
        }
        inner.state = ViewportState::default();
        inner.apply();
    }

    pub fn fullscreen(&mut self) {
        let mut inner = self.inner.borrow_mut();
        if inner.surface.is_fullscreen() {
            inner.surface.exit_fullscreen();
        } else {
            inner.surface.request_fullscreen();
        }
    }
}

impl<S: ViewportSurface + 'static> Drop for ViewportController<S> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_is_relative_to_the_press_point() {
        let mut state = ViewportState::default();
        state.begin_drag(Point::new(100.0, 100.0));
        assert!(state.drag_to(Point::new(150.0, 130.0)));
        assert_eq!(state.offset(), Vector2D::new(50.0, 30.0));
        assert!(state.drag_to(Point::new(90.0, 80.0)));
        assert_eq!(state.offset(), Vector2D::new(-10.0, -20.0));
    }

    #[test]
    fn second_drag_continues_from_current_offset() {
        let mut state = ViewportState::default();
        state.begin_drag(Point::new(0.0, 0.0));
        state.drag_to(Point::new(20.0, 10.0));
        state.end_drag();

        state.begin_drag(Point::new(100.0, 100.0));
        state.drag_to(Point::new(105.0, 100.0));
        assert_eq!(state.offset(), Vector2D::new(25.0, 10.0));
    }

    #[test]
    fn move_without_press_is_ignored() {
        let mut state = ViewportState::default();
        assert!(!state.drag_to(Point::new(5.0, 5.0)));
        assert_eq!(state.offset(), Vector2D::zero());
        assert!(!state.end_drag());
    }

    #[test]
    fn zoom_is_clamped_both_ways() {
        let options = ViewportOptions::default();
        let mut state = ViewportState::default();
        for _ in 0..100 {
            state.zoom_by(options.scale_step, &options);
            assert!(state.scale() <= 10.0);
        }
        assert_eq!(state.scale(), 10.0);
        for _ in 0..100 {
            state.zoom_by(-options.scale_step, &options);
            assert!(state.scale() >= 0.1);
        }
        assert_eq!(state.scale(), 0.1);
    }

    #[test]
    fn drag_session_tracks_dragging_flag() {
        let mut state = ViewportState::default();
        assert!(state.drag_session().is_none() && !state.is_dragging());
        state.begin_drag(Point::new(1.0, 1.0));
        assert!(state.drag_session().is_some() && state.is_dragging());
        state.end_drag();
        assert!(state.drag_session().is_none() && !state.is_dragging());
    }
}
