//! Pointer and touch input, collapsed into one drag vocabulary.
//!
//! Hosts forward their native events as [`RawInput`] into an [`InputHub`]. Listeners bound on
//! the hub (the viewport controller binds exactly one per active session) see every event and
//! translate it with [`translate`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use euclid::default::Point2D;

pub type Point = Point2D<f64>;

/// Element an event was dispatched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
    /// The rendered artifact element.
    Artifact,
    /// Anywhere else in the document.
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Auxiliary,
    Secondary,
    Other(u16),
}

impl MouseButton {
    /// Maps a DOM-style button index.
    pub fn from_index(index: u16) -> Self {
        match index {
            0 => Self::Primary,
            1 => Self::Auxiliary,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    MouseDown {
        target: InputTarget,
        button: MouseButton,
        position: Point,
    },
    MouseMove {
        position: Point,
    },
    MouseUp {
        position: Point,
    },
    TouchStart {
        target: InputTarget,
        touches: Vec<Point>,
    },
    TouchMove {
        touches: Vec<Point>,
    },
    TouchEnd {
        touches: Vec<Point>,
    },
    TouchCancel,
}

/// Hardware-agnostic drag input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragInput {
    Start(Point),
    Move(Point),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translated {
    pub input: Option<DragInput>,
    /// The host should suppress the event's default action (text selection, scrolling).
    pub prevent_default: bool,
}

impl Translated {
    fn ignored() -> Self {
        Self {
            input: None,
            prevent_default: false,
        }
    }

    fn drag(input: DragInput, prevent_default: bool) -> Self {
        Self {
            input: Some(input),
            prevent_default,
        }
    }
}

fn single_touch(touches: &[Point]) -> Option<Point> {
    match touches {
        [only] => Some(*only),
        _ => None,
    }
}

/// Translates a raw event into the drag vocabulary.
///
/// Presses only count on the artifact and only for the primary button or a single finger.
/// Moves are tracked document-wide so a drag continues when the pointer leaves the artifact.
pub fn translate(raw: &RawInput) -> Translated {
    match raw {
        RawInput::MouseDown {
            target: InputTarget::Artifact,
            button: MouseButton::Primary,
            position,
        } => Translated::drag(DragInput::Start(*position), true),
        RawInput::MouseDown { .. } => Translated::ignored(),
        RawInput::MouseMove { position } => Translated::drag(DragInput::Move(*position), false),
        RawInput::MouseUp { .. } => Translated::drag(DragInput::End, false),
        RawInput::TouchStart {
            target: InputTarget::Artifact,
            touches,
        } => match single_touch(touches) {
            Some(p) => Translated::drag(DragInput::Start(p), false),
            None => Translated::ignored(),
        },
        RawInput::TouchStart { .. } => Translated::ignored(),
        RawInput::TouchMove { touches } => match single_touch(touches) {
            Some(p) => Translated::drag(DragInput::Move(p), true),
            None => Translated::ignored(),
        },
        RawInput::TouchEnd { .. } | RawInput::TouchCancel => {
            Translated::drag(DragInput::End, false)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&RawInput) -> bool>;

/// Listener registry standing in for the host's event targets.
#[derive(Default)]
pub struct InputHub {
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_id: Cell<u64>,
}

impl InputHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `listener`; it returns whether the event's default action should be suppressed.
    pub fn listen(&self, listener: impl Fn(&RawInput) -> bool + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unlisten(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Delivers `event` to every bound listener. Returns whether any listener asked for the
    /// default action to be suppressed.
    pub fn dispatch(&self, event: &RawInput) -> bool {
        // Snapshot so listeners may bind/unbind while being called.
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        let mut prevent_default = false;
        for listener in snapshot {
            prevent_default |= listener(event);
        }
        prevent_default
    }
}

impl std::fmt::Debug for InputHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn primary_press_on_artifact_starts_and_prevents_default() {
        let t = translate(&RawInput::MouseDown {
            target: InputTarget::Artifact,
            button: MouseButton::Primary,
            position: pt(3.0, 4.0),
        });
        assert_eq!(t.input, Some(DragInput::Start(pt(3.0, 4.0))));
        assert!(t.prevent_default);
    }

    #[test]
    fn secondary_button_and_off_artifact_presses_are_ignored() {
        for event in [
            RawInput::MouseDown {
                target: InputTarget::Artifact,
                button: MouseButton::from_index(2),
                position: pt(0.0, 0.0),
            },
            RawInput::MouseDown {
                target: InputTarget::Document,
                button: MouseButton::Primary,
                position: pt(0.0, 0.0),
            },
        ] {
            assert_eq!(translate(&event), Translated::ignored());
        }
    }

    #[test]
    fn multi_touch_is_ignored() {
        let start = RawInput::TouchStart {
            target: InputTarget::Artifact,
            touches: vec![pt(0.0, 0.0), pt(5.0, 5.0)],
        };
        assert_eq!(translate(&start).input, None);

        let moved = RawInput::TouchMove {
            touches: vec![pt(0.0, 0.0), pt(5.0, 5.0)],
        };
        let t = translate(&moved);
        assert_eq!(t.input, None);
        assert!(!t.prevent_default);
    }

    #[test]
    fn single_finger_move_prevents_scrolling() {
        let t = translate(&RawInput::TouchMove {
            touches: vec![pt(1.0, 2.0)],
        });
        assert_eq!(t.input, Some(DragInput::Move(pt(1.0, 2.0))));
        assert!(t.prevent_default);
    }

    #[test]
    fn release_and_cancel_end_the_drag() {
        assert_eq!(translate(&RawInput::TouchCancel).input, Some(DragInput::End));
        assert_eq!(
            translate(&RawInput::MouseUp {
                position: pt(0.0, 0.0)
            })
            .input,
            Some(DragInput::End)
        );
    }

    #[test]
    fn hub_binds_and_unbinds_listeners() {
        let hub = InputHub::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let id = hub.listen(move |_| {
            counter.set(counter.get() + 1);
            true
        });

        assert!(hub.dispatch(&RawInput::TouchCancel));
        assert_eq!(hits.get(), 1);

        assert!(hub.unlisten(id));
        assert!(!hub.unlisten(id));
        assert!(!hub.dispatch(&RawInput::TouchCancel));
        assert_eq!(hits.get(), 1);
        assert_eq!(hub.listener_count(), 0);
    }
}
