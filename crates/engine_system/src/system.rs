//! The per-frame visitor interface.

use std::cell::RefCell;
use std::rc::Rc;

use engine_ecs::Space;

/// Per-frame logic run over a game's active spaces.
///
/// Implementors usually override only [`update`](System::update) and/or
/// [`render`](System::render). The multi-space forms visit each space in the
/// order given; override them to work across spaces at once.
///
/// `interval` is the host-supplied elapsed time, passed through untouched.
pub trait System: 'static {
    fn update(&mut self, _space: &mut Space, _interval: f64) {}

    fn render(&mut self, _space: &Space, _interval: f64) {}

    fn update_spaces(&mut self, spaces: &[Rc<RefCell<Space>>], interval: f64) {
        for space in spaces {
            self.update(&mut space.borrow_mut(), interval);
        }
    }

    fn render_spaces(&mut self, spaces: &[Rc<RefCell<Space>>], interval: f64) {
        for space in spaces {
            self.render(&space.borrow(), interval);
        }
    }
}
