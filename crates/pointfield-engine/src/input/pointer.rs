use super::types::InputEvent;

/// Pointer position normalized to the window.
///
/// - `x`, `y` in `[-1, 1]`, with `y` growing downwards like window coordinates
/// - `client_x` in `[0, 1]`, the horizontal fraction of the window width
///
/// Reads `(0, 0, 0)` until the first move.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub client_x: f32,
}

impl PointerState {
    /// Normalizes a window-space position against the window size.
    ///
    /// A zero-sized window leaves the pointer at the origin.
    pub fn from_client(client_x: f32, client_y: f32, width: f32, height: f32) -> Self {
        if width <= 0.0 || height <= 0.0 {
            return Self::default();
        }
        let fx = client_x / width;
        let fy = client_y / height;
        Self {
            x: fx * 2.0 - 1.0,
            y: fy * 2.0 - 1.0,
            client_x: fx,
        }
    }

    /// Folds an input event into the state. Returns whether it changed.
    ///
    /// Leaving the window keeps the last position.
    pub fn apply_event(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::PointerMoved {
                x,
                y,
                width,
                height,
            } => {
                let next = Self::from_client(x, y, width, height);
                let changed = next != *self;
                *self = next;
                changed
            }
            InputEvent::PointerLeft | InputEvent::Key { .. } => false,
        }
    }

    /// The value uploaded as `uMouse`: y is flipped to point up.
    pub fn mouse_uniform(&self) -> [f32; 2] {
        [self.x, -self.y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, KeyState};

    #[test]
    fn corners_map_to_unit_square() {
        let tl = PointerState::from_client(0.0, 0.0, 800.0, 600.0);
        assert_eq!((tl.x, tl.y, tl.client_x), (-1.0, -1.0, 0.0));

        let br = PointerState::from_client(800.0, 600.0, 800.0, 600.0);
        assert_eq!((br.x, br.y, br.client_x), (1.0, 1.0, 1.0));

        let centre = PointerState::from_client(400.0, 300.0, 800.0, 600.0);
        assert_eq!((centre.x, centre.y, centre.client_x), (0.0, 0.0, 0.5));
    }

    #[test]
    fn mouse_uniform_flips_y() {
        let p = PointerState::from_client(200.0, 150.0, 800.0, 600.0);
        assert_eq!(p.mouse_uniform(), [-0.5, 0.5]);
    }

    #[test]
    fn zero_sized_window_stays_at_origin() {
        assert_eq!(PointerState::from_client(10.0, 10.0, 0.0, 600.0), PointerState::default());
    }

    #[test]
    fn only_motion_changes_state() {
        let mut p = PointerState::default();
        let moved = InputEvent::PointerMoved { x: 100.0, y: 50.0, width: 200.0, height: 100.0 };
        assert!(p.apply_event(&moved));
        assert!(!p.apply_event(&moved));
        assert!(!p.apply_event(&InputEvent::PointerLeft));
        assert!(!p.apply_event(&InputEvent::Key { key: Key::R, state: KeyState::Pressed, repeat: false }));
        assert_eq!(p.client_x, 0.5);
    }
}
