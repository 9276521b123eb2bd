/// Keyboard key identifier.
///
/// Only keys the viewer reacts to are named; everything else maps to
/// `Key::Unknown` with the platform key code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Space,
    R,
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Platform-agnostic input event.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer moved; position in logical pixels relative to the window's
    /// top-left corner, alongside the window's logical size.
    PointerMoved {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    PointerLeft,
    Key {
        key: Key,
        state: KeyState,
        repeat: bool,
    },
}

impl InputEvent {
    /// True for the initial press of `key` (not auto-repeat).
    pub fn is_press(&self, key: Key) -> bool {
        matches!(
            self,
            InputEvent::Key { key: k, state: KeyState::Pressed, repeat: false } if *k == key
        )
    }
}
