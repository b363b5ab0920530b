use std::collections::HashSet;

use super::types::{InputEvent, Key};

/// Per-frame input deltas.
///
/// `InputState` provides the current state (held keys, modifiers).
/// `InputFrame` provides events and transition sets for the current frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    /// Keys pressed (or auto-repeated) this frame.
    pub keys_pressed: HashSet<Key>,

    /// Keys released this frame.
    pub keys_released: HashSet<Key>,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    /// Pressed keys with the modifiers active at the time, in arrival order.
    pub fn presses(&self) -> impl Iterator<Item = (Key, super::Modifiers)> + '_ {
        self.events.iter().filter_map(|ev| match ev {
            InputEvent::Key { key, state: super::KeyState::Pressed, modifiers, .. } => {
                Some((*key, *modifiers))
            }
            _ => None,
        })
    }
}
