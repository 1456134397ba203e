use crate::action::{Key, KeyBindings, Movement};
use std::collections::{HashSet, VecDeque};

/// A raw event delivered by the host between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Raw pointer motion in look-space units (already sign-adjusted by the host).
    PointerMotion { dx: f32, dy: f32 },
    /// The window lost focus: held keys and look mode are released.
    FocusLost,
}

/// Keys held and mouse motion accumulated since the last frame.
///
/// Hosts `push` events as they arrive; the frame loop calls `drain_events`
/// once at the start of a tick and `consume_mouse_delta` once per tick.
/// Events pushed while a tick is running stay queued for the next one.
#[derive(Debug, Default)]
pub struct InputState {
    pressed: HashSet<Key>,
    mouse_delta: (f32, f32),
    look_engaged: bool,
    queue: VecDeque<InputEvent>,
    bindings: KeyBindings,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Queue an event for the next tick.
    pub fn push(&mut self, event: InputEvent) {
        self.queue.push_back(event);
    }

    /// Number of events waiting for the next drain.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Apply every queued event in arrival order. Returns how many were applied.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.queue.pop_front() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                let newly_pressed = self.pressed.insert(key);
                if newly_pressed && key == self.bindings.look {
                    self.set_look_engaged(!self.look_engaged);
                } else if key == self.bindings.release {
                    self.set_look_engaged(false);
                }
            }
            InputEvent::KeyUp(key) => {
                self.pressed.remove(&key);
            }
            InputEvent::PointerMotion { dx, dy } => {
                if self.look_engaged {
                    self.mouse_delta.0 += dx;
                    self.mouse_delta.1 += dy;
                }
            }
            InputEvent::FocusLost => {
                self.pressed.clear();
                self.set_look_engaged(false);
            }
        }
    }

    fn set_look_engaged(&mut self, engaged: bool) {
        if self.look_engaged != engaged {
            tracing::debug!(engaged, "look mode changed");
        }
        self.look_engaged = engaged;
    }

    pub fn is_look_engaged(&self) -> bool {
        self.look_engaged
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Return the accumulated mouse delta and reset it to zero.
    pub fn consume_mouse_delta(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.mouse_delta)
    }

    /// Movements whose bound keys are currently held, in a stable order.
    pub fn active_movements(&self) -> Vec<Movement> {
        let mut out: Vec<Movement> = self
            .pressed
            .iter()
            .filter_map(|k| self.bindings.movement(*k))
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engaged() -> InputState {
        let mut input = InputState::new();
        input.push(InputEvent::KeyDown(Key::H));
        input.push(InputEvent::KeyUp(Key::H));
        input.drain_events();
        assert!(input.is_look_engaged());
        input
    }

    #[test]
    fn keys_are_visible_only_after_drain() {
        let mut input = InputState::new();
        input.push(InputEvent::KeyDown(Key::W));
        assert!(!input.is_key_down(Key::W));
        assert_eq!(input.drain_events(), 1);
        assert!(input.is_key_down(Key::W));
        input.push(InputEvent::KeyUp(Key::W));
        input.drain_events();
        assert!(!input.is_key_down(Key::W));
    }

    #[test]
    fn unknown_key_is_simply_absent() {
        let input = InputState::new();
        assert!(!input.is_key_down(Key::Other));
    }

    #[test]
    fn consume_returns_then_resets_delta() {
        let mut input = engaged();
        input.push(InputEvent::PointerMotion { dx: 3.0, dy: -1.0 });
        input.push(InputEvent::PointerMotion { dx: 7.0, dy: -4.0 });
        input.drain_events();
        assert_eq!(input.consume_mouse_delta(), (10.0, -5.0));
        assert_eq!(input.consume_mouse_delta(), (0.0, 0.0));
    }

    #[test]
    fn motion_queued_after_drain_waits_for_next_tick() {
        let mut input = engaged();
        input.push(InputEvent::PointerMotion { dx: 1.0, dy: 1.0 });
        input.drain_events();
        // Arrives while the current tick is running.
        input.push(InputEvent::PointerMotion { dx: 2.0, dy: 0.0 });
        assert_eq!(input.consume_mouse_delta(), (1.0, 1.0));
        input.drain_events();
        assert_eq!(input.consume_mouse_delta(), (2.0, 0.0));
    }

    #[test]
    fn pointer_motion_ignored_without_look_mode() {
        let mut input = InputState::new();
        input.push(InputEvent::PointerMotion { dx: 5.0, dy: 5.0 });
        input.drain_events();
        assert_eq!(input.consume_mouse_delta(), (0.0, 0.0));
    }

    #[test]
    fn look_key_toggles_and_escape_releases() {
        let mut input = engaged();
        input.push(InputEvent::KeyDown(Key::H));
        input.drain_events();
        assert!(!input.is_look_engaged());

        // Key repeat while held does not toggle again.
        input.push(InputEvent::KeyDown(Key::H));
        input.push(InputEvent::KeyUp(Key::H));
        input.push(InputEvent::KeyDown(Key::H));
        input.drain_events();
        assert!(input.is_look_engaged());

        input.push(InputEvent::KeyDown(Key::Escape));
        input.drain_events();
        assert!(!input.is_look_engaged());
    }

    #[test]
    fn focus_lost_releases_everything() {
        let mut input = engaged();
        input.push(InputEvent::KeyDown(Key::W));
        input.push(InputEvent::FocusLost);
        input.drain_events();
        assert!(!input.is_key_down(Key::W));
        assert!(!input.is_look_engaged());
    }

    #[test]
    fn active_movements_follow_bindings() {
        let mut input = InputState::new();
        input.push(InputEvent::KeyDown(Key::D));
        input.push(InputEvent::KeyDown(Key::W));
        input.push(InputEvent::KeyDown(Key::H));
        input.drain_events();
        assert_eq!(
            input.active_movements(),
            vec![Movement::Forward, Movement::Right]
        );
    }
}
