use std::collections::BTreeMap;

/// Keys the engine reacts to. Host key codes outside this set map to
/// [`Key::Other`] and never bind to anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    W,
    A,
    S,
    D,
    H,
    Space,
    Shift,
    Escape,
    F1,
    Other,
}

impl std::str::FromStr for Key {
    type Err = String;

    /// Case-insensitive key name, as written in scripts and on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "w" => Ok(Key::W),
            "a" => Ok(Key::A),
            "s" => Ok(Key::S),
            "d" => Ok(Key::D),
            "h" => Ok(Key::H),
            "space" => Ok(Key::Space),
            "shift" => Ok(Key::Shift),
            "escape" | "esc" => Ok(Key::Escape),
            "f1" => Ok(Key::F1),
            other => Err(format!("unknown key '{other}'")),
        }
    }
}

/// A camera displacement requested by held keys.
///
/// The camera controller decides which basis vector each movement follows,
/// so the same bindings drive every camera mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Movement {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

impl Movement {
    pub const ALL: [Movement; 6] = [
        Movement::Forward,
        Movement::Back,
        Movement::Left,
        Movement::Right,
        Movement::Up,
        Movement::Down,
    ];
}

/// Key → movement table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    movement: BTreeMap<Key, Movement>,
    /// Engages look mode (pointer capture).
    pub look: Key,
    /// Releases look mode.
    pub release: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let movement = BTreeMap::from([
            (Key::W, Movement::Forward),
            (Key::S, Movement::Back),
            (Key::A, Movement::Left),
            (Key::D, Movement::Right),
            (Key::Space, Movement::Up),
            (Key::Shift, Movement::Down),
        ]);
        Self {
            movement,
            look: Key::H,
            release: Key::Escape,
        }
    }
}

impl KeyBindings {
    /// Movement bound to `key`, if any.
    pub fn movement(&self, key: Key) -> Option<Movement> {
        self.movement.get(&key).copied()
    }

    /// Rebind `key` to `movement`, dropping any previous key for that movement.
    pub fn bind(&mut self, key: Key, movement: Movement) {
        self.movement.retain(|_, m| *m != movement);
        self.movement.insert(key, movement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_cover_every_movement() {
        let b = KeyBindings::default();
        for m in Movement::ALL {
            assert!(
                [Key::W, Key::A, Key::S, Key::D, Key::Space, Key::Shift]
                    .iter()
                    .any(|k| b.movement(*k) == Some(m)),
                "{m:?} unbound"
            );
        }
        assert_eq!(b.look, Key::H);
    }

    #[test]
    fn unknown_key_has_no_movement() {
        let b = KeyBindings::default();
        assert_eq!(b.movement(Key::Other), None);
        assert_eq!(b.movement(Key::H), None);
    }

    #[test]
    fn rebinding_replaces_previous_key() {
        let mut b = KeyBindings::default();
        b.bind(Key::F1, Movement::Up);
        assert_eq!(b.movement(Key::F1), Some(Movement::Up));
        assert_eq!(b.movement(Key::Space), None);
    }

    #[test]
    fn key_names_parse() {
        assert_eq!("W".parse::<Key>(), Ok(Key::W));
        assert_eq!("space".parse::<Key>(), Ok(Key::Space));
        assert_eq!("Esc".parse::<Key>(), Ok(Key::Escape));
        assert!("q".parse::<Key>().is_err());
    }
}
