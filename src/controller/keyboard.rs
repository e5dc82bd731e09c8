//! Key model and the per-grid keyboard dispatcher.
//!
//! Keys arrive as `KeyboardEvent.key` names plus modifier flags. The
//! dispatcher belongs to one grid instance and only resolves bindings
//! while attached.

/// Arrow direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Keys the grid reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Arrow(Direction),
    Tab,
    Enter,
    Escape,
    Char(char),
}

impl Key {
    /// Parse a `KeyboardEvent.key` value.
    pub fn parse(name: &str) -> Option<Self> {
        let key = match name {
            "ArrowUp" | "Up" => Key::Arrow(Direction::Up),
            "ArrowDown" | "Down" => Key::Arrow(Direction::Down),
            "ArrowLeft" | "Left" => Key::Arrow(Direction::Left),
            "ArrowRight" | "Right" => Key::Arrow(Direction::Right),
            "Tab" => Key::Tab,
            "Enter" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c.to_ascii_lowercase()),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

/// A key press with modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyInput {
    pub key: Key,
    /// Ctrl, or Cmd on macOS.
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::new(key)
        }
    }

    pub fn shift(key: Key) -> Self {
        Self {
            shift: true,
            ..Self::new(key)
        }
    }

    /// Build from an event's key name and modifier state.
    pub fn from_event(name: &str, ctrl: bool, meta: bool, shift: bool) -> Option<Self> {
        Some(Self {
            key: Key::parse(name)?,
            ctrl: ctrl || meta,
            shift,
        })
    }
}

/// What a key press asks the cell controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Move(Direction),
    /// Ctrl+Arrow: jump to the edge.
    Jump(Direction),
    /// Shift+Arrow: grow the range selection.
    Extend(Direction),
    /// Enter: start editing, or commit the current edit.
    Activate,
    Cancel,
    Copy,
}

/// Instance-scoped binding table
#[derive(Debug, Clone)]
pub struct KeyboardDispatcher {
    bindings: Vec<(KeyInput, KeyCommand)>,
    attached: bool,
}

impl Default for KeyboardDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardDispatcher {
    /// Dispatcher with the default grid bindings, detached.
    pub fn new() -> Self {
        let mut bindings = Vec::new();
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            bindings.push((KeyInput::new(Key::Arrow(dir)), KeyCommand::Move(dir)));
            bindings.push((KeyInput::ctrl(Key::Arrow(dir)), KeyCommand::Jump(dir)));
            bindings.push((KeyInput::shift(Key::Arrow(dir)), KeyCommand::Extend(dir)));
        }
        bindings.push((KeyInput::new(Key::Tab), KeyCommand::Move(Direction::Right)));
        bindings.push((KeyInput::shift(Key::Tab), KeyCommand::Move(Direction::Left)));
        bindings.push((KeyInput::new(Key::Enter), KeyCommand::Activate));
        bindings.push((KeyInput::new(Key::Escape), KeyCommand::Cancel));
        bindings.push((KeyInput::ctrl(Key::Char('c')), KeyCommand::Copy));
        Self {
            bindings,
            attached: false,
        }
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Add or replace a binding.
    pub fn bind(&mut self, input: KeyInput, command: KeyCommand) {
        self.bindings.retain(|(existing, _)| *existing != input);
        self.bindings.push((input, command));
    }

    /// Command bound to `input`; `None` while detached.
    pub fn dispatch(&self, input: KeyInput) -> Option<KeyCommand> {
        if !self.attached {
            return None;
        }
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == input)
            .map(|(_, command)| *command)
    }
}
