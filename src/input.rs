use crate::utils::{Position, Size};
use std::collections::VecDeque;

/// Result of draining the pending events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Backspace,
    Delete,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Character(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

/// Platform-neutral input event, translated from the window system by the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// The window contents were damaged and need a redraw.
    Expose,
    KeyPressed(Key),
    /// Text produced by a key press, already resolved for the keyboard layout.
    Text(char),
    ButtonPressed { button: MouseButton, x: f32, y: f32 },
    ButtonReleased { button: MouseButton },
    CursorMoved { x: f32, y: f32 },
    CloseRequested,
    Resized(Size),
}

/// Pointer position in window pixels and whether the primary button is held.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorState {
    pub x: f32,
    pub y: f32,
    pub down: bool,
}

impl CursorState {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Typed key forwarded to text fields.
pub const BACKSPACE: char = '\u{8}';
pub const DELETE: char = '\u{7f}';

#[derive(Debug, Default)]
pub struct InputState {
    cursor: CursorState,
    typed: VecDeque<char>,
    quit: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the state.
    ///
    /// `Expose` and `Resized` leave it untouched: every frame is redrawn at the window's
    /// current size anyway.
    pub fn apply(&mut self, event: InputEvent) -> PollStatus {
        match event {
            InputEvent::Expose | InputEvent::Resized(_) => {}
            InputEvent::KeyPressed(Key::Escape) | InputEvent::CloseRequested => {
                self.quit = true;
            }
            InputEvent::KeyPressed(Key::Backspace) => self.typed.push_back(BACKSPACE),
            InputEvent::KeyPressed(Key::Delete) => self.typed.push_back(DELETE),
            InputEvent::KeyPressed(_) => {}
            InputEvent::Text(c) => {
                if !c.is_control() {
                    self.typed.push_back(c);
                }
            }
            InputEvent::ButtonPressed {
                button: MouseButton::Left,
                x,
                y,
            } => {
                self.cursor.down = true;
                self.cursor.x = x;
                self.cursor.y = y;
            }
            InputEvent::ButtonReleased {
                button: MouseButton::Left,
            } => self.cursor.down = false,
            InputEvent::ButtonPressed { .. } | InputEvent::ButtonReleased { .. } => {}
            InputEvent::CursorMoved { x, y } => {
                self.cursor.x = x;
                self.cursor.y = y;
            }
        }
        self.status()
    }

    pub fn status(&self) -> PollStatus {
        if self.quit {
            PollStatus::Quit
        } else {
            PollStatus::Continue
        }
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    /// Next typed character, oldest first.
    pub fn take_key(&mut self) -> Option<char> {
        self.typed.pop_front()
    }

    /// Drops typed characters nobody consumed this frame.
    pub fn clear_keys(&mut self) {
        self.typed.clear();
    }

    /// Starts over, e.g. after the window was reopened.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_and_close_quit() {
        let mut input = InputState::new();
        assert_eq!(input.apply(InputEvent::KeyPressed(Key::Enter)), PollStatus::Continue);
        assert_eq!(input.apply(InputEvent::KeyPressed(Key::Escape)), PollStatus::Quit);

        let mut input = InputState::new();
        assert_eq!(input.apply(InputEvent::CloseRequested), PollStatus::Quit);
    }

    #[test]
    fn only_primary_button_moves_the_down_flag() {
        let mut input = InputState::new();
        input.apply(InputEvent::ButtonPressed {
            button: MouseButton::Right,
            x: 5.0,
            y: 5.0,
        });
        assert!(!input.cursor().down);

        input.apply(InputEvent::ButtonPressed {
            button: MouseButton::Left,
            x: 10.0,
            y: 20.0,
        });
        assert_eq!(
            input.cursor(),
            CursorState {
                x: 10.0,
                y: 20.0,
                down: true
            }
        );

        input.apply(InputEvent::CursorMoved { x: 11.0, y: 21.0 });
        input.apply(InputEvent::ButtonReleased {
            button: MouseButton::Left,
        });
        assert_eq!(input.cursor().position(), Position::new(11.0, 21.0));
        assert!(!input.cursor().down);
    }

    #[test]
    fn typed_keys_queue_in_order() {
        let mut input = InputState::new();
        input.apply(InputEvent::Text('h'));
        input.apply(InputEvent::Text('\r'));
        input.apply(InputEvent::Text('i'));
        input.apply(InputEvent::KeyPressed(Key::Backspace));
        assert_eq!(input.take_key(), Some('h'));
        assert_eq!(input.take_key(), Some('i'));
        assert_eq!(input.take_key(), Some(BACKSPACE));
        assert_eq!(input.take_key(), None);
    }

    #[test]
    fn expose_and_resize_keep_going() {
        let mut input = InputState::new();
        input.apply(InputEvent::CursorMoved { x: 3.0, y: 4.0 });
        assert_eq!(input.apply(InputEvent::Expose), PollStatus::Continue);
        assert_eq!(
            input.apply(InputEvent::Resized(Size::new(640.0, 480.0))),
            PollStatus::Continue
        );
        assert_eq!(input.cursor().position(), Position::new(3.0, 4.0));
        assert_eq!(input.take_key(), None);
    }

    #[test]
    fn every_typed_key_is_kept_until_cleared() {
        let mut input = InputState::new();
        for c in "abc".chars() {
            input.apply(InputEvent::Text(c));
        }
        let typed: String = std::iter::from_fn(|| input.take_key()).collect();
        assert_eq!(typed, "abc");
        input.apply(InputEvent::Text('d'));
        input.clear_keys();
        assert_eq!(input.take_key(), None);
    }
}
