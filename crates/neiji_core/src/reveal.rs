//! crates/neiji_core/src/reveal.rs
//!
//! The typewriter reveal of an assistant message, as a pure state machine.
//! Timers live with whoever drives it; this type only knows what to show.

use crate::domain::Message;

/// What a view should render for a message at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealFrame {
    pub text: String,
    pub cursor_visible: bool,
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub struct RevealState {
    chars: Vec<char>,
    index: usize,
    cursor_visible: bool,
    complete: bool,
}

impl RevealState {
    /// Starts a reveal from the first character, cursor shown.
    pub fn new(content: &str) -> Self {
        Self {
            chars: content.chars().collect(),
            index: 0,
            cursor_visible: true,
            complete: false,
        }
    }

    /// A reveal that is already over: full text, no cursor.
    pub fn settled(content: &str) -> Self {
        let chars: Vec<char> = content.chars().collect();
        Self {
            index: chars.len() + 1,
            chars,
            cursor_visible: false,
            complete: true,
        }
    }

    /// Chooses between [`RevealState::new`] and [`RevealState::settled`].
    pub fn for_message(message: &Message) -> Self {
        if message.is_animating() {
            Self::new(message.display_text())
        } else {
            Self::settled(message.display_text())
        }
    }

    /// Advances one character. Returns `None` once the whole text was shown.
    pub fn tick(&mut self) -> Option<RevealFrame> {
        if self.complete {
            return None;
        }
        if self.index <= self.chars.len() {
            let frame = self.prefix_frame(self.index);
            self.index += 1;
            Some(frame)
        } else {
            self.complete = true;
            self.cursor_visible = false;
            None
        }
    }

    /// Toggles the cursor glyph while the reveal is running.
    pub fn blink(&mut self) -> Option<RevealFrame> {
        if self.complete {
            return None;
        }
        self.cursor_visible = !self.cursor_visible;
        Some(self.prefix_frame(self.index.saturating_sub(1)))
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The frame for the current position.
    pub fn frame(&self) -> RevealFrame {
        if self.complete {
            RevealFrame {
                text: self.chars.iter().collect(),
                cursor_visible: false,
                complete: true,
            }
        } else {
            self.prefix_frame(self.index.saturating_sub(1))
        }
    }

    fn prefix_frame(&self, shown: usize) -> RevealFrame {
        RevealFrame {
            text: self.chars[..shown.min(self.chars.len())].iter().collect(),
            cursor_visible: self.cursor_visible,
            complete: false,
        }
    }
}
