//! DTMF symbols and the per-state digit buffer
//!
//! The buffer accumulates keypad symbols for the active state and resolves them
//! against that state's grammar after every symbol.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grammar::StateGrammar;
use crate::types::MenuAction;

/// DTMF tone definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DtmfTone {
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Star,
    Pound,
    A,
    B,
    C,
    D,
}

impl DtmfTone {
    pub fn to_char(self) -> char {
        match self {
            Self::Digit0 => '0',
            Self::Digit1 => '1',
            Self::Digit2 => '2',
            Self::Digit3 => '3',
            Self::Digit4 => '4',
            Self::Digit5 => '5',
            Self::Digit6 => '6',
            Self::Digit7 => '7',
            Self::Digit8 => '8',
            Self::Digit9 => '9',
            Self::Star => '*',
            Self::Pound => '#',
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Digit0),
            '1' => Some(Self::Digit1),
            '2' => Some(Self::Digit2),
            '3' => Some(Self::Digit3),
            '4' => Some(Self::Digit4),
            '5' => Some(Self::Digit5),
            '6' => Some(Self::Digit6),
            '7' => Some(Self::Digit7),
            '8' => Some(Self::Digit8),
            '9' => Some(Self::Digit9),
            '*' => Some(Self::Star),
            '#' => Some(Self::Pound),
            'A' | 'a' => Some(Self::A),
            'B' | 'b' => Some(Self::B),
            'C' | 'c' => Some(Self::C),
            'D' | 'd' => Some(Self::D),
            _ => None,
        }
    }

    /// Parse a whole sequence, skipping characters that are not DTMF symbols.
    pub fn sequence(digits: &str) -> Vec<Self> {
        digits.chars().filter_map(Self::from_char).collect()
    }
}

impl fmt::Display for DtmfTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// An action resolved from buffered input, with the buffer content as argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAction {
    pub action: MenuAction,
    pub argument: String,
}

/// What happened to a received symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeypadOutcome {
    /// The state has no grammar; the symbol was not buffered
    Dropped,
    /// Buffered, nothing resolved yet
    Buffered,
    /// An action resolved; the buffer has been cleared
    Resolved(ResolvedAction),
}

#[derive(Debug, Clone, Default)]
pub struct DigitBuffer {
    digits: String,
}

impl DigitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `tone` and try to resolve the whole buffer against `grammar`.
    ///
    /// On resolution the buffer is emptied before the action is returned, so the
    /// caller always executes the action against a clean buffer.
    pub fn push(&mut self, tone: DtmfTone, grammar: Option<&StateGrammar>) -> KeypadOutcome {
        let Some(grammar) = grammar else {
            return KeypadOutcome::Dropped;
        };

        self.digits.push(tone.to_char());
        match grammar.resolve(&self.digits) {
            Some(action) => KeypadOutcome::Resolved(ResolvedAction {
                action,
                argument: std::mem::take(&mut self.digits),
            }),
            None => KeypadOutcome::Buffered,
        }
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }
}
