//! Keyboard shortcuts for the hosts.
//!
//! Keys are stored as characters; Enter is `'\r'`, Escape is `'\u{1b}'`.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::region::RegionColor;
use crate::session::Command;

pub const ENTER: char = '\r';
pub const ESCAPE: char = '\u{1b}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Lock,
    Unlock,
    Commit,
    Undo,
    Color(RegionColor),
    DeleteNearLast,
    Quit,
}

impl KeyAction {
    pub fn command(self) -> Command {
        match self {
            KeyAction::Lock => Command::Lock,
            KeyAction::Unlock => Command::Unlock,
            KeyAction::Commit => Command::Commit,
            KeyAction::Undo => Command::Undo,
            KeyAction::Color(color) => Command::SetColor(color),
            KeyAction::DeleteNearLast => Command::DeleteNearLast,
            KeyAction::Quit => Command::Stop,
        }
    }
}

impl FromStr for KeyAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "lock" => KeyAction::Lock,
            "unlock" => KeyAction::Unlock,
            "commit" => KeyAction::Commit,
            "undo" => KeyAction::Undo,
            "delete" => KeyAction::DeleteNearLast,
            "quit" => KeyAction::Quit,
            other => KeyAction::Color(
                other
                    .parse()
                    .map_err(|_| Error::Keymap(s.to_string()))?,
            ),
        })
    }
}

/// Parses a key name: a single character, `enter`, `space` or `esc`.
pub fn parse_key(name: &str) -> Result<char> {
    match name.to_ascii_lowercase().as_str() {
        "enter" | "return" => Ok(ENTER),
        "space" => Ok(' '),
        "esc" | "escape" => Ok(ESCAPE),
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c.to_ascii_lowercase()),
                _ => Err(Error::Keymap(name.to_string())),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: BTreeMap<char, KeyAction>,
}

impl Default for Keymap {
    fn default() -> Self {
        let bindings = [
            ('u', KeyAction::Lock),
            ('e', KeyAction::Unlock),
            (ENTER, KeyAction::Commit),
            (' ', KeyAction::Commit),
            ('d', KeyAction::Undo),
            ('l', KeyAction::Color(RegionColor::Green)),
            ('b', KeyAction::Color(RegionColor::Blue)),
            ('r', KeyAction::Color(RegionColor::Red)),
            ('o', KeyAction::Color(RegionColor::Orange)),
            ('p', KeyAction::Color(RegionColor::Purple)),
            ('t', KeyAction::DeleteNearLast),
            ('q', KeyAction::Quit),
            (ESCAPE, KeyAction::Quit),
        ];
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }
}

impl Keymap {
    pub fn bind(&mut self, key: char, action: KeyAction) {
        self.bindings.insert(key, action);
    }

    pub fn unbind(&mut self, key: char) {
        self.bindings.remove(&key);
    }

    pub fn lookup(&self, key: char) -> Option<Command> {
        self.bindings.get(&key).map(|action| action.command())
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, KeyAction)> + '_ {
        self.bindings.iter().map(|(&k, &a)| (k, a))
    }

    /// Maps a `highgui::wait_key` code. `-1` means no key was pressed.
    pub fn from_wait_key(&self, code: i32) -> Option<Command> {
        if code < 0 {
            return None;
        }
        let key = match (code & 0xFF) as u8 {
            b'\n' => ENTER,
            byte => (byte as char).to_ascii_lowercase(),
        };
        self.lookup(key)
    }
}
