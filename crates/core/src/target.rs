use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A tracked terminal target: one window of one multiplexer session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    pub session: String,
    pub window: u32,
}

impl Target {
    pub fn new(session: impl Into<String>, window: u32) -> Self {
        Self {
            session: session.into(),
            window,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.session, self.window)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetParseError {
    #[error("target is empty")]
    Empty,

    #[error("target session name is empty: {0}")]
    EmptySession(String),

    #[error("invalid window index in target: {0}")]
    InvalidWindow(String),
}

impl FromStr for Target {
    type Err = TargetParseError;

    /// Accepts `session:window` or a bare `session` (window 0).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetParseError::Empty);
        }
        let (session, window) = match s.rsplit_once(':') {
            Some((session, window)) => {
                let window = window
                    .parse::<u32>()
                    .map_err(|_| TargetParseError::InvalidWindow(s.to_string()))?;
                (session, window)
            }
            None => (s, 0),
        };
        if session.is_empty() {
            return Err(TargetParseError::EmptySession(s.to_string()));
        }
        Ok(Self::new(session, window))
    }
}

/// Named control keys a client may send instead of literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKey {
    Interrupt,
    Eof,
    Clear,
    Suspend,
    Escape,
    Tab,
    Enter,
    Up,
    Down,
    Left,
    Right,
}

impl ControlKey {
    pub const ALL: [ControlKey; 11] = [
        Self::Interrupt,
        Self::Eof,
        Self::Clear,
        Self::Suspend,
        Self::Escape,
        Self::Tab,
        Self::Enter,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
    ];

    /// Key name as understood by `tmux send-keys`.
    pub fn tmux_name(self) -> &'static str {
        match self {
            Self::Interrupt => "C-c",
            Self::Eof => "C-d",
            Self::Clear => "C-l",
            Self::Suspend => "C-z",
            Self::Escape => "Escape",
            Self::Tab => "Tab",
            Self::Enter => "Enter",
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("key not allowed: {0}")]
pub struct KeyParseError(pub String);

impl FromStr for ControlKey {
    type Err = KeyParseError;

    /// Accepts friendly names (`interrupt`, `esc`) and tmux names (`C-c`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s.trim().to_ascii_lowercase().as_str() {
            "interrupt" | "c-c" | "ctrl-c" => Self::Interrupt,
            "eof" | "c-d" | "ctrl-d" => Self::Eof,
            "clear" | "c-l" | "ctrl-l" => Self::Clear,
            "suspend" | "c-z" | "ctrl-z" => Self::Suspend,
            "escape" | "esc" => Self::Escape,
            "tab" => Self::Tab,
            "enter" | "return" => Self::Enter,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            _ => return Err(KeyParseError(s.to_string())),
        };
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_session_and_window() {
        let target: Target = "mobile:3".parse().unwrap();
        assert_eq!(target, Target::new("mobile", 3));
        assert_eq!(target.to_string(), "mobile:3");
    }

    #[test]
    fn bare_session_defaults_to_window_zero() {
        let target: Target = "work".parse().unwrap();
        assert_eq!(target, Target::new("work", 0));
    }

    #[test]
    fn session_names_may_contain_colons() {
        let target: Target = "a:b:1".parse().unwrap();
        assert_eq!(target.session, "a:b");
        assert_eq!(target.window, 1);
    }

    #[test]
    fn rejects_bad_targets() {
        assert_eq!("".parse::<Target>(), Err(TargetParseError::Empty));
        assert!(matches!(
            ":1".parse::<Target>(),
            Err(TargetParseError::EmptySession(_))
        ));
        assert!(matches!(
            "mobile:x".parse::<Target>(),
            Err(TargetParseError::InvalidWindow(_))
        ));
    }

    #[test]
    fn keys_accept_friendly_and_tmux_names() {
        assert_eq!("C-c".parse::<ControlKey>(), Ok(ControlKey::Interrupt));
        assert_eq!("esc".parse::<ControlKey>(), Ok(ControlKey::Escape));
        assert_eq!("Return".parse::<ControlKey>(), Ok(ControlKey::Enter));
        for key in ControlKey::ALL {
            assert_eq!(key.tmux_name().parse::<ControlKey>(), Ok(key));
        }
    }

    #[test]
    fn keys_outside_allow_list_are_rejected() {
        assert_eq!(
            "C-x".parse::<ControlKey>(),
            Err(KeyParseError("C-x".to_string()))
        );
    }
}
