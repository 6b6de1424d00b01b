//! Event DSL parser for headless mode.
//!
//! Parses event strings like "key:enter", "type:List all students",
//! "wait:100ms" into executable events.

use super::HeadlessState;
use crate::error::{DataQuestError, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

/// Named keys accepted after `key:`. The first name for a code is the one
/// printed back.
const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("enter", KeyCode::Enter),
    ("return", KeyCode::Enter),
    ("esc", KeyCode::Esc),
    ("escape", KeyCode::Esc),
    ("tab", KeyCode::Tab),
    ("backtab", KeyCode::BackTab),
    ("backspace", KeyCode::Backspace),
    ("bs", KeyCode::Backspace),
    ("delete", KeyCode::Delete),
    ("del", KeyCode::Delete),
    ("up", KeyCode::Up),
    ("down", KeyCode::Down),
    ("left", KeyCode::Left),
    ("right", KeyCode::Right),
    ("home", KeyCode::Home),
    ("end", KeyCode::End),
    ("pageup", KeyCode::PageUp),
    ("pgup", KeyCode::PageUp),
    ("pagedown", KeyCode::PageDown),
    ("pgdn", KeyCode::PageDown),
    ("space", KeyCode::Char(' ')),
];

/// Comparison used by state assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

impl CompareOp {
    /// Longest operators first so ">=" is not read as ">".
    const ALL: [(&'static str, CompareOp); 5] = [
        (">=", Self::Ge),
        ("<=", Self::Le),
        (">", Self::Gt),
        ("<", Self::Lt),
        ("=", Self::Eq),
    ];

    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering.is_eq(),
            Self::Ge => ordering.is_ge(),
            Self::Le => ordering.is_le(),
            Self::Gt => ordering.is_gt(),
            Self::Lt => ordering.is_lt(),
        }
    }
}

/// An assertion to check against the screen or state.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    /// Screen contains text (case-insensitive).
    Contains(String),
    /// Screen contains text (case-sensitive).
    ContainsExact(String),
    NotContains(String),
    /// Screen matches regex pattern.
    Matches(String),
    /// State field compared against a value.
    State {
        field: String,
        op: CompareOp,
        value: String,
    },
}

impl Assertion {
    /// Checks the assertion against the screen and app state.
    pub fn check(&self, screen: &str, state: &HeadlessState) -> bool {
        match self {
            Self::Contains(text) => screen.to_lowercase().contains(&text.to_lowercase()),
            Self::ContainsExact(text) => screen.contains(text),
            Self::NotContains(text) => !screen.to_lowercase().contains(&text.to_lowercase()),
            Self::Matches(pattern) => {
                regex::Regex::new(pattern).is_ok_and(|re| re.is_match(screen))
            }
            Self::State { field, op, value } => state
                .field(field)
                .is_some_and(|actual| compare(&actual, *op, value)),
        }
    }
}

/// Integers compare numerically; anything else only supports `=`.
fn compare(actual: &str, op: CompareOp, expected: &str) -> bool {
    match (actual.parse::<i64>(), expected.parse::<i64>()) {
        (Ok(a), Ok(e)) => op.holds(a.cmp(&e)),
        _ => op == CompareOp::Eq && actual == expected,
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(t) => write!(f, "contains:{t}"),
            Self::ContainsExact(t) => write!(f, "contains-exact:{t}"),
            Self::NotContains(t) => write!(f, "not-contains:{t}"),
            Self::Matches(p) => write!(f, "matches:{p}"),
            Self::State { field, op, value } => {
                write!(f, "state:{field}{}{value}", op.symbol())
            }
        }
    }
}

/// A parsed event that can be executed.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    /// Type text into the focused field.
    Type(String),
    Wait(Duration),
    Resize(u16, u16),
    /// Capture a named frame.
    Snapshot(String),
    Assert(Assertion),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "key:{}", describe_key(key)),
            Self::Type(text) => write!(f, "type:{text}"),
            Self::Wait(d) => write!(f, "wait:{}ms", d.as_millis()),
            Self::Resize(w, h) => write!(f, "resize:{w}x{h}"),
            Self::Snapshot(name) => write!(f, "snapshot:{name}"),
            Self::Assert(assertion) => write!(f, "assert:{assertion}"),
        }
    }
}

/// Renders a key back into DSL form, e.g. "ctrl+e" or "shift+tab".
fn describe_key(key: &KeyEvent) -> String {
    let mut parts: Vec<String> = [
        (KeyModifiers::CONTROL, "ctrl"),
        (KeyModifiers::ALT, "alt"),
        (KeyModifiers::SHIFT, "shift"),
    ]
    .into_iter()
    .filter(|(m, _)| key.modifiers.contains(*m))
    .map(|(_, name)| name.to_string())
    .collect();

    let name = match key.code {
        KeyCode::BackTab => {
            if !parts.iter().any(|p| p == "shift") {
                parts.push("shift".to_string());
            }
            "tab".to_string()
        }
        KeyCode::Char(c) => c.to_string(),
        KeyCode::F(n) => format!("f{n}"),
        code => NAMED_KEYS
            .iter()
            .find(|(_, k)| *k == code)
            .map_or_else(|| format!("{code:?}").to_lowercase(), |(n, _)| n.to_string()),
    };
    parts.push(name);
    parts.join("+")
}

/// Parser for the event DSL.
#[derive(Debug, Default)]
pub struct EventParser;

impl EventParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a whole script or `--events` string.
    ///
    /// Events are separated by newlines or commas. In multi-line scripts a
    /// `type:` or `assert:` line is taken whole, so SQL with commas can be
    /// typed and checked. Blank lines and `#` comments are skipped.
    pub fn parse_all(&self, input: &str) -> Result<Vec<Event>> {
        let multi_line = input.contains('\n');
        let mut events = Vec::new();

        for line in input.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let lower = line.to_lowercase();
            if multi_line && (lower.starts_with("type:") || lower.starts_with("assert:")) {
                events.push(self.parse_one(line)?);
                continue;
            }

            for part in line.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                events.push(self.parse_one(part)?);
            }
        }

        Ok(events)
    }

    /// Parses a single `kind:value` event.
    pub fn parse_one(&self, input: &str) -> Result<Event> {
        let input = input.trim();
        let Some((kind, value)) = input.split_once(':') else {
            return Err(DataQuestError::config(format!(
                "Invalid event syntax: '{input}'. Expected format: type:value"
            )));
        };
        let value = value.trim();

        match kind.trim().to_lowercase().as_str() {
            "key" => parse_key(value).map(Event::Key),
            "type" => Ok(Event::Type(value.to_string())),
            "wait" => parse_duration(value).map(Event::Wait),
            "resize" => parse_size(value).map(|(w, h)| Event::Resize(w, h)),
            "snapshot" => Ok(Event::Snapshot(value.to_string())),
            "assert" => parse_assertion(value).map(Event::Assert),
            other => Err(DataQuestError::config(format!(
                "Unknown event type: '{other}'. Valid types: key, type, wait, resize, snapshot, assert"
            ))),
        }
    }
}

/// Parses "enter", "ctrl+e", "shift+tab", "f5", or a single character.
fn parse_key(value: &str) -> Result<KeyEvent> {
    let (mods, key) = match value.rsplit_once('+') {
        // A trailing '+' is the plus key itself, as in "ctrl++"
        Some((mods, "")) => (mods.strip_suffix('+').unwrap_or(mods), "+"),
        Some((mods, key)) => (mods, key),
        None => ("", value),
    };

    let mut modifiers = KeyModifiers::NONE;
    for name in mods.split('+').filter(|m| !m.is_empty()) {
        modifiers |= match name.to_lowercase().as_str() {
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "alt" => KeyModifiers::ALT,
            "shift" => KeyModifiers::SHIFT,
            _ => {
                return Err(DataQuestError::config(format!(
                    "Unknown modifier: '{name}'. Valid modifiers: ctrl, alt, shift"
                )))
            }
        };
    }

    let code = match parse_key_code(key)? {
        KeyCode::Tab if modifiers.contains(KeyModifiers::SHIFT) => KeyCode::BackTab,
        code => code,
    };

    Ok(KeyEvent::new(code, modifiers))
}

fn parse_key_code(name: &str) -> Result<KeyCode> {
    let lower = name.to_lowercase();

    if let Some((_, code)) = NAMED_KEYS.iter().find(|(n, _)| *n == lower) {
        return Ok(*code);
    }

    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Ok(KeyCode::F(n));
        }
    }

    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(KeyCode::Char(c)),
        _ => Err(DataQuestError::config(format!(
            "Unknown key: '{name}'. Use a single character or a named key like enter, tab, f5"
        ))),
    }
}

/// Parses "100ms", "2s", or a bare number of milliseconds.
fn parse_duration(value: &str) -> Result<Duration> {
    let lower = value.to_lowercase();
    let invalid = || DataQuestError::config(format!("Invalid duration: '{value}'"));

    let (digits, unit_ms) = if let Some(ms) = lower.strip_suffix("ms") {
        (ms, 1)
    } else if let Some(secs) = lower.strip_suffix('s') {
        (secs, 1000)
    } else {
        (lower.as_str(), 1)
    };

    let count: u64 = digits.trim().parse().map_err(|_| invalid())?;
    Ok(Duration::from_millis(count.saturating_mul(unit_ms)))
}

/// Parses "120x40".
fn parse_size(value: &str) -> Result<(u16, u16)> {
    let invalid = || {
        DataQuestError::config(format!(
            "Invalid resize format: '{value}'. Expected WIDTHxHEIGHT"
        ))
    };
    let (w, h) = value.split_once('x').ok_or_else(invalid)?;
    Ok((
        w.trim().parse().map_err(|_| invalid())?,
        h.trim().parse().map_err(|_| invalid())?,
    ))
}

/// Parses the part after `assert:`, e.g. "contains:Query Results" or
/// "state:row_count>=2".
fn parse_assertion(value: &str) -> Result<Assertion> {
    let Some((kind, rest)) = value.split_once(':') else {
        return Err(DataQuestError::config(format!(
            "Invalid assertion syntax: '{value}'. Expected assert:type:value"
        )));
    };
    let rest = rest.trim();

    let assertion = match kind.trim().to_lowercase().as_str() {
        "contains" => Assertion::Contains(rest.to_string()),
        "contains-exact" => Assertion::ContainsExact(rest.to_string()),
        "not-contains" => Assertion::NotContains(rest.to_string()),
        "matches" => Assertion::Matches(rest.to_string()),
        "state" => parse_state_assertion(rest)?,
        other => {
            return Err(DataQuestError::config(format!(
                "Unknown assertion type: '{other}'. Valid types: contains, contains-exact, not-contains, matches, state"
            )))
        }
    };

    Ok(assertion)
}

/// Splits "field<op>value" at the first operator in the field name.
fn parse_state_assertion(value: &str) -> Result<Assertion> {
    let split = value
        .find(['=', '<', '>'])
        .and_then(|pos| {
            let tail = &value[pos..];
            CompareOp::ALL
                .iter()
                .find(|(symbol, _)| tail.starts_with(symbol))
                .map(|(symbol, op)| (pos, symbol.len(), *op))
        });

    let Some((pos, len, op)) = split else {
        return Err(DataQuestError::config(format!(
            "Invalid state assertion: '{value}'. Expected field=value or field>=value"
        )));
    };

    Ok(Assertion::State {
        field: value[..pos].trim().to_string(),
        op,
        value: value[pos + len..].trim().to_string(),
    })
}
