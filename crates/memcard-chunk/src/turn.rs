use regex::Regex;

/// `[2024-05-01 21:03:00] Speaker: text`
pub const DEFAULT_TURN_PATTERN: &str =
    r"^\[(20\d{2}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})\]\s*(.+?):\s*(.*)$";

/// Recognizes the first line of a speaker turn.
///
/// Capture group 1 is the timestamp and group 2 the speaker; patterns without
/// them still split turns but yield empty headers.
#[derive(Debug, Clone)]
pub struct TurnPattern {
    regex: Regex,
}

impl TurnPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_turn_start(&self, line: &str) -> bool {
        self.regex.is_match(strip_eol(line))
    }

    fn header(&self, line: &str) -> Option<TurnHeader> {
        let caps = self.regex.captures(strip_eol(line))?;
        let group = |i| caps.get(i).map_or("", |m| m.as_str()).trim().to_string();
        Some(TurnHeader {
            timestamp: group(1),
            speaker: group(2),
        })
    }
}

/// Header line of one speaker turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnHeader {
    /// `YYYY-MM-DD HH:MM:SS` with the default pattern.
    pub timestamp: String,
    pub speaker: String,
}

/// Turn headers found in `text`, in order.
pub fn parse_turn_headers(text: &str, pattern: &TurnPattern) -> Vec<TurnHeader> {
    text.split_inclusive('\n')
        .filter_map(|line| pattern.header(line))
        .collect()
}

/// Split `text` into atomic units without losing a byte.
///
/// With no pattern every line (terminator included) is a unit. With a pattern
/// each unit runs from one turn start to the next; text before the first turn
/// start is a unit of its own.
pub fn split_units<'a>(text: &'a str, pattern: Option<&TurnPattern>) -> Vec<&'a str> {
    let Some(pattern) = pattern else {
        return text.split_inclusive('\n').collect();
    };

    let mut units = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    for line in text.split_inclusive('\n') {
        if pos > start && pattern.is_turn_start(line) {
            units.push(&text[start..pos]);
            start = pos;
        }
        pos += line.len();
    }
    if pos > start {
        units.push(&text[start..pos]);
    }
    units
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}
