use crate::error::InputError;
use crate::turn::{split_units, TurnPattern};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a chunk boundary may never split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Line,
    #[default]
    Turn,
}

/// What `max_size` counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeUnit {
    Chars,
    Lines,
    /// Whole atomic units (lines or turns).
    #[default]
    Units,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Line => "line",
            UnitKind::Turn => "turn",
        }
    }
}

impl SizeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeUnit::Chars => "chars",
            SizeUnit::Lines => "lines",
            SizeUnit::Units => "units",
        }
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(UnitKind::Line),
            "turn" => Ok(UnitKind::Turn),
            other => Err(format!("unknown unit \"{other}\" (expected line, turn)")),
        }
    }
}

impl FromStr for SizeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chars" => Ok(SizeUnit::Chars),
            "lines" => Ok(SizeUnit::Lines),
            "units" => Ok(SizeUnit::Units),
            other => Err(format!(
                "unknown size unit \"{other}\" (expected chars, lines, units)"
            )),
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub unit: UnitKind,
    pub size_unit: SizeUnit,
    pub max_size: usize,
    pub turn_pattern: TurnPattern,
}

impl ChunkConfig {
    pub fn new(
        unit: UnitKind,
        size_unit: SizeUnit,
        max_size: usize,
        turn_pattern: &str,
    ) -> Result<Self, InputError> {
        if max_size == 0 {
            return Err(InputError::ZeroMaxSize);
        }
        Ok(Self {
            unit,
            size_unit,
            max_size,
            turn_pattern: TurnPattern::new(turn_pattern)?,
        })
    }
}

/// A contiguous slice of the transcript. `index` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: u32,
    pub text: String,
}

impl Chunk {
    pub fn id(&self) -> String {
        memcard_store::record_id(self.index)
    }
}

/// A chunk holding a single unit larger than `max_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OversizedChunk {
    pub index: u32,
    pub size: usize,
    pub max_size: usize,
}

/// Outcome of chunking: chunks already on disk are kept, new ones follow them.
#[derive(Debug, Clone, Default)]
pub struct ChunkPlan {
    pub kept: usize,
    pub new_chunks: Vec<Chunk>,
    pub warnings: Vec<OversizedChunk>,
    /// Set when the last kept chunk ends inside a unit that the appended text
    /// continues. Kept chunks are never rewritten, so that unit now spans two chunks.
    pub forced_split: Option<ForcedSplit>,
}

/// A unit cut between the last kept chunk and the first new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForcedSplit {
    /// The kept chunk holding the start of the unit.
    pub index: u32,
    /// Byte offset in the transcript where the cut falls.
    pub offset: usize,
}

pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Size of one unit in the configured size unit.
    pub fn measure(&self, unit: &str) -> usize {
        match self.config.size_unit {
            SizeUnit::Chars => unit.chars().count(),
            SizeUnit::Lines => unit.split_inclusive('\n').count(),
            SizeUnit::Units => 1,
        }
    }

    /// Chunk the part of `transcript` not yet covered by `existing`.
    ///
    /// `existing` must be numbered 1..=n without gaps and its concatenation must
    /// be a prefix of `transcript`. Existing chunks are never renumbered.
    pub fn plan(&self, transcript: &str, existing: &[Chunk]) -> Result<ChunkPlan, InputError> {
        let mut offset = 0;
        for (i, chunk) in existing.iter().enumerate() {
            let expected = i as u32 + 1;
            if chunk.index != expected {
                return Err(InputError::Gap {
                    expected,
                    found: chunk.index,
                });
            }
            if !transcript[offset..].starts_with(chunk.text.as_str()) {
                return Err(InputError::Diverged { index: chunk.index });
            }
            offset += chunk.text.len();
        }

        let mut plan = self.chunk(&transcript[offset..], existing.len() as u32 + 1);
        plan.kept = existing.len();
        if let Some(last) = existing.last() {
            if offset < transcript.len() && !self.is_unit_boundary(transcript, offset) {
                tracing::warn!(
                    chunk = %last.id(),
                    offset,
                    "appended text continues the last unit of a kept chunk; unit split across chunks"
                );
                plan.forced_split = Some(ForcedSplit {
                    index: last.index,
                    offset,
                });
            }
        }
        Ok(plan)
    }

    fn unit_pattern(&self) -> Option<&TurnPattern> {
        match self.config.unit {
            UnitKind::Line => None,
            UnitKind::Turn => Some(&self.config.turn_pattern),
        }
    }

    /// Whether a unit of `text` starts at byte `offset`.
    fn is_unit_boundary(&self, text: &str, offset: usize) -> bool {
        let mut pos = 0;
        for unit in split_units(text, self.unit_pattern()) {
            if pos >= offset {
                break;
            }
            pos += unit.len();
        }
        pos == offset
    }

    /// Chunk `text` from scratch, numbering from `first_index`.
    pub fn chunk(&self, text: &str, first_index: u32) -> ChunkPlan {
        let pattern = self.unit_pattern();
        let max = self.config.max_size;

        let mut plan = ChunkPlan::default();
        let mut current = String::new();
        let mut current_size = 0;
        let mut index = first_index;

        for unit in split_units(text, pattern) {
            let size = self.measure(unit);
            if !current.is_empty() && current_size + size > max {
                plan.new_chunks.push(Chunk {
                    index,
                    text: std::mem::take(&mut current),
                });
                index += 1;
                current_size = 0;
            }
            if size > max {
                tracing::warn!(
                    chunk = %memcard_store::record_id(index),
                    size,
                    max_size = max,
                    unit = %self.config.size_unit,
                    "single unit exceeds max_size; emitting oversized chunk"
                );
                plan.warnings.push(OversizedChunk {
                    index,
                    size,
                    max_size: max,
                });
            }
            current.push_str(unit);
            current_size += size;
        }
        if !current.is_empty() {
            plan.new_chunks.push(Chunk {
                index,
                text: current,
            });
        }
        plan
    }
}
