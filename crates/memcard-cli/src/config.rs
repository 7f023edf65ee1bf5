use anyhow::Context;
use clap::Args;
use memcard_chunk::{ChunkConfig, SizeUnit, UnitKind, DEFAULT_TURN_PATTERN};
use memcard_store::ProjectPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project settings stored in `memcard.json`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input: String,
    pub chunks_dir: String,
    pub records_dir: String,
    pub schema: String,
    pub unit: UnitKind,
    pub size_unit: SizeUnit,
    pub max_size: usize,
    pub turn_pattern: String,
    pub report_unfilled_optional: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: "input/raw_chat.txt".into(),
            chunks_dir: "chunks".into(),
            records_dir: "output/chapters".into(),
            schema: "schema.yaml".into(),
            unit: UnitKind::Turn,
            size_unit: SizeUnit::Units,
            max_size: 10,
            turn_pattern: DEFAULT_TURN_PATTERN.into(),
            report_unfilled_optional: false,
        }
    }
}

impl Config {
    /// Defaults overlaid with `memcard.json`, if present.
    pub fn load(paths: &ProjectPaths) -> anyhow::Result<Self> {
        let map = read_config(&paths.config_json)?;
        Self::from_map(map).with_context(|| format!("invalid {}", paths.config_json.display()))
    }

    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> anyhow::Result<Self> {
        Ok(serde_json::from_value(serde_json::Value::Object(map))?)
    }

    pub fn chunk_config(&self) -> anyhow::Result<ChunkConfig> {
        ChunkConfig::new(self.unit, self.size_unit, self.max_size, &self.turn_pattern)
            .context("invalid chunking configuration")
    }

    pub fn resolved(&self, paths: &ProjectPaths) -> ResolvedPaths {
        ResolvedPaths {
            input: paths.resolve(&self.input),
            chunks_dir: paths.resolve(&self.chunks_dir),
            records_dir: paths.resolve(&self.records_dir),
            schema: paths.resolve(&self.schema),
        }
    }
}

/// Configured locations made absolute against the project root.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub input: PathBuf,
    pub chunks_dir: PathBuf,
    pub records_dir: PathBuf,
    pub schema: PathBuf,
}

/// Per-invocation overrides of `memcard.json`.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Schema file
    #[arg(long)]
    pub schema: Option<String>,
    /// Directory holding ch_NNNN.txt chunk files
    #[arg(long)]
    pub chunks_dir: Option<String>,
    /// Directory holding ch_NNNN.yaml record files
    #[arg(long)]
    pub records_dir: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(v) = &self.schema {
            config.schema = v.clone();
        }
        if let Some(v) = &self.chunks_dir {
            config.chunks_dir = v.clone();
        }
        if let Some(v) = &self.records_dir {
            config.records_dir = v.clone();
        }
    }
}

/// Chunking overrides, only meaningful for `split`.
#[derive(Debug, Clone, Default, Args)]
pub struct ChunkOverrides {
    /// Transcript file
    #[arg(long)]
    pub input: Option<String>,
    /// Atomic unit a chunk boundary never splits: line or turn
    #[arg(long)]
    pub unit: Option<UnitKind>,
    /// What --max-size counts: chars, lines, or units
    #[arg(long)]
    pub size_unit: Option<SizeUnit>,
    /// Maximum chunk size in --size-unit
    #[arg(long)]
    pub max_size: Option<usize>,
    /// Regex matching the first line of a speaker turn
    #[arg(long)]
    pub turn_pattern: Option<String>,
}

impl ChunkOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(v) = &self.input {
            config.input = v.clone();
        }
        if let Some(v) = self.unit {
            config.unit = v;
        }
        if let Some(v) = self.size_unit {
            config.size_unit = v;
        }
        if let Some(v) = self.max_size {
            config.max_size = v;
        }
        if let Some(v) = &self.turn_pattern {
            config.turn_pattern = v.clone();
        }
    }
}

/// Read `memcard.json`. Returns an empty map if the file doesn't exist.
pub fn read_config(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let val: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} must contain a JSON object", path.display()),
    }
}

/// Write `memcard.json` atomically.
pub fn write_config(
    path: &Path,
    config: &serde_json::Map<String, serde_json::Value>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&config)?;
    memcard_store::write_atomic(path, json.as_bytes())
        .with_context(|| format!("writing {}", path.display()))
}

/// Parse a string value into an appropriate JSON value (bool/number/string).
pub fn parse_value(s: &str) -> serde_json::Value {
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<u64>() {
                serde_json::Value::Number(n.into())
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}
