mod record;

pub use record::{read_record, write_record, RecordError};

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Prefix shared by chunk and record file names (`ch_0001.txt`, `ch_0001.yaml`).
pub const FILE_PREFIX: &str = "ch_";
pub const CHUNK_EXT: &str = "txt";
pub const RECORD_EXT: &str = "yaml";

/// Well-known paths of a memcard project. Pure computation, no I/O.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub config_json: PathBuf,
}

impl ProjectPaths {
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_json: root.join("memcard.json"),
            root,
        }
    }

    /// Resolve a configured path against the project root. Absolute paths pass through.
    pub fn resolve(&self, configured: impl AsRef<Path>) -> PathBuf {
        let p = configured.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}

/// `ch_0007.txt` for index 7.
pub fn chunk_file_name(index: u32) -> String {
    indexed_name(index, CHUNK_EXT)
}

/// `ch_0007.yaml` for index 7.
pub fn record_file_name(index: u32) -> String {
    indexed_name(index, RECORD_EXT)
}

/// Record identifier shown in reports (`ch_0007`).
pub fn record_id(index: u32) -> String {
    format!("{FILE_PREFIX}{index:04}")
}

fn indexed_name(index: u32, ext: &str) -> String {
    format!("{FILE_PREFIX}{index:04}.{ext}")
}

/// Parse the index out of `ch_NNNN.<ext>`. Returns None for foreign names and index 0.
pub fn parse_index(file_name: &str, ext: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(ext)?
        .strip_suffix('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|&i| i > 0)
}

/// List `ch_NNNN.<ext>` files in `dir`, sorted by index.
/// A missing directory yields an empty list.
pub fn list_indexed(dir: &Path, ext: &str) -> io::Result<Vec<(u32, PathBuf)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        match parse_index(&name.to_string_lossy(), ext) {
            Some(index) => out.push((index, entry.path())),
            None => tracing::debug!(file = %name.to_string_lossy(), "ignoring unindexed file"),
        }
    }
    out.sort_by_key(|(index, _)| *index);
    Ok(out)
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no parent dir for {}", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
