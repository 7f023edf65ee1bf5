use crate::chunker::{Chunk, Chunker, ForcedSplit, OversizedChunk};
use crate::error::{ChunkError, InputError};
use memcard_store::{chunk_file_name, list_indexed, write_atomic, CHUNK_EXT};
use std::io;
use std::path::{Path, PathBuf};

/// Read the whole transcript. Missing, empty, or non-UTF-8 input is an `InputError`.
pub fn read_transcript(path: &Path) -> Result<String, ChunkError> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(InputError::Missing {
                path: path.to_path_buf(),
            }
            .into())
        }
        Err(source) => {
            return Err(ChunkError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let text = String::from_utf8(bytes).map_err(|_| InputError::NotUtf8 {
        path: path.to_path_buf(),
    })?;
    if text.trim().is_empty() {
        return Err(InputError::Empty {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(text)
}

/// Load every `ch_NNNN.txt` in `dir`, in index order.
pub fn load_chunks(dir: &Path) -> Result<Vec<Chunk>, ChunkError> {
    let listed = list_indexed(dir, CHUNK_EXT).map_err(|source| ChunkError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut chunks = Vec::with_capacity(listed.len());
    for (index, path) in listed {
        let text = std::fs::read_to_string(&path).map_err(|source| ChunkError::Io {
            path: path.clone(),
            source,
        })?;
        chunks.push(Chunk { index, text });
    }
    Ok(chunks)
}

/// Write each chunk to `dir/ch_NNNN.txt` holding exactly its slice of the transcript.
pub fn write_chunks(dir: &Path, chunks: &[Chunk]) -> Result<Vec<PathBuf>, ChunkError> {
    let mut written = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let path = dir.join(chunk_file_name(chunk.index));
        write_atomic(&path, chunk.text.as_bytes()).map_err(|source| ChunkError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(chunk = %chunk.id(), bytes = chunk.text.len(), "chunk written");
        written.push(path);
    }
    Ok(written)
}

/// Result of one chunker run.
#[derive(Debug, Clone)]
pub struct ChunkRun {
    /// Every chunk, old and new, in index order.
    pub chunks: Vec<Chunk>,
    /// How many trailing entries of `chunks` were created by this run.
    pub created: usize,
    pub warnings: Vec<OversizedChunk>,
    pub forced_split: Option<ForcedSplit>,
}

impl ChunkRun {
    pub fn new_chunks(&self) -> &[Chunk] {
        &self.chunks[self.chunks.len() - self.created..]
    }
}

/// Read the transcript, chunk whatever existing chunk files do not cover yet,
/// and write the new chunk files.
pub fn run_chunker(
    transcript_path: &Path,
    chunks_dir: &Path,
    chunker: &Chunker,
) -> Result<ChunkRun, ChunkError> {
    let transcript = read_transcript(transcript_path)?;
    let mut chunks = load_chunks(chunks_dir)?;
    let plan = chunker.plan(&transcript, &chunks)?;

    write_chunks(chunks_dir, &plan.new_chunks)?;

    tracing::info!(
        kept = plan.kept,
        created = plan.new_chunks.len(),
        oversized = plan.warnings.len(),
        "chunking complete"
    );

    let created = plan.new_chunks.len();
    chunks.extend(plan.new_chunks);
    Ok(ChunkRun {
        chunks,
        created,
        warnings: plan.warnings,
        forced_split: plan.forced_split,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::{ChunkConfig, SizeUnit, UnitKind};
    use crate::turn::DEFAULT_TURN_PATTERN;

    fn line_chunker(max: usize) -> Chunker {
        Chunker::new(
            ChunkConfig::new(UnitKind::Line, SizeUnit::Lines, max, DEFAULT_TURN_PATTERN).unwrap(),
        )
    }

    #[test]
    fn missing_transcript_is_input_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_transcript(&tmp.path().join("raw_chat.txt")).unwrap_err();
        assert!(matches!(err, ChunkError::Input(InputError::Missing { .. })));
    }

    #[test]
    fn empty_transcript_is_input_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("raw_chat.txt");
        std::fs::write(&path, "  \n\n").unwrap();
        let err = read_transcript(&path).unwrap_err();
        assert!(matches!(err, ChunkError::Input(InputError::Empty { .. })));
    }

    #[test]
    fn non_utf8_transcript_is_input_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("raw_chat.txt");
        std::fs::write(&path, [0xff, 0xfe, b'\n']).unwrap();
        let err = read_transcript(&path).unwrap_err();
        assert!(matches!(err, ChunkError::Input(InputError::NotUtf8 { .. })));
    }

    #[test]
    fn run_writes_chunk_files_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let transcript = tmp.path().join("raw_chat.txt");
        let chunks_dir = tmp.path().join("chunks");
        let text: String = (1..=25).map(|i| format!("line {i}\n")).collect();
        std::fs::write(&transcript, &text).unwrap();

        let run = run_chunker(&transcript, &chunks_dir, &line_chunker(10)).unwrap();
        assert_eq!(run.created, 3);
        assert_eq!(run.new_chunks().len(), 3);
        for name in ["ch_0001.txt", "ch_0002.txt", "ch_0003.txt"] {
            assert!(chunks_dir.join(name).is_file(), "{name} missing");
        }
        let on_disk: String = load_chunks(&chunks_dir)
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(on_disk, text);

        let mtime = std::fs::metadata(chunks_dir.join("ch_0003.txt"))
            .unwrap()
            .modified()
            .unwrap();
        let again = run_chunker(&transcript, &chunks_dir, &line_chunker(10)).unwrap();
        assert_eq!(again.created, 0);
        assert_eq!(again.chunks.len(), 3);
        assert!(again.new_chunks().is_empty());
        let mtime_after = std::fs::metadata(chunks_dir.join("ch_0003.txt"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(mtime, mtime_after);
    }

    #[test]
    fn run_appends_new_tail_only() {
        let tmp = tempfile::tempdir().unwrap();
        let transcript = tmp.path().join("raw_chat.txt");
        let chunks_dir = tmp.path().join("chunks");
        std::fs::write(&transcript, "a\nb\nc\n").unwrap();
        run_chunker(&transcript, &chunks_dir, &line_chunker(2)).unwrap();

        std::fs::write(&transcript, "a\nb\nc\nd\ne\n").unwrap();
        let run = run_chunker(&transcript, &chunks_dir, &line_chunker(2)).unwrap();
        assert_eq!(run.created, 1);
        assert_eq!(run.new_chunks()[0].index, 3);
        assert_eq!(
            std::fs::read_to_string(chunks_dir.join("ch_0002.txt")).unwrap(),
            "c\n"
        );
        assert_eq!(
            std::fs::read_to_string(chunks_dir.join("ch_0003.txt")).unwrap(),
            "d\ne\n"
        );
    }
}
