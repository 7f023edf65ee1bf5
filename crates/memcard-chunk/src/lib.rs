mod chunker;
mod error;
mod files;
mod turn;

pub use chunker::{
    Chunk, ChunkConfig, ChunkPlan, Chunker, ForcedSplit, OversizedChunk, SizeUnit, UnitKind,
};
pub use error::{ChunkError, InputError};
pub use files::{load_chunks, read_transcript, run_chunker, write_chunks, ChunkRun};
pub use turn::{parse_turn_headers, split_units, TurnHeader, TurnPattern, DEFAULT_TURN_PATTERN};
