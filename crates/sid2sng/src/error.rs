//! Error handling for the SID ripper.

use thiserror::Error;

/// Convenient result alias for ripping operations.
pub type Result<T> = std::result::Result<T, RipError>;

/// Errors that may occur while decoding a compiled player binary.
///
/// Every variant is fatal for the run: the byte-stream grammar guarantees
/// that well-formed player data never triggers one, so each is definitive
/// evidence of a misparsed token boundary or an unsupported input.
#[derive(Debug, Error)]
pub enum RipError {
    /// Buffer too small to contain the fixed SID header layout.
    #[error("SID file too short: expected at least {expected} bytes, got {actual}")]
    HeaderTooShort {
        /// Minimum size required by the header version.
        expected: usize,
        /// Actual file size.
        actual: usize,
    },
    /// A read advanced past the end of the loaded buffer.
    #[error("unexpected end of player data at offset 0x{offset:04x}")]
    UnexpectedEof {
        /// Cursor position of the failed read.
        offset: usize,
    },
    /// The frequency table anchor was not found anywhere in the blob.
    #[error("frequency table not found; not a supported player binary")]
    FreqTableNotFound,
    /// Translated order list address lands outside the file.
    #[error("order list address 0x{addr:04x} resolves outside the file")]
    OrderListOutOfRange {
        /// The absolute player address that failed to translate.
        addr: u16,
    },
    /// Order list for one channel grew past capacity.
    #[error("order list for song {song} channel {channel} exceeds {max} entries")]
    OrderListTooLong {
        /// Subsong index.
        song: usize,
        /// Channel index.
        channel: usize,
        /// Capacity limit.
        max: usize,
    },
    /// More patterns decoded than the tracker can hold.
    #[error("player data contains more than {max} patterns")]
    TooManyPatterns {
        /// Capacity limit.
        max: usize,
    },
    /// A single pattern decoded past the row capacity.
    #[error("pattern 0x{pattern:02x} exceeds {max} rows")]
    TooManyRows {
        /// Pattern index.
        pattern: usize,
        /// Capacity limit.
        max: usize,
    },
    /// A modulation table grew past capacity.
    #[error("table {table} exceeds {max} entries")]
    TableTooLong {
        /// Table kind index (wave/pulse/filter/speed).
        table: usize,
        /// Capacity limit.
        max: usize,
    },
    /// Speed table is missing its leading zero sentinel.
    #[error("speed table sentinel at offset 0x{offset:04x} is 0x{found:02x}, expected zero")]
    SpeedTableSentinel {
        /// File offset of the bad sentinel byte.
        offset: usize,
        /// Byte found in place of the sentinel.
        found: u8,
    },
}
