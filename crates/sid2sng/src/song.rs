//! Structured song data as the tracker edits it.
//!
//! The byte-language constants here are shared between the pattern/order
//! list encodings inside the compiled player and the `.sng` save format:
//! the player keeps the composer's values verbatim, which is what makes
//! ripping them back out possible at all.

/// Length of the fixed-width header text fields.
pub const TEXT_LEN: usize = 32;

/// Channels driven by a single SID chip.
pub const CHANNELS_PER_SID: usize = 3;

/// First byte value that is not an instrument change inside pattern data.
/// Also the first command byte value (commands with a note byte).
pub const FX: u8 = 0x40;
/// First command byte value without a trailing note byte.
pub const FXONLY: u8 = 0x50;
/// Lowest literal note value.
pub const FIRSTNOTE: u8 = 0x60;
/// Highest literal note value.
pub const LASTNOTE: u8 = 0xBC;
/// Empty row.
pub const REST: u8 = 0xBD;
/// Gate-off sentinel.
pub const KEYOFF: u8 = 0xBE;
/// Gate-on sentinel.
pub const KEYON: u8 = 0xBF;
/// Pattern terminator row marker.
pub const ENDPATT: u8 = 0xFF;

/// First repeat escape value in an order list.
pub const REPEAT: u8 = 0xD0;
/// First downward transpose escape value.
pub const TRANSDOWN: u8 = 0xE0;
/// Transpose origin; values at or above shift up, below shift down.
pub const TRANSUP: u8 = 0xF0;
/// Order list terminator.
pub const LOOPSONG: u8 = 0xFF;

/// Wave table left values below this are waveforms, at or above commands.
pub const WAVECMD: u8 = 0xF0;

/// Wave table index.
pub const WTBL: usize = 0;
/// Pulse table index.
pub const PTBL: usize = 1;
/// Filter table index.
pub const FTBL: usize = 2;
/// Vibrato/speed table index.
pub const STBL: usize = 3;
/// Number of modulation tables.
pub const MAX_TABLES: usize = 4;

/// Capacity limits of the target tracker. The decoder enforces these with
/// typed errors; the save format cannot represent anything larger.
pub const MAX_PATT: usize = 208;
/// Rows in one pattern, not counting the terminator row.
pub const MAX_PATTROWS: usize = 128;
/// Usable instruments (instrument 0 is reserved).
pub const MAX_INSTR: usize = 63;
/// Order list entries per channel, not counting the end marker pair.
pub const MAX_SONGLEN: usize = 254;
/// Entries per modulation table.
pub const MAX_TABLELEN: usize = 255;

/// One instrument as the tracker stores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Instrument {
    /// Attack/decay nibbles.
    pub ad: u8,
    /// Sustain/release nibbles.
    pub sr: u8,
    /// 1-based start pointers into the four modulation tables (0 = unused).
    pub table_ptr: [u8; MAX_TABLES],
    /// Frames before vibrato starts.
    pub vibdelay: u8,
    /// Gate-off timer.
    pub gatetimer: u8,
    /// Waveform written on the first frame of a note.
    pub firstwave: u8,
}

/// A complete decoded song.
///
/// Populated incrementally by the decoding stages and handed whole to the
/// `.sng` serializer; never mutated once serialization begins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Song {
    /// Song title, verbatim from the container header.
    pub name: [u8; TEXT_LEN],
    /// Author, verbatim from the container header.
    pub author: [u8; TEXT_LEN],
    /// Release/copyright line, verbatim from the container header.
    pub released: [u8; TEXT_LEN],
    /// Per subsong, per channel: pattern indices and escape codes followed
    /// by the `0xFF` end marker and the restart position byte.
    pub song_order: Vec<Vec<Vec<u8>>>,
    /// Flat note/instrument/command/argument quads per pattern, closed by
    /// an [`ENDPATT`] terminator row.
    pub patterns: Vec<Vec<u8>>,
    /// Instruments, 1-indexed; entry 0 is reserved and stays default.
    pub instruments: Vec<Instrument>,
    /// Left byte of each modulation table entry, per table kind.
    pub ltable: [Vec<u8>; MAX_TABLES],
    /// Right byte of each modulation table entry, per table kind.
    pub rtable: [Vec<u8>; MAX_TABLES],
}

impl Song {
    /// Number of channels decoded into every subsong's order lists.
    pub fn channel_count(&self) -> usize {
        self.song_order.first().map_or(0, Vec::len)
    }

    /// Highest instrument number actually in use (0 when none).
    pub fn instrument_count(&self) -> usize {
        self.instruments.len().saturating_sub(1)
    }
}
