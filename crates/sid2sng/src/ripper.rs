//! The decoding engine.
//!
//! Control flows strictly forward: header, anchor, feature detection, song
//! address table, order lists, patterns, instruments, modulation tables,
//! final cursor validation. Each stage leaves the cursor where the next one
//! expects it; the only jumps are the two documented seeks (to the order
//! lists, and back over the pattern pointer table for the instruments).

use std::fmt;

use crate::detect::{Features, RipOptions};
use crate::error::{Result, RipError};
use crate::freq_table;
use crate::reader::BlobReader;
use crate::sid_file::SidHeader;
use crate::song::{
    Instrument, Song, ENDPATT, FIRSTNOTE, FTBL, FX, FXONLY, KEYON, LOOPSONG, MAX_PATT,
    MAX_PATTROWS, MAX_SONGLEN, MAX_TABLELEN, MAX_TABLES, PTBL, REPEAT, REST, STBL, TRANSDOWN,
    WAVECMD, WTBL,
};

/// Speed table left values whose right byte names another entry, bounding
/// the table length from below.
const SPEED_CHAIN: [u8; 2] = [0xFE, 0xFF];

/// Non-fatal findings from the final cursor validation.
///
/// Either direction of mismatch usually means a feature flag was detected
/// wrongly, but the decoded song is structurally intact, so the run
/// completes and the serializer still gets the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// Table decoding read past the order list start.
    TableOverrun {
        /// Bytes read beyond the expected position.
        by: usize,
    },
    /// Table decoding stopped short of the order list start.
    TrailingBytes {
        /// Unread bytes between the tables and the order lists.
        count: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableOverrun { by } => write!(
                f,
                "table data overran the order lists by {by} byte(s); a player feature was likely misdetected"
            ),
            Self::TrailingBytes { count } => write!(
                f,
                "{count} table byte(s) left unread before the order lists"
            ),
        }
    }
}

/// Everything a successful rip produces.
#[derive(Debug, Clone)]
pub struct RipOutcome {
    /// Parsed container header.
    pub header: SidHeader,
    /// Effective feature set used for the decode.
    pub features: Features,
    /// The decoded song.
    pub song: Song,
    /// Non-fatal validation findings.
    pub warnings: Vec<Warning>,
}

/// Decode a compiled player binary into structured song data.
pub fn rip(data: &[u8], options: &RipOptions) -> Result<RipOutcome> {
    let header = SidHeader::parse(data)?;
    let features = Features::resolve(data, options);

    let mut ripper = Ripper {
        reader: BlobReader::new(data),
        features,
        song: Song {
            name: header.name,
            author: header.author,
            released: header.released,
            ..Default::default()
        },
        max_table: [0; MAX_TABLES],
        instr_count: 0,
        pattern_count: 0,
    };
    let warnings = ripper.run(&header)?;

    Ok(RipOutcome {
        header,
        features,
        song: ripper.song,
        warnings,
    })
}

struct Ripper<'a> {
    reader: BlobReader<'a>,
    features: Features,
    song: Song,
    /// Running lower bound on each table's length.
    max_table: [usize; MAX_TABLES],
    /// Highest instrument number seen in pattern data.
    instr_count: usize,
    /// One past the highest pattern index referenced by any order list.
    pattern_count: usize,
}

impl Ripper<'_> {
    fn run(&mut self, header: &SidHeader) -> Result<Vec<Warning>> {
        let song_count = (header.song_count as usize).max(1);
        let channels = header.channel_count();
        let data_len = self.reader.data().len();

        let anchor_end = freq_table::locate(self.reader.data())?;
        self.reader.seek(anchor_end);

        // Song address table: one low byte then one high byte per
        // (song, channel) pair. Entry 0 locates the order list region.
        let entries = song_count * channels;
        let mut order_addr = 0u16;
        for i in 0..entries {
            let lo = self.reader.read()?;
            if i == 0 {
                order_addr = lo as u16;
            }
        }
        for i in 0..entries {
            let hi = self.reader.read()?;
            if i == 0 {
                order_addr |= (hi as u16) << 8;
            }
        }

        // The pattern pointer table follows; it is skipped once the
        // pattern count is known.
        let patt_table_pos = self.reader.pos();

        let order_list_pos = header.address_to_offset(order_addr)?;
        if order_list_pos >= data_len {
            return Err(RipError::OrderListOutOfRange { addr: order_addr });
        }

        self.reader.seek(order_list_pos);
        for song in 0..song_count {
            let mut per_channel = Vec::with_capacity(channels);
            for channel in 0..channels {
                per_channel.push(self.decode_order_list(song, channel)?);
            }
            self.song.song_order.push(per_channel);
        }

        while self.reader.has_remaining() {
            self.decode_pattern()?;
        }

        self.reader.seek(patt_table_pos + self.pattern_count * 2);
        self.decode_instruments()?;
        self.decode_tables()?;

        let mut warnings = Vec::new();
        let end = self.reader.pos();
        if end > order_list_pos {
            warnings.push(Warning::TableOverrun {
                by: end - order_list_pos,
            });
        } else if end < order_list_pos {
            warnings.push(Warning::TrailingBytes {
                count: order_list_pos - end,
            });
        }
        Ok(warnings)
    }

    fn decode_order_list(&mut self, song: usize, channel: usize) -> Result<Vec<u8>> {
        let mut order = Vec::new();
        loop {
            let x = self.reader.read()?;
            if x == LOOPSONG {
                break;
            }
            if order.len() + 2 > MAX_SONGLEN {
                return Err(RipError::OrderListTooLong {
                    song,
                    channel,
                    max: MAX_SONGLEN,
                });
            }
            if x < REPEAT {
                self.pattern_count = self.pattern_count.max(x as usize + 1);
                order.push(x);
            } else if x < TRANSDOWN {
                // Repeat escape: duplicate the previous entry, then store
                // the escape code adjacent to it.
                match order.last().copied() {
                    Some(prev) => {
                        order.push(prev);
                        order.push(x);
                    }
                    None => order.push(x),
                }
            } else {
                // Transpose escape, resolved at playback time.
                order.push(x);
            }
        }
        let restart = self.reader.read()?;
        order.push(0xFF);
        order.push(restart);
        Ok(order)
    }

    fn decode_pattern(&mut self) -> Result<()> {
        let index = self.song.patterns.len();
        if index >= MAX_PATT {
            return Err(RipError::TooManyPatterns { max: MAX_PATT });
        }

        let mut rows: Vec<u8> = Vec::new();
        let mut instr = 0u8;
        // Command and argument persist across rows until overwritten.
        let mut cmd = 0u8;
        let mut arg = 0u8;

        loop {
            let prev_instr = instr;
            if self.reader.peek()? < FX {
                instr = self.reader.read()?;
                self.instr_count = self.instr_count.max(instr as usize);
            }

            let note;
            let mut repeat = 1usize;

            let x = self.reader.read()?;
            if x > KEYON {
                // Run-length compressed rests.
                repeat = 256 - x as usize;
                note = REST;
            } else if x >= REST {
                note = x;
            } else if x >= FIRSTNOTE {
                note = x;
            } else {
                cmd = x & 0x0F;
                arg = if cmd != 0 { self.reader.read()? } else { 0 };
                note = if x < FXONLY { self.reader.read()? } else { REST };

                // The player stores speeds of 2 and up one step short.
                if cmd == 0xF && arg >= 2 {
                    arg = arg.wrapping_add(1);
                }

                // Command arguments index into the tables, bounding the
                // lengths inferred later from instrument pointers.
                if (0x1..=0x4).contains(&cmd) {
                    self.max_table[STBL] = self.max_table[STBL].max(arg as usize);
                }
                if (0x8..=0xA).contains(&cmd) {
                    let t = (cmd - 0x8) as usize;
                    self.max_table[t] = self.max_table[t].max(arg as usize);
                }
            }

            for _ in 0..repeat {
                if rows.len() / 4 >= MAX_PATTROWS {
                    return Err(RipError::TooManyRows {
                        pattern: index,
                        max: MAX_PATTROWS,
                    });
                }
                let instr_col = if instr != prev_instr { instr } else { 0 };
                rows.extend_from_slice(&[note, instr_col, cmd, arg]);
            }

            if self.reader.peek()? == 0 {
                break;
            }
        }
        self.reader.read()?;
        rows.extend_from_slice(&[ENDPATT, 0, 0, 0]);
        self.song.patterns.push(rows);
        Ok(())
    }

    fn decode_instruments(&mut self) -> Result<()> {
        let count = self.instr_count;
        self.song.instruments = vec![Instrument::default(); count + 1];

        for i in 1..=count {
            self.song.instruments[i].ad = self.reader.read()?;
        }
        for i in 1..=count {
            self.song.instruments[i].sr = self.reader.read()?;
        }
        self.read_table_pointers(WTBL)?;
        if self.features.pulse {
            self.read_table_pointers(PTBL)?;
        }
        if self.features.filter {
            self.read_table_pointers(FTBL)?;
        }
        if self.features.instr_vibrato {
            self.read_table_pointers(STBL)?;
            for i in 1..=count {
                self.song.instruments[i].vibdelay = self.reader.read()?;
            }
        }
        if self.features.variable_params {
            for i in 1..=count {
                self.song.instruments[i].gatetimer = self.reader.read()?;
            }
            for i in 1..=count {
                self.song.instruments[i].firstwave = self.reader.read()?;
            }
        }
        Ok(())
    }

    fn read_table_pointers(&mut self, table: usize) -> Result<()> {
        for i in 1..=self.instr_count {
            let ptr = self.reader.read()?;
            self.max_table[table] = self.max_table[table].max(ptr as usize);
            self.song.instruments[i].table_ptr[table] = ptr;
        }
        Ok(())
    }

    fn decode_tables(&mut self) -> Result<()> {
        for t in 0..MAX_TABLES {
            if t == PTBL && !self.features.pulse {
                continue;
            }
            if t == FTBL && !self.features.filter {
                continue;
            }
            self.decode_table(t)?;
        }
        Ok(())
    }

    fn decode_table(&mut self, t: usize) -> Result<()> {
        if t == STBL {
            let offset = self.reader.pos();
            let lead = self.reader.read()?;
            if lead != 0 {
                return Err(RipError::SpeedTableSentinel {
                    offset,
                    found: lead,
                });
            }
        }

        let mut lt: Vec<u8> = Vec::new();
        for _ in 0..self.max_table[t] {
            lt.push(self.reader.read()?);
        }

        if t < STBL {
            // The on-disk table runs past every inferred bound whenever
            // later entries are only reached through table-internal jumps;
            // keep reading until the 0xFF terminator has been stored.
            let mut last = lt.last().copied().unwrap_or(0);
            while last != 0xFF {
                self.check_table_len(t, lt.len())?;
                last = self.reader.read()?;
                lt.push(last);
            }
        } else {
            // Speed table: grows until the trailing zero sentinel.
            while self.reader.peek()? != 0 {
                self.check_table_len(t, lt.len())?;
                let b = self.reader.read()?;
                lt.push(b);
            }
            self.reader.read()?;
        }

        let mut rt: Vec<u8> = Vec::with_capacity(lt.len());
        for i in 0..lt.len() {
            rt.push(self.reader.read()?);

            if t == WTBL {
                if self.features.wave_delay {
                    // Wave delays sit one step off in player encoding.
                    let x = lt[i];
                    if x > 0x1F && x < 0xF0 {
                        lt[i] = x - 0x10;
                    } else if x > 0x0F && x < 0x20 {
                        lt[i] = x + 0xD0;
                    }
                }
                if lt[i] < WAVECMD {
                    rt[i] ^= 0x80;
                }
            }
            if t == FTBL {
                let x = lt[i];
                if x > 0x80 && x < 0xFF {
                    lt[i] = (x << 1) | 0x80;
                }
            }
        }

        if t == STBL {
            // Chain codes bound the table length from below; entries past
            // the zero scan are materialized as zero pairs.
            let bound = lt
                .iter()
                .zip(&rt)
                .filter(|(l, _)| SPEED_CHAIN.contains(l))
                .map(|(_, r)| *r as usize)
                .max()
                .unwrap_or(0);
            while lt.len() < bound {
                lt.push(0);
                rt.push(0);
            }
        }

        self.song.ltable[t] = lt;
        self.song.rtable[t] = rt;
        Ok(())
    }

    fn check_table_len(&self, t: usize, len: usize) -> Result<()> {
        if len >= MAX_TABLELEN {
            return Err(RipError::TableTooLong {
                table: t,
                max: MAX_TABLELEN,
            });
        }
        Ok(())
    }
}
