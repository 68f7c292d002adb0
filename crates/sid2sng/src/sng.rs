//! Serializer for the tracker's native `.sng` save format.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::song::{Song, MAX_TABLES};

/// File magic of the save format.
const MAGIC: &[u8; 4] = b"GTS5";

/// Length of the (unrecoverable, zero-filled) instrument name field.
const INSTR_NAME_LEN: usize = 16;

/// Write a song to `path`, replacing any existing file.
pub fn save(song: &Song, path: impl AsRef<Path>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_sng(song, &mut writer)?;
    writer.flush()
}

/// Serialize a song into the tracker's save format.
pub fn write_sng<W: Write>(song: &Song, w: &mut W) -> io::Result<()> {
    w.write_all(MAGIC)?;
    w.write_all(&song.name)?;
    w.write_all(&song.author)?;
    w.write_all(&song.released)?;

    w.write_all(&[song.song_order.len() as u8])?;
    for subtune in &song.song_order {
        for order in subtune {
            // Length byte counts up to the end-marker, the restart
            // position byte rides behind it.
            w.write_all(&[(order.len() - 1) as u8])?;
            w.write_all(order)?;
        }
    }

    w.write_all(&[song.instrument_count() as u8])?;
    for instr in song.instruments.iter().skip(1) {
        w.write_all(&[instr.ad, instr.sr])?;
        w.write_all(&instr.table_ptr)?;
        w.write_all(&[instr.vibdelay, instr.gatetimer, instr.firstwave])?;
        w.write_all(&[0u8; INSTR_NAME_LEN])?;
    }

    for t in 0..MAX_TABLES {
        w.write_all(&[song.ltable[t].len() as u8])?;
        w.write_all(&song.ltable[t])?;
        w.write_all(&song.rtable[t])?;
    }

    w.write_all(&[song.patterns.len() as u8])?;
    for pattern in &song.patterns {
        w.write_all(&[(pattern.len() / 4) as u8])?;
        w.write_all(pattern)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::{Instrument, ENDPATT, REST};

    fn tiny_song() -> Song {
        let mut song = Song::default();
        song.name[..4].copy_from_slice(b"test");
        song.song_order = vec![vec![
            vec![0x00, 0xFF, 0x00],
            vec![0x01, 0xFF, 0x00],
            vec![0x00, 0x01, 0xFF, 0x01],
        ]];
        song.patterns = vec![
            vec![0x60, 0x01, 0x00, 0x00, ENDPATT, 0, 0, 0],
            vec![REST, 0x00, 0x00, 0x00, ENDPATT, 0, 0, 0],
        ];
        song.instruments = vec![
            Instrument::default(),
            Instrument {
                ad: 0x22,
                sr: 0xF9,
                table_ptr: [1, 0, 0, 0],
                ..Default::default()
            },
        ];
        song.ltable[0] = vec![0x31, 0xFF];
        song.rtable[0] = vec![0x80, 0x00];
        song
    }

    #[test]
    fn layout_starts_with_magic_and_text_fields() {
        let mut out = Vec::new();
        write_sng(&tiny_song(), &mut out).unwrap();
        assert_eq!(&out[0..4], b"GTS5");
        assert_eq!(&out[4..8], b"test");
        // Subtune count byte sits right after the three text fields.
        assert_eq!(out[4 + 96], 1);
    }

    #[test]
    fn order_list_length_byte_counts_to_end_marker() {
        let mut out = Vec::new();
        write_sng(&tiny_song(), &mut out).unwrap();
        let orders = &out[4 + 96 + 1..];
        assert_eq!(orders[0], 2);
        assert_eq!(&orders[1..4], &[0x00, 0xFF, 0x00]);
        assert_eq!(orders[4], 2);
        // Third channel has two entries before the marker.
        assert_eq!(orders[8], 3);
        assert_eq!(&orders[9..13], &[0x00, 0x01, 0xFF, 0x01]);
    }

    #[test]
    fn pattern_row_counts_include_the_terminator_row() {
        let mut out = Vec::new();
        write_sng(&tiny_song(), &mut out).unwrap();
        // Trailer: pattern count, then per pattern a row count and rows.
        let trailer_len = 1 + 2 * (1 + 8);
        let trailer = &out[out.len() - trailer_len..];
        assert_eq!(trailer[0], 2);
        assert_eq!(trailer[1], 2);
        assert_eq!(&trailer[2..6], &[0x60, 0x01, 0x00, 0x00]);
        assert_eq!(trailer[10], 2);
    }
}
