//! Anchor locator.
//!
//! The player binary carries no offset to its music data. What it does
//! carry, at a fixed position relative to the data, is the note frequency
//! table. The high-byte half of that table is a recognizable monotonically
//! increasing sequence, so the first 12 bytes serve as a search anchor and
//! the rest of the known table extends the match as far as the embedded
//! copy agrees. The read cursor starts just past the matched run.

use crate::error::{Result, RipError};

/// High bytes of the player's note frequency table.
pub const FREQTBL_HI: [u8; 61] = [
    0x08, 0x09, 0x09, 0x0a, 0x0a, 0x0b, 0x0c, 0x0d, 0x0d, 0x0e, 0x0f, 0x10, 0x11, 0x12, 0x13,
    0x14, 0x15, 0x17, 0x18, 0x1a, 0x1b, 0x1d, 0x1f, 0x20, 0x22, 0x24, 0x27, 0x29, 0x2b, 0x2e,
    0x31, 0x34, 0x37, 0x3a, 0x3e, 0x41, 0x45, 0x49, 0x4e, 0x52, 0x57, 0x5c, 0x62, 0x68, 0x6e,
    0x75, 0x7c, 0x83, 0x8b, 0x93, 0x9c, 0xa5, 0xaf, 0xb9, 0xc4, 0xd0, 0xdd, 0xea, 0xf8, 0xff,
    0xe8,
];

/// Bytes of [`FREQTBL_HI`] that must match exactly to count as a hit.
pub const ANCHOR_LEN: usize = 12;

/// Locate the frequency table and return the file offset just past it.
///
/// The embedded copy may be shorter or longer than the anchor; matching
/// continues byte by byte against the full reference table until either
/// side diverges or the reference runs out.
pub fn locate(data: &[u8]) -> Result<usize> {
    let start = data
        .windows(ANCHOR_LEN)
        .position(|w| w == &FREQTBL_HI[..ANCHOR_LEN])
        .ok_or(RipError::FreqTableNotFound)?;

    let mut end = start;
    for &reference in FREQTBL_HI.iter() {
        if data.get(end) != Some(&reference) {
            break;
        }
        end += 1;
    }
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_table_match_ends_past_the_table() {
        let mut data = vec![0x55u8; 40];
        data.extend_from_slice(&FREQTBL_HI);
        data.extend_from_slice(&[0x12, 0x34]);
        assert_eq!(locate(&data).unwrap(), 40 + FREQTBL_HI.len());
    }

    #[test]
    fn partial_tables_extend_exactly_as_far_as_they_agree() {
        // Anchor extension property: anchor plus K agreeing bytes puts the
        // cursor at match + ANCHOR_LEN + K for every K.
        for k in 0..=FREQTBL_HI.len() - ANCHOR_LEN {
            let mut data = vec![0u8; 7];
            data.extend_from_slice(&FREQTBL_HI[..ANCHOR_LEN + k]);
            // Diverge right after, unless the full table was embedded.
            if ANCHOR_LEN + k < FREQTBL_HI.len() {
                data.push(FREQTBL_HI[ANCHOR_LEN + k].wrapping_add(1));
            }
            assert_eq!(locate(&data).unwrap(), 7 + ANCHOR_LEN + k, "K = {k}");
        }
    }

    #[test]
    fn missing_table_is_an_error() {
        let data = vec![0xEEu8; 512];
        assert!(matches!(locate(&data), Err(RipError::FreqTableNotFound)));
    }

    #[test]
    fn eleven_byte_prefix_is_not_enough() {
        let mut data = vec![0u8; 10];
        data.extend_from_slice(&FREQTBL_HI[..ANCHOR_LEN - 1]);
        data.push(0x00);
        assert!(locate(&data).is_err());
    }
}
