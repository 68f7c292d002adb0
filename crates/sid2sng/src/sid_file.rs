//! SID container header reader.
//!
//! The PSID/RSID header is big-endian throughout. One field is deliberately
//! not trusted: the stated load address is wrong often enough in tracker
//! exports that the two little-endian bytes at the data offset are read
//! instead, exactly as the player loader itself would.

use crate::error::{Result, RipError};
use crate::song::{CHANNELS_PER_SID, TEXT_LEN};

/// Fixed size of the version 1 header.
const V1_HEADER_LEN: usize = 0x76;
/// Fixed size of the version 2+ header.
const V2_HEADER_LEN: usize = 0x7C;

/// Parsed SID container header with the effective load address resolved.
#[derive(Debug, Clone)]
pub struct SidHeader {
    /// File magic, `PSID` or `RSID`.
    pub magic: [u8; 4],
    /// Header version.
    pub version: u16,
    /// Offset of the C64 data inside the file.
    pub data_offset: u16,
    /// Effective load address, re-read from the two little-endian bytes at
    /// `data_offset`. The header's own load address field is discarded.
    pub load_addr: u16,
    /// Init routine entry address.
    pub init_addr: u16,
    /// Play routine entry address.
    pub play_addr: u16,
    /// Number of subsongs.
    pub song_count: u16,
    /// Default subsong, 1-based.
    pub start_song: u16,
    /// Per-subsong speed bitmask.
    pub speed: u32,
    /// Song title, fixed width.
    pub name: [u8; TEXT_LEN],
    /// Author, fixed width.
    pub author: [u8; TEXT_LEN],
    /// Release/copyright line, fixed width.
    pub released: [u8; TEXT_LEN],
    /// Version 2+ flags word.
    pub flags: u16,
    /// Version 2+ relocation start page.
    pub start_page: u8,
    /// Version 2+ relocation page count.
    pub page_length: u8,
    /// Second chip address byte (version 2+, 0 = absent).
    pub sid2_addr: u8,
    /// Third chip address byte (version 2+, 0 = absent).
    pub sid3_addr: u8,
}

impl SidHeader {
    /// Parse the header out of the raw file bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < V1_HEADER_LEN {
            return Err(RipError::HeaderTooShort {
                expected: V1_HEADER_LEN,
                actual: data.len(),
            });
        }

        let version = read_u16(data, 0x04);
        if version > 1 && data.len() < V2_HEADER_LEN {
            return Err(RipError::HeaderTooShort {
                expected: V2_HEADER_LEN,
                actual: data.len(),
            });
        }

        let mut header = Self {
            magic: [data[0], data[1], data[2], data[3]],
            version,
            data_offset: read_u16(data, 0x06),
            load_addr: 0,
            init_addr: read_u16(data, 0x0A),
            play_addr: read_u16(data, 0x0C),
            song_count: read_u16(data, 0x0E),
            start_song: read_u16(data, 0x10),
            speed: read_u32(data, 0x12),
            name: read_text(data, 0x16),
            author: read_text(data, 0x36),
            released: read_text(data, 0x56),
            flags: 0,
            start_page: 0,
            page_length: 0,
            sid2_addr: 0,
            sid3_addr: 0,
        };

        if version > 1 {
            header.flags = read_u16(data, 0x76);
            header.start_page = data[0x78];
            header.page_length = data[0x79];
            header.sid2_addr = data[0x7A];
            header.sid3_addr = data[0x7B];
        }

        // The in-band load address: two little-endian bytes at the data
        // offset, ahead of the C64 payload proper.
        let off = header.data_offset as usize;
        if off + 2 > data.len() {
            return Err(RipError::UnexpectedEof { offset: off });
        }
        header.load_addr = u16::from_le_bytes([data[off], data[off + 1]]);

        Ok(header)
    }

    /// Relocation offset translating absolute player addresses to file
    /// offsets: `data_offset - load_addr + 2`. Empirical; see DESIGN.md.
    pub fn addr_offset(&self) -> i32 {
        self.data_offset as i32 - self.load_addr as i32 + 2
    }

    /// Channels in this export: 3, or 6/9 when the version 2+ header names
    /// a second/third chip.
    pub fn channel_count(&self) -> usize {
        let mut chips = 1;
        if self.version > 1 && self.sid2_addr != 0 {
            chips += 1;
            if self.sid3_addr != 0 {
                chips += 1;
            }
        }
        chips * CHANNELS_PER_SID
    }

    /// Translate an absolute player address to a file offset.
    pub fn address_to_offset(&self, addr: u16) -> Result<usize> {
        let off = self.addr_offset() + addr as i32;
        usize::try_from(off).map_err(|_| RipError::OrderListOutOfRange { addr })
    }
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn read_text(data: &[u8], offset: usize) -> [u8; TEXT_LEN] {
    let mut out = [0u8; TEXT_LEN];
    out.copy_from_slice(&data[offset..offset + TEXT_LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn make_v2_header(load_addr: u16) -> Vec<u8> {
        let mut data = vec![0u8; V2_HEADER_LEN + 2];
        data[0..4].copy_from_slice(b"PSID");
        data[0x04..0x06].copy_from_slice(&2u16.to_be_bytes());
        data[0x06..0x08].copy_from_slice(&(V2_HEADER_LEN as u16).to_be_bytes());
        // Stated load address: deliberately bogus, must be ignored.
        data[0x08..0x0A].copy_from_slice(&0xDEADu16.to_be_bytes());
        data[0x0A..0x0C].copy_from_slice(&0x1000u16.to_be_bytes());
        data[0x0C..0x0E].copy_from_slice(&0x1003u16.to_be_bytes());
        data[0x0E..0x10].copy_from_slice(&1u16.to_be_bytes());
        data[0x10..0x12].copy_from_slice(&1u16.to_be_bytes());
        data[0x16..0x1B].copy_from_slice(b"title");
        // In-band load address, little-endian at the data offset.
        let off = V2_HEADER_LEN;
        data[off..off + 2].copy_from_slice(&load_addr.to_le_bytes());
        data
    }

    #[test]
    fn header_load_address_comes_from_data_offset() {
        let data = make_v2_header(0x1000);
        let h = SidHeader::parse(&data).unwrap();
        assert_eq!(h.load_addr, 0x1000);
        assert_eq!(h.data_offset as usize, V2_HEADER_LEN);
        assert_eq!(h.addr_offset(), V2_HEADER_LEN as i32 - 0x1000 + 2);
        assert_eq!(&h.name[0..5], b"title");
    }

    #[test]
    fn channel_count_follows_extra_chip_addresses() {
        let mut data = make_v2_header(0x1000);
        assert_eq!(SidHeader::parse(&data).unwrap().channel_count(), 3);
        data[0x7A] = 0x42;
        assert_eq!(SidHeader::parse(&data).unwrap().channel_count(), 6);
        data[0x7B] = 0x44;
        assert_eq!(SidHeader::parse(&data).unwrap().channel_count(), 9);
    }

    #[test]
    fn tertiary_chip_alone_does_not_add_channels() {
        let mut data = make_v2_header(0x1000);
        data[0x7B] = 0x44;
        assert_eq!(SidHeader::parse(&data).unwrap().channel_count(), 3);
    }

    #[test]
    fn truncated_header_is_rejected() {
        let data = vec![0u8; 0x20];
        assert!(matches!(
            SidHeader::parse(&data),
            Err(RipError::HeaderTooShort { .. })
        ));
    }
}
