//! On-disk block metadata record and the global header's `N` field.
//!
//! Both are tiny fixed layouts; `binrw` gives the same exact-width,
//! little-endian encode/decode the teacher crate uses for its page and
//! table-pointer structures, without hand-rolled byte slicing.

use binrw::{BinRead, BinWrite};
use std::io::Cursor;

use crate::error::Result;
use crate::geometry::PAGE_SIZE;

/// One 16-byte block metadata record, exactly as laid out on disk.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct BlockMetadataRecord {
    /// Logical data-page index within the data region (0-based).
    pub page: u32,
    /// Owner id. Zero means tombstone/free.
    pub owner: u32,
    /// Bytes populated within this data page, 0..=512.
    pub size_taken: u32,
    /// Reserved for future CRC verification. Always written as 0; never
    /// validated.
    pub crc: u32,
}

impl BlockMetadataRecord {
    pub const ENCODED_SIZE: usize = 16;

    /// A tombstoned / free record.
    pub const TOMBSTONE: BlockMetadataRecord = BlockMetadataRecord {
        page: 0,
        owner: 0,
        size_taken: 0,
        crc: 0,
    };

    pub fn is_live(&self) -> bool {
        self.owner != 0
    }

    pub fn decode(bytes: &[u8; Self::ENCODED_SIZE]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes.as_slice());
        Ok(Self::read(&mut cursor)?)
    }

    pub fn encode(&self) -> Result<[u8; Self::ENCODED_SIZE]> {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        let mut cursor = Cursor::new(buf.as_mut_slice());
        self.write(&mut cursor)?;
        Ok(buf)
    }
}

/// Decode `N` from the 512-byte header page (bytes 0..4; the rest is
/// don't-care).
pub fn decode_header(page: &[u8; PAGE_SIZE as usize]) -> u32 {
    u32::from_le_bytes([page[0], page[1], page[2], page[3]])
}

/// Encode `N` into a fresh 512-byte header page, zeroing the unused tail.
pub fn encode_header(n: u32) -> [u8; PAGE_SIZE as usize] {
    let mut page = [0u8; PAGE_SIZE as usize];
    page[0..4].copy_from_slice(&n.to_le_bytes());
    page
}
