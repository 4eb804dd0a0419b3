//! Metadata table: the dense array of block metadata records, and the
//! primitives that allocate, mutate, and tombstone them.

use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::geometry::{Geometry, PAGE_SIZE};
use crate::record::BlockMetadataRecord;

/// Sequential, page-cached scan over metadata slots `0..limit`. Mirrors the
/// reference implementation's loop that rereads a metadata page only when
/// the scan crosses into the next one, rather than issuing one
/// `read_page` per 16-byte record.
pub struct MetadataScan<'d, D: BlockDevice> {
    device: &'d mut D,
    geometry: Geometry,
    limit: u32,
    next_slot: u32,
    page_buf: [u8; PAGE_SIZE as usize],
    loaded_page: Option<u32>,
}

impl<'d, D: BlockDevice> MetadataScan<'d, D> {
    pub fn new(device: &'d mut D, geometry: Geometry, limit: u32) -> Self {
        Self {
            device,
            geometry,
            limit,
            next_slot: 0,
            page_buf: [0u8; PAGE_SIZE as usize],
            loaded_page: None,
        }
    }

    fn load(&mut self, slot: u32) -> (u32, u32) {
        let (page, offset) = self.geometry.record_location(slot);
        if self.loaded_page != Some(page) {
            self.device.read_page(page, &mut self.page_buf);
            self.loaded_page = Some(page);
        }
        (page, offset)
    }
}

impl<'d, D: BlockDevice> Iterator for MetadataScan<'d, D> {
    type Item = Result<(u32, BlockMetadataRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_slot >= self.limit {
            return None;
        }
        let slot = self.next_slot;
        let (_, offset) = self.load(slot);

        let mut raw = [0u8; BlockMetadataRecord::ENCODED_SIZE];
        raw.copy_from_slice(
            &self.page_buf[offset as usize..offset as usize + BlockMetadataRecord::ENCODED_SIZE],
        );

        self.next_slot += 1;
        Some(BlockMetadataRecord::decode(&raw).map(|record| (slot, record)))
    }
}

/// Read the metadata record at `slot`.
pub fn read_record<D: BlockDevice>(
    device: &mut D,
    geometry: &Geometry,
    slot: u32,
) -> Result<BlockMetadataRecord> {
    let (page, offset) = geometry.record_location(slot);
    let mut page_buf = [0u8; PAGE_SIZE as usize];
    device.read_page(page, &mut page_buf);

    let mut raw = [0u8; BlockMetadataRecord::ENCODED_SIZE];
    raw.copy_from_slice(
        &page_buf[offset as usize..offset as usize + BlockMetadataRecord::ENCODED_SIZE],
    );
    BlockMetadataRecord::decode(&raw)
}

/// Write `record` into `slot`, read-modify-write on the owning metadata
/// page so neighboring records in the same page are preserved.
pub fn write_record<D: BlockDevice>(
    device: &mut D,
    geometry: &Geometry,
    slot: u32,
    record: &BlockMetadataRecord,
) -> Result<()> {
    let (page, offset) = geometry.record_location(slot);
    let mut page_buf = [0u8; PAGE_SIZE as usize];
    device.read_page(page, &mut page_buf);

    let encoded = record.encode()?;
    page_buf[offset as usize..offset as usize + BlockMetadataRecord::ENCODED_SIZE]
        .copy_from_slice(&encoded);

    device.write_page(page, &page_buf);
    Ok(())
}

/// Update just the `size_taken` field of the record at `slot`, leaving
/// `page`/`owner`/`crc` untouched.
pub fn set_size_taken<D: BlockDevice>(
    device: &mut D,
    geometry: &Geometry,
    slot: u32,
    size_taken: u32,
) -> Result<()> {
    let mut record = read_record(device, geometry, slot)?;
    record.size_taken = size_taken;
    write_record(device, geometry, slot, &record)
}

/// Tombstone the record at `slot` by zeroing its `owner` field. The data
/// page it referenced is left untouched until `defragment` reclaims it.
pub fn tombstone<D: BlockDevice>(device: &mut D, geometry: &Geometry, slot: u32) -> Result<()> {
    let (page, offset) = geometry.record_location(slot);
    let mut page_buf = [0u8; PAGE_SIZE as usize];
    device.read_page(page, &mut page_buf);

    let owner_offset = offset as usize + 4; // owner is the second u32 field
    page_buf[owner_offset..owner_offset + 4].copy_from_slice(&0u32.to_le_bytes());

    device.write_page(page, &page_buf);
    Ok(())
}

/// Allocate the next never-used slot (`N`), writing a fresh record for it.
/// Returns the logical data-page index of the new record (equal to the
/// pre-increment `N`).
pub fn allocate<D: BlockDevice>(
    device: &mut D,
    geometry: &Geometry,
    n: u32,
    owner: u32,
    size_taken: u32,
) -> Result<u32> {
    if n >= geometry.max_metadata_slots() {
        return Err(Error::Capacity(
            "metadata table exhausted: no more slots to allocate".into(),
        ));
    }
    if n >= geometry.data_region_pages() {
        return Err(Error::Capacity("data region is full".into()));
    }

    let record = BlockMetadataRecord {
        page: n,
        owner,
        size_taken,
        crc: 0,
    };
    write_record(device, geometry, n, &record)?;
    Ok(n)
}

/// Find the first live record at a slot index `>= start`, scanning up to
/// (but not including) `limit`. Used by `defragment` to find a live record
/// to pull into an earlier tombstoned slot.
pub fn find_next_live<D: BlockDevice>(
    device: &mut D,
    geometry: &Geometry,
    start: u32,
    limit: u32,
) -> Result<Option<(u32, BlockMetadataRecord)>> {
    let mut scan = MetadataScan::new(device, *geometry, limit);
    for _ in 0..start {
        match scan.next() {
            Some(item) => {
                item?;
            }
            None => return Ok(None),
        }
    }
    for item in scan {
        let (slot, record) = item?;
        if record.is_live() {
            return Ok(Some((slot, record)));
        }
    }
    Ok(None)
}

/// Move the live record at `src_slot` into `dest_slot`: copy its data page,
/// rewrite its `page` field to `dest_slot`, write it into `dest_slot`, and
/// tombstone `src_slot`.
pub fn move_record<D: BlockDevice>(
    device: &mut D,
    geometry: &Geometry,
    src_slot: u32,
    dest_slot: u32,
) -> Result<()> {
    let mut record = read_record(device, geometry, src_slot)?;
    record.page = dest_slot;

    let mut data_buf = [0u8; PAGE_SIZE as usize];
    device.read_page(geometry.data_page_addr(src_slot), &mut data_buf);

    tombstone(device, geometry, src_slot)?;
    write_record(device, geometry, dest_slot, &record)?;
    device.write_page(geometry.data_page_addr(dest_slot), &data_buf);

    Ok(())
}
