//! Block device adapter: the 512-byte page read/write contract SFS sits on.
//!
//! The spec treats the underlying device as reliable and synchronous; a
//! `BlockDevice` implementation is expected to panic rather than return an
//! error for an out-of-range page address, since that is a programmer
//! error, not a recoverable condition the filesystem format has any answer
//! for.
#![allow(clippy::expect_used)]

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::Result;
use crate::geometry::PAGE_SIZE;

/// A page-addressable block device exposing fixed 512-byte pages.
pub trait BlockDevice {
    /// Read the 512-byte page at `page_addr` into `into`.
    fn read_page(&mut self, page_addr: u32, into: &mut [u8; PAGE_SIZE as usize]);

    /// Write the 512-byte page `from` at `page_addr`.
    fn write_page(&mut self, page_addr: u32, from: &[u8; PAGE_SIZE as usize]);

    /// Total capacity of the device, in bytes.
    fn capacity_bytes(&self) -> u64;
}

/// An in-memory block device, the test-double equivalent of the reference
/// C implementation's static `_sd_card_buffer`.
pub struct MemoryDevice {
    pages: Vec<u8>,
}

impl MemoryDevice {
    /// Create a zeroed device with room for `capacity_bytes` bytes, rounded
    /// down to a whole number of pages.
    pub fn new(capacity_bytes: u64) -> Self {
        let page_count = (capacity_bytes / PAGE_SIZE as u64) as usize;
        Self {
            pages: vec![0u8; page_count * PAGE_SIZE as usize],
        }
    }
}

impl BlockDevice for MemoryDevice {
    fn read_page(&mut self, page_addr: u32, into: &mut [u8; PAGE_SIZE as usize]) {
        let start = page_addr as usize * PAGE_SIZE as usize;
        into.copy_from_slice(&self.pages[start..start + PAGE_SIZE as usize]);
    }

    fn write_page(&mut self, page_addr: u32, from: &[u8; PAGE_SIZE as usize]) {
        let start = page_addr as usize * PAGE_SIZE as usize;
        self.pages[start..start + PAGE_SIZE as usize].copy_from_slice(from);
    }

    fn capacity_bytes(&self) -> u64 {
        self.pages.len() as u64
    }
}

/// A block device backed by a real file on disk, for exercising the on-disk
/// format against genuine storage rather than a `Vec<u8>` stand-in.
pub struct FileDevice {
    file: File,
    capacity_bytes: u64,
}

impl FileDevice {
    /// Open (creating if absent) a file at `path` and grow it to
    /// `capacity_bytes`, zero-filling any newly extended region.
    pub fn open<P: AsRef<Path>>(path: P, capacity_bytes: u64) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.set_len(capacity_bytes)?;
        Ok(Self {
            file,
            capacity_bytes,
        })
    }
}

impl BlockDevice for FileDevice {
    fn read_page(&mut self, page_addr: u32, into: &mut [u8; PAGE_SIZE as usize]) {
        self.file
            .seek(SeekFrom::Start(page_addr as u64 * PAGE_SIZE as u64))
            .expect("seek within file device bounds");
        self.file
            .read_exact(into)
            .expect("read full page from file device");
    }

    fn write_page(&mut self, page_addr: u32, from: &[u8; PAGE_SIZE as usize]) {
        self.file
            .seek(SeekFrom::Start(page_addr as u64 * PAGE_SIZE as u64))
            .expect("seek within file device bounds");
        self.file
            .write_all(from)
            .expect("write full page to file device");
    }

    fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }
}
