#[cfg(test)]
mod tests;

mod command;
mod file_ops;

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use block_dev::{BlockDevice, BLOCK_SIZE};

pub use self::{
    command::{execute, Command, Flow},
    file_ops::{copyin, copyout},
};

/// A disk image emulated by a host file of `blocks * BLOCK_SIZE` bytes.
#[derive(Debug)]
pub struct BlockFile {
    file: Mutex<File>,
    blocks: usize,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl BlockFile {
    /// Opens (or creates) the image and resizes it to exactly `blocks` blocks.
    pub fn open(path: impl AsRef<Path>, blocks: usize) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.set_len((blocks * BLOCK_SIZE) as u64)?;

        Ok(Self {
            file: Mutex::new(file),
            blocks,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        })
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn sanity_check(&self, block_id: usize, buf: &[u8]) {
        assert!(block_id < self.blocks, "block number {block_id} is too big");
        assert_eq!(buf.len(), BLOCK_SIZE, "not a complete block!");
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        self.sanity_check(block_id, buf);
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        file.read_exact(buf).expect("not a complete block!");
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        self.sanity_check(block_id, buf);
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        file.write_all(buf).expect("not a complete block!");
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn block_count(&self) -> usize {
        self.blocks
    }
}
