use alloc::boxed::Box;
use alloc::vec;

use spin::Mutex;

use crate::{BlockDevice, BLOCK_SIZE};

/// 内存中的块设备，内容随进程消失
#[derive(Debug)]
pub struct RamDisk {
    data: Mutex<Box<[u8]>>,
    blocks: usize,
}

impl RamDisk {
    /// 创建 `blocks` 块、全零的设备
    pub fn new(blocks: usize) -> Self {
        Self {
            data: Mutex::new(vec![0; blocks * BLOCK_SIZE].into_boxed_slice()),
            blocks,
        }
    }

    #[inline]
    fn range(&self, block_id: usize, len: usize) -> core::ops::Range<usize> {
        assert!(block_id < self.blocks, "block {block_id} is out of device");
        assert_eq!(len, BLOCK_SIZE, "not a complete block!");
        block_id * BLOCK_SIZE..(block_id + 1) * BLOCK_SIZE
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let range = self.range(block_id, buf.len());
        buf.copy_from_slice(&self.data.lock()[range]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let range = self.range(block_id, buf.len());
        self.data.lock()[range].copy_from_slice(buf);
    }

    #[inline]
    fn block_count(&self) -> usize {
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_independent() {
        let disk = RamDisk::new(3);
        disk.write_block(1, &[7; BLOCK_SIZE]);

        let mut buf = [1; BLOCK_SIZE];
        disk.read_block(0, &mut buf);
        assert!(buf.iter().all(|&b| b == 0));
        disk.read_block(1, &mut buf);
        assert!(buf.iter().all(|&b| b == 7));
        assert_eq!(3, disk.block_count());
    }

    #[test]
    #[should_panic(expected = "out of device")]
    fn out_of_range_block() {
        let disk = RamDisk::new(2);
        disk.read_block(2, &mut [0; BLOCK_SIZE]);
    }
}
