//! # 索引节点表层
//!
//! inode 编号从 1 开始，`n` 号 inode 位于 inode 表第 `(n-1) / INODES_PER_BLOCK` 块的
//! 第 `(n-1) % INODES_PER_BLOCK` 个槽位；inode 表紧跟在超级块之后。

use std::sync::Arc;

use block_dev::BlockDevice;

use crate::layout::{read_block, write_block, DiskInode, SuperBlock};
use crate::{Error, Result, INODES_PER_BLOCK};

#[derive(Clone)]
pub struct InodeTable {
    block_device: Arc<dyn BlockDevice>,
}

impl InodeTable {
    #[inline]
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        Self { block_device }
    }

    /// 通过编号获取 inode 在磁盘上的位置：**块ID**以及**块内槽位**
    #[inline]
    pub fn position(inumber: u32) -> (u32, usize) {
        let index = inumber as usize - 1;
        (
            1 + (index / INODES_PER_BLOCK) as u32,
            index % INODES_PER_BLOCK,
        )
    }

    /// 由位置反推编号
    #[inline]
    pub fn inumber(block_index: u32, slot: usize) -> u32 {
        block_index * INODES_PER_BLOCK as u32 + slot as u32 + 1
    }

    pub fn load(&self, inumber: u32) -> Result<DiskInode> {
        self.check(inumber)?;
        let (block_id, slot) = Self::position(inumber);
        DiskInode::decode_slot(&read_block(&self.block_device, block_id), slot)
    }

    pub fn save(&self, inumber: u32, inode: &DiskInode) -> Result<()> {
        self.check(inumber)?;
        let (block_id, slot) = Self::position(inumber);
        let mut block = read_block(&self.block_device, block_id);
        inode.encode_slot(&mut block, slot)?;
        write_block(&self.block_device, block_id, &block);
        Ok(())
    }

    /// 超级块不做缓存，每次都重新读出
    fn check(&self, inumber: u32) -> Result<()> {
        let super_block = SuperBlock::load(&self.block_device)?;
        if (1..=super_block.ninodes).contains(&inumber) {
            Ok(())
        } else {
            log::warn!("invalid inode number {inumber}");
            Err(Error::InvalidInodeNumber(inumber))
        }
    }
}

#[cfg(test)]
mod tests {
    use block_dev::RamDisk;

    use super::*;

    #[test]
    fn position_is_one_based() {
        assert_eq!((1, 0), InodeTable::position(1));
        assert_eq!((1, 127), InodeTable::position(128));
        assert_eq!((2, 0), InodeTable::position(129));

        for inumber in [1, 2, 128, 129, 3328] {
            let (block_id, slot) = InodeTable::position(inumber);
            assert_eq!(inumber, InodeTable::inumber(block_id - 1, slot));
        }
    }

    #[test]
    fn load_rejects_out_of_range() {
        let block_device: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(20));
        SuperBlock::new(20, 2).store(&block_device).unwrap();
        let table = InodeTable::new(block_device);

        assert!(matches!(table.load(0), Err(Error::InvalidInodeNumber(0))));
        assert!(matches!(table.load(257), Err(Error::InvalidInodeNumber(257))));
        assert!(table.load(256).is_ok());
    }

    #[test]
    fn save_keeps_neighbours() {
        let block_device: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(20));
        SuperBlock::new(20, 2).store(&block_device).unwrap();
        let table = InodeTable::new(block_device);

        let mut first = DiskInode::new();
        first.size = 1;
        let mut second = DiskInode::new();
        second.size = 2;
        table.save(129, &first).unwrap();
        table.save(130, &second).unwrap();

        assert_eq!(first, table.load(129).unwrap());
        assert_eq!(second, table.load(130).unwrap());
        assert!(!table.load(128).unwrap().is_valid());
    }
}
