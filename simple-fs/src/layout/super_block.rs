use std::sync::Arc;

use binrw::binrw;
use block_dev::BlockDevice;

use super::{decode, encode, read_block, write_block};
use crate::{Result, BLOCK_SIZE, INODES_PER_BLOCK, MAGIC};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 定位 inode 表与数据块区域
///
/// 只有格式化会写它，其它操作每次都从磁盘重新读出。
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 文件系统占据块数
    pub nblocks: u32,
    /// inode 表占据块数
    pub ninodeblocks: u32,
    /// inode 总数
    pub ninodes: u32,
}

impl SuperBlock {
    pub fn new(nblocks: u32, ninodeblocks: u32) -> Self {
        Self {
            magic: MAGIC,
            nblocks,
            ninodeblocks,
            ninodes: ninodeblocks * INODES_PER_BLOCK as u32,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// 各区域能否放进 `device_blocks` 块的设备里
    pub fn is_consistent(&self, device_blocks: usize) -> bool {
        self.ninodes as u64 == self.ninodeblocks as u64 * INODES_PER_BLOCK as u64
            && self.nblocks as usize <= device_blocks
            && self.ninodeblocks < self.nblocks
    }

    /// 数据块区域的起始块
    #[inline]
    pub fn data_start(&self) -> u32 {
        1 + self.ninodeblocks
    }

    pub fn load(block_device: &Arc<dyn BlockDevice>) -> Result<Self> {
        decode(&read_block(block_device, 0), 0)
    }

    /// 覆写整个 0 号块，块内其余字节清零
    pub fn store(&self, block_device: &Arc<dyn BlockDevice>) -> Result<()> {
        let mut block = [0; BLOCK_SIZE];
        encode(self, &mut block, 0)?;
        write_block(block_device, 0, &block);
        Ok(())
    }
}
