//! 间接索引块：整个块连续存储**块编号**，每个编号都指向一个**数据块**

use std::sync::Arc;

use binrw::binrw;
use block_dev::BlockDevice;

use super::{decode, encode, read_block, write_block};
use crate::{Result, BLOCK_SIZE, POINTERS_PER_BLOCK};

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectBlock {
    pub pointers: [u32; POINTERS_PER_BLOCK],
}

impl Default for IndirectBlock {
    fn default() -> Self {
        Self {
            pointers: [0; POINTERS_PER_BLOCK],
        }
    }
}

impl IndirectBlock {
    pub fn load(block_device: &Arc<dyn BlockDevice>, block_id: u32) -> Result<Self> {
        decode(&read_block(block_device, block_id), 0)
    }

    pub fn store(&self, block_device: &Arc<dyn BlockDevice>, block_id: u32) -> Result<()> {
        let mut block = [0; BLOCK_SIZE];
        encode(self, &mut block, 0)?;
        write_block(block_device, block_id, &block);
        Ok(())
    }

    /// 非零的块编号
    pub fn blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.pointers.iter().copied().filter(|&block_id| block_id != 0)
    }
}
