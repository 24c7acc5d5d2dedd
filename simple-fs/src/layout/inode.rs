use binrw::binrw;
use enumflags2::{bitflags, BitFlags};

use super::{decode, encode};
use crate::{DataBlock, Result, INODE_SIZE, POINTERS_PER_INODE};

/// 磁盘上的 inode 记录，固定 [`INODE_SIZE`] 字节
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskInode {
    /// 见 [`InodeFlag`]，不用枚举是为了严控布局
    flags: u32,
    /// 文件字节数
    pub size: u32,
    /// 直接索引块，0 表示未分配
    pub direct: [u32; POINTERS_PER_INODE],
    /// 指向一个一级索引块，0 表示不存在
    pub indirect: u32,
}

#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeFlag {
    /// 此槽位已被分配
    Valid = 0b0001,
}

impl DiskInode {
    /// 已分配、大小为 0、不指向任何块的 inode
    #[inline]
    pub fn new() -> Self {
        Self {
            flags: BitFlags::from_flag(InodeFlag::Valid).bits(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn flags(&self) -> BitFlags<InodeFlag> {
        BitFlags::from_bits_truncate(self.flags)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.flags().contains(InodeFlag::Valid)
    }

    /// 只清除有效位，其余字段原样保留
    pub fn invalidate(&mut self) {
        let mut flags = self.flags();
        flags.remove(InodeFlag::Valid);
        self.flags = flags.bits();
    }

    /// 非零的直接索引
    pub fn direct_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.direct.iter().copied().filter(|&block_id| block_id != 0)
    }

    /// 从 inode 表块中取出第 `slot` 个 inode
    #[inline]
    pub fn decode_slot(block: &DataBlock, slot: usize) -> Result<Self> {
        decode(block, slot * INODE_SIZE)
    }

    #[inline]
    pub fn encode_slot(&self, block: &mut DataBlock, slot: usize) -> Result<()> {
        encode(self, block, slot * INODE_SIZE)
    }
}
