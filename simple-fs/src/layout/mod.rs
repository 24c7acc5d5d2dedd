//! # 磁盘数据结构层
//!
//! simple-fs 的磁盘布局：
//! 超级块 | 索引节点表 | 数据块区域
//!
//! 每种结构都以小端序显式地编码进一个块、再从块中解码出来，
//! 不依赖内存布局的重新解释。

mod indirect;
mod inode;
mod super_block;

use std::io::Cursor;
use std::sync::Arc;

use binrw::{BinRead, BinWrite, Endian};
use block_dev::BlockDevice;

use crate::{DataBlock, Result, BLOCK_SIZE};

pub use self::{
    indirect::IndirectBlock,
    inode::{DiskInode, InodeFlag},
    super_block::SuperBlock,
};

/// 从块内 `offset` 处解码出一个 `T`
pub fn decode<T>(block: &DataBlock, offset: usize) -> Result<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let mut cursor = Cursor::new(&block[..]);
    cursor.set_position(offset as u64);
    Ok(T::read_options(&mut cursor, Endian::Little, ())?)
}

/// 把 `value` 编码到块内 `offset` 处，块的其余部分保持不变
pub fn encode<T>(value: &T, block: &mut DataBlock, offset: usize) -> Result<()>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let mut cursor = Cursor::new(&mut block[..]);
    cursor.set_position(offset as u64);
    value.write_options(&mut cursor, Endian::Little, ())?;
    Ok(())
}

#[inline]
pub fn read_block(block_device: &Arc<dyn BlockDevice>, block_id: u32) -> DataBlock {
    let mut block = [0; BLOCK_SIZE];
    block_device.read_block(block_id as usize, &mut block);
    block
}

#[inline]
pub fn write_block(block_device: &Arc<dyn BlockDevice>, block_id: u32, block: &DataBlock) {
    block_device.write_block(block_id as usize, block);
}
