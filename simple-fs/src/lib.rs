/* simple-fs 的整体架构，自上而下 */

// 文件系统引擎层：格式化、挂载与文件的创建、删除、读写
mod sfs;

// 只读的自检报告
mod report;

// 索引节点表层：inode 编号与磁盘位置的互相转换
mod inode_table;

// 空闲块位图：挂载时由 inode 元数据重建，只存在于内存
mod bitmap;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
pub mod layout;

mod error;

pub use block_dev::{BlockDevice, BLOCK_SIZE};

pub use self::{
    bitmap::Bitmap,
    error::{Error, Result},
    report::{IndirectReport, InodeReport, Report},
    sfs::{SharedFileSystem, SimpleFileSystem},
};

/// 魔数：用于校验文件系统合法性
pub const MAGIC: u32 = 0xf0f0_3410;
/// 每个 inode 的直接索引个数
pub const POINTERS_PER_INODE: usize = 5;
/// 磁盘上一个 inode 记录的字节数
pub const INODE_SIZE: usize = 32;
/// 一个 inode 表块容纳的 inode 数
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;
/// 间接索引块可编号数量
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;
/// 单个文件最多占用的数据块数
pub const MAX_FILE_BLOCKS: usize = POINTERS_PER_INODE + POINTERS_PER_BLOCK;

type DataBlock = [u8; BLOCK_SIZE];
