//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、光盘、U盘等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统只会按块号整块地读写设备，从不解释设备内部的细节。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

use core::any::Any;

mod ram_disk;

pub use self::ram_disk::RamDisk;

/// 一个块的字节数，设备上所有读写都以此为单位
pub const BLOCK_SIZE: usize = 4096;

/// 块设备驱动特质
///
/// 读写被认为总会成功；越界的块号是调用者的错误。
pub trait BlockDevice: Send + Sync + Any {
    /// 读出 `block_id` 号块，`buf` 恰为 [`BLOCK_SIZE`] 字节
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    /// 写入 `block_id` 号块，`buf` 恰为 [`BLOCK_SIZE`] 字节
    fn write_block(&self, block_id: usize, buf: &[u8]);
    /// 设备的总块数
    fn block_count(&self) -> usize;
}
