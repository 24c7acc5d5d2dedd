//! # 文件系统引擎层
//!
//! 构建出磁盘的布局并使用：格式化、挂载，以及 inode 的创建、删除与读写。
//!
//! 挂载状态与空闲块位图只属于一个引擎实例；
//! 需要被多个调用者共享时，使用 [`SharedFileSystem`]，每次调用都在锁内完成。

use std::sync::Arc;

use block_dev::BlockDevice;
use spin::Mutex;

use crate::bitmap::Bitmap;
use crate::inode_table::InodeTable;
use crate::layout::{read_block, write_block, DiskInode, IndirectBlock, SuperBlock};
use crate::{Error, IndirectReport, InodeReport, Report, Result};
use crate::{BLOCK_SIZE, INODES_PER_BLOCK, MAX_FILE_BLOCKS, POINTERS_PER_BLOCK, POINTERS_PER_INODE};

/// 可在多个调用者之间共享的引擎
pub type SharedFileSystem = Arc<Mutex<SimpleFileSystem>>;

pub struct SimpleFileSystem {
    block_device: Arc<dyn BlockDevice>,
    inode_table: InodeTable,
    /// 挂载后才存在
    bitmap: Option<Bitmap>,
}

impl SimpleFileSystem {
    /// 未挂载的引擎，不会读写设备
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        Self {
            inode_table: InodeTable::new(block_device.clone()),
            block_device,
            bitmap: None,
        }
    }

    #[inline]
    pub fn into_shared(self) -> SharedFileSystem {
        Arc::new(Mutex::new(self))
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.bitmap.is_some()
    }

    /// 当前挂载会话的空闲块位图
    #[inline]
    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.bitmap.as_ref()
    }

    /// 空闲的数据块数
    pub fn free_blocks(&self) -> Result<usize> {
        self.bitmap.as_ref().map(Bitmap::free).ok_or(Error::NotMounted)
    }

    /// 已占用的块数，包括超级块与 inode 表
    pub fn used_blocks(&self) -> Result<usize> {
        self.bitmap.as_ref().map(Bitmap::used).ok_or(Error::NotMounted)
    }

    /// 重写超级块并作废 inode 表中的所有 inode。
    /// 数据块不会被清零，也不会重建位图。
    pub fn format(&mut self) -> Result<()> {
        if self.is_mounted() {
            log::warn!("refusing to format a mounted disk");
            return Err(Error::AlreadyMounted);
        }

        let nblocks = self.block_device.block_count();
        // 10% 的块留给 inode 表
        let ninodeblocks = nblocks.div_ceil(10);
        // 超级块 + inode 表 + 至少一个数据块
        if nblocks < ninodeblocks + 2 {
            return Err(Error::DeviceTooSmall);
        }

        // 旧 inode 表与新 inode 表的并集都要作废
        let old = SuperBlock::load(&self.block_device)?;
        let old_extent = if old.is_valid() {
            old.ninodeblocks as usize
        } else {
            0
        };
        let extent = old_extent.max(ninodeblocks).min(nblocks - 1);

        for block_id in 1..=extent as u32 {
            let mut block = read_block(&self.block_device, block_id);
            let mut modified = false;
            for slot in 0..INODES_PER_BLOCK {
                let mut inode = DiskInode::decode_slot(&block, slot)?;
                if inode.is_valid() {
                    inode.invalidate();
                    inode.encode_slot(&mut block, slot)?;
                    modified = true;
                }
            }
            if modified {
                write_block(&self.block_device, block_id, &block);
            }
        }

        let super_block = SuperBlock::new(nblocks as u32, ninodeblocks as u32);
        super_block.store(&self.block_device)?;
        log::info!(
            "formatted: {} blocks, {} inode blocks, {} inodes",
            super_block.nblocks,
            super_block.ninodeblocks,
            super_block.ninodes
        );

        Ok(())
    }

    /// 校验超级块，并扫描 inode 表重建空闲块位图。
    /// 已挂载时再次挂载会重建位图。
    pub fn mount(&mut self) -> Result<()> {
        let super_block = SuperBlock::load(&self.block_device)?;
        if !super_block.is_valid() {
            log::warn!("file system invalid, format disk");
            return Err(Error::InvalidMagic);
        }
        if !super_block.is_consistent(self.block_device.block_count()) {
            log::warn!("superblock does not fit the device: {super_block:?}");
            return Err(Error::CorruptSuperblock);
        }

        let mut bitmap = Bitmap::new(
            super_block.nblocks as usize,
            super_block.data_start() as usize,
        );

        for block_index in 0..super_block.ninodeblocks {
            let block = read_block(&self.block_device, 1 + block_index);
            for slot in 0..INODES_PER_BLOCK {
                let inode = DiskInode::decode_slot(&block, slot)?;
                if !inode.is_valid() {
                    continue;
                }

                let inumber = InodeTable::inumber(block_index, slot);
                for block_id in inode.direct_blocks() {
                    Self::claim(&mut bitmap, inumber, block_id);
                }

                if inode.indirect != 0 && Self::claim(&mut bitmap, inumber, inode.indirect) {
                    let indirect = IndirectBlock::load(&self.block_device, inode.indirect)?;
                    for block_id in indirect.blocks() {
                        Self::claim(&mut bitmap, inumber, block_id);
                    }
                }
            }
        }

        log::info!(
            "mounted: {} of {} blocks in use",
            bitmap.used(),
            bitmap.capacity()
        );
        self.bitmap = Some(bitmap);

        Ok(())
    }

    /// 占用第一个空闲的 inode 槽位，返回其编号
    pub fn create(&mut self) -> Result<u32> {
        if !self.is_mounted() {
            return Err(Error::NotMounted);
        }

        let super_block = SuperBlock::load(&self.block_device)?;
        for block_index in 0..super_block.ninodeblocks {
            let block = read_block(&self.block_device, 1 + block_index);
            for slot in 0..INODES_PER_BLOCK {
                if DiskInode::decode_slot(&block, slot)?.is_valid() {
                    continue;
                }

                let inumber = InodeTable::inumber(block_index, slot);
                self.inode_table.save(inumber, &DiskInode::new())?;
                log::debug!("created inode {inumber}");
                return Ok(inumber);
            }
        }

        log::warn!("no free inode");
        Err(Error::InodeTableFull)
    }

    /// 释放 inode 占用的全部块，并作废该 inode
    pub fn delete(&mut self, inumber: u32) -> Result<()> {
        let mut inode = self.load_valid(inumber)?;
        let bitmap = self.bitmap.as_mut().ok_or(Error::NotMounted)?;

        for block_id in inode.direct.iter_mut().filter(|block_id| **block_id != 0) {
            bitmap.dealloc(*block_id);
            *block_id = 0;
        }

        if bitmap.contains(inode.indirect) {
            let indirect = IndirectBlock::load(&self.block_device, inode.indirect)?;
            for block_id in indirect.blocks() {
                bitmap.dealloc(block_id);
            }
            bitmap.dealloc(inode.indirect);
        } else if inode.indirect != 0 {
            log::warn!("inode {inumber}: indirect block {} is outside data area", inode.indirect);
        }
        inode.indirect = 0;

        inode.invalidate();
        inode.size = 0;
        self.inode_table.save(inumber, &inode)?;
        log::debug!("deleted inode {inumber}");

        Ok(())
    }

    pub fn getsize(&self, inumber: u32) -> Result<u32> {
        self.load_valid(inumber).map(|inode| inode.size)
    }

    /// 从 `offset` 处读出数据填充 `buf`，返回读出的字节数。
    /// 越过文件末尾的部分不会被读出；`offset` 不小于文件大小时返回 0。
    pub fn read(&self, inumber: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        let inode = self.load_valid(inumber)?;
        if offset >= inode.size as usize {
            return Ok(0);
        }
        let end = offset.saturating_add(buf.len()).min(inode.size as usize);
        let mut indirect = None;

        let mut start = offset;
        // 已读取多少字节
        let mut read_size = 0;
        while start < end {
            // 当前块的逻辑索引
            let block_index = start / BLOCK_SIZE;
            // 当前块的末地址(字节)
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_read_size = current_block_end - start;
            let dest = &mut buf[read_size..read_size + block_read_size];

            match self.block_id(&inode, &mut indirect, block_index)? {
                // 写越过文件末尾时留下的空洞
                0 => dest.fill(0),
                block_id => {
                    let block = read_block(&self.block_device, block_id);
                    // 绝对地址 % 块大小 = 块内偏移
                    let inblock = start % BLOCK_SIZE;
                    dest.copy_from_slice(&block[inblock..inblock + block_read_size]);
                }
            }

            read_size += block_read_size;
            start = current_block_end;
        }

        Ok(read_size)
    }

    /// 把 `data` 写到 `offset` 处，按需分配数据块与间接索引块，返回写入的字节数。
    ///
    /// 空间耗尽时立即停止：已写入部分保留，返回值小于 `data.len()`；
    /// 一个字节都没写入时返回 [`Error::DiskFull`]。
    pub fn write(&mut self, inumber: u32, data: &[u8], offset: usize) -> Result<usize> {
        let mut inode = self.load_valid(inumber)?;
        let bitmap = self.bitmap.as_mut().ok_or(Error::NotMounted)?;
        if !data.is_empty() && offset >= MAX_FILE_BLOCKS * BLOCK_SIZE {
            log::warn!("inode {inumber}: offset {offset} exceeds the addressable size");
            return Err(Error::FileTooLarge);
        }
        let original = inode;
        let mut indirect = None;

        let mut written_size = 0;
        let mut stopped = None;
        while written_size < data.len() {
            let start = offset + written_size;
            let block_index = start / BLOCK_SIZE;

            let block_id = match Self::map_block(
                &self.block_device,
                bitmap,
                &mut inode,
                &mut indirect,
                block_index,
            ) {
                Ok(block_id) => block_id,
                Err(err) => {
                    stopped = Some(err);
                    break;
                }
            };

            let inblock = start % BLOCK_SIZE;
            let block_write_size = (BLOCK_SIZE - inblock).min(data.len() - written_size);
            let mut block = read_block(&self.block_device, block_id);
            block[inblock..inblock + block_write_size]
                .copy_from_slice(&data[written_size..written_size + block_write_size]);
            write_block(&self.block_device, block_id, &block);

            written_size += block_write_size;
        }

        // 一个字节都没写入时大小不变
        if written_size > 0 {
            let end = u32::try_from(offset + written_size).map_err(|_| Error::FileTooLarge)?;
            inode.size = inode.size.max(end);
        }
        // 新分配的块必须落盘，否则下次挂载会丢失
        if inode != original {
            self.inode_table.save(inumber, &inode)?;
        }

        match stopped {
            Some(Error::DiskFull | Error::FileTooLarge) if written_size > 0 => {
                log::warn!(
                    "inode {inumber}: short write, {written_size} of {} bytes",
                    data.len()
                );
                Ok(written_size)
            }
            Some(err) => Err(err),
            None => Ok(written_size),
        }
    }

    /// 直接从磁盘读出的概况，不依赖也不改变挂载状态
    pub fn debug(&self) -> Result<Report> {
        let super_block = SuperBlock::load(&self.block_device)?;
        let mut report = Report {
            super_block,
            inodes: Vec::new(),
        };
        if !super_block.is_valid() {
            return Ok(report);
        }

        let device_blocks = self.block_device.block_count();
        let extent = (super_block.ninodeblocks as usize).min(device_blocks.saturating_sub(1));
        for block_index in 0..extent as u32 {
            let block = read_block(&self.block_device, 1 + block_index);
            for slot in 0..INODES_PER_BLOCK {
                let inode = DiskInode::decode_slot(&block, slot)?;
                if !inode.is_valid() {
                    continue;
                }

                let indirect = match inode.indirect {
                    0 => None,
                    block if (block as usize) < device_blocks => Some(IndirectReport {
                        block,
                        pointers: IndirectBlock::load(&self.block_device, block)?
                            .blocks()
                            .collect(),
                    }),
                    block => Some(IndirectReport {
                        block,
                        pointers: Vec::new(),
                    }),
                };

                report.inodes.push(InodeReport {
                    inumber: InodeTable::inumber(block_index, slot),
                    size: inode.size,
                    direct: inode.direct_blocks().collect(),
                    indirect,
                });
            }
        }

        Ok(report)
    }
}

impl SimpleFileSystem {
    fn load_valid(&self, inumber: u32) -> Result<DiskInode> {
        if !self.is_mounted() {
            log::warn!("disk is not mounted");
            return Err(Error::NotMounted);
        }

        let inode = self.inode_table.load(inumber)?;
        if inode.is_valid() {
            Ok(inode)
        } else {
            log::warn!("inode {inumber} is not valid");
            Err(Error::InodeInvalid(inumber))
        }
    }

    /// 挂载扫描时占用一个块；越界的编号被跳过
    fn claim(bitmap: &mut Bitmap, inumber: u32, block_id: u32) -> bool {
        match bitmap.mark(block_id) {
            Some(true) => true,
            Some(false) => {
                log::warn!("inode {inumber}: block {block_id} is shared");
                true
            }
            None => {
                log::warn!("inode {inumber}: block {block_id} is outside data area");
                false
            }
        }
    }

    /// 逻辑上 inode 指向一系列数据块，此处传入的是这些数据块的索引（逻辑索引），
    /// 返回其物理块号；0 表示尚未分配
    fn block_id(
        &self,
        inode: &DiskInode,
        indirect: &mut Option<IndirectBlock>,
        block_index: usize,
    ) -> Result<u32> {
        if let Some(&block_id) = inode.direct.get(block_index) {
            return Ok(self.checked(block_id));
        }
        if self.checked(inode.indirect) == 0 {
            return Ok(0);
        }

        let block = match indirect.take() {
            Some(block) => block,
            None => IndirectBlock::load(&self.block_device, inode.indirect)?,
        };
        let block = indirect.insert(block);

        // 剔去直接索引的部分
        let block_id = block
            .pointers
            .get(block_index - POINTERS_PER_INODE)
            .copied()
            .unwrap_or(0);
        Ok(self.checked(block_id))
    }

    /// 设备之外的块号视作未分配
    fn checked(&self, block_id: u32) -> u32 {
        if (block_id as usize) < self.block_device.block_count() {
            block_id
        } else {
            log::warn!("block {block_id} is outside the device");
            0
        }
    }

    /// 数据区之外的非零编号来自损坏的镜像，写入时当作未分配
    fn usable(bitmap: &Bitmap, block_id: u32) -> bool {
        if bitmap.contains(block_id) {
            true
        } else {
            if block_id != 0 {
                log::warn!("replacing block {block_id}: outside data area");
            }
            false
        }
    }

    /// 同 [`Self::block_id`]，但为未分配的位置分配新块。
    /// 间接索引块在第一次需要时分配，其中的编号一经改动立即写回。
    fn map_block(
        block_device: &Arc<dyn BlockDevice>,
        bitmap: &mut Bitmap,
        inode: &mut DiskInode,
        indirect: &mut Option<IndirectBlock>,
        block_index: usize,
    ) -> Result<u32> {
        if let Some(block_id) = inode.direct.get_mut(block_index) {
            if !Self::usable(bitmap, *block_id) {
                *block_id = bitmap.alloc().ok_or(Error::DiskFull)?;
                log::debug!("allocated direct block {block_id}");
            }
            return Ok(*block_id);
        }

        let index = block_index - POINTERS_PER_INODE;
        if index >= POINTERS_PER_BLOCK {
            return Err(Error::FileTooLarge);
        }

        let block = match indirect.take() {
            Some(block) => block,
            None if !Self::usable(bitmap, inode.indirect) => {
                inode.indirect = bitmap.alloc().ok_or(Error::DiskFull)?;
                log::debug!("allocated indirect block {}", inode.indirect);
                // 释放的块不会被清零，新的间接索引块要先写零
                let block = IndirectBlock::default();
                block.store(block_device, inode.indirect)?;
                block
            }
            None => IndirectBlock::load(block_device, inode.indirect)?,
        };
        let block = indirect.insert(block);

        if !Self::usable(bitmap, block.pointers[index]) {
            block.pointers[index] = bitmap.alloc().ok_or(Error::DiskFull)?;
            log::debug!("allocated indirect data block {}", block.pointers[index]);
            block.store(block_device, inode.indirect)?;
        }

        Ok(block.pointers[index])
    }
}
