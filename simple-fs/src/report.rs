use core::fmt;

use crate::layout::SuperBlock;

/// 直接从磁盘读出的文件系统概况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub super_block: SuperBlock,
    /// 所有有效的 inode，按编号升序
    pub inodes: Vec<InodeReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeReport {
    pub inumber: u32,
    pub size: u32,
    /// 非零的直接索引
    pub direct: Vec<u32>,
    pub indirect: Option<IndirectReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectReport {
    pub block: u32,
    /// 间接索引块内非零的编号；块号越界时为空
    pub pointers: Vec<u32>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let super_block = &self.super_block;
        writeln!(f, "superblock:")?;
        if super_block.is_valid() {
            writeln!(f, "    magic number is valid")?;
        } else {
            writeln!(f, "    magic number is invalid!")?;
        }
        writeln!(f, "    {} blocks", super_block.nblocks)?;
        writeln!(f, "    {} inode blocks", super_block.ninodeblocks)?;
        writeln!(f, "    {} inodes", super_block.ninodes)?;

        for inode in &self.inodes {
            write!(f, "{inode}")?;
        }

        Ok(())
    }
}

impl fmt::Display for InodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "inode {}:", self.inumber)?;
        writeln!(f, "    size: {} bytes", self.size)?;
        write!(f, "    direct blocks:")?;
        for block_id in &self.direct {
            write!(f, " {block_id}")?;
        }
        writeln!(f)?;

        if let Some(indirect) = &self.indirect {
            writeln!(f, "    indirect block: {}", indirect.block)?;
            write!(f, "    indirect data blocks:")?;
            for block_id in &indirect.pointers {
                write!(f, " {block_id}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
