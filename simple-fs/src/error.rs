use derive_more::Display;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "disk is not mounted")]
    NotMounted,
    #[display(fmt = "disk is mounted")]
    AlreadyMounted,
    #[display(fmt = "magic number is invalid")]
    InvalidMagic,
    /// 魔数正确，但记录的布局与设备对不上
    #[display(fmt = "superblock layout is inconsistent")]
    CorruptSuperblock,
    #[display(fmt = "device is too small to hold a filesystem")]
    DeviceTooSmall,
    #[display(fmt = "inode number {} is out of range", _0)]
    InvalidInodeNumber(u32),
    /// 编号合法，但 inode 未被分配
    #[display(fmt = "inode {} is not valid", _0)]
    InodeInvalid(u32),
    #[display(fmt = "inode table is full")]
    InodeTableFull,
    #[display(fmt = "no free block on disk")]
    DiskFull,
    /// 超出直接索引与一级索引的寻址范围
    #[display(fmt = "file exceeds the addressable size")]
    FileTooLarge,
    #[display(fmt = "codec error: {}", _0)]
    Codec(binrw::Error),
}

impl std::error::Error for Error {}

impl From<binrw::Error> for Error {
    fn from(err: binrw::Error) -> Self {
        Self::Codec(err)
    }
}
