use std::sync::Arc;

use simple_fs::layout::{DiskInode, IndirectBlock, SuperBlock};
use simple_fs::{BlockDevice, BLOCK_SIZE, INODES_PER_BLOCK, INODE_SIZE, MAGIC, POINTERS_PER_BLOCK};

fn word(block: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(block[offset..offset + 4].try_into().unwrap())
}

#[test]
fn sizes() {
    assert_eq!(4096, BLOCK_SIZE);
    assert_eq!(32, INODE_SIZE);
    assert_eq!(128, INODES_PER_BLOCK);
    assert_eq!(1024, POINTERS_PER_BLOCK);
}

#[test]
fn super_block_bytes() {
    let dev: Arc<dyn BlockDevice> = Arc::new(block_dev::RamDisk::new(4));
    dev.write_block(0, &[0xEE; BLOCK_SIZE]);
    SuperBlock::new(256, 26).store(&dev).unwrap();

    let mut block = [0; BLOCK_SIZE];
    dev.read_block(0, &mut block);
    assert_eq!(MAGIC, word(&block, 0));
    assert_eq!(256, word(&block, 4));
    assert_eq!(26, word(&block, 8));
    assert_eq!(26 * 128, word(&block, 12));
    assert!(block[16..].iter().all(|&b| b == 0));

    let super_block = SuperBlock::load(&dev).unwrap();
    assert!(super_block.is_valid());
    assert_eq!(27, super_block.data_start());
}

#[test]
fn inode_bytes() {
    let mut block = [0; BLOCK_SIZE];
    let mut inode = DiskInode::new();
    inode.size = 10000;
    inode.direct = [27, 28, 29, 0, 0];
    inode.indirect = 40;
    inode.encode_slot(&mut block, 1).unwrap();

    assert!(block[..INODE_SIZE].iter().all(|&b| b == 0));
    assert_eq!(1, word(&block, 32));
    assert_eq!(10000, word(&block, 36));
    assert_eq!(27, word(&block, 40));
    assert_eq!(28, word(&block, 44));
    assert_eq!(29, word(&block, 48));
    assert_eq!(0, word(&block, 56));
    assert_eq!(40, word(&block, 60));
    assert!(block[2 * INODE_SIZE..].iter().all(|&b| b == 0));
}

#[test]
fn indirect_bytes() {
    let dev: Arc<dyn BlockDevice> = Arc::new(block_dev::RamDisk::new(4));
    let mut indirect = IndirectBlock::default();
    indirect.pointers[0] = 7;
    indirect.pointers[POINTERS_PER_BLOCK - 1] = 0xDEAD;
    indirect.store(&dev, 3).unwrap();

    let mut block = [0; BLOCK_SIZE];
    dev.read_block(3, &mut block);
    assert_eq!(7, word(&block, 0));
    assert_eq!(0xDEAD, word(&block, BLOCK_SIZE - 4));
    assert_eq!(vec![7, 0xDEAD], IndirectBlock::load(&dev, 3).unwrap().blocks().collect::<Vec<_>>());
}
