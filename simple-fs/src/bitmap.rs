/// 位图组，一个 bit 表示一个块是否被占用
type BitGroup = u64;

const GROUP_BITS: usize = BitGroup::BITS as usize;

/// 空闲块位图，记录设备上每个块的分配情况
///
/// 只存在于内存，挂载时由 inode 表重建。
/// 超级块和 inode 表（即 `0..reserved`）在创建时就被占用，且永远不会被释放。
#[derive(Debug, Clone)]
pub struct Bitmap {
    groups: Vec<BitGroup>,
    /// 设备总块数
    blocks: usize,
    /// 元数据区占据的块数，也是数据区的起始块
    reserved: usize,
}

/// 块编号
struct BlockID(usize);

impl Bitmap {
    pub fn new(blocks: usize, reserved: usize) -> Self {
        let mut bitmap = Self {
            groups: vec![0; blocks.div_ceil(GROUP_BITS)],
            blocks,
            reserved: reserved.min(blocks),
        };
        for block_id in 0..bitmap.reserved {
            let (group_index, ingroup_index) = BlockID(block_id).decode();
            bitmap.groups[group_index] |= 1 << ingroup_index;
        }
        bitmap
    }

    /// 位图所指示区域的总块数
    #[inline]
    pub fn capacity(&self) -> usize {
        self.blocks
    }

    /// 分配编号最小的空闲块。
    /// 若位图的空间用尽，则返回空。
    pub fn alloc(&mut self) -> Option<u32> {
        let (group_index, ingroup_index) =
            self.groups
                .iter()
                .enumerate()
                .find_map(|(group_index, &bits)| {
                    (bits != BitGroup::MAX).then_some((group_index, bits.trailing_ones() as usize))
                })?;

        // 最后一组里超出设备的位不可分配
        let block_id = BlockID::encode(group_index, ingroup_index);
        if block_id >= self.blocks {
            return None;
        }

        self.groups[group_index] |= 1 << ingroup_index;
        Some(block_id as u32)
    }

    /// 把数据区内的块标记为已占用，返回标记前它是否空闲。
    /// 数据区之外的编号不会被接受。
    pub fn mark(&mut self, block_id: u32) -> Option<bool> {
        let (group_index, ingroup_index) = self.data_position(block_id)?;
        let was_free = self.groups[group_index] & (1 << ingroup_index) == 0;
        self.groups[group_index] |= 1 << ingroup_index;
        Some(was_free)
    }

    /// 释放数据区内的块，元数据区与越界的编号被忽略
    pub fn dealloc(&mut self, block_id: u32) {
        let Some((group_index, ingroup_index)) = self.data_position(block_id) else {
            log::warn!("refusing to free block {block_id}: outside data area");
            return;
        };
        if self.groups[group_index] & (1 << ingroup_index) == 0 {
            log::warn!("block {block_id} freed twice");
        }
        self.groups[group_index] &= !(1 << ingroup_index);
    }

    /// 编号是否落在数据区内
    #[inline]
    pub fn contains(&self, block_id: u32) -> bool {
        self.data_position(block_id).is_some()
    }

    pub fn is_used(&self, block_id: u32) -> bool {
        let block_id = block_id as usize;
        if block_id >= self.blocks {
            return false;
        }
        let (group_index, ingroup_index) = BlockID(block_id).decode();
        self.groups[group_index] & (1 << ingroup_index) != 0
    }

    /// 已占用的块数
    pub fn used(&self) -> usize {
        self.groups
            .iter()
            .map(|bits| bits.count_ones() as usize)
            .sum()
    }

    #[inline]
    pub fn free(&self) -> usize {
        self.blocks - self.used()
    }

    fn data_position(&self, block_id: u32) -> Option<(usize, usize)> {
        let block_id = block_id as usize;
        (self.reserved..self.blocks)
            .contains(&block_id)
            .then(|| BlockID(block_id).decode())
    }
}

impl BlockID {
    /// 线性映射编码得到块ID
    #[inline]
    fn encode(group_index: usize, ingroup_index: usize) -> usize {
        group_index * GROUP_BITS + ingroup_index
    }

    #[inline]
    fn decode(self) -> (usize, usize) {
        (self.0 / GROUP_BITS, self.0 % GROUP_BITS)
    }
}
