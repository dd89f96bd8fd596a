//! Fixed-capacity block ring.

use heapless::Deque;

use super::block::Block;

/// Single-producer single-consumer queue of planned blocks.
///
/// Index 0 is the oldest block (the one the engine runs next, or is running);
/// index `len() - 1` is the newest.
#[derive(Debug, Clone)]
pub struct BlockBuffer<const N: usize> {
    blocks: Deque<Block, N>,
}

impl<const N: usize> BlockBuffer<N> {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            blocks: Deque::new(),
        }
    }

    /// Get the number of queued blocks.
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if no block is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Check if every slot is taken.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.blocks.is_full()
    }

    /// Get the total number of slots.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Get the number of free slots.
    #[inline]
    pub fn free(&self) -> usize {
        N - self.blocks.len()
    }

    /// Append a block, handing it back if the buffer is full.
    pub fn push(&mut self, block: Block) -> Result<(), Block> {
        self.blocks.push_back(block)
    }

    /// Get the oldest block.
    #[inline]
    pub fn front(&self) -> Option<&Block> {
        self.blocks.front()
    }

    /// Get the newest block.
    #[inline]
    pub fn newest(&self) -> Option<&Block> {
        self.blocks.back()
    }

    /// Remove and return the oldest block.
    pub fn pop_front(&mut self) -> Option<Block> {
        self.blocks.pop_front()
    }

    /// Drop every queued block.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Get the block at `index` (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Block> {
        let (front, back) = self.blocks.as_slices();
        if index < front.len() {
            front.get(index)
        } else {
            back.get(index - front.len())
        }
    }

    /// Get the block at `index` mutably (0 = oldest).
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Block> {
        let (front, back) = self.blocks.as_mut_slices();
        if index < front.len() {
            front.get_mut(index)
        } else {
            back.get_mut(index - front.len())
        }
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}

impl<const N: usize> Default for BlockBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::BlockKind;

    fn dwell(ns: u64) -> Block {
        Block::dwell(ns, 0)
    }

    #[test]
    fn test_fifo_order() {
        let mut buffer: BlockBuffer<4> = BlockBuffer::new();
        assert!(buffer.is_empty());

        buffer.push(dwell(1)).unwrap();
        buffer.push(dwell(2)).unwrap();
        buffer.push(dwell(3)).unwrap();

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.front().unwrap().dwell_ns, 1);
        assert_eq!(buffer.newest().unwrap().dwell_ns, 3);
        assert_eq!(buffer.pop_front().unwrap().dwell_ns, 1);
        assert_eq!(buffer.get(0).unwrap().dwell_ns, 2);
        assert_eq!(buffer.get(1).unwrap().dwell_ns, 3);
        assert!(buffer.get(2).is_none());
    }

    #[test]
    fn test_full_hands_block_back() {
        let mut buffer: BlockBuffer<2> = BlockBuffer::new();
        buffer.push(dwell(1)).unwrap();
        buffer.push(dwell(2)).unwrap();

        assert!(buffer.is_full());
        assert_eq!(buffer.free(), 0);
        let rejected = buffer.push(dwell(3)).unwrap_err();
        assert_eq!(rejected.dwell_ns, 3);
    }

    #[test]
    fn test_index_across_wrap() {
        let mut buffer: BlockBuffer<3> = BlockBuffer::new();
        for ns in 0..3 {
            buffer.push(dwell(ns)).unwrap();
        }
        buffer.pop_front();
        buffer.pop_front();
        buffer.push(dwell(3)).unwrap();
        buffer.push(dwell(4)).unwrap();

        let order: heapless::Vec<u64, 3> = buffer.iter().map(|b| b.dwell_ns).collect();
        assert_eq!(order.as_slice(), &[2, 3, 4]);
        for (i, ns) in [2u64, 3, 4].into_iter().enumerate() {
            assert_eq!(buffer.get(i).unwrap().dwell_ns, ns);
        }

        buffer.get_mut(2).unwrap().kind = BlockKind::Cancel;
        assert_eq!(buffer.newest().unwrap().kind, BlockKind::Cancel);
    }

    #[test]
    fn test_clear() {
        let mut buffer: BlockBuffer<2> = BlockBuffer::default();
        buffer.push(dwell(1)).unwrap();
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.free(), buffer.capacity());
    }
}
