//! Planner module for laser-motion.
//!
//! Converts targets into blocks, queues them and re-plans junction speeds
//! over the whole buffer with a reverse and a forward pass.

mod block;
mod buffer;
mod junction;
mod lookahead;
mod plan;
mod sync;

pub use block::{Block, BlockKind};
pub use buffer::BlockBuffer;
pub use junction::{max_junction_speed, Segment};
pub use plan::Planner;
