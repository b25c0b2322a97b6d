//! Background loops, spawned from `main`. Each runs on its own timer; the
//! submission processor uses lease-based claims so overlapping runs (or
//! multiple processes) cannot double-process a row.

pub mod submissions;
pub mod trending;
