//! Low-level persistence primitives: the packed codec and mmap-backed
//! fixed-width vectors. Every file an index writes goes through one of
//! these two layers.

pub mod disk_vector;
pub mod packed;
