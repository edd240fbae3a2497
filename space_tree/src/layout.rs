//! Sets constants for the wire frame layout
//!
//! Every message between the coordinator and a worker is one frame: a fixed header followed by
//! a serialized payload. Integers are BigEndian.

use std::mem::size_of;

pub const WORD_SIZE: usize = size_of::<u64>();

pub const KIND_OFFSET: usize = 0;
pub const KIND_SIZE: usize = 1;

pub const WORKER_OFFSET: usize = KIND_OFFSET + KIND_SIZE;
pub const WORKER_SIZE: usize = WORD_SIZE;

pub const PAYLOAD_LENGTH_OFFSET: usize = WORKER_OFFSET + WORKER_SIZE;
pub const PAYLOAD_LENGTH_SIZE: usize = WORD_SIZE;

pub const PAYLOAD_START: usize = PAYLOAD_LENGTH_OFFSET + PAYLOAD_LENGTH_SIZE;

pub const HEADER_SIZE: usize = PAYLOAD_START;

//frames larger than this are rejected before allocating
pub const MAX_PAYLOAD_SIZE: u64 = 1 << 34;

pub const KIND_TASK: u8 = 1;
pub const KIND_RESULT: u8 = 2;
pub const KIND_FAILURE: u8 = 3;
pub const KIND_RELEASE: u8 = 4;
