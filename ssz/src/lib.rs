pub use crate::{
    bit_list::BitList,
    bit_vector::BitVector,
    consts::{BITS_PER_BYTE, BYTES_PER_CHUNK, BYTES_PER_LENGTH_OFFSET},
    error::{ReadError, WriteError},
    merkle::{merkleize, merkleize_bytes, mix_in_length, next_power_of_two},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    shared::{read_offset, read_u64, subslice, write_offset},
    size::Size,
};

mod bit_list;
mod bit_vector;
mod consts;
mod error;
mod merkle;
mod porcelain;
mod shared;
mod size;
