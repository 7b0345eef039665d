use crate::{
    consts::{Offset, BYTES_PER_LENGTH_OFFSET},
    error::{ReadError, WriteError},
};

pub fn read_offset(bytes: &[u8], position: usize) -> Result<usize, ReadError> {
    let end = position + BYTES_PER_LENGTH_OFFSET;
    let slice = subslice(bytes, position, end)?;

    let mut le_bytes = [0; BYTES_PER_LENGTH_OFFSET];
    le_bytes.copy_from_slice(slice);
    let offset = Offset::from_le_bytes(le_bytes);

    offset
        .try_into()
        .map_err(|_| ReadError::OffsetDoesNotFitInUsize { offset })
}

pub fn read_u64(bytes: &[u8], position: usize) -> Result<u64, ReadError> {
    let end = position + size_of::<u64>();
    let slice = subslice(bytes, position, end)?;

    let mut le_bytes = [0; size_of::<u64>()];
    le_bytes.copy_from_slice(slice);

    Ok(u64::from_le_bytes(le_bytes))
}

pub fn write_offset(bytes: &mut [u8], position: usize, offset: usize) -> Result<(), WriteError> {
    let offset = Offset::try_from(offset).map_err(|_| WriteError::OffsetTooBig { offset })?;
    bytes[position..position + BYTES_PER_LENGTH_OFFSET].copy_from_slice(&offset.to_le_bytes());
    Ok(())
}

pub fn subslice(bytes: &[u8], start: usize, end: usize) -> Result<&[u8], ReadError> {
    bytes
        .get(start..end)
        .ok_or(ReadError::OffsetsNotValidSubsliceBounds {
            start,
            end,
            length: bytes.len(),
        })
}
