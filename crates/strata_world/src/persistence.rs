//! # Chunk Files
//!
//! One file per chunk: `<dir>/chunk_<x>_<y>_<z>.dat`.
//!
//! ## Format
//!
//! A raw dump of `BLOCKS_PER_CHUNK` two-byte records in block-index order
//! (`x + z * 16 + y * 256`), no header, no checksum, no compression:
//!
//! | Offset | Size | Field          |
//! |--------|------|----------------|
//! | 0      | 1    | material id    |
//! | 1      | 1    | light (0-15)   |
//!
//! Files are written to a temporary name and renamed into place, so a
//! crash mid-write never leaves a truncated chunk behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use strata_terrain::{Block, Material, MAX_LIGHT};

use crate::coords::{ChunkCoord, BLOCKS_PER_CHUNK};
use crate::error::{WorldError, WorldResult};

/// On-disk image of one block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct RawBlock {
    material: u8,
    light: u8,
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        Self {
            material: block.material().id(),
            light: block.light(),
        }
    }
}

/// Exact size of a chunk file in bytes.
pub const CHUNK_FILE_BYTES: usize = BLOCKS_PER_CHUNK * std::mem::size_of::<RawBlock>();

/// File name of a chunk inside a save directory.
#[must_use]
pub fn chunk_file_name(coord: ChunkCoord) -> String {
    format!("chunk_{}_{}_{}.dat", coord.x, coord.y, coord.z)
}

/// Full path of a chunk file.
#[must_use]
pub fn chunk_path(dir: &Path, coord: ChunkCoord) -> PathBuf {
    dir.join(chunk_file_name(coord))
}

/// Encodes a block array into the file image.
///
/// # Panics
///
/// Panics if `blocks` is not exactly one chunk.
#[must_use]
pub fn encode_blocks(blocks: &[Block]) -> Vec<u8> {
    assert_eq!(blocks.len(), BLOCKS_PER_CHUNK, "not a full chunk");
    let raw: Vec<RawBlock> = blocks.iter().copied().map(RawBlock::from).collect();
    bytemuck::cast_slice(&raw).to_vec()
}

/// Decodes a file image into a block array.
///
/// `path` is only used for error reporting.
///
/// # Errors
///
/// Returns `CorruptChunk` if the image has the wrong length, an unknown
/// material id, or an out-of-range light value.
pub fn decode_blocks(bytes: &[u8], path: &Path) -> WorldResult<Box<[Block]>> {
    let corrupt = |reason: String| WorldError::CorruptChunk {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() != CHUNK_FILE_BYTES {
        return Err(corrupt(format!(
            "expected {CHUNK_FILE_BYTES} bytes, found {}",
            bytes.len()
        )));
    }

    let raw: &[RawBlock] =
        bytemuck::try_cast_slice(bytes).map_err(|e| corrupt(format!("bad layout: {e}")))?;

    raw.iter()
        .enumerate()
        .map(|(index, record)| {
            let material = Material::from_id(record.material).ok_or_else(|| {
                corrupt(format!(
                    "unknown material id {} at block {index}",
                    record.material
                ))
            })?;
            if record.light > MAX_LIGHT {
                return Err(corrupt(format!(
                    "light {} out of range at block {index}",
                    record.light
                )));
            }
            Ok(Block::with_light(material, record.light))
        })
        .collect()
}

/// Writes a chunk file, creating the directory if needed.
///
/// Returns the path written.
///
/// # Errors
///
/// Returns `Io` if the directory, the temporary file or the rename fails.
pub fn write_chunk_file(dir: &Path, coord: ChunkCoord, blocks: &[Block]) -> WorldResult<PathBuf> {
    let bytes = encode_blocks(blocks);
    write_chunk_bytes(dir, coord, &bytes)
}

/// Writes an already encoded chunk image.
pub(crate) fn write_chunk_bytes(
    dir: &Path,
    coord: ChunkCoord,
    bytes: &[u8],
) -> WorldResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| WorldError::io(dir, e))?;

    let path = chunk_path(dir, coord);
    let tmp = path.with_extension("dat.tmp");
    fs::write(&tmp, bytes).map_err(|e| WorldError::io(&tmp, e))?;
    fs::rename(&tmp, &path).map_err(|e| WorldError::io(&path, e))?;
    Ok(path)
}

/// Reads a chunk file.
///
/// A missing file is a normal miss and returns `Ok(None)`.
///
/// # Errors
///
/// Returns `Io` for read failures other than "not found", and
/// `CorruptChunk` if the contents do not decode.
pub fn read_chunk_file(dir: &Path, coord: ChunkCoord) -> WorldResult<Option<Box<[Block]>>> {
    let path = chunk_path(dir, coord);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(WorldError::io(path, e)),
    };
    decode_blocks(&bytes, &path).map(Some)
}
