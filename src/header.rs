//! Signature and Header — the fixed-size records at the front of every
//! `.dpk` archive.
//!
//! # On-disk layout (28-byte header, all fields little-endian)
//!
//! ```text
//! Offset  Size  Field
//!    0      8   indexSize      total bytes of the index table (LE u64)
//!    8      8   compMethod     8-byte ASCII tag, trailing spaces significant
//!   16      4   extFieldSize   bytes of header-extension area (LE u32)
//!   20      4   numOfIndexes   number of index entries (LE u32)
//!   24      4   flags          packed bitfield, see `encode_flags` (LE u32)
//! ```
//!
//! The header is preceded by the 8-byte [`SIGNATURE`] and followed by
//! `extFieldSize` bytes of header extensions, then the index table, then a
//! 4-byte CRC32 trailer — see `record.rs` and `io_stream.rs`.
//!
//! # Endianness
//! Every numeric field is little-endian. Records are byte-packed; there is
//! no alignment padding anywhere in the format.

use std::io::{self, Read, Write};

use crate::codec::CompMethod;
use crate::checksum::ChecksumAlgo;
use crate::error::{DataPakError, Result};

/// Default 8-byte signature. Read-path compares byte-for-byte; a mismatch is
/// fatal unless signature checking has been disabled on the reader.
pub const SIGNATURE: &[u8; 8] = b"DataPak.";

/// Fixed byte size of the [`Header`] record (not counting the signature).
pub const HEADER_SIZE: usize = 28;

// ── Packed bitfield ──────────────────────────────────────────────────────────
//
// 32 bits, packed LSB-first (first-declared field occupies the low-order
// bits), per the historical-format clarification: field order is
// compIndex(1), compExtField(1), checksumType(6), compLevel(6),
// perFileComp(1), filesizeLimit(3), reserved(14).

const COMP_INDEX_SHIFT: u32 = 0;
const COMP_EXT_FIELD_SHIFT: u32 = 1;
const CHECKSUM_TYPE_SHIFT: u32 = 2;
const CHECKSUM_TYPE_MASK: u32 = 0x3F;
const COMP_LEVEL_SHIFT: u32 = 8;
const COMP_LEVEL_MASK: u32 = 0x3F;
const PER_FILE_COMP_SHIFT: u32 = 14;
const FILESIZE_LIMIT_SHIFT: u32 = 15;
const FILESIZE_LIMIT_MASK: u32 = 0x7;

/// The fields packed into `Header::flags`.
///
/// `comp_index` and `comp_ext_field` are accepted on read for forward
/// compatibility with older archives but MUST be written as `false` — they
/// are deprecated and no writer in this crate ever sets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderFlags {
    pub comp_index: bool,
    pub comp_ext_field: bool,
    pub checksum_type: u8,
    pub comp_level: u8,
    pub per_file_comp: bool,
    pub filesize_limit: u8,
}

impl HeaderFlags {
    pub fn encode(&self) -> u32 {
        let mut w = 0u32;
        w |= (self.comp_index as u32) << COMP_INDEX_SHIFT;
        w |= (self.comp_ext_field as u32) << COMP_EXT_FIELD_SHIFT;
        w |= ((self.checksum_type as u32) & CHECKSUM_TYPE_MASK) << CHECKSUM_TYPE_SHIFT;
        w |= ((self.comp_level as u32) & COMP_LEVEL_MASK) << COMP_LEVEL_SHIFT;
        w |= (self.per_file_comp as u32) << PER_FILE_COMP_SHIFT;
        w |= ((self.filesize_limit as u32) & FILESIZE_LIMIT_MASK) << FILESIZE_LIMIT_SHIFT;
        w
    }

    pub fn decode(w: u32) -> Self {
        Self {
            comp_index: (w >> COMP_INDEX_SHIFT) & 1 != 0,
            comp_ext_field: (w >> COMP_EXT_FIELD_SHIFT) & 1 != 0,
            checksum_type: ((w >> CHECKSUM_TYPE_SHIFT) & CHECKSUM_TYPE_MASK) as u8,
            comp_level: ((w >> COMP_LEVEL_SHIFT) & COMP_LEVEL_MASK) as u8,
            per_file_comp: (w >> PER_FILE_COMP_SHIFT) & 1 != 0,
            filesize_limit: ((w >> FILESIZE_LIMIT_SHIFT) & FILESIZE_LIMIT_MASK) as u8,
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Header {
    pub index_size: u64,
    pub comp_method: [u8; 8],
    pub ext_field_size: u32,
    pub num_of_indexes: u32,
    pub flags: HeaderFlags,
}

impl Header {
    pub fn new(comp_method: CompMethod, comp_level: i32, checksum: ChecksumAlgo, per_file_comp: bool) -> Self {
        Self {
            index_size: 0,
            comp_method: comp_method.tag(),
            ext_field_size: 0,
            num_of_indexes: 0,
            flags: HeaderFlags {
                comp_index: false,
                comp_ext_field: false,
                checksum_type: checksum.id(),
                comp_level: comp_level.clamp(0, 63) as u8,
                per_file_comp,
                filesize_limit: 0,
            },
        }
    }

    pub fn comp_method(&self) -> Result<CompMethod> {
        CompMethod::from_tag(&self.comp_method)
            .ok_or(DataPakError::UnknownCompressionExtension(self.comp_method))
    }

    pub fn checksum_algo(&self) -> Result<ChecksumAlgo> {
        ChecksumAlgo::from_id(self.flags.checksum_type)
            .ok_or(DataPakError::UnknownChecksumType(self.flags.checksum_type))
    }

    /// An archive is random-access capable iff uncompressed or per-file
    /// compressed — see §3/§8 property 5.
    pub fn is_random_access(&self) -> bool {
        self.flags.per_file_comp || self.comp_method.as_slice() == b"UNCMPRSD"
    }

    /// Write the 28-byte header body. Does not write the signature or the
    /// CRC32 trailer; callers accumulate those separately (see `io_stream.rs`).
    pub fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.index_size.to_le_bytes());
        buf[8..16].copy_from_slice(&self.comp_method);
        buf[16..20].copy_from_slice(&self.ext_field_size.to_le_bytes());
        buf[20..24].copy_from_slice(&self.num_of_indexes.to_le_bytes());
        buf[24..28].copy_from_slice(&self.flags.encode().to_le_bytes());
        w.write_all(&buf)
    }

    pub fn read<R: Read>(mut r: R) -> io::Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        r.read_exact(&mut buf)?;

        let index_size = u64::from_le_bytes(buf[0..8].try_into().unwrap());
        let comp_method: [u8; 8] = buf[8..16].try_into().unwrap();
        let ext_field_size = u32::from_le_bytes(buf[16..20].try_into().unwrap());
        let num_of_indexes = u32::from_le_bytes(buf[20..24].try_into().unwrap());
        let flags = HeaderFlags::decode(u32::from_le_bytes(buf[24..28].try_into().unwrap()));

        Ok(Self {
            index_size,
            comp_method,
            ext_field_size,
            num_of_indexes,
            flags,
        })
    }
}

/// Read the 8-byte signature and compare it against [`SIGNATURE`].
///
/// When `enforce` is `false`, mismatches are tolerated (forensic recovery of
/// damaged archives per §7); the bytes read are still returned.
pub fn read_signature<R: Read>(mut r: R, enforce: bool) -> Result<[u8; 8]> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf).map_err(|_| DataPakError::UnexpectedEof("signature"))?;
    if enforce && &buf != SIGNATURE {
        return Err(DataPakError::BadSignature);
    }
    Ok(buf)
}
