//! Fixed-size on-disk records: index entries and the two extension-record
//! prefixes. `header.rs` covers the signature and header; this module covers
//! everything from the end of the header extension area through the index
//! table.
//!
//! Every record here is a direct byte-packed layout with no padding — see
//! §4.2 of the format note. Fields are read/written explicitly in declared
//! order and width rather than transmuted, since Rust gives no cross-platform
//! guarantee about `repr(C)` bitfield or struct layout matching a spec's wire
//! format.

use std::io::{self, Read, Write};

use crate::error::{DataPakError, Result};

/// Fixed byte size of an [`IndexEntry`] record, not counting its trailing
/// index-extension bytes.
pub const INDEX_ENTRY_SIZE: usize = 128;

/// Byte length of the NUL-terminated-filename-plus-checksum tail.
pub const FIELD_SIZE: usize = 100;

/// One stored file's index record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Absolute data-region offset (per-file/uncompressed) or decompressed-
    /// stream offset (joint compression).
    pub offset: u64,
    pub uncomp_size: u64,
    /// `0` for jointly compressed archives (no random access); otherwise the
    /// on-disk compressed byte length, equal to `uncomp_size` when uncompressed.
    pub comp_size: u64,
    pub ext_field_size: u32,
    /// NUL-terminated filename followed by trailing checksum bytes; unused
    /// bytes between the two are zero.
    pub field: [u8; FIELD_SIZE],
}

impl IndexEntry {
    /// Build an entry from a filename and a digest, zero-filling the gap
    /// between them. Panics if `filename.len() + digest.len() > 99` — callers
    /// must check this before building the entry (`field[filename_len] = 0`
    /// requires at least one free byte for the terminator).
    pub fn new(filename: &str, digest: &[u8], offset: u64, uncomp_size: u64, comp_size: u64, ext_field_size: u32) -> Self {
        let name = filename.as_bytes();
        assert!(
            name.len() + digest.len() <= FIELD_SIZE - 1,
            "filename + checksum length {} exceeds field capacity",
            name.len() + digest.len()
        );
        let mut field = [0u8; FIELD_SIZE];
        field[..name.len()].copy_from_slice(name);
        // field[name.len()] is already 0 from the zero-fill, satisfying the
        // NUL-terminator invariant.
        if !digest.is_empty() {
            field[FIELD_SIZE - digest.len()..].copy_from_slice(digest);
        }
        Self { offset, uncomp_size, comp_size, ext_field_size, field }
    }

    /// Extract the NUL-terminated filename from `field`.
    pub fn filename(&self) -> String {
        let nul = self.field.iter().position(|&b| b == 0).unwrap_or(FIELD_SIZE);
        String::from_utf8_lossy(&self.field[..nul]).into_owned()
    }

    /// Extract the trailing `digest_len` checksum bytes.
    pub fn checksum(&self, digest_len: usize) -> &[u8] {
        &self.field[FIELD_SIZE - digest_len..]
    }

    pub fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        let mut buf = [0u8; INDEX_ENTRY_SIZE];
        buf[0..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..16].copy_from_slice(&self.uncomp_size.to_le_bytes());
        buf[16..24].copy_from_slice(&self.comp_size.to_le_bytes());
        buf[24..28].copy_from_slice(&self.ext_field_size.to_le_bytes());
        buf[28..128].copy_from_slice(&self.field);
        w.write_all(&buf)
    }

    pub fn read<R: Read>(mut r: R) -> io::Result<Self> {
        let mut buf = [0u8; INDEX_ENTRY_SIZE];
        r.read_exact(&mut buf)?;
        let offset = u64::from_le_bytes(buf[0..8].try_into().unwrap());
        let uncomp_size = u64::from_le_bytes(buf[8..16].try_into().unwrap());
        let comp_size = u64::from_le_bytes(buf[16..24].try_into().unwrap());
        let ext_field_size = u32::from_le_bytes(buf[24..28].try_into().unwrap());
        let mut field = [0u8; FIELD_SIZE];
        field.copy_from_slice(&buf[28..128]);
        Ok(Self { offset, uncomp_size, comp_size, ext_field_size, field })
    }
}

// ── Header extensions ───────────────────────────────────────────────────────

/// 12-byte-prefixed record in the header-extension area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderExtension {
    pub signature: [u8; 8],
    pub payload: Vec<u8>,
}

impl HeaderExtension {
    pub const PREFIX_SIZE: usize = 12;

    pub fn new(signature: [u8; 8], payload: Vec<u8>) -> Self {
        Self { signature, payload }
    }

    /// Total on-disk size, including the prefix — the value stored in
    /// `size`/used to accumulate `header.extFieldSize`.
    pub fn total_size(&self) -> u32 {
        (Self::PREFIX_SIZE + self.payload.len()) as u32
    }

    pub fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(&self.signature)?;
        w.write_all(&self.total_size().to_le_bytes())?;
        w.write_all(&self.payload)
    }

    /// Read one prefix + payload. `r` must be positioned at the start of the
    /// extension; reads exactly `total_size()` bytes.
    pub fn read<R: Read>(mut r: R) -> Result<Self> {
        let mut prefix = [0u8; Self::PREFIX_SIZE];
        r.read_exact(&mut prefix).map_err(|_| DataPakError::UnexpectedEof("header extension prefix"))?;
        let signature: [u8; 8] = prefix[0..8].try_into().unwrap();
        let size = u32::from_le_bytes(prefix[8..12].try_into().unwrap());
        if (size as usize) < Self::PREFIX_SIZE {
            return Err(DataPakError::UnexpectedEof("header extension size smaller than prefix"));
        }
        let mut payload = vec![0u8; size as usize - Self::PREFIX_SIZE];
        r.read_exact(&mut payload).map_err(|_| DataPakError::UnexpectedEof("header extension payload"))?;
        Ok(Self { signature, payload })
    }
}

// ── Index extensions ────────────────────────────────────────────────────────

/// 8-byte-prefixed record attached to one [`IndexEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexExtension {
    pub signature: [u8; 6],
    pub payload: Vec<u8>,
}

impl IndexExtension {
    pub const PREFIX_SIZE: usize = 8;

    pub fn new(signature: [u8; 6], payload: Vec<u8>) -> Self {
        Self { signature, payload }
    }

    pub fn total_size(&self) -> u16 {
        (Self::PREFIX_SIZE + self.payload.len()) as u16
    }

    pub fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(&self.signature)?;
        w.write_all(&self.total_size().to_le_bytes())?;
        w.write_all(&self.payload)
    }

    pub fn read<R: Read>(mut r: R) -> Result<Self> {
        let mut prefix = [0u8; Self::PREFIX_SIZE];
        r.read_exact(&mut prefix).map_err(|_| DataPakError::UnexpectedEof("index extension prefix"))?;
        let signature: [u8; 6] = prefix[0..6].try_into().unwrap();
        let size = u16::from_le_bytes(prefix[6..8].try_into().unwrap());
        if (size as usize) < Self::PREFIX_SIZE {
            return Err(DataPakError::UnexpectedEof("index extension size smaller than prefix"));
        }
        let mut payload = vec![0u8; size as usize - Self::PREFIX_SIZE];
        r.read_exact(&mut payload).map_err(|_| DataPakError::UnexpectedEof("index extension payload"))?;
        Ok(Self { signature, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_entry_is_128_bytes_on_disk() {
        let e = IndexEntry::new("a.txt", &0xD3D99E8Bu32.to_le_bytes(), 0, 1, 1, 0);
        let mut out = Vec::new();
        e.write(&mut out).unwrap();
        assert_eq!(out.len(), INDEX_ENTRY_SIZE);
    }

    #[test]
    fn index_entry_roundtrips() {
        let digest = [0xAAu8; 20];
        let e = IndexEntry::new("dir/name.bin", &digest, 4096, 2048, 900, 12);
        let mut out = Vec::new();
        e.write(&mut out).unwrap();
        let back = IndexEntry::read(&out[..]).unwrap();
        assert_eq!(back, e);
        assert_eq!(back.filename(), "dir/name.bin");
        assert_eq!(back.checksum(20), &digest);
    }

    #[test]
    fn empty_filename_and_checksum_fit() {
        let e = IndexEntry::new("", &[], 0, 0, 0, 0);
        assert_eq!(e.filename(), "");
        assert_eq!(e.field[0], 0);
    }

    #[test]
    #[should_panic]
    fn oversized_filename_plus_checksum_panics() {
        let name = "x".repeat(90);
        IndexEntry::new(&name, &[0u8; 20], 0, 0, 0, 0);
    }

    #[test]
    fn header_extension_roundtrips() {
        let ext = HeaderExtension::new(*b"CMPRDICT", vec![1, 2, 3, 4, 5]);
        let mut out = Vec::new();
        ext.write(&mut out).unwrap();
        assert_eq!(out.len(), HeaderExtension::PREFIX_SIZE + 5);
        let back = HeaderExtension::read(&out[..]).unwrap();
        assert_eq!(back, ext);
    }

    #[test]
    fn index_extension_roundtrips() {
        let ext = IndexExtension::new(*b"RandAc", vec![0u8; 24]);
        let mut out = Vec::new();
        ext.write(&mut out).unwrap();
        assert_eq!(out.len(), IndexExtension::PREFIX_SIZE + 24);
        let back = IndexExtension::read(&out[..]).unwrap();
        assert_eq!(back, ext);
    }
}
