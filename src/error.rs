//! Closed error taxonomy shared by every archive-level failure.
//!
//! DataPak deliberately has *one* error enum, not one per module: §7 of the
//! format note describes a single closed taxonomy, and every component in
//! this crate (header, record, codec, checksum, archive engine) surfaces
//! into it rather than growing its own `thiserror` enum and forcing callers
//! to match on a tree of wrapped types.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataPakError {
    /// File does not begin with the expected 8-byte signature.
    #[error("Bad signature — not a DataPak archive")]
    BadSignature,

    /// Header CRC32 mismatch, or a per-file digest mismatch.
    #[error("Checksum mismatch: {0}")]
    BadChecksum(String),

    /// `seek_to` called on an archive that is not random-access capable
    /// (jointly compressed, `perFileComp == false` and `compMethod != UNCMPRSD`).
    #[error("Archive does not support random access (jointly compressed)")]
    UnsupportedAccessMode,

    /// A codec reported an error, including a failed dictionary load.
    #[error("Compression error: {0}")]
    Compression(String),

    /// `compMethod` is not one of the recognized 8-byte ASCII tags.
    #[error("Unknown compression method tag: {0:?}")]
    UnknownCompressionExtension([u8; 8]),

    /// A `checksumType` value outside the closed catalog in §3.
    #[error("Unknown checksum algorithm id: {0}")]
    UnknownChecksumType(u8),

    /// Stream ended before an expected record completed.
    #[error("Unexpected end of file while reading {0}")]
    UnexpectedEof(&'static str),

    /// `add_file` called after `finalize`, or any other programmer misuse of
    /// the write-mode / read-mode lifecycle split described in §3.
    #[error("Invalid archive state: {0}")]
    InvalidState(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, DataPakError>;
