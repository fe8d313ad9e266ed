//! # datapak — .dpk container format reference implementation
//!
//! Format guarantees:
//! - Every numeric field on disk is little-endian; never negotiated
//! - The header region (signature, header, header extensions, index table)
//!   is covered by a mandatory CRC32 trailer; a reader that enables the
//!   check refuses to proceed past a mismatch
//! - `compMethod` is a frozen 8-byte ASCII tag; decoders fail immediately on
//!   an unrecognized tag rather than guessing
//! - An archive is random-access capable iff it is uncompressed or per-file
//!   compressed; jointly compressed archives only support sequential reads
//! - Per-file integrity uses a closed 15-entry checksum catalog, independent
//!   of the header region's CRC32
//! - Unknown header/index extension signatures round-trip as opaque blobs
//!   rather than being dropped

pub mod archive;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod extension;
pub mod header;
pub mod io_stream;
pub mod record;

pub use archive::{Archive, EntryInfo};
pub use checksum::{ChecksumAlgo, Hasher};
pub use codec::{CompMethod, FlushMode, StreamDecoder, StreamEncoder};
pub use error::{DataPakError, Result};
pub use extension::{HeaderExt, IndexExt};
pub use header::{Header, HeaderFlags};
pub use io_stream::{Reader, ReaderOptions, Writer, WriterOptions};
pub use record::{HeaderExtension, IndexEntry, IndexExtension};
