//! Streaming archive engine — [`Writer`] and [`Reader`].
//!
//! # Writer
//! [`Writer::create`] opens the destination and initializes encoder state
//! immediately; [`Writer::add_file`] only hashes and indexes a file, it does
//! not touch the output. All bytes are produced by [`Writer::finalize`],
//! which writes signature, header, extensions and index first (steps 1-4 of
//! the format note), then the data region (steps 5-6): the raw concatenation
//! for `UNCMPRSD`, one independent codec stream per file for `perFileComp`,
//! or a single codec stream spanning every file — `Flush` between files,
//! `End` after the last — for joint compression.
//!
//! Per-file `compSize` is only known once a file's body has actually been
//! compressed, but the index precedes the data region on disk. `finalize`
//! therefore pre-compresses per-file bodies into memory before serializing
//! the index, rather than literally interleaving "write index entry, then
//! stream its body" as a naive reading of §4.4 step 5 might suggest — see
//! `DESIGN.md`.
//!
//! # Reader
//! [`Reader::open`] parses signature/header/extensions/index, recomputing a
//! running CRC32 via [`CrcReader`] as it goes, then compares it against the
//! trailing 4-byte checksum. [`Reader::next_bytes`] decompresses exactly one
//! entry's worth of plaintext; for jointly compressed archives, any
//! over-decoded bytes (the shared codec stream doesn't align its output to
//! entry boundaries) are held in `joint_pending` for the next call.
//!
//! # Endianness
//! All binary I/O is strictly little-endian; see `header.rs` and `record.rs`
//! for field-level documentation.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::checksum::ChecksumAlgo;
use crate::codec::{self, CompMethod};
use crate::error::{DataPakError, Result};
use crate::extension::{HeaderExt, IndexExt};
use crate::header::{self, Header};
use crate::record::{HeaderExtension, IndexEntry, IndexExtension};

/// Default streaming buffer size (32 KiB) — the `readBufferSize` knob's
/// default in §4.1.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 32 * 1024;

// ── CRC-accounting adapters ──────────────────────────────────────────────────

/// Wraps a [`Read`] so every byte actually consumed also feeds a running
/// CRC32, and counts bytes consumed so callers know when a length-bounded
/// region (header extensions, index table) is exhausted.
struct CrcReader<'a, R> {
    inner: R,
    crc: &'a mut crc32fast::Hasher,
    count: u64,
}

impl<'a, R: Read> Read for CrcReader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.crc.update(&buf[..n]);
        self.count += n as u64;
        Ok(n)
    }
}

/// Wraps a [`Write`] so every byte written also feeds a running CRC32.
struct CrcWriter<'a, W> {
    inner: W,
    crc: &'a mut crc32fast::Hasher,
}

impl<'a, W: Write> Write for CrcWriter<'a, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.crc.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ── Options ──────────────────────────────────────────────────────────────────

/// Per-archive equivalent of the `enable*`/`readBufferSize` global knobs —
/// §9's Design Notes prefer builder options over process-wide state for a
/// systems re-implementation.
#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    pub enable_signature_check: bool,
    pub enable_header_checksum_error: bool,
    pub enable_file_checksum_error: bool,
    pub read_buffer_size: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            enable_signature_check: true,
            enable_header_checksum_error: true,
            enable_file_checksum_error: true,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

/// Builder options for a write-mode archive. Carries both the archive-format
/// settings (`comp_method`, `comp_level`, `checksum_type`,
/// `per_file_compression`) and the mechanical `write_buffer_size` knob, which
/// also doubles as the chunk size used while streaming each source file
/// through a codec — there's only one buffer in the write path to size.
#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    pub comp_method: CompMethod,
    pub comp_level: i32,
    pub checksum_type: ChecksumAlgo,
    pub per_file_compression: bool,
    /// Capacity of the `BufWriter` the archive's destination is wrapped in,
    /// and the chunk size used while reading each source file.
    pub write_buffer_size: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            comp_method: CompMethod::Zstd,
            comp_level: 3,
            checksum_type: ChecksumAlgo::Crc32,
            per_file_compression: false,
            write_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

// ── Writer ───────────────────────────────────────────────────────────────────

pub struct Writer<W: Write> {
    writer: W,
    header: Header,
    header_extensions: Vec<HeaderExtension>,
    indexes: Vec<IndexEntry>,
    index_extensions: Vec<Vec<IndexExtension>>,
    paths: Vec<PathBuf>,
    running_uncomp_offset: u64,
    dictionary: Option<Vec<u8>>,
    options: WriterOptions,
}

impl<W: Write> Writer<W> {
    /// Open a write-mode archive. The [`Header`] is built from `options`'
    /// format settings; its `indexSize`/`numOfIndexes` start at zero and
    /// accumulate as `add_file` is called, and `extFieldSize` is computed
    /// here from `header_extensions`.
    pub fn create(writer: W, header_extensions: Vec<HeaderExt>, options: WriterOptions) -> Result<Self> {
        let mut header = Header::new(options.comp_method, options.comp_level, options.checksum_type, options.per_file_compression);
        let raw_extensions: Vec<HeaderExtension> = header_extensions.iter().map(HeaderExt::to_record).collect();
        header.ext_field_size = raw_extensions.iter().map(HeaderExtension::total_size).sum();
        header.index_size = 0;
        header.num_of_indexes = 0;

        let dictionary = match header.comp_method()? {
            CompMethod::ZstdDict => {
                let loaded = header_extensions.iter().find_map(|e| match e {
                    HeaderExt::InlineDict(bytes) => Some(bytes.clone()),
                    HeaderExt::ExternalDictPath(path) => std::fs::read(path).ok(),
                    _ => None,
                });
                match loaded {
                    Some(bytes) => Some(bytes),
                    None => return Err(DataPakError::Compression(
                        "ZSTD+D requires a CMPRDICT or CMPRDIxf header extension with a loadable dictionary".into(),
                    )),
                }
            }
            _ => None,
        };

        Ok(Self {
            writer,
            header,
            header_extensions: raw_extensions,
            indexes: Vec::new(),
            index_extensions: Vec::new(),
            paths: Vec::new(),
            running_uncomp_offset: 0,
            dictionary,
            options,
        })
    }

    /// Hash and index one file; the archive's own output is untouched until
    /// [`Writer::finalize`]. Calling this after `finalize` is impossible in
    /// this API since `finalize` consumes `self`.
    pub fn add_file(&mut self, src_path: &Path, archive_name: &str, index_extensions: Vec<IndexExt>) -> Result<()> {
        let mut f = File::open(src_path)?;
        let size = f.metadata()?.len();

        let algo = self.header.checksum_algo()?;
        let mut hasher = algo.new_hasher();
        let mut buf = vec![0u8; self.options.write_buffer_size];
        loop {
            let n = f.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        let digest = hasher.finalize();

        let raw_extensions: Vec<IndexExtension> = index_extensions.iter().map(IndexExt::to_record).collect();
        let ext_field_size: u32 = raw_extensions.iter().map(|e| e.total_size() as u32).sum();

        let comp_size_placeholder = match self.header.comp_method()? {
            CompMethod::Uncompressed => size,
            _ => 0,
        };

        let entry = IndexEntry::new(archive_name, &digest, self.running_uncomp_offset, size, comp_size_placeholder, ext_field_size);

        self.running_uncomp_offset += size;
        self.header.index_size += crate::record::INDEX_ENTRY_SIZE as u64 + ext_field_size as u64;
        self.header.num_of_indexes += 1;

        self.indexes.push(entry);
        self.index_extensions.push(raw_extensions);
        self.paths.push(src_path.to_path_buf());
        Ok(())
    }

    /// Entries accumulated so far via `add_file`, in insertion order.
    pub fn indexes(&self) -> &[IndexEntry] {
        &self.indexes
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Write signature, header, extensions, index and CRC32 trailer, then
    /// stream every file body. Returns the underlying writer.
    pub fn finalize(mut self) -> Result<W> {
        let comp_method = self.header.comp_method()?;
        let level = self.header.flags.comp_level as i32;
        let per_file = self.header.flags.per_file_comp;
        let buf_size = self.options.write_buffer_size;

        let mut per_file_bodies: Vec<Vec<u8>> = Vec::new();
        if per_file && comp_method != CompMethod::Uncompressed {
            per_file_bodies.reserve(self.paths.len());
            for (i, path) in self.paths.iter().enumerate() {
                let mut encoder = codec::new_encoder(comp_method, level, self.dictionary.as_deref())?;
                let mut f = File::open(path)?;
                let mut compressed = Vec::new();
                let mut buf = vec![0u8; buf_size];
                loop {
                    let n = f.read(&mut buf)?;
                    if n == 0 {
                        break;
                    }
                    compressed.extend(encoder.feed(&buf[..n])?);
                }
                compressed.extend(encoder.finish()?);
                self.indexes[i].comp_size = compressed.len() as u64;
                per_file_bodies.push(compressed);
            }
        }

        let mut crc = crc32fast::Hasher::new();
        {
            let mut w = CrcWriter { inner: &mut self.writer, crc: &mut crc };
            w.write_all(header::SIGNATURE)?;
            self.header.write(&mut w)?;
            for ext in &self.header_extensions {
                ext.write(&mut w)?;
            }
            for (entry, exts) in self.indexes.iter().zip(&self.index_extensions) {
                entry.write(&mut w)?;
                for ext in exts {
                    ext.write(&mut w)?;
                }
            }
        }
        self.writer.write_all(&crc.finalize().to_le_bytes())?;

        match comp_method {
            CompMethod::Uncompressed => {
                for path in &self.paths {
                    let mut f = File::open(path)?;
                    io::copy(&mut f, &mut self.writer)?;
                }
            }
            _ if per_file => {
                for body in &per_file_bodies {
                    self.writer.write_all(body)?;
                }
            }
            _ => {
                let mut encoder = codec::new_encoder(comp_method, level, self.dictionary.as_deref())?;
                let mut buf = vec![0u8; buf_size];
                let last_index = self.paths.len().saturating_sub(1);
                for (i, path) in self.paths.iter().enumerate() {
                    let mut f = File::open(path)?;
                    loop {
                        let n = f.read(&mut buf)?;
                        if n == 0 {
                            break;
                        }
                        let produced = encoder.feed(&buf[..n])?;
                        self.writer.write_all(&produced)?;
                    }
                    if i != last_index {
                        let produced = encoder.flush()?;
                        self.writer.write_all(&produced)?;
                    }
                }
                let tail = encoder.finish()?;
                self.writer.write_all(&tail)?;
            }
        }

        Ok(self.writer)
    }
}

// ── Reader ───────────────────────────────────────────────────────────────────

impl<R: Read + Seek> std::fmt::Debug for Reader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("header", &self.header)
            .field("next_index", &self.next_index)
            .field("random_access", &self.random_access)
            .field("data_region_start", &self.data_region_start)
            .finish()
    }
}

pub struct Reader<R: Read + Seek> {
    reader: R,
    pub header: Header,
    pub header_extensions: Vec<HeaderExt>,
    pub indexes: Vec<IndexEntry>,
    pub index_extensions: Vec<Vec<IndexExt>>,
    next_index: usize,
    random_access: bool,
    data_region_start: u64,
    dict: Option<&'static [u8]>,
    /// Persistent codec cursor for jointly compressed archives; unused for
    /// per-file/uncompressed archives, which build a fresh decoder per entry.
    joint_decoder: Option<Box<dyn codec::StreamDecoder>>,
    /// Decoded bytes produced by the joint decoder beyond the entry currently
    /// being consumed — the shared codec stream's output doesn't align to
    /// entry boundaries, so overshoot is buffered here for the next call.
    joint_pending: Vec<u8>,
    options: ReaderOptions,
}

impl<R: Read + Seek> Reader<R> {
    pub fn open(mut reader: R, options: ReaderOptions) -> Result<Self> {
        let sig = header::read_signature(&mut reader, options.enable_signature_check)?;
        let hdr = Header::read(&mut reader)?;

        let mut crc = crc32fast::Hasher::new();
        crc.update(&sig);
        let mut hdr_bytes = Vec::new();
        hdr.write(&mut hdr_bytes)?;
        crc.update(&hdr_bytes);

        let mut header_extensions = Vec::new();
        {
            let mut cr = CrcReader { inner: &mut reader, crc: &mut crc, count: 0 };
            while cr.count < hdr.ext_field_size as u64 {
                let ext = HeaderExtension::read(&mut cr)?;
                header_extensions.push(HeaderExt::from_record(ext));
            }
        }

        let mut indexes = Vec::with_capacity(hdr.num_of_indexes as usize);
        let mut index_extensions = Vec::with_capacity(hdr.num_of_indexes as usize);
        {
            let mut cr = CrcReader { inner: &mut reader, crc: &mut crc, count: 0 };
            for _ in 0..hdr.num_of_indexes {
                let entry = IndexEntry::read(&mut cr).map_err(|_| DataPakError::UnexpectedEof("index entry"))?;
                let target = cr.count + entry.ext_field_size as u64;
                let mut exts = Vec::new();
                while cr.count < target {
                    let ext = IndexExtension::read(&mut cr)?;
                    exts.push(IndexExt::from_record(ext)?);
                }
                indexes.push(entry);
                index_extensions.push(exts);
            }
        }

        let mut trailer = [0u8; 4];
        reader.read_exact(&mut trailer).map_err(|_| DataPakError::UnexpectedEof("CRC32 trailer"))?;
        let stored_crc = u32::from_le_bytes(trailer);
        let computed_crc = crc.finalize();
        if options.enable_header_checksum_error && stored_crc != computed_crc {
            return Err(DataPakError::BadChecksum(format!(
                "header region CRC32 mismatch: stored {stored_crc:#010x}, computed {computed_crc:#010x}"
            )));
        }

        let comp_method = hdr.comp_method()?;
        let mut dict_bytes: Option<Vec<u8>> = None;
        let mut dict_err: Option<io::Error> = None;
        for ext in &header_extensions {
            match ext {
                HeaderExt::InlineDict(bytes) => {
                    dict_bytes = Some(bytes.clone());
                    break;
                }
                HeaderExt::ExternalDictPath(path) => match std::fs::read(path) {
                    Ok(bytes) => {
                        dict_bytes = Some(bytes);
                        break;
                    }
                    Err(e) => dict_err = Some(e),
                },
                _ => {}
            }
        }
        if comp_method == CompMethod::ZstdDict && dict_bytes.is_none() {
            return Err(match dict_err {
                Some(e) => DataPakError::Compression(format!("failed to load external dictionary: {e}")),
                None => DataPakError::Compression("ZSTD+D archive has no CMPRDICT/CMPRDIxf extension".into()),
            });
        }
        // Leaked once per reader: the zstd dictionary decoder needs a
        // reference that outlives the decoder itself, and this reader holds
        // at most one dictionary for its whole lifetime.
        let dict: Option<&'static [u8]> = dict_bytes.map(|b| -> &'static [u8] { Box::leak(b.into_boxed_slice()) });

        let data_region_start = reader.stream_position()?;
        let random_access = hdr.is_random_access();

        let joint_decoder = if !random_access {
            Some(codec::new_decoder(comp_method, dict)?)
        } else {
            None
        };

        Ok(Self {
            reader,
            header: hdr,
            header_extensions,
            indexes,
            index_extensions,
            next_index: 0,
            random_access,
            data_region_start,
            dict,
            joint_decoder,
            joint_pending: Vec::new(),
            options,
        })
    }

    pub fn random_access(&self) -> bool {
        self.random_access
    }

    pub fn get_index(&self, i: usize) -> Option<&IndexEntry> {
        self.indexes.get(i)
    }

    pub fn peek_index(&self) -> Option<&IndexEntry> {
        self.indexes.get(self.next_index)
    }

    /// Index of the entry the next `next_bytes()` call will return.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Seek the underlying stream to entry `i` and make it the next entry
    /// returned by `next_bytes`. Only valid when [`Reader::random_access`].
    pub fn seek_to(&mut self, i: usize) -> Result<IndexEntry> {
        if !self.random_access {
            return Err(DataPakError::UnsupportedAccessMode);
        }
        let entry = self
            .indexes
            .get(i)
            .cloned()
            .ok_or(DataPakError::InvalidState("seek_to index out of range"))?;
        self.reader.seek(SeekFrom::Start(self.data_region_start + entry.offset))?;
        self.next_index = i;
        Ok(entry)
    }

    /// Decompress exactly the next entry's bytes, advance `nextIndex`, and
    /// optionally verify its per-file checksum.
    pub fn next_bytes(&mut self) -> Result<Vec<u8>> {
        let idx = self.next_index;
        let entry = self
            .indexes
            .get(idx)
            .cloned()
            .ok_or(DataPakError::InvalidState("no more entries"))?;
        self.next_index += 1;

        let comp_method = self.header.comp_method()?;
        let out = if self.random_access {
            self.reader.seek(SeekFrom::Start(self.data_region_start + entry.offset))?;
            self.decode_random_access_entry(&entry, comp_method)?
        } else {
            self.decode_joint_entry(&entry)?
        };

        if self.options.enable_file_checksum_error {
            let algo = self.header.checksum_algo()?;
            if algo.digest_len() > 0 {
                let mut hasher = algo.new_hasher();
                hasher.update(&out);
                let got = hasher.finalize();
                if got.as_slice() != entry.checksum(algo.digest_len()) {
                    return Err(DataPakError::BadChecksum(format!(
                        "entry {idx} ({}) per-file {} mismatch",
                        entry.filename(),
                        algo.name()
                    )));
                }
            }
        }

        Ok(out)
    }

    fn decode_random_access_entry(&mut self, entry: &IndexEntry, comp_method: CompMethod) -> Result<Vec<u8>> {
        let mut decoder = codec::new_decoder(comp_method, self.dict)?;
        let mut out = Vec::with_capacity(entry.uncomp_size as usize);
        let mut remaining = entry.comp_size;
        let mut buf = vec![0u8; self.options.read_buffer_size];
        while remaining > 0 {
            let want = buf.len().min(remaining as usize);
            self.reader
                .read_exact(&mut buf[..want])
                .map_err(|_| DataPakError::UnexpectedEof("entry body"))?;
            remaining -= want as u64;
            out.extend(decoder.feed(&buf[..want])?);
        }
        out.extend(decoder.finish()?);
        Ok(out)
    }

    fn decode_joint_entry(&mut self, entry: &IndexEntry) -> Result<Vec<u8>> {
        let want = entry.uncomp_size as usize;
        let mut buf = vec![0u8; self.options.read_buffer_size];
        while self.joint_pending.len() < want {
            let n = self.reader.read(&mut buf)?;
            let decoder = self.joint_decoder.as_mut().expect("joint_decoder set for non-random-access archives");
            if n == 0 {
                let tail = decoder.finish()?;
                if tail.is_empty() {
                    return Err(DataPakError::UnexpectedEof("jointly compressed data region"));
                }
                self.joint_pending.extend(tail);
                continue;
            }
            self.joint_pending.extend(decoder.feed(&buf[..n])?);
        }
        Ok(self.joint_pending.drain(..want).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::ChecksumAlgo as CA;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents).unwrap();
        f
    }

    #[test]
    fn uncompressed_single_file_roundtrip_matches_s1() {
        let file = write_temp(&[0x41]);
        let options = WriterOptions { comp_method: CompMethod::Uncompressed, comp_level: 0, checksum_type: CA::Crc32, per_file_compression: false, ..WriterOptions::default() };
        let mut writer = Writer::create(Vec::new(), Vec::new(), options).unwrap();
        writer.add_file(file.path(), "a.bin", Vec::new()).unwrap();
        let bytes = writer.finalize().unwrap();

        assert_eq!(bytes.len(), 169);
        assert_eq!(bytes[168], 0x41);
        // IndexEntry starts right after the 28-byte header (absolute 36);
        // its 100-byte `field` is the entry's last 100 bytes, so the
        // trailing 4-byte CRC32 digest sits at absolute [160, 164).
        let digest_bytes = &bytes[160..164];
        assert_eq!(u32::from_le_bytes(digest_bytes.try_into().unwrap()), 0xD3D99E8B);

        let mut reader = Reader::open(Cursor::new(bytes), ReaderOptions::default()).unwrap();
        assert_eq!(reader.indexes.len(), 1);
        let out = reader.next_bytes().unwrap();
        assert_eq!(out, vec![0x41]);
    }

    #[test]
    fn joint_mode_three_files_roundtrip() {
        let a = write_temp(&[0u8; 100]);
        let b = write_temp(&[0xFFu8; 100]);
        let c = write_temp(&[]);
        let options = WriterOptions { comp_method: CompMethod::Zstd, comp_level: 10, checksum_type: CA::None, per_file_compression: false, ..WriterOptions::default() };
        let mut writer = Writer::create(Vec::new(), Vec::new(), options).unwrap();
        writer.add_file(a.path(), "a", Vec::new()).unwrap();
        writer.add_file(b.path(), "b", Vec::new()).unwrap();
        writer.add_file(c.path(), "c", Vec::new()).unwrap();
        let bytes = writer.finalize().unwrap();

        let mut reader = Reader::open(Cursor::new(bytes), ReaderOptions::default()).unwrap();
        assert_eq!(reader.indexes.len(), 3);
        assert_eq!(reader.header.index_size, 384);
        assert!(!reader.random_access());
        assert_eq!(reader.next_bytes().unwrap(), vec![0u8; 100]);
        assert_eq!(reader.next_bytes().unwrap(), vec![0xFFu8; 100]);
        assert_eq!(reader.next_bytes().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn per_file_mode_is_random_access() {
        let a = write_temp(b"hello");
        let b = write_temp(b"world!!");
        let options = WriterOptions { comp_method: CompMethod::Zlib, comp_level: 6, checksum_type: CA::Crc32, per_file_compression: true, ..WriterOptions::default() };
        let mut writer = Writer::create(Vec::new(), Vec::new(), options).unwrap();
        writer.add_file(a.path(), "a", Vec::new()).unwrap();
        writer.add_file(b.path(), "b", Vec::new()).unwrap();
        let bytes = writer.finalize().unwrap();

        let mut reader = Reader::open(Cursor::new(bytes), ReaderOptions::default()).unwrap();
        assert!(reader.random_access());
        reader.seek_to(1).unwrap();
        assert_eq!(reader.next_bytes().unwrap(), b"world!!");
        reader.seek_to(0).unwrap();
        assert_eq!(reader.next_bytes().unwrap(), b"hello");
    }

    #[test]
    fn seek_to_on_joint_archive_is_unsupported() {
        let a = write_temp(b"payload");
        let options = WriterOptions { comp_method: CompMethod::Zstd, comp_level: 3, checksum_type: CA::None, per_file_compression: false, ..WriterOptions::default() };
        let mut writer = Writer::create(Vec::new(), Vec::new(), options).unwrap();
        writer.add_file(a.path(), "a", Vec::new()).unwrap();
        let bytes = writer.finalize().unwrap();

        let mut reader = Reader::open(Cursor::new(bytes), ReaderOptions::default()).unwrap();
        assert!(matches!(reader.seek_to(0), Err(DataPakError::UnsupportedAccessMode)));
    }

    #[test]
    fn bad_signature_is_fatal_when_checked() {
        let mut bytes = vec![0u8; 8];
        bytes.copy_from_slice(b"Datapak.");
        let err = Reader::open(Cursor::new(bytes), ReaderOptions::default()).unwrap_err();
        assert!(matches!(err, DataPakError::BadSignature));
    }

    #[test]
    fn tampered_header_raises_bad_checksum() {
        let a = write_temp(b"x");
        let options = WriterOptions { comp_method: CompMethod::Uncompressed, comp_level: 0, checksum_type: CA::None, per_file_compression: false, ..WriterOptions::default() };
        let mut writer = Writer::create(Vec::new(), Vec::new(), options).unwrap();
        writer.add_file(a.path(), "a", Vec::new()).unwrap();
        let mut bytes = writer.finalize().unwrap();

        // Flip a bit inside `numOfIndexes` (header offset 20, i.e. absolute
        // offset 8 + 20 past the signature) without touching the trailer.
        bytes[8 + 20] ^= 0x01;
        let err = Reader::open(Cursor::new(bytes), ReaderOptions::default()).unwrap_err();
        assert!(matches!(err, DataPakError::BadChecksum(_)));
    }

    #[test]
    fn per_file_checksum_mismatch_does_not_poison_later_reads() {
        let a = write_temp(b"one");
        let b = write_temp(b"two");
        let options = WriterOptions { comp_method: CompMethod::Uncompressed, comp_level: 0, checksum_type: CA::Crc32, per_file_compression: true, ..WriterOptions::default() };
        let mut writer = Writer::create(Vec::new(), Vec::new(), options).unwrap();
        writer.add_file(a.path(), "a", Vec::new()).unwrap();
        writer.add_file(b.path(), "b", Vec::new()).unwrap();
        let mut bytes = writer.finalize().unwrap();

        // Corrupt entry 0's stored content without touching its checksum or
        // the header region, so the header CRC still passes.
        let data_start = bytes.len() - 3 - 3;
        bytes[data_start] = b'X';

        let mut reader = Reader::open(Cursor::new(bytes), ReaderOptions::default()).unwrap();
        assert!(reader.next_bytes().is_err());
        assert_eq!(reader.next_bytes().unwrap(), b"two");
    }
}
