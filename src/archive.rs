//! High-level [`Archive`] API — the primary embedding surface, wrapping
//! [`io_stream::Reader`]/[`io_stream::Writer`] with path-based construction
//! and a read/write mode split that mirrors the format's own lifecycle rule:
//! an archive is opened read-only or built once and finalized, never both.
//!
//! ```no_run
//! use datapak::archive::Archive;
//! use datapak::codec::CompMethod;
//! use datapak::checksum::ChecksumAlgo;
//! use datapak::io_stream::WriterOptions;
//!
//! let options = WriterOptions { comp_method: CompMethod::Zstd, comp_level: 10, checksum_type: ChecksumAlgo::Crc32, ..Default::default() };
//! let mut ar = Archive::create("out.dpk", Vec::new(), options)?;
//! ar.add_file("readme.txt".as_ref(), "readme.txt", Vec::new())?;
//! ar.finalize()?;
//!
//! let mut ar = Archive::open("out.dpk", Default::default())?;
//! let data = ar.read_file("readme.txt")?;
//! assert_eq!(data, b"Hello, world!");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{DataPakError, Result};
use crate::extension::{HeaderExt, IndexExt};
use crate::header::Header;
use crate::io_stream::{Reader, ReaderOptions, Writer, WriterOptions};
use crate::record::IndexEntry;

/// Lightweight descriptor returned by [`Archive::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub index: usize,
    pub name: String,
    pub uncomp_size: u64,
    pub comp_size: u64,
    /// Hex-encoded per-file checksum, or `None` when `checksumType == none`.
    pub checksum_hex: Option<String>,
}

impl EntryInfo {
    fn from_entry(index: usize, e: &IndexEntry, digest_len: usize) -> Self {
        let checksum_hex = (digest_len > 0).then(|| hex::encode(e.checksum(digest_len)));
        Self { index, name: e.filename(), uncomp_size: e.uncomp_size, comp_size: e.comp_size, checksum_hex }
    }
}

enum ArchiveMode {
    Read(Reader<BufReader<File>>),
    /// `None` only momentarily, between `finalize` taking ownership of the
    /// writer and the archive object being dropped.
    Write(Option<Writer<BufWriter<File>>>),
}

pub struct Archive {
    path: PathBuf,
    mode: ArchiveMode,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive").field("path", &self.path).finish()
    }
}

impl Archive {
    // ── Constructors ─────────────────────────────────────────────────────────

    pub fn open<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let buffered = BufReader::with_capacity(options.read_buffer_size, File::open(&path)?);
        let reader = Reader::open(buffered, options)?;
        Ok(Self { path, mode: ArchiveMode::Read(reader) })
    }

    pub fn create<P: AsRef<Path>>(path: P, header_extensions: Vec<HeaderExt>, options: WriterOptions) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let buffered = BufWriter::with_capacity(options.write_buffer_size, File::create(&path)?);
        let writer = Writer::create(buffered, header_extensions, options)?;
        Ok(Self { path, mode: ArchiveMode::Write(Some(writer)) })
    }

    // ── Write ────────────────────────────────────────────────────────────────

    pub fn add_file(&mut self, src_path: &Path, archive_name: &str, index_extensions: Vec<IndexExt>) -> Result<()> {
        match &mut self.mode {
            ArchiveMode::Write(Some(w)) => w.add_file(src_path, archive_name, index_extensions),
            ArchiveMode::Write(None) => Err(DataPakError::InvalidState("add_file called after finalize")),
            ArchiveMode::Read(_) => Err(DataPakError::InvalidState("archive is read-only")),
        }
    }

    /// Write signature, header, extensions, index and data region. Calling
    /// this twice is a programmer error; the underlying [`Writer`] is
    /// consumed the first time and subsequent calls return `InvalidState`.
    pub fn finalize(&mut self) -> Result<()> {
        match &mut self.mode {
            ArchiveMode::Write(slot @ Some(_)) => {
                let writer = slot.take().unwrap();
                let mut buffered = writer.finalize()?;
                std::io::Write::flush(&mut buffered)?;
                Ok(())
            }
            ArchiveMode::Write(None) => Err(DataPakError::InvalidState("finalize called twice")),
            ArchiveMode::Read(_) => Err(DataPakError::InvalidState("archive is read-only")),
        }
    }

    // ── Read ─────────────────────────────────────────────────────────────────

    pub fn list(&self) -> Vec<EntryInfo> {
        match &self.mode {
            ArchiveMode::Read(r) => {
                let digest_len = r.header.checksum_algo().map(|a| a.digest_len()).unwrap_or(0);
                r.indexes.iter().enumerate().map(|(i, e)| EntryInfo::from_entry(i, e, digest_len)).collect()
            }
            ArchiveMode::Write(Some(w)) => {
                let digest_len = w.header().checksum_algo().map(|a| a.digest_len()).unwrap_or(0);
                w.indexes().iter().enumerate().map(|(i, e)| EntryInfo::from_entry(i, e, digest_len)).collect()
            }
            ArchiveMode::Write(None) => Vec::new(),
        }
    }

    pub fn header(&self) -> Result<&Header> {
        match &self.mode {
            ArchiveMode::Read(r) => Ok(&r.header),
            ArchiveMode::Write(Some(w)) => Ok(w.header()),
            ArchiveMode::Write(None) => Err(DataPakError::InvalidState("header unavailable after finalize")),
        }
    }

    pub fn random_access(&self) -> Result<bool> {
        match &self.mode {
            ArchiveMode::Read(r) => Ok(r.random_access()),
            _ => Err(DataPakError::InvalidState("random_access is only meaningful for an open archive")),
        }
    }

    pub fn peek_index(&self) -> Result<Option<&IndexEntry>> {
        match &self.mode {
            ArchiveMode::Read(r) => Ok(r.peek_index()),
            _ => Err(DataPakError::InvalidState("archive is write-only")),
        }
    }

    pub fn next_bytes(&mut self) -> Result<Vec<u8>> {
        match &mut self.mode {
            ArchiveMode::Read(r) => r.next_bytes(),
            _ => Err(DataPakError::InvalidState("archive is write-only")),
        }
    }

    pub fn seek_to(&mut self, i: usize) -> Result<IndexEntry> {
        match &mut self.mode {
            ArchiveMode::Read(r) => r.seek_to(i),
            _ => Err(DataPakError::InvalidState("archive is write-only")),
        }
    }

    /// Read one file's bytes by name; see [`Archive::read_file_at`] for the
    /// access-mode rules this is built on.
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .list()
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| DataPakError::InvalidState("file not found in archive"))?;
        self.read_file_at(entry.index)
    }

    /// Read one file's bytes by index. Random-access archives can seek
    /// directly; jointly compressed archives only support reading forward
    /// from wherever iteration currently sits, so `index` must be `>=` the
    /// index of the next unread entry.
    pub fn read_file_at(&mut self, index: usize) -> Result<Vec<u8>> {
        match &mut self.mode {
            ArchiveMode::Read(r) => {
                if r.random_access() {
                    r.seek_to(index)?;
                    return r.next_bytes();
                }
                if index < r.next_index() {
                    return Err(DataPakError::InvalidState("jointly compressed archives only support forward reads"));
                }
                loop {
                    let cur = r.next_index();
                    let bytes = r.next_bytes()?;
                    if cur == index {
                        return Ok(bytes);
                    }
                }
            }
            _ => Err(DataPakError::InvalidState("archive is write-only")),
        }
    }

    /// Extract every entry into `dest` in archive order, creating the
    /// directory if necessary. Only valid for random-access archives or for
    /// a freshly opened sequential one.
    pub fn extract_all<P: AsRef<Path>>(&mut self, dest: P) -> Result<()> {
        let dest = dest.as_ref();
        if !dest.exists() {
            std::fs::create_dir_all(dest)?;
        }
        let names: Vec<String> = self.list().into_iter().map(|e| e.name).collect();
        for name in names {
            let data = self.next_bytes()?;
            std::fs::write(dest.join(&name), &data)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
