//! Primitive codecs: a uniform streaming interface over every compression
//! method DataPak recognizes.
//!
//! # Identity
//! `compMethod` on disk is an 8-byte ASCII tag, not a numeric id — trailing
//! spaces are significant and MUST be reproduced exactly (`tag()`/`from_tag`
//! below are the only place that byte layout is allowed to live).
//!
//! # Streaming model
//! Every encoder/decoder exposes `feed(bytes) -> produced bytes`. Encoders
//! additionally expose `flush()` (emit a codec-sync point without ending the
//! stream — used between files in a jointly compressed archive) and
//! `finish()` (final block — used once at archive end, or once per file in
//! per-file compression mode). Buffering is caller-driven: nothing here
//! grows an internal buffer without bound: ZLIB/ZSTD hold at most one zlib
//! window's worth of undrained output, and LZ4 holds at most one flush
//! segment.

use std::io::{self, Write};
use flate2::write::{ZlibDecoder, ZlibEncoder};
use flate2::Compression;

use crate::error::{DataPakError, Result};

// ── CompMethod ───────────────────────────────────────────────────────────────

/// One of the five ASCII tags recognized in `Header::comp_method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompMethod {
    Uncompressed,
    Zlib,
    Zstd,
    ZstdDict,
    Lz4,
}

impl CompMethod {
    pub fn tag(self) -> [u8; 8] {
        match self {
            CompMethod::Uncompressed => *b"UNCMPRSD",
            CompMethod::Zlib => *b"ZLIB    ",
            CompMethod::Zstd => *b"ZSTD    ",
            CompMethod::ZstdDict => *b"ZSTD+D  ",
            CompMethod::Lz4 => *b"LZ4     ",
        }
    }

    pub fn from_tag(tag: &[u8; 8]) -> Option<Self> {
        match tag {
            b"UNCMPRSD" => Some(CompMethod::Uncompressed),
            b"ZLIB    " => Some(CompMethod::Zlib),
            b"ZSTD    " => Some(CompMethod::Zstd),
            b"ZSTD+D  " => Some(CompMethod::ZstdDict),
            b"LZ4     " => Some(CompMethod::Lz4),
            _ => None,
        }
    }

    /// Parse a CLI-friendly lowercase name. Never used on the wire.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "uncompressed" => Some(CompMethod::Uncompressed),
            "zlib" | "deflate" => Some(CompMethod::Zlib),
            "zstd" => Some(CompMethod::Zstd),
            "zstd+d" | "zstddict" => Some(CompMethod::ZstdDict),
            "lz4" => Some(CompMethod::Lz4),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompMethod::Uncompressed => "none",
            CompMethod::Zlib => "zlib",
            CompMethod::Zstd => "zstd",
            CompMethod::ZstdDict => "zstd+d",
            CompMethod::Lz4 => "lz4",
        }
    }
}

// ── Flush modes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// More data is coming; do not emit a sync point.
    Continue,
    /// Emit a codec-sync point (zstd `e_flush`, deflate `Z_SYNC_FLUSH`)
    /// without ending the compressed stream. Used between files in a
    /// jointly compressed archive.
    Flush,
    /// Final block (zstd `e_end`, deflate `Z_FINISH`). Used once at archive
    /// end in joint mode, or once per file in per-file mode.
    End,
}

// ── Streaming traits ─────────────────────────────────────────────────────────

pub trait StreamEncoder {
    /// Feed more plaintext; returns any compressed bytes ready to write out.
    fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>>;
    /// Emit a sync point without ending the stream.
    fn flush(&mut self) -> Result<Vec<u8>>;
    /// Finalize the stream; no further `feed` calls are valid afterward.
    fn finish(&mut self) -> Result<Vec<u8>>;
}

pub trait StreamDecoder {
    /// Feed more compressed bytes; returns any plaintext bytes decoded so far.
    fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>>;
    /// Flush any buffered output and validate trailing codec checksums
    /// (e.g. zlib's Adler-32 trailer).
    fn finish(&mut self) -> Result<Vec<u8>>;
}

fn comp_err(e: impl std::fmt::Display) -> DataPakError {
    DataPakError::Compression(e.to_string())
}

// ── None ─────────────────────────────────────────────────────────────────────

struct NoneEncoder;
impl StreamEncoder for NoneEncoder {
    fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>> { Ok(input.to_vec()) }
    fn flush(&mut self) -> Result<Vec<u8>> { Ok(Vec::new()) }
    fn finish(&mut self) -> Result<Vec<u8>> { Ok(Vec::new()) }
}

struct NoneDecoder;
impl StreamDecoder for NoneDecoder {
    fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>> { Ok(input.to_vec()) }
    fn finish(&mut self) -> Result<Vec<u8>> { Ok(Vec::new()) }
}

// ── Zlib (deflate) ───────────────────────────────────────────────────────────

struct ZlibStreamEncoder {
    inner: ZlibEncoder<Vec<u8>>,
}
impl ZlibStreamEncoder {
    fn new(level: i32) -> Self {
        Self { inner: ZlibEncoder::new(Vec::new(), Compression::new(level.clamp(0, 9) as u32)) }
    }
    fn drain(&mut self) -> Vec<u8> { std::mem::take(self.inner.get_mut()) }
}
impl StreamEncoder for ZlibStreamEncoder {
    fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.inner.write_all(input).map_err(comp_err)?;
        Ok(self.drain())
    }
    fn flush(&mut self) -> Result<Vec<u8>> {
        // Z_SYNC_FLUSH: emits a sync point without ending the deflate stream.
        io::Write::flush(&mut self.inner).map_err(comp_err)?;
        Ok(self.drain())
    }
    fn finish(&mut self) -> Result<Vec<u8>> {
        let placeholder = ZlibEncoder::new(Vec::new(), Compression::default());
        let inner = std::mem::replace(&mut self.inner, placeholder);
        inner.finish().map_err(comp_err)
    }
}

struct ZlibStreamDecoder {
    inner: ZlibDecoder<Vec<u8>>,
}
impl ZlibStreamDecoder {
    fn new() -> Self { Self { inner: ZlibDecoder::new(Vec::new()) } }
    fn drain(&mut self) -> Vec<u8> { std::mem::take(self.inner.get_mut()) }
}
impl StreamDecoder for ZlibStreamDecoder {
    fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.inner.write_all(input).map_err(comp_err)?;
        Ok(self.drain())
    }
    fn finish(&mut self) -> Result<Vec<u8>> {
        let placeholder = ZlibDecoder::new(Vec::new());
        let inner = std::mem::replace(&mut self.inner, placeholder);
        inner.finish().map_err(comp_err)
    }
}

// ── Zstd (plain + dictionary) ────────────────────────────────────────────────

struct ZstdStreamEncoder<'a> {
    inner: zstd::stream::write::Encoder<'a, Vec<u8>>,
}
impl<'a> ZstdStreamEncoder<'a> {
    fn new(level: i32, dict: Option<&[u8]>) -> Result<Self> {
        let inner = match dict {
            Some(d) => zstd::stream::write::Encoder::with_dictionary(Vec::new(), level, d).map_err(comp_err)?,
            None => zstd::stream::write::Encoder::new(Vec::new(), level).map_err(comp_err)?,
        };
        Ok(Self { inner })
    }
    fn drain(&mut self) -> Vec<u8> { std::mem::take(self.inner.get_mut()) }
}
impl<'a> StreamEncoder for ZstdStreamEncoder<'a> {
    fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.inner.write_all(input).map_err(comp_err)?;
        Ok(self.drain())
    }
    fn flush(&mut self) -> Result<Vec<u8>> {
        // zstd e_flush: sync point, frame stays open.
        io::Write::flush(&mut self.inner).map_err(comp_err)?;
        Ok(self.drain())
    }
    fn finish(&mut self) -> Result<Vec<u8>> {
        // zstd e_end: close the frame. `finish()` consumes the encoder, so
        // swap in a throwaway one to satisfy the `&mut self` signature.
        let placeholder = zstd::stream::write::Encoder::new(Vec::new(), 0).expect("zstd placeholder encoder");
        let inner = std::mem::replace(&mut self.inner, placeholder);
        inner.finish().map_err(comp_err)
    }
}

struct ZstdStreamDecoder<'a> {
    inner: zstd::stream::write::Decoder<'a, Vec<u8>>,
}
impl<'a> ZstdStreamDecoder<'a> {
    fn new(dict: Option<&[u8]>) -> Result<Self> {
        let inner = match dict {
            Some(d) => zstd::stream::write::Decoder::with_dictionary(Vec::new(), d).map_err(comp_err)?,
            None => zstd::stream::write::Decoder::new(Vec::new()).map_err(comp_err)?,
        };
        Ok(Self { inner })
    }
    fn drain(&mut self) -> Vec<u8> { std::mem::take(self.inner.get_mut()) }
}
impl<'a> StreamDecoder for ZstdStreamDecoder<'a> {
    fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.inner.write_all(input).map_err(comp_err)?;
        Ok(self.drain())
    }
    fn finish(&mut self) -> Result<Vec<u8>> {
        // `write::Decoder` has no consuming `finish()` in this zstd version;
        // decompression (incl. trailing checksum validation) completes
        // incrementally as bytes are fed in via `write_all`, so a plain
        // flush + drain surfaces whatever output remains buffered.
        io::Write::flush(&mut self.inner).map_err(comp_err)?;
        Ok(self.drain())
    }
}

// ── LZ4 ──────────────────────────────────────────────────────────────────────
//
// `lz4_flex` exposes a whole-block API, not a flush-aware stream, so DataPak
// frames it itself: each flush segment becomes one `u32 LE length || body`
// record, where `body` is `lz4_flex::compress_prepend_size` output. `Flush`
// and `End` behave identically here — both close out the current segment —
// which is a deliberate per-codec difference from ZLIB/ZSTD, not a bug; see
// SPEC_FULL.md §4.

struct Lz4StreamEncoder {
    pending: Vec<u8>,
}
impl Lz4StreamEncoder {
    fn new() -> Self { Self { pending: Vec::new() } }
    fn emit_segment(&mut self) -> Vec<u8> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let body = lz4_flex::compress_prepend_size(&self.pending);
        self.pending.clear();
        let mut out = Vec::with_capacity(4 + body.len());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }
}
impl StreamEncoder for Lz4StreamEncoder {
    fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.pending.extend_from_slice(input);
        Ok(Vec::new())
    }
    fn flush(&mut self) -> Result<Vec<u8>> { Ok(self.emit_segment()) }
    fn finish(&mut self) -> Result<Vec<u8>> { Ok(self.emit_segment()) }
}

struct Lz4StreamDecoder {
    buf: Vec<u8>,
}
impl Lz4StreamDecoder {
    fn new() -> Self { Self { buf: Vec::new() } }
}
impl StreamDecoder for Lz4StreamDecoder {
    fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.buf.extend_from_slice(input);
        let mut out = Vec::new();
        loop {
            if self.buf.len() < 4 {
                break;
            }
            let len = u32::from_le_bytes(self.buf[0..4].try_into().unwrap()) as usize;
            if self.buf.len() < 4 + len {
                break;
            }
            let body = &self.buf[4..4 + len];
            let decoded = lz4_flex::decompress_size_prepended(body).map_err(comp_err)?;
            out.extend_from_slice(&decoded);
            self.buf.drain(0..4 + len);
        }
        Ok(out)
    }
    fn finish(&mut self) -> Result<Vec<u8>> {
        if !self.buf.is_empty() {
            return Err(DataPakError::Compression("trailing LZ4 bytes never formed a complete segment".into()));
        }
        Ok(Vec::new())
    }
}

// ── Factory ──────────────────────────────────────────────────────────────────

pub fn new_encoder(method: CompMethod, level: i32, dict: Option<&[u8]>) -> Result<Box<dyn StreamEncoder + '_>> {
    match method {
        CompMethod::Uncompressed => Ok(Box::new(NoneEncoder)),
        CompMethod::Zlib => Ok(Box::new(ZlibStreamEncoder::new(level))),
        CompMethod::Zstd => Ok(Box::new(ZstdStreamEncoder::new(level, None)?)),
        CompMethod::ZstdDict => Ok(Box::new(ZstdStreamEncoder::new(level, dict)?)),
        CompMethod::Lz4 => Ok(Box::new(Lz4StreamEncoder::new())),
    }
}

pub fn new_decoder(method: CompMethod, dict: Option<&[u8]>) -> Result<Box<dyn StreamDecoder + '_>> {
    match method {
        CompMethod::Uncompressed => Ok(Box::new(NoneDecoder)),
        CompMethod::Zlib => Ok(Box::new(ZlibStreamDecoder::new())),
        CompMethod::Zstd => Ok(Box::new(ZstdStreamDecoder::new(None)?)),
        CompMethod::ZstdDict => Ok(Box::new(ZstdStreamDecoder::new(dict)?)),
        CompMethod::Lz4 => Ok(Box::new(Lz4StreamDecoder::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(method: CompMethod, data: &[u8]) {
        let mut enc = new_encoder(method, 3, None).unwrap();
        let mut compressed = enc.feed(data).unwrap();
        compressed.extend(enc.finish().unwrap());

        let mut dec = new_decoder(method, None).unwrap();
        let mut out = dec.feed(&compressed).unwrap();
        out.extend(dec.finish().unwrap());
        assert_eq!(out, data);
    }

    #[test]
    fn tags_roundtrip() {
        for m in [CompMethod::Uncompressed, CompMethod::Zlib, CompMethod::Zstd, CompMethod::ZstdDict, CompMethod::Lz4] {
            assert_eq!(CompMethod::from_tag(&m.tag()), Some(m));
            assert_eq!(m.tag().len(), 8);
        }
    }

    #[test]
    fn none_roundtrip() { roundtrip(CompMethod::Uncompressed, b"hello world"); }

    #[test]
    fn zlib_roundtrip() { roundtrip(CompMethod::Zlib, &vec![7u8; 10_000]); }

    #[test]
    fn zstd_roundtrip() { roundtrip(CompMethod::Zstd, b"the quick brown fox jumps over the lazy dog"); }

    #[test]
    fn lz4_roundtrip() { roundtrip(CompMethod::Lz4, &vec![0xAAu8; 5000]); }

    #[test]
    fn lz4_multi_segment_roundtrip() {
        let mut enc = new_encoder(CompMethod::Lz4, 0, None).unwrap();
        let mut compressed = enc.feed(b"first file body").unwrap();
        compressed.extend(enc.flush().unwrap());
        compressed.extend(enc.feed(b"second file body").unwrap());
        compressed.extend(enc.finish().unwrap());

        let mut dec = new_decoder(CompMethod::Lz4, None).unwrap();
        let out = dec.feed(&compressed).unwrap();
        assert_eq!(out, b"first file bodysecond file body");
    }
}
