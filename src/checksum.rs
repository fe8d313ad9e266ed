//! Checksum catalog: a uniform streaming interface over every per-file and
//! header integrity algorithm DataPak recognizes.
//!
//! The interface mirrors `codec::StreamEncoder`: `new_hasher(algo) → Hasher`,
//! `Hasher::update(bytes)`, `Hasher::finalize() → digest` with the digest
//! always exactly [`ChecksumAlgo::digest_len`] bytes long. The header-region
//! integrity checksum is always CRC32 regardless of `checksumType` — see
//! `io_stream.rs` — this module only covers the catalog in the header's
//! `checksumType` bitfield.
//!
//! `murmur3` has no incremental API; its three variants buffer fed bytes and
//! hash the accumulated buffer at `finalize()`. Every other algorithm here
//! updates incrementally without buffering the whole input.

use crc::Crc;
use md5::Md5;
use ripemd::Ripemd160;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};

const CRC64_ISO: Crc<u64> = Crc::<u64>::new(&crc::CRC_64_GO_ISO);
const CRC64_ECMA: Crc<u64> = Crc::<u64>::new(&crc::CRC_64_ECMA_182);

/// The closed checksum catalog from §3. `id()` is the on-disk `checksumType`
/// value (a packed `u6`); `digest_len()` is the byte length stored in the
/// trailing `N` bytes of `IndexEntry::field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgo {
    None,
    Ripemd160,
    Murmur32,
    Murmur128_32,
    Murmur128_64,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
    Md5,
    Crc32,
    Crc64Iso,
    Crc64Ecma,
}

impl ChecksumAlgo {
    pub fn id(self) -> u8 {
        match self {
            ChecksumAlgo::None => 0,
            ChecksumAlgo::Ripemd160 => 1,
            ChecksumAlgo::Murmur32 => 2,
            ChecksumAlgo::Murmur128_32 => 3,
            ChecksumAlgo::Murmur128_64 => 4,
            ChecksumAlgo::Sha224 => 5,
            ChecksumAlgo::Sha256 => 6,
            ChecksumAlgo::Sha384 => 7,
            ChecksumAlgo::Sha512 => 8,
            ChecksumAlgo::Sha512_224 => 9,
            ChecksumAlgo::Sha512_256 => 10,
            ChecksumAlgo::Md5 => 11,
            ChecksumAlgo::Crc32 => 12,
            ChecksumAlgo::Crc64Iso => 13,
            ChecksumAlgo::Crc64Ecma => 14,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => ChecksumAlgo::None,
            1 => ChecksumAlgo::Ripemd160,
            2 => ChecksumAlgo::Murmur32,
            3 => ChecksumAlgo::Murmur128_32,
            4 => ChecksumAlgo::Murmur128_64,
            5 => ChecksumAlgo::Sha224,
            6 => ChecksumAlgo::Sha256,
            7 => ChecksumAlgo::Sha384,
            8 => ChecksumAlgo::Sha512,
            9 => ChecksumAlgo::Sha512_224,
            10 => ChecksumAlgo::Sha512_256,
            11 => ChecksumAlgo::Md5,
            12 => ChecksumAlgo::Crc32,
            13 => ChecksumAlgo::Crc64Iso,
            14 => ChecksumAlgo::Crc64Ecma,
            _ => return None,
        })
    }

    pub fn digest_len(self) -> usize {
        match self {
            ChecksumAlgo::None => 0,
            ChecksumAlgo::Ripemd160 => 20,
            ChecksumAlgo::Murmur32 => 4,
            ChecksumAlgo::Murmur128_32 => 16,
            ChecksumAlgo::Murmur128_64 => 16,
            ChecksumAlgo::Sha224 => 28,
            ChecksumAlgo::Sha256 => 32,
            ChecksumAlgo::Sha384 => 48,
            ChecksumAlgo::Sha512 => 64,
            ChecksumAlgo::Sha512_224 => 28,
            ChecksumAlgo::Sha512_256 => 32,
            ChecksumAlgo::Md5 => 16,
            ChecksumAlgo::Crc32 => 4,
            ChecksumAlgo::Crc64Iso => 8,
            ChecksumAlgo::Crc64Ecma => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChecksumAlgo::None => "none",
            ChecksumAlgo::Ripemd160 => "ripemd160",
            ChecksumAlgo::Murmur32 => "murmur3-32",
            ChecksumAlgo::Murmur128_32 => "murmur3-128-x86",
            ChecksumAlgo::Murmur128_64 => "murmur3-128-x64",
            ChecksumAlgo::Sha224 => "sha224",
            ChecksumAlgo::Sha256 => "sha256",
            ChecksumAlgo::Sha384 => "sha384",
            ChecksumAlgo::Sha512 => "sha512",
            ChecksumAlgo::Sha512_224 => "sha512-224",
            ChecksumAlgo::Sha512_256 => "sha512-256",
            ChecksumAlgo::Md5 => "md5",
            ChecksumAlgo::Crc32 => "crc32",
            ChecksumAlgo::Crc64Iso => "crc64-iso",
            ChecksumAlgo::Crc64Ecma => "crc64-ecma",
        }
    }

    /// Parse a CLI-friendly name; accepts every string `name()` can produce.
    pub fn from_name(s: &str) -> Option<Self> {
        let all = [
            ChecksumAlgo::None, ChecksumAlgo::Ripemd160, ChecksumAlgo::Murmur32,
            ChecksumAlgo::Murmur128_32, ChecksumAlgo::Murmur128_64, ChecksumAlgo::Sha224,
            ChecksumAlgo::Sha256, ChecksumAlgo::Sha384, ChecksumAlgo::Sha512,
            ChecksumAlgo::Sha512_224, ChecksumAlgo::Sha512_256, ChecksumAlgo::Md5,
            ChecksumAlgo::Crc32, ChecksumAlgo::Crc64Iso, ChecksumAlgo::Crc64Ecma,
        ];
        all.into_iter().find(|a| a.name().eq_ignore_ascii_case(s))
    }

    pub fn new_hasher(self) -> Hasher {
        match self {
            ChecksumAlgo::None => Hasher::None,
            ChecksumAlgo::Ripemd160 => Hasher::Ripemd160(Ripemd160::new()),
            ChecksumAlgo::Murmur32 => Hasher::Murmur { variant: self, buf: Vec::new() },
            ChecksumAlgo::Murmur128_32 => Hasher::Murmur { variant: self, buf: Vec::new() },
            ChecksumAlgo::Murmur128_64 => Hasher::Murmur { variant: self, buf: Vec::new() },
            ChecksumAlgo::Sha224 => Hasher::Sha224(Sha224::new()),
            ChecksumAlgo::Sha256 => Hasher::Sha256(Sha256::new()),
            ChecksumAlgo::Sha384 => Hasher::Sha384(Sha384::new()),
            ChecksumAlgo::Sha512 => Hasher::Sha512(Sha512::new()),
            ChecksumAlgo::Sha512_224 => Hasher::Sha512_224(Sha512_224::new()),
            ChecksumAlgo::Sha512_256 => Hasher::Sha512_256(Sha512_256::new()),
            ChecksumAlgo::Md5 => Hasher::Md5(Md5::new()),
            ChecksumAlgo::Crc32 => Hasher::Crc32(crc32fast::Hasher::new()),
            ChecksumAlgo::Crc64Iso => Hasher::Crc64(CRC64_ISO.digest()),
            ChecksumAlgo::Crc64Ecma => Hasher::Crc64(CRC64_ECMA.digest()),
        }
    }
}

/// A live hashing session for one of the catalog algorithms in [`ChecksumAlgo`].
pub enum Hasher {
    None,
    Ripemd160(Ripemd160),
    Murmur { variant: ChecksumAlgo, buf: Vec<u8> },
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Sha512_224(Sha512_224),
    Sha512_256(Sha512_256),
    Md5(Md5),
    Crc32(crc32fast::Hasher),
    Crc64(crc::Digest<'static, u64>),
}

impl Hasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::None => {}
            Hasher::Ripemd160(h) => h.update(data),
            Hasher::Murmur { buf, .. } => buf.extend_from_slice(data),
            Hasher::Sha224(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha384(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
            Hasher::Sha512_224(h) => h.update(data),
            Hasher::Sha512_256(h) => h.update(data),
            Hasher::Md5(h) => h.update(data),
            Hasher::Crc32(h) => h.update(data),
            Hasher::Crc64(h) => h.update(data),
        }
    }

    /// Consume the hasher, returning a digest exactly `algo.digest_len()` bytes.
    pub fn finalize(self) -> Vec<u8> {
        match self {
            Hasher::None => Vec::new(),
            Hasher::Ripemd160(h) => h.finalize().to_vec(),
            Hasher::Murmur { variant, buf } => murmur_digest(variant, &buf),
            Hasher::Sha224(h) => h.finalize().to_vec(),
            Hasher::Sha256(h) => h.finalize().to_vec(),
            Hasher::Sha384(h) => h.finalize().to_vec(),
            Hasher::Sha512(h) => h.finalize().to_vec(),
            Hasher::Sha512_224(h) => h.finalize().to_vec(),
            Hasher::Sha512_256(h) => h.finalize().to_vec(),
            Hasher::Md5(h) => h.finalize().to_vec(),
            Hasher::Crc32(h) => h.finalize().to_le_bytes().to_vec(),
            Hasher::Crc64(h) => h.finalize().to_le_bytes().to_vec(),
        }
    }
}

fn murmur_digest(variant: ChecksumAlgo, buf: &[u8]) -> Vec<u8> {
    // Seed 0x66696c65 ("file" in ASCII) is the historical seed used by the
    // legacy D implementation this format descends from. New archives use
    // seed 0 per §9's Open Question (c); kept here only as a named constant
    // for readers porting archives produced by older tooling.
    const SEED: u32 = 0;
    let mut cursor = std::io::Cursor::new(buf);
    match variant {
        ChecksumAlgo::Murmur32 => {
            let h = murmur3::murmur3_32(&mut cursor, SEED).expect("murmur3_32 over an in-memory buffer cannot fail");
            h.to_le_bytes().to_vec()
        }
        ChecksumAlgo::Murmur128_32 => {
            let h = murmur3::murmur3_x86_128(&mut cursor, SEED).expect("murmur3_x86_128 over an in-memory buffer cannot fail");
            h.to_le_bytes().to_vec()
        }
        ChecksumAlgo::Murmur128_64 => {
            let h = murmur3::murmur3_x64_128(&mut cursor, SEED).expect("murmur3_x64_128 over an in-memory buffer cannot fail");
            h.to_le_bytes().to_vec()
        }
        _ => unreachable!("murmur_digest only called for murmur variants"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_roundtrips_ids() {
        for id in 0..=14u8 {
            let algo = ChecksumAlgo::from_id(id).unwrap();
            assert_eq!(algo.id(), id);
        }
        assert!(ChecksumAlgo::from_id(15).is_none());
    }

    #[test]
    fn digest_lengths_match_catalog() {
        let expected = [0, 20, 4, 16, 16, 28, 32, 48, 64, 28, 32, 16, 4, 8, 8];
        for (id, &len) in expected.iter().enumerate() {
            let algo = ChecksumAlgo::from_id(id as u8).unwrap();
            assert_eq!(algo.digest_len(), len, "algo {:?}", algo);
            let mut h = algo.new_hasher();
            h.update(b"some content to hash");
            assert_eq!(h.finalize().len(), len);
        }
    }

    #[test]
    fn crc32_digest_matches_0x41() {
        let mut h = ChecksumAlgo::Crc32.new_hasher();
        h.update(&[0x41]);
        let digest = h.finalize();
        assert_eq!(digest, 0xD3D99E8Bu32.to_le_bytes());
    }

    #[test]
    fn incremental_update_matches_single_shot() {
        let mut a = ChecksumAlgo::Sha256.new_hasher();
        a.update(b"hello ");
        a.update(b"world");
        let mut b = ChecksumAlgo::Sha256.new_hasher();
        b.update(b"hello world");
        assert_eq!(a.finalize(), b.finalize());
    }
}
