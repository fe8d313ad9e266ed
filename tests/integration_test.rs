use datapak::archive::Archive;
use datapak::checksum::ChecksumAlgo;
use datapak::codec::CompMethod;
use datapak::error::DataPakError;
use datapak::io_stream::{ReaderOptions, WriterOptions};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn write_temp(contents: &[u8]) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(contents).unwrap();
    f
}

/// S1: one-byte uncompressed archive has the exact documented layout.
#[test]
fn s1_single_byte_uncompressed_archive_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s1.dpk");
    let a = write_temp(&[0x41]);

    let options = WriterOptions { comp_method: CompMethod::Uncompressed, comp_level: 0, checksum_type: ChecksumAlgo::Crc32, per_file_compression: false, ..WriterOptions::default() };
    let mut ar = Archive::create(&path, Vec::new(), options).unwrap();
    ar.add_file(a.path(), "a.bin", Vec::new()).unwrap();
    ar.finalize().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 169);
    assert_eq!(bytes[168], 0x41);
    let digest = u32::from_le_bytes(bytes[160..164].try_into().unwrap());
    assert_eq!(digest, 0xD3D99E8B);

    let mut ar = Archive::open(&path, ReaderOptions::default()).unwrap();
    assert_eq!(ar.read_file("a.bin").unwrap(), vec![0x41]);
}

/// S2: three files under joint ZSTD compression with no per-file checksum.
#[test]
fn s2_joint_zstd_three_files_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s2.dpk");
    let a = write_temp(&[0x00u8; 100]);
    let b = write_temp(&[0xFFu8; 100]);
    let c = write_temp(&[]);

    let options = WriterOptions { comp_method: CompMethod::Zstd, comp_level: 10, checksum_type: ChecksumAlgo::None, per_file_compression: false, ..WriterOptions::default() };
    let mut ar = Archive::create(&path, Vec::new(), options).unwrap();
    ar.add_file(a.path(), "a", Vec::new()).unwrap();
    ar.add_file(b.path(), "b", Vec::new()).unwrap();
    ar.add_file(c.path(), "c", Vec::new()).unwrap();
    ar.finalize().unwrap();

    let mut ar = Archive::open(&path, ReaderOptions::default()).unwrap();
    assert_eq!(ar.list().len(), 3);
    assert_eq!(ar.header().unwrap().num_of_indexes, 3);
    assert_eq!(ar.header().unwrap().index_size, 384);
    assert_eq!(ar.next_bytes().unwrap(), vec![0x00u8; 100]);
    assert_eq!(ar.next_bytes().unwrap(), vec![0xFFu8; 100]);
    assert_eq!(ar.next_bytes().unwrap(), Vec::<u8>::new());
}

/// S3: two identical 64 KiB random blobs under ZLIB, CRC64-ECMA per file.
#[test]
fn s3_zlib_identical_blobs_crc64_ecma() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s3.dpk");

    // Deterministic "random-looking" 64 KiB blob — no RNG available here, so
    // a mixing recurrence stands in for one.
    let mut blob = vec![0u8; 65536];
    let mut state: u32 = 0x2545F491;
    for byte in blob.iter_mut() {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        *byte = (state >> 16) as u8;
    }
    let a = write_temp(&blob);
    let b = write_temp(&blob);

    let options = WriterOptions { comp_method: CompMethod::Zlib, comp_level: 6, checksum_type: ChecksumAlgo::Crc64Ecma, per_file_compression: true, ..WriterOptions::default() };
    let mut ar = Archive::create(&path, Vec::new(), options).unwrap();
    ar.add_file(a.path(), "a.bin", Vec::new()).unwrap();
    ar.add_file(b.path(), "b.bin", Vec::new()).unwrap();
    ar.finalize().unwrap();

    let mut ar = Archive::open(&path, ReaderOptions::default()).unwrap();
    let entries = ar.list();
    assert_eq!(entries.len(), 2);
    let out_a = ar.read_file_at(0).unwrap();
    let out_b = ar.read_file_at(1).unwrap();
    assert_eq!(out_a, blob);
    assert_eq!(out_b, blob);

    let mut h1 = ChecksumAlgo::Crc64Ecma.new_hasher();
    h1.update(&out_a);
    let mut h2 = ChecksumAlgo::Crc64Ecma.new_hasher();
    h2.update(&out_b);
    assert_eq!(h1.finalize(), h2.finalize());
}

/// S4: a signature of "Datapak." (lowercase 'p') is rejected as malformed.
#[test]
fn s4_bad_signature_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s4.dpk");
    let a = write_temp(b"x");

    let options = WriterOptions { comp_method: CompMethod::Uncompressed, comp_level: 0, checksum_type: ChecksumAlgo::None, per_file_compression: false, ..WriterOptions::default() };
    let mut ar = Archive::create(&path, Vec::new(), options).unwrap();
    ar.add_file(a.path(), "a", Vec::new()).unwrap();
    ar.finalize().unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    bytes[..8].copy_from_slice(b"Datapak.");
    std::fs::write(&path, &bytes).unwrap();

    let err = Archive::open(&path, ReaderOptions::default()).unwrap_err();
    assert!(matches!(err, DataPakError::BadSignature));
}

/// S5: flipping a bit in `header.numOfIndexes` trips the header CRC32 check.
#[test]
fn s5_tampered_header_field_raises_bad_checksum() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s5.dpk");
    let a = write_temp(b"x");

    let options = WriterOptions { comp_method: CompMethod::Uncompressed, comp_level: 0, checksum_type: ChecksumAlgo::None, per_file_compression: false, ..WriterOptions::default() };
    let mut ar = Archive::create(&path, Vec::new(), options).unwrap();
    ar.add_file(a.path(), "a", Vec::new()).unwrap();
    ar.finalize().unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    // numOfIndexes sits at header-relative offset 20, i.e. absolute 8 + 20
    // past the 8-byte signature.
    bytes[8 + 20] ^= 0x01;
    std::fs::write(&path, &bytes).unwrap();

    let err = Archive::open(&path, ReaderOptions::default()).unwrap_err();
    assert!(matches!(err, DataPakError::BadChecksum(_)));
}

/// S6: `seek_to` on a jointly compressed archive is unsupported.
#[test]
fn s6_seek_on_joint_archive_is_unsupported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s6.dpk");
    let a = write_temp(b"one");
    let b = write_temp(b"two");

    let options = WriterOptions { comp_method: CompMethod::Zstd, comp_level: 3, checksum_type: ChecksumAlgo::None, per_file_compression: false, ..WriterOptions::default() };
    let mut ar = Archive::create(&path, Vec::new(), options).unwrap();
    ar.add_file(a.path(), "a", Vec::new()).unwrap();
    ar.add_file(b.path(), "b", Vec::new()).unwrap();
    ar.finalize().unwrap();

    let mut ar = Archive::open(&path, ReaderOptions::default()).unwrap();
    assert!(!ar.random_access().unwrap());
    let err = ar.seek_to(1).unwrap_err();
    assert!(matches!(err, DataPakError::UnsupportedAccessMode));
}

#[test]
fn per_file_lz4_archive_is_random_access_and_supports_out_of_order_reads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rand.dpk");
    let a = write_temp(b"first file body");
    let b = write_temp(b"second file body, longer");
    let c = write_temp(b"third");

    let options = WriterOptions { comp_method: CompMethod::Lz4, comp_level: 0, checksum_type: ChecksumAlgo::Sha256, per_file_compression: true, ..WriterOptions::default() };
    let mut ar = Archive::create(&path, Vec::new(), options).unwrap();
    ar.add_file(a.path(), "a", Vec::new()).unwrap();
    ar.add_file(b.path(), "b", Vec::new()).unwrap();
    ar.add_file(c.path(), "c", Vec::new()).unwrap();
    ar.finalize().unwrap();

    let mut ar = Archive::open(&path, ReaderOptions::default()).unwrap();
    assert!(ar.random_access().unwrap());
    assert_eq!(ar.read_file_at(2).unwrap(), b"third");
    assert_eq!(ar.read_file_at(0).unwrap(), b"first file body");
    assert_eq!(ar.read_file_at(1).unwrap(), b"second file body, longer");
}

#[test]
fn extract_all_round_trips_a_small_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("extract.dpk");
    let a = write_temp(b"alpha");
    let b = write_temp(b"beta");

    let options = WriterOptions { comp_method: CompMethod::Zlib, comp_level: 9, checksum_type: ChecksumAlgo::Md5, per_file_compression: false, ..WriterOptions::default() };
    let mut ar = Archive::create(&path, Vec::new(), options).unwrap();
    ar.add_file(a.path(), "alpha.txt", Vec::new()).unwrap();
    ar.add_file(b.path(), "beta.txt", Vec::new()).unwrap();
    ar.finalize().unwrap();

    let mut ar = Archive::open(&path, ReaderOptions::default()).unwrap();
    let out_dir = dir.path().join("extracted");
    ar.extract_all(&out_dir).unwrap();
    assert_eq!(std::fs::read(out_dir.join("alpha.txt")).unwrap(), b"alpha");
    assert_eq!(std::fs::read(out_dir.join("beta.txt")).unwrap(), b"beta");
}
