//! Extension registry: typed views over recognized header- and index-level
//! extension records, with unknown signatures preserved as opaque blobs so a
//! re-serialized archive round-trips records this crate doesn't understand.

use std::io::{self, Write};

use crate::error::Result;
use crate::record::{HeaderExtension, IndexExtension};

// ── Header-level extensions ─────────────────────────────────────────────────

pub const SIG_CMPRDICT: &[u8; 8] = b"CMPRDICT";
pub const SIG_CMPRDIXF: &[u8; 8] = b"CMPRDIxf";

/// A typed view of one header extension: either a recognized dictionary
/// record, or an opaque blob under a signature this crate doesn't recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderExt {
    /// Inline compression dictionary bytes (`CMPRDICT`).
    InlineDict(Vec<u8>),
    /// NUL-terminated path to an external dictionary file (`CMPRDIxf`).
    ExternalDictPath(String),
    Unknown { signature: [u8; 8], payload: Vec<u8> },
}

impl HeaderExt {
    pub fn from_record(rec: HeaderExtension) -> Self {
        match &rec.signature {
            s if s == SIG_CMPRDICT => HeaderExt::InlineDict(rec.payload),
            s if s == SIG_CMPRDIXF => {
                let nul = rec.payload.iter().position(|&b| b == 0).unwrap_or(rec.payload.len());
                HeaderExt::ExternalDictPath(String::from_utf8_lossy(&rec.payload[..nul]).into_owned())
            }
            _ => HeaderExt::Unknown { signature: rec.signature, payload: rec.payload },
        }
    }

    pub fn to_record(&self) -> HeaderExtension {
        match self {
            HeaderExt::InlineDict(bytes) => HeaderExtension::new(*SIG_CMPRDICT, bytes.clone()),
            HeaderExt::ExternalDictPath(path) => {
                let mut payload = path.as_bytes().to_vec();
                payload.push(0);
                HeaderExtension::new(*SIG_CMPRDIXF, payload)
            }
            HeaderExt::Unknown { signature, payload } => HeaderExtension::new(*signature, payload.clone()),
        }
    }
}

// ── Index-level extensions ──────────────────────────────────────────────────

pub const SIG_OSEXT: &[u8; 6] = b"OSExt ";
pub const SIG_OSEXTP: &[u8; 6] = b"OSExtP";
pub const SIG_RANDAC: &[u8; 6] = b"RandAc";

/// Bit layout of [`OsExtPosix::access_flags`], per §4.5. The format has a
/// single flag set, so a small hand-rolled newtype pulls its own weight
/// better than bringing in the `bitflags` crate for one struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessFlags(pub u32);

impl AccessFlags {
    pub const OTHER_EXEC: AccessFlags = AccessFlags(0x001);
    pub const OTHER_WRITE: AccessFlags = AccessFlags(0x002);
    pub const OTHER_READ: AccessFlags = AccessFlags(0x004);
    pub const GROUP_EXEC: AccessFlags = AccessFlags(0x008);
    pub const GROUP_WRITE: AccessFlags = AccessFlags(0x010);
    pub const GROUP_READ: AccessFlags = AccessFlags(0x020);
    pub const OWNER_EXEC: AccessFlags = AccessFlags(0x040);
    pub const OWNER_WRITE: AccessFlags = AccessFlags(0x080);
    pub const OWNER_READ: AccessFlags = AccessFlags(0x100);

    pub fn contains(self, other: AccessFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for AccessFlags {
    type Output = AccessFlags;
    fn bitor(self, rhs: AccessFlags) -> AccessFlags {
        AccessFlags(self.0 | rhs.0)
    }
}

/// Filename extension + relative path, timestamps, and attribute banks
/// (`OSExt `). Appears at both header level and index level in the format
/// note; this crate attaches it at index level, alongside `OSExtP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsExt {
    /// 200-byte 0xFF-padded filename-extension + relative-path field.
    pub path_field: [u8; 200],
    pub created: u64,
    pub modified: u64,
    pub attr_bank_1: u32,
    pub attr_bank_2: u32,
}

impl OsExt {
    pub const PAYLOAD_SIZE: usize = 200 + 8 + 8 + 4 + 4;

    pub fn new(relative_path: &str) -> Self {
        let mut path_field = [0xFFu8; 200];
        let bytes = relative_path.as_bytes();
        let n = bytes.len().min(200);
        path_field[..n].copy_from_slice(&bytes[..n]);
        Self { path_field, created: 0, modified: 0, attr_bank_1: 0, attr_bank_2: 0 }
    }

    pub fn relative_path(&self) -> String {
        let end = self.path_field.iter().position(|&b| b == 0xFF).unwrap_or(200);
        String::from_utf8_lossy(&self.path_field[..end]).into_owned()
    }

    fn write_payload<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(&self.path_field)?;
        w.write_all(&self.created.to_le_bytes())?;
        w.write_all(&self.modified.to_le_bytes())?;
        w.write_all(&self.attr_bank_1.to_le_bytes())?;
        w.write_all(&self.attr_bank_2.to_le_bytes())
    }

    fn read_payload(buf: &[u8]) -> io::Result<Self> {
        if buf.len() < Self::PAYLOAD_SIZE {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "OSExt payload truncated"));
        }
        let mut path_field = [0u8; 200];
        path_field.copy_from_slice(&buf[0..200]);
        Ok(Self {
            path_field,
            created: u64::from_le_bytes(buf[200..208].try_into().unwrap()),
            modified: u64::from_le_bytes(buf[208..216].try_into().unwrap()),
            attr_bank_1: u32::from_le_bytes(buf[216..220].try_into().unwrap()),
            attr_bank_2: u32::from_le_bytes(buf[220..224].try_into().unwrap()),
        })
    }
}

/// POSIX ownership metadata (`OSExtP`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsExtPosix {
    pub user_id: u32,
    pub group_id: u32,
    pub user_name: [u8; 32],
    pub group_name: [u8; 32],
    pub access_flags: u32,
}

impl OsExtPosix {
    pub const PAYLOAD_SIZE: usize = 4 + 4 + 32 + 32 + 4;

    fn write_payload<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(&self.user_id.to_le_bytes())?;
        w.write_all(&self.group_id.to_le_bytes())?;
        w.write_all(&self.user_name)?;
        w.write_all(&self.group_name)?;
        w.write_all(&self.access_flags.to_le_bytes())
    }

    fn read_payload(buf: &[u8]) -> io::Result<Self> {
        if buf.len() < Self::PAYLOAD_SIZE {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "OSExtP payload truncated"));
        }
        let mut user_name = [0u8; 32];
        let mut group_name = [0u8; 32];
        user_name.copy_from_slice(&buf[8..40]);
        group_name.copy_from_slice(&buf[40..72]);
        Ok(Self {
            user_id: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            group_id: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            user_name,
            group_name,
            access_flags: u32::from_le_bytes(buf[72..76].try_into().unwrap()),
        })
    }
}

/// One `position + auxiliary state` pair inside a `RandAc` extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandAcEntry {
    pub position: u64,
    pub aux: [u8; 16],
}

impl RandAcEntry {
    pub const SIZE: usize = 8 + 16;
}

/// Per-file random-access position table (`RandAc`); a flat array of
/// [`RandAcEntry`] records packed back-to-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandAc {
    pub entries: Vec<RandAcEntry>,
}

impl RandAc {
    fn write_payload<W: Write>(&self, mut w: W) -> io::Result<()> {
        for e in &self.entries {
            w.write_all(&e.position.to_le_bytes())?;
            w.write_all(&e.aux)?;
        }
        Ok(())
    }

    fn read_payload(buf: &[u8]) -> io::Result<Self> {
        let mut entries = Vec::with_capacity(buf.len() / RandAcEntry::SIZE);
        for chunk in buf.chunks_exact(RandAcEntry::SIZE) {
            let position = u64::from_le_bytes(chunk[0..8].try_into().unwrap());
            let mut aux = [0u8; 16];
            aux.copy_from_slice(&chunk[8..24]);
            entries.push(RandAcEntry { position, aux });
        }
        Ok(Self { entries })
    }
}

/// A typed view of one index extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexExt {
    Os(OsExt),
    OsPosix(OsExtPosix),
    RandomAccess(RandAc),
    Unknown { signature: [u8; 6], payload: Vec<u8> },
}

impl IndexExt {
    pub fn from_record(rec: IndexExtension) -> Result<Self> {
        Ok(match &rec.signature {
            s if s == SIG_OSEXT => IndexExt::Os(OsExt::read_payload(&rec.payload)?),
            s if s == SIG_OSEXTP => IndexExt::OsPosix(OsExtPosix::read_payload(&rec.payload)?),
            s if s == SIG_RANDAC => IndexExt::RandomAccess(RandAc::read_payload(&rec.payload)?),
            _ => IndexExt::Unknown { signature: rec.signature, payload: rec.payload },
        })
    }

    pub fn to_record(&self) -> IndexExtension {
        match self {
            IndexExt::Os(os) => {
                let mut payload = Vec::with_capacity(OsExt::PAYLOAD_SIZE);
                os.write_payload(&mut payload).expect("writing to a Vec cannot fail");
                IndexExtension::new(*SIG_OSEXT, payload)
            }
            IndexExt::OsPosix(p) => {
                let mut payload = Vec::with_capacity(OsExtPosix::PAYLOAD_SIZE);
                p.write_payload(&mut payload).expect("writing to a Vec cannot fail");
                IndexExtension::new(*SIG_OSEXTP, payload)
            }
            IndexExt::RandomAccess(r) => {
                let mut payload = Vec::with_capacity(r.entries.len() * RandAcEntry::SIZE);
                r.write_payload(&mut payload).expect("writing to a Vec cannot fail");
                IndexExtension::new(*SIG_RANDAC, payload)
            }
            IndexExt::Unknown { signature, payload } => IndexExtension::new(*signature, payload.clone()),
        }
    }
}
