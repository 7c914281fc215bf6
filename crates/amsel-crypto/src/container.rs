//! Secret container codec shared by the notes and system file formats
//!
//! Layout (all formats):
//!
//! ```text
//! offset 0    magic       4 bytes   "AMSN" (notes) or "AMSS" (system)
//! offset 4    version     1 byte    = 1
//! offset 5    salt       16 bytes   random, per file
//! offset 21   nonce      12 bytes   random, per file
//! offset 33   ciphertext  N bytes
//! offset 33+N tag        16 bytes
//! ```
//!
//! The per-file key is `HKDF(master, salt, format label)`. The 33-byte header
//! is authenticated as associated data, so the version byte cannot be altered
//! without failing the tag check.

use crate::{
    aead::{self, NONCE_SIZE, TAG_SIZE},
    error::ContainerError,
    kdf::{KeyPurpose, derive_key},
    keys::MasterKey,
};

/// Current container version
pub const VERSION: u8 = 1;

/// Size of the random per-file salt
pub const SALT_SIZE: usize = 16;

/// Size of the fixed header (magic + version + salt + nonce)
pub const HEADER_SIZE: usize = 4 + 1 + SALT_SIZE + NONCE_SIZE;

/// Smallest valid container (empty payload)
pub const MIN_CONTAINER_SIZE: usize = HEADER_SIZE + TAG_SIZE;

/// Container formats sharing this codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// User notes (UTF-8 text payload)
    Notes,
    /// Internal system state (flat JSON object payload)
    System,
}

impl ContainerFormat {
    /// Magic bytes identifying the format.
    pub const fn magic(self) -> [u8; 4] {
        match self {
            Self::Notes => *b"AMSN",
            Self::System => *b"AMSS",
        }
    }

    /// Format for the given magic bytes.
    pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
        match &magic {
            b"AMSN" => Some(Self::Notes),
            b"AMSS" => Some(Self::System),
            _ => None,
        }
    }

    const fn purpose(self) -> KeyPurpose {
        match self {
            Self::Notes => KeyPurpose::NoteContainer,
            Self::System => KeyPurpose::SystemContainer,
        }
    }
}

/// Sealed size of a payload of `payload_len` bytes.
pub const fn sealed_len(payload_len: usize) -> usize {
    HEADER_SIZE + payload_len + TAG_SIZE
}

/// Seal `payload` into a container.
///
/// Caller MUST provide a fresh random salt and nonce for every write.
pub fn seal_container(
    format: ContainerFormat,
    payload: &[u8],
    master: &MasterKey,
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
) -> Vec<u8> {
    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(&format.magic());
    header[4] = VERSION;
    header[5..5 + SALT_SIZE].copy_from_slice(&salt);
    header[5 + SALT_SIZE..HEADER_SIZE].copy_from_slice(&nonce);

    let file_key = derive_key(master.as_bytes(), Some(salt.as_slice()), format.purpose(), b"");
    let ciphertext = aead::encrypt(file_key.as_bytes(), &nonce, payload, &header);

    let mut container = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
    container.extend_from_slice(&header);
    container.extend_from_slice(&ciphertext);
    container
}

/// Open a container of any known format.
///
/// # Errors
///
/// Checked in this order:
/// - `FileTooShort` if shorter than [`MIN_CONTAINER_SIZE`]
/// - `InvalidMagic` if the magic is not a known format
/// - `UnsupportedVersion` if the version is not [`VERSION`]
/// - `DecryptionFailure` if the tag does not verify
pub fn open_container(
    container: &[u8],
    master: &MasterKey,
) -> Result<(ContainerFormat, Vec<u8>), ContainerError> {
    let header = parse_header(container)?;
    let payload = decrypt_body(&header, container, master)?;
    Ok((header.format, payload))
}

/// Open a container that must be of `format`.
///
/// # Errors
///
/// As [`open_container`], and `InvalidMagic` if the container holds a
/// different format.
pub fn open_container_as(
    format: ContainerFormat,
    container: &[u8],
    master: &MasterKey,
) -> Result<Vec<u8>, ContainerError> {
    let header = parse_header(container)?;
    if header.format != format {
        return Err(ContainerError::InvalidMagic);
    }
    decrypt_body(&header, container, master)
}

struct Header {
    format: ContainerFormat,
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
}

fn parse_header(container: &[u8]) -> Result<Header, ContainerError> {
    if container.len() < MIN_CONTAINER_SIZE {
        return Err(ContainerError::FileTooShort {
            expected: MIN_CONTAINER_SIZE,
            actual: container.len(),
        });
    }

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&container[0..4]);
    let format = ContainerFormat::from_magic(magic).ok_or(ContainerError::InvalidMagic)?;

    let version = container[4];
    if version != VERSION {
        return Err(ContainerError::UnsupportedVersion(version));
    }

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&container[5..5 + SALT_SIZE]);
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&container[5 + SALT_SIZE..HEADER_SIZE]);

    Ok(Header { format, salt, nonce })
}

fn decrypt_body(
    header: &Header,
    container: &[u8],
    master: &MasterKey,
) -> Result<Vec<u8>, ContainerError> {
    let (header_bytes, ciphertext) = container.split_at(HEADER_SIZE);
    let file_key =
        derive_key(master.as_bytes(), Some(header.salt.as_slice()), header.format.purpose(), b"");

    aead::decrypt(file_key.as_bytes(), &header.nonce, ciphertext, header_bytes)
        .map_err(|_| ContainerError::DecryptionFailure)
}
