//! File content digests.

use std::io::{self, Read};

use serde::{Deserialize, Serialize};
use sha2::Digest;

/// Digest algorithm accepted by [`crate::FileSystem::calc_hash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// MD5.
    Md5 = 0,
    /// SHA-1.
    Sha1 = 1,
    /// SHA-256.
    #[default]
    Sha256 = 2,
    /// SHA3-224.
    Sha3_224 = 3,
    /// SHA3-256.
    Sha3_256 = 4,
    /// SHA3-384.
    Sha3_384 = 5,
    /// SHA3-512.
    Sha3_512 = 6,
    /// Original Keccak padding, 224 bits.
    Keccak224 = 7,
    /// Original Keccak padding, 256 bits.
    Keccak256 = 8,
    /// Original Keccak padding, 384 bits.
    Keccak384 = 9,
    /// Original Keccak padding, 512 bits.
    Keccak512 = 10,
    /// CRC-32 (IEEE), printed as 8 hex digits.
    Crc32 = 11,
}

impl HashAlgorithm {
    /// Map a host number. Unknown values fall back to SHA-256.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Md5,
            1 => Self::Sha1,
            3 => Self::Sha3_224,
            4 => Self::Sha3_256,
            5 => Self::Sha3_384,
            6 => Self::Sha3_512,
            7 => Self::Keccak224,
            8 => Self::Keccak256,
            9 => Self::Keccak384,
            10 => Self::Keccak512,
            11 => Self::Crc32,
            _ => Self::Sha256,
        }
    }

    /// Lowercase hex digest of everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn digest_reader<R: Read>(self, reader: R) -> io::Result<String> {
        match self {
            Self::Md5 => md5_reader(reader),
            Self::Sha1 => digest_with::<sha1::Sha1, _>(reader),
            Self::Sha256 => digest_with::<sha2::Sha256, _>(reader),
            Self::Sha3_224 => digest_with::<sha3::Sha3_224, _>(reader),
            Self::Sha3_256 => digest_with::<sha3::Sha3_256, _>(reader),
            Self::Sha3_384 => digest_with::<sha3::Sha3_384, _>(reader),
            Self::Sha3_512 => digest_with::<sha3::Sha3_512, _>(reader),
            Self::Keccak224 => digest_with::<sha3::Keccak224, _>(reader),
            Self::Keccak256 => digest_with::<sha3::Keccak256, _>(reader),
            Self::Keccak384 => digest_with::<sha3::Keccak384, _>(reader),
            Self::Keccak512 => digest_with::<sha3::Keccak512, _>(reader),
            Self::Crc32 => crc32_reader(reader),
        }
    }

    /// Lowercase hex digest of `bytes`.
    #[must_use]
    pub fn digest_bytes(self, bytes: &[u8]) -> String {
        // Reading from a slice cannot fail.
        self.digest_reader(bytes).unwrap_or_default()
    }
}

const CHUNK: usize = 64 * 1024;

fn for_each_chunk<R: Read>(mut reader: R, mut f: impl FnMut(&[u8])) -> io::Result<()> {
    let mut buf = vec![0u8; CHUNK];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        f(&buf[..n]);
    }
}

fn digest_with<D: Digest, R: Read>(reader: R) -> io::Result<String> {
    let mut hasher = D::new();
    for_each_chunk(reader, |chunk| hasher.update(chunk))?;
    Ok(hex::encode(hasher.finalize()))
}

fn md5_reader<R: Read>(reader: R) -> io::Result<String> {
    let mut context = md5::Context::new();
    for_each_chunk(reader, |chunk| context.consume(chunk))?;
    Ok(format!("{:x}", context.compute()))
}

fn crc32_reader<R: Read>(reader: R) -> io::Result<String> {
    let mut hasher = crc32fast::Hasher::new();
    for_each_chunk(reader, |chunk| hasher.update(chunk))?;
    Ok(format!("{:08x}", hasher.finalize()))
}
