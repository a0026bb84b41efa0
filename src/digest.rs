//! Streaming digests for source mboxes, messages and externalized content.
//!
//! The algorithm is chosen at run time from its name, so every hasher is
//! driven through `DynDigest`. [`HashingReader`] lets the mbox segmenter hash
//! a file in the same pass that splits it.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use sha2::digest::DynDigest;

use crate::error::{ConvertError, Result};

/// Digest algorithms understood by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [Self; 5] = [Self::Sha256, Self::Sha384, Self::Sha512, Self::Sha1, Self::Md5];

    /// Canonical name, as written to `Hash/Function`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
        }
    }

    /// Start a new incremental digest.
    pub fn digester(self) -> Digester {
        let inner: Box<dyn DynDigest> = match self {
            Self::Md5 => Box::new(md5::Md5::default()),
            Self::Sha1 => Box::new(sha1::Sha1::default()),
            Self::Sha256 => Box::new(sha2::Sha256::default()),
            Self::Sha384 => Box::new(sha2::Sha384::default()),
            Self::Sha512 => Box::new(sha2::Sha512::default()),
        };
        Digester {
            algorithm: self,
            inner,
            len: 0,
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "MD5" => Ok(Self::Md5),
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            "SHA384" => Ok(Self::Sha384),
            "SHA512" => Ok(Self::Sha512),
            _ => Err(ConvertError::UnsupportedHashAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A finished digest value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub algorithm: HashAlgorithm,
    pub bytes: Vec<u8>,
}

impl Digest {
    /// Upper-case hexadecimal rendering, as written to `Hash/Value`.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.bytes)
    }
}

/// Incremental digest over any number of `update` calls.
pub struct Digester {
    algorithm: HashAlgorithm,
    inner: Box<dyn DynDigest>,
    len: u64,
}

impl Digester {
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.len += data.len() as u64;
    }

    /// Number of bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn finalize(self) -> Digest {
        Digest {
            algorithm: self.algorithm,
            bytes: self.inner.finalize().into_vec(),
        }
    }
}

impl io::Write for Digester {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reader adapter that hashes every byte passing through it.
pub struct HashingReader<R> {
    inner: R,
    digester: Digester,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R, algorithm: HashAlgorithm) -> Self {
        Self {
            inner,
            digester: algorithm.digester(),
        }
    }

    /// Drain whatever the consumer left unread, then return the digest and
    /// the total byte count.
    pub fn finish(mut self) -> io::Result<(Digest, u64)> {
        io::copy(&mut self.inner, &mut self.digester)?;
        let len = self.digester.len();
        Ok((self.digester.finalize(), len))
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.digester.update(&buf[..n]);
        Ok(n)
    }
}

/// Hash an in-memory buffer.
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> Digest {
    let mut d = algorithm.digester();
    d.update(data);
    d.finalize()
}

/// Hash a whole file from disk.
pub fn hash_file(algorithm: HashAlgorithm, path: &Path) -> Result<Digest> {
    let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    let reader = HashingReader::new(BufReader::new(file), algorithm);
    let (digest, _) = reader.finish().map_err(|e| ConvertError::io(path, e))?;
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithm_names() {
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha-1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        assert_eq!("SHA_512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert!("CRC32".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            hash_bytes(HashAlgorithm::Sha256, b"abc").to_hex(),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
        assert_eq!(
            hash_bytes(HashAlgorithm::Sha1, b"abc").to_hex(),
            "A9993E364706816ABA3E25717850C26C9CD0D89D"
        );
        assert_eq!(
            hash_bytes(HashAlgorithm::Md5, b"abc").to_hex(),
            "900150983CD24FB0D6963F7D28E17F72"
        );
    }

    #[test]
    fn test_hashing_reader_matches_buffer_hash() {
        let data = b"From a@b Thu Jan 01 00:00:00 2024\nSubject: x\n\nbody\n".to_vec();
        let mut reader = HashingReader::new(&data[..], HashAlgorithm::Sha256);
        let mut first = [0u8; 10];
        reader.read_exact(&mut first).unwrap();
        // The rest is drained by finish().
        let (digest, len) = reader.finish().unwrap();
        assert_eq!(len, data.len() as u64);
        assert_eq!(digest, hash_bytes(HashAlgorithm::Sha256, &data));
    }

    #[test]
    fn test_hash_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"abc").unwrap();
        let d = hash_file(HashAlgorithm::Sha256, &path).unwrap();
        assert_eq!(d, hash_bytes(HashAlgorithm::Sha256, b"abc"));
        assert!(hash_file(HashAlgorithm::Sha256, &dir.path().join("nope")).is_err());
    }
}
