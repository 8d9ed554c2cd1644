//! On-disk snapshot of a built tree.
//!
//! Layout: the 8-byte magic `ADRSGZTR`, a little-endian `u32` schema version,
//! then one bincode record holding the normalization tag, the source
//! signature, the nested mapping and both derived indices. A snapshot is
//! only reused when the tag, the source size and the source SHA-256 all
//! match and the stored indices agree with the stored mapping.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use adres_normalize::RULES_VERSION;
use bincode::Options;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::tree::{DistrictIndex, DistrictUnion, GazetteerTree, ProvinceMap, derive_indices};

pub const MAGIC: &[u8; 8] = b"ADRSGZTR";
pub const SCHEMA_VERSION: u32 = 2;

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
}

/// Tag identifying how names were canonicalized when a snapshot was written.
pub fn normalization_tag() -> String {
    format!("static-parser-{RULES_VERSION}-normalized-keys-strip-standalone-mah")
}

/// Identity of the source table a snapshot was built from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SourceSignature {
    /// Recorded for diagnostics; not part of validity.
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

impl SourceSignature {
    pub fn compute(path: &Path, bytes: &[u8]) -> Self {
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Self {
            path: path.display().to_string(),
            size: bytes.len() as u64,
            sha256: format!("{:x}", Sha256::digest(bytes)),
        }
    }

    fn matches(&self, other: &SourceSignature) -> bool {
        self.size == other.size && self.sha256 == other.sha256
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a gazetteer cache file")]
    BadMagic,
    #[error("cache schema version {found}, expected {}", SCHEMA_VERSION)]
    SchemaVersion { found: u32 },
    #[error("cache decode failed: {0}")]
    Decode(#[from] bincode::Error),
    #[error("cache is stale: {0}")]
    Stale(&'static str),
    #[error("cached indices disagree with cached tree")]
    Inconsistent,
}

#[derive(Serialize)]
struct CacheRecordRef<'a> {
    tag: &'a str,
    signature: &'a SourceSignature,
    tree: &'a ProvinceMap,
    district_index: &'a DistrictIndex,
    district_union: &'a DistrictUnion,
}

#[derive(Deserialize)]
struct CacheRecord {
    tag: String,
    signature: SourceSignature,
    tree: ProvinceMap,
    district_index: DistrictIndex,
    district_union: DistrictUnion,
}

/// Default snapshot location: next to the source, `<source>.tree.cache`.
pub fn default_cache_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(".tree.cache");
    PathBuf::from(name)
}

/// Load a snapshot if it is valid for `signature`.
pub fn read(path: &Path, signature: &SourceSignature) -> Result<GazetteerTree, CacheError> {
    let bytes = fs::read(path)?;
    let header_len = MAGIC.len() + 4;
    if bytes.len() < header_len || &bytes[..MAGIC.len()] != MAGIC {
        return Err(CacheError::BadMagic);
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[MAGIC.len()..header_len]);
    let found = u32::from_le_bytes(version);
    if found != SCHEMA_VERSION {
        return Err(CacheError::SchemaVersion { found });
    }

    let payload = &bytes[header_len..];
    let record: CacheRecord = codec()
        .with_limit(payload.len() as u64)
        .deserialize(payload)?;
    if record.tag != normalization_tag() {
        return Err(CacheError::Stale("normalization tag changed"));
    }
    if !record.signature.matches(signature) {
        return Err(CacheError::Stale("source changed"));
    }
    let (district_index, district_union) = derive_indices(&record.tree);
    if district_index != record.district_index || district_union != record.district_union {
        return Err(CacheError::Inconsistent);
    }
    Ok(GazetteerTree::from_parts(
        record.tree,
        record.district_index,
        record.district_union,
    ))
}

/// Write a snapshot through a temporary file in the same directory, then
/// rename it over `path`.
pub fn write(path: &Path, signature: &SourceSignature, tree: &GazetteerTree) -> Result<(), CacheError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        writer.write_all(MAGIC)?;
        writer.write_all(&SCHEMA_VERSION.to_le_bytes())?;
        let tag = normalization_tag();
        let record = CacheRecordRef {
            tag: &tag,
            signature,
            tree: tree.to_plain(),
            district_index: tree.district_index(),
            district_union: tree.district_union(),
        };
        codec().serialize_into(&mut writer, &record)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CacheError::Io(e.error))?;
    Ok(())
}
