//! Turkish administrative gazetteer: province → district → neighbourhood.
//!
//! The tree is built from a delimited table (province in column 0, district
//! in column 1, neighbourhood in column 3, one header row). Every name is
//! stored under its canonical key from
//! [`Normalizer::normalize_static_parser`](adres_normalize::Normalizer::normalize_static_parser),
//! so all spelling variants of "Kadıköy" meet at `kadikoy`.
//!
//! Alongside the nested mapping the tree keeps two indices: one keyed by
//! `(province, district)` and one keyed by district name alone, which is
//! what lets a district-only query span every province that has it.
//!
//! Loading goes through an optional snapshot next to the source. The
//! snapshot is tied to the source by size and SHA-256 and to the key
//! canonicalization by a tag; anything that does not check out is rebuilt
//! from the source and rewritten.
//!
//! # Example
//! ```no_run
//! use adres_gazetteer::{GazetteerTree, LoadMode, LoadOptions};
//!
//! # fn main() -> Result<(), adres_gazetteer::GazetteerError> {
//! let opts = LoadOptions { mode: LoadMode::Owned, ..LoadOptions::default() };
//! let (tree, origin) = GazetteerTree::load_with("data/gazetteer.csv", &opts)?;
//! println!("{origin:?}: {} provinces", tree.province_count());
//! println!("{:?}", tree.neighbourhoods_of(Some("İstanbul"), Some("Kadıköy")));
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p adres-gazetteer --example stats -- <table>`.

pub mod cache;
pub mod source;
pub mod subset;
pub mod tree;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

pub use cache::{CacheError, SourceSignature, default_cache_path};
pub use subset::{DEFAULT_SUBSET, SubsetView};
pub use tree::{BuildReport, GazetteerStats, GazetteerTree, ProvinceMap, strip_standalone_mah};

/// Strategy for reading the source table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file (fast, zero-copy).
    #[default]
    Mmap,
    /// Read the file into an owned buffer (portable fallback).
    Owned,
}

impl LoadMode {
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "mmap" => Some(LoadMode::Mmap),
            "owned" => Some(LoadMode::Owned),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Read and write the snapshot. Off means always build from source.
    pub use_cache: bool,
    /// Snapshot location; defaults to `<source>.tree.cache`.
    pub cache_path: Option<PathBuf>,
    pub mode: LoadMode,
    /// Field separator; inferred from the file extension when unset.
    pub delimiter: Option<u8>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_path: None,
            mode: LoadMode::default(),
            delimiter: None,
        }
    }
}

/// Where a loaded tree came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadOrigin {
    Cache,
    Source(BuildReport),
}

#[derive(Debug, Error)]
pub enum GazetteerError {
    #[error("gazetteer source not found: {0}")]
    SourceMissing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed gazetteer table: {0}")]
    Csv(#[from] csv::Error),
}

impl GazetteerTree {
    /// Load with default options.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GazetteerError> {
        Self::load_with(path, &LoadOptions::default()).map(|(tree, _)| tree)
    }

    /// Load from `path`, reusing a valid snapshot when allowed.
    ///
    /// A missing source is an error even if a snapshot exists. Snapshot
    /// problems are never errors: an unreadable or stale snapshot is rebuilt
    /// and a failed snapshot write is only logged.
    pub fn load_with(
        path: impl AsRef<Path>,
        opts: &LoadOptions,
    ) -> Result<(Self, LoadOrigin), GazetteerError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(GazetteerError::SourceMissing(path.to_path_buf()));
        }
        let buffer = source::load_file(path, opts.mode)?;
        let bytes = buffer.as_slice();
        let signature = SourceSignature::compute(path, bytes);
        let cache_path = opts
            .cache_path
            .clone()
            .unwrap_or_else(|| default_cache_path(path));

        if opts.use_cache && cache_path.exists() {
            match cache::read(&cache_path, &signature) {
                Ok(tree) => {
                    info!(
                        "loaded gazetteer snapshot {} ({} provinces)",
                        cache_path.display(),
                        tree.province_count()
                    );
                    return Ok((tree, LoadOrigin::Cache));
                }
                Err(err) => debug!("ignoring snapshot {}: {err}", cache_path.display()),
            }
        }

        let delimiter = opts
            .delimiter
            .unwrap_or_else(|| source::infer_delimiter(path));
        let rows = source::read_rows(bytes, delimiter)?;
        let (tree, report) = GazetteerTree::build_with_report(rows);
        let stats = tree.stats();
        info!(
            "built gazetteer from {}: {} provinces, {} districts, {} neighbourhoods",
            path.display(),
            stats.provinces,
            stats.districts,
            stats.neighbourhoods
        );

        if opts.use_cache {
            match cache::write(&cache_path, &signature, &tree) {
                Ok(()) => debug!("wrote gazetteer snapshot {}", cache_path.display()),
                Err(err) => warn!("could not write snapshot {}: {err}", cache_path.display()),
            }
        }
        Ok((tree, LoadOrigin::Source(report)))
    }
}
