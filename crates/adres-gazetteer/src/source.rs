use std::fs::File;
use std::io::Read;
use std::path::Path;

use adres_types::GazetteerRow;
use memmap2::Mmap;

use crate::{GazetteerError, LoadMode};

/// Raw source bytes, mapped or owned.
pub(crate) enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

pub(crate) fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer, GazetteerError> {
    let io_err = |source| GazetteerError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    match mode {
        // Mapping a zero-length file fails on some platforms.
        LoadMode::Mmap if len > 0 => unsafe { Mmap::map(&file) }
            .map(Buffer::Mmap)
            .map_err(io_err),
        _ => {
            let mut buf = Vec::with_capacity(len as usize);
            file.read_to_end(&mut buf).map_err(io_err)?;
            Ok(Buffer::Owned(buf))
        }
    }
}

/// `.tsv` files are tab separated, everything else comma separated.
pub fn infer_delimiter(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Parse gazetteer rows from a delimited table whose first row is a header.
///
/// Only the province, district and neighbourhood columns are read. Rows that
/// are too short or have a blank value in any of them are skipped; invalid
/// UTF-8 is replaced rather than rejected.
pub fn read_rows(bytes: &[u8], delimiter: u8) -> Result<Vec<GazetteerRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let fields: Vec<_> = record.iter().map(String::from_utf8_lossy).collect();
        if let Some(row) = GazetteerRow::from_fields(&fields) {
            rows.push(row);
        }
    }
    Ok(rows)
}
