//! Reading chart archives
//!
//! Charts are packaged as `.tgz` files whose entries all live under a single
//! top-level directory named after the chart.

use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tar::Archive;

use crate::error::{CoreError, Result};

/// Chart files keyed by their path relative to the chart root (`/` separated)
pub type ChartFiles = BTreeMap<String, Vec<u8>>;

/// Read every file of a chart archive on disk
pub fn read_archive_file(path: &Path) -> Result<ChartFiles> {
    let data = std::fs::read(path)?;
    read_archive(&data).map_err(|e| match e {
        CoreError::InvalidChart { message } => CoreError::InvalidChart {
            message: format!("{}: {}", path.display(), message),
        },
        other => other,
    })
}

/// Read every file of an in-memory chart archive
///
/// The top-level directory is stripped from entry paths.
pub fn read_archive(data: &[u8]) -> Result<ChartFiles> {
    let mut archive = Archive::new(GzDecoder::new(data));
    let mut files = ChartFiles::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path()?.to_string_lossy().replace('\\', "/");
        let relative = match path.split_once('/') {
            Some((_, rest)) if !rest.is_empty() => rest.to_string(),
            _ => {
                return Err(CoreError::InvalidChart {
                    message: format!("archive entry '{}' is outside the chart directory", path),
                });
            }
        };

        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        files.insert(relative, content);
    }

    if files.is_empty() {
        return Err(CoreError::InvalidChart {
            message: "archive contains no files".to_string(),
        });
    }

    Ok(files)
}

#[cfg(test)]
pub(crate) mod test_support {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tar::{Builder, Header};

    /// Build a gzipped chart archive from `(path, content)` pairs
    pub fn build_archive(root: &str, files: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = Builder::new(encoder);

        for (path, content) in files {
            let mut header = Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, format!("{}/{}", root, path), content.as_bytes())
                .unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap()
    }
}
