//! Locating domain files on disk and in object storage.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use mesh_raster::is_domain_file;
use storage::ObjectStorage;

/// Domain files under `root`, sorted by path.
///
/// A plain file is taken as-is, whatever its name.
pub fn find_local_domains(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if entry.file_type().is_file() && is_domain_file(entry.path(), suffix) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    debug!(root = %root.display(), found = files.len(), "Scanned for domain files");
    Ok(files)
}

/// Object paths under `prefix` whose name ends with `suffix`, sorted.
pub async fn find_remote_domains(
    storage: &ObjectStorage,
    prefix: &str,
    suffix: &str,
) -> Result<Vec<String>> {
    let objects = storage
        .list(prefix)
        .await
        .with_context(|| format!("Failed to list {}/{}", storage.bucket(), prefix))?;

    let files: Vec<String> = objects
        .into_iter()
        .filter(|path| is_domain_file(Path::new(path), suffix))
        .collect();

    debug!(prefix, found = files.len(), "Listed domain objects");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    const SUFFIX: &str = "waterlevel_00_fc.nc";

    #[test]
    fn test_find_local_domains_recurses_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("2019").join("01");
        std::fs::create_dir_all(&nested).unwrap();

        std::fs::write(nested.join("gtsm_d1_waterlevel_00_fc.nc"), b"").unwrap();
        std::fs::write(dir.path().join("gtsm_d0_waterlevel_00_fc.nc"), b"").unwrap();
        std::fs::write(dir.path().join("gtsm_d0_currents_00_fc.nc"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let files = find_local_domains(dir.path(), SUFFIX).unwrap();
        assert_eq!(
            files,
            vec![
                nested.join("gtsm_d1_waterlevel_00_fc.nc"),
                dir.path().join("gtsm_d0_waterlevel_00_fc.nc"),
            ]
        );
    }

    #[test]
    fn test_find_local_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("currents.nc");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(find_local_domains(&path, SUFFIX).unwrap(), vec![path]);
    }

    #[test]
    fn test_find_local_missing_root() {
        assert!(find_local_domains(Path::new("/nonexistent/glossis"), SUFFIX).is_err());
    }

    #[tokio::test]
    async fn test_find_remote_domains() {
        let storage = ObjectStorage::in_memory();
        for path in [
            "raw/b_waterlevel_00_fc.nc",
            "raw/a_waterlevel_00_fc.nc",
            "raw/a_currents_00_fc.nc",
            "other/c_waterlevel_00_fc.nc",
        ] {
            storage.put(path, Bytes::from_static(b"nc")).await.unwrap();
        }

        let files = find_remote_domains(&storage, "raw", SUFFIX).await.unwrap();
        assert_eq!(files, vec!["raw/a_waterlevel_00_fc.nc", "raw/b_waterlevel_00_fc.nc"]);
    }
}
