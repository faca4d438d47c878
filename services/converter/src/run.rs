//! Conversion runs against local files or object storage.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use mesh_raster::{convert_domain, convert_domains, select_domains, ConversionConfig, ConversionOutput};
use storage::{ObjectStorage, StoragePath};

use crate::config::ConverterConfig;
use crate::discover::find_remote_domains;

/// One domain converted from object storage.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteOutput {
    /// Object the domain was read from
    pub source: String,
    /// Object the raster was uploaded to
    pub object: String,
    pub conversion: ConversionOutput,
}

/// Convert local domain files into `output_dir`.
pub async fn run_local(
    files: Vec<PathBuf>,
    output_dir: PathBuf,
    config: ConversionConfig,
) -> Result<Vec<ConversionOutput>> {
    if files.is_empty() {
        anyhow::bail!("No domain files matching '*{}' found", config.domain_suffix);
    }

    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let outputs =
        tokio::task::spawn_blocking(move || convert_domains(&files, &output_dir, &config)).await??;
    Ok(outputs)
}

/// Convert the domain objects under the configured input prefix and upload
/// the rasters under the output prefix.
///
/// Each domain is staged in a scratch directory that is removed afterwards.
/// Up to `parallel_domains` domains are in flight at once; outputs keep the
/// order of the selected objects.
pub async fn run_remote(storage: &ObjectStorage, config: &ConverterConfig) -> Result<Vec<RemoteOutput>> {
    let conversion = &config.conversion;
    let objects = find_remote_domains(storage, &config.input_prefix, &conversion.domain_suffix).await?;
    if objects.is_empty() {
        anyhow::bail!(
            "No domain objects matching '*{}' under {}/{}",
            conversion.domain_suffix,
            storage.bucket(),
            config.input_prefix
        );
    }

    let scratch = match &config.scratch_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir).await?;
            tempfile::Builder::new().prefix("converter-").tempdir_in(dir)?
        }
        None => tempfile::Builder::new().prefix("converter-").tempdir()?,
    };

    let candidates: Vec<PathBuf> = objects.iter().map(PathBuf::from).collect();
    let selected = select_domains(&candidates, conversion.domain_policy);
    info!(
        found = objects.len(),
        selected = selected.len(),
        policy = ?conversion.domain_policy,
        scratch = %scratch.path().display(),
        "Converting domain objects"
    );

    let jobs = selected.iter().enumerate().map(|(i, object)| {
        let object = object.to_string_lossy().into_owned();
        let workdir = scratch.path().join(i.to_string());
        convert_object(storage, object, workdir, config)
    });
    let outputs: Vec<RemoteOutput> = stream::iter(jobs)
        .buffered(config.parallel_domains.max(1))
        .try_collect()
        .await?;

    if let Err(e) = scratch.close() {
        warn!(error = %e, "Failed to remove scratch directory");
    }
    Ok(outputs)
}

async fn convert_object(
    storage: &ObjectStorage,
    object: String,
    workdir: PathBuf,
    config: &ConverterConfig,
) -> Result<RemoteOutput> {
    let local = workdir.join(StoragePath::file_name(&object));
    storage
        .download_to(&object, &local)
        .await
        .with_context(|| format!("Failed to download {}", object))?;

    let conversion = config.conversion.clone();
    let input = local.clone();
    let output_dir = workdir.clone();
    let output =
        tokio::task::spawn_blocking(move || convert_domain(&input, &output_dir, &conversion))
            .await?
            .with_context(|| format!("Failed to convert {}", object))?;

    let name = file_name(&output.path)?;
    let target = StoragePath::join(&config.output_prefix, &name);
    let size = storage.upload_from(&output.path, &target).await?;
    if !storage.exists(&target).await? {
        anyhow::bail!("Uploaded raster {} is not visible in {}", target, storage.bucket());
    }
    info!(source = %object, object = %target, size, "Uploaded raster");

    tokio::fs::remove_dir_all(&workdir).await?;

    Ok(RemoteOutput {
        source: object,
        object: target,
        conversion: output,
    })
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .with_context(|| format!("{} has no file name", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mesh_raster::{decode_geotiff, DomainPolicy, LayerType};
    use mesh_common::BoundingBox;
    use test_utils::{dateline_mesh_east_positive, write_ugrid_domain};

    fn small_config() -> ConverterConfig {
        let mut config = ConverterConfig::default();
        config.conversion.width = 10;
        config.conversion.height = 10;
        config.conversion.bounds = BoundingBox::new(165.0, -15.0, 195.0, 15.0);
        config.input_prefix = "raw".to_string();
        config.output_prefix = "rasters".to_string();
        config
    }

    async fn upload_domain(storage: &ObjectStorage, object: &str, value: f64) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domain.nc");
        write_ugrid_domain(
            &path,
            &dateline_mesh_east_positive(),
            &LayerType::Waterlevel.variables(),
            value,
        )
        .unwrap();
        let data = std::fs::read(&path).unwrap();
        storage.put(object, Bytes::from(data)).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_remote_first_only() {
        let storage = ObjectStorage::in_memory();
        upload_domain(&storage, "raw/gtsm_d0_waterlevel_00_fc.nc", 0.75).await;
        upload_domain(&storage, "raw/gtsm_d1_waterlevel_00_fc.nc", 1.5).await;

        let scratch = tempfile::tempdir().unwrap();
        let mut config = small_config();
        config.scratch_dir = Some(scratch.path().to_path_buf());

        let outputs = run_remote(&storage, &config).await.unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].source, "raw/gtsm_d0_waterlevel_00_fc.nc");
        assert_eq!(
            outputs[0].object,
            "rasters/waterlevel_20190101_060000_interpolated.tif"
        );

        let data = storage.get(&outputs[0].object).await.unwrap();
        let raster = decode_geotiff(&data).unwrap();
        assert_eq!(raster.width(), 10);
        let band = raster.band("water_level").unwrap();
        assert!(band.data().iter().any(|&v| v == 0.75));

        // staged inputs and outputs are gone
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_run_remote_each_domain() {
        let storage = ObjectStorage::in_memory();
        upload_domain(&storage, "raw/gtsm_d0_waterlevel_00_fc.nc", 0.75).await;
        upload_domain(&storage, "raw/gtsm_d1_waterlevel_00_fc.nc", 1.5).await;

        let mut config = small_config();
        config.conversion.domain_policy = DomainPolicy::Each;

        let outputs = run_remote(&storage, &config).await.unwrap();
        let objects: Vec<&str> = outputs.iter().map(|o| o.object.as_str()).collect();
        assert_eq!(
            objects,
            vec![
                "rasters/waterlevel_20190101_060000_gtsm_d0_waterlevel_00_fc_interpolated.tif",
                "rasters/waterlevel_20190101_060000_gtsm_d1_waterlevel_00_fc_interpolated.tif",
            ]
        );
        assert_eq!(storage.list("rasters").await.unwrap().len(), 2);
        for object in objects {
            assert!(storage.exists(object).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_run_remote_nothing_found() {
        let storage = ObjectStorage::in_memory();
        assert!(run_remote(&storage, &small_config()).await.is_err());
    }

    #[tokio::test]
    async fn test_run_local_requires_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_local(Vec::new(), dir.path().to_path_buf(), ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("waterlevel_00_fc.nc"));
    }
}
