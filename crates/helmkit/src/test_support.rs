//! Fixtures shared by the unit tests

use helmkit_kube::{MemorySource, MemoryStorage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::config::HelmConfig;
use crate::engine::{HelmCli, MockEngine};
use crate::settings::HelmSettings;

pub const MANIFEST: &str = r#"---
apiVersion: v1
kind: Service
metadata:
  name: web
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
"#;

pub fn write(dir: &Path, path: &str, content: &str) {
    let full = dir.join(path);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(full, content).unwrap();
}

/// A chart directory named `web` with default values
pub fn chart_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "Chart.yaml",
        "apiVersion: v2\nname: web\nversion: 1.0.0\nappVersion: \"2.0\"\n",
    );
    write(
        tmp.path(),
        "values.yaml",
        "replicas: 1\nimage:\n  repository: nginx\n  tag: stable\n",
    );
    tmp
}

/// A chart directory declaring a `redis` dependency that is not vendored
pub fn chart_with_dependency() -> TempDir {
    let tmp = chart_dir();
    write(
        tmp.path(),
        "Chart.yaml",
        "apiVersion: v2\nname: web\nversion: 1.0.0\ndependencies:\n  - name: redis\n    version: 17.0.0\n    repository: https://charts.example.com\n",
    );
    tmp
}

/// Gzipped archive of a `redis` chart, as `helm dependency update` downloads it
pub fn redis_archive() -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tar::{Builder, Header};

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);
    for (path, content) in [
        ("redis/Chart.yaml", "name: redis\nversion: 17.0.0\n"),
        ("redis/values.yaml", "port: 6379\n"),
    ] {
        let mut header = Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn settings(namespace: &str) -> HelmSettings {
    HelmSettings::from_lookup(|_| None).with_namespace(namespace)
}

/// Config backed by in-memory storage, objects and engine
pub fn memory_config_with(namespace: &str, source: MemorySource, engine: MockEngine) -> HelmConfig {
    HelmConfig::new(
        namespace,
        settings(namespace),
        Arc::new(engine.storage().clone()),
        Arc::new(source),
        Arc::new(engine),
    )
}

pub fn memory_config(namespace: &str) -> HelmConfig {
    memory_config_with(
        namespace,
        MemorySource::new(),
        MockEngine::new(MemoryStorage::new()),
    )
}

/// Executable `helm` stand-in running `body`
#[cfg(unix)]
pub fn fake_helm(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("helm");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// `helm` body: `pull` unpacks a chart named after the reference into
/// `--untardir`, anything else prints a deployed release `web`
#[cfg(unix)]
pub const FAKE_PULL: &str = r#"
if [ "$1" = "pull" ]; then
  ref="$2"
  while [ $# -gt 0 ]; do
    if [ "$1" = "--untardir" ]; then dest="$2"; fi
    shift
  done
  name="${ref##*/}"
  mkdir -p "$dest/$name"
  printf 'apiVersion: v2\nname: %s\nversion: 1.0.0\n' "$name" > "$dest/$name/Chart.yaml"
  exit 0
fi
echo '{"name":"web","namespace":"apps","version":1,"info":{"status":"deployed"},"manifest":""}'
"#;

/// Config whose engine is a fake `helm` running [`FAKE_PULL`], with the
/// repository cache at `<dir>/cache`
#[cfg(unix)]
pub fn fake_cli_config(dir: &Path) -> HelmConfig {
    let settings = settings("apps")
        .with_binary(fake_helm(dir, FAKE_PULL))
        .with_repository_cache(dir.join("cache"));
    let engine = HelmCli::new(&settings);
    HelmConfig::new(
        "apps",
        settings,
        Arc::new(MemoryStorage::new()),
        Arc::new(MemorySource::new()),
        Arc::new(engine),
    )
}

/// Entries left in a repository cache directory
pub fn cache_entries(cache: &Path) -> usize {
    std::fs::read_dir(cache).map(|d| d.count()).unwrap_or(0)
}
