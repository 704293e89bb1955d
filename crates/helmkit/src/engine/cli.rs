//! Engine driving the `helm` binary

use async_trait::async_trait;
use helmkit_core::{HelmRelease, ValueMap, Values};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::{
    ChartSource, HelmEngine, InstallOptions, PulledChart, RollbackOptions, UninstallOptions,
    UpgradeOptions,
};
use crate::error::{HelmError, Result};
use crate::settings::HelmSettings;

/// Runs release operations through the `helm` command line
#[derive(Debug, Clone)]
pub struct HelmCli {
    binary: PathBuf,
    repository_config: PathBuf,
    repository_cache: PathBuf,
    kube_context: Option<String>,
}

impl HelmCli {
    pub fn new(settings: &HelmSettings) -> Self {
        Self {
            binary: settings.helm_binary.clone(),
            repository_config: settings.repository_config.clone(),
            repository_cache: settings.repository_cache.clone(),
            kube_context: settings.kube_context.clone(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Flags passed to every invocation
    fn global_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--repository-config".into(),
            self.repository_config.clone().into(),
            "--repository-cache".into(),
            self.repository_cache.clone().into(),
        ];
        if let Some(context) = &self.kube_context {
            args.push("--kube-context".into());
            args.push(context.into());
        }
        args
    }

    async fn run(&self, command: &str, args: Vec<OsString>) -> Result<Vec<u8>> {
        debug!(binary = %self.binary.display(), ?args, "running helm {}", command);

        let output = Command::new(&self.binary)
            .args(&args)
            .args(self.global_args())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| HelmError::EngineUnavailable {
                binary: self.binary.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .trim()
                .strip_prefix("Error: ")
                .unwrap_or(stderr.trim())
                .to_string();
            return Err(HelmError::Engine {
                command: command.to_string(),
                message: if message.is_empty() {
                    format!("exited with {}", output.status)
                } else {
                    message
                },
            });
        }

        Ok(output.stdout)
    }
}

/// Write values to a temporary YAML file handed to `--values`
fn values_file(values: &ValueMap) -> Result<tempfile::NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("helmkit-values-")
        .suffix(".yaml")
        .tempfile()?;
    let yaml = Values::from_map(values.clone()).to_yaml()?;
    std::fs::write(file.path(), yaml)?;
    Ok(file)
}

fn parse_release(command: &str, stdout: &[u8]) -> Result<HelmRelease> {
    serde_json::from_slice(stdout).map_err(|e| HelmError::Engine {
        command: command.to_string(),
        message: format!("unexpected output: {}", e),
    })
}

fn push_flag(args: &mut Vec<OsString>, enabled: bool, flag: &str) {
    if enabled {
        args.push(flag.into());
    }
}

fn push_timeout(args: &mut Vec<OsString>, timeout: Option<Duration>) {
    if let Some(timeout) = timeout {
        args.push("--timeout".into());
        args.push(helm_duration(timeout).into());
    }
}

/// Go duration string for `--timeout`; sub-second parts round up to the millisecond
fn helm_duration(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_nanos().div_ceil(1_000_000))
    }
}

fn push_option<S: Into<OsString> + Clone>(args: &mut Vec<OsString>, flag: &str, value: &Option<S>) {
    if let Some(value) = value {
        args.push(flag.into());
        args.push(value.clone().into());
    }
}

pub(crate) fn install_args(
    name: &str,
    chart: &Path,
    values: &Path,
    options: &InstallOptions,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "install".into(),
        name.into(),
        chart.into(),
        "--namespace".into(),
        options.namespace.clone().into(),
        "--values".into(),
        values.into(),
        "--output".into(),
        "json".into(),
    ];
    push_flag(&mut args, options.skip_crds, "--skip-crds");
    push_flag(&mut args, options.disable_hooks, "--no-hooks");
    push_flag(
        &mut args,
        options.disable_openapi_validation,
        "--disable-openapi-validation",
    );
    push_flag(&mut args, options.dry_run, "--dry-run");
    push_flag(&mut args, options.replace, "--replace");
    push_flag(&mut args, options.atomic, "--atomic");
    push_flag(&mut args, options.wait, "--wait");
    push_timeout(&mut args, options.timeout);
    args
}

pub(crate) fn upgrade_args(
    name: &str,
    chart: &Path,
    values: &Path,
    options: &UpgradeOptions,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "upgrade".into(),
        name.into(),
        chart.into(),
        "--namespace".into(),
        options.namespace.clone().into(),
        "--values".into(),
        values.into(),
        "--output".into(),
        "json".into(),
    ];
    push_flag(&mut args, options.disable_hooks, "--no-hooks");
    push_flag(&mut args, options.dry_run, "--dry-run");
    push_flag(&mut args, options.atomic, "--atomic");
    push_flag(&mut args, options.wait, "--wait");
    push_timeout(&mut args, options.timeout);
    args
}

pub(crate) fn pull_args(chart: &str, source: &ChartSource, dest: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["pull".into(), chart.into()];
    push_option(&mut args, "--repo", &source.repo);
    push_option(&mut args, "--version", &source.version);
    push_option(&mut args, "--username", &source.username);
    push_option(&mut args, "--password", &source.password);
    push_option(&mut args, "--ca-file", &source.ca_file);
    push_option(&mut args, "--cert-file", &source.cert_file);
    push_option(&mut args, "--key-file", &source.key_file);
    args.push("--untar".into());
    args.push("--untardir".into());
    args.push(dest.into());
    args
}

/// Directory `helm pull --untar` unpacks a chart reference into
fn pulled_chart_dir(dest: &Path, chart: &str) -> PathBuf {
    let name = chart.rsplit('/').next().unwrap_or(chart);
    dest.join(name)
}

#[async_trait]
impl HelmEngine for HelmCli {
    async fn pull(&self, chart: &str, source: &ChartSource) -> Result<PulledChart> {
        std::fs::create_dir_all(&self.repository_cache)?;
        let scratch = tempfile::Builder::new()
            .prefix("helmkit-chart-")
            .tempdir_in(&self.repository_cache)?;

        self.run("pull", pull_args(chart, source, scratch.path()))
            .await?;

        let dir = pulled_chart_dir(scratch.path(), chart);
        if !dir.is_dir() {
            return Err(HelmError::ChartNotFound {
                name: chart.to_string(),
            });
        }
        Ok(PulledChart::in_scratch(scratch, dir))
    }

    async fn install(
        &self,
        name: &str,
        chart: &Path,
        values: &ValueMap,
        options: &InstallOptions,
    ) -> Result<HelmRelease> {
        let file = values_file(values)?;
        let stdout = self
            .run("install", install_args(name, chart, file.path(), options))
            .await?;
        parse_release("install", &stdout)
    }

    async fn upgrade(
        &self,
        name: &str,
        chart: &Path,
        values: &ValueMap,
        options: &UpgradeOptions,
    ) -> Result<HelmRelease> {
        let file = values_file(values)?;
        let stdout = self
            .run("upgrade", upgrade_args(name, chart, file.path(), options))
            .await?;
        parse_release("upgrade", &stdout)
    }

    async fn rollback(&self, name: &str, options: &RollbackOptions) -> Result<()> {
        let mut args: Vec<OsString> = vec!["rollback".into(), name.into()];
        if let Some(revision) = options.revision {
            args.push(revision.to_string().into());
        }
        args.push("--namespace".into());
        args.push(options.namespace.clone().into());
        push_flag(&mut args, options.wait, "--wait");
        push_timeout(&mut args, options.timeout);
        self.run("rollback", args).await.map(|_| ())
    }

    async fn uninstall(&self, name: &str, options: &UninstallOptions) -> Result<()> {
        let mut args: Vec<OsString> = vec![
            "uninstall".into(),
            name.into(),
            "--namespace".into(),
            options.namespace.clone().into(),
        ];
        push_flag(&mut args, options.keep_history, "--keep-history");
        push_timeout(&mut args, options.timeout);
        self.run("uninstall", args).await.map(|_| ())
    }

    async fn dependency_update(&self, chart: &Path) -> Result<()> {
        let args: Vec<OsString> = vec!["dependency".into(), "update".into(), chart.into()];
        self.run("dependency update", args).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::test_support::{FAKE_PULL, cache_entries, fake_helm};
    use serde_json::json;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn settings(binary: &Path, cache: &Path) -> HelmSettings {
        HelmSettings::from_lookup(|_| None)
            .with_namespace("apps")
            .with_binary(binary)
            .with_repository_cache(cache)
    }

    #[test]
    fn test_install_args() {
        let options = InstallOptions {
            namespace: "apps".to_string(),
            skip_crds: true,
            include_crds: true,
            dry_run: true,
            wait: true,
            timeout: Some(Duration::from_secs(90)),
            ..Default::default()
        };
        let args = install_args("web", Path::new("/charts/web"), Path::new("/tmp/v.yaml"), &options);
        assert_eq!(
            strings(&args),
            vec![
                "install", "web", "/charts/web", "--namespace", "apps", "--values",
                "/tmp/v.yaml", "--output", "json", "--skip-crds", "--dry-run", "--wait",
                "--timeout", "90s",
            ]
        );
    }

    #[test]
    fn test_upgrade_args() {
        let options = UpgradeOptions {
            namespace: "apps".to_string(),
            atomic: true,
            disable_hooks: true,
            ..Default::default()
        };
        let args = upgrade_args("web", Path::new("web"), Path::new("v.yaml"), &options);
        let args = strings(&args);
        assert_eq!(&args[..3], &["upgrade", "web", "web"]);
        assert!(args.contains(&"--no-hooks".to_string()));
        assert!(args.contains(&"--atomic".to_string()));
        assert!(!args.contains(&"--wait".to_string()));
    }

    #[test]
    fn test_pull_args() {
        let source = ChartSource {
            repo: Some("https://charts.example.com".to_string()),
            version: Some("1.2.3".to_string()),
            username: Some("user".to_string()),
            ca_file: Some(PathBuf::from("/etc/ca.pem")),
            ..Default::default()
        };
        let args = strings(&pull_args("nginx", &source, Path::new("/cache/x")));
        assert_eq!(
            args,
            vec![
                "pull", "nginx", "--repo", "https://charts.example.com", "--version", "1.2.3",
                "--username", "user", "--ca-file", "/etc/ca.pem", "--untar", "--untardir",
                "/cache/x",
            ]
        );
        assert_eq!(
            pulled_chart_dir(Path::new("/cache/x"), "bitnami/nginx"),
            PathBuf::from("/cache/x/nginx")
        );
    }

    #[test]
    fn test_timeout_keeps_fractions() {
        assert_eq!(helm_duration(Duration::from_secs(90)), "90s");
        assert_eq!(helm_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(helm_duration(Duration::from_millis(1500)), "1500ms");
        assert_eq!(helm_duration(Duration::from_micros(1)), "1ms");
        assert_eq!(helm_duration(Duration::ZERO), "0s");

        let mut args = Vec::new();
        push_timeout(&mut args, Some(Duration::from_millis(250)));
        assert_eq!(strings(&args), vec!["--timeout", "250ms"]);
    }

    #[test]
    fn test_global_args() {
        let mut settings = settings(Path::new("helm"), Path::new("/cache"));
        settings.kube_context = Some("staging".to_string());
        let args = strings(&HelmCli::new(&settings).global_args());
        assert_eq!(args[2..4], ["--repository-cache".to_string(), "/cache".to_string()]);
        assert_eq!(args[4..], ["--kube-context".to_string(), "staging".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cli = HelmCli::new(&settings(&tmp.path().join("no-such-helm"), tmp.path()));
        let err = cli.dependency_update(tmp.path()).await.unwrap_err();
        assert!(matches!(err, HelmError::EngineUnavailable { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_parses_json_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let binary = fake_helm(
            tmp.path(),
            r#"echo '{"name":"web","namespace":"apps","version":1,"info":{"status":"deployed"},"manifest":""}'"#,
        );
        let cli = HelmCli::new(&settings(&binary, tmp.path()));

        let mut values = ValueMap::new();
        values.insert("replicas".to_string(), json!(2));
        let release = cli
            .install(
                "web",
                Path::new("/charts/web"),
                &values,
                &InstallOptions {
                    namespace: "apps".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(release.name, "web");
        assert_eq!(release.version, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_reports_stderr() {
        let tmp = tempfile::TempDir::new().unwrap();
        let binary = fake_helm(
            tmp.path(),
            "echo 'Error: release: not found' >&2\nexit 1",
        );
        let cli = HelmCli::new(&settings(&binary, tmp.path()));

        let err = cli
            .uninstall("web", &UninstallOptions::default())
            .await
            .unwrap_err();
        match err {
            HelmError::Engine { command, message } => {
                assert_eq!(command, "uninstall");
                assert_eq!(message, "release: not found");
            }
            other => panic!("expected engine error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pulled_chart_removed_on_drop() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let binary = fake_helm(tmp.path(), FAKE_PULL);
        let cli = HelmCli::new(&settings(&binary, &cache));

        let pulled = cli
            .pull("example/web", &ChartSource::default())
            .await
            .unwrap();
        assert!(pulled.is_scratch());
        assert!(pulled.path().join("Chart.yaml").is_file());
        assert_eq!(cache_entries(&cache), 1);

        let copy = pulled.clone();
        drop(pulled);
        assert!(copy.path().is_dir());

        drop(copy);
        assert_eq!(cache_entries(&cache), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_pull_leaves_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let binary = fake_helm(
            tmp.path(),
            "echo 'Error: chart \"web\" not found' >&2\nexit 1",
        );
        let cli = HelmCli::new(&settings(&binary, &cache));

        let err = cli
            .pull("example/web", &ChartSource::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HelmError::Engine { .. }));
        assert_eq!(cache_entries(&cache), 0);
    }
}
