//! Integration tests for CLI commands that need no cluster

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const REPOSITORIES: &str = "\
apiVersion: v1
repositories:
- name: stable
  url: https://charts.example.com/stable
- name: bitnami
  url: https://charts.bitnami.com/bitnami
";

/// Run helmkit with the repository paths pointed into `home`
fn helmkit(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_helmkit"))
        .args(args)
        .env_remove("HELM_NAMESPACE")
        .env_remove("HELM_KUBECONTEXT")
        .env_remove("HELM_DRIVER")
        .env("HELM_REPOSITORY_CONFIG", home.join("repositories.yaml"))
        .env("HELM_REPOSITORY_CACHE", home.join("cache"))
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute helmkit")
}

fn home_with_repositories() -> TempDir {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("repositories.yaml"), REPOSITORIES).unwrap();
    home
}

mod help {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let home = TempDir::new().unwrap();
        let output = helmkit(home.path(), &["--help"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        for command in ["install", "upgrade", "rollback", "uninstall", "status", "list", "repo"] {
            assert!(stdout.contains(command), "help is missing {}", command);
        }
    }

    #[test]
    fn test_unknown_command_fails() {
        let home = TempDir::new().unwrap();
        let output = helmkit(home.path(), &["frobnicate"]);
        assert!(!output.status.success());
    }
}

mod repo_command {
    use super::*;

    #[test]
    fn test_repo_list() {
        let home = home_with_repositories();
        let output = helmkit(home.path(), &["repo", "list"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("stable"));
        assert!(stdout.contains("https://charts.bitnami.com/bitnami"));
    }

    #[test]
    fn test_repo_list_json() {
        let home = home_with_repositories();
        let output = helmkit(home.path(), &["repo", "list", "--json"]);

        assert!(output.status.success());
        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
        let repos = json.as_array().unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0]["name"], "stable");
    }

    #[test]
    fn test_repo_list_without_file() {
        let home = TempDir::new().unwrap();
        let output = helmkit(home.path(), &["repo", "list"]);

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("no repositories"));
    }

    #[test]
    fn test_repo_add_existing_name() {
        let home = home_with_repositories();
        let file = home.path().join("repositories.yaml");
        let before = std::fs::read(&file).unwrap();

        let output = helmkit(
            home.path(),
            &["repo", "add", "stable", "https://other.example.com/charts"],
        );

        assert_eq!(output.status.code(), Some(4));
        assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));
        assert_eq!(std::fs::read(&file).unwrap(), before);
    }

    #[test]
    fn test_repo_remove() {
        let home = home_with_repositories();
        let cache = home.path().join("cache");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("stable-index.yaml"), "apiVersion: v1\n").unwrap();
        std::fs::write(cache.join("stable-charts.txt"), "nginx\n").unwrap();

        let output = helmkit(home.path(), &["repo", "remove", "stable"]);

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("has been removed"));
        assert!(!cache.join("stable-index.yaml").exists());
        assert!(!cache.join("stable-charts.txt").exists());

        let content = std::fs::read_to_string(home.path().join("repositories.yaml")).unwrap();
        assert!(!content.contains("charts.example.com"));
        assert!(content.contains("bitnami"));
    }

    #[test]
    fn test_repo_remove_unknown() {
        let home = home_with_repositories();
        let output = helmkit(home.path(), &["repo", "rm", "missing"]);

        assert_eq!(output.status.code(), Some(4));
        assert!(String::from_utf8_lossy(&output.stderr).contains("missing"));
    }
}

mod install_command {
    use super::*;

    #[test]
    fn test_invalid_set_fails_before_connecting() {
        let home = TempDir::new().unwrap();
        let output = helmkit(
            home.path(),
            &["install", "web", "./chart", "--set", "image.t\"ag=1"],
        );

        assert_eq!(output.status.code(), Some(64));
        assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid input"));
    }

    #[test]
    fn test_missing_values_file() {
        let home = TempDir::new().unwrap();
        let missing = home.path().join("nope.yaml");
        let output = helmkit(
            home.path(),
            &["install", "web", "./chart", "-f", missing.to_str().unwrap()],
        );

        assert!(!output.status.success());
    }
}
