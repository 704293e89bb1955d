//! helmkit CLI - Helm releases, charts and repositories

use clap::{Args, Parser, Subcommand};
use helmkit::HelmSettings;
use std::path::PathBuf;

mod commands;
mod error;
mod exit_codes;
mod logging;

use error::Result;

#[derive(Parser)]
#[command(name = "helmkit")]
#[command(version)]
#[command(about = "Manage Helm releases and chart repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Flags shared by every command
#[derive(Args, Debug)]
struct GlobalArgs {
    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Namespace scope for this request
    #[arg(short, long, global = true, env = "HELM_NAMESPACE")]
    namespace: Option<String>,

    /// Kubeconfig context to use
    #[arg(long, global = true, env = "HELM_KUBECONTEXT")]
    kube_context: Option<String>,

    /// Path to the repositories file
    #[arg(long, global = true, env = "HELM_REPOSITORY_CONFIG")]
    repository_config: Option<PathBuf>,

    /// Path to the repository index cache
    #[arg(long, global = true, env = "HELM_REPOSITORY_CACHE")]
    repository_cache: Option<PathBuf>,
}

impl GlobalArgs {
    fn settings(&self) -> HelmSettings {
        let mut settings = HelmSettings::from_env();
        if let Some(namespace) = &self.namespace {
            settings = settings.with_namespace(namespace);
        }
        if let Some(context) = &self.kube_context {
            settings.kube_context = Some(context.clone());
        }
        if let Some(path) = &self.repository_config {
            settings = settings.with_repository_config(path);
        }
        if let Some(path) = &self.repository_cache {
            settings = settings.with_repository_cache(path);
        }
        settings
    }
}

/// Where a chart comes from
#[derive(Args, Debug, Default)]
pub struct ChartArgs {
    /// Chart repository URL
    #[arg(long)]
    pub repo: Option<String>,

    /// Chart version constraint
    #[arg(long)]
    pub version: Option<String>,

    /// Chart repository username
    #[arg(long)]
    pub username: Option<String>,

    /// Chart repository password
    #[arg(long)]
    pub password: Option<String>,

    /// CA bundle to verify the repository server
    #[arg(long)]
    pub ca_file: Option<PathBuf>,

    /// Client certificate for the repository server
    #[arg(long)]
    pub cert_file: Option<PathBuf>,

    /// Client key for the repository server
    #[arg(long)]
    pub key_file: Option<PathBuf>,
}

/// Values given on the command line
#[derive(Args, Debug, Default)]
pub struct ValuesArgs {
    /// Values file(s) to merge, later files win
    #[arg(short = 'f', long = "values")]
    pub values: Vec<PathBuf>,

    /// Set values on command line (path=value)
    #[arg(long = "set")]
    pub set: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a chart
    Install {
        /// Release name
        name: String,

        /// Chart path or reference
        chart: String,

        #[command(flatten)]
        chart_args: ChartArgs,

        #[command(flatten)]
        values: ValuesArgs,

        /// Do not install CRDs
        #[arg(long)]
        skip_crds: bool,

        /// Include CRDs in the rendered manifest
        #[arg(long)]
        include_crds: bool,

        /// Do not run hooks
        #[arg(long)]
        no_hooks: bool,

        /// Skip validating the manifest against the OpenAPI schema
        #[arg(long)]
        disable_openapi_validation: bool,

        /// Simulate the install
        #[arg(long)]
        dry_run: bool,

        /// Reuse the name of an uninstalled release
        #[arg(long)]
        replace: bool,

        /// Roll back on failure
        #[arg(long)]
        atomic: bool,

        /// Wait for resources to be ready
        #[arg(long)]
        wait: bool,

        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Fetch missing chart dependencies before installing
        #[arg(long)]
        dependency_update: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upgrade a release
    Upgrade {
        /// Release name
        name: String,

        /// Chart path or reference
        chart: String,

        #[command(flatten)]
        chart_args: ChartArgs,

        #[command(flatten)]
        values: ValuesArgs,

        /// Install the release if it does not exist
        #[arg(short, long)]
        install: bool,

        /// Do not run hooks
        #[arg(long)]
        no_hooks: bool,

        /// Simulate the upgrade
        #[arg(long)]
        dry_run: bool,

        /// Roll back on failure
        #[arg(long)]
        atomic: bool,

        /// Wait for resources to be ready
        #[arg(long)]
        wait: bool,

        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Roll a release back
    Rollback {
        /// Release name
        name: String,

        /// Revision to roll back to (default: previous)
        revision: Option<u32>,

        /// Wait for resources to be ready
        #[arg(long)]
        wait: bool,

        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Uninstall a release
    Uninstall {
        /// Release name
        name: String,

        /// Keep the release history
        #[arg(long)]
        keep_history: bool,

        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Show the status of a release
    Status {
        /// Release name
        name: String,

        /// Show the values of the release
        #[arg(long)]
        show_values: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List releases
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the cluster objects that belong to a release
    Resources {
        /// Release name
        name: String,

        /// Resource type, e.g. pods, services, deployments.apps
        #[arg(default_value = "pods")]
        resource: String,
    },

    /// Manage chart repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },
}

#[derive(Subcommand)]
enum RepoCommands {
    /// Add a chart repository
    Add {
        /// Repository name
        name: String,

        /// Repository URL
        url: String,

        /// Repository username
        #[arg(long)]
        username: Option<String>,

        /// Repository password
        #[arg(long)]
        password: Option<String>,

        /// CA bundle to verify the server
        #[arg(long)]
        ca_file: Option<String>,

        /// Client certificate
        #[arg(long)]
        cert_file: Option<String>,

        /// Client key
        #[arg(long)]
        key_file: Option<String>,

        /// Skip server certificate verification
        #[arg(long)]
        insecure_skip_tls_verify: bool,
    },

    /// Remove a chart repository
    #[command(alias = "rm")]
    Remove {
        /// Repository name
        name: String,
    },

    /// List chart repositories
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::init_logging(cli.global.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = cli.global.settings();

    match cli.command {
        Commands::Install {
            name,
            chart,
            chart_args,
            values,
            skip_crds,
            include_crds,
            no_hooks,
            disable_openapi_validation,
            dry_run,
            replace,
            atomic,
            wait,
            timeout,
            dependency_update,
            json,
        } => {
            let flags = commands::install::InstallFlags {
                skip_crds,
                include_crds,
                no_hooks,
                disable_openapi_validation,
                dry_run,
                replace,
                atomic,
                wait,
                timeout,
                dependency_update,
            };
            commands::install::run(settings, &name, &chart, &chart_args, &values, &flags, json)
                .await
        }

        Commands::Upgrade {
            name,
            chart,
            chart_args,
            values,
            install,
            no_hooks,
            dry_run,
            atomic,
            wait,
            timeout,
            json,
        } => {
            let flags = commands::upgrade::UpgradeFlags {
                install,
                no_hooks,
                dry_run,
                atomic,
                wait,
                timeout,
            };
            commands::upgrade::run(settings, &name, &chart, &chart_args, &values, &flags, json)
                .await
        }

        Commands::Rollback {
            name,
            revision,
            wait,
            timeout,
        } => commands::rollback::run(settings, &name, revision, wait, timeout).await,

        Commands::Uninstall {
            name,
            keep_history,
            timeout,
        } => commands::uninstall::run(settings, &name, keep_history, timeout).await,

        Commands::Status {
            name,
            show_values,
            json,
        } => commands::status::run(settings, &name, show_values, json).await,

        Commands::List { json } => commands::list::run(settings, json).await,

        Commands::Resources { name, resource } => {
            commands::resources::run(settings, &name, &resource).await
        }

        Commands::Repo { command } => match command {
            RepoCommands::Add {
                name,
                url,
                username,
                password,
                ca_file,
                cert_file,
                key_file,
                insecure_skip_tls_verify,
            } => {
                let options = commands::repo::AddOptions {
                    username,
                    password,
                    ca_file,
                    cert_file,
                    key_file,
                    insecure_skip_tls_verify,
                };
                commands::repo::add(&settings, &name, &url, options).await
            }
            RepoCommands::Remove { name } => commands::repo::remove(&settings, &name).await,
            RepoCommands::List { json } => commands::repo::list(&settings, json),
        },
    }
}
