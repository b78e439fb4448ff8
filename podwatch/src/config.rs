//! Command line arguments and the watch configuration derived from them
use kube::config::KubeConfigOptions;
use podwatch_core::FilterSpec;
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// Resource type names accepted as the first argument
pub const POD_RESOURCE_NAMES: [&str; 3] = ["pod", "pods", "po"];

/// The longest server-side watch timeout the API server honors, in seconds
pub const MAX_TIMEOUT_SECS: u32 = 294;

/// Invalid command line arguments, all detected before contacting the cluster
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The resource type was not pods
    #[error("unsupported resource type {0:?}: only pods can be watched")]
    UnsupportedResource(String),

    /// The timeout is zero or above what the server accepts
    #[error("--timeout must be between 1 and 294 seconds, got {0}")]
    InvalidTimeout(u32),

    /// An event or status filter did not parse
    #[error(transparent)]
    Filter(#[from] podwatch_core::Error),
}

/// How records are written to stdout
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Fixed-width columns under a header
    #[default]
    Table,
    /// One JSON object per line
    Json,
}

/// Watch for pod events
#[derive(clap::Parser, Debug)]
#[command(name = "kubectl-watch", version, about)]
pub struct App {
    /// Type of resource to watch, only pods are supported
    #[arg(value_name = "TYPE", default_value = "pods")]
    pub resource: String,

    /// Only show events for the pod with this exact name
    pub name: Option<String>,

    /// Name of the event to watch. Options are 'ADDED', 'MODIFIED', 'DELETED' or 'BOOKMARK'
    #[arg(long)]
    pub event: Option<String>,

    /// Status of the pods to watch. Options are 'Pending', 'Running', 'Succeeded', 'Failed' or 'Unknown'
    #[arg(long)]
    pub status: Option<String>,

    /// Namespace to watch, defaults to the namespace of the current context
    #[arg(long, short)]
    pub namespace: Option<String>,

    /// Watch pods in every namespace
    #[arg(long = "all-namespaces", short = 'A', conflicts_with = "namespace")]
    pub all_namespaces: bool,

    /// Path to the kubeconfig file to use instead of $KUBECONFIG or ~/.kube/config
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// The kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// The kubeconfig cluster to use
    #[arg(long)]
    pub cluster: Option<String>,

    /// The kubeconfig user to use
    #[arg(long)]
    pub user: Option<String>,

    /// Seconds the server keeps each watch connection open before it is renewed
    #[arg(long, default_value_t = 60)]
    pub timeout: u32,

    /// Output format
    #[arg(long, short, value_enum, default_value_t)]
    pub output: OutputMode,

    /// Log more to stderr, repeat for more detail
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Everything needed to start a watch, once the cluster connection is settled
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchConfig {
    /// The namespace to watch, empty for all namespaces
    pub namespace: String,
    /// Which events are printed
    pub filter: FilterSpec,
    /// Server-side timeout of each watch connection
    pub timeout: Duration,
    /// Output format
    pub output: OutputMode,
}

impl App {
    /// Checks every argument that can be checked offline
    pub fn validate(&self) -> Result<(), Error> {
        if !POD_RESOURCE_NAMES.contains(&self.resource.to_ascii_lowercase().as_str()) {
            return Err(Error::UnsupportedResource(self.resource.clone()));
        }
        if self.timeout == 0 || self.timeout > MAX_TIMEOUT_SECS {
            return Err(Error::InvalidTimeout(self.timeout));
        }
        self.filter()?;
        Ok(())
    }

    /// The event filter described by `--event`, `--status` and `NAME`
    pub fn filter(&self) -> Result<FilterSpec, Error> {
        Ok(FilterSpec::parse(
            self.event.as_deref(),
            self.status.as_deref(),
            self.name.as_deref(),
        )?)
    }

    /// Whether any kubeconfig selection flag was given
    pub fn selects_kubeconfig(&self) -> bool {
        self.kubeconfig.is_some() || self.context.is_some() || self.cluster.is_some() || self.user.is_some()
    }

    /// The context, cluster and user selection flags
    pub fn kubeconfig_options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            cluster: self.cluster.clone(),
            user: self.user.clone(),
        }
    }

    /// Resolves the arguments into a [`WatchConfig`].
    ///
    /// `default_namespace` is the namespace of the selected kubeconfig context, used when
    /// neither `--namespace` nor `--all-namespaces` was given.
    pub fn into_config(self, default_namespace: &str) -> Result<WatchConfig, Error> {
        self.validate()?;
        let filter = self.filter()?;
        let namespace = if self.all_namespaces {
            String::new()
        } else {
            self.namespace.unwrap_or_else(|| default_namespace.to_owned())
        };
        Ok(WatchConfig {
            namespace,
            filter,
            timeout: Duration::from_secs(self.timeout.into()),
            output: self.output,
        })
    }
}
