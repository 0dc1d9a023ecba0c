//! Clap derive structures for the `ovhsync` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ovhsync -- converge OVH resources from the command line
#[derive(Debug, Parser)]
#[command(
    name = "ovhsync",
    version,
    about = "Create, update and delete OVH resources, waiting until they converge",
    long_about = "Drives OVH API mutations to completion.\n\n\
        Every create, update and delete waits until the remote object reports\n\
        a terminal status, then prints what the server persisted.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "OVHSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Profile to use
    #[arg(long, short = 'p', env = "OVHSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, short = 'e', env = "OVHSYNC_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Output format
    #[arg(long, short = 'o', env = "OVHSYNC_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Spacing between status reads, e.g. "2s"
    #[arg(long, value_parser = humantime::parse_duration, global = true)]
    pub poll_interval: Option<Duration>,

    /// Convergence deadline for the operation, e.g. "10m"
    #[arg(long, value_parser = humantime::parse_duration, global = true)]
    pub timeout: Option<Duration>,

    /// Per-request HTTP timeout, e.g. "30s"
    #[arg(long, value_parser = humantime::parse_duration, global = true)]
    pub request_timeout: Option<Duration>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Key/value table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Resource identifier only (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage managed-database IP restrictions
    #[command(alias = "ipr")]
    IpRestriction(IpRestrictionArgs),

    /// Manage dedicated-cloud allowed networks
    #[command(alias = "an")]
    AllowedNetwork(AllowedNetworkArgs),

    /// Inspect CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── IP restrictions ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct IpRestrictionArgs {
    #[command(subcommand)]
    pub command: IpRestrictionCommand,
}

/// Identifies one IP restriction.
#[derive(Debug, Clone, Args)]
pub struct IpRestrictionTarget {
    /// Public cloud project ID
    #[arg(long)]
    pub service_name: String,

    /// Database engine (e.g. postgresql, mysql)
    #[arg(long)]
    pub engine: String,

    /// Database cluster ID
    #[arg(long)]
    pub cluster_id: String,

    /// Restricted IP block in CIDR form
    #[arg(long)]
    pub ip: String,
}

#[derive(Debug, Subcommand)]
pub enum IpRestrictionCommand {
    /// Create an IP restriction and wait until it is READY
    Create {
        /// Public cloud project ID
        #[arg(long, required_unless_present = "from_file")]
        service_name: Option<String>,

        /// Database engine (e.g. postgresql, mysql)
        #[arg(long, required_unless_present = "from_file")]
        engine: Option<String>,

        /// Database cluster ID
        #[arg(long, required_unless_present = "from_file")]
        cluster_id: Option<String>,

        /// IP block to allow, in CIDR form
        #[arg(long, required_unless_present = "from_file")]
        ip: Option<String>,

        /// Description
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Read the desired state from a JSON attribute file instead
        #[arg(
            long,
            short = 'F',
            conflicts_with_all = ["service_name", "engine", "cluster_id", "ip", "description"]
        )]
        from_file: Option<PathBuf>,
    },

    /// Read an IP restriction
    #[command(alias = "get")]
    Show {
        #[command(flatten)]
        target: IpRestrictionTarget,
    },

    /// Change the description and wait until it is READY again
    Update {
        #[command(flatten)]
        target: IpRestrictionTarget,

        /// New description
        #[arg(long, short = 'd', default_value = "")]
        description: String,
    },

    /// Delete an IP restriction and wait until it is gone
    #[command(alias = "rm")]
    Delete {
        #[command(flatten)]
        target: IpRestrictionTarget,
    },
}

// ── Allowed networks ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AllowedNetworkArgs {
    #[command(subcommand)]
    pub command: AllowedNetworkCommand,
}

/// Identifies one allowed network.
#[derive(Debug, Clone, Args)]
pub struct AllowedNetworkTarget {
    /// Dedicated cloud service name
    #[arg(long)]
    pub service_name: String,

    /// Network access ID
    #[arg(long)]
    pub id: i64,
}

#[derive(Debug, Subcommand)]
pub enum AllowedNetworkCommand {
    /// Allow a network and wait for its task to finish
    Create {
        /// Dedicated cloud service name
        #[arg(long, required_unless_present = "from_file")]
        service_name: Option<String>,

        /// Network in CIDR form
        #[arg(long, required_unless_present = "from_file")]
        network: Option<String>,

        /// Description
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Read the desired state from a JSON attribute file instead
        #[arg(
            long,
            short = 'F',
            conflicts_with_all = ["service_name", "network", "description"]
        )]
        from_file: Option<PathBuf>,
    },

    /// Read an allowed network
    #[command(alias = "get")]
    Show {
        #[command(flatten)]
        target: AllowedNetworkTarget,
    },

    /// Change the description and wait until the network is allowed again
    Update {
        #[command(flatten)]
        target: AllowedNetworkTarget,

        /// New description
        #[arg(long, short = 'd', default_value = "")]
        description: String,
    },

    /// Remove an allowed network and wait until it is gone
    #[command(alias = "rm")]
    Delete {
        #[command(flatten)]
        target: AllowedNetworkTarget,
    },

    /// Read one task of an allowed network
    Task {
        #[command(flatten)]
        target: AllowedNetworkTarget,

        /// Task ID
        #[arg(long)]
        task_id: i64,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display the loaded configuration
    Show,

    /// Display the resolved settings of the active profile
    Resolved,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
