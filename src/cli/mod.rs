//! CLI argument parsing for dqueue.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use dqueue::config::RelockPolicy;
use std::path::PathBuf;

/// dqueue: exclusive, expiring locks on a shared pool of pids.
///
/// Each user locks a batch of pids for themselves. A pid locked by one user
/// cannot be locked by another until it is removed or its TTL runs out.
#[derive(Parser, Debug)]
#[command(name = "dqueue")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the YAML config file (default: ./dqueue.yaml if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Redis URL, overriding the config file.
    #[arg(long, global = true)]
    pub redis_url: Option<String>,

    /// Lock TTL in seconds, overriding the config file.
    #[arg(long, global = true)]
    pub ttl: Option<u64>,

    /// Relock policy (keep or refresh), overriding the config file.
    #[arg(long, global = true, value_parser = parse_relock_policy)]
    pub relock_policy: Option<RelockPolicy>,

    #[command(subcommand)]
    pub command: Command,
}

fn parse_relock_policy(s: &str) -> Result<RelockPolicy, String> {
    RelockPolicy::from_str(s)
        .ok_or_else(|| format!("unknown relock policy '{}' (expected keep or refresh)", s))
}

/// Available commands for dqueue.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lock pids for a user.
    ///
    /// Prints the pids the user holds afterwards; pids held by other users
    /// are skipped.
    Lock(LockArgs),

    /// Show the pids locked by a user.
    Show(UserArgs),

    /// List every locked pid.
    List,

    /// Show who holds a pid and until when.
    Owner(OwnerArgs),

    /// Remove pids from a user's queue.
    ///
    /// Only pids the user holds are removed; prints the removed pids.
    Remove(RemoveArgs),

    /// Remove every pid from a user's queue.
    RemoveAll(UserArgs),

    /// Print the effective configuration as YAML.
    Config,
}

/// Arguments for the `lock` command.
#[derive(Parser, Debug)]
pub struct LockArgs {
    /// User to lock the pids for.
    #[arg(short, long)]
    pub user: u64,

    /// Pids to lock (space or comma separated).
    #[arg(required = true, value_delimiter = ',')]
    pub pids: Vec<u64>,
}

/// Arguments for the `remove` command.
#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// User whose queue the pids are removed from.
    #[arg(short, long)]
    pub user: u64,

    /// Pids to remove (space or comma separated).
    #[arg(required = true, value_delimiter = ',')]
    pub pids: Vec<u64>,
}

/// Arguments for commands acting on a single user.
#[derive(Parser, Debug)]
pub struct UserArgs {
    /// The user id.
    #[arg(short, long)]
    pub user: u64,
}

/// Arguments for the `owner` command.
#[derive(Parser, Debug)]
pub struct OwnerArgs {
    /// Pid to look up.
    pub pid: u64,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_lock_with_mixed_separators() {
        let cli = Cli::try_parse_from(["dqueue", "lock", "--user", "1", "1,2", "3"]).unwrap();
        match cli.command {
            Command::Lock(args) => {
                assert_eq!(args.user, 1);
                assert_eq!(args.pids, vec![1, 2, 3]);
            }
            other => panic!("expected lock, got {:?}", other),
        }
    }

    #[test]
    fn parse_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "dqueue",
            "show",
            "-u",
            "2",
            "--ttl",
            "30",
            "--redis-url",
            "redis://example:6379",
        ])
        .unwrap();

        assert_eq!(cli.ttl, Some(30));
        assert_eq!(cli.redis_url.as_deref(), Some("redis://example:6379"));
        assert!(matches!(cli.command, Command::Show(UserArgs { user: 2 })));
    }

    #[test]
    fn parse_relock_policy_override() {
        let cli =
            Cli::try_parse_from(["dqueue", "lock", "-u", "1", "7", "--relock-policy", "refresh"])
                .unwrap();
        assert_eq!(cli.relock_policy, Some(RelockPolicy::Refresh));

        let cli = Cli::try_parse_from(["dqueue", "list"]).unwrap();
        assert_eq!(cli.relock_policy, None);

        assert!(Cli::try_parse_from(["dqueue", "list", "--relock-policy", "always"]).is_err());
    }

    #[test]
    fn parse_remove_all_subcommand_name() {
        let cli = Cli::try_parse_from(["dqueue", "remove-all", "--user", "5"]).unwrap();
        assert!(matches!(cli.command, Command::RemoveAll(UserArgs { user: 5 })));
    }

    #[test]
    fn lock_requires_pids() {
        assert!(Cli::try_parse_from(["dqueue", "lock", "--user", "1"]).is_err());
    }

    #[test]
    fn non_numeric_pid_is_rejected() {
        assert!(Cli::try_parse_from(["dqueue", "owner", "abc"]).is_err());
    }
}
