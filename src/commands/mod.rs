//! Command implementations for dqueue.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Handlers are generic over the claim store and the output
//! writer so they can be driven against an in-process store in tests.

use crate::cli::{Cli, Command, LockArgs, OwnerArgs, RemoveArgs, UserArgs};
use dqueue::claims::Pid;
use dqueue::config::Config;
use dqueue::error::{QueueError, Result};
use dqueue::events::{Event, EventAction, append_event};
use dqueue::queue::DistributedQueue;
use dqueue::store::ClaimStore;
use serde_json::json;
use std::collections::BTreeSet;
use std::io::Write;
use tracing::warn;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. The effective
/// configuration is resolved first; every command except `config` then
/// talks to the Redis store it names.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Config => cmd_config(&config, &mut stdout),
        command => {
            let queue = DistributedQueue::connect(&config)?;
            execute(&queue, &config, command, &mut stdout)
        }
    }
}

/// Load the config file and apply command-line overrides.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::discover(cli.config.as_deref())?;

    if let Some(url) = &cli.redis_url {
        config.redis_url = url.clone();
    }
    if let Some(ttl) = cli.ttl {
        config.ttl_seconds = ttl;
    }
    if let Some(policy) = cli.relock_policy {
        config.relock_policy = policy;
    }

    config.validate()?;
    Ok(config)
}

/// Run a store-backed command against `queue`.
fn execute<S: ClaimStore, W: Write>(
    queue: &DistributedQueue<S>,
    config: &Config,
    command: Command,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Lock(args) => cmd_lock(queue, config, args, out),
        Command::Show(args) => cmd_show(queue, args, out),
        Command::List => cmd_list(queue, out),
        Command::Owner(args) => cmd_owner(queue, args, out),
        Command::Remove(args) => cmd_remove(queue, config, args, out),
        Command::RemoveAll(args) => cmd_remove_all(queue, config, args, out),
        Command::Config => cmd_config(config, out),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

fn cmd_lock<S: ClaimStore, W: Write>(
    queue: &DistributedQueue<S>,
    config: &Config,
    args: LockArgs,
    out: &mut W,
) -> Result<()> {
    let requested: BTreeSet<Pid> = args.pids.iter().copied().collect();
    let locked = queue.lock_default(args.user, requested.iter().copied())?;

    record_event(
        config,
        Event::new(EventAction::Lock, args.user).with_details(json!({
            "requested": requested,
            "locked": locked,
            "ttl_seconds": queue.ttl().as_secs(),
        })),
    );

    write_pids(out, &locked, "No pids locked.")
}

fn cmd_show<S: ClaimStore, W: Write>(
    queue: &DistributedQueue<S>,
    args: UserArgs,
    out: &mut W,
) -> Result<()> {
    let pids = queue.retrieve_user(args.user)?;
    write_pids(out, &pids, &format!("No pids locked by user {}.", args.user))
}

fn cmd_list<S: ClaimStore, W: Write>(queue: &DistributedQueue<S>, out: &mut W) -> Result<()> {
    let pids = queue.retrieve_all()?;
    write_pids(out, &pids, "No pids locked.")
}

fn cmd_owner<S: ClaimStore, W: Write>(
    queue: &DistributedQueue<S>,
    args: OwnerArgs,
    out: &mut W,
) -> Result<()> {
    match queue.owner_of(args.pid)? {
        Some(claim) => {
            let now = chrono::Utc::now();
            write_line(out, &claim.to_string())?;
            write_line(out, &format!("  Expires in: {}", claim.remaining_string(now)))
        }
        None => write_line(out, &format!("pid {} is not locked.", args.pid)),
    }
}

fn cmd_remove<S: ClaimStore, W: Write>(
    queue: &DistributedQueue<S>,
    config: &Config,
    args: RemoveArgs,
    out: &mut W,
) -> Result<()> {
    let requested: BTreeSet<Pid> = args.pids.iter().copied().collect();
    let removed = queue.remove_pids(args.user, requested.iter().copied())?;

    record_event(
        config,
        Event::new(EventAction::Remove, args.user).with_details(json!({
            "requested": requested,
            "removed": removed,
        })),
    );

    write_pids(out, &removed, "No pids removed.")
}

fn cmd_remove_all<S: ClaimStore, W: Write>(
    queue: &DistributedQueue<S>,
    config: &Config,
    args: UserArgs,
    out: &mut W,
) -> Result<()> {
    let removed = queue.remove_all(args.user)?;

    record_event(
        config,
        Event::new(EventAction::RemoveAll, args.user).with_details(json!({
            "removed": removed,
        })),
    );

    write_pids(out, &removed, "No pids removed.")
}

fn cmd_config<W: Write>(config: &Config, out: &mut W) -> Result<()> {
    let yaml = config.to_yaml()?;
    write!(out, "{}", yaml).map_err(output_error)
}

// ============================================================================
// Helpers
// ============================================================================

/// Append `event` to the configured audit log, if any.
///
/// The store has already been changed by the time this runs, so a failed
/// append is reported as a warning rather than failing the command.
fn record_event(config: &Config, event: Event) {
    let Some(path) = &config.events_path else {
        return;
    };

    if let Err(e) = append_event(path, &event) {
        warn!(action = %event.action, error = %e, "failed to append audit event");
    }
}

fn write_pids<W: Write>(out: &mut W, pids: &BTreeSet<Pid>, empty_note: &str) -> Result<()> {
    if pids.is_empty() {
        return write_line(out, empty_note);
    }
    for pid in pids {
        writeln!(out, "{}", pid).map_err(output_error)?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, line: &str) -> Result<()> {
    writeln!(out, "{}", line).map_err(output_error)
}

fn output_error(e: std::io::Error) -> QueueError {
    QueueError::UserError(format!("failed to write output: {}", e))
}
