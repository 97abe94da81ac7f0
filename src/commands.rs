//! Command table
//!
//! Maps command names to plain handler functions so any hosting layer
//! (chat console, RCON, HTTP) can wrap them without adapting to a handler
//! interface. Every mutating command is double-gated: first the hosting
//! environment's coarse capability check, then the rank comparison against
//! the target principal.

use crate::error::RankError;
use crate::service::RankService;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::info;

/// Coarse "may invoke this command at all" capability check
///
/// Delegated to the hosting environment; a console/system actor is
/// represented as `None` and typically passes unconditionally.
pub trait AuthorizationGate: Send + Sync {
    fn may_invoke(&self, actor: Option<&str>, command: &str) -> bool;
}

/// Gate for hosts without a capability system
pub struct AllowAllGate;

impl AuthorizationGate for AllowAllGate {
    fn may_invoke(&self, _actor: Option<&str>, _command: &str) -> bool {
        true
    }
}

/// Shared state handed to every command handler
pub struct CommandContext {
    pub service: Arc<RankService>,
    pub gate: Arc<dyn AuthorizationGate>,
}

/// A single command invocation
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    /// Invoking principal; `None` for console/system invocations
    pub actor: Option<&'a str>,
    pub args: &'a [&'a str],
}

type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Vec<String>> + Send + 'a>>;

/// Pure command handler: `(context, invocation) -> response lines`
pub type CommandHandler = for<'a> fn(&'a CommandContext, Invocation<'a>) -> HandlerFuture<'a>;

/// One entry of the command table
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    handler: CommandHandler,
}

/// The full command table
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "grant",
        usage: "grant <rank> <principal>",
        description: "Grants a permanent rank to a principal.",
        handler: grant_handler,
    },
    CommandSpec {
        name: "grant-session",
        usage: "grant-session <rank> <principal>",
        description: "Grants a rank for this session only, cleared on restart.",
        handler: grant_session_handler,
    },
    CommandSpec {
        name: "revoke",
        usage: "revoke <rank> <principal>",
        description: "Revokes a permanent rank from a principal.",
        handler: revoke_handler,
    },
    CommandSpec {
        name: "revoke-session",
        usage: "revoke-session <rank> <principal>",
        description: "Revokes a session rank from a principal.",
        handler: revoke_session_handler,
    },
    CommandSpec {
        name: "ranks",
        usage: "ranks <principal>",
        description: "Lists a principal's permanent and session ranks.",
        handler: ranks_handler,
    },
    CommandSpec {
        name: "list-ranks",
        usage: "list-ranks",
        description: "Lists all registered ranks in priority order.",
        handler: list_ranks_handler,
    },
    CommandSpec {
        name: "reload",
        usage: "reload",
        description: "Reloads the rank catalog and persisted grants.",
        handler: reload_handler,
    },
];

/// Look up a command by name
pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// Dispatch an invocation through the table
///
/// The capability gate runs before the handler; handlers apply the rank
/// comparison gate themselves where a target principal is involved.
pub async fn dispatch(
    ctx: &CommandContext,
    name: &str,
    actor: Option<&str>,
    args: &[&str],
) -> Vec<String> {
    let Some(spec) = find_command(name) else {
        return vec![format!("Unknown command '{}'.", name)];
    };

    if !ctx.gate.may_invoke(actor, name) {
        return vec!["You don't have permission to use that command.".to_string()];
    }

    info!("Dispatching command '{}' for actor {:?}", name, actor);
    (spec.handler)(ctx, Invocation { actor, args }).await
}

fn grant_handler<'a>(ctx: &'a CommandContext, inv: Invocation<'a>) -> HandlerFuture<'a> {
    Box::pin(cmd_grant(ctx, inv, false))
}

fn grant_session_handler<'a>(ctx: &'a CommandContext, inv: Invocation<'a>) -> HandlerFuture<'a> {
    Box::pin(cmd_grant(ctx, inv, true))
}

fn revoke_handler<'a>(ctx: &'a CommandContext, inv: Invocation<'a>) -> HandlerFuture<'a> {
    Box::pin(cmd_revoke(ctx, inv, false))
}

fn revoke_session_handler<'a>(ctx: &'a CommandContext, inv: Invocation<'a>) -> HandlerFuture<'a> {
    Box::pin(cmd_revoke(ctx, inv, true))
}

fn ranks_handler<'a>(ctx: &'a CommandContext, inv: Invocation<'a>) -> HandlerFuture<'a> {
    Box::pin(cmd_ranks(ctx, inv))
}

fn list_ranks_handler<'a>(ctx: &'a CommandContext, inv: Invocation<'a>) -> HandlerFuture<'a> {
    Box::pin(cmd_list_ranks(ctx, inv))
}

fn reload_handler<'a>(ctx: &'a CommandContext, inv: Invocation<'a>) -> HandlerFuture<'a> {
    Box::pin(cmd_reload(ctx, inv))
}

/// Rank-comparison gate shared by all target-mutating commands
async fn actor_may_edit(ctx: &CommandContext, actor: Option<&str>, target: &str) -> bool {
    match actor {
        // Console/system actors are not rank-gated.
        None => true,
        Some(actor) => ctx.service.outranks(actor, target).await,
    }
}

async fn cmd_grant(ctx: &CommandContext, inv: Invocation<'_>, session: bool) -> Vec<String> {
    let [rank, target] = inv.args else {
        return vec!["Not enough arguments.".to_string()];
    };

    if !actor_may_edit(ctx, inv.actor, target).await {
        return vec![
            "You are not allowed to edit principals with ranks equal to or above your own."
                .to_string(),
        ];
    }

    let result = if session {
        ctx.service.grant_session(target, rank).await
    } else {
        ctx.service.grant_permanent(target, rank).await
    };

    match result {
        Ok(()) => vec![format!("Granted the rank {} to {}.", rank, target)],
        Err(RankError::UnknownRank(rank)) => {
            vec![format!("Could not grant: the rank {} does not exist.", rank)]
        }
        Err(e) => vec![format!("Could not grant the rank: {}", e)],
    }
}

async fn cmd_revoke(ctx: &CommandContext, inv: Invocation<'_>, session: bool) -> Vec<String> {
    let [rank, target] = inv.args else {
        return vec!["Not enough arguments.".to_string()];
    };

    if !actor_may_edit(ctx, inv.actor, target).await {
        return vec![
            "You are not allowed to edit principals with ranks equal to or above your own."
                .to_string(),
        ];
    }

    let result = if session {
        Ok(ctx.service.revoke_session(target, rank).await)
    } else {
        ctx.service.revoke_permanent(target, rank).await
    };

    match result {
        Ok(true) => vec![format!("Revoked the rank {} from {}.", rank, target)],
        Ok(false) => vec![format!(
            "Could not revoke that rank. Does {} not have it?",
            target
        )],
        Err(e) => vec![format!("Could not revoke the rank: {}", e)],
    }
}

async fn cmd_ranks(ctx: &CommandContext, inv: Invocation<'_>) -> Vec<String> {
    let [target] = inv.args else {
        return vec!["Not enough arguments.".to_string()];
    };

    let (permanent, session) = ctx.service.ranks_of(target).await;
    vec![
        format!(
            "Permanent ranks: {}",
            permanent.iter().cloned().collect::<Vec<_>>().join(", ")
        ),
        format!(
            "Session ranks: {}",
            session.iter().cloned().collect::<Vec<_>>().join(", ")
        ),
    ]
}

async fn cmd_list_ranks(ctx: &CommandContext, _inv: Invocation<'_>) -> Vec<String> {
    let ranks = ctx.service.list_ranks().await;
    vec![format!("Registered ranks: {}", ranks.join(", "))]
}

async fn cmd_reload(ctx: &CommandContext, _inv: Invocation<'_>) -> Vec<String> {
    match ctx.service.reload().await {
        Ok(()) => vec!["Reload complete.".to_string()],
        Err(e) => vec![format!("Reload failed, previous state kept: {}", e)],
    }
}
