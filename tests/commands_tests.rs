//! Command table dispatch and gating tests

use async_trait::async_trait;
use rankperms::commands::{dispatch, find_command, CommandContext, COMMANDS};
use rankperms::config::{parse_catalog, parse_principal_ranks};
use rankperms::display::{AlwaysOnlineDirectory, LoggingPresentationSink};
use rankperms::{
    AllowAllGate, AuthorizationGate, ConfigSource, MemorySink, PrincipalRankMap, RankCatalog,
    RankService, Result,
};
use std::sync::Arc;

const CATALOG_YAML: &str = "\
ranks:
  owner:
    permissions:
      kick: true
  admin:
  member:
";

struct StaticConfigSource(&'static str);

#[async_trait]
impl ConfigSource for StaticConfigSource {
    async fn load_rank_catalog(&self) -> Result<RankCatalog> {
        parse_catalog(self.0)
    }

    async fn load_principal_ranks(&self) -> Result<PrincipalRankMap> {
        parse_principal_ranks("")
    }
}

/// Gate denying everything, for capability-check tests
struct DenyAllGate;

impl AuthorizationGate for DenyAllGate {
    fn may_invoke(&self, _actor: Option<&str>, _command: &str) -> bool {
        false
    }
}

async fn context(gate: Arc<dyn AuthorizationGate>) -> CommandContext {
    let service = RankService::load(
        Arc::new(StaticConfigSource(CATALOG_YAML)),
        Arc::new(MemorySink::new()),
        Arc::new(AlwaysOnlineDirectory),
        Arc::new(LoggingPresentationSink),
    )
    .await
    .unwrap();

    CommandContext {
        service: Arc::new(service),
        gate,
    }
}

#[tokio::test]
async fn table_covers_all_operations() {
    for name in [
        "grant",
        "grant-session",
        "revoke",
        "revoke-session",
        "ranks",
        "list-ranks",
        "reload",
    ] {
        assert!(find_command(name).is_some(), "missing command {}", name);
    }
    assert_eq!(COMMANDS.len(), 7);
    assert!(find_command("nonsense").is_none());
}

#[tokio::test]
async fn console_actor_can_grant_and_revoke() {
    let ctx = context(Arc::new(AllowAllGate)).await;

    let out = dispatch(&ctx, "grant", None, &["admin", "alice"]).await;
    assert_eq!(out, vec!["Granted the rank admin to alice.".to_string()]);

    let out = dispatch(&ctx, "revoke", None, &["admin", "alice"]).await;
    assert_eq!(out, vec!["Revoked the rank admin from alice.".to_string()]);
}

#[tokio::test]
async fn capability_gate_runs_first() {
    let ctx = context(Arc::new(DenyAllGate)).await;

    let out = dispatch(&ctx, "list-ranks", Some("alice"), &[]).await;
    assert_eq!(
        out,
        vec!["You don't have permission to use that command.".to_string()]
    );
}

#[tokio::test]
async fn actor_cannot_edit_equal_or_higher_target() {
    let ctx = context(Arc::new(AllowAllGate)).await;
    ctx.service.grant_permanent("alice", "admin").await.unwrap();
    ctx.service.grant_permanent("bob", "owner").await.unwrap();

    // alice (admin) may not touch bob (owner), nor a peer admin.
    let out = dispatch(&ctx, "revoke", Some("alice"), &["owner", "bob"]).await;
    assert_eq!(
        out,
        vec![
            "You are not allowed to edit principals with ranks equal to or above your own."
                .to_string()
        ]
    );

    ctx.service.grant_permanent("carol", "admin").await.unwrap();
    let out = dispatch(&ctx, "grant", Some("alice"), &["member", "carol"]).await;
    assert_eq!(
        out,
        vec![
            "You are not allowed to edit principals with ranks equal to or above your own."
                .to_string()
        ]
    );
}

#[tokio::test]
async fn actor_can_edit_lower_target() {
    let ctx = context(Arc::new(AllowAllGate)).await;
    ctx.service.grant_permanent("alice", "owner").await.unwrap();
    ctx.service.grant_permanent("bob", "member").await.unwrap();

    let out = dispatch(&ctx, "grant-session", Some("alice"), &["admin", "bob"]).await;
    assert_eq!(out, vec!["Granted the rank admin to bob.".to_string()]);

    let (_, session) = ctx.service.ranks_of("bob").await;
    assert!(session.contains("admin"));
}

#[tokio::test]
async fn grant_unknown_rank_reports_failure() {
    let ctx = context(Arc::new(AllowAllGate)).await;

    let out = dispatch(&ctx, "grant", None, &["missing", "alice"]).await;
    assert_eq!(
        out,
        vec!["Could not grant: the rank missing does not exist.".to_string()]
    );
}

#[tokio::test]
async fn missing_arguments_are_rejected() {
    let ctx = context(Arc::new(AllowAllGate)).await;

    let out = dispatch(&ctx, "grant", None, &["admin"]).await;
    assert_eq!(out, vec!["Not enough arguments.".to_string()]);
}

#[tokio::test]
async fn list_ranks_reports_priority_order() {
    let ctx = context(Arc::new(AllowAllGate)).await;

    let out = dispatch(&ctx, "list-ranks", None, &[]).await;
    assert_eq!(
        out,
        vec!["Registered ranks: owner, admin, member".to_string()]
    );
}

#[tokio::test]
async fn unknown_command_is_reported() {
    let ctx = context(Arc::new(AllowAllGate)).await;

    let out = dispatch(&ctx, "frobnicate", None, &[]).await;
    assert_eq!(out, vec!["Unknown command 'frobnicate'.".to_string()]);
}
