// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full sync cycles against a temp SQLite store and mock adapters.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use haggle_config::model::SyncConfig;
use haggle_core::{
    AdapterType, ChatSurface, ConversationHandle, ConversationKey, ConversationStore,
    ConversationThread, Direction, DispatchOutcome, HaggleError, HealthStatus, IngestOutcome,
    ListingDetails, ListingInfo, ListingSnapshot, MessageFilter, MetadataWrite, ObservedLine,
    PendingConversation, PluginAdapter,
};
use haggle_sync::{LinkCache, SnapshotSurface, SyncContext, SyncWorker, dispatch, pending_work};
use haggle_test_utils::{MockChatSurface, MockGenerator, TestStore};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

const ACCOUNT: &str = "a@b.com";

struct Fixture {
    harness: TestStore,
    surface: Arc<MockChatSurface>,
    generator: Arc<MockGenerator>,
}

impl Fixture {
    async fn new(generator: MockGenerator) -> Self {
        Self {
            harness: TestStore::new().await.unwrap(),
            surface: Arc::new(MockChatSurface::new()),
            generator: Arc::new(generator),
        }
    }

    fn context(&self) -> SyncContext {
        SyncContext::new(ACCOUNT, self.harness.store.clone(), self.surface.clone())
            .with_generator(self.generator.clone())
    }

    fn worker(&self, ctx: SyncContext) -> SyncWorker {
        let links = LinkCache::new(self.harness.dir().join("links_cache.json"));
        SyncWorker::new(ctx, links, &SyncConfig::default())
    }

    async fn threads(&self) -> Vec<ConversationThread> {
        self.harness
            .store
            .list_messages(ACCOUNT, &MessageFilter::default())
            .await
            .unwrap()
    }
}

fn inbound(text: &str) -> ObservedLine {
    ObservedLine::new(Direction::Inbound, text)
}

fn outbound(text: &str) -> ObservedLine {
    ObservedLine::new(Direction::Outbound, text)
}

#[tokio::test]
async fn question_is_answered_once_and_replay_is_a_no_op() {
    let fx = Fixture::new(MockGenerator::with_replies(vec![Some(
        "Sim, disponível".to_string(),
    )]))
    .await;
    let handle = fx
        .surface
        .add_conversation("123", vec![inbound("Está disponível?")])
        .await;
    let mut worker = fx.worker(fx.context());

    let first = worker.run_cycle().await.unwrap();
    assert_eq!(first.messages_processed, 1);
    assert_eq!(first.replies_sent, 1);
    assert_eq!(first.conversations_discovered, 1);
    assert_eq!(
        fx.surface.sent_messages().await,
        vec![(handle.clone(), "Sim, disponível".to_string())]
    );

    let contexts = fx.generator.contexts().await;
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].key, ConversationKey::new(ACCOUNT, "123"));
    assert_eq!(contexts[0].pending_text(), "Está disponível?");
    assert_eq!(contexts[0].listing.title.as_deref(), Some("listing 123"));

    let threads = fx.threads().await;
    assert_eq!(threads.len(), 1);
    let messages = &threads[0].messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].direction, Direction::Inbound);
    assert!(messages[0].answered);
    assert_eq!(messages[1].direction, Direction::Outbound);
    assert_eq!(messages[1].text, "Sim, disponível");
    assert!(!messages[1].answered);

    let ctx = fx.context();
    assert!(pending_work(&ctx).await.unwrap().is_empty());

    // The surface now also renders our reply; nothing new is stored or sent.
    let second = worker.run_cycle().await.unwrap();
    assert_eq!(second.messages_processed, 0);
    assert_eq!(second.replies_sent, 0);
    assert_eq!(fx.generator.call_count().await, 1);
    assert_eq!(fx.surface.sent_count().await, 1);
    assert_eq!(fx.threads().await[0].messages.len(), 2);
}

#[tokio::test]
async fn new_counterparty_message_reopens_the_conversation() {
    let fx = Fixture::new(MockGenerator::with_replies(vec![
        Some("Sim, disponível".to_string()),
        Some("Faço por 110".to_string()),
    ]))
    .await;
    let handle = fx
        .surface
        .add_conversation("123", vec![inbound("Está disponível?")])
        .await;
    let mut worker = fx.worker(fx.context());
    worker.run_cycle().await.unwrap();

    fx.surface.push_line(&handle, inbound("Aceita 100?")).await;
    let cycle = worker.run_cycle().await.unwrap();
    assert_eq!(cycle.messages_processed, 1);
    assert_eq!(cycle.replies_sent, 1);

    let contexts = fx.generator.contexts().await;
    assert_eq!(contexts[1].pending_text(), "Aceita 100?");
}

#[tokio::test]
async fn lines_are_ingested_in_screen_order() {
    let fx = Fixture::new(MockGenerator::new()).await;
    fx.surface
        .add_conversation("123", vec![inbound("a"), outbound("b"), inbound("c")])
        .await;
    let ctx = SyncContext::new(ACCOUNT, fx.harness.store.clone(), fx.surface.clone());
    let mut worker = fx.worker(ctx.clone());
    worker.run_cycle().await.unwrap();

    let pending = pending_work(&ctx).await.unwrap();
    assert_eq!(pending.len(), 1);
    let texts: Vec<&str> = pending[0].messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["c"]);
}

#[tokio::test]
#[traced_test]
async fn one_broken_conversation_does_not_abort_the_cycle() {
    let fx = Fixture::new(MockGenerator::new()).await;
    let broken = fx.surface.add_conversation("456", vec![inbound("Olá")]).await;
    let healthy = fx.surface.add_conversation("123", vec![inbound("Olá")]).await;
    fx.surface.break_conversation(&broken).await;
    let mut worker = fx.worker(fx.context());

    let cycle = worker.run_cycle().await.unwrap();
    assert_eq!(cycle.conversations_skipped, 1);
    assert_eq!(cycle.errors, 1);
    assert_eq!(cycle.replies_sent, 1);
    assert_eq!(fx.surface.sent_messages().await[0].0, healthy);
    assert!(logs_contain("skipping conversation"));
}

#[tokio::test]
async fn refused_send_leaves_the_conversation_pending() {
    let fx = Fixture::new(MockGenerator::new()).await;
    fx.surface.add_conversation("123", vec![inbound("Olá")]).await;
    fx.surface.reject_sends().await;
    let ctx = fx.context();
    let mut worker = fx.worker(ctx.clone());

    let cycle = worker.run_cycle().await.unwrap();
    assert_eq!(cycle.replies_sent, 0);
    assert_eq!(cycle.errors, 1);
    assert_eq!(pending_work(&ctx).await.unwrap().len(), 1);

    worker.run_cycle().await.unwrap();
    assert_eq!(fx.generator.call_count().await, 2);
}

#[tokio::test]
async fn generator_failure_is_counted_not_fatal() {
    let fx = Fixture::new(MockGenerator::failing()).await;
    fx.surface.add_conversation("123", vec![inbound("Olá")]).await;
    let mut worker = fx.worker(fx.context());

    let cycle = worker.run_cycle().await.unwrap();
    assert_eq!(cycle.errors, 1);
    assert_eq!(fx.surface.sent_count().await, 0);
}

#[tokio::test]
async fn empty_draft_sends_nothing() {
    let fx = Fixture::new(MockGenerator::with_replies(vec![None])).await;
    fx.surface.add_conversation("123", vec![inbound("Olá")]).await;
    let mut worker = fx.worker(fx.context());

    let cycle = worker.run_cycle().await.unwrap();
    assert_eq!(cycle.replies_sent, 0);
    assert_eq!(fx.surface.sent_count().await, 0);
}

#[tokio::test]
async fn without_generator_only_reconciles() {
    let fx = Fixture::new(MockGenerator::new()).await;
    fx.surface.add_conversation("123", vec![inbound("Olá")]).await;
    let ctx = SyncContext::new(ACCOUNT, fx.harness.store.clone(), fx.surface.clone());
    let mut worker = fx.worker(ctx.clone());

    let cycle = worker.run_cycle().await.unwrap();
    assert_eq!(cycle.messages_processed, 1);
    assert_eq!(fx.generator.call_count().await, 0);
    assert_eq!(pending_work(&ctx).await.unwrap().len(), 1);
}

#[tokio::test]
async fn listing_and_detailed_info_are_recorded() {
    let fx = Fixture::new(MockGenerator::new()).await;
    let handle = fx.surface.add_conversation("123", Vec::new()).await;
    fx.surface.set_detailed_info(&handle, "Quadro em alumínio").await;
    let ctx = SyncContext::new(ACCOUNT, fx.harness.store.clone(), fx.surface.clone());
    let mut worker = fx.worker(ctx);
    worker.run_cycle().await.unwrap();

    fx.surface.set_detailed_info(&handle, "Outra descrição").await;
    worker.run_cycle().await.unwrap();

    let key = ConversationKey::new(ACCOUNT, "123");
    let details = fx.harness.store.listing_info(&key).await.unwrap().unwrap();
    assert_eq!(details.seller_name.as_deref(), Some("seller 123"));
    assert_eq!(details.price.as_deref(), Some("100 €"));
    assert_eq!(details.searched_info.as_deref(), Some("Quadro em alumínio"));
}

#[tokio::test]
async fn dispatch_of_a_recorded_reply_is_already_recorded() {
    let fx = Fixture::new(MockGenerator::new()).await;
    let handle = fx.surface.add_conversation("123", Vec::new()).await;
    let key = ConversationKey::new(ACCOUNT, "123");
    fx.harness
        .store
        .ingest_message(&key, Direction::Outbound, "Bom dia")
        .await
        .unwrap();

    let outcome = dispatch(&fx.context(), &handle, &key, "Bom dia").await.unwrap();
    assert_eq!(outcome, DispatchOutcome::AlreadyRecorded);
}

#[tokio::test]
async fn discovered_links_are_persisted() {
    let fx = Fixture::new(MockGenerator::new()).await;
    fx.surface.add_conversation("123", Vec::new()).await;
    let ctx = SyncContext::new(ACCOUNT, fx.harness.store.clone(), fx.surface.clone());
    let mut worker = fx.worker(ctx);

    assert_eq!(worker.run_cycle().await.unwrap().conversations_discovered, 1);
    assert_eq!(worker.run_cycle().await.unwrap().conversations_discovered, 0);

    let reloaded = LinkCache::load_from_disk(fx.harness.dir().join("links_cache.json"));
    assert!(reloaded.has("chat-123"));
}

#[tokio::test]
async fn worker_stops_between_cycles_when_cancelled() {
    let fx = Fixture::new(MockGenerator::new()).await;
    fx.surface.add_conversation("123", vec![inbound("Olá")]).await;
    let mut worker = fx
        .worker(fx.context())
        .with_timing(Duration::from_millis(10), Duration::from_millis(10));

    let token = CancellationToken::new();
    let running = tokio::spawn({
        let token = token.clone();
        async move {
            worker.run(token).await.unwrap();
            worker
        }
    });

    for _ in 0..200 {
        if fx.surface.sent_count().await > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    token.cancel();
    let worker = running.await.unwrap();

    assert!(worker.metrics().cycles >= 1);
    assert_eq!(worker.metrics().totals.replies_sent, 1);
    assert_eq!(fx.surface.sent_count().await, 1);
}

#[tokio::test]
async fn cancelled_token_runs_no_cycle() {
    let fx = Fixture::new(MockGenerator::new()).await;
    let mut worker = fx.worker(fx.context());
    let token = CancellationToken::new();
    token.cancel();

    worker.run(token).await.unwrap();
    assert_eq!(worker.metrics().cycles, 0);
}

/// A store whose every call fails as if the API were down.
struct DownStore;

fn down() -> HaggleError {
    HaggleError::Transient {
        message: "connection refused".to_string(),
        source: None,
    }
}

#[async_trait]
impl PluginAdapter for DownStore {
    fn name(&self) -> &str {
        "down"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, HaggleError> {
        Ok(HealthStatus::Unhealthy("down".to_string()))
    }

    async fn shutdown(&self) -> Result<(), HaggleError> {
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for DownStore {
    async fn ensure_conversation(&self, _: &ConversationKey) -> Result<bool, HaggleError> {
        Err(down())
    }

    async fn message_exists(
        &self,
        _: &ConversationKey,
        _: Direction,
        _: &str,
    ) -> Result<bool, HaggleError> {
        Err(down())
    }

    async fn ingest_message(
        &self,
        _: &ConversationKey,
        _: Direction,
        _: &str,
    ) -> Result<IngestOutcome, HaggleError> {
        Err(down())
    }

    async fn list_pending(&self, _: &str) -> Result<Vec<PendingConversation>, HaggleError> {
        Err(down())
    }

    async fn list_messages(
        &self,
        _: &str,
        _: &MessageFilter,
    ) -> Result<Vec<ConversationThread>, HaggleError> {
        Err(down())
    }

    async fn update_listing_info(
        &self,
        _: &ConversationKey,
        _: &ListingInfo,
    ) -> Result<MetadataWrite, HaggleError> {
        Err(down())
    }

    async fn listing_info(&self, _: &ConversationKey) -> Result<Option<ListingDetails>, HaggleError> {
        Err(down())
    }

    async fn set_searched_info(
        &self,
        _: &ConversationKey,
        _: &str,
    ) -> Result<MetadataWrite, HaggleError> {
        Err(down())
    }
}

#[tokio::test]
async fn unreachable_store_aborts_the_cycle() {
    let fx = Fixture::new(MockGenerator::new()).await;
    fx.surface.add_conversation("123", vec![inbound("Olá")]).await;
    fx.surface.add_conversation("456", vec![inbound("Olá")]).await;
    let ctx = SyncContext::new(ACCOUNT, Arc::new(DownStore), fx.surface.clone())
        .with_generator(fx.generator.clone());
    let mut worker = fx.worker(ctx);

    let err = worker.run_cycle().await.unwrap_err();
    assert!(err.is_store_outage());
    assert_eq!(fx.generator.call_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn failed_cycle_waits_for_the_cooldown() {
    let surface = Arc::new(MockChatSurface::new());
    surface.add_conversation("123", Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = SyncContext::new(ACCOUNT, Arc::new(DownStore), surface);
    let mut worker = SyncWorker::new(
        ctx,
        LinkCache::new(dir.path().join("links.json")),
        &SyncConfig::default(),
    );

    let token = CancellationToken::new();
    let running = tokio::spawn({
        let token = token.clone();
        async move {
            worker.run(token).await.unwrap();
            worker
        }
    });

    // Default cooldown is 60 s: after 59 s only the first cycle has run.
    tokio::time::sleep(Duration::from_secs(59)).await;
    token.cancel();
    let worker = running.await.unwrap();
    assert_eq!(worker.metrics().cycles, 1);
    assert_eq!(worker.metrics().failed_cycles, 1);
}

/// Which call of [`FlakySurface`] fails for its one bad conversation.
#[derive(Clone, Copy)]
enum Fault {
    MessagesTimeOut,
    SendFails,
}

/// Delegates to a [`MockChatSurface`] but fails one conversation with
/// errors a real browser surface can produce.
struct FlakySurface {
    inner: Arc<MockChatSurface>,
    bad: ConversationHandle,
    fault: Fault,
}

#[async_trait]
impl PluginAdapter for FlakySurface {
    fn name(&self) -> &str {
        "flaky"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChatSurface
    }

    async fn health_check(&self) -> Result<HealthStatus, HaggleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HaggleError> {
        Ok(())
    }
}

#[async_trait]
impl ChatSurface for FlakySurface {
    async fn list_open_conversations(&self) -> Result<Vec<ConversationHandle>, HaggleError> {
        self.inner.list_open_conversations().await
    }

    async fn extract_metadata(
        &self,
        handle: &ConversationHandle,
    ) -> Result<ListingSnapshot, HaggleError> {
        self.inner.extract_metadata(handle).await
    }

    async fn extract_messages(
        &self,
        handle: &ConversationHandle,
    ) -> Result<Vec<ObservedLine>, HaggleError> {
        if *handle == self.bad && matches!(self.fault, Fault::MessagesTimeOut) {
            return Err(HaggleError::Timeout {
                duration: Duration::from_secs(10),
            });
        }
        self.inner.extract_messages(handle).await
    }

    async fn send(&self, handle: &ConversationHandle, text: &str) -> Result<bool, HaggleError> {
        if *handle == self.bad && matches!(self.fault, Fault::SendFails) {
            return Err(HaggleError::Storage {
                source: "Is a directory (os error 21)".into(),
            });
        }
        self.inner.send(handle, text).await
    }
}

async fn flaky_fixture(fault: Fault) -> (Fixture, SyncContext) {
    let fx = Fixture::new(MockGenerator::with_replies(vec![
        Some("Olá!".to_string()),
        Some("Bom dia!".to_string()),
    ]))
    .await;
    let bad = fx.surface.add_conversation("1", vec![inbound("Olá")]).await;
    fx.surface.add_conversation("2", vec![inbound("Bom dia")]).await;
    let surface = Arc::new(FlakySurface {
        inner: fx.surface.clone(),
        bad,
        fault,
    });
    let ctx = SyncContext::new(ACCOUNT, fx.harness.store.clone(), surface)
        .with_generator(fx.generator.clone());
    (fx, ctx)
}

#[tokio::test]
#[traced_test]
async fn surface_timeout_skips_only_that_conversation() {
    let (fx, ctx) = flaky_fixture(Fault::MessagesTimeOut).await;
    let mut worker = fx.worker(ctx.clone());

    let cycle = worker.run_cycle().await.unwrap();
    assert_eq!(cycle.conversations_skipped, 1);
    assert_eq!(cycle.messages_processed, 1);
    assert_eq!(cycle.replies_sent, 1);

    let sent = fx.surface.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, ConversationHandle("chat-2".to_string()));
    assert!(logs_contain("skipping conversation"));
}

#[tokio::test]
async fn failing_send_is_a_delivery_failure() {
    let (fx, ctx) = flaky_fixture(Fault::SendFails).await;
    let outcome = dispatch(
        &ctx,
        &ConversationHandle("chat-1".to_string()),
        &ConversationKey::new(ACCOUNT, "1"),
        "Olá!",
    )
    .await
    .unwrap();
    assert_eq!(outcome, DispatchOutcome::DeliveryFailed);
    assert!(fx.threads().await.is_empty());
}

#[tokio::test]
async fn failing_send_does_not_abort_the_cycle() {
    let (fx, ctx) = flaky_fixture(Fault::SendFails).await;
    let mut worker = fx.worker(ctx.clone());

    let cycle = worker.run_cycle().await.unwrap();
    assert_eq!(cycle.replies_sent, 1);
    assert_eq!(cycle.errors, 1);

    let pending = pending_work(&ctx).await.unwrap();
    let listings: Vec<&str> = pending.iter().map(|p| p.listing_id.as_str()).collect();
    assert_eq!(listings, vec!["1"]);
}

#[tokio::test]
async fn unwritable_outbox_leaves_every_conversation_pending() {
    let fx = Fixture::new(MockGenerator::new()).await;
    let root = fx.harness.dir();
    let snapshots = root.join("snapshots");
    std::fs::create_dir_all(&snapshots).unwrap();
    for id in ["1", "2"] {
        let snapshot = serde_json::json!({
            "listing_id": id,
            "messages": [{"direction": "recebida", "text": "Olá"}]
        });
        std::fs::write(snapshots.join(format!("{id}.json")), snapshot.to_string()).unwrap();
    }
    let outbox = root.join("outbox.jsonl");
    std::fs::create_dir_all(&outbox).unwrap();

    let surface = Arc::new(SnapshotSurface::with_paths(&snapshots, &outbox, "https://www.olx.pt"));
    let ctx = SyncContext::new(ACCOUNT, fx.harness.store.clone(), surface)
        .with_generator(fx.generator.clone());
    let mut worker = fx.worker(ctx.clone());

    let cycle = worker.run_cycle().await.unwrap();
    assert_eq!(cycle.messages_processed, 2);
    assert_eq!(cycle.replies_sent, 0);
    assert_eq!(cycle.errors, 2);
    assert_eq!(fx.generator.call_count().await, 2);
    assert_eq!(pending_work(&ctx).await.unwrap().len(), 2);
}
