use std::time::Duration;

use tempfile::tempdir;

use fizzquirk_core::contract::MockThemeSource;
use fizzquirk_core::error::QueueError;
use fizzquirk_core::generate::ThemeGenerator;
use fizzquirk_core::queue::ThemeQueue;
use fizzquirk_core::store::{ConsumedRecord, ThemeStore};
use fizzquirk_core::theme::Theme;

fn no_retry_generator() -> ThemeGenerator {
    ThemeGenerator {
        retry_delay: Duration::ZERO,
        ..ThemeGenerator::default()
    }
}

#[tokio::test]
async fn test_pops_pending_in_fifo_order_without_touching_generator() {
    let data_dir = tempdir().unwrap();
    let store = ThemeStore::new(data_dir.path());
    store
        .persist(
            &[
                Theme::new("First Topic"),
                Theme::new("Second Topic"),
                Theme::new("Third Topic"),
            ],
            &[],
        )
        .expect("Seeding the store should succeed");

    // With pending themes on disk the provider must never be consulted.
    let mut source = MockThemeSource::new();
    source.expect_propose().never();

    let mut queue = ThemeQueue::new(store, no_retry_generator(), source);

    let mut popped = Vec::new();
    for _ in 0..3 {
        popped.push(queue.next().await.expect("Pop should succeed").title);
    }
    assert_eq!(
        popped,
        vec!["First Topic", "Second Topic", "Third Topic"],
        "Pops must come in FIFO order"
    );
}

#[tokio::test]
async fn test_pop_is_recorded_durably_in_consumed_log() {
    let data_dir = tempdir().unwrap();
    let store = ThemeStore::new(data_dir.path());
    store
        .persist(&[Theme::new("Durable Topic")], &[])
        .expect("Seeding the store should succeed");

    let mut source = MockThemeSource::new();
    source.expect_propose().never();

    let mut queue = ThemeQueue::new(store, no_retry_generator(), source);
    let theme = queue.next().await.expect("Pop should succeed");
    assert_eq!(theme.title, "Durable Topic");

    // A fresh handle on the same directory must already see the pop: the
    // consumed record is on disk before the theme reaches the caller.
    let fresh = ThemeStore::new(data_dir.path()).load();
    assert!(
        fresh.pending.is_empty(),
        "Popped theme should be gone from pending on disk"
    );
    assert_eq!(
        fresh.consumed.len(),
        1,
        "Popped theme should be in the consumed log on disk"
    );
    assert_eq!(fresh.consumed[0].theme.title, "Durable Topic");
}

#[tokio::test]
async fn test_refill_dedups_within_the_batch() {
    let data_dir = tempdir().unwrap();
    let store = ThemeStore::new(data_dir.path());

    // Empty store; the provider repeats itself within one batch.
    let mut source = MockThemeSource::new();
    source
        .expect_propose()
        .times(1)
        .returning(|_| Ok("Topic X\nTopic X\nTopic Y".to_string()));

    let mut queue = ThemeQueue::new(store, no_retry_generator(), source);
    let theme = queue.next().await.expect("Pop should succeed after refill");
    assert_eq!(theme.title, "Topic X", "The first unique candidate pops first");

    let fresh = ThemeStore::new(data_dir.path()).load();
    assert_eq!(
        fresh.pending.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
        vec!["Topic Y"],
        "The duplicate should be dropped, the other candidate should wait its turn"
    );
    assert_eq!(fresh.consumed.len(), 1);
    assert_eq!(fresh.consumed[0].theme.title, "Topic X");
}

#[tokio::test]
async fn test_refill_drops_candidates_already_consumed_or_duplicated() {
    let data_dir = tempdir().unwrap();
    let store = ThemeStore::new(data_dir.path());
    store
        .persist(&[], &[ConsumedRecord::new(Theme::new("Topic X"))])
        .expect("Seeding the store should succeed");

    // Provider proposes a repeat of a consumed theme, the same candidate
    // twice, and one genuinely new theme.
    let mut source = MockThemeSource::new();
    source
        .expect_propose()
        .times(1)
        .returning(|_| Ok("Topic X\nTopic X\nTopic Y".to_string()));

    let mut queue = ThemeQueue::new(store, no_retry_generator(), source);
    let theme = queue.next().await.expect("Pop should succeed after refill");
    assert_eq!(
        theme.title, "Topic Y",
        "Only the unconsumed, deduplicated candidate should survive the refill"
    );

    let fresh = ThemeStore::new(data_dir.path()).load();
    assert_eq!(
        fresh.consumed.len(),
        2,
        "Consumed log should keep history and gain the new pop"
    );
    assert!(
        fresh.pending.is_empty(),
        "The refill batch had exactly one usable theme, so pending should be drained"
    );
}

#[tokio::test]
async fn test_refill_prompt_lists_consumed_titles() {
    let data_dir = tempdir().unwrap();
    let store = ThemeStore::new(data_dir.path());
    store
        .persist(&[], &[ConsumedRecord::new(Theme::new("Moon Landings"))])
        .expect("Seeding the store should succeed");

    let mut source = MockThemeSource::new();
    source
        .expect_propose()
        .withf(|prompt: &str| prompt.contains("moon landings"))
        .times(1)
        .returning(|_| Ok("Deep Sea Vents".to_string()));

    let mut queue = ThemeQueue::new(store, no_retry_generator(), source);
    let theme = queue.next().await.expect("Pop should succeed");
    assert_eq!(theme.title, "Deep Sea Vents");
}

#[tokio::test]
async fn test_exhausted_when_provider_fails_and_fallback_is_burned() {
    let data_dir = tempdir().unwrap();
    let store = ThemeStore::new(data_dir.path());

    // Every fallback theme is already consumed, so a failing provider leaves
    // nothing to hand out.
    let consumed: Vec<ConsumedRecord> = fizzquirk_core::generate::fallback_themes()
        .into_iter()
        .map(ConsumedRecord::new)
        .collect();
    store
        .persist(&[], &consumed)
        .expect("Seeding the store should succeed");

    let mut source = MockThemeSource::new();
    source
        .expect_propose()
        .times(3)
        .returning(|_| Err("simulated provider outage".into()));

    let mut queue = ThemeQueue::new(store, no_retry_generator(), source);
    let result = queue.next().await;
    assert!(
        matches!(result, Err(QueueError::Exhausted)),
        "Queue should report exhaustion, got {result:?}"
    );
}

#[tokio::test]
async fn test_failed_persist_means_no_theme_is_handed_out() {
    let data_dir = tempdir().unwrap();
    let store = ThemeStore::new(data_dir.path());
    store
        .persist(&[Theme::new("Doomed Topic")], &[])
        .expect("Seeding the store should succeed");

    // Turning the consumed log into a directory makes the rename fail, so
    // the pop cannot be recorded.
    std::fs::remove_file(store.consumed_path()).ok();
    std::fs::create_dir(store.consumed_path()).unwrap();

    let mut source = MockThemeSource::new();
    source.expect_propose().never();

    let mut queue = ThemeQueue::new(store, no_retry_generator(), source);
    let result = queue.next().await;
    assert!(
        matches!(result, Err(QueueError::Store(_))),
        "An unrecordable pop must surface as a store error, got {result:?}"
    );
}
