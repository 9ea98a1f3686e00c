//! The queue manager: exactly-once handout of themes with durable bookkeeping.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::contract::ThemeSource;
use crate::error::QueueError;
use crate::generate::ThemeGenerator;
use crate::store::{ConsumedRecord, StoreSnapshot, ThemeStore};
use crate::theme::Theme;

/// Pops themes in FIFO order, refilling from the generator when the pending
/// list runs dry and recording every pop durably before handing the theme out.
///
/// [`next`](ThemeQueue::next) takes `&mut self`: load, mutate and persist run
/// as one logical transaction, so overlapping pops are ruled out at the type
/// level. The process runs a single production loop, which is enough.
pub struct ThemeQueue<S> {
    store: ThemeStore,
    generator: ThemeGenerator,
    source: S,
}

impl<S: ThemeSource> ThemeQueue<S> {
    pub fn new(store: ThemeStore, generator: ThemeGenerator, source: S) -> Self {
        Self {
            store,
            generator,
            source,
        }
    }

    /// Hands out the next theme. By the time this returns, the theme is
    /// already in the consumed log on disk: even if the caller crashes right
    /// after, the theme will not be reissued.
    pub async fn next(&mut self) -> Result<Theme, QueueError> {
        let StoreSnapshot {
            mut pending,
            mut consumed,
        } = self.store.load();

        if pending.is_empty() {
            info!(
                consumed = consumed.len(),
                "Pending queue empty, asking generator for fresh themes"
            );
            let excluding = known_keys(&pending, &consumed);
            let fresh = self.generator.generate(&self.source, &excluding).await;
            pending.extend(fresh);
        }

        if pending.is_empty() {
            warn!("No themes left: generator and fallback came up empty");
            return Err(QueueError::Exhausted);
        }

        let theme = pending.remove(0);
        consumed.push(ConsumedRecord::new(theme.clone()));
        self.store.persist(&pending, &consumed)?;
        info!(
            theme = %theme.title,
            pending = pending.len(),
            consumed = consumed.len(),
            "Handed out theme"
        );
        Ok(theme)
    }
}

/// Dedup keys of every theme the store already knows about, pending or
/// consumed.
fn known_keys(pending: &[Theme], consumed: &[ConsumedRecord]) -> HashSet<String> {
    pending
        .iter()
        .map(Theme::dedup_key)
        .chain(consumed.iter().map(|record| record.theme.dedup_key()))
        .collect()
}
