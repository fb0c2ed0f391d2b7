use futures::future::{join_all, BoxFuture};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::config::Strictness;
use crate::error::{HelperError, RenderError};

type PendingValue = BoxFuture<'static, Result<String, HelperError>>;

/// Helper values still in flight after template evaluation.
///
/// Each value is represented in the evaluated markup by a placeholder token
/// which is swapped for the resolved value afterwards.
#[derive(Clone, Default)]
pub struct DeferredValues {
    pending: Arc<Mutex<Vec<PendingValue>>>,
}

impl DeferredValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a pending value and returns the token to emit in its place.
    pub fn defer(&self, value: PendingValue) -> String {
        let mut pending = self.pending.lock();
        let token = placeholder(pending.len());
        pending.push(value);
        token
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Awaits every pending value and substitutes it into `markup`.
    ///
    /// All values are polled together; none is started before this is awaited.
    pub async fn resolve_into(
        &self,
        markup: String,
        strictness: Strictness,
    ) -> Result<String, RenderError> {
        let pending = std::mem::take(&mut *self.pending.lock());
        if pending.is_empty() {
            return Ok(markup);
        }

        trace!(count = pending.len(), "resolving deferred helper values");
        let resolved = join_all(pending).await;

        let mut markup = markup;
        for (idx, result) in resolved.into_iter().enumerate() {
            let value = match (result, strictness) {
                (Ok(value), _) => value,
                (Err(e), Strictness::Strict) => return Err(RenderError::Deferred(e)),
                (Err(e), Strictness::Lenient) => {
                    warn!(error = %e, "deferred helper failed, rendering nothing in its place");
                    String::new()
                }
            };
            markup = markup.replace(&placeholder(idx), &value);
        }

        if markup.contains(PLACEHOLDER_MARK) {
            match strictness {
                Strictness::Strict => return Err(RenderError::AlteredDeferred),
                Strictness::Lenient => warn!("deferred helper value was altered by a filter"),
            }
        }
        Ok(markup)
    }
}

impl std::fmt::Debug for DeferredValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredValues")
            .field("pending", &self.len())
            .finish()
    }
}

const PLACEHOLDER_MARK: char = '\u{fffc}';

fn placeholder(idx: usize) -> String {
    format!("{PLACEHOLDER_MARK}deferred-{idx}{PLACEHOLDER_MARK}")
}
