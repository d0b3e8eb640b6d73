use std::collections::VecDeque;
use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::provider::Page;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CursorState {
    Initial,
    Next(String),
    Exhausted,
}

/// Client-side state of one paginated listing: the cursor for the next
/// request and the items of the current page not yet handed out.
#[derive(Debug)]
pub struct Paginated<T> {
    cursor: CursorState,
    buffered: VecDeque<T>,
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            cursor: CursorState::Initial,
            buffered: VecDeque::new(),
        }
    }
}

impl<T> Paginated<T> {
    pub fn pop(&mut self) -> Option<T> {
        self.buffered.pop_front()
    }

    /// Cursor argument for the next page request, or `None` once the provider
    /// returned its last page. The outer `Some(None)` requests the first page.
    pub fn next_request(&self) -> Option<Option<&str>> {
        match &self.cursor {
            CursorState::Initial => Some(None),
            CursorState::Next(cursor) => Some(Some(cursor.as_str())),
            CursorState::Exhausted => None,
        }
    }

    pub fn absorb(&mut self, page: Page<T>) {
        self.buffered.extend(page.items);
        self.cursor = match page.next_cursor {
            Some(cursor) => CursorState::Next(cursor),
            None => CursorState::Exhausted,
        };
    }

    /// Stops further page requests; already buffered items are discarded.
    pub fn terminate(&mut self) {
        self.buffered.clear();
        self.cursor = CursorState::Exhausted;
    }

    pub fn is_finished(&self) -> bool {
        self.buffered.is_empty() && self.cursor == CursorState::Exhausted
    }
}

/// Runs a provider call unless the sweep is cancelled first. Returns `None`
/// when cancellation is observed before or after the call, so callers end
/// their stream instead of surfacing an error.
pub async fn unless_cancelled<F>(cancel: &CancellationToken, call: F) -> Option<F::Output>
where
    F: Future,
{
    let output = tokio::select! {
        biased;
        _ = cancel.cancelled() => return None,
        output = call => output,
    };

    if cancel.is_cancelled() {
        None
    } else {
        Some(output)
    }
}
