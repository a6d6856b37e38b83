//! Chat sessions: immutable priming turns followed by live history.

use std::sync::Arc;

use iprovider::Message;
use tokio::sync::{Mutex, MutexGuard};

use crate::ChatError;

/// Bounds on live history. Priming turns are never counted or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryPolicy {
    pub max_turns: Option<usize>,
}

impl HistoryPolicy {
    pub fn uncapped() -> Self {
        Self::default()
    }

    pub fn capped(max_turns: usize) -> Self {
        Self {
            max_turns: Some(max_turns),
        }
    }

    /// Number of leading live turns to drop so at most `max_turns` remain.
    /// Drops whole user/assistant pairs so the remainder still alternates.
    pub fn overflow(&self, live_len: usize) -> usize {
        match self.max_turns {
            Some(max) if live_len > max => {
                (live_len - max).div_ceil(2) * 2
            }
            _ => 0,
        }
        .min(live_len)
    }

    pub(crate) fn trim(&self, live: &mut Vec<Message>) {
        let drop = self.overflow(live.len());
        if drop > 0 {
            live.drain(..drop);
        }
    }
}

#[derive(Debug)]
pub struct ChatSession {
    priming: Arc<[Message]>,
    live: Mutex<Vec<Message>>,
}

impl ChatSession {
    pub fn new(priming: impl Into<Arc<[Message]>>) -> Self {
        Self {
            priming: priming.into(),
            live: Mutex::new(Vec::new()),
        }
    }

    pub fn priming_turns(&self) -> &[Message] {
        &self.priming
    }

    /// Priming plus live turns, waiting for any in-flight turn to settle.
    pub async fn history(&self) -> Vec<Message> {
        let live = self.live.lock().await;
        self.priming.iter().chain(live.iter()).cloned().collect()
    }

    pub async fn live_turns(&self) -> Vec<Message> {
        self.live.lock().await.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.live.try_lock().is_err()
    }

    /// Claims the session for one turn without waiting.
    pub(crate) fn try_begin_turn(&self) -> Result<MutexGuard<'_, Vec<Message>>, ChatError> {
        self.live
            .try_lock()
            .map_err(|_| ChatError::session_busy("a turn is already in flight for this session"))
    }
}
