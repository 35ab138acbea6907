//! Tracking of the channel that last injected input

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identifier of a connected channel. `0` means "no channel".
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelId(u64);

impl ChannelId {
    pub const NONE: Self = Self(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for ChannelId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared cell holding the channel that most recently called `input`.
///
/// Clones share the same cell. Concurrent writers are not ordered against each other:
/// whichever store lands last wins, so with several channels sending input at once the
/// value is only a best-effort hint for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct InputChannelTracker {
    last: Arc<AtomicU64>,
}

impl InputChannelTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, channel_id: ChannelId) {
        self.last.store(channel_id.get(), Ordering::Relaxed);
        debug!(channel_id = %channel_id, "input channel recorded");
    }

    pub fn current(&self) -> ChannelId {
        ChannelId(self.last.load(Ordering::Relaxed))
    }
}
