/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::common::executor::TimerHandle;
use crate::message::{ActorError, AddressRef};
use crate::traits::Payload;

/// Crate-internal: builds the synthetic error response for a pending request
/// whose normal response never arrived. Captures the concrete response type at
/// request-build time so the pump stays type-agnostic.
pub(crate) type ResponseSynthesizer =
    Box<dyn FnOnce(ActorError) -> Arc<dyn Payload> + Send + Sync + 'static>;

/// Crate-internal: one outstanding request awaiting its response.
pub(crate) struct PendingRequest {
    /// Where the response (normal or synthetic) is delivered.
    pub(crate) reply_to: AddressRef,
    /// `TypeId` of the expected typed response; a correlated frame carrying a
    /// different type is a protocol violation.
    pub(crate) expected: TypeId,
    /// The armed timeout timer; cancelled when the response arrives first.
    pub(crate) timer: TimerHandle,
    /// Cancellation hook producing the synthetic error response.
    pub(crate) synthesize: ResponseSynthesizer,
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("reply_to", &self.reply_to.id())
            .field("timer", &self.timer)
            .finish()
    }
}

/// The per-supervisor correlation table for outstanding requests.
///
/// Request ids are minted from a monotonically increasing counter and are
/// unique per registry. The map is shared between the pump (which removes
/// entries on response, timeout, or shutdown) and request builders running in
/// handler context on the same pump, which insert entries.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    next: AtomicU64,
    pending: DashMap<u64, PendingRequest>,
}

impl RequestRegistry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next: AtomicU64::new(1),
            pending: DashMap::new(),
        })
    }

    /// Mints a fresh request id.
    pub(crate) fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a pending request under `id`.
    pub(crate) fn insert(
        &self,
        id: u64,
        reply_to: AddressRef,
        expected: TypeId,
        timer: TimerHandle,
        synthesize: ResponseSynthesizer,
    ) {
        let previous = self.pending.insert(
            id,
            PendingRequest {
                reply_to,
                expected,
                timer,
                synthesize,
            },
        );
        debug_assert!(previous.is_none(), "request id minted twice");
    }

    /// Atomically removes and returns the pending entry for `id`, if any.
    ///
    /// Exactly one caller wins: the matching response, the timeout timer, or
    /// the shutdown drain. Everyone else sees `None` and drops their event,
    /// which is what makes "at most one response per request id" hold.
    pub(crate) fn take(&self, id: u64) -> Option<PendingRequest> {
        self.pending.remove(&id).map(|(_, entry)| entry)
    }

    /// Removes and returns every pending entry; used at supervisor shutdown to
    /// synthesize cancellation responses.
    pub(crate) fn drain(&self) -> Vec<PendingRequest> {
        let ids: Vec<u64> = self.pending.iter().map(|e| *e.key()).collect();
        ids.into_iter().filter_map(|id| self.take(id)).collect()
    }

    /// Drops (without synthesizing) every entry whose reply address satisfies
    /// the predicate; used when a requester is reaped and can no longer
    /// observe responses. Returns the dropped entries so their timers can be
    /// cancelled.
    pub(crate) fn drop_where(
        &self,
        mut predicate: impl FnMut(&AddressRef) -> bool,
    ) -> Vec<PendingRequest> {
        let ids: Vec<u64> = self
            .pending
            .iter()
            .filter(|e| predicate(&e.value().reply_to))
            .map(|e| *e.key())
            .collect();
        ids.into_iter().filter_map(|id| self.take(id)).collect()
    }
}
