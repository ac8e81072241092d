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

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::error;

use crate::common::SupervisorSender;
use crate::message::Envelope;
use crate::traits::Payload;

/// Mint for address identities. Identity equality requires ids to be unique
/// process-wide, not merely per supervisor.
static NEXT_ADDRESS_ID: AtomicU64 = AtomicU64::new(1);

/// Represents the addressable endpoint of an actor, combining a stable identity
/// and the inbound queue of the supervisor that owns it.
///
/// An `Address` is always created by a supervisor and carries the sender half of
/// that supervisor's MPSC inbox. Posting to an address therefore enqueues onto
/// the owning supervisor, which resolves handlers on its next pump. Two
/// addresses are equal exactly when they are the same address (identity
/// equality); the identity is stable for the address's lifetime.
///
/// Addresses are handed around as [`AddressRef`] (an `Arc`); the address is
/// destroyed when the last strong reference is released.
#[derive(Clone)]
pub struct Address {
    /// Process-wide unique identity of this address.
    id: u64,
    /// Identity of the owning supervisor; used for routing decisions.
    supervisor_id: u64,
    /// Sender half of the owning supervisor's inbound queue.
    pub(crate) outbox: SupervisorSender,
}

/// A shared, thread-safe reference to an [`Address`].
pub type AddressRef = Arc<Address>;

impl Address {
    /// Crate-internal: mints a new address bound to the given supervisor.
    pub(crate) fn mint(supervisor_id: u64, outbox: SupervisorSender) -> AddressRef {
        Arc::new(Self {
            id: NEXT_ADDRESS_ID.fetch_add(1, Ordering::Relaxed),
            supervisor_id,
            outbox,
        })
    }

    /// Returns the unique identity of this address.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the identity of the supervisor that owns this address.
    #[inline]
    #[must_use]
    pub fn supervisor_id(&self) -> u64 {
        self.supervisor_id
    }

    /// Enqueues a payload for this address on the owning supervisor's queue.
    ///
    /// Delivery is asynchronous: the supervisor dispatches the message on its
    /// next pump. Messages posted from the same supervisor to the same address
    /// arrive in post order. A send failure means the owning supervisor has
    /// already been torn down; it is logged and the message is dropped.
    pub fn send(self: &Arc<Self>, message: impl Payload) {
        self.post(Arc::new(message));
    }

    /// Crate-internal: enqueues an already type-erased payload.
    pub(crate) fn post(self: &Arc<Self>, message: Arc<dyn Payload>) {
        let envelope = Envelope::new(message, self.clone());
        self.forward(envelope);
    }

    /// Crate-internal: enqueues a pre-built envelope, preserving its original
    /// destination. Used when one supervisor relays a message to another.
    pub(crate) fn forward(self: &Arc<Self>, envelope: Envelope) {
        if self.outbox.send(envelope).is_err() {
            error!(
                address = self.id,
                supervisor = self.supervisor_id,
                "Destination supervisor queue is closed; message dropped"
            );
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Address")
            .field("id", &self.id)
            .field("supervisor", &self.supervisor_id)
            .finish()
    }
}

/// Equality is identity: an address is only ever equal to itself.
impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn identities_are_unique_and_stable() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let a = Address::mint(7, tx.clone());
        let b = Address::mint(7, tx);
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.supervisor_id(), 7);
    }
}
