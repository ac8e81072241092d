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
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use derive_new::new;

use crate::common::HandlerFn;
use crate::message::AddressRef;
use crate::traits::Payload;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// A shared, thread-safe reference to a [`Handler`].
pub type HandlerRef = Arc<Handler>;

/// Crate-internal: a lightweight link back to a supervisor, carried by
/// handlers so any supervisor can decide whether an invocation is local or
/// must be forwarded.
#[derive(new, Clone, Debug)]
pub struct SupervisorLink {
    /// Identity of the linked supervisor.
    pub(crate) id: u64,
    /// The linked supervisor's primary address.
    pub(crate) primary: AddressRef,
}

impl SupervisorLink {
    /// Posts a payload onto the linked supervisor's queue.
    pub(crate) fn post(&self, message: Arc<dyn Payload>) {
        self.primary.post(message);
    }
}

/// A typed callback bound to an actor.
///
/// A handler knows the single payload type it accepts, the actor it belongs
/// to, and the supervisor that actor lives on. The invocation target is either
/// a user closure or an internal lifecycle operation of the actor state
/// machine. A handler is invoked exactly once per delivered matching message;
/// invoking it with any other payload type is a protocol violation and fatal.
pub struct Handler {
    /// Unique handler identity; subscription points compare by it.
    id: u64,
    /// Identity of the owning actor.
    pub(crate) actor_id: u64,
    /// Primary address of the owning actor; confirmations are routed here.
    pub(crate) actor_address: AddressRef,
    /// The supervisor the owning actor lives on.
    pub(crate) supervisor: SupervisorLink,
    /// The payload type this handler accepts.
    pub(crate) accepts: TypeId,
    /// Human-readable name of the accepted type, for diagnostics.
    pub(crate) accepts_name: &'static str,
    /// The invocation target.
    pub(crate) kind: HandlerKind,
}

/// Crate-internal: what invoking a handler means.
pub(crate) enum HandlerKind {
    /// A user closure registered through the actor builder.
    User(HandlerFn),
    /// An internal operation of the lifecycle state machine.
    Lifecycle(LifecycleOp),
}

/// Crate-internal: the lifecycle operations dispatchable through the
/// subscription table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LifecycleOp {
    /// An initialize request arrived for the actor.
    InitRequest,
    /// A start trigger arrived for the actor.
    Start,
    /// A shutdown request arrived for the actor.
    ShutdownRequest,
    /// A subscription confirmation arrived for one of the actor's points.
    SubscriptionConfirmed,
    /// An unsubscription confirmation arrived for one of the actor's points.
    UnsubscriptionConfirmed,
    /// A plugin committed activation asynchronously.
    PluginActivated,
    /// A plugin committed deactivation asynchronously.
    PluginDeactivated,
    /// A response to an init request this supervisor issued for a child.
    ChildInitResponse,
    /// A response to a shutdown request this supervisor issued for a child.
    ChildShutdownResponse,
}

impl Handler {
    /// Crate-internal: creates a user handler for an already type-erased
    /// accepted type (the builder erases before the cell exists).
    pub(crate) fn user(
        accepts: TypeId,
        accepts_name: &'static str,
        actor_id: u64,
        actor_address: AddressRef,
        supervisor: SupervisorLink,
        callee: HandlerFn,
    ) -> HandlerRef {
        Arc::new(Self {
            id: NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed),
            actor_id,
            actor_address,
            supervisor,
            accepts,
            accepts_name,
            kind: HandlerKind::User(callee),
        })
    }

    /// Crate-internal: creates a lifecycle handler accepting payloads of type `M`.
    pub(crate) fn lifecycle<M: Payload>(
        op: LifecycleOp,
        actor_id: u64,
        actor_address: AddressRef,
        supervisor: SupervisorLink,
    ) -> HandlerRef {
        Arc::new(Self {
            id: NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed),
            actor_id,
            actor_address,
            supervisor,
            accepts: TypeId::of::<M>(),
            accepts_name: std::any::type_name::<M>(),
            kind: HandlerKind::Lifecycle(op),
        })
    }

    /// Returns the unique identity of this handler.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the identity of the actor owning this handler.
    #[inline]
    #[must_use]
    pub fn actor_id(&self) -> u64 {
        self.actor_id
    }

    /// Returns the payload type this handler accepts.
    #[inline]
    #[must_use]
    pub fn accepts(&self) -> TypeId {
        self.accepts
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            HandlerKind::User(_) => "user".to_string(),
            HandlerKind::Lifecycle(op) => format!("{op:?}"),
        };
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("actor", &self.actor_id)
            .field("accepts", &self.accepts_name)
            .field("kind", &kind)
            .finish()
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}

impl Hash for Handler {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// The unit of (un)subscription: a handler paired with the address it listens
/// on.
///
/// Two points are equal when both the handler and the address are the same,
/// which is what makes subscribe idempotent and unsubscribe target exactly one
/// table entry.
#[derive(new, Clone, Debug)]
pub struct SubscriptionPoint {
    /// The handler to invoke.
    pub handler: HandlerRef,
    /// The address the handler listens on.
    pub address: AddressRef,
}

impl SubscriptionPoint {
    /// Crate-internal: the (handler id, address id) pair identifying the point.
    #[inline]
    pub(crate) fn key(&self) -> (u64, u64) {
        (self.handler.id(), self.address.id())
    }
}

impl PartialEq for SubscriptionPoint {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SubscriptionPoint {}

impl Hash for SubscriptionPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
