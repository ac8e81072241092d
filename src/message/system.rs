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

//! The system payload catalogue: lifecycle orchestration, subscription
//! housekeeping, the registry protocol, and reserved linking payloads.
//!
//! Every type here is an ordinary [`Payload`](crate::traits::Payload) and is
//! delivered through the same pipeline as user messages. Supervisors recognize
//! the housekeeping payloads during dispatch; the lifecycle payloads are routed
//! through each actor's subscription row like any other message.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::actor::{ActorCell, ActorState};
use crate::common::{HandlerRef, SubscriptionPoint};
use crate::message::address::AddressRef;
use crate::message::Envelope;
use crate::plugin::PluginIdentity;

// --- Lifecycle orchestration ---

/// Sent to a supervisor when a constructed actor should be adopted.
///
/// The supervisor takes ownership of the cell, records it in its child set, and
/// issues an initialize request with `init_timeout` armed as a timer.
#[derive(Debug, Clone)]
pub struct CreateActor {
    /// Single-use transfer slot for the actor cell.
    pub(crate) cell: CellSlot,
    /// Maximum time for the actor to confirm initialization.
    pub(crate) init_timeout: Duration,
}

/// Sent to a supervisor when a newly spawned child *supervisor* should be
/// adopted as one of its actors.
#[derive(Debug, Clone)]
pub struct CreateSupervisor {
    /// The child supervisor's primary address.
    pub(crate) supervisor_address: AddressRef,
    /// Identity of the child supervisor's own actor core.
    pub(crate) supervisor_actor_id: u64,
    /// Maximum time for the child supervisor to confirm initialization.
    pub(crate) init_timeout: Duration,
}

/// Request asking an actor to run its initialization chain.
///
/// Answered with [`InitializeConfirmation`] once every init plugin has released
/// the chain.
#[derive(Debug, Clone)]
pub struct InitializeActor {
    /// The actor address being asked to initialize; useful for observing the
    /// initialization in some other actor.
    pub actor_address: AddressRef,
}

/// Reply payload confirming successful initialization.
#[derive(Debug, Clone)]
pub struct InitializeConfirmation;

/// Trigger moving an initialized actor into its operational state.
#[derive(Debug, Clone)]
pub struct StartActor {
    /// The actor address being started.
    pub actor_address: AddressRef,
}

/// Asks an actor's supervisor to initiate the shutdown procedure for that actor.
///
/// Addressed to the supervisor; `actor_address` names the victim, which may be
/// the supervisor itself.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    /// The actor to be shut down.
    pub actor_address: AddressRef,
}

/// Request asking an actor to run its shutdown chain.
///
/// Answered with [`ShutdownConfirmation`] once the chain has drained.
#[derive(Debug, Clone)]
pub struct ShutdownRequest {
    /// The actor address being asked to shut down.
    pub actor_address: AddressRef,
}

/// Reply payload confirming a completed shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownConfirmation;

/// Asynchronous acknowledgement that a plugin finished (or failed) activation.
///
/// Plugins performing off-pump work post this to the owning actor's primary
/// address instead of committing synchronously during `activate`.
#[derive(Debug, Clone)]
pub struct PluginActivated {
    /// Primary address of the actor whose plugin committed.
    pub actor_address: AddressRef,
    /// Identity of the committing plugin.
    pub plugin: PluginIdentity,
    /// Whether activation succeeded. Failure rolls the actor back into shutdown.
    pub success: bool,
}

/// Asynchronous acknowledgement that a plugin finished deactivation.
#[derive(Debug, Clone)]
pub struct PluginDeactivated {
    /// Primary address of the actor whose plugin committed.
    pub actor_address: AddressRef,
    /// Identity of the committing plugin.
    pub plugin: PluginIdentity,
}

// --- Subscription housekeeping ---

/// Asks the sending actor's own supervisor to record a subscription point.
///
/// If the point's address is foreign the supervisor relays via
/// [`ExternalSubscription`] instead of recording locally.
#[derive(Debug, Clone)]
pub struct Subscribe {
    /// The point to record.
    pub point: SubscriptionPoint,
}

/// Asks the sending actor's own supervisor to remove a subscription point.
#[derive(Debug, Clone)]
pub struct Unsubscribe {
    /// The point to remove.
    pub point: SubscriptionPoint,
    /// Optional completion invoked once the confirmation has fully dispatched.
    pub done: Option<Completion>,
}

/// Forwarded to the target address's supervisor to record a subscription whose
/// handler lives on a different supervisor.
#[derive(Debug, Clone)]
pub struct ExternalSubscription {
    /// The foreign point to record.
    pub point: SubscriptionPoint,
}

/// Confirmation that a subscription point has been recorded at its address's
/// owner. Delivered to the handler's owning actor.
#[derive(Debug, Clone)]
pub struct SubscriptionConfirmed {
    /// The recorded point.
    pub point: SubscriptionPoint,
}

/// Forwarded to the target address's supervisor to remove a foreign
/// subscription. Symmetric to [`ExternalSubscription`].
#[derive(Debug, Clone)]
pub struct ExternalUnsubscription {
    /// The foreign point to remove.
    pub point: SubscriptionPoint,
}

/// Sent back by the address owner once a foreign unsubscription has been
/// removed from its table, so the handler's side can finalize.
#[derive(Debug, Clone)]
pub struct CommitUnsubscription {
    /// The removed point.
    pub point: SubscriptionPoint,
}

/// Confirmation that a subscription point is gone. Delivered to the handler's
/// owning actor.
///
/// The optional [`Completion`] runs from the supervisor's deterministic
/// post-dispatch step, i.e. after every handler for this message has run. That
/// is how a subscriber learns its unsubscribe has fully propagated.
#[derive(Debug, Clone)]
pub struct UnsubscriptionConfirmed {
    /// The removed point.
    pub point: SubscriptionPoint,
    /// Optional completion callback.
    pub done: Option<Completion>,
}

/// Forwarded to a handler's supervisor for delivery of the original message.
///
/// Addresses are always owned by one supervisor, and all messages to an
/// address are first dispatched by that owner. When a resolved handler lives
/// on a different supervisor, the owner wraps the original envelope and the
/// handler in this payload and posts it to the handler's supervisor, which
/// verifies ownership and invokes the handler locally.
#[derive(Debug, Clone)]
pub struct HandlerCall {
    /// The original envelope as it arrived at the address owner.
    pub(crate) original: Envelope,
    /// The handler to invoke; its actor lives on the receiving supervisor.
    pub(crate) handler: HandlerRef,
}

// --- State query ---

/// Request for the lifecycle state of the actor behind `subject`.
///
/// Addressed to the supervisor owning `subject`; answered with
/// [`StateResponse`].
#[derive(Debug, Clone)]
pub struct StateRequest {
    /// The actor address in question.
    pub subject: AddressRef,
}

/// Reply payload carrying the asked actor's lifecycle state.
#[derive(Debug, Clone)]
pub struct StateResponse {
    /// The state of the asked actor.
    pub state: ActorState,
}

// --- Registry protocol ---

/// "name → service address" registration request.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Unique name of the service address in the registry.
    pub service_name: String,
    /// Actual service address.
    pub service_addr: AddressRef,
}

/// Successful registration response (no content).
#[derive(Debug, Clone)]
pub struct RegistrationResponse;

/// Deregistration notification for all names associated with a service address.
#[derive(Debug, Clone)]
pub struct DeregistrationNotify {
    /// Service address to deregister.
    pub service_addr: AddressRef,
}

/// Removes a single service by name from a registry.
#[derive(Debug, Clone)]
pub struct DeregistrationService {
    /// The name of the service address to be removed from the registry.
    pub service_name: String,
}

/// Discover a service by name in a registry; answered with [`DiscoveryReply`].
#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    /// The service name to be looked up.
    pub service_name: String,
}

/// Successful result of service discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryReply {
    /// The service address found by name in the registry.
    pub service_addr: AddressRef,
}

// --- Reserved linking payloads (semantics deferred) ---

/// Reserved: request to link a client actor to a server actor.
#[derive(Debug, Clone)]
pub struct LinkRequest {
    /// Address of the linking client.
    pub client_addr: AddressRef,
}

/// Reserved: reply to [`LinkRequest`].
#[derive(Debug, Clone)]
pub struct LinkResponse;

/// Reserved: notification that a client has unlinked.
#[derive(Debug, Clone)]
pub struct UnlinkNotify {
    /// Address of the unlinking client.
    pub client_addr: AddressRef,
}

/// Reserved: request that a client unlink from a server.
#[derive(Debug, Clone)]
pub struct UnlinkRequest {
    /// Address of the server being unlinked from.
    pub server_addr: AddressRef,
}

// --- Internal plumbing ---

/// Crate-internal: posted by an armed request timer into the requesting
/// supervisor's queue so the registry entry is removed on the pump.
#[derive(Debug, Clone)]
pub(crate) struct RequestTimedOut {
    pub(crate) request_id: u64,
}

/// A completion callback attached to a message and invoked exactly once from
/// the supervisor's post-dispatch step.
#[derive(Clone)]
pub struct Completion(Arc<dyn Fn() + Send + Sync + 'static>);

impl Completion {
    /// Wraps a callback for attachment to a message.
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Crate-internal: invokes the callback.
    pub(crate) fn run(&self) {
        (self.0)();
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion(..)")
    }
}

/// Crate-internal: single-use transfer slot moving an [`ActorCell`] through a
/// cloneable payload. The adopting supervisor takes the cell; later clones see
/// an empty slot, which is a fatal double-adoption bug.
#[derive(Clone)]
pub(crate) struct CellSlot(Arc<Mutex<Option<ActorCell>>>);

impl CellSlot {
    pub(crate) fn new(cell: ActorCell) -> Self {
        Self(Arc::new(Mutex::new(Some(cell))))
    }

    /// Takes the cell out of the slot. Panics if the cell was already taken.
    pub(crate) fn take(&self) -> ActorCell {
        self.0
            .lock()
            .expect("cell slot poisoned")
            .take()
            .expect("actor cell already adopted")
    }
}

impl fmt::Debug for CellSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CellSlot(..)")
    }
}
