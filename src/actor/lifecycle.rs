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

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::trace;

use crate::actor::actor_config::{ActorConfig, UnlinkPolicy};
use crate::common::{
    Executor, RequestRegistry, SubscriptionPoint, SupervisorLink,
};
use crate::message::{
    ActorError, Address, AddressRef, Completion, InitializeActor, InitializeConfirmation,
    RequestBuilder, Requestable, Response, ResponseFrame, ShutdownConfirmation, ShutdownRequest,
    ShutdownTrigger, Subscribe, Unsubscribe,
};
use crate::plugin::{PluginIdentity, Slot};
use crate::traits::Payload;

static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Crate-internal: mints a process-wide unique actor identity. Supervisors are
/// actors too and draw from the same space.
pub(crate) fn next_actor_id() -> u64 {
    NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed)
}

/// The lifecycle states of an actor, in their total transition order.
///
/// Observed state sequences are always a subsequence of this order: skips are
/// permitted, regressions are a fatal bug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActorState {
    /// Constructed, not yet asked to initialize.
    #[default]
    New,
    /// An initialize request arrived; the init chain is draining.
    Initializing,
    /// The init chain drained and initialization was confirmed.
    Initialized,
    /// The start trigger arrived; the actor processes user messages.
    Operational,
    /// A shutdown request arrived (or init failed); teardown in progress.
    ShuttingDown,
    /// Terminal state; the actor is gone from its supervisor.
    ShutDown,
}

/// Crate-internal: the correlation token of a pending init or shutdown
/// request, kept so the phase can be confirmed when it completes.
#[derive(Debug, Clone)]
pub(crate) struct RequestToken {
    pub(crate) id: u64,
    pub(crate) reply_to: AddressRef,
}

/// The lifecycle core shared by every actor, supervisors included.
///
/// Holds the state machine, the owned addresses (first is primary), the four
/// plugin slots, the activation/deactivation tracking sets, and the messaging
/// primitives plugins and handlers reach the system through. The core is only
/// ever touched from the owning supervisor's pump.
#[derive(Debug)]
pub struct ActorCore {
    id: u64,
    state: ActorState,
    addresses: Vec<AddressRef>,
    supervisor: SupervisorLink,
    executor: Arc<dyn Executor>,
    requests: Arc<RequestRegistry>,
    pub(crate) init_request: Option<RequestToken>,
    pub(crate) shutdown_request: Option<RequestToken>,
    pub(crate) init_timeout: Duration,
    pub(crate) shutdown_timeout: Duration,
    unlink_timeout: Option<Duration>,
    unlink_policy: UnlinkPolicy,
    pub(crate) activating_plugins: HashSet<PluginIdentity>,
    pub(crate) deactivating_plugins: HashSet<PluginIdentity>,
    pub(crate) activation_failed: bool,
    pub(crate) plugins_deactivated: bool,
    pub(crate) init_chain: VecDeque<PluginIdentity>,
    pub(crate) shutdown_chain: VecDeque<PluginIdentity>,
    pub(crate) subscription_slot: Vec<PluginIdentity>,
    pub(crate) unsubscription_slot: Vec<PluginIdentity>,
    state_tx: watch::Sender<ActorState>,
}

impl ActorCore {
    pub(crate) fn new(
        id: u64,
        supervisor: SupervisorLink,
        executor: Arc<dyn Executor>,
        requests: Arc<RequestRegistry>,
        primary: AddressRef,
        config: &ActorConfig,
        plugin_identities: &[PluginIdentity],
    ) -> (Self, watch::Receiver<ActorState>) {
        let (state_tx, state_rx) = watch::channel(ActorState::New);
        let core = Self {
            id,
            state: ActorState::New,
            addresses: vec![primary],
            supervisor,
            executor,
            requests,
            init_request: None,
            shutdown_request: None,
            init_timeout: config.init_timeout,
            shutdown_timeout: config.shutdown_timeout,
            unlink_timeout: config.unlink_timeout,
            unlink_policy: config.unlink_policy,
            activating_plugins: plugin_identities.iter().copied().collect(),
            deactivating_plugins: HashSet::new(),
            activation_failed: false,
            plugins_deactivated: false,
            init_chain: VecDeque::new(),
            shutdown_chain: VecDeque::new(),
            subscription_slot: Vec::new(),
            unsubscription_slot: Vec::new(),
            state_tx,
        };
        (core, state_rx)
    }

    /// Identity of this actor.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ActorState {
        self.state
    }

    /// The actor's primary address.
    #[inline]
    #[must_use]
    pub fn primary(&self) -> &AddressRef {
        &self.addresses[0]
    }

    /// All addresses owned by this actor; the first is primary.
    #[inline]
    #[must_use]
    pub fn addresses(&self) -> &[AddressRef] {
        &self.addresses
    }

    /// The reserved unlink timeout, if configured.
    #[inline]
    #[must_use]
    pub fn unlink_timeout(&self) -> Option<Duration> {
        self.unlink_timeout
    }

    /// The reserved unlink policy.
    #[inline]
    #[must_use]
    pub fn unlink_policy(&self) -> UnlinkPolicy {
        self.unlink_policy
    }

    /// Mints another address owned by this actor's supervisor and records it
    /// among the actor's owned addresses.
    pub fn create_address(&mut self) -> AddressRef {
        let address = Address::mint(self.supervisor.id, self.supervisor.primary.outbox.clone());
        self.addresses.push(address.clone());
        address
    }

    /// Crate-internal: advances the state machine. Regressions are fatal.
    pub(crate) fn set_state(&mut self, next: ActorState) {
        assert!(
            next >= self.state,
            "actor {} state regression: {:?} -> {:?}",
            self.id,
            self.state,
            next
        );
        trace!(actor = self.id, from = ?self.state, to = ?next, "State transition");
        self.state = next;
        let _ = self.state_tx.send_replace(next);
    }

    // --- Plugin slot management ---

    /// Registers a plugin into one of the four slots. Init and shutdown slots
    /// are ordered chains; the poll slots keep insertion order for their
    /// reverse-order polling.
    pub fn install_plugin(&mut self, identity: PluginIdentity, slot: Slot) {
        match slot {
            Slot::Init => self.init_chain.push_back(identity),
            Slot::Shutdown => self.shutdown_chain.push_back(identity),
            Slot::Subscription => self.subscription_slot.push(identity),
            Slot::Unsubscription => self.unsubscription_slot.push(identity),
        }
    }

    /// Removes a plugin from a slot, if present.
    pub fn uninstall_plugin(&mut self, identity: PluginIdentity, slot: Slot) {
        match slot {
            Slot::Init => {
                if let Some(index) = self.init_chain.iter().position(|i| *i == identity) {
                    self.init_chain.remove(index);
                }
            }
            Slot::Shutdown => {
                if let Some(index) = self.shutdown_chain.iter().position(|i| *i == identity) {
                    self.shutdown_chain.remove(index);
                }
            }
            Slot::Subscription => {
                if let Some(index) = self.subscription_slot.iter().position(|i| *i == identity) {
                    self.subscription_slot.remove(index);
                }
            }
            Slot::Unsubscription => {
                if let Some(index) = self.unsubscription_slot.iter().position(|i| *i == identity) {
                    self.unsubscription_slot.remove(index);
                }
            }
        }
    }

    /// Acknowledges a plugin's activation.
    ///
    /// On success the plugin leaves the activation tracking set and, once the
    /// set empties, initialization may proceed. On failure the actor is rolled
    /// back: its pending init request is answered with an init-failed error
    /// and shutdown begins.
    pub fn commit_plugin_activation(&mut self, identity: PluginIdentity, success: bool) {
        trace!(actor = self.id, plugin = %identity, success, "Plugin activation committed");
        self.activating_plugins.remove(&identity);
        if !success {
            self.activation_failed = true;
        }
    }

    /// Acknowledges a plugin's deactivation, removing it from the
    /// deactivation tracking set. Shutdown can finalize once the set empties.
    pub fn commit_plugin_deactivation(&mut self, identity: PluginIdentity) {
        trace!(actor = self.id, plugin = %identity, "Plugin deactivation committed");
        self.deactivating_plugins.remove(&identity);
    }

    // --- Messaging primitives ---

    /// Asks the owning supervisor to record a subscription point.
    pub fn subscribe(&self, point: SubscriptionPoint) {
        self.supervisor.post(Arc::new(Subscribe { point }));
    }

    /// Asks the owning supervisor to remove a subscription point. The optional
    /// completion runs after the confirmation has fully dispatched.
    pub fn unsubscribe(&self, point: SubscriptionPoint, done: Option<Completion>) {
        self.supervisor.post(Arc::new(Unsubscribe { point, done }));
    }

    /// Asks the owning supervisor to shut this actor down.
    pub fn shutdown(&self) {
        assert!(
            self.state != ActorState::New,
            "cannot request shutdown of an actor that was never initialized"
        );
        self.supervisor.post(Arc::new(ShutdownTrigger {
            actor_address: self.primary().clone(),
        }));
    }

    /// Begins a correlated request to `target`, replying to this actor's
    /// primary address.
    pub fn request<T: Requestable>(&self, target: &AddressRef, payload: T) -> RequestBuilder<T> {
        RequestBuilder::new(
            target.clone(),
            self.primary().clone(),
            payload,
            self.requests.clone(),
            self.executor.clone(),
        )
    }

    /// A cloneable [`ActorLink`] exposing this actor's messaging facilities.
    #[must_use]
    pub fn link(&self) -> ActorLink {
        ActorLink {
            actor_id: self.id,
            primary: self.primary().clone(),
            supervisor: self.supervisor.clone(),
            requests: self.requests.clone(),
            executor: self.executor.clone(),
        }
    }

    // --- Lifecycle phase bookkeeping ---

    /// Whether an init request is waiting to be confirmed.
    #[inline]
    pub(crate) fn init_pending(&self) -> bool {
        self.init_request.is_some()
    }

    pub(crate) fn init_start(&mut self, token: RequestToken) {
        self.init_request = Some(token);
        self.set_state(ActorState::Initializing);
    }

    pub(crate) fn init_finish(&mut self) {
        let token = self
            .init_request
            .take()
            .expect("init_finish without a pending init request");
        respond::<InitializeActor>(&token, Ok(InitializeConfirmation));
        self.set_state(ActorState::Initialized);
    }

    /// Answers the pending init request with an init-failed error.
    pub(crate) fn init_fail(&mut self) {
        if let Some(token) = self.init_request.take() {
            respond::<InitializeActor>(&token, Err(ActorError::InitFailed));
        }
    }

    pub(crate) fn on_start(&mut self) {
        self.set_state(ActorState::Operational);
    }

    pub(crate) fn shutdown_start(&mut self, token: Option<RequestToken>) {
        self.shutdown_request = token;
        self.set_state(ActorState::ShuttingDown);
    }

    pub(crate) fn shutdown_finish(&mut self) {
        // The shutdown request may be missing for a root supervisor.
        if let Some(token) = self.shutdown_request.take() {
            respond::<ShutdownRequest>(&token, Ok(ShutdownConfirmation));
        }
        self.set_state(ActorState::ShutDown);
    }
}

/// Sends a correlated response for a lifecycle request token.
fn respond<T: Requestable>(token: &RequestToken, payload: Result<T::Reply, ActorError>) {
    let response = Response::<T> {
        request_id: token.id,
        payload,
    };
    let frame = ResponseFrame {
        request_id: token.id,
        inner: Arc::new(response),
    };
    token.reply_to.post(Arc::new(frame));
}

/// Messaging facilities of an actor, detached from its cell.
///
/// Handed to message handlers through
/// [`MessageContext`](crate::message::MessageContext); cheap to clone and safe
/// to move into spawned follow-up work.
#[derive(Debug, Clone)]
pub struct ActorLink {
    actor_id: u64,
    primary: AddressRef,
    supervisor: SupervisorLink,
    requests: Arc<RequestRegistry>,
    executor: Arc<dyn Executor>,
}

impl ActorLink {
    /// Identity of the linked actor.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.actor_id
    }

    /// The linked actor's primary address.
    #[inline]
    #[must_use]
    pub fn address(&self) -> &AddressRef {
        &self.primary
    }

    /// Sends a payload to an address.
    pub fn send(&self, target: &AddressRef, message: impl Payload) {
        target.send(message);
    }

    /// Begins a correlated request to `target`, replying to this actor's
    /// primary address.
    pub fn request<T: Requestable>(&self, target: &AddressRef, payload: T) -> RequestBuilder<T> {
        RequestBuilder::new(
            target.clone(),
            self.primary.clone(),
            payload,
            self.requests.clone(),
            self.executor.clone(),
        )
    }

    /// Asks the owning supervisor to record a subscription point.
    pub fn subscribe(&self, point: SubscriptionPoint) {
        self.supervisor.post(Arc::new(Subscribe { point }));
    }

    /// Asks the owning supervisor to remove a subscription point.
    pub fn unsubscribe(&self, point: SubscriptionPoint, done: Option<Completion>) {
        self.supervisor.post(Arc::new(Unsubscribe { point, done }));
    }

    /// Asks the owning supervisor to shut the linked actor down.
    pub fn shutdown(&self) {
        self.supervisor.post(Arc::new(ShutdownTrigger {
            actor_address: self.primary.clone(),
        }));
    }
}
