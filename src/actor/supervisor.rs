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

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tracing::{error, instrument, trace};

use crate::actor::actor_config::{ActorConfig, SupervisorConfig};
use crate::actor::builder::ActorBuilder;
use crate::actor::cell::ActorCell;
use crate::actor::lifecycle::{next_actor_id, ActorCore, ActorState, RequestToken};
use crate::common::{
    Executor, Handler, HandlerKind, HandlerRef, LifecycleOp, RequestRegistry, SubscriptionPoint,
    SubscriptionTable, SupervisorLink, SupervisorReceiver,
};
use crate::message::{
    ActorError, Address, AddressRef, CellSlot, CommitUnsubscription, Completion, CreateActor,
    CreateSupervisor, Envelope, ExternalSubscription, ExternalUnsubscription, HandlerCall,
    InitializeActor, PluginActivated, PluginDeactivated, Request, RequestBuilder, RequestTimedOut,
    Requestable, Response, ResponseFrame, ShutdownConfirmation, ShutdownRequest, ShutdownTrigger,
    StartActor, StateRequest, StateResponse, Subscribe, SubscriptionConfirmed, Unsubscribe,
    UnsubscriptionConfirmed,
};
use crate::traits::{HandleInterface, Payload};

/// A child as the supervisor tracks it: either a locally owned cell or a
/// nested supervisor answering lifecycle requests over its own queue.
enum ChildRecord {
    Cell(Box<ActorCell>),
    SupervisorChild { address: AddressRef },
}

impl ChildRecord {
    fn address(&self) -> AddressRef {
        match self {
            ChildRecord::Cell(cell) => cell.core.primary().clone(),
            ChildRecord::SupervisorChild { address } => address.clone(),
        }
    }
}

/// The root-of-tree actor: owns an inbound queue, a subscription table, child
/// actors, and the request registry; pumps its queue serially on one executor
/// task.
///
/// A supervisor is itself an actor. With a parent configured it is adopted as
/// one of the parent's children and runs the same initialize/start/shutdown
/// protocol as any other actor, cascading shutdown to its own children first.
pub struct Supervisor {
    core: ActorCore,
    inbox: SupervisorReceiver,
    table: SubscriptionTable,
    children: HashMap<u64, ChildRecord>,
    child_by_address: HashMap<u64, u64>,
    /// init request id → child actor id, for correlating init responses.
    pending_inits: HashMap<u64, u64>,
    /// shutdown request id → child actor id.
    pending_shutdowns: HashMap<u64, u64>,
    executor: Arc<dyn Executor>,
    requests: Arc<RequestRegistry>,
    shutdown_timeout: Duration,
    has_parent: bool,
}

impl Supervisor {
    /// Spawns a new supervisor pump on the configured executor and returns its
    /// handle.
    ///
    /// A root supervisor (no parent) becomes operational immediately. With a
    /// parent configured, the new supervisor registers as a child actor of the
    /// parent and waits for the parent's initialize request.
    #[must_use]
    pub fn spawn(config: SupervisorConfig) -> SupervisorHandle {
        let (sender, inbox) = mpsc::unbounded_channel();
        let id = next_actor_id();
        let primary = Address::mint(id, sender);
        let requests = RequestRegistry::new();
        let self_link = SupervisorLink::new(id, primary.clone());
        let actor_config =
            ActorConfig::default().with_shutdown_timeout(config.shutdown_timeout);
        let (core, state_rx) = ActorCore::new(
            id,
            self_link,
            config.executor.clone(),
            requests.clone(),
            primary.clone(),
            &actor_config,
            &[],
        );

        let mut supervisor = Supervisor {
            core,
            inbox,
            table: SubscriptionTable::default(),
            children: HashMap::new(),
            child_by_address: HashMap::new(),
            pending_inits: HashMap::new(),
            pending_shutdowns: HashMap::new(),
            executor: config.executor.clone(),
            requests: requests.clone(),
            shutdown_timeout: config.shutdown_timeout,
            has_parent: config.parent.is_some(),
        };
        supervisor.register_self_handlers();

        let handle = SupervisorHandle {
            id,
            primary: primary.clone(),
            executor: config.executor.clone(),
            requests,
            state: state_rx,
        };

        if let Some(parent) = &config.parent {
            parent.primary.post(Arc::new(CreateSupervisor {
                supervisor_address: primary,
                supervisor_actor_id: id,
                init_timeout: ActorConfig::default().init_timeout,
            }));
        }

        trace!(supervisor = id, "Spawning supervisor pump");
        eprintln!("DEBUG spawning pump for supervisor {}", id);
        config.executor.post(Box::pin(supervisor.run()));
        handle
    }

    /// Seeds the subscription table with the supervisor's own lifecycle
    /// handlers: its init/start/shutdown protocol (used when parented) and
    /// the response handlers for requests it issues to children.
    fn register_self_handlers(&mut self) {
        let id = self.core.id();
        let primary = self.core.primary().clone();
        let link = SupervisorLink::new(id, primary.clone());
        let handlers = [
            Handler::lifecycle::<Request<InitializeActor>>(
                LifecycleOp::InitRequest,
                id,
                primary.clone(),
                link.clone(),
            ),
            Handler::lifecycle::<StartActor>(LifecycleOp::Start, id, primary.clone(), link.clone()),
            Handler::lifecycle::<Request<ShutdownRequest>>(
                LifecycleOp::ShutdownRequest,
                id,
                primary.clone(),
                link.clone(),
            ),
            Handler::lifecycle::<Response<InitializeActor>>(
                LifecycleOp::ChildInitResponse,
                id,
                primary.clone(),
                link.clone(),
            ),
            Handler::lifecycle::<Response<ShutdownRequest>>(
                LifecycleOp::ChildShutdownResponse,
                id,
                primary.clone(),
                link,
            ),
        ];
        for handler in handlers {
            self.table
                .subscribe(&SubscriptionPoint::new(handler, primary.clone()));
        }
    }

    /// The pump: takes the front message from the queue and dispatches it,
    /// serially, until shutdown or forced cancellation.
    async fn run(mut self) {
        eprintln!("DEBUG pump running for {}", self.core.id());
        let cancel = self.executor.shutdown_token().child_token();
        let mut cancelled = std::pin::pin!(cancel.cancelled());
        trace!(supervisor = self.core.id(), "Pump started");

        if !self.has_parent {
            // A root supervisor has nobody to drive its lifecycle; it carries
            // no plugins and becomes operational at once.
            self.core.set_state(ActorState::Initializing);
            self.core.set_state(ActorState::Initialized);
            self.core.set_state(ActorState::Operational);
        }

        loop {
            tokio::select! {
                () = &mut cancelled => {
                    trace!(supervisor = self.core.id(), "Forceful cancellation");
                    break;
                }
                incoming = self.inbox.recv() => {
                    eprintln!("DEBUG got incoming: {:?}", incoming.is_some());
                    let Some(envelope) = incoming else { break; };
                    self.dispatch(envelope).await;
                    if self.core.state() == ActorState::ShutDown {
                        // Terminal: refuse new messages and drain the queue so
                        // nothing is left behind the shut-down marker.
                        self.inbox.close();
                        while self.inbox.try_recv().is_ok() {}
                        break;
                    }
                }
            }
        }

        if self.core.state() == ActorState::ShutDown {
            assert!(
                self.core.deactivating_plugins.is_empty(),
                "a plugin was not deactivated"
            );
        }
        trace!(supervisor = self.core.id(), "Pump stopped");
    }

    /// Dispatch for one queued message.
    #[instrument(skip(self, envelope), fields(supervisor = self.core.id(), target = envelope.target.id()))]
    async fn dispatch(&mut self, envelope: Envelope) {
        // A message for an address owned elsewhere is relayed to its owner.
        if envelope.target.supervisor_id() != self.core.id() {
            eprintln!("DEBUG relaying: target_sup={} self={}", envelope.target.supervisor_id(), self.core.id());
            trace!(owner = envelope.target.supervisor_id(), "Relaying to owning supervisor");
            let target = envelope.target.clone();
            target.forward(envelope);
            return;
        }

        let message = envelope.message.clone();
        eprintln!("DEBUG dispatch not-relayed, type={:?}", message.as_any().type_id());
        let any = message.as_any();

        if let Some(frame) = any.downcast_ref::<ResponseFrame>() {
            self.on_response_frame(frame.clone()).await;
        } else if let Some(timeout) = any.downcast_ref::<RequestTimedOut>() {
            self.on_request_timeout(timeout.request_id).await;
        } else if let Some(create) = any.downcast_ref::<CreateActor>() {
            self.on_create_actor(create);
        } else if let Some(create) = any.downcast_ref::<CreateSupervisor>() {
            self.on_create_supervisor(create);
        } else if let Some(trigger) = any.downcast_ref::<ShutdownTrigger>() {
            self.on_shutdown_trigger(trigger.clone()).await;
        } else if let Some(subscribe) = any.downcast_ref::<Subscribe>() {
            self.on_subscribe(subscribe.point.clone());
        } else if let Some(unsubscribe) = any.downcast_ref::<Unsubscribe>() {
            self.on_unsubscribe(unsubscribe.point.clone(), unsubscribe.done.clone());
        } else if let Some(external) = any.downcast_ref::<ExternalSubscription>() {
            self.on_external_subscription(external.point.clone());
        } else if let Some(external) = any.downcast_ref::<ExternalUnsubscription>() {
            self.on_external_unsubscription(external.point.clone());
        } else if let Some(commit) = any.downcast_ref::<CommitUnsubscription>() {
            self.on_commit_unsubscription(commit.point.clone());
        } else if let Some(call) = any.downcast_ref::<HandlerCall>() {
            let call = call.clone();
            self.on_handler_call(call).await;
        } else if let Some(state_request) = any.downcast_ref::<Request<StateRequest>>() {
            self.on_state_request(state_request);
        } else {
            self.dispatch_table(envelope).await;
        }
    }

    /// Resolves handlers through the subscription table and invokes local
    /// ones; handlers living on other supervisors receive a forwarded handler
    /// call instead. Completion callbacks attached to unsubscription
    /// confirmations run after every handler has, which is the deterministic
    /// post-dispatch step.
    async fn dispatch_table(&mut self, envelope: Envelope) {
        let type_id = envelope.message.as_any().type_id();
        let handlers = self.table.handlers(envelope.target.id(), type_id);
        if handlers.is_empty() {
            trace!(?type_id, "No handler for message");
        }
        for handler in handlers {
            if handler.supervisor.id == self.core.id() {
                self.invoke(&handler, &envelope).await;
            } else {
                trace!(handler = handler.id(), owner = handler.supervisor.id, "Forwarding handler call");
                handler.supervisor.post(Arc::new(HandlerCall {
                    original: envelope.clone(),
                    handler: handler.clone(),
                }));
            }
        }
        if let Some(confirmation) = envelope
            .message
            .as_any()
            .downcast_ref::<UnsubscriptionConfirmed>()
        {
            if let Some(done) = &confirmation.done {
                done.run();
            }
        }
    }

    /// Invokes one handler with a message already resolved to it.
    async fn invoke(&mut self, handler: &HandlerRef, envelope: &Envelope) {
        match &handler.kind {
            HandlerKind::Lifecycle(op) => {
                self.lifecycle(*op, handler.actor_id, envelope).await;
            }
            HandlerKind::User(callee) => {
                let future = {
                    let Some(ChildRecord::Cell(cell)) = self.children.get_mut(&handler.actor_id)
                    else {
                        trace!(actor = handler.actor_id, "Handler's actor is gone; message dropped");
                        return;
                    };
                    callee(cell, envelope)
                };
                future.await;
            }
        }
    }

    /// Runs a lifecycle operation against the target actor's state machine.
    async fn lifecycle(&mut self, op: LifecycleOp, actor_id: u64, envelope: &Envelope) {
        if actor_id == self.core.id() {
            self.self_lifecycle(op, envelope).await;
            return;
        }
        let Some(record) = self.children.remove(&actor_id) else {
            trace!(actor = actor_id, "Lifecycle message for unknown actor dropped");
            return;
        };
        let mut cell = match record {
            ChildRecord::Cell(cell) => cell,
            ChildRecord::SupervisorChild { address } => {
                // Nested supervisors run their own lifecycle over their own queue.
                self.children
                    .insert(actor_id, ChildRecord::SupervisorChild { address });
                error!(actor = actor_id, "Lifecycle message misrouted to a nested supervisor record");
                return;
            }
        };

        let message = envelope.message.as_any();
        match op {
            LifecycleOp::InitRequest => {
                let request = expect_payload::<Request<InitializeActor>>(message);
                cell.handle_init_request(RequestToken {
                    id: request.id,
                    reply_to: request.reply_to.clone(),
                });
            }
            LifecycleOp::Start => {
                if cell.core.state() == ActorState::Initialized {
                    cell.core.on_start();
                } else {
                    trace!(actor = actor_id, state = ?cell.core.state(), "Start trigger ignored");
                }
            }
            LifecycleOp::ShutdownRequest => {
                let request = expect_payload::<Request<ShutdownRequest>>(message);
                if cell.core.state() >= ActorState::ShuttingDown {
                    // Idempotent: a repeated shutdown request confirms at once.
                    request.reply(ShutdownConfirmation);
                } else {
                    cell.begin_shutdown(Some(RequestToken {
                        id: request.id,
                        reply_to: request.reply_to.clone(),
                    }));
                }
            }
            LifecycleOp::SubscriptionConfirmed => {
                let confirmed = expect_payload::<SubscriptionConfirmed>(message);
                cell.poll_subscription(&confirmed.point);
                if cell.core.state() == ActorState::Initializing && cell.core.init_pending() {
                    cell.init_continue();
                }
            }
            LifecycleOp::UnsubscriptionConfirmed => {
                let confirmed = expect_payload::<UnsubscriptionConfirmed>(message);
                cell.poll_unsubscription(&confirmed.point);
                if cell.core.state() == ActorState::ShuttingDown {
                    cell.shutdown_continue();
                }
            }
            LifecycleOp::PluginActivated => {
                let commit = expect_payload::<PluginActivated>(message);
                cell.plugin_activated(commit.plugin, commit.success);
            }
            LifecycleOp::PluginDeactivated => {
                let commit = expect_payload::<PluginDeactivated>(message);
                cell.plugin_deactivated(commit.plugin);
            }
            LifecycleOp::ChildInitResponse | LifecycleOp::ChildShutdownResponse => {
                unreachable!("child response handlers are registered for the supervisor itself")
            }
        }

        if cell.core.state() == ActorState::ShutDown {
            self.reap(actor_id, &cell);
        } else {
            self.children.insert(actor_id, ChildRecord::Cell(cell));
        }
    }

    /// Lifecycle operations addressed to the supervisor's own actor core.
    async fn self_lifecycle(&mut self, op: LifecycleOp, envelope: &Envelope) {
        let message = envelope.message.as_any();
        match op {
            LifecycleOp::InitRequest => {
                let request = expect_payload::<Request<InitializeActor>>(message);
                // A supervisor core carries no plugins; its init chain is empty.
                self.core.init_start(RequestToken {
                    id: request.id,
                    reply_to: request.reply_to.clone(),
                });
                self.core.init_finish();
            }
            LifecycleOp::Start => {
                if self.core.state() == ActorState::Initialized {
                    self.core.on_start();
                }
            }
            LifecycleOp::ShutdownRequest => {
                let request = expect_payload::<Request<ShutdownRequest>>(message);
                if self.core.state() >= ActorState::ShuttingDown {
                    trace!(supervisor = self.core.id(), "Duplicate shutdown request ignored");
                } else {
                    self.begin_own_shutdown(Some(RequestToken {
                        id: request.id,
                        reply_to: request.reply_to.clone(),
                    }))
                    .await;
                }
            }
            LifecycleOp::ChildInitResponse => {
                let response = expect_payload::<Response<InitializeActor>>(message).clone();
                self.on_child_init_response(&response);
            }
            LifecycleOp::ChildShutdownResponse => {
                let response = expect_payload::<Response<ShutdownRequest>>(message).clone();
                self.on_child_shutdown_response(&response).await;
            }
            _ => {
                error!(?op, "Unexpected lifecycle operation for supervisor core");
            }
        }
    }

    // --- Child management ---

    fn on_create_actor(&mut self, create: &CreateActor) {
        eprintln!("DEBUG on_create_actor");
        let mut cell = create.cell.take();
        let actor_id = cell.core.id();
        let primary = cell.core.primary().clone();
        trace!(actor = actor_id, address = primary.id(), "Adopting actor");

        self.child_by_address.insert(primary.id(), actor_id);
        self.register_lifecycle_handlers(actor_id, &primary);

        if !cell.activate_plugins() {
            error!(actor = actor_id, "Plugin activation failed; rolling back");
            cell.deactivate_plugins();
        }
        self.children
            .insert(actor_id, ChildRecord::Cell(Box::new(cell)));

        let request_id = self.request_from_self(
            &primary,
            InitializeActor {
                actor_address: primary.clone(),
            },
            create.init_timeout,
        );
        self.pending_inits.insert(request_id, actor_id);
    }

    fn on_create_supervisor(&mut self, create: &CreateSupervisor) {
        let address = create.supervisor_address.clone();
        let actor_id = create.supervisor_actor_id;
        trace!(child_supervisor = actor_id, "Adopting child supervisor");
        self.child_by_address.insert(address.id(), actor_id);
        self.children.insert(
            actor_id,
            ChildRecord::SupervisorChild {
                address: address.clone(),
            },
        );
        let request_id = self.request_from_self(
            &address,
            InitializeActor {
                actor_address: address.clone(),
            },
            create.init_timeout,
        );
        self.pending_inits.insert(request_id, actor_id);
    }

    /// Registers the lifecycle handlers every adopted actor needs on its
    /// primary address.
    fn register_lifecycle_handlers(&mut self, actor_id: u64, primary: &AddressRef) {
        let link = SupervisorLink::new(self.core.id(), self.core.primary().clone());
        let handlers = [
            Handler::lifecycle::<Request<InitializeActor>>(
                LifecycleOp::InitRequest,
                actor_id,
                primary.clone(),
                link.clone(),
            ),
            Handler::lifecycle::<StartActor>(
                LifecycleOp::Start,
                actor_id,
                primary.clone(),
                link.clone(),
            ),
            Handler::lifecycle::<Request<ShutdownRequest>>(
                LifecycleOp::ShutdownRequest,
                actor_id,
                primary.clone(),
                link.clone(),
            ),
            Handler::lifecycle::<SubscriptionConfirmed>(
                LifecycleOp::SubscriptionConfirmed,
                actor_id,
                primary.clone(),
                link.clone(),
            ),
            Handler::lifecycle::<UnsubscriptionConfirmed>(
                LifecycleOp::UnsubscriptionConfirmed,
                actor_id,
                primary.clone(),
                link.clone(),
            ),
            Handler::lifecycle::<PluginActivated>(
                LifecycleOp::PluginActivated,
                actor_id,
                primary.clone(),
                link.clone(),
            ),
            Handler::lifecycle::<PluginDeactivated>(
                LifecycleOp::PluginDeactivated,
                actor_id,
                primary.clone(),
                link,
            ),
        ];
        for handler in handlers {
            self.table
                .subscribe(&SubscriptionPoint::new(handler, primary.clone()));
        }
    }

    /// Issues a correlated request on the supervisor's own behalf.
    fn request_from_self<T: Requestable>(
        &self,
        target: &AddressRef,
        payload: T,
        timeout: Duration,
    ) -> u64 {
        RequestBuilder::new(
            target.clone(),
            self.core.primary().clone(),
            payload,
            self.requests.clone(),
            self.executor.clone(),
        )
        .send(timeout)
    }

    fn on_child_init_response(&mut self, response: &Response<InitializeActor>) {
        let Some(actor_id) = self.pending_inits.remove(&response.request_id) else {
            trace!(request = response.request_id, "Stale init response");
            return;
        };
        match &response.payload {
            Ok(_) => {
                if let Some(record) = self.children.get(&actor_id) {
                    let address = record.address();
                    trace!(actor = actor_id, "Child initialized; sending start trigger");
                    address.post(Arc::new(StartActor {
                        actor_address: address.clone(),
                    }));
                }
            }
            Err(err) => {
                error!(actor = actor_id, error = %err, "Child failed to initialize");
                if self.children.contains_key(&actor_id) {
                    self.request_child_shutdown(actor_id);
                }
            }
        }
    }

    async fn on_child_shutdown_response(&mut self, response: &Response<ShutdownRequest>) {
        let Some(actor_id) = self.pending_shutdowns.remove(&response.request_id) else {
            trace!(request = response.request_id, "Stale shutdown response");
            return;
        };
        match &response.payload {
            Ok(_) => trace!(actor = actor_id, "Child confirmed shutdown"),
            Err(err) => {
                // Escalation: the child exceeded its budget; remove it anyway.
                error!(actor = actor_id, error = %err, "Child shutdown escalated to forced removal");
            }
        }
        // Cells remove themselves when their state machine reaches the
        // terminal state; nested supervisors and unresponsive children are
        // removed here.
        if let Some(record) = self.children.get(&actor_id) {
            let done = match record {
                ChildRecord::SupervisorChild { .. } => true,
                ChildRecord::Cell(_) => response.payload.is_err(),
            };
            if done {
                let address = record.address();
                self.children.remove(&actor_id);
                self.child_by_address.remove(&address.id());
                self.table.drop_address(address.id());
                self.table.drop_actor(actor_id);
            }
        }
        if self.core.state() == ActorState::ShuttingDown && self.children.is_empty() {
            self.finish_own_shutdown().await;
        }
    }

    /// Removes a terminated cell from every table the supervisor keeps.
    fn reap(&mut self, actor_id: u64, cell: &ActorCell) {
        assert!(
            cell.core.deactivating_plugins.is_empty(),
            "a plugin was not deactivated"
        );
        for address in cell.core.addresses() {
            self.table.drop_address(address.id());
            self.child_by_address.remove(&address.id());
        }
        self.table.drop_actor(actor_id);
        let owned = cell.core.addresses().to_vec();
        let stale = self
            .requests
            .drop_where(|reply_to| owned.iter().any(|a| a.id() == reply_to.id()));
        for entry in stale {
            self.executor.cancel_timer(&entry.timer);
        }
        trace!(actor = actor_id, "Actor reaped");
    }

    // --- Shutdown ---

    async fn on_shutdown_trigger(&mut self, trigger: ShutdownTrigger) {
        let target = &trigger.actor_address;
        if target.id() == self.core.primary().id() {
            self.begin_own_shutdown(None).await;
            return;
        }
        let Some(actor_id) = self.child_by_address.get(&target.id()).copied() else {
            trace!(address = target.id(), "Shutdown trigger for unknown actor dropped");
            return;
        };
        self.request_child_shutdown(actor_id);
    }

    fn request_child_shutdown(&mut self, actor_id: u64) {
        if self.pending_shutdowns.values().any(|a| *a == actor_id) {
            return;
        }
        let Some(record) = self.children.get(&actor_id) else {
            return;
        };
        let (address, timeout) = match record {
            ChildRecord::Cell(cell) => {
                (cell.core.primary().clone(), cell.core.shutdown_timeout)
            }
            ChildRecord::SupervisorChild { address } => (address.clone(), self.shutdown_timeout),
        };
        trace!(actor = actor_id, "Requesting child shutdown");
        let request_id = self.request_from_self(
            &address,
            ShutdownRequest {
                actor_address: address.clone(),
            },
            timeout,
        );
        self.pending_shutdowns.insert(request_id, actor_id);
    }

    async fn begin_own_shutdown(&mut self, token: Option<RequestToken>) {
        if self.core.state() >= ActorState::ShuttingDown {
            trace!(supervisor = self.core.id(), "Already shutting down");
            return;
        }
        trace!(supervisor = self.core.id(), children = self.children.len(), "Beginning shutdown");
        self.core.shutdown_start(token);
        if self.children.is_empty() {
            self.finish_own_shutdown().await;
        } else {
            let ids: Vec<u64> = self.children.keys().copied().collect();
            for actor_id in ids {
                self.request_child_shutdown(actor_id);
            }
        }
    }

    /// Completes the supervisor's own shutdown: every pending timer is
    /// cancelled and every outstanding request is answered with a synthetic
    /// cancellation before the terminal state is published.
    async fn finish_own_shutdown(&mut self) {
        for entry in self.requests.drain() {
            self.executor.cancel_timer(&entry.timer);
            let synthetic = (entry.synthesize)(ActorError::Cancelled);
            let envelope = Envelope::new(synthetic, entry.reply_to.clone());
            let type_id = envelope.message.as_any().type_id();
            for handler in self.table.handlers(envelope.target.id(), type_id) {
                // Only user handlers can still observe anything here; the
                // child bookkeeping these entries belonged to is gone.
                if let HandlerKind::User(callee) = &handler.kind {
                    let future = {
                        let Some(ChildRecord::Cell(cell)) =
                            self.children.get_mut(&handler.actor_id)
                        else {
                            continue;
                        };
                        callee(cell, &envelope)
                    };
                    future.await;
                }
            }
        }
        self.core.shutdown_finish();
    }

    // --- Subscription protocol ---

    fn on_subscribe(&mut self, point: SubscriptionPoint) {
        if point.address.supervisor_id() == self.core.id() {
            self.table.subscribe(&point);
            let target = point.handler.actor_address.clone();
            target.post(Arc::new(SubscriptionConfirmed { point }));
        } else {
            trace!(?point, "Relaying foreign subscription");
            let target = point.address.clone();
            target.post(Arc::new(ExternalSubscription { point }));
        }
    }

    fn on_external_subscription(&mut self, point: SubscriptionPoint) {
        self.table.subscribe(&point);
        let target = point.handler.actor_address.clone();
        target.post(Arc::new(SubscriptionConfirmed { point }));
    }

    fn on_unsubscribe(&mut self, point: SubscriptionPoint, done: Option<Completion>) {
        if point.address.supervisor_id() == self.core.id() {
            // Idempotent: a missing point still confirms immediately.
            let _ = self.table.unsubscribe(&point);
            let target = point.handler.actor_address.clone();
            target.post(Arc::new(UnsubscriptionConfirmed { point, done }));
        } else {
            debug_assert!(
                done.is_none(),
                "completion callbacks are not carried across supervisors"
            );
            trace!(?point, "Relaying foreign unsubscription");
            let target = point.address.clone();
            target.post(Arc::new(ExternalUnsubscription { point }));
        }
    }

    fn on_external_unsubscription(&mut self, point: SubscriptionPoint) {
        let _ = self.table.unsubscribe(&point);
        let target = point.handler.actor_address.clone();
        target.post(Arc::new(CommitUnsubscription { point }));
    }

    fn on_commit_unsubscription(&mut self, point: SubscriptionPoint) {
        // The foreign leg is gone; finalize on the handler's side through the
        // ordinary confirmation path.
        let target = point.handler.actor_address.clone();
        target.post(Arc::new(UnsubscriptionConfirmed { point, done: None }));
    }

    // --- Forwarded handler calls ---

    async fn on_handler_call(&mut self, call: HandlerCall) {
        assert!(
            call.handler.supervisor.id == self.core.id(),
            "forwarded handler does not live on this supervisor"
        );
        self.invoke(&call.handler, &call.original).await;
    }

    // --- Request plumbing ---

    async fn on_response_frame(&mut self, frame: ResponseFrame) {
        match self.requests.take(frame.request_id) {
            Some(entry) => {
                self.executor.cancel_timer(&entry.timer);
                assert!(
                    frame.inner.as_any().type_id() == entry.expected,
                    "response payload type mismatch for request {}",
                    frame.request_id
                );
                let envelope = Envelope::new(frame.inner.clone(), entry.reply_to.clone());
                self.dispatch_table(envelope).await;
            }
            None => trace!(request = frame.request_id, "Late response dropped"),
        }
    }

    async fn on_request_timeout(&mut self, request_id: u64) {
        match self.requests.take(request_id) {
            Some(entry) => {
                trace!(request = request_id, "Request timed out");
                let synthetic = (entry.synthesize)(ActorError::Timeout);
                let envelope = Envelope::new(synthetic, entry.reply_to.clone());
                self.dispatch_table(envelope).await;
            }
            None => trace!(request = request_id, "Stale timeout ignored"),
        }
    }

    // --- State queries ---

    fn on_state_request(&mut self, request: &Request<StateRequest>) {
        let subject = &request.payload.subject;
        if subject.id() == self.core.primary().id() {
            request.reply(StateResponse {
                state: self.core.state(),
            });
            return;
        }
        match self
            .child_by_address
            .get(&subject.id())
            .and_then(|actor_id| self.children.get(actor_id))
        {
            Some(ChildRecord::Cell(cell)) => request.reply(StateResponse {
                state: cell.core.state(),
            }),
            _ => request.reply_err(ActorError::UnknownService(format!(
                "address {}",
                subject.id()
            ))),
        }
    }
}

/// Extracts the payload a lifecycle handler was registered for. The table
/// guarantees the match; anything else is fatal.
fn expect_payload<M: 'static>(message: &dyn std::any::Any) -> &M {
    message
        .downcast_ref::<M>()
        .expect("lifecycle handler invoked with incompatible payload type")
}

/// A clonable handle for interacting with a running [`Supervisor`].
///
/// The handle is the only way code outside the pump touches a supervisor:
/// minting addresses, spawning actors, managing subscriptions, and stopping.
/// Equality of supervisors is identity of their primary addresses.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    id: u64,
    primary: AddressRef,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) requests: Arc<RequestRegistry>,
    state: watch::Receiver<ActorState>,
}

impl SupervisorHandle {
    /// Crate-internal: link carried by handlers of actors on this supervisor.
    pub(crate) fn link(&self) -> SupervisorLink {
        SupervisorLink::new(self.id, self.primary.clone())
    }

    /// Configures and adopts an actor, returning its [`ActorRef`].
    ///
    /// The cell is transferred to the supervisor through a create-actor
    /// message; the supervisor activates the plugin chain and drives the
    /// initialize/start protocol with the configured init timeout armed as a
    /// timer.
    pub fn spawn_actor<State: Default + Send + Debug + 'static>(
        &self,
        builder: ActorBuilder<State>,
    ) -> ActorRef {
        let (cell, actor_ref) = builder.build(self);
        let init_timeout = cell.core.init_timeout;
        self.primary.post(Arc::new(CreateActor {
            cell: CellSlot::new(cell),
            init_timeout,
        }));
        actor_ref
    }

    /// Records a subscription point, relaying through the external
    /// subscription protocol when the address is foreign.
    pub fn subscribe(&self, point: SubscriptionPoint) {
        self.primary.post(Arc::new(Subscribe { point }));
    }

    /// Removes a subscription point. The optional completion runs once the
    /// confirmation has fully dispatched; unsubscribing a point twice
    /// confirms immediately the second time.
    pub fn unsubscribe(&self, point: SubscriptionPoint, done: Option<Completion>) {
        self.primary.post(Arc::new(Unsubscribe { point, done }));
    }

    /// Asks the supervisor to shut down the actor owning `address`.
    pub fn shutdown_actor(&self, address: &AddressRef) {
        self.primary.post(Arc::new(ShutdownTrigger {
            actor_address: address.clone(),
        }));
    }

    /// The supervisor's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ActorState {
        *self.state.borrow()
    }

    /// Waits until the supervisor's state reaches at least `at_least`.
    ///
    /// # Errors
    ///
    /// Fails if the pump was torn down before reaching the state.
    pub async fn wait_state(&self, at_least: ActorState) -> anyhow::Result<ActorState> {
        let mut receiver = self.state.clone();
        let value = receiver.wait_for(|state| *state >= at_least).await?;
        Ok(*value)
    }
}

impl PartialEq for SupervisorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SupervisorHandle {}

#[async_trait]
impl HandleInterface for SupervisorHandle {
    #[inline]
    fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    fn address(&self) -> &AddressRef {
        &self.primary
    }

    fn create_address(&self) -> AddressRef {
        Address::mint(self.id, self.primary.outbox.clone())
    }

    fn post(&self, target: &AddressRef, message: impl Payload) {
        target.send(message);
    }

    async fn stop(&self) -> anyhow::Result<()> {
        trace!(supervisor = self.id, "Stop requested");
        self.primary.post(Arc::new(ShutdownTrigger {
            actor_address: self.primary.clone(),
        }));
        self.wait_state(ActorState::ShutDown).await?;
        trace!(supervisor = self.id, "Supervisor terminated successfully");
        Ok(())
    }
}

/// A clonable reference to a spawned actor: its identity, primary address,
/// observable lifecycle state, and the subscription points created from the
/// builder's handlers.
#[derive(Debug, Clone)]
pub struct ActorRef {
    id: u64,
    address: AddressRef,
    state: watch::Receiver<ActorState>,
    points: Vec<SubscriptionPoint>,
}

impl ActorRef {
    pub(crate) fn new(
        id: u64,
        address: AddressRef,
        state: watch::Receiver<ActorState>,
        points: Vec<SubscriptionPoint>,
    ) -> Self {
        Self {
            id,
            address,
            state,
            points,
        }
    }

    /// Identity of the actor.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The actor's primary address.
    #[inline]
    #[must_use]
    pub fn address(&self) -> &AddressRef {
        &self.address
    }

    /// The actor's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ActorState {
        *self.state.borrow()
    }

    /// Waits until the actor's state reaches at least `at_least`.
    ///
    /// # Errors
    ///
    /// Fails if the actor was torn down before reaching the state.
    pub async fn wait_state(&self, at_least: ActorState) -> anyhow::Result<ActorState> {
        let mut receiver = self.state.clone();
        let value = receiver.wait_for(|state| *state >= at_least).await?;
        Ok(*value)
    }

    /// The subscription points created from the builder's handlers, in
    /// registration order.
    #[must_use]
    pub fn points(&self) -> &[SubscriptionPoint] {
        &self.points
    }
}
