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
use std::fmt::Debug;
use std::sync::Arc;

use tracing::{error, instrument, trace};

use crate::actor::actor_config::ActorConfig;
use crate::actor::cell::ActorCell;
use crate::actor::lifecycle::{next_actor_id, ActorCore};
use crate::actor::supervisor::{ActorRef, SupervisorHandle};
use crate::common::{FutureBox, Handler, HandlerFn, SubscriptionPoint};
use crate::message::{AddressRef, Envelope, MessageContext};
use crate::plugin::{LifetimePlugin, Plugin, SubscriberPlugin};
use crate::traits::{HandleInterface, Payload};

/// Crate-internal: one handler declared on the builder, type-erased and
/// waiting for the cell to exist.
pub(crate) struct HandlerSpec {
    accepts: TypeId,
    accepts_name: &'static str,
    /// `None` subscribes the handler to the actor's primary address.
    target: Option<AddressRef>,
    callee: HandlerFn,
}

/// Configures an actor before its supervisor adopts it.
///
/// The builder collects the user state, the actor configuration, message
/// handlers, and the plugin chain. Handlers registered here are subscribed to
/// their addresses during initialization by the built-in
/// [`SubscriberPlugin`]; the actor is only confirmed initialized once every
/// one of them is live. Spawn the configured actor with
/// [`SupervisorHandle::spawn_actor`].
pub struct ActorBuilder<State> {
    state: State,
    config: ActorConfig,
    handlers: Vec<HandlerSpec>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl<State: Default + Send + Debug + 'static> Default for ActorBuilder<State> {
    fn default() -> Self {
        Self::new()
    }
}

impl<State: Default + Send + Debug + 'static> ActorBuilder<State> {
    /// Creates a builder with default-constructed state and configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(State::default())
    }

    /// Creates a builder around an already constructed state value.
    #[must_use]
    pub fn with_state(state: State) -> Self {
        Self {
            state,
            config: ActorConfig::default(),
            handlers: Vec::new(),
            plugins: Vec::new(),
        }
    }

    /// Replaces the actor configuration.
    pub fn with_config(&mut self, config: ActorConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Appends a plugin to the actor's chain.
    ///
    /// Plugins activate in chain order and deactivate in reverse. Each plugin
    /// type may appear at most once per actor; identity is the concrete type.
    pub fn with_plugin(&mut self, plugin: impl Plugin) -> &mut Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Registers a message handler for payload type `M` on the actor's
    /// primary address.
    ///
    /// The closure runs on the owning supervisor's pump with exclusive access
    /// to the actor state; the future it returns is awaited to completion
    /// before the next message is dispatched, so handlers never interleave.
    #[instrument(skip(self, message_processor), level = "debug")]
    pub fn mutate_on<M>(
        &mut self,
        message_processor: impl for<'a> Fn(&'a mut State, &'a mut MessageContext<M>) -> FutureBox
            + Send
            + Sync
            + 'static,
    ) -> &mut Self
    where
        M: Payload + Clone,
    {
        self.handler_for::<M>(None, message_processor)
    }

    /// Registers a message handler for payload type `M` on an explicit
    /// address, which may be owned by a different supervisor.
    ///
    /// A foreign address makes this a foreign subscription: it is established
    /// through the external subscription protocol during initialization, and
    /// matching messages reach the handler through a forwarded handler call.
    #[instrument(skip(self, message_processor), level = "debug")]
    pub fn mutate_on_at<M>(
        &mut self,
        address: AddressRef,
        message_processor: impl for<'a> Fn(&'a mut State, &'a mut MessageContext<M>) -> FutureBox
            + Send
            + Sync
            + 'static,
    ) -> &mut Self
    where
        M: Payload + Clone,
    {
        self.handler_for::<M>(Some(address), message_processor)
    }

    fn handler_for<M>(
        &mut self,
        target: Option<AddressRef>,
        message_processor: impl for<'a> Fn(&'a mut State, &'a mut MessageContext<M>) -> FutureBox
            + Send
            + Sync
            + 'static,
    ) -> &mut Self
    where
        M: Payload + Clone,
    {
        let type_id = TypeId::of::<M>();
        trace!(type_name = std::any::type_name::<M>(), type_id = ?type_id, "Adding message handler");
        let callee: HandlerFn = Arc::new(
            move |cell: &mut ActorCell, envelope: &Envelope| -> FutureBox {
                let Some(concrete) = envelope.message.as_any().downcast_ref::<M>() else {
                    // Dispatch guarantees the payload type matches the
                    // handler's accepted type; anything else is a bug.
                    error!(
                        type_name = std::any::type_name::<M>(),
                        "Message handler invoked with incompatible payload type"
                    );
                    panic!(
                        "handler for {} invoked with a different payload type",
                        std::any::type_name::<M>()
                    );
                };
                let mut context = MessageContext {
                    message: concrete.clone(),
                    timestamp: envelope.timestamp,
                    target: envelope.target.clone(),
                    actor: cell.link(),
                };
                let state = cell.agent_mut::<State>();
                message_processor(state, &mut context)
            },
        );
        self.handlers.push(HandlerSpec {
            accepts: type_id,
            accepts_name: std::any::type_name::<M>(),
            target,
            callee,
        });
        self
    }

    /// Crate-internal: materializes the cell for adoption by `supervisor`.
    pub(crate) fn build(self, supervisor: &SupervisorHandle) -> (ActorCell, ActorRef) {
        let actor_id = next_actor_id();
        let primary = supervisor.create_address();
        let link = supervisor.link();

        let points: Vec<SubscriptionPoint> = self
            .handlers
            .into_iter()
            .map(|spec| {
                let handler = Handler::user(
                    spec.accepts,
                    spec.accepts_name,
                    actor_id,
                    primary.clone(),
                    link.clone(),
                    spec.callee,
                );
                let address = spec.target.unwrap_or_else(|| primary.clone());
                SubscriptionPoint::new(handler, address)
            })
            .collect();

        let mut plugins: Vec<Box<dyn Plugin>> = Vec::with_capacity(self.plugins.len() + 2);
        plugins.push(Box::<LifetimePlugin>::default());
        plugins.push(Box::new(SubscriberPlugin::with_points(points.clone())));
        plugins.extend(self.plugins);
        let identities: Vec<_> = plugins.iter().map(|p| p.identity()).collect();

        let (core, state_rx) = ActorCore::new(
            actor_id,
            link,
            supervisor.executor.clone(),
            supervisor.requests.clone(),
            primary.clone(),
            &self.config,
            &identities,
        );
        trace!(actor = actor_id, address = primary.id(), "Actor cell built");
        let cell = ActorCell::new(core, plugins, Box::new(self.state));
        let actor_ref = ActorRef::new(actor_id, primary, state_rx, points);
        (cell, actor_ref)
    }
}
