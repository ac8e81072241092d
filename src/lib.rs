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

#![forbid(unsafe_code)]
#![forbid(missing_docs)] // Keep this to enforce coverage

//! # Praxis
//!
//! This crate is the core of a supervised actor runtime, built on top of
//! Tokio. Actors communicate only by asynchronous messages delivered through
//! addresses owned by supervisors; each supervisor pumps its inbound queue
//! serially on one executor task, so actor state is never touched from two
//! places at once.
//!
//! ## Key Concepts
//!
//! - **Supervisors (`Supervisor`, `SupervisorHandle`)**: Root-of-tree actors
//!   owning the inbound queue, the per-address subscription table, child
//!   actors, timers, and the request registry.
//! - **Actors (`ActorBuilder`, `ActorRef`)**: State plus handlers plus an
//!   ordered plugin chain, adopted by a supervisor through a create-actor
//!   message and driven through the NEW → INITIALIZING → INITIALIZED →
//!   OPERATIONAL → SHUTTING_DOWN → SHUT_DOWN lifecycle.
//! - **Plugins (`Plugin`)**: Composable lifecycle fragments that can pause and
//!   resume each phase; the built-in subscriber and lifetime plugins give
//!   every actor its default subscription behavior.
//! - **Subscriptions**: (handler, address) points, including *foreign* points
//!   whose address is owned by another supervisor, established and torn down
//!   through a two-party confirmation protocol.
//! - **Requests (`Requestable`, `Request`, `Response`)**: Correlated
//!   request/response messaging with per-request timeouts; failures arrive as
//!   synthetic error responses, never as out-of-band panics.
//! - **Executor (`Executor`, `TokioExecutor`)**: The narrow event-loop
//!   contract supervisors are driven by.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use praxis::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct Greet(String);
//!
//! # async fn demo() {
//! let executor = TokioExecutor::new();
//! let supervisor = Supervisor::spawn(SupervisorConfig::new(
//!     std::time::Duration::from_secs(5),
//!     executor.clone(),
//! ));
//!
//! let mut greeter = ActorBuilder::<()>::new();
//! greeter.mutate_on::<Greet>(|_state, context| {
//!     println!("hello, {}", context.message.0);
//!     Reply::ready()
//! });
//! let actor = supervisor.spawn_actor(greeter);
//!
//! actor.address().send(Greet("world".into()));
//! # }
//! ```

/// Internal utilities and structures used throughout the runtime.
pub(crate) mod common;

/// Defines the core actor structures and logic.
pub(crate) mod actor;

/// Defines message types and envelopes used for communication.
pub(crate) mod message;

/// Defines the plugin model for composable lifecycles.
pub(crate) mod plugin;

/// Defines core traits used throughout the runtime.
pub(crate) mod traits;

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## External Crates
/// *   [`async_trait::async_trait`](https://docs.rs/async-trait): The macro for defining async functions in traits.
///
/// ## Core Types
/// *   [`crate::actor::ActorBuilder`]: Configuration for new actors.
/// *   [`crate::actor::ActorRef`]: External reference to a spawned actor.
/// *   [`crate::actor::ActorState`]: The lifecycle states.
/// *   [`crate::actor::Supervisor`] / [`crate::actor::SupervisorHandle`]: The queue owner and its handle.
/// *   [`crate::common::Executor`] / [`crate::common::TokioExecutor`]: The event-loop contract.
/// *   [`crate::common::Reply`]: Standard handler return values.
/// *   [`crate::message::Address`] / [`crate::message::AddressRef`]: Message destinations.
/// *   [`crate::message::Request`] / [`crate::message::Response`]: Correlated messaging.
/// *   [`crate::plugin::Plugin`]: The lifecycle fragment contract.
/// *   [`crate::traits::Payload`]: Marker trait for all valid payloads.
pub mod prelude {
    // External crate re-exports
    pub use async_trait::async_trait;

    // Core types
    pub use crate::actor::{
        service_registry, ActorBuilder, ActorConfig, ActorCore, ActorLink, ActorRef, ActorState,
        ServiceRegistry, Supervisor, SupervisorConfig, SupervisorHandle, UnlinkPolicy,
    };
    pub use crate::common::{
        BoxedTask, Executor, FutureBox, Handler, HandlerRef, Reply, SubscriptionPoint,
        TimerHandle, TokioExecutor,
    };
    pub use crate::message::{
        ActorError, Address, AddressRef, CommitUnsubscription, Completion, DeregistrationNotify,
        DeregistrationService, DiscoveryReply, DiscoveryRequest, Envelope, ExternalSubscription,
        ExternalUnsubscription, InitializeActor, InitializeConfirmation, LinkRequest,
        LinkResponse, MessageContext, PluginActivated, PluginDeactivated, RegistrationRequest,
        RegistrationResponse, Request, RequestBuilder, Requestable, Response,
        ShutdownConfirmation, ShutdownRequest, ShutdownTrigger, StartActor, StateRequest,
        StateResponse, Subscribe, SubscriptionConfirmed, UnlinkNotify, UnlinkRequest, Unsubscribe,
        UnsubscriptionConfirmed,
    };
    pub use crate::plugin::{
        LifetimePlugin, Plugin, PluginIdentity, PollOutcome, Slot, SubscriberPlugin,
    };
    pub use crate::traits::{HandleInterface, Payload};
}
