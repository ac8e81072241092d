//! Defines the core components for creating, configuring, and managing actors.
//!
//! This module provides the fundamental building blocks of the runtime. It
//! encapsulates the actor lifecycle state machine, the supervisor that owns
//! and pumps actors, and the builder actors are configured through.
//!
//! # Key Components
//!
//! *   [`Supervisor`] / [`SupervisorHandle`]: the root-of-tree actor owning
//!     the inbound queue, subscription table, child actors, and request
//!     registry.
//! *   [`ActorBuilder`]: configures state, handlers, plugins, and timeouts
//!     before an actor is adopted.
//! *   [`ActorCore`] / [`ActorState`]: the lifecycle state machine every
//!     actor (supervisors included) runs.
//! *   [`ActorRef`]: the external reference to a spawned actor with its
//!     observable state.
//! *   [`service_registry`]: the name → address directory service actor.

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

// --- Public Re-exports ---
pub use actor_config::{
    ActorConfig, SupervisorConfig, UnlinkPolicy, DEFAULT_INIT_TIMEOUT, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use builder::ActorBuilder;
pub use cell::ActorCell;
pub use lifecycle::{ActorCore, ActorLink, ActorState};
pub use registry::{service_registry, ServiceRegistry};
pub use supervisor::{ActorRef, Supervisor, SupervisorHandle};

/// Contains [`ActorConfig`] and [`SupervisorConfig`].
mod actor_config;
/// Contains the [`ActorBuilder`].
mod builder;
/// Contains the [`ActorCell`].
mod cell;
/// Contains the lifecycle state machine ([`ActorCore`], [`ActorState`]).
mod lifecycle;
/// Contains the directory service actor.
mod registry;
/// Contains the [`Supervisor`] and its handles.
mod supervisor;
