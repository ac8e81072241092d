//! Defines message structures, addressing, envelopes, and the system payloads.
//!
//! This module provides the components actors communicate through. It includes
//! the supervisor-owned [`Address`], the internal [`Envelope`] used on
//! supervisor queues, the request/response correlation types, and the catalogue
//! of system payloads driving lifecycle orchestration and the subscription
//! protocol.
//!
//! # Key Components
//!
//! *   [`Address`] / [`AddressRef`]: a stable, supervisor-owned identity that
//!     messages are sent to.
//! *   [`Envelope`]: the shared-payload wrapper travelling on supervisor queues.
//! *   [`Request`] / [`Response`] / [`Requestable`]: correlated request/response
//!     messaging with per-request timeouts.
//! *   [`MessageContext`]: the typed view of a dispatched message handed to
//!     user handlers.
//! *   System payloads ([`system`]): create-actor, initialize/start/shutdown,
//!     subscription housekeeping, state queries, and the registry protocol.

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
pub use address::{Address, AddressRef};
pub use envelope::Envelope;
pub use message_context::MessageContext;
pub use message_error::ActorError;
pub use request::{Request, RequestBuilder, Requestable, Response};
pub use system::{
    CommitUnsubscription, Completion, CreateActor, CreateSupervisor, DeregistrationNotify,
    DeregistrationService, DiscoveryReply, DiscoveryRequest, ExternalSubscription,
    ExternalUnsubscription, HandlerCall, InitializeActor, InitializeConfirmation, LinkRequest,
    LinkResponse, PluginActivated, PluginDeactivated, RegistrationRequest, RegistrationResponse,
    ShutdownConfirmation, ShutdownRequest, ShutdownTrigger, StartActor, StateRequest,
    StateResponse, Subscribe, SubscriptionConfirmed, UnlinkNotify, UnlinkRequest, Unsubscribe,
    UnsubscriptionConfirmed,
};

// --- Crate-Internal Re-exports ---
pub(crate) use request::ResponseFrame;
pub(crate) use system::{CellSlot, RequestTimedOut};

// --- Submodules ---

/// Defines [`Address`].
mod address;
/// Defines the internal [`Envelope`] used for queue transmission.
mod envelope;
/// Defines [`MessageContext`] passed to message handlers.
mod message_context;
/// Defines [`ActorError`].
mod message_error;
/// Defines request/response correlation types.
mod request;
/// Defines the system payload catalogue.
pub mod system;
