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

//! Defines common internal type aliases used within the runtime.
//!
//! This module centralizes type definitions for futures, handler closures, and
//! the supervisor queue channel halves to improve code readability and
//! maintainability.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::actor::ActorCell;
use crate::message::Envelope;

/// Type alias for a pinned, boxed, dynamically dispatched future with
/// `Output = ()` that is `Send`, `Sync`, and `'static`.
///
/// This is the required return type for asynchronous message handlers. The
/// handler closure itself runs synchronously against the actor state; the
/// returned future carries any follow-up async work and is awaited to
/// completion by the pump before the next message is dispatched.
pub type FutureBox = Pin<Box<dyn Future<Output = ()> + Send + Sync + 'static>>;

/// Type alias for a boxed future handed to an [`Executor`](crate::common::Executor).
pub type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Crate-internal: the type-erased invocation target of a user handler.
///
/// The closure downcasts the envelope payload to the handler's accepted type
/// (a mismatch is a protocol violation and fatal), mutates the actor state
/// synchronously, and returns a future for any async follow-up.
pub(crate) type HandlerFn = std::sync::Arc<
    dyn for<'a, 'b> Fn(&'a mut ActorCell, &'b Envelope) -> FutureBox + Send + Sync + 'static,
>;

/// Crate-internal: sender half of a supervisor's inbound queue.
///
/// The queue is the unbounded flavor: it is the only cross-thread shared
/// mutable state in the system, and senders frequently run inside another
/// supervisor's pump, where blocking on a full bounded channel could deadlock
/// two supervisors against each other.
pub(crate) type SupervisorSender = UnboundedSender<Envelope>;

/// Crate-internal: receiver half of a supervisor's inbound queue.
pub(crate) type SupervisorReceiver = UnboundedReceiver<Envelope>;
