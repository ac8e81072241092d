//! Internal utilities and structures used throughout the runtime.
//!
//! This module hosts the supervisor-side machinery that is not itself an
//! actor-facing surface: the executor contract, the handler and subscription
//! bookkeeping, the request correlation registry, and the shared type aliases.

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
pub use executor::{Executor, TimerHandle, TokioExecutor};
pub use handler::{Handler, HandlerRef, SubscriptionPoint};
pub use reply::Reply;
pub use request_registry::RequestRegistry;
pub use types::{BoxedTask, FutureBox};

// --- Crate-Internal Re-exports ---
pub(crate) use handler::{HandlerKind, LifecycleOp, SupervisorLink};
pub(crate) use subscription::SubscriptionTable;
pub(crate) use types::{HandlerFn, SupervisorReceiver, SupervisorSender};

// --- Submodules ---

/// Defines the [`Executor`] contract and the Tokio-backed implementation.
mod executor;
/// Defines [`Handler`] and [`SubscriptionPoint`].
mod handler;
/// Defines the [`Reply`] helpers for handler return values.
mod reply;
/// Defines the [`RequestRegistry`].
mod request_registry;
/// Defines the per-supervisor subscription table.
mod subscription;
/// Defines common internal type aliases.
mod types;
