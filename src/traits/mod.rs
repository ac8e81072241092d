//! Defines the core traits that establish the fundamental contracts of the runtime.
//!
//! This module aggregates the essential traits that define the capabilities and
//! interactions within the actor system. These traits ensure composability and
//! provide a clear interface for payloads and supervisor handles.
//!
//! # Key Traits
//!
//! *   [`Payload`]: A marker trait required for all types carried inside message
//!     envelopes. Ensures payloads are `Send`, `Sync`, `Debug`, `Clone`, and
//!     support downcasting via `Any`.
//! *   [`HandleInterface`]: Defines the primary interface for interacting with
//!     supervisors via their handles ([`SupervisorHandle`](crate::actor::SupervisorHandle)),
//!     including minting addresses, posting messages, and stopping the pump.

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
pub use handle::HandleInterface;
pub use payload::Payload;

/// Defines the [`HandleInterface`] trait for supervisor interaction.
mod handle;
/// Defines the [`Payload`] marker trait.
mod payload;
