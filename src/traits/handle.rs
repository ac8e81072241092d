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
use async_trait::async_trait;

use crate::message::AddressRef;
use crate::traits::Payload;

/// The core interface for interacting with a running supervisor from outside
/// its pump.
///
/// Handles are cheap to clone and safe to share across threads; every method
/// routes through the supervisor's inbound queue, so no caller ever touches
/// supervisor state directly.
#[async_trait]
pub trait HandleInterface: Send + Sync {
    /// Returns the unique numeric identity of the supervisor behind this handle.
    fn id(&self) -> u64;

    /// Returns the supervisor's primary [`AddressRef`].
    ///
    /// System messages (create-actor, shutdown triggers, subscription
    /// housekeeping) are delivered to this address.
    fn address(&self) -> &AddressRef;

    /// Mints a fresh address owned by this supervisor.
    ///
    /// The address has a stable identity for its lifetime and is destroyed when
    /// the last strong reference to it is released.
    fn create_address(&self) -> AddressRef;

    /// Enqueues `message` for the given address.
    ///
    /// Delivery order is guaranteed per (sender supervisor, destination
    /// address) pair.
    fn post(&self, target: &AddressRef, message: impl Payload)
    where
        Self: Sized;

    /// Initiates a graceful shutdown of the supervisor and waits until it has
    /// reached its terminal state.
    ///
    /// # Errors
    ///
    /// Returns an error if the supervisor's state can no longer be observed,
    /// which indicates the pump was torn down uncleanly.
    async fn stop(&self) -> anyhow::Result<()>;
}
