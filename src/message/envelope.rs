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

use std::sync::Arc;
use std::time::SystemTime;

use static_assertions::assert_impl_all;

use crate::message::address::AddressRef;
use crate::traits::Payload;

/// Represents an envelope that carries a message through the actor system.
///
/// The payload is shared (`Arc`), so forwarding a message to a handler on
/// another supervisor never copies the payload itself. The payload's concrete
/// type is fixed at construction; dispatch resolves handlers by that type.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// The type-erased payload contained in the envelope.
    pub message: Arc<dyn Payload>,
    /// The time when the message was sent.
    pub timestamp: SystemTime,
    /// The destination address; its owner is the supervisor that dispatches.
    pub target: AddressRef,
}

impl Envelope {
    /// Creates a new envelope with the specified payload and destination.
    pub fn new(message: Arc<dyn Payload>, target: AddressRef) -> Self {
        let timestamp = SystemTime::now();
        Envelope {
            message,
            target,
            timestamp,
        }
    }
}

// Ensures that Envelope implements the Send trait.
assert_impl_all!(Envelope: Send);
