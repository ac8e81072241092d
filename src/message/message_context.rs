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

use std::time::SystemTime;

use crate::actor::ActorLink;
use crate::message::address::AddressRef;

/// The typed view of a dispatched message handed to a user handler.
///
/// Produced by the dispatch machinery after downcasting the envelope's payload
/// to the handler's accepted type. Besides the payload it carries the address
/// the message was delivered to and an [`ActorLink`] for the receiving actor,
/// through which the handler sends messages, issues requests, or asks for its
/// own shutdown.
#[derive(Debug)]
pub struct MessageContext<M> {
    /// The concrete message payload.
    pub message: M,
    /// The time when the message was sent.
    pub timestamp: SystemTime,
    /// The address this message was delivered to.
    pub target: AddressRef,
    /// Messaging facilities of the actor owning the invoked handler.
    pub actor: ActorLink,
}
