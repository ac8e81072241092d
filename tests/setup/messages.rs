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
use std::time::Duration;

use praxis::prelude::*;

/// A request payload used by the request/response tests.
#[derive(Debug, Clone)]
pub struct Ping;

/// The reply to [`Ping`].
#[derive(Debug, Clone)]
pub struct Pong;

impl Requestable for Ping {
    type Reply = Pong;
}

/// A plain broadcastable payload carrying a word.
#[derive(Debug, Clone)]
pub struct Word(pub String);

/// A plain payload carrying a sequence number, for ordering tests.
#[derive(Debug, Clone)]
pub struct Number(pub u32);

/// Asks the receiving actor to issue a [`Ping`] request to `target`.
#[derive(Debug, Clone)]
pub struct IssuePing {
    pub target: AddressRef,
    pub timeout: Duration,
}

/// Asks the receiving actor to query `subject`'s lifecycle state from the
/// supervisor owning it.
#[derive(Debug, Clone)]
pub struct QueryState {
    pub supervisor: AddressRef,
    pub subject: AddressRef,
}

/// Asks the receiving actor to register a service with the registry.
#[derive(Debug, Clone)]
pub struct RegisterService {
    pub registry: AddressRef,
    pub name: String,
    pub addr: AddressRef,
}

/// Asks the receiving actor to discover a service by name.
#[derive(Debug, Clone)]
pub struct DiscoverService {
    pub registry: AddressRef,
    pub name: String,
}

/// Asks the receiving actor to request its own shutdown.
#[derive(Debug, Clone)]
pub struct PoisonPill;
