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
use tokio::sync::mpsc::UnboundedSender;

/// Agent state that relays observations back to the test body over a channel.
///
/// Tests construct it with `ActorBuilder::with_state` so the sender half is
/// wired before the actor starts.
#[derive(Debug, Default)]
pub struct Relay {
    pub events: Option<UnboundedSender<String>>,
}

impl Relay {
    /// Emits one observation; panics if the test side is gone, which makes a
    /// leaked actor fail its test loudly.
    pub fn emit(&self, event: impl Into<String>) {
        self.events
            .as_ref()
            .expect("relay actor started without an event channel")
            .send(event.into())
            .expect("test receiver dropped");
    }
}

/// Minimal agent state for actors that only exercise lifecycle plumbing.
#[derive(Debug, Default)]
pub struct Blackhole;
