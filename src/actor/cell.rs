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

use std::any::Any;
use std::fmt;

use tracing::trace;

use crate::actor::lifecycle::{ActorCore, ActorLink, ActorState, RequestToken};
use crate::common::SubscriptionPoint;
use crate::plugin::{Plugin, PluginIdentity, PollOutcome};

/// A constructed actor as its supervisor owns it: the lifecycle core, the
/// ordered plugin chain, and the type-erased user state.
///
/// The chain lives next to the core rather than inside it so a plugin can be
/// handed `&mut ActorCore` while the chain is being iterated. All methods run
/// on the owning supervisor's pump.
pub struct ActorCell {
    pub(crate) core: ActorCore,
    pub(crate) plugins: Vec<Box<dyn Plugin>>,
    agent: Box<dyn Any + Send>,
}

impl fmt::Debug for ActorCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorCell")
            .field("core", &self.core)
            .field("plugins", &self.plugins)
            .finish()
    }
}

impl ActorCell {
    pub(crate) fn new(
        core: ActorCore,
        plugins: Vec<Box<dyn Plugin>>,
        agent: Box<dyn Any + Send>,
    ) -> Self {
        Self {
            core,
            plugins,
            agent,
        }
    }

    /// Messaging facilities for handler contexts.
    pub(crate) fn link(&self) -> ActorLink {
        self.core.link()
    }

    /// The typed user state. A mismatch means a handler was wired to the
    /// wrong cell, which is a protocol violation.
    pub(crate) fn agent_mut<State: 'static>(&mut self) -> &mut State {
        self.agent
            .downcast_mut::<State>()
            .expect("handler invoked against an actor with a different state type")
    }

    /// Runs every plugin's `activate` in chain order. Returns `false` when
    /// some plugin committed failure, in which case the caller begins the
    /// rollback with [`ActorCell::deactivate_plugins`].
    pub(crate) fn activate_plugins(&mut self) -> bool {
        let Self { core, plugins, .. } = self;
        for plugin in plugins.iter_mut() {
            plugin.activate(core);
        }
        !core.activation_failed
    }

    /// Runs every plugin's `deactivate` in reverse chain order, populating the
    /// deactivation tracking set as it goes. Idempotent: rollback and regular
    /// shutdown may both land here.
    pub(crate) fn deactivate_plugins(&mut self) {
        if self.core.plugins_deactivated {
            return;
        }
        self.core.plugins_deactivated = true;
        let Self { core, plugins, .. } = self;
        for plugin in plugins.iter_mut().rev() {
            core.deactivating_plugins.insert(plugin.identity());
            plugin.deactivate(core);
        }
    }

    /// Prefix-drains the init chain: while the front plugin declares itself
    /// done it is popped; the first refusal pauses initialization until an
    /// external event re-drives the chain. An empty chain confirms the
    /// pending init request.
    pub(crate) fn init_continue(&mut self) {
        debug_assert_eq!(self.core.state(), ActorState::Initializing);
        if !self.core.activating_plugins.is_empty() || self.core.activation_failed {
            return;
        }
        let Self { core, plugins, .. } = self;
        while let Some(identity) = core.init_chain.front().copied() {
            let plugin = find_plugin(plugins, identity);
            if plugin.handle_init(core) {
                core.init_chain.pop_front();
            } else {
                trace!(actor = core.id(), plugin = %identity, "Init chain paused");
                break;
            }
        }
        if core.init_chain.is_empty() && core.init_pending() {
            core.init_finish();
        }
    }

    /// Drains the shutdown chain from the back (shutdown unwinds in the
    /// reverse order of init completion). Shutdown finalizes once the chain is
    /// empty and every plugin has acknowledged deactivation.
    pub(crate) fn shutdown_continue(&mut self) {
        debug_assert_eq!(self.core.state(), ActorState::ShuttingDown);
        let Self { core, plugins, .. } = self;
        while let Some(identity) = core.shutdown_chain.back().copied() {
            let plugin = find_plugin(plugins, identity);
            if plugin.handle_shutdown(core) {
                core.shutdown_chain.pop_back();
            } else {
                trace!(actor = core.id(), plugin = %identity, "Shutdown chain paused");
                break;
            }
        }
        if core.shutdown_chain.is_empty() && core.deactivating_plugins.is_empty() {
            core.shutdown_finish();
        }
    }

    /// Polls the subscription slot in reverse insertion order with the
    /// confirmed point. Plugins may mutate the slot while the poll runs; the
    /// snapshot-and-recheck keeps iteration sound.
    pub(crate) fn poll_subscription(&mut self, point: &SubscriptionPoint) {
        let snapshot = self.core.subscription_slot.clone();
        let Self { core, plugins, .. } = self;
        for identity in snapshot.into_iter().rev() {
            if !core.subscription_slot.contains(&identity) {
                continue;
            }
            let plugin = find_plugin(plugins, identity);
            match plugin.handle_subscription(core, point) {
                PollOutcome::Ignored => {}
                PollOutcome::Consumed => break,
                PollOutcome::Finished => {
                    if let Some(index) =
                        core.subscription_slot.iter().position(|i| *i == identity)
                    {
                        core.subscription_slot.remove(index);
                    }
                }
            }
        }
    }

    /// Polls the unsubscription slot in reverse insertion order; same
    /// mutation rules as [`ActorCell::poll_subscription`].
    pub(crate) fn poll_unsubscription(&mut self, point: &SubscriptionPoint) {
        let snapshot = self.core.unsubscription_slot.clone();
        let Self { core, plugins, .. } = self;
        for identity in snapshot.into_iter().rev() {
            if !core.unsubscription_slot.contains(&identity) {
                continue;
            }
            let plugin = find_plugin(plugins, identity);
            match plugin.handle_unsubscription(core, point) {
                PollOutcome::Ignored => {}
                PollOutcome::Consumed => break,
                PollOutcome::Finished => {
                    if let Some(index) = core
                        .unsubscription_slot
                        .iter()
                        .position(|i| *i == identity)
                    {
                        core.unsubscription_slot.remove(index);
                    }
                }
            }
        }
    }

    /// Entry point for an arriving init request.
    pub(crate) fn handle_init_request(&mut self, token: RequestToken) {
        self.core.init_start(token);
        if self.core.activation_failed {
            self.core.init_fail();
            self.begin_shutdown(None);
        } else {
            self.init_continue();
        }
    }

    /// Entry point for an arriving shutdown request or trigger.
    pub(crate) fn begin_shutdown(&mut self, token: Option<RequestToken>) {
        if self.core.state() >= ActorState::ShuttingDown {
            trace!(actor = self.core.id(), "Duplicate shutdown request ignored");
            return;
        }
        self.core.shutdown_start(token);
        self.deactivate_plugins();
        self.shutdown_continue();
    }

    /// An asynchronous plugin activation commit arrived.
    pub(crate) fn plugin_activated(&mut self, identity: PluginIdentity, success: bool) {
        self.core.commit_plugin_activation(identity, success);
        if !success {
            self.core.init_fail();
            if self.core.state() >= ActorState::ShuttingDown {
                // Rollback already in progress; nothing further to drive.
                return;
            }
            self.core.shutdown_start(None);
            self.deactivate_plugins();
            self.shutdown_continue();
        } else if self.core.state() == ActorState::Initializing && self.core.init_pending() {
            self.init_continue();
        }
    }

    /// An asynchronous plugin deactivation commit arrived.
    pub(crate) fn plugin_deactivated(&mut self, identity: PluginIdentity) {
        self.core.commit_plugin_deactivation(identity);
        if self.core.state() == ActorState::ShuttingDown {
            self.shutdown_continue();
        }
    }
}

/// Locates a plugin by identity. A slot entry without a matching plugin in the
/// chain is a protocol violation.
fn find_plugin(
    plugins: &mut [Box<dyn Plugin>],
    identity: PluginIdentity,
) -> &mut Box<dyn Plugin> {
    plugins
        .iter_mut()
        .find(|p| p.identity() == identity)
        .unwrap_or_else(|| panic!("slot references unknown plugin {identity}"))
}
