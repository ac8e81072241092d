//! The plugin model: composable lifecycle fragments attached to actors.
//!
//! A plugin participates in an actor's initialization, shutdown, and
//! subscription acknowledgement flow. Each plugin registers itself into zero
//! or more of the four slots (INIT, SHUTDOWN, SUBSCRIPTION, UNSUBSCRIPTION)
//! during activation; the actor's state machine then consults the slots as
//! lifecycle messages arrive:
//!
//! * the init chain is *prefix-drained*: while the front plugin's
//!   [`Plugin::handle_init`] returns `true` it is popped, and initialization
//!   completes when the chain is empty;
//! * the shutdown chain drains symmetrically from the *back*, so shutdown
//!   unwinds in the reverse order of init completion;
//! * subscription and unsubscription confirmations are *polled* across their
//!   slot in reverse insertion order, where each plugin ignores, consumes, or
//!   finishes (removes itself and lets polling continue).
//!
//! The built-in [`SubscriberPlugin`] and [`LifetimePlugin`] give every actor
//! its default behavior: handlers declared on the builder are subscribed
//! before init completes, and every confirmed subscription is drained again
//! before shutdown completes.

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

use std::any::TypeId;
use std::fmt;

use crate::actor::ActorCore;
use crate::common::SubscriptionPoint;

// --- Public Re-exports ---
pub use lifetime::LifetimePlugin;
pub use subscriber::SubscriberPlugin;

/// Defines the [`LifetimePlugin`].
mod lifetime;
/// Defines the [`SubscriberPlugin`].
mod subscriber;

/// The stable identity of a plugin: its concrete type.
///
/// Identity is what the activation and deactivation tracking sets hold, and
/// what the four slot lists refer to.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginIdentity {
    type_id: TypeId,
    name: &'static str,
}

impl PluginIdentity {
    /// Returns the identity of plugin type `P`.
    #[must_use]
    pub fn of<P: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            name: std::any::type_name::<P>(),
        }
    }

    /// Human-readable name of the plugin type.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for PluginIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for PluginIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The four per-actor slots a plugin can register into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Consulted by the prefix-drained init chain.
    Init,
    /// Consulted by the back-drained shutdown chain.
    Shutdown,
    /// Polled when a subscription confirmation arrives.
    Subscription,
    /// Polled when an unsubscription confirmation arrives.
    Unsubscription,
}

/// Result of polling one plugin in the subscription or unsubscription slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Not this plugin's concern; continue with the next (earlier) plugin.
    Ignored,
    /// The message is handled; stop polling.
    Consumed,
    /// The plugin is done with this slot: remove it and continue polling.
    Finished,
}

/// A lifecycle fragment owned by an actor.
///
/// Plugins run synchronously on the owning supervisor's pump. A plugin whose
/// activation or deactivation involves off-pump work commits later by posting
/// [`PluginActivated`](crate::message::PluginActivated) /
/// [`PluginDeactivated`](crate::message::PluginDeactivated) to the actor's
/// primary address; the defaults commit synchronously, which is what plain
/// plugins want.
pub trait Plugin: Send + fmt::Debug + 'static {
    /// The stable identity of this plugin.
    fn identity(&self) -> PluginIdentity;

    /// Called once when the owning actor activates its chain. Installs slots,
    /// issues subscriptions, and commits activation.
    fn activate(&mut self, actor: &mut ActorCore) {
        let identity = self.identity();
        actor.commit_plugin_activation(identity, true);
    }

    /// Called once, in reverse chain order, when the actor begins teardown.
    /// Commits deactivation when the plugin's own teardown is complete.
    fn deactivate(&mut self, actor: &mut ActorCore) {
        let identity = self.identity();
        actor.commit_plugin_deactivation(identity);
    }

    /// Consulted while this plugin is at the front of the init chain.
    ///
    /// Return `true` to declare "done, remove me from the chain"; `false` to
    /// hold initialization until an external event re-drives the chain.
    fn handle_init(&mut self, actor: &mut ActorCore) -> bool {
        let _ = actor;
        true
    }

    /// Consulted while this plugin is at the back of the shutdown chain;
    /// symmetric to [`Plugin::handle_init`].
    fn handle_shutdown(&mut self, actor: &mut ActorCore) -> bool {
        let _ = actor;
        true
    }

    /// Polled when a subscription confirmation for the owning actor arrives.
    fn handle_subscription(
        &mut self,
        actor: &mut ActorCore,
        point: &SubscriptionPoint,
    ) -> PollOutcome {
        let _ = (actor, point);
        PollOutcome::Ignored
    }

    /// Polled when an unsubscription confirmation for the owning actor
    /// arrives.
    fn handle_unsubscription(
        &mut self,
        actor: &mut ActorCore,
        point: &SubscriptionPoint,
    ) -> PollOutcome {
        let _ = (actor, point);
        PollOutcome::Ignored
    }
}
