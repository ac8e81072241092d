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

use tracing::trace;

use crate::actor::ActorCore;
use crate::common::SubscriptionPoint;
use crate::plugin::{Plugin, PluginIdentity, PollOutcome, Slot};

/// Built-in plugin that owns the actor's subscription footprint.
///
/// Every confirmed subscription point of the actor is recorded here. When the
/// actor shuts down, the plugin issues an unsubscription for each recorded
/// point and holds the shutdown chain until all of them are confirmed gone, so
/// no handler of a dying actor remains reachable through any table.
#[derive(Debug, Default)]
pub struct LifetimePlugin {
    points: Vec<SubscriptionPoint>,
    draining: bool,
}

impl Plugin for LifetimePlugin {
    fn identity(&self) -> PluginIdentity {
        PluginIdentity::of::<Self>()
    }

    fn activate(&mut self, actor: &mut ActorCore) {
        actor.install_plugin(self.identity(), Slot::Shutdown);
        actor.install_plugin(self.identity(), Slot::Subscription);
        actor.install_plugin(self.identity(), Slot::Unsubscription);
        actor.commit_plugin_activation(self.identity(), true);
    }

    fn handle_shutdown(&mut self, actor: &mut ActorCore) -> bool {
        if self.points.is_empty() {
            return true;
        }
        if !self.draining {
            self.draining = true;
            trace!(
                actor = actor.id(),
                points = self.points.len(),
                "Draining subscriptions for shutdown"
            );
            for point in &self.points {
                actor.unsubscribe(point.clone(), None);
            }
        }
        false
    }

    fn handle_subscription(
        &mut self,
        _actor: &mut ActorCore,
        point: &SubscriptionPoint,
    ) -> PollOutcome {
        if !self.points.contains(point) {
            self.points.push(point.clone());
        }
        PollOutcome::Consumed
    }

    fn handle_unsubscription(
        &mut self,
        actor: &mut ActorCore,
        point: &SubscriptionPoint,
    ) -> PollOutcome {
        let Some(index) = self.points.iter().position(|p| p == point) else {
            return PollOutcome::Ignored;
        };
        self.points.remove(index);
        trace!(
            actor = actor.id(),
            remaining = self.points.len(),
            "Subscription drained"
        );
        if self.draining && self.points.is_empty() {
            PollOutcome::Finished
        } else {
            PollOutcome::Consumed
        }
    }
}
