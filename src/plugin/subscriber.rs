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

use std::collections::HashSet;

use tracing::trace;

use crate::actor::ActorCore;
use crate::common::SubscriptionPoint;
use crate::plugin::{Plugin, PluginIdentity, PollOutcome, Slot};

/// Built-in plugin that wires up the handlers declared on the actor builder.
///
/// During activation it issues a subscription for every pre-declared point and
/// holds the init chain until each one has been confirmed by the owning
/// supervisor of its address. Points targeting a foreign address ride the
/// external subscription protocol transparently, so an actor is only reported
/// initialized once even its cross-supervisor handlers are live.
#[derive(Debug, Default)]
pub struct SubscriberPlugin {
    points: Vec<SubscriptionPoint>,
    pending: HashSet<(u64, u64)>,
}

impl SubscriberPlugin {
    /// Crate-internal: created by the spawn path with the builder's points.
    pub(crate) fn with_points(points: Vec<SubscriptionPoint>) -> Self {
        Self {
            points,
            pending: HashSet::new(),
        }
    }
}

impl Plugin for SubscriberPlugin {
    fn identity(&self) -> PluginIdentity {
        PluginIdentity::of::<Self>()
    }

    fn activate(&mut self, actor: &mut ActorCore) {
        actor.install_plugin(self.identity(), Slot::Init);
        actor.install_plugin(self.identity(), Slot::Subscription);
        for point in &self.points {
            self.pending.insert(point.key());
            actor.subscribe(point.clone());
        }
        trace!(
            actor = actor.id(),
            points = self.points.len(),
            "Subscriber plugin issued initial subscriptions"
        );
        actor.commit_plugin_activation(self.identity(), true);
    }

    fn handle_init(&mut self, _actor: &mut ActorCore) -> bool {
        self.pending.is_empty()
    }

    fn handle_subscription(
        &mut self,
        actor: &mut ActorCore,
        point: &SubscriptionPoint,
    ) -> PollOutcome {
        if !self.pending.remove(&point.key()) {
            return PollOutcome::Ignored;
        }
        trace!(
            actor = actor.id(),
            remaining = self.pending.len(),
            "Initial subscription confirmed"
        );
        if self.pending.is_empty() {
            // All initial points are live; later confirmations belong to the
            // lifetime plugin alone.
            PollOutcome::Finished
        } else {
            // Let the poll continue so the lifetime plugin records the point.
            PollOutcome::Ignored
        }
    }
}
