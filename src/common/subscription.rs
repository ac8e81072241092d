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
use std::collections::HashMap;

use tracing::trace;

use crate::common::handler::{HandlerRef, SubscriptionPoint};

/// Crate-internal: the per-supervisor subscription table.
///
/// Maps address identity → payload type → the handlers subscribed to that
/// (address, type) pair, in insertion order. Dispatch invokes handlers in the
/// same order.
///
/// Uses `HashMap` instead of `DashMap` because the table is owned by a single
/// supervisor and only ever touched from its pump, which runs on one task.
/// This eliminates unnecessary atomic synchronization.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionTable {
    rows: HashMap<u64, HashMap<TypeId, Vec<HandlerRef>>>,
}

impl SubscriptionTable {
    /// Records a subscription point. Duplicate points are idempotent: a point
    /// already present is left untouched and `false` is returned.
    pub(crate) fn subscribe(&mut self, point: &SubscriptionPoint) -> bool {
        let handlers = self
            .rows
            .entry(point.address.id())
            .or_default()
            .entry(point.handler.accepts)
            .or_default();
        if handlers.iter().any(|h| h.id() == point.handler.id()) {
            trace!(?point, "Duplicate subscription ignored");
            return false;
        }
        trace!(?point, "Subscription recorded");
        handlers.push(point.handler.clone());
        true
    }

    /// Removes a subscription point. Returns `false` when the point was not
    /// present (unsubscribe is idempotent). Emptied type lists and address
    /// rows are dropped from the maps.
    pub(crate) fn unsubscribe(&mut self, point: &SubscriptionPoint) -> bool {
        let Some(row) = self.rows.get_mut(&point.address.id()) else {
            return false;
        };
        let Some(handlers) = row.get_mut(&point.handler.accepts) else {
            return false;
        };
        let Some(index) = handlers.iter().position(|h| h.id() == point.handler.id()) else {
            return false;
        };
        handlers.remove(index);
        if handlers.is_empty() {
            row.remove(&point.handler.accepts);
        }
        if row.is_empty() {
            self.rows.remove(&point.address.id());
        }
        trace!(?point, "Subscription removed");
        true
    }

    /// Returns a snapshot of the handlers for `(address, payload type)`, in
    /// insertion order. The snapshot decouples dispatch from table mutation:
    /// subscription changes made while handlers run take effect on the next
    /// dispatched message.
    pub(crate) fn handlers(&self, address_id: u64, payload_type: TypeId) -> Vec<HandlerRef> {
        self.rows
            .get(&address_id)
            .and_then(|row| row.get(&payload_type))
            .cloned()
            .unwrap_or_default()
    }

    /// Drops every subscription row belonging to the given address.
    pub(crate) fn drop_address(&mut self, address_id: u64) {
        self.rows.remove(&address_id);
    }

    /// Removes every point owned by the given actor, across all addresses.
    pub(crate) fn drop_actor(&mut self, actor_id: u64) {
        self.rows.retain(|_, row| {
            row.retain(|_, handlers| {
                handlers.retain(|h| h.actor_id != actor_id);
                !handlers.is_empty()
            });
            !row.is_empty()
        });
    }

    /// Number of address rows currently present.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::handler::{Handler, LifecycleOp, SupervisorLink};
    use crate::message::{Address, StartActor};
    use tokio::sync::mpsc;

    fn point() -> SubscriptionPoint {
        let (tx, _rx) = mpsc::unbounded_channel();
        let address = Address::mint(1, tx.clone());
        let primary = Address::mint(1, tx);
        let handler = Handler::lifecycle::<StartActor>(
            LifecycleOp::Start,
            11,
            primary.clone(),
            SupervisorLink::new(1, primary),
        );
        SubscriptionPoint::new(handler, address)
    }

    #[test]
    fn subscribe_is_idempotent() {
        let mut table = SubscriptionTable::default();
        let p = point();
        assert!(table.subscribe(&p));
        assert!(!table.subscribe(&p));
        assert_eq!(
            table
                .handlers(p.address.id(), p.handler.accepts)
                .len(),
            1
        );
    }

    #[test]
    fn subscribe_then_unsubscribe_leaves_table_unchanged() {
        let mut table = SubscriptionTable::default();
        let p = point();
        table.subscribe(&p);
        assert!(table.unsubscribe(&p));
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn second_unsubscribe_is_a_no_op() {
        let mut table = SubscriptionTable::default();
        let p = point();
        table.subscribe(&p);
        assert!(table.unsubscribe(&p));
        assert!(!table.unsubscribe(&p));
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn dispatch_order_is_insertion_order() {
        let mut table = SubscriptionTable::default();
        let first = point();
        // A second handler on the same address and payload type.
        let second = SubscriptionPoint::new(
            Handler::lifecycle::<StartActor>(
                LifecycleOp::Start,
                12,
                first.address.clone(),
                SupervisorLink::new(1, first.address.clone()),
            ),
            first.address.clone(),
        );
        table.subscribe(&first);
        table.subscribe(&second);
        let handlers = table.handlers(first.address.id(), first.handler.accepts);
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers[0].id(), first.handler.id());
        assert_eq!(handlers[1].id(), second.handler.id());
    }
}
