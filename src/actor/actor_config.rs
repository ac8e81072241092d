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
use std::time::Duration;

use crate::actor::SupervisorHandle;
use crate::common::Executor;

/// Default budget for an actor to confirm initialization.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default budget for an actor to confirm shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How an actor behaves when a linked client must be detached.
///
/// Reserved alongside the linking payloads; no linking semantics are
/// implemented yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnlinkPolicy {
    /// Notify the client and wait for it to acknowledge the unlink.
    #[default]
    LetClientKnow,
    /// Detach the client without waiting.
    Force,
}

/// Configuration parameters for a new actor.
///
/// Timeouts cap the lifecycle phases driven by the owning supervisor: if the
/// actor cannot confirm initialization within `init_timeout` it is asked to
/// shut down, and a shutdown that exceeds `shutdown_timeout` is escalated to
/// forced removal.
#[derive(Debug, Clone)]
pub struct ActorConfig {
    pub(crate) init_timeout: Duration,
    pub(crate) shutdown_timeout: Duration,
    pub(crate) unlink_timeout: Option<Duration>,
    pub(crate) unlink_policy: UnlinkPolicy,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            init_timeout: DEFAULT_INIT_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            unlink_timeout: None,
            unlink_policy: UnlinkPolicy::default(),
        }
    }
}

impl ActorConfig {
    /// Creates a configuration with the default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initialization timeout.
    #[must_use]
    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    /// Sets the shutdown timeout.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the unlink timeout (reserved).
    #[must_use]
    pub fn with_unlink_timeout(mut self, timeout: Duration) -> Self {
        self.unlink_timeout = Some(timeout);
        self
    }

    /// Sets the unlink policy (reserved).
    #[must_use]
    pub fn with_unlink_policy(mut self, policy: UnlinkPolicy) -> Self {
        self.unlink_policy = policy;
        self
    }
}

/// Configuration for constructing a supervisor.
///
/// `shutdown_timeout` caps graceful-shutdown wall time per child before
/// escalation; `executor` is the event-loop collaborator the pump is posted
/// to. With `parent` set, the new supervisor registers itself as a child actor
/// of the parent and answers init/shutdown requests over its own inbox.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub(crate) shutdown_timeout: Duration,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) parent: Option<SupervisorHandle>,
}

impl SupervisorConfig {
    /// Creates a configuration from the two required options.
    #[must_use]
    pub fn new(shutdown_timeout: Duration, executor: Arc<dyn Executor>) -> Self {
        Self {
            shutdown_timeout,
            executor,
            parent: None,
        }
    }

    /// Makes the new supervisor a child actor of `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: SupervisorHandle) -> Self {
        self.parent = Some(parent);
        self
    }
}
