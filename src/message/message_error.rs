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

/// Represents recoverable failures surfaced through the messaging plane.
///
/// These values travel in-band: a failed request is answered with a synthetic
/// response carrying one of these variants, never with an out-of-band panic.
/// Protocol violations (handler type mismatches, responses for unknown request
/// ids with a matching pending type, outstanding plugin deactivations at
/// destruction) are bugs and abort via assertions instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// A request response or a lifecycle phase exceeded its time budget.
    Timeout,
    /// The operation was abandoned because its owner is shutting down.
    Cancelled,
    /// Plugin activation failed, so the actor never reached its operational state.
    InitFailed,
    /// A link was requested to a target that does not permit linking.
    NotLinkable,
    /// A registry lookup missed; carries the service name that was asked for.
    UnknownService(String),
    /// A registry insert collided with an existing entry of the same name.
    DuplicateService(String),
    /// A message could not be enqueued, typically because the destination
    /// supervisor's queue is gone.
    SendFailed(String),
}

impl std::fmt::Display for ActorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorError::Timeout => write!(f, "request timed out"),
            ActorError::Cancelled => write!(f, "operation cancelled by shutdown"),
            ActorError::InitFailed => write!(f, "actor initialization failed"),
            ActorError::NotLinkable => write!(f, "target actor does not permit linking"),
            ActorError::UnknownService(name) => write!(f, "unknown service: {name}"),
            ActorError::DuplicateService(name) => write!(f, "duplicate service: {name}"),
            ActorError::SendFailed(msg) => write!(f, "failed to send message: {msg}"),
        }
    }
}

impl std::error::Error for ActorError {}

/// Converts a `SendError` from Tokio's MPSC channel to an `ActorError`.
impl<T> From<tokio::sync::mpsc::error::SendError<T>> for ActorError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        ActorError::SendFailed("Channel closed".into())
    }
}
