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

//! Convenient boxed future returns for message handlers.

use crate::common::FutureBox;

/// A utility namespace for creating the standard return type of message
/// handlers.
///
/// Handlers registered with
/// [`ActorBuilder::mutate_on`](crate::actor::ActorBuilder::mutate_on) return a
/// boxed, pinned future ([`FutureBox`]). This struct provides helpers for the
/// common cases. It acts purely as a namespace and is not intended to be
/// instantiated.
pub struct Reply;

impl Reply {
    /// Creates an immediately resolving, no-operation future.
    ///
    /// This is the return value for handlers whose work is entirely
    /// synchronous.
    #[inline]
    #[must_use]
    pub fn ready() -> FutureBox {
        Box::pin(async move {})
    }

    /// Boxes an existing future for handlers with asynchronous follow-up work.
    #[inline]
    pub fn from_async<F>(future: F) -> FutureBox
    where
        F: std::future::Future<Output = ()> + Send + Sync + 'static,
    {
        Box::pin(future)
    }
}
