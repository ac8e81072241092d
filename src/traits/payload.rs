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
use std::fmt::Debug;

use dyn_clone::DynClone; // Required for cloning trait objects

/// A marker trait for types that can be carried as message payloads.
///
/// This trait combines several standard library traits (`Any`, `Send`, `Sync`, `Debug`)
/// with [`DynClone`] to ensure that payloads are safe to send between supervisors,
/// can be dynamically cloned (even as trait objects), support downcasting back to
/// their concrete types, and are debuggable.
///
/// The `as_any` and `as_any_mut` methods are crucial for the runtime's ability
/// to handle payloads generically and perform type-based dispatch against the
/// subscription table, which is keyed by [`TypeId`](std::any::TypeId).
///
/// A blanket implementation is provided, so any type `T` that satisfies the bounds
/// (`T: Any + Send + Sync + Debug + DynClone + 'static`) automatically implements
/// `Payload`. Users typically only need to ensure their payload structs/enums
/// derive `Clone` and `Debug` and meet the `Send + Sync + 'static` requirements.
pub trait Payload: DynClone + Any + Send + Sync + Debug {
    /// Returns a reference to the payload as a dynamic [`Any`] trait object.
    ///
    /// This allows for runtime type introspection and downcasting using methods like
    /// [`Any::downcast_ref`](std::any::Any::downcast_ref).
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to the payload as a dynamic [`Any`] trait object.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// Implement DynClone for the trait object itself.
dyn_clone::clone_trait_object!(Payload);

/// Blanket implementation of `Payload` for qualifying types.
///
/// Any type `T` that is `Any + Send + Sync + Debug + DynClone + 'static` automatically
/// implements `Payload`. This simplifies defining custom payload types.
impl<T> Payload for T
where
    T: Any + Send + Sync + Debug + DynClone + 'static,
{
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
