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

use std::collections::HashMap;

use tracing::trace;

use crate::actor::builder::ActorBuilder;
use crate::common::Reply;
use crate::message::{
    ActorError, AddressRef, DeregistrationNotify, DeregistrationService, DiscoveryReply,
    DiscoveryRequest, RegistrationRequest, RegistrationResponse, Request,
};

/// State of the directory service actor: name → service address.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, AddressRef>,
}

/// Builds the directory service actor.
///
/// The registry answers registration and discovery requests and honors both
/// deregistration payloads: by name, and by address (dropping every name
/// bound to that address). Spawn it like any other actor:
///
/// ```rust,ignore
/// let registry = supervisor.spawn_actor(service_registry());
/// ```
#[must_use]
pub fn service_registry() -> ActorBuilder<ServiceRegistry> {
    let mut builder = ActorBuilder::<ServiceRegistry>::new();
    builder
        .mutate_on::<Request<RegistrationRequest>>(|state, context| {
            let request = &context.message;
            let name = request.payload.service_name.clone();
            if state.services.contains_key(&name) {
                request.reply_err(ActorError::DuplicateService(name));
            } else {
                trace!(service = %name, address = request.payload.service_addr.id(), "Service registered");
                state
                    .services
                    .insert(name, request.payload.service_addr.clone());
                request.reply(RegistrationResponse);
            }
            Reply::ready()
        })
        .mutate_on::<Request<DiscoveryRequest>>(|state, context| {
            let request = &context.message;
            match state.services.get(&request.payload.service_name) {
                Some(address) => request.reply(DiscoveryReply {
                    service_addr: address.clone(),
                }),
                None => request.reply_err(ActorError::UnknownService(
                    request.payload.service_name.clone(),
                )),
            }
            Reply::ready()
        })
        .mutate_on::<DeregistrationService>(|state, context| {
            state.services.remove(&context.message.service_name);
            Reply::ready()
        })
        .mutate_on::<DeregistrationNotify>(|state, context| {
            let gone = context.message.service_addr.id();
            state.services.retain(|_, address| address.id() != gone);
            Reply::ready()
        });
    builder
}
