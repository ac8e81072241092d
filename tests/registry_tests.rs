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
#![allow(dead_code, unused_doc_comments)]

use std::time::Duration;

use praxis::prelude::*;

use crate::setup::{initialize_tracing, DiscoverService, RegisterService, Relay};

mod setup;

/// Builds a client actor that exercises the registry protocol and relays the
/// outcomes.
fn client(events: tokio::sync::mpsc::UnboundedSender<String>) -> ActorBuilder<Relay> {
    let mut builder = ActorBuilder::<Relay>::with_state(Relay {
        events: Some(events),
    });
    builder
        .mutate_on::<RegisterService>(|_state, context| {
            let order = &context.message;
            context
                .actor
                .request(
                    &order.registry,
                    RegistrationRequest {
                        service_name: order.name.clone(),
                        service_addr: order.addr.clone(),
                    },
                )
                .send(Duration::from_secs(1));
            Reply::ready()
        })
        .mutate_on::<Response<RegistrationRequest>>(|state, context| {
            match &context.message.payload {
                Ok(_) => state.emit("registered"),
                Err(error) => state.emit(format!("error:{error}")),
            }
            Reply::ready()
        })
        .mutate_on::<DiscoverService>(|_state, context| {
            let order = &context.message;
            context
                .actor
                .request(
                    &order.registry,
                    DiscoveryRequest {
                        service_name: order.name.clone(),
                    },
                )
                .send(Duration::from_secs(1));
            Reply::ready()
        })
        .mutate_on::<Response<DiscoveryRequest>>(|state, context| {
            match &context.message.payload {
                Ok(reply) => state.emit(format!("found:{}", reply.service_addr.id())),
                Err(error) => state.emit(format!("error:{error}")),
            }
            Reply::ready()
        });
    builder
}

/// Registration answers success, a second registration of the same name is a
/// duplicate-service error, discovery finds the registered address, and a
/// lookup of an unknown name is an unknown-service error.
#[tokio::test(flavor = "multi_thread")]
async fn registry_round_trip() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let supervisor = Supervisor::spawn(SupervisorConfig::new(
        Duration::from_secs(5),
        executor.clone(),
    ));

    let registry = supervisor.spawn_actor(service_registry());
    registry.wait_state(ActorState::Operational).await?;

    let (events, mut outcomes) = tokio::sync::mpsc::unbounded_channel();
    let actor = supervisor.spawn_actor(client(events));
    actor.wait_state(ActorState::Operational).await?;

    let db_addr = supervisor.create_address();
    actor.address().send(RegisterService {
        registry: registry.address().clone(),
        name: "db".into(),
        addr: db_addr.clone(),
    });
    assert_eq!(outcomes.recv().await.as_deref(), Some("registered"));

    actor.address().send(RegisterService {
        registry: registry.address().clone(),
        name: "db".into(),
        addr: db_addr.clone(),
    });
    assert_eq!(
        outcomes.recv().await.as_deref(),
        Some("error:duplicate service: db")
    );

    actor.address().send(DiscoverService {
        registry: registry.address().clone(),
        name: "db".into(),
    });
    assert_eq!(
        outcomes.recv().await.as_deref(),
        Some(format!("found:{}", db_addr.id()).as_str())
    );

    actor.address().send(DiscoverService {
        registry: registry.address().clone(),
        name: "nope".into(),
    });
    assert_eq!(
        outcomes.recv().await.as_deref(),
        Some("error:unknown service: nope")
    );

    supervisor.stop().await?;
    executor.drain().await;
    Ok(())
}

/// Deregistration removes a single name; deregistration by address removes
/// every name bound to that address.
#[tokio::test(flavor = "multi_thread")]
async fn registry_deregistration() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let supervisor = Supervisor::spawn(SupervisorConfig::new(
        Duration::from_secs(5),
        executor.clone(),
    ));

    let registry = supervisor.spawn_actor(service_registry());
    registry.wait_state(ActorState::Operational).await?;

    let (events, mut outcomes) = tokio::sync::mpsc::unbounded_channel();
    let actor = supervisor.spawn_actor(client(events));
    actor.wait_state(ActorState::Operational).await?;

    let service_addr = supervisor.create_address();
    for name in ["cache", "store"] {
        actor.address().send(RegisterService {
            registry: registry.address().clone(),
            name: name.into(),
            addr: service_addr.clone(),
        });
        assert_eq!(outcomes.recv().await.as_deref(), Some("registered"));
    }

    // Remove one name explicitly.
    registry.address().send(DeregistrationService {
        service_name: "cache".into(),
    });
    actor.address().send(DiscoverService {
        registry: registry.address().clone(),
        name: "cache".into(),
    });
    assert_eq!(
        outcomes.recv().await.as_deref(),
        Some("error:unknown service: cache")
    );

    // Remove everything bound to the address.
    registry.address().send(DeregistrationNotify {
        service_addr: service_addr.clone(),
    });
    actor.address().send(DiscoverService {
        registry: registry.address().clone(),
        name: "store".into(),
    });
    assert_eq!(
        outcomes.recv().await.as_deref(),
        Some("error:unknown service: store")
    );

    supervisor.stop().await?;
    executor.drain().await;
    Ok(())
}
