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

use crate::setup::{initialize_tracing, Number, Relay, Word};

mod setup;

/// A message to a subscribed handler reaches it; a payload type nobody
/// subscribed to is dropped without disturbing later deliveries.
#[tokio::test(flavor = "multi_thread")]
async fn delivers_matching_payloads_and_drops_the_rest() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let supervisor = Supervisor::spawn(SupervisorConfig::new(
        Duration::from_secs(5),
        executor.clone(),
    ));

    let (events, mut outcomes) = tokio::sync::mpsc::unbounded_channel();
    let mut builder = ActorBuilder::<Relay>::with_state(Relay {
        events: Some(events),
    });
    builder.mutate_on::<Word>(|state, context| {
        state.emit(format!("word:{}", context.message.0));
        Reply::ready()
    });
    let actor = supervisor.spawn_actor(builder);
    actor.wait_state(ActorState::Operational).await?;

    // No handler accepts Number on this address; it must vanish quietly.
    actor.address().send(Number(7));
    actor.address().send(Word("hello".into()));

    assert_eq!(outcomes.recv().await.as_deref(), Some("word:hello"));

    supervisor.stop().await?;
    executor.drain().await;
    Ok(())
}

/// Messages sent from one source to the same address arrive at the handler
/// in send order.
#[tokio::test(flavor = "multi_thread")]
async fn preserves_send_order_per_address() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let supervisor = Supervisor::spawn(SupervisorConfig::new(
        Duration::from_secs(5),
        executor.clone(),
    ));

    let (events, mut outcomes) = tokio::sync::mpsc::unbounded_channel();
    let mut builder = ActorBuilder::<Relay>::with_state(Relay {
        events: Some(events),
    });
    builder.mutate_on::<Number>(|state, context| {
        state.emit(context.message.0.to_string());
        Reply::ready()
    });
    let actor = supervisor.spawn_actor(builder);
    actor.wait_state(ActorState::Operational).await?;

    const COUNT: u32 = 100;
    for n in 0..COUNT {
        actor.address().send(Number(n));
    }
    for n in 0..COUNT {
        assert_eq!(outcomes.recv().await.as_deref(), Some(n.to_string().as_str()));
    }

    supervisor.stop().await?;
    executor.drain().await;
    Ok(())
}

/// Two handlers subscribed to the same (address, payload type) pair are both
/// invoked, in insertion order.
#[tokio::test(flavor = "multi_thread")]
async fn invokes_handlers_in_insertion_order() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let supervisor = Supervisor::spawn(SupervisorConfig::new(
        Duration::from_secs(5),
        executor.clone(),
    ));

    let (events, mut outcomes) = tokio::sync::mpsc::unbounded_channel();
    let shared = supervisor.create_address();
    let mut builder = ActorBuilder::<Relay>::with_state(Relay {
        events: Some(events),
    });
    builder
        .mutate_on_at::<Word>(shared.clone(), |state, context| {
            state.emit(format!("first:{}", context.message.0));
            Reply::ready()
        })
        .mutate_on_at::<Word>(shared.clone(), |state, context| {
            state.emit(format!("second:{}", context.message.0));
            Reply::ready()
        });
    let actor = supervisor.spawn_actor(builder);
    actor.wait_state(ActorState::Operational).await?;

    shared.send(Word("go".into()));
    assert_eq!(outcomes.recv().await.as_deref(), Some("first:go"));
    assert_eq!(outcomes.recv().await.as_deref(), Some("second:go"));

    supervisor.stop().await?;
    executor.drain().await;
    Ok(())
}
