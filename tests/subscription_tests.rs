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

use crate::setup::{initialize_tracing, Relay, Word};

mod setup;

/// Cross-supervisor subscription: a handler of an actor on S1 subscribes to
/// an address owned by S2 through the external subscription protocol, and a
/// send to that address (entering at S2) reaches the handler on S1 via a
/// forwarded handler call.
#[tokio::test(flavor = "multi_thread")]
async fn foreign_subscription_delivers_across_supervisors() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let s1 = Supervisor::spawn(SupervisorConfig::new(Duration::from_secs(5), executor.clone()));
    let s2 = Supervisor::spawn(SupervisorConfig::new(Duration::from_secs(5), executor.clone()));

    let foreign = s2.create_address();
    let (events, mut outcomes) = tokio::sync::mpsc::unbounded_channel();
    let mut builder = ActorBuilder::<Relay>::with_state(Relay {
        events: Some(events),
    });
    builder.mutate_on_at::<Word>(foreign.clone(), |state, context| {
        state.emit(format!("got:{}", context.message.0));
        Reply::ready()
    });
    let subscriber = s1.spawn_actor(builder);

    // Initialization only completes once S2 confirmed the foreign point.
    subscriber.wait_state(ActorState::Operational).await?;

    foreign.send(Word("over-the-wall".into()));
    assert_eq!(outcomes.recv().await.as_deref(), Some("got:over-the-wall"));

    // Tear the foreign point down; afterwards sends must no longer arrive.
    let point = subscriber.points()[0].clone();
    s1.unsubscribe(point, None);
    tokio::time::sleep(Duration::from_millis(100)).await;
    foreign.send(Word("into-the-void".into()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(
        outcomes.try_recv().is_err(),
        "message arrived after unsubscription"
    );

    s1.stop().await?;
    s2.stop().await?;
    executor.drain().await;
    Ok(())
}

/// The unsubscription completion callback fires after the confirmation has
/// fully dispatched, and unsubscribing the same point twice confirms
/// immediately the second time.
#[tokio::test(flavor = "multi_thread")]
async fn unsubscribe_completion_and_idempotency() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let supervisor = Supervisor::spawn(SupervisorConfig::new(
        Duration::from_secs(5),
        executor.clone(),
    ));

    let (events, mut outcomes) = tokio::sync::mpsc::unbounded_channel();
    let mut builder = ActorBuilder::<Relay>::with_state(Relay {
        events: Some(events.clone()),
    });
    builder.mutate_on::<Word>(|state, context| {
        state.emit(format!("got:{}", context.message.0));
        Reply::ready()
    });
    let actor = supervisor.spawn_actor(builder);
    actor.wait_state(ActorState::Operational).await?;

    actor.address().send(Word("before".into()));
    assert_eq!(outcomes.recv().await.as_deref(), Some("got:before"));

    let point = actor.points()[0].clone();
    let done = events.clone();
    supervisor.unsubscribe(
        point.clone(),
        Some(Completion::new(move || {
            let _ = done.send("unsubscribed".into());
        })),
    );
    assert_eq!(outcomes.recv().await.as_deref(), Some("unsubscribed"));

    // The window is closed: no further invocations.
    actor.address().send(Word("after".into()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(outcomes.try_recv().is_err(), "handler ran outside its window");

    // Idempotent unsubscribe: the second call confirms immediately.
    let done_again = events.clone();
    supervisor.unsubscribe(
        point,
        Some(Completion::new(move || {
            let _ = done_again.send("unsubscribed-again".into());
        })),
    );
    assert_eq!(outcomes.recv().await.as_deref(), Some("unsubscribed-again"));

    supervisor.stop().await?;
    executor.drain().await;
    Ok(())
}

/// Re-subscribing a previously removed point restores delivery: subscribe
/// then unsubscribe leaves the table as it was, so a fresh subscribe works.
#[tokio::test(flavor = "multi_thread")]
async fn resubscribe_after_roundtrip() -> anyhow::Result<()> {
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
        state.emit(format!("got:{}", context.message.0));
        Reply::ready()
    });
    let actor = supervisor.spawn_actor(builder);
    actor.wait_state(ActorState::Operational).await?;

    let point = actor.points()[0].clone();
    supervisor.unsubscribe(point.clone(), None);
    tokio::time::sleep(Duration::from_millis(50)).await;

    supervisor.subscribe(point);
    tokio::time::sleep(Duration::from_millis(50)).await;
    actor.address().send(Word("again".into()));
    assert_eq!(outcomes.recv().await.as_deref(), Some("got:again"));

    supervisor.stop().await?;
    executor.drain().await;
    Ok(())
}
