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

use crate::setup::{initialize_tracing, IssuePing, Ping, Pong, Relay};

mod setup;

/// Builds a requester actor: `IssuePing` makes it send a `Ping` request, and
/// every `Ping` response is relayed to the test.
fn requester(events: tokio::sync::mpsc::UnboundedSender<String>) -> ActorBuilder<Relay> {
    let mut builder = ActorBuilder::<Relay>::with_state(Relay {
        events: Some(events),
    });
    builder
        .mutate_on::<IssuePing>(|_state, context| {
            let order = &context.message;
            context
                .actor
                .request(&order.target, Ping)
                .send(order.timeout);
            Reply::ready()
        })
        .mutate_on::<Response<Ping>>(|state, context| {
            match &context.message.payload {
                Ok(_) => state.emit("pong"),
                Err(error) => state.emit(format!("error:{error}")),
            }
            Reply::ready()
        });
    builder
}

/// A request to an address with no matching handler times out: the requester
/// receives exactly one synthetic response carrying the timeout error.
#[tokio::test(flavor = "multi_thread")]
async fn request_times_out_when_nobody_answers() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let supervisor = Supervisor::spawn(SupervisorConfig::new(
        Duration::from_secs(5),
        executor.clone(),
    ));

    let (events, mut outcomes) = tokio::sync::mpsc::unbounded_channel();
    let actor = supervisor.spawn_actor(requester(events));
    actor.wait_state(ActorState::Operational).await?;

    let dead_addr = supervisor.create_address();
    actor.address().send(IssuePing {
        target: dead_addr,
        timeout: Duration::from_millis(50),
    });

    assert_eq!(outcomes.recv().await.as_deref(), Some("error:request timed out"));
    // At most one response per request id.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(outcomes.try_recv().is_err(), "a second response leaked through");

    supervisor.stop().await?;
    executor.drain().await;
    Ok(())
}

/// A response arriving after the timer fired is dropped: the requester
/// observes the timeout error and never the late pong.
#[tokio::test(flavor = "multi_thread")]
async fn late_response_is_dropped() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let supervisor = Supervisor::spawn(SupervisorConfig::new(
        Duration::from_secs(5),
        executor.clone(),
    ));

    // A responder that replies well after the requester's deadline.
    let mut responder = ActorBuilder::<Relay>::new();
    responder.mutate_on::<Request<Ping>>(|_state, context| {
        let request = context.message.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            request.reply(Pong);
        });
        Reply::ready()
    });
    let responder = supervisor.spawn_actor(responder);
    responder.wait_state(ActorState::Operational).await?;

    let (events, mut outcomes) = tokio::sync::mpsc::unbounded_channel();
    let actor = supervisor.spawn_actor(requester(events));
    actor.wait_state(ActorState::Operational).await?;

    actor.address().send(IssuePing {
        target: responder.address().clone(),
        timeout: Duration::from_millis(50),
    });

    assert_eq!(outcomes.recv().await.as_deref(), Some("error:request timed out"));
    // Wait past the late reply; it must have been dropped at correlation.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(outcomes.try_recv().is_err(), "late response was delivered");

    supervisor.stop().await?;
    executor.drain().await;
    Ok(())
}

/// The fast path: a prompt reply is correlated, the timer is cancelled, and
/// the typed response reaches the requester's handler.
#[tokio::test(flavor = "multi_thread")]
async fn response_arrives_before_the_timer() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let supervisor = Supervisor::spawn(SupervisorConfig::new(
        Duration::from_secs(5),
        executor.clone(),
    ));

    let mut responder = ActorBuilder::<Relay>::new();
    responder.mutate_on::<Request<Ping>>(|_state, context| {
        context.message.reply(Pong);
        Reply::ready()
    });
    let responder = supervisor.spawn_actor(responder);
    responder.wait_state(ActorState::Operational).await?;

    let (events, mut outcomes) = tokio::sync::mpsc::unbounded_channel();
    let actor = supervisor.spawn_actor(requester(events));
    actor.wait_state(ActorState::Operational).await?;

    actor.address().send(IssuePing {
        target: responder.address().clone(),
        timeout: Duration::from_secs(1),
    });
    assert_eq!(outcomes.recv().await.as_deref(), Some("pong"));

    supervisor.stop().await?;
    executor.drain().await;
    Ok(())
}

/// Requests work across supervisors: the responder lives on another
/// supervisor and the reply is correlated back on the requester's side.
#[tokio::test(flavor = "multi_thread")]
async fn requests_cross_supervisors() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let s1 = Supervisor::spawn(SupervisorConfig::new(Duration::from_secs(5), executor.clone()));
    let s2 = Supervisor::spawn(SupervisorConfig::new(Duration::from_secs(5), executor.clone()));

    let mut responder = ActorBuilder::<Relay>::new();
    responder.mutate_on::<Request<Ping>>(|_state, context| {
        context.message.reply(Pong);
        Reply::ready()
    });
    let responder = s2.spawn_actor(responder);
    responder.wait_state(ActorState::Operational).await?;

    let (events, mut outcomes) = tokio::sync::mpsc::unbounded_channel();
    let actor = s1.spawn_actor(requester(events));
    actor.wait_state(ActorState::Operational).await?;

    actor.address().send(IssuePing {
        target: responder.address().clone(),
        timeout: Duration::from_secs(1),
    });
    assert_eq!(outcomes.recv().await.as_deref(), Some("pong"));

    s1.stop().await?;
    s2.stop().await?;
    executor.drain().await;
    Ok(())
}
