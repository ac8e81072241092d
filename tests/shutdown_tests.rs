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

use futures::future::join_all;
use praxis::prelude::*;

use crate::setup::{initialize_tracing, Blackhole, IssuePing, Ping, Relay};

mod setup;

/// Cascaded shutdown: both children reach SHUT_DOWN before the supervisor
/// does, and the supervisor completes within its configured budget.
#[tokio::test(flavor = "multi_thread")]
async fn supervisor_shutdown_cascades_to_children() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let shutdown_timeout = Duration::from_secs(5);
    let supervisor = Supervisor::spawn(SupervisorConfig::new(shutdown_timeout, executor.clone()));

    let a = supervisor.spawn_actor(ActorBuilder::<Blackhole>::new());
    let b = supervisor.spawn_actor(ActorBuilder::<Blackhole>::new());
    join_all([
        a.wait_state(ActorState::Operational),
        b.wait_state(ActorState::Operational),
    ])
    .await
    .into_iter()
    .collect::<anyhow::Result<Vec<_>>>()?;

    tokio::time::timeout(shutdown_timeout + Duration::from_secs(1), supervisor.stop())
        .await
        .expect("supervisor exceeded its shutdown budget")?;

    // The cascade finished before the supervisor published its own terminal
    // state, so by now both children must be terminal too.
    assert_eq!(a.state(), ActorState::ShutDown);
    assert_eq!(b.state(), ActorState::ShutDown);
    assert_eq!(supervisor.state(), ActorState::ShutDown);

    executor.drain().await;
    Ok(())
}

/// After the supervisor reaches SHUT_DOWN its pending requests have been
/// answered with a cancellation error and its timers cancelled; the drained
/// executor holds no leftover work.
#[tokio::test(flavor = "multi_thread")]
async fn shutdown_cancels_pending_requests() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let supervisor = Supervisor::spawn(SupervisorConfig::new(
        Duration::from_secs(5),
        executor.clone(),
    ));

    let (events, _outcomes) = tokio::sync::mpsc::unbounded_channel();
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
        .mutate_on::<Response<Ping>>(|_state, _context| Reply::ready());
    let actor = supervisor.spawn_actor(builder);
    actor.wait_state(ActorState::Operational).await?;

    // A request that would only time out a minute from now.
    let dead_addr = supervisor.create_address();
    actor.address().send(IssuePing {
        target: dead_addr,
        timeout: Duration::from_secs(60),
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    supervisor.stop().await?;
    assert_eq!(
        executor.pending_timers(),
        0,
        "a pending timer survived supervisor shutdown"
    );
    executor.drain().await;
    Ok(())
}

/// A supervisor with a parent behaves as a child actor: it is initialized by
/// the parent, becomes operational, and the parent's shutdown cascades
/// through it to its own actors.
#[tokio::test(flavor = "multi_thread")]
async fn nested_supervisor_joins_the_cascade() -> anyhow::Result<()> {
    initialize_tracing();
    let executor = TokioExecutor::new();
    let parent = Supervisor::spawn(SupervisorConfig::new(
        Duration::from_secs(5),
        executor.clone(),
    ));
    let child = Supervisor::spawn(
        SupervisorConfig::new(Duration::from_secs(5), executor.clone())
            .with_parent(parent.clone()),
    );

    child.wait_state(ActorState::Operational).await?;

    let grandchild = child.spawn_actor(ActorBuilder::<Blackhole>::new());
    grandchild.wait_state(ActorState::Operational).await?;

    parent.stop().await?;

    grandchild.wait_state(ActorState::ShutDown).await?;
    child.wait_state(ActorState::ShutDown).await?;
    assert_eq!(parent.state(), ActorState::ShutDown);

    executor.drain().await;
    Ok(())
}
