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

//! Request/response correlation plumbing.
//!
//! A request payload type declares its reply payload type through
//! [`Requestable`]. Sending wraps the payload in a [`Request`] carrying a fresh
//! id and the sender's reply address, and registers a pending entry with the
//! sender's supervisor. Replies travel inside a non-generic [`ResponseFrame`]
//! so the pump can correlate them against the registry without knowing the
//! concrete type; the typed [`Response`] inside the frame is then dispatched to
//! the reply address as a normal message.

use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, trace};

use crate::common::{Executor, RequestRegistry};
use crate::message::address::AddressRef;
use crate::message::message_error::ActorError;
use crate::message::system::{
    DiscoveryReply, DiscoveryRequest, InitializeActor, InitializeConfirmation, LinkRequest,
    LinkResponse, RegistrationRequest, RegistrationResponse, RequestTimedOut, ShutdownConfirmation,
    ShutdownRequest, StateRequest, StateResponse, UnlinkNotify, UnlinkRequest,
};
use crate::traits::Payload;

/// Declares the reply payload type associated with a request payload type.
pub trait Requestable: Payload + Clone {
    /// The payload type carried by a successful response.
    type Reply: Payload + Clone;
}

// Reply associations for the system request payloads.
impl Requestable for InitializeActor {
    type Reply = InitializeConfirmation;
}
impl Requestable for ShutdownRequest {
    type Reply = ShutdownConfirmation;
}
impl Requestable for StateRequest {
    type Reply = StateResponse;
}
impl Requestable for RegistrationRequest {
    type Reply = RegistrationResponse;
}
impl Requestable for DiscoveryRequest {
    type Reply = DiscoveryReply;
}
impl Requestable for LinkRequest {
    type Reply = LinkResponse;
}
impl Requestable for UnlinkRequest {
    type Reply = UnlinkNotify;
}

/// A request in flight: the user payload plus correlation id and reply address.
///
/// Handlers subscribe to `Request<T>` for the request types they serve and
/// answer with [`Request::reply`] or [`Request::reply_err`]. Every request is
/// answered at most once at the requester: either by the handler's reply or by
/// the synthetic error the requester's supervisor produces when the timer
/// fires first.
#[derive(Debug, Clone)]
pub struct Request<T: Requestable> {
    /// Correlation id, unique per requesting supervisor.
    pub id: u64,
    /// Where the response (or synthetic error) is delivered.
    pub reply_to: AddressRef,
    /// The request payload itself.
    pub payload: T,
}

impl<T: Requestable> Request<T> {
    /// Answers this request with a successful reply payload.
    pub fn reply(&self, reply: T::Reply) {
        self.respond(Ok(reply));
    }

    /// Answers this request with an error.
    pub fn reply_err(&self, error: ActorError) {
        self.respond(Err(error));
    }

    fn respond(&self, payload: Result<T::Reply, ActorError>) {
        trace!(request_id = self.id, reply_to = self.reply_to.id(), "Replying to request");
        let response = Response::<T> {
            request_id: self.id,
            payload,
        };
        let frame = ResponseFrame {
            request_id: self.id,
            inner: Arc::new(response),
        };
        self.reply_to.post(Arc::new(frame));
    }
}

/// A correlated response delivered to the requester's reply address.
///
/// Carries either the reply payload or the error the request failed with
/// (timeout, cancellation, or a handler-produced error).
#[derive(Debug, Clone)]
pub struct Response<T: Requestable> {
    /// Correlation id of the originating request.
    pub request_id: u64,
    /// The reply payload, or the in-band failure.
    pub payload: Result<T::Reply, ActorError>,
}

/// Crate-internal: non-generic wrapper responses travel in on the wire.
///
/// The pump correlates the frame against the request registry by id, then
/// dispatches the typed response inside. A frame whose id has no pending entry
/// is a late response and is dropped.
#[derive(Debug, Clone)]
pub(crate) struct ResponseFrame {
    pub(crate) request_id: u64,
    pub(crate) inner: Arc<dyn Payload>,
}

/// Builder for an outgoing request; created by
/// [`ActorLink::request`](crate::actor::ActorLink::request).
#[derive(Debug)]
pub struct RequestBuilder<T: Requestable> {
    target: AddressRef,
    reply_to: AddressRef,
    payload: T,
    registry: Arc<RequestRegistry>,
    executor: Arc<dyn Executor>,
}

impl<T: Requestable> RequestBuilder<T> {
    pub(crate) fn new(
        target: AddressRef,
        reply_to: AddressRef,
        payload: T,
        registry: Arc<RequestRegistry>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            target,
            reply_to,
            payload,
            registry,
            executor,
        }
    }

    /// Sends the request with the given response timeout and returns its id.
    ///
    /// The pending entry is registered with the requester's supervisor before
    /// the request leaves, and the timeout timer is armed on that supervisor's
    /// executor. Exactly one of the following reaches the reply address: the
    /// matching response, a synthetic timeout error, or a synthetic
    /// cancellation error if the supervisor shuts down first.
    #[instrument(skip(self), fields(target = self.target.id()))]
    pub fn send(self, timeout: Duration) -> u64 {
        let id = self.registry.next_id();
        let reply_to = self.reply_to.clone();
        let timer = self.executor.schedule_timer(
            timeout,
            Box::pin(async move {
                reply_to.post(Arc::new(RequestTimedOut { request_id: id }));
            }),
        );
        self.registry.insert(
            id,
            self.reply_to.clone(),
            std::any::TypeId::of::<Response<T>>(),
            timer,
            Box::new(move |error| {
                Arc::new(Response::<T> {
                    request_id: id,
                    payload: Err(error),
                })
            }),
        );
        trace!(request_id = id, "Sending request");
        let request = Request {
            id,
            reply_to: self.reply_to,
            payload: self.payload,
        };
        self.target.post(Arc::new(request));
        id
    }
}
