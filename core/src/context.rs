// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Request-scoped context that carries deadlines, cancellation and typed values across layers.

use http::Extensions;
use std::future::{self, Future};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Reasons for which a context stops accepting work.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ContextError {
    /// The context was explicitly canceled by its owner.
    #[error("Context canceled")]
    Canceled,

    /// The deadline attached to the context passed.
    #[error("Context deadline exceeded")]
    DeadlineExceeded,
}

/// Result type for operations that race against a context.
pub type ContextResult<T> = Result<T, ContextError>;

/// Handle to cancel all contexts derived from the one that created it.
#[derive(Debug)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    /// Marks the associated contexts as canceled.  Calling this more than once is a no-op.
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

/// Context attached to every request that flows through the endpoints.
///
/// Contexts are cheap to clone and clones share the same cancellation signals.  Values are
/// stored by type so that each layer can define its own keys without collisions.
#[derive(Clone, Debug, Default)]
pub struct Context {
    /// Instant after which all operations under this context must fail.
    deadline: Option<Instant>,

    /// Cancellation signal of this context, a child of the signal of the context it derives from.
    cancel: CancellationToken,

    /// Request-scoped values keyed by their type.
    values: Extensions,
}

impl Context {
    /// Creates an empty context without deadline that can never be canceled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a copy of this context whose deadline is `deadline` or the current one, whichever
    /// comes first.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = match self.deadline {
            Some(current) if current < deadline => Some(current),
            _ => Some(deadline),
        };
        self
    }

    /// Returns a copy of this context that expires after `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns a copy of this context that can be canceled with the returned handle in addition
    /// to any cancellation signal inherited from this context.
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        self.cancel = self.cancel.child_token();
        let handle = CancelHandle(self.cancel.clone());
        (self, handle)
    }

    /// Returns a copy of this context with `value` attached to it, replacing any previous value of
    /// the same type.
    pub fn with_value<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Attaches `value` to this context, replacing any previous value of the same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.values.insert(value);
    }

    /// Gets the value of type `T` attached to this context, if any.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    /// Returns the deadline of this context, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason why this context is done, or `None` if it can still be used.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancel.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Waits until this context is canceled or its deadline passes.
    ///
    /// Never returns for contexts without deadline and without cancellation signals.
    pub async fn done(&self) -> ContextError {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => ContextError::Canceled,
            () = expired => ContextError::DeadlineExceeded,
        }
    }

    /// Runs `fut` to completion unless this context finishes first, in which case `fut` is
    /// dropped and the reason is returned.
    pub async fn run<F: Future>(&self, fut: F) -> ContextResult<F::Output> {
        if let Some(e) = self.err() {
            return Err(e);
        }
        tokio::select! {
            biased;
            e = self.done() => Err(e),
            output = fut => Ok(output),
        }
    }
}
