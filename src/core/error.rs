// src/core/error.rs
//
// A plain Message variant, a Context variant wrapping a boxed source,
// and structured variants for the cases callers branch on, covering
// this core's error taxonomy.

use std::error::Error as StdError;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Publish attempted with more samples than the buffer's capacity.
    /// Programmer error — the producer miscounted — never raised by a
    /// well-behaved caller, treated as fatal by convention.
    #[error("capacity exceeded: tried to publish {attempted}, capacity is {capacity}")]
    CapacityExceeded { attempted: usize, capacity: usize },

    /// An index, level, or channel argument was outside its valid range.
    #[error("out of range: {what} = {value} (valid: {valid})")]
    OutOfRange {
        what: &'static str,
        value: i64,
        valid: String,
    },

    /// An operation was attempted before its component was configured or
    /// started (e.g. Play() before sources have data).
    #[error("not ready: {0}")]
    NotReady(&'static str),

    /// The acquisition device stopped producing samples. Recovery is
    /// external to the core; the core only signals it via an audit event.
    #[error("device lost: {0}")]
    DeviceLost(String),

    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl CoreError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    pub fn with_context(context: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        CoreError::Context {
            context: context.into(),
            source: source.into().into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{message}")]
    Message { message: String },
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl ConfigError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Context {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
