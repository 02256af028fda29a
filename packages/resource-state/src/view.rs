//! Read-only decoration of an envelope.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::resource::{AsyncResource, ErrorInfo, Payload};

/// Query interface over one [`AsyncResource`].
///
/// Readiness is computed once at wrap time; the wrapped envelope is never
/// modified.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceView<T = Value> {
    resource: AsyncResource<T>,
    ready: bool,
}

/// Decorate an envelope with query methods.
///
/// Pure and total: wrapping equal envelopes yields equal views.
pub fn wrap<T: Payload>(resource: AsyncResource<T>) -> ResourceView<T> {
    let ready = resource.is_ready();
    ResourceView { resource, ready }
}

impl<T: Payload> From<AsyncResource<T>> for ResourceView<T> {
    fn from(resource: AsyncResource<T>) -> Self {
        wrap(resource)
    }
}

impl<T: Payload> ResourceView<T> {
    /// The envelope as stored.
    pub fn raw(&self) -> &AsyncResource<T> {
        &self.resource
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// A failure is only reported once the request has settled.
    pub fn has_error(&self) -> bool {
        self.ready && self.resource.error.is_some()
    }

    /// The settled error, if any.
    pub fn error(&self) -> Option<&ErrorInfo> {
        if self.ready {
            self.resource.error.as_ref()
        } else {
            None
        }
    }

    /// `results` when the payload is list-shaped, otherwise the payload.
    ///
    /// Returns `fallback` itself while not ready.
    pub fn get_data<'a>(&'a self, fallback: &'a T) -> &'a T {
        self.data().unwrap_or(fallback)
    }

    /// The `meta` member of a ready payload, else `fallback`.
    pub fn get_meta<'a>(&'a self, fallback: &'a T) -> &'a T {
        if !self.ready {
            return fallback;
        }
        self.resource.data.meta().unwrap_or(fallback)
    }

    /// Same as [`get_data`](Self::get_data) with `None` as the fallback.
    pub fn data(&self) -> Option<&T> {
        if !self.ready {
            return None;
        }
        let data = &self.resource.data;
        Some(data.results().unwrap_or(data))
    }
}

impl ResourceView<Value> {
    /// Deserialize the ready payload (after `results` unwrapping).
    ///
    /// `Ok(None)` while not ready.
    pub fn decode<D: DeserializeOwned>(&self) -> Result<Option<D>, serde_json::Error> {
        self.data().map(D::deserialize).transpose()
    }
}
