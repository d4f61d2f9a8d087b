use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use http::{Extensions, HeaderMap, HeaderName, HeaderValue};

use crate::Error;

/// Response header names owned by components handling the current request.
///
/// Each header name can be claimed once; the owner gets a [`HeaderSetter`]
/// and is the only writer of that header on the response. Cloning shares the
/// registry, so every layer of a stack sees the same claims.
#[derive(Clone, Debug, Default)]
pub struct Claims {
    claimed: Arc<Mutex<HashSet<HeaderName>>>,
}

impl Claims {
    /// The registry attached to a request, attaching a fresh one if needed.
    pub fn from_extensions(extensions: &mut Extensions) -> Self {
        if let Some(claims) = extensions.get::<Claims>() {
            return claims.clone();
        }

        let claims = Claims::default();
        extensions.insert(claims.clone());

        claims
    }

    pub fn claim(&self, name: HeaderName) -> Result<HeaderSetter, Error> {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);

        if !claimed.insert(name.clone()) {
            return Err(Error::HeaderClaimConflict(name));
        }

        Ok(HeaderSetter {
            name,
            values: Vec::new(),
        })
    }
}

/// Exclusive write access to one response header.
#[derive(Debug)]
pub struct HeaderSetter {
    name: HeaderName,
    values: Vec<HeaderValue>,
}

impl HeaderSetter {
    /// The header this setter writes.
    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    /// Replaces the values written by [`apply`](Self::apply), in order.
    pub fn set(&mut self, values: impl IntoIterator<Item = HeaderValue>) {
        self.values = values.into_iter().collect();
    }

    /// Writes the header, dropping whatever values it already had.
    pub fn apply(self, headers: &mut HeaderMap) {
        headers.remove(&self.name);
        for value in self.values {
            headers.append(self.name.clone(), value);
        }
    }
}
