use serde::Serialize;
use serde_json::Value;

use crate::error::NetaError;
use crate::transport::{RequestDescriptor, Transport};

/// Which resource answered a gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fetched<T> {
    pub body: T,
    pub provenance: Provenance,
}

impl<T> Fetched<T> {
    pub fn try_map<U, F>(self, f: F) -> Result<Fetched<U>, NetaError>
    where
        F: FnOnce(T) -> Result<U, NetaError>,
    {
        Ok(Fetched {
            body: f(self.body)?,
            provenance: self.provenance,
        })
    }
}

/// Executes a primary request and, when it fails at the transport level,
/// exactly one fallback request. Holds no mutable state, so concurrent or
/// overlapping calls never interfere.
#[derive(Clone)]
pub struct FallbackGateway<T: Transport> {
    transport: T,
}

impl<T: Transport> FallbackGateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Single request with no fallback; every error reaches the caller.
    pub fn fetch(&self, request: &RequestDescriptor) -> Result<Value, NetaError> {
        self.transport.request(request)
    }

    /// Network failures and non-success statuses on `primary` are absorbed
    /// and `fallback` is issued once. A primary that answers 2xx with an
    /// undecodable body is surfaced as is. Errors from `fallback` propagate.
    pub fn fetch_with_fallback(
        &self,
        primary: &RequestDescriptor,
        fallback: &RequestDescriptor,
    ) -> Result<Fetched<Value>, NetaError> {
        match self.transport.request(primary) {
            Ok(body) => Ok(Fetched {
                body,
                provenance: Provenance::Live,
            }),
            Err(err) if err.kind().absorbed_by_fallback() => {
                tracing::warn!(
                    primary = %primary.url,
                    fallback = %fallback.url,
                    error = %err,
                    "primary request failed, falling back to snapshot"
                );
                let body = self.transport.request(fallback)?;
                tracing::info!(url = %fallback.url, "served from snapshot");
                Ok(Fetched {
                    body,
                    provenance: Provenance::Snapshot,
                })
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct ScriptedTransport {
        responses: HashMap<String, Result<Value, (u16, String)>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn respond(mut self, url: &str, response: Result<Value, (u16, String)>) -> Self {
            self.responses.insert(url.to_string(), response);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn request(&self, request: &RequestDescriptor) -> Result<Value, NetaError> {
            self.calls.lock().unwrap().push(request.url.clone());
            match self.responses.get(&request.url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err((0, message))) => Err(NetaError::Network(message.clone())),
                Some(Err((1, message))) => Err(NetaError::Decode(message.clone())),
                Some(Err((status, message))) => Err(NetaError::HttpStatus {
                    status: *status,
                    message: message.clone(),
                }),
                None => Err(NetaError::Network("connection refused".to_string())),
            }
        }
    }

    const PRIMARY: &str = "http://api/datasets";
    const FALLBACK: &str = "file:///data/datasets.json";

    fn run(transport: &ScriptedTransport) -> Result<Fetched<Value>, NetaError> {
        FallbackGateway::new(transport).fetch_with_fallback(
            &RequestDescriptor::get(PRIMARY),
            &RequestDescriptor::get(FALLBACK),
        )
    }

    #[test]
    fn server_error_resolves_with_fallback_body() {
        let transport = ScriptedTransport::default()
            .respond(PRIMARY, Err((500, "boom".to_string())))
            .respond(FALLBACK, Ok(json!({"datasets": []})));
        let fetched = run(&transport).unwrap();
        assert_eq!(fetched.body, json!({"datasets": []}));
        assert_eq!(fetched.provenance, Provenance::Snapshot);
    }

    #[test]
    fn live_success_never_touches_fallback() {
        let transport = ScriptedTransport::default()
            .respond(PRIMARY, Ok(json!({"datasets": [], "pages": 1})))
            .respond(FALLBACK, Ok(json!({"datasets": []})));
        let fetched = run(&transport).unwrap();
        assert_eq!(fetched.provenance, Provenance::Live);
        assert_eq!(transport.calls(), vec![PRIMARY.to_string()]);
    }

    #[test]
    fn network_failure_tries_primary_once_then_fallback() {
        let transport = ScriptedTransport::default()
            .respond(PRIMARY, Err((0, "refused".to_string())))
            .respond(FALLBACK, Ok(json!({"datasets": []})));
        run(&transport).unwrap();
        assert_eq!(
            transport.calls(),
            vec![PRIMARY.to_string(), FALLBACK.to_string()]
        );
    }

    #[test]
    fn fallback_failure_propagates() {
        let transport = ScriptedTransport::default()
            .respond(PRIMARY, Err((503, "down".to_string())))
            .respond(FALLBACK, Err((1, "expected value".to_string())));
        assert_matches!(run(&transport), Err(NetaError::Decode(_)));
    }

    #[test]
    fn primary_decode_failure_is_surfaced() {
        let transport = ScriptedTransport::default()
            .respond(PRIMARY, Err((1, "trailing characters".to_string())))
            .respond(FALLBACK, Ok(json!({"datasets": []})));
        assert_matches!(run(&transport), Err(NetaError::Decode(_)));
        assert_eq!(transport.calls().len(), 1);
    }
}
