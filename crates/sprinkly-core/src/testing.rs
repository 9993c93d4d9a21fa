// Test doubles shared by the unit tests in this crate.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;
use sprinkly_api::{Endpoint, Error, JsonObject, ResultCode, Transport};

use crate::clock::ManualClock;
use crate::context::DeviceContext;
use crate::model::FirmwareVersion;

/// In-memory transport with canned responses and a call log.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<HashMap<Endpoint, Value>>,
    calls: Mutex<Vec<(Endpoint, Vec<(String, String)>)>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_response(self, endpoint: impl Into<Endpoint>, body: Value) -> Self {
        self.set_response(endpoint, body);
        self
    }

    pub(crate) fn set_response(&self, endpoint: impl Into<Endpoint>, body: Value) {
        self.responses.lock().unwrap().insert(endpoint.into(), body);
    }

    pub(crate) fn calls(&self) -> Vec<(Endpoint, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self, endpoint: impl Into<Endpoint>) -> usize {
        let endpoint = endpoint.into();
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .count()
    }

    fn respond(&self, endpoint: Endpoint) -> Result<JsonObject, Error> {
        let body = self.responses.lock().unwrap().get(&endpoint).cloned();
        let body = match (body, endpoint) {
            (Some(body), _) => body,
            (None, Endpoint::Write(_)) => serde_json::json!({ "result": 1 }),
            (None, Endpoint::Read(_)) => {
                return Err(Error::HttpStatus {
                    endpoint: endpoint.to_string(),
                    status: 404,
                });
            }
        };

        let Value::Object(object) = body else {
            return Err(Error::Deserialization {
                message: "expected a JSON object".into(),
                body: body.to_string(),
            });
        };
        if let Some(code) = object.get("result").and_then(Value::as_i64) {
            let code = ResultCode::from_code(code);
            if code != ResultCode::Success {
                return Err(Error::InvalidRequest { code });
            }
        }
        Ok(object)
    }
}

impl Transport for FakeTransport {
    fn execute<'a>(
        &'a self,
        endpoint: Endpoint,
        params: &'a [(String, String)],
    ) -> BoxFuture<'a, Result<JsonObject, Error>> {
        self.calls.lock().unwrap().push((endpoint, params.to_vec()));
        let result = self.respond(endpoint);
        async move { result }.boxed()
    }
}

/// A context that has already completed the firmware handshake.
pub(crate) fn connected_context(
    transport: Arc<FakeTransport>,
    firmware: FirmwareVersion,
    clock: Arc<ManualClock>,
) -> Arc<DeviceContext> {
    let ctx = DeviceContext::new(transport).with_clock(clock);
    ctx.set_firmware(firmware);
    ctx.set_connected(true);
    Arc::new(ctx)
}

/// Build `(name, value)` query parameters from string slices.
pub(crate) fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}
