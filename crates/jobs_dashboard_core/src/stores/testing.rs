//! In-crate doubles for the store tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{lock, StorePorts};
use crate::persistence::MemoryStore;
use crate::ports::{FixedClock, HttpClient, HttpResponse, PortError, PortResult};
use crate::query::QueryParams;

#[derive(Debug, Clone)]
pub struct Call {
    pub path: String,
    pub params: QueryParams,
    pub body: Option<Value>,
}

/// Routes each path to a canned response and records every request.
#[derive(Default)]
pub struct MockHttp {
    routes: Mutex<HashMap<String, PortResult<HttpResponse>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn ok(&self, path: &str, payload: Value) {
        self.respond(path, Ok(HttpResponse::json_body(&payload)));
    }

    pub fn fail(&self, path: &str, error: PortError) {
        self.respond(path, Err(error));
    }

    /// A 4xx/5xx carrying `{"detail": ...}`.
    pub fn fail_with_detail(&self, path: &str, detail: &str) {
        let body = serde_json::json!({ "detail": detail }).to_string();
        self.fail(path, PortError::from_response(500, body.as_bytes()));
    }

    pub fn respond(&self, path: &str, response: PortResult<HttpResponse>) {
        lock(&self.routes).insert(path.to_string(), response);
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    pub fn last_call(&self, path: &str) -> Option<Call> {
        self.calls_to(path).pop()
    }

    fn answer(&self, call: Call) -> PortResult<HttpResponse> {
        let response = lock(&self.routes)
            .get(&call.path)
            .cloned()
            .unwrap_or_else(|| Err(PortError::network(format!("no route for {}", call.path))));
        lock(&self.calls).push(call);
        response
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn get(&self, path: &str, params: &QueryParams) -> PortResult<HttpResponse> {
        self.answer(Call {
            path: path.to_string(),
            params: params.clone(),
            body: None,
        })
    }

    async fn post(&self, path: &str, body: &Value) -> PortResult<HttpResponse> {
        self.answer(Call {
            path: path.to_string(),
            params: QueryParams::new(),
            body: Some(body.clone()),
        })
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The day every store test runs on.
pub fn today() -> NaiveDate {
    day(2025, 3, 15)
}

pub fn ports(http: &Arc<MockHttp>) -> (Arc<MemoryStore>, StorePorts) {
    let storage = Arc::new(MemoryStore::new());
    let ports = StorePorts {
        http: http.clone(),
        storage: storage.clone(),
        clock: Arc::new(FixedClock::on(today())),
    };
    (storage, ports)
}
