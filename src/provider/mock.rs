//! In-memory transport for tests.

use std::{collections::HashMap, sync::Arc, sync::Mutex, time::Duration};

use async_trait::async_trait;
use serde_json::Value;

use crate::provider::{
    api::{RawResponse, Transport},
    Gateway, GatewayError, Method, ProviderConfig, DEFAULT_BASE_URL,
};

/// Canned answer for one provider method.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Body(String),
    Status(u16),
    Fail,
}

#[derive(Debug, Clone)]
struct Route {
    /// Only answer calls carrying this parameter value.
    when: Option<(&'static str, String)>,
    reply: Reply,
    delay: Duration,
}

impl Route {
    fn matches(&self, query: &[(&str, &str)]) -> bool {
        self.when
            .as_ref()
            .is_some_and(|(key, value)| query.iter().any(|(k, v)| k == key && v == value))
    }
}

/// Answers by the `method` query parameter; unknown methods fail at the transport level.
/// A route bound to a parameter value wins over the method's plain route.
#[derive(Default)]
pub struct MockTransport {
    routes: HashMap<&'static str, Vec<Route>>,
    calls: Mutex<Vec<Vec<(String, String)>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, reply: Reply) -> Self {
        self.on_delayed(method, Duration::ZERO, reply)
    }

    pub fn on_delayed(mut self, method: Method, delay: Duration, reply: Reply) -> Self {
        self.routes.entry(method.as_str()).or_default().push(Route {
            when: None,
            reply,
            delay,
        });
        self
    }

    /// Answer `method` with `reply` only when the call carries `key=value`.
    pub fn on_param(mut self, method: Method, key: &'static str, value: &str, reply: Reply) -> Self {
        self.routes.entry(method.as_str()).or_default().push(Route {
            when: Some((key, value.to_owned())),
            reply,
            delay: Duration::ZERO,
        });
        self
    }

    /// Query strings of every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<Vec<(String, String)>> {
        self.calls.lock().unwrap().clone()
    }

    /// Methods called so far, in arrival order.
    pub fn methods(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|q| q.into_iter().find(|(k, _)| k == "method").map(|(_, v)| v))
            .collect()
    }

    pub fn gateway(self) -> Arc<Gateway> {
        Self::gateway_for(Arc::new(self))
    }

    pub fn gateway_for(transport: Arc<Self>) -> Arc<Gateway> {
        Arc::new(Gateway::new(
            ProviderConfig {
                base_url: DEFAULT_BASE_URL.to_owned(),
                api_key: "test-key".to_owned(),
            },
            transport,
        ))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, _url: &str, query: &[(&str, &str)]) -> Result<RawResponse, GatewayError> {
        let owned: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        self.calls.lock().unwrap().push(owned);

        let method = query
            .iter()
            .find(|(k, _)| *k == "method")
            .map(|(_, v)| *v)
            .unwrap_or_default();
        let routes = self.routes.get(method).map(Vec::as_slice).unwrap_or_default();
        let route = routes
            .iter()
            .find(|r| r.matches(query))
            .or_else(|| routes.iter().rev().find(|r| r.when.is_none()))
            .cloned();
        let Some(route) = route else {
            return Err(GatewayError::Transport(format!("no route for {method}")));
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        match route.reply {
            Reply::Json(value) => Ok(RawResponse {
                status: 200,
                body: value.to_string(),
            }),
            Reply::Body(body) => Ok(RawResponse { status: 200, body }),
            Reply::Status(status) => Ok(RawResponse {
                status,
                body: String::new(),
            }),
            Reply::Fail => Err(GatewayError::Transport("connection refused".to_owned())),
        }
    }
}
