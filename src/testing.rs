//! Scripted [`Transport`] for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::http_client::{HttpResponse, Transport};

enum Reply {
    Body(u16, String),
    Fail(String),
}

/// Answers requests from a fixed URL → reply table and records every call.
/// Unknown URLs fail like a refused connection.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(url.to_string(), Reply::Body(200, body.to_string()));
        self
    }

    pub(crate) fn status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(url.to_string(), Reply::Body(status, body.to_string()));
        self
    }

    pub(crate) fn fail(mut self, url: &str, message: &str) -> Self {
        self.routes.insert(url.to_string(), Reply::Fail(message.to_string()));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| *c == url).count()
    }

    fn reply(&self, url: &str) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.routes.get(url) {
            Some(Reply::Body(status, body)) => Ok(HttpResponse {
                status: *status,
                url: url.to_string(),
                body: body.clone(),
            }),
            Some(Reply::Fail(message)) => Err(Error::LoadFailure(message.clone())),
            None => Err(Error::LoadFailure(format!("connection refused: {url}"))),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, _referer: Option<&str>) -> Result<HttpResponse> {
        self.reply(url)
    }

    async fn post_ajax(
        &self,
        url: &str,
        _form: &[(&str, &str)],
        _referer: Option<&str>,
    ) -> Result<HttpResponse> {
        self.reply(url)
    }
}
