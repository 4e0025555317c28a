// src/fetch/source.rs

use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{MacroError, Result};

/// A fetched body together with the HTTP status it arrived with.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// Where documents come from. Production uses [`HttpSource`]; tests hand out canned bodies.
pub trait DocumentSource {
    fn get(&self, locator: &str) -> Result<Response>;
}

/// Blocking reqwest client with a fixed user agent and a per-request timeout.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(MacroError::Client)?;
        Ok(Self { client })
    }
}

impl DocumentSource for HttpSource {
    fn get(&self, locator: &str) -> Result<Response> {
        debug!(%locator, "GET");
        let wrap = |source| MacroError::Request {
            locator: locator.to_string(),
            source,
        };
        // Status is not checked here: error pages fail JSON decoding and are skipped there.
        let resp = self.client.get(locator).send().map_err(wrap)?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(wrap)?;
        Ok(Response { status, body })
    }
}

/// Blocks between request batches.
pub trait Pause {
    fn pause(&mut self, duration: Duration);
}

/// Sleeps the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&mut self, duration: Duration) {
        info!(secs = duration.as_secs(), "rate-limit cooldown");
        std::thread::sleep(duration);
    }
}
