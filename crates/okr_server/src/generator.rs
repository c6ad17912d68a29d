//! Seam to the external OKR generator.
//!
//! The server never writes generated proposals without going through
//! `OkrService::create_generated`; this module only fetches them.

use async_trait::async_trait;
use log::{info, warn};
use okr_core::{GenerateOkrsRequest, GeneratedObjective, GeneratedOkrs};
use reqwest::Client;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
pub enum GeneratorError {
    /// No generator is configured.
    Unavailable,
    /// Transport failure or non-success status from upstream.
    Upstream(String),
    /// Upstream answered with a body that is not `{generated_okrs: [...]}`.
    InvalidResponse(String),
}

impl Display for GeneratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "OKR generator is not configured"),
            Self::Upstream(reason) => write!(f, "OKR generator request failed: {reason}"),
            Self::InvalidResponse(reason) => {
                write!(f, "OKR generator returned an invalid response: {reason}")
            }
        }
    }
}

impl Error for GeneratorError {}

/// Produces objective proposals for a business context.
#[async_trait]
pub trait OkrGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerateOkrsRequest,
    ) -> Result<Vec<GeneratedObjective>, GeneratorError>;
}

/// Stand-in used when no upstream URL is configured.
pub struct UnavailableGenerator;

#[async_trait]
impl OkrGenerator for UnavailableGenerator {
    async fn generate(
        &self,
        _request: &GenerateOkrsRequest,
    ) -> Result<Vec<GeneratedObjective>, GeneratorError> {
        Err(GeneratorError::Unavailable)
    }
}

/// POSTs the request as JSON and expects a `GeneratedOkrs` body back.
pub struct HttpOkrGenerator {
    http: Client,
    url: String,
}

impl HttpOkrGenerator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GeneratorError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GeneratorError::Upstream(err.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl OkrGenerator for HttpOkrGenerator {
    async fn generate(
        &self,
        request: &GenerateOkrsRequest,
    ) -> Result<Vec<GeneratedObjective>, GeneratorError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                warn!("event=generator_call module=server status=error reason=transport");
                GeneratorError::Upstream(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "event=generator_call module=server status=error http_status={}",
                status.as_u16()
            );
            return Err(GeneratorError::Upstream(format!("upstream status {status}")));
        }

        let body = response
            .json::<GeneratedOkrs>()
            .await
            .map_err(|err| GeneratorError::InvalidResponse(err.to_string()))?;
        info!(
            "event=generator_call module=server status=ok objectives={}",
            body.generated_okrs.len()
        );
        Ok(body.generated_okrs)
    }
}

/// Picks the HTTP generator when `url` is set, otherwise the unavailable one.
pub fn generator_from_url(
    url: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn OkrGenerator>, GeneratorError> {
    match url {
        Some(url) => Ok(Arc::new(HttpOkrGenerator::new(url, timeout)?)),
        None => Ok(Arc::new(UnavailableGenerator)),
    }
}
