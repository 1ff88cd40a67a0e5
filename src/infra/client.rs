use crate::domain::{QueryCriteria, SessionRecord};
use crate::infra::build_query_params;
use std::time::Duration;
use thiserror::Error;

const API_ACCEPT: &str = "application/vnd.sessq.v1+json";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("session query failed: {0}")]
    Http(String),

    #[error("invalid session response: {0}")]
    Decode(String),
}

/// A bounded query against the remote session endpoint. Implemented over
/// HTTP in production; tests drive the pager with canned outcomes instead.
pub trait SessionSource: Send + Sync {
    fn fetch(
        &self,
        criteria: &QueryCriteria,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<SessionRecord>, FetchError>;
}

pub struct HttpSessionSource {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpSessionSource {
    pub fn new(endpoint: String) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(FETCH_TIMEOUT))
            .build();
        Self {
            agent: config.into(),
            endpoint,
        }
    }
}

impl SessionSource for HttpSessionSource {
    fn fetch(
        &self,
        criteria: &QueryCriteria,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<SessionRecord>, FetchError> {
        let url = format!("{}/api/sessions", self.endpoint);
        let mut request = self
            .agent
            .get(&url)
            .header("Accept", API_ACCEPT)
            .header(
                "User-Agent",
                &format!("sessq/{}", env!("CARGO_PKG_VERSION")),
            );

        for (key, value) in build_query_params(criteria, offset, limit) {
            request = request.query(key, &value);
        }

        let mut response = request
            .call()
            .map_err(|error| FetchError::Http(error.to_string()))?;

        response
            .body_mut()
            .read_json::<Vec<SessionRecord>>()
            .map_err(|error| FetchError::Decode(error.to_string()))
    }
}
