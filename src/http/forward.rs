//! Forwarding allowed requests to the upstream application.
//!
//! # Responsibilities
//! - Rewrite the URI to the upstream authority
//! - Strip hop-by-hop headers, add forwarding headers
//! - Enforce the request timeout and map failures to 502/504
//!
//! # Design Decisions
//! - Bodies are streamed in both directions, never buffered
//! - The original `Host` header is preserved for the upstream

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{
        uri::{Authority, Scheme},
        Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::http::request::request_id;
use crate::observability::metrics;
use crate::security::headers::{add_forwarded_headers, strip_hop_by_hop};

/// HTTP client used for upstream requests.
pub type UpstreamClient = Client<HttpConnector, Body>;

pub fn build_client(connect_timeout: Duration) -> UpstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(connect_timeout));
    Client::builder(TokioExecutor::new()).build(connector)
}

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid upstream address '{0}'")]
    InvalidUpstream(String),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ForwardError {
    fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidUpstream(_) | ForwardError::Request(_) => "request",
            ForwardError::Upstream(_) => "connect",
            ForwardError::Timeout(_) => "timeout",
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        };
        (status, "Upstream request failed").into_response()
    }
}

/// Where allowed traffic goes.
#[derive(Debug, Clone)]
pub struct Upstream {
    authority: Authority,
    timeout: Duration,
    tls_listener: bool,
}

impl Upstream {
    pub fn new(address: &str, timeout: Duration, tls_listener: bool) -> Result<Self, ForwardError> {
        let authority = Authority::from_str(address)
            .map_err(|_| ForwardError::InvalidUpstream(address.to_string()))?;
        Ok(Self {
            authority,
            timeout,
            tls_listener,
        })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Send `request` upstream and stream the response back.
    pub async fn forward(
        &self,
        client: &UpstreamClient,
        request: Request<Body>,
    ) -> Result<Response, ForwardError> {
        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let id = request_id(request.headers()).to_string();

        let (mut parts, body) = request.into_parts();

        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some("/".parse().map_err(axum::http::Error::from)?);
        }
        parts.uri = Uri::from_parts(uri_parts)
            .map_err(|_| ForwardError::InvalidUpstream(self.authority.to_string()))?;

        strip_hop_by_hop(&mut parts.headers);
        add_forwarded_headers(&mut parts.headers, client_ip, self.tls_listener);

        tracing::debug!(request_id = %id, uri = %parts.uri, "Forwarding request");

        let upstream_request = Request::from_parts(parts, body);
        let response = match tokio::time::timeout(self.timeout, client.request(upstream_request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(record(ForwardError::Upstream(e), &id)),
            Err(_) => return Err(record(ForwardError::Timeout(self.timeout), &id)),
        };

        let (mut parts, body): (_, Incoming) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

fn record(err: ForwardError, request_id: &str) -> ForwardError {
    metrics::record_upstream_error(err.kind());
    tracing::error!(request_id = %request_id, error = %err, "Upstream error");
    err
}
