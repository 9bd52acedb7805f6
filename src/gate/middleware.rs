//! Gate middleware.
//!
//! Runs before every handler: classify, verify, decide, then either pass the
//! request on or answer with a redirect.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::gate::decision::{Decision, Evidence};
use crate::gate::{Gate, SharedGate, UserCredential};
use crate::observability::metrics;

pub async fn gate_middleware(
    State(shared): State<SharedGate>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let gate = shared.load_full();
    let path = request.uri().path().to_string();

    let (decision, evidence) = gate.evaluate(&path, request.headers());

    metrics::record_gate_decision(decision.category.as_str(), decision.label());
    tracing::debug!(
        path = %path,
        category = %decision.category,
        action = decision.label(),
        "Gate decision"
    );

    // Clients never get to assert an identity themselves.
    if let Some(name) = gate.identity_header() {
        request.headers_mut().remove(name);
    }

    if let Evidence::User(UserCredential::Valid(claims)) = evidence {
        if let (Some(name), Some(subject)) = (gate.identity_header(), claims.subject()) {
            match HeaderValue::from_str(subject) {
                Ok(value) => {
                    request.headers_mut().insert(name.clone(), value);
                }
                Err(_) => tracing::warn!(path = %path, "Subject is not a valid header value"),
            }
        }
    }

    if decision.action.forwards() {
        let mut response = next.run(request).await;
        if decision.clear_session_cookie {
            response
                .headers_mut()
                .append(SET_COOKIE, gate.cookies().clear_session_cookie());
        }
        return response;
    }

    redirect(&decision, &gate)
}

fn redirect(decision: &Decision, gate: &Gate) -> Response {
    let Some(location) = decision.action.location() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let mut response = Redirect::temporary(&location).into_response();
    if decision.clear_session_cookie {
        response
            .headers_mut()
            .append(SET_COOKIE, gate.cookies().clear_session_cookie());
    }
    response
}
