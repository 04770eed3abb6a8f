//! Login and static-asset proxy handlers.
//!
//! `/glogin/*` relays the login host: page URLs are rewritten back to the
//! proxy, the bridge script is injected into HTML, and the first
//! `oauth_token` cookie is captured for the current login session.
//! `/gproxy/{domain}/*` relays allow-listed asset hosts without touching
//! bodies.

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, Method, Uri, header},
    response::Response,
};
use droidauth_google::compression::{gunzip, is_gzip_encoding};
use futures::StreamExt;

use crate::bridge::bridge_script_tag;
use crate::error::{ProxyError, ServerError};
use crate::rewrite::{
    BodyKind, DROPPED_LOGIN_HEADERS, DROPPED_STATIC_HEADERS, HOP_BY_HOP_HEADERS, LOGIN_COOKIE,
    extract_cookie_value, inject_script, is_allowed_static_domain, localize_set_cookie,
    rewrite_body, rewrite_location, rewrite_referer,
};
use crate::state::AppState;

/// Request headers never forwarded to the login host.
const SKIPPED_LOGIN_REQUEST_HEADERS: &[&str] = &["host", "connection", "accept-encoding"];

/// Request headers never forwarded to asset hosts.
const SKIPPED_STATIC_REQUEST_HEADERS: &[&str] = &["host", "connection"];

/// Handle ANY /glogin and /glogin/{*path}
pub async fn login_proxy(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let session = state.session();
    session.mark_request();

    let path = uri.path().strip_prefix("/glogin").unwrap_or_default();
    let path = if path.is_empty() { "/" } else { path };
    let upstream_url = with_query(format!("{}{}", state.config.login_origin, path), &uri);
    tracing::debug!(method = %method, path = %uri.path(), upstream = %upstream_url, "Proxying login request");

    let base = state.config.public_base();
    let snapshot = state.store.snapshot();

    let mut out_headers = copy_headers(&headers, SKIPPED_LOGIN_REQUEST_HEADERS);
    out_headers.insert(header::USER_AGENT, header_value(&snapshot.user_agent())?);
    out_headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    if let Some(referer) = headers.get(header::REFERER).and_then(|v| v.to_str().ok()) {
        let rewritten = rewrite_referer(referer, &base, &state.config.login_origin);
        out_headers.insert(header::REFERER, header_value(&rewritten)?);
    }
    if headers.contains_key(header::ORIGIN) {
        out_headers.insert(header::ORIGIN, header_value(&state.config.login_origin)?);
    }

    let request = state
        .upstream
        .request(method, &upstream_url)
        .headers(out_headers);
    let upstream = send(request, body).await?;

    let status = upstream.status();
    let mut response_headers = HeaderMap::new();

    for value in upstream.headers().get_all(header::SET_COOKIE) {
        let Ok(set_cookie) = value.to_str() else {
            continue;
        };
        if let Some(token) = extract_cookie_value(set_cookie, LOGIN_COOKIE)
            && session.capture(token, state.exchange.clone())
        {
            tracing::info!(session = %session.id(), "Login cookie captured, exchange started");
        }
        if let Ok(v) = HeaderValue::from_str(&localize_set_cookie(set_cookie)) {
            response_headers.append(header::SET_COOKIE, v);
        }
    }

    for (name, value) in upstream.headers() {
        let lower = name.as_str();
        if DROPPED_LOGIN_HEADERS.contains(&lower) || HOP_BY_HOP_HEADERS.contains(&lower) {
            continue;
        }
        if *name == header::LOCATION
            && let Ok(location) = value.to_str()
        {
            response_headers.append(name.clone(), header_value(&rewrite_location(location, &base))?);
            continue;
        }
        response_headers.append(name.clone(), value.clone());
    }

    let kind = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(BodyKind::Binary, BodyKind::from_content_type);
    let gzipped = upstream
        .headers()
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_gzip_encoding);

    let body = match (kind, gzipped) {
        (BodyKind::Binary, false) => stream_body(upstream),
        (kind, gzipped) => {
            let raw = read_body(upstream, gzipped).await?;
            match kind {
                _ if raw.is_empty() => Body::empty(),
                BodyKind::Binary => Body::from(raw),
                BodyKind::Text => Body::from(rewrite_body(&String::from_utf8_lossy(&raw), &base)),
                BodyKind::Html => {
                    let content = rewrite_body(&String::from_utf8_lossy(&raw), &base);
                    let tag = bridge_script_tag(&snapshot, &base);
                    Body::from(inject_script(&content, &tag))
                }
            }
        }
    };

    Ok(build_response(status, response_headers, body))
}

/// Handle ANY /gproxy/{*path}
pub async fn static_proxy(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let Some((domain, rest)) = path.split_once('/') else {
        return Err(ServerError::BadRequest("bad proxy path".to_string()).into());
    };
    if !is_allowed_static_domain(domain) {
        return Err(ServerError::Forbidden(domain.to_string()).into());
    }

    let upstream_url = with_query(
        format!("{}://{}/{}", state.config.static_scheme, domain, rest),
        &uri,
    );
    tracing::debug!(method = %method, upstream = %upstream_url, "Proxying static request");

    let request = state
        .upstream
        .request(method, &upstream_url)
        .headers(copy_headers(&headers, SKIPPED_STATIC_REQUEST_HEADERS));
    let upstream = send(request, body).await?;

    let status = upstream.status();
    let mut response_headers = HeaderMap::new();
    for (name, value) in upstream.headers() {
        let lower = name.as_str();
        if DROPPED_STATIC_HEADERS.contains(&lower) || HOP_BY_HOP_HEADERS.contains(&lower) {
            continue;
        }
        response_headers.append(name.clone(), value.clone());
    }

    Ok(build_response(status, response_headers, stream_body(upstream)))
}

fn with_query(mut url: String, uri: &Uri) -> String {
    if let Some(query) = uri.query() {
        url.push('?');
        url.push_str(query);
    }
    url
}

fn copy_headers(headers: &HeaderMap, skip: &[&str]) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if skip.contains(&name.as_str()) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

async fn send(
    request: reqwest::RequestBuilder,
    body: Bytes,
) -> Result<reqwest::Response, ServerError> {
    let request = if body.is_empty() {
        request
    } else {
        request.body(body)
    };
    request
        .send()
        .await
        .map_err(|e| ServerError::Upstream(e.to_string()))
}

fn header_value(value: &str) -> Result<HeaderValue, ServerError> {
    HeaderValue::from_str(value)
        .map_err(|e| ServerError::Internal(format!("invalid header value: {}", e)))
}

fn stream_body(upstream: reqwest::Response) -> Body {
    let stream = upstream
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    Body::from_stream(stream)
}

async fn read_body(upstream: reqwest::Response, gzipped: bool) -> Result<Vec<u8>, ServerError> {
    let raw = upstream
        .bytes()
        .await
        .map_err(|e| ServerError::Internal(format!("read upstream body: {}", e)))?;
    // 204, 304 and HEAD replies keep the encoding header but carry no body.
    if gzipped && !raw.is_empty() {
        gunzip(&raw).map_err(|e| ServerError::Internal(format!("gzip error: {}", e)))
    } else {
        Ok(raw.to_vec())
    }
}

fn build_response(status: reqwest::StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
