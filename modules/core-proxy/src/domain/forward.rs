//! Construction of the outbound call to the core service.

use http::header::{
    AUTHORIZATION, CONNECTION, CONTENT_LENGTH, COOKIE, HOST, HeaderName, HeaderValue,
    PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
};
use http::HeaderMap;
use url::Url;

use super::error::DomainError;
use super::model::{Credential, ForwardedRequest, InboundRequest};

/// Inbound headers that never reach the core service.
fn is_stripped(name: &HeaderName) -> bool {
    [
        AUTHORIZATION,
        HOST,
        CONTENT_LENGTH,
        CONNECTION,
        PROXY_AUTHENTICATE,
        PROXY_AUTHORIZATION,
        TE,
        TRAILER,
        TRANSFER_ENCODING,
        UPGRADE,
        COOKIE,
    ]
    .contains(name)
}

/// Join `base` and `path` with exactly one `/` and carry over `query`.
///
/// # Errors
/// Returns `DomainError::RequestBuild` when the result is not a valid URL.
pub fn build_url(base: &Url, path: &str, query: Option<&str>) -> Result<Url, DomainError> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let mut raw = format!("{base}/{path}");
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        raw.push('?');
        raw.push_str(query);
    }
    Url::parse(&raw).map_err(|e| DomainError::request_build("url", e.to_string()))
}

/// Copy the inbound headers for the core call and set `Authorization`.
///
/// Any inbound `Authorization` is dropped; a credential, when present,
/// becomes `Bearer <token>`.
///
/// # Errors
/// Returns `DomainError::RequestBuild` when the credential is not a valid
/// header value.
pub fn forward_headers(
    inbound: &HeaderMap,
    credential: Option<&Credential>,
) -> Result<HeaderMap, DomainError> {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
    for (name, value) in inbound {
        if is_stripped(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Some(credential) = credential {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
            .map_err(|e| DomainError::request_build("authorization", e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

/// Build the request sent to the core service for `inbound`.
///
/// # Errors
/// Returns `DomainError::RequestBuild` when the URL or headers are invalid.
pub fn build_forward(
    base: &Url,
    path: &str,
    inbound: &InboundRequest,
    credential: Option<&Credential>,
) -> Result<ForwardedRequest, DomainError> {
    Ok(ForwardedRequest {
        method: inbound.method.clone(),
        url: build_url(base, path, inbound.uri.query())?,
        headers: forward_headers(&inbound.headers, credential)?,
        body: inbound.body.clone(),
    })
}
