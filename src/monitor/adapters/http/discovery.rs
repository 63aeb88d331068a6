//! `tools/list` discovery over HTTP POST.
//!
//! Response bodies are read up to [`MAX_DISCOVERY_BODY_BYTES`]; only a short
//! excerpt of a rejected body is kept on the returned error.

use super::{
    HttpMcpClient,
    protocol::{JsonRpcRequest, decode_tools_list},
};
use crate::monitor::{
    domain::{AuthHeaders, BaseUrl, ServerId, ToolDescriptor},
    ports::{DiscoveryError, DiscoveryResult, ToolDiscovery},
};
use async_trait::async_trait;
use reqwest::{
    Response,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use tracing::debug;

const ACCEPT_DISCOVERY: &str = "application/json, text/event-stream";

/// Largest `tools/list` body read from a server.
pub const MAX_DISCOVERY_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Characters of a rejected body kept on the error.
pub const RETAINED_ERROR_BODY_CHARS: usize = 4096;

#[async_trait]
impl ToolDiscovery for HttpMcpClient {
    async fn fetch_tools(
        &self,
        server_id: ServerId,
        base_url: &BaseUrl,
        headers: &AuthHeaders,
    ) -> DiscoveryResult<Vec<ToolDescriptor>> {
        let response = self
            .http
            .post(base_url.as_url().clone())
            .timeout(self.settings.discovery_timeout)
            .headers(request_headers(server_id, headers)?)
            .json(&JsonRpcRequest::tools_list())
            .send()
            .await
            .map_err(|err| DiscoveryError::transport(server_id, err))?;

        let status = response.status();
        let body = read_capped(server_id, response).await?;

        if !status.is_success() {
            return Err(DiscoveryError::Status {
                server_id,
                status: status.as_u16(),
                body: retained(&body.text),
            });
        }

        if body.truncated {
            return Err(DiscoveryError::Malformed {
                server_id,
                status: status.as_u16(),
                reason: format!("response body exceeds {MAX_DISCOVERY_BODY_BYTES} bytes"),
                body: retained(&body.text),
            });
        }

        match decode_tools_list(&body.text) {
            Ok(tools) => {
                debug!(server_id = %server_id, tools = tools.len(), "tools/list decoded");
                Ok(tools)
            }
            Err(err) => Err(DiscoveryError::Malformed {
                server_id,
                status: status.as_u16(),
                reason: err.to_string(),
                body: retained(&body.text),
            }),
        }
    }
}

struct CappedBody {
    text: String,
    truncated: bool,
}

/// Reads at most [`MAX_DISCOVERY_BODY_BYTES`] and stops at the cap.
async fn read_capped(server_id: ServerId, mut response: Response) -> DiscoveryResult<CappedBody> {
    let mut buffer = Vec::new();
    let mut truncated = false;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|err| DiscoveryError::transport(server_id, err))?
    {
        let room = MAX_DISCOVERY_BODY_BYTES.saturating_sub(buffer.len());
        if chunk.len() > room {
            buffer.extend(chunk.iter().take(room));
            truncated = true;
            break;
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(CappedBody {
        text: String::from_utf8_lossy(&buffer).into_owned(),
        truncated,
    })
}

fn retained(body: &str) -> String {
    body.chars().take(RETAINED_ERROR_BODY_CHARS).collect()
}

fn request_headers(server_id: ServerId, auth: &AuthHeaders) -> DiscoveryResult<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(auth.len().saturating_add(2));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_DISCOVERY));

    for (name, value) in auth.iter() {
        let invalid = || DiscoveryError::InvalidHeader {
            server_id,
            header: name.to_owned(),
        };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let mut header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        header_value.set_sensitive(true);
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_headers_are_marked_sensitive() {
        let mut auth = AuthHeaders::empty();
        auth.insert("Authorization", "Bearer secret");

        let headers = request_headers(ServerId::new(1), &auth).expect("headers should encode");

        let authorization = headers.get("authorization").expect("header present");
        assert!(authorization.is_sensitive());
        assert_eq!(
            headers.get(ACCEPT).and_then(|value| value.to_str().ok()),
            Some(ACCEPT_DISCOVERY)
        );
    }

    #[test]
    fn retained_body_stops_on_a_char_boundary() {
        let body = "ü".repeat(RETAINED_ERROR_BODY_CHARS + 1);

        let kept = retained(&body);

        assert_eq!(kept.chars().count(), RETAINED_ERROR_BODY_CHARS);
        assert!(kept.chars().all(|ch| ch == 'ü'));
    }

    #[test]
    fn unencodable_header_value_is_rejected() {
        let mut auth = AuthHeaders::empty();
        auth.insert("X-API-Key", "line\nbreak");

        let result = request_headers(ServerId::new(7), &auth);

        assert!(matches!(
            result,
            Err(DiscoveryError::InvalidHeader { ref header, .. }) if header == "X-API-Key"
        ));
    }
}
