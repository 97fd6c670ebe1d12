//! HTTP verification steps shared by the test flow.
//!
//! Pure request/assert helpers — no state kept across calls. A failure
//! here is a test assertion failure, not a system fault.

use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde_json::Value;

/// Per-request timeout for verification calls.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// The fixed external endpoint used for outbound reachability checks.
pub const EXTERNAL_BASE: &str = "https://httpbin.org";

/// Build the client used by all verification steps.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("cannot build HTTP client")
}

/// GET `url` and require a 200 response; returns the body.
pub async fn get_expect_ok(client: &reqwest::Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {url} failed"))?;
    let status = resp.status();
    ensure!(
        status == reqwest::StatusCode::OK,
        "GET {url} returned {status}, expected 200"
    );
    resp.text()
        .await
        .with_context(|| format!("cannot read body of {url}"))
}

/// POST `payload` as JSON to `url`, require a 200 response, and require
/// the response to echo the payload back.
pub async fn post_json_expect_echo(
    client: &reqwest::Client,
    url: &str,
    payload: &Value,
) -> Result<String> {
    let resp = client
        .post(url)
        .json(payload)
        .send()
        .await
        .with_context(|| format!("POST {url} failed"))?;
    let status = resp.status();
    ensure!(
        status == reqwest::StatusCode::OK,
        "POST {url} returned {status}, expected 200"
    );
    let body = resp
        .text()
        .await
        .with_context(|| format!("cannot read body of {url}"))?;

    ensure!(
        echoes_payload(&body, payload),
        "POST {url} response does not echo {payload}: {body}"
    );
    Ok(body)
}

/// GET the external UUID endpoint and require a well-formed UUID body.
pub async fn get_external_uuid(client: &reqwest::Client) -> Result<uuid::Uuid> {
    let body = get_expect_ok(client, &format!("{EXTERNAL_BASE}/uuid")).await?;
    parse_uuid_body(&body)
}

/// Extract and validate the UUID from an `{"uuid": "..."}` body.
pub fn parse_uuid_body(body: &str) -> Result<uuid::Uuid> {
    let json: Value = serde_json::from_str(body).context("UUID response is not JSON")?;
    let raw = json
        .get("uuid")
        .and_then(Value::as_str)
        .context("UUID response has no \"uuid\" field")?;
    uuid::Uuid::parse_str(raw).with_context(|| format!("malformed UUID {raw:?}"))
}

/// Whether `body` echoes `payload` as parsed JSON: either the body is the
/// payload document itself, or it carries the document under a `json`
/// field the way httpbin-style echo services respond. Parsed comparison,
/// so whitespace and key order in the response do not matter.
#[must_use]
pub fn echoes_payload(body: &str, payload: &Value) -> bool {
    let Ok(doc) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    doc == *payload || doc.get("json") == Some(payload)
}
