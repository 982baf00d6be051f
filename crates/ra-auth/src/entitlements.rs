use reqwest::header::HeaderMap;
use tracing::{debug, instrument};
use url::Url;

use crate::errors::{RaAuthError, Result};
use crate::http::HttpSession;
use crate::models::EntitlementsResponse;

/// Trade an access token for an entitlements token.
///
/// `bearer_headers` must carry the `Authorization` header of the access
/// token being exchanged.
#[instrument(skip_all, fields(url = %url))]
pub async fn exchange_entitlements(
    http: &HttpSession,
    url: &Url,
    bearer_headers: HeaderMap,
) -> Result<String> {
    debug!("Exchanging access token for entitlements token");
    let response = http
        .post(url, &serde_json::json!({}), bearer_headers)
        .await?;

    let entitlements: EntitlementsResponse = serde_json::from_value(response.json()?)
        .map_err(|e| RaAuthError::MalformedResponse(format!("unexpected entitlements body: {e}")))?;

    entitlements.entitlements_token.ok_or_else(|| {
        RaAuthError::MalformedResponse("missing entitlements_token".to_string())
    })
}
