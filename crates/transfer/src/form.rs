//! Upload target configuration and signed-form credential fetch.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TransferError;

/// Where uploads go. Exactly one mode is active per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    /// Fetch signed form fields from a credentials endpoint at init.
    SignedForm { credentials_endpoint: String },
    /// Post straight to a known URL, optionally under a key prefix.
    Direct {
        upload_url: String,
        prefix: Option<String>,
    },
}

/// Signed form fields attached to every transfer in signed-form mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFormInputs {
    pub policy: String,
    pub credential: String,
    pub algorithm: String,
    pub date: String,
    pub signature: String,
    pub expires: String,
    pub cache_control: String,
}

/// Wire shape of the credentials endpoint response.
#[derive(Debug, Deserialize)]
struct FormInputsResponse {
    #[serde(rename = "inputsValues")]
    inputs_values: InputsValues,
    #[serde(rename = "formUrl")]
    form_url: String,
    directory: String,
}

#[derive(Debug, Deserialize)]
struct InputsValues {
    policy: String,
    #[serde(rename = "X-amz-credential")]
    credential: String,
    #[serde(rename = "X-amz-algorithm")]
    algorithm: String,
    #[serde(rename = "X-amz-date")]
    date: String,
    #[serde(rename = "X-amz-signature")]
    signature: String,
    #[serde(rename = "Expires")]
    expires: String,
    #[serde(rename = "CacheControl")]
    cache_control: String,
}

/// Fully resolved transport configuration. Nothing downstream runs
/// until this exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Decoded URL every multipart form is posted to.
    pub post_url: String,
    /// Signed fields (`None` in direct mode).
    pub form_inputs: Option<UploadFormInputs>,
    /// Directory prefix segments for object keys.
    pub directory: Vec<String>,
}

impl ResolvedTarget {
    /// Resolves a direct-URL target without a network round trip.
    pub fn direct(upload_url: &str, prefix: Option<String>) -> Self {
        Self {
            post_url: percent_decode_str(upload_url).decode_utf8_lossy().into_owned(),
            form_inputs: None,
            directory: prefix.into_iter().collect(),
        }
    }
}

/// Fetches signed upload form fields from the credentials endpoint.
///
/// The endpoint speaks a fixed JSON-RPC-ish contract: POST
/// `{"method": "getUploadFormInputs"}`, answer with the signed inputs,
/// the form URL, and the tenant directory.
pub async fn fetch_form_inputs(
    client: &reqwest::Client,
    endpoint: &str,
) -> Result<ResolvedTarget, TransferError> {
    let response = client
        .post(endpoint)
        .header("X-Requested-With", "XMLHttpRequest")
        .json(&serde_json::json!({ "method": "getUploadFormInputs" }))
        .send()
        .await?
        .error_for_status()?;

    let parsed: FormInputsResponse = response
        .json()
        .await
        .map_err(|err| TransferError::Credentials(err.to_string()))?;
    debug!(directory = %parsed.directory, "fetched upload form inputs");

    let inputs = parsed.inputs_values;
    Ok(ResolvedTarget {
        post_url: percent_decode_str(&parsed.form_url)
            .decode_utf8_lossy()
            .into_owned(),
        form_inputs: Some(UploadFormInputs {
            policy: inputs.policy,
            credential: inputs.credential,
            algorithm: inputs.algorithm,
            date: inputs.date,
            signature: inputs.signature,
            expires: inputs.expires,
            cache_control: inputs.cache_control,
        }),
        directory: vec![parsed.directory],
    })
}
