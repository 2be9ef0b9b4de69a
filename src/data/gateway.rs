//! The four backend operations, as a trait the orchestrator is written against.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::{DatasetFiles, Material, PricePrediction, RecommendationResult, UploadReceipt};
use crate::error::RemoteError;

pub const MATERIALS_FALLBACK: &str = "Could not load materials.";
pub const PREDICT_FALLBACK: &str = "Price prediction failed.";
pub const RECOMMEND_FALLBACK: &str = "Vendor recommendation failed.";
pub const UPLOAD_FALLBACK: &str = "Upload failed.";

/// Typed access to the backend.
///
/// Every operation is a single attempt; callers decide whether to let the user
/// retry. An empty material list is a valid result, not an error.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn list_materials(&self) -> Result<Vec<Material>, RemoteError>;

    async fn predict_prices(&self, material_id: &str) -> Result<PricePrediction, RemoteError>;

    async fn recommend_vendor(&self, material_id: &str) -> Result<RecommendationResult, RemoteError>;

    async fn upload_datasets(&self, files: &DatasetFiles) -> Result<UploadReceipt, RemoteError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Turn an HTTP status and body into the operation's success value or a `RemoteError`.
///
/// - 2xx with a body that decodes as `T` -> `Ok`
/// - 2xx with anything else -> `Transport` with `fallback`
/// - non-2xx -> `Server` with the body's `error` field, or `fallback`
pub fn decode_response<T: DeserializeOwned>(
    status: u16,
    body: &str,
    fallback: &str,
) -> Result<T, RemoteError> {
    if (200..300).contains(&status) {
        return serde_json::from_str::<T>(body).map_err(|e| {
            tracing::warn!(status, error = %e, "response body did not decode");
            RemoteError::transport(fallback)
        });
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    Err(RemoteError::server(status, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteErrorKind;

    #[test]
    fn success_body_decodes() {
        let got: Vec<Material> =
            decode_response(200, r#"[{"material_id":"M1","name":"Steel"}]"#, MATERIALS_FALLBACK).unwrap();
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn empty_list_is_not_an_error() {
        let got: Vec<Material> = decode_response(200, "[]", MATERIALS_FALLBACK).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn server_message_is_surfaced_verbatim() {
        let err = decode_response::<PricePrediction>(
            404,
            r#"{"error": "No data for material 'M9'"}"#,
            PREDICT_FALLBACK,
        )
        .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Server { status: 404 });
        assert_eq!(err.message, "No data for material 'M9'");
    }

    #[test]
    fn non_json_error_body_uses_fallback() {
        let err = decode_response::<RecommendationResult>(
            502,
            "<html>Bad Gateway</html>",
            RECOMMEND_FALLBACK,
        )
        .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Server { status: 502 });
        assert_eq!(err.message, RECOMMEND_FALLBACK);
    }

    #[test]
    fn non_json_success_body_is_transport_error() {
        let err = decode_response::<UploadReceipt>(200, "ok", UPLOAD_FALLBACK).unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Transport);
        assert_eq!(err.message, UPLOAD_FALLBACK);
    }
}
