//! reqwest-backed `Gateway`.

use std::path::Path;

use reqwest::Client;
use reqwest::multipart::{Form, Part};

use crate::config::ClientConfig;
use crate::data::gateway::{
    Gateway, MATERIALS_FALLBACK, PREDICT_FALLBACK, RECOMMEND_FALLBACK, UPLOAD_FALLBACK,
    decode_response,
};
use crate::domain::{
    DatasetFiles, Material, PricePrediction, RecommendationResult, UploadReceipt, UploadRole,
    VendorWeights,
};
use crate::error::{AppError, EXIT_RUNTIME, RemoteError};

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    weights: Option<VendorWeights>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, weights: Option<VendorWeights>) -> Result<Self, AppError> {
        // No request timeout: a hung request leaves its region loading.
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            weights,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, AppError> {
        Self::new(config.api_base.clone(), config.weights)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn finish<T: serde::de::DeserializeOwned>(
        &self,
        op: &'static str,
        req: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<T, RemoteError> {
        tracing::debug!(op, "request issued");
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(op, error = %e, "request failed");
            RemoteError::transport(format!("{fallback} Is the server running at {}?", self.base_url))
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            tracing::warn!(op, status, error = %e, "failed to read response body");
            RemoteError::transport(fallback)
        })?;

        tracing::debug!(op, status, bytes = body.len(), "response received");
        decode_response(status, &body, fallback)
    }
}

#[async_trait::async_trait]
impl Gateway for HttpGateway {
    async fn list_materials(&self) -> Result<Vec<Material>, RemoteError> {
        let req = self.client.get(self.url("/api/materials"));
        self.finish("list_materials", req, MATERIALS_FALLBACK).await
    }

    async fn predict_prices(&self, material_id: &str) -> Result<PricePrediction, RemoteError> {
        let req = self
            .client
            .get(self.url("/api/predict"))
            .query(&[("material_id", material_id)]);
        self.finish("predict_prices", req, PREDICT_FALLBACK).await
    }

    async fn recommend_vendor(&self, material_id: &str) -> Result<RecommendationResult, RemoteError> {
        let mut req = self
            .client
            .get(self.url("/api/recommend_vendor"))
            .query(&[("material_id", material_id)]);
        if let Some(w) = self.weights {
            req = req.query(&[
                ("w_price", w.price.to_string()),
                ("w_delivery", w.delivery.to_string()),
                ("w_reliability", w.reliability.to_string()),
            ]);
        }
        self.finish("recommend_vendor", req, RECOMMEND_FALLBACK).await
    }

    async fn upload_datasets(&self, files: &DatasetFiles) -> Result<UploadReceipt, RemoteError> {
        let mut form = Form::new();
        for role in UploadRole::ALL {
            form = form.part(role.field_name(), file_part(files.path(role)).await?);
        }
        let req = self.client.post(self.url("/api/upload_data")).multipart(form);
        self.finish("upload_datasets", req, UPLOAD_FALLBACK).await
    }
}

async fn file_part(path: &Path) -> Result<Part, RemoteError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| RemoteError::transport(format!("Could not read '{}': {e}", path.display())))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("data.csv")
        .to_string();
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("text/csv")
        .map_err(|e| RemoteError::transport(format!("{UPLOAD_FALLBACK} ({e})")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one request on a loopback port, answer 200 with `body`, and hand
    /// back the raw request text.
    async fn capture_one(body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0u8; 4096];
            while !request_complete(&raw) {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&chunk[..n]);
            }
            let resp = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).into_owned()
        });
        (base, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&raw[..end]).to_ascii_lowercase();
        if head.contains("transfer-encoding: chunked") {
            return raw.ends_with(b"0\r\n\r\n");
        }
        let len = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= end + 4 + len
    }

    /// Loopback gateway that ignores any proxy set in the environment.
    fn loopback(base: String, weights: Option<VendorWeights>) -> HttpGateway {
        HttpGateway {
            client: Client::builder().no_proxy().build().unwrap(),
            base_url: base,
            weights,
        }
    }

    fn request_line(raw: &str) -> &str {
        raw.lines().next().unwrap_or_default()
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let gw = HttpGateway::new("http://localhost:5000/", None).unwrap();
        assert_eq!(gw.url("/api/materials"), "http://localhost:5000/api/materials");
    }

    #[tokio::test]
    async fn unreadable_upload_file_fails_before_sending() {
        let err = file_part(Path::new("does/not/exist.csv")).await.unwrap_err();
        assert!(err.message.contains("does/not/exist.csv"));
    }

    #[tokio::test]
    async fn predict_sends_encoded_material_id() {
        let (base, server) = capture_one(r#"{"historical_data":[],"predictions":[]}"#).await;
        let gw = loopback(base, None);

        let got = gw.predict_prices("Cu & Zn").await.unwrap();
        let raw = server.await.unwrap();

        assert!(got.predictions.is_empty());
        assert_eq!(request_line(&raw), "GET /api/predict?material_id=Cu+%26+Zn HTTP/1.1");
    }

    #[tokio::test]
    async fn recommend_forwards_weights_after_material_id() {
        let (base, server) = capture_one(
            r#"{"best_vendor":{"vendor_id":"V1","price_per_unit":1.0,"final_score":0.5},"weighted_score":0.5,"all_vendors":[]}"#,
        )
        .await;
        let weights = VendorWeights {
            price: 40.0,
            delivery: 30.0,
            reliability: 30.0,
        };
        let gw = loopback(base, Some(weights));

        let got = gw.recommend_vendor("M1").await.unwrap();
        let raw = server.await.unwrap();

        assert_eq!(got.best_vendor.vendor_id, "V1");
        assert_eq!(
            request_line(&raw),
            "GET /api/recommend_vendor?material_id=M1&w_price=40&w_delivery=30&w_reliability=30 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn recommend_without_weights_sends_only_material_id() {
        let (base, server) = capture_one(
            r#"{"best_vendor":{"vendor_id":7,"price_per_unit":1.0,"final_score":0.5},"weighted_score":0.5}"#,
        )
        .await;
        let gw = loopback(base, None);

        let got = gw.recommend_vendor("M1").await.unwrap();
        let raw = server.await.unwrap();

        assert_eq!(got.best_vendor.vendor_id, "7");
        assert_eq!(request_line(&raw), "GET /api/recommend_vendor?material_id=M1 HTTP/1.1");
    }

    #[tokio::test]
    async fn upload_posts_one_csv_part_per_role() {
        let dir = std::env::temp_dir().join(format!("procure_upload_wire_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let files = DatasetFiles {
            materials: dir.join("materials.csv"),
            prices: dir.join("prices.csv"),
            vendors: dir.join("vendors.csv"),
        };
        for role in UploadRole::ALL {
            std::fs::write(files.path(role), format!("{}_row\n", role.field_name())).unwrap();
        }

        let (base, server) = capture_one(r#"{"message":"Files uploaded"}"#).await;
        let gw = loopback(base, None);

        let receipt = gw.upload_datasets(&files).await.unwrap();
        let raw = server.await.unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(receipt.message, "Files uploaded");
        assert_eq!(request_line(&raw), "POST /api/upload_data HTTP/1.1");
        assert!(raw.to_ascii_lowercase().contains("content-type: multipart/form-data; boundary="));
        for role in UploadRole::ALL {
            let name = role.field_name();
            assert!(
                raw.contains(&format!("name=\"{name}\"; filename=\"{name}.csv\"")),
                "missing part {name}"
            );
            assert!(raw.contains(&format!("{name}_row")));
        }
        assert_eq!(raw.to_ascii_lowercase().matches("content-type: text/csv").count(), 3);
    }
}
