//! Metric source adapter
//!
//! Reads a platform's current metrics from its analytics endpoint. Every
//! failure mode (timeout, refused connection, non-2xx status, bad payload)
//! folds into `Unavailable`; nothing here retries.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use types::errors::{Unavailable, UnavailableReason};
use types::ids::PlatformId;
use types::metrics::RawMetrics;

use crate::config::PlatformConfig;

/// Path appended to a platform's base URL
pub const METRICS_PATH: &str = "/api/metrics";

/// Source of per-platform metrics
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch(&self, platform: &PlatformId) -> Result<RawMetrics, Unavailable>;
}

/// HTTP adapter over each platform's analytics endpoint
pub struct HttpMetricSource {
    client: Client,
    endpoints: HashMap<PlatformId, String>,
    timeout: Duration,
}

impl HttpMetricSource {
    pub fn new(
        endpoints: HashMap<PlatformId, String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoints,
            timeout,
        })
    }

    /// Build from platform configs, skipping platforms without an endpoint
    pub fn from_platforms(
        platforms: &[PlatformConfig],
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let endpoints = platforms
            .iter()
            .filter_map(|p| p.endpoint.as_ref().map(|e| (p.id.clone(), e.clone())))
            .collect();
        Self::new(endpoints, timeout)
    }

    fn timeout_reason(&self) -> UnavailableReason {
        UnavailableReason::Timeout {
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }

    fn classify(&self, err: reqwest::Error) -> UnavailableReason {
        if err.is_timeout() {
            self.timeout_reason()
        } else if err.is_decode() {
            UnavailableReason::Malformed(err.to_string())
        } else {
            UnavailableReason::Connection(err.to_string())
        }
    }

    async fn request(&self, url: &str) -> Result<RawMetrics, UnavailableReason> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !res.status().is_success() {
            return Err(UnavailableReason::Status(res.status().as_u16()));
        }

        res.json::<RawMetrics>().await.map_err(|e| self.classify(e))
    }
}

#[async_trait]
impl MetricSource for HttpMetricSource {
    async fn fetch(&self, platform: &PlatformId) -> Result<RawMetrics, Unavailable> {
        let base = self
            .endpoints
            .get(platform)
            .ok_or_else(|| Unavailable::new(platform.clone(), UnavailableReason::NoEndpoint))?;
        let url = format!("{}{}", base.trim_end_matches('/'), METRICS_PATH);

        // The client timeout covers the request; this bounds body reads on slow streams too.
        let result = match tokio::time::timeout(self.timeout, self.request(&url)).await {
            Ok(inner) => inner,
            Err(_) => Err(self.timeout_reason()),
        };

        result.map_err(|reason| {
            debug!(platform = %platform, url = %url, reason = %reason, "Metrics fetch failed");
            Unavailable::new(platform.clone(), reason)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn source_for(addr: SocketAddr, timeout_ms: u64) -> HttpMetricSource {
        let mut endpoints = HashMap::new();
        endpoints.insert(PlatformId::new("alpha"), format!("http://{}", addr));
        HttpMetricSource::new(endpoints, Duration::from_millis(timeout_ms)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let app = Router::new().route(
            METRICS_PATH,
            get(|| async {
                Json(json!({
                    "revenue": 1520.5,
                    "dailyRevenue": 40.0,
                    "views": 900,
                    "downloads": 12,
                    "automationsActive": 3,
                    "itemsGenerated": 77,
                    "status": "active"
                }))
            }),
        );
        let addr = serve(app).await;
        let source = source_for(addr, 2_000);

        let raw = source.fetch(&PlatformId::new("alpha")).await.unwrap();
        assert_eq!(raw.revenue, 1520.5);
        assert_eq!(raw.daily_revenue, Some(40.0));
        assert_eq!(raw.views, 900);
        assert_eq!(raw.items_generated, 77);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let app = Router::new().route(
            METRICS_PATH,
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let addr = serve(app).await;
        let source = source_for(addr, 2_000);

        let err = source.fetch(&PlatformId::new("alpha")).await.unwrap_err();
        assert_eq!(err.reason, UnavailableReason::Status(500));
        assert_eq!(err.platform, PlatformId::new("alpha"));
    }

    #[tokio::test]
    async fn test_shape_deviation_is_malformed() {
        let app = Router::new().route(
            METRICS_PATH,
            get(|| async { Json(json!({ "revenue": "lots", "views": 1 })) }),
        );
        let addr = serve(app).await;
        let source = source_for(addr, 2_000);

        let err = source.fetch(&PlatformId::new("alpha")).await.unwrap_err();
        assert!(matches!(err.reason, UnavailableReason::Malformed(_)));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let app = Router::new().route(
            METRICS_PATH,
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let addr = serve(app).await;
        let source = source_for(addr, 100);

        let started = std::time::Instant::now();
        let err = source.fetch(&PlatformId::new("alpha")).await.unwrap_err();
        assert_eq!(err.reason, UnavailableReason::Timeout { timeout_ms: 100 });
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = source_for(addr, 1_000);
        let err = source.fetch(&PlatformId::new("alpha")).await.unwrap_err();
        assert!(matches!(err.reason, UnavailableReason::Connection(_)));
    }

    #[tokio::test]
    async fn test_unknown_platform_has_no_endpoint() {
        let source = HttpMetricSource::new(HashMap::new(), Duration::from_millis(100)).unwrap();
        let err = source.fetch(&PlatformId::new("ghost")).await.unwrap_err();
        assert_eq!(err.reason, UnavailableReason::NoEndpoint);
    }
}
