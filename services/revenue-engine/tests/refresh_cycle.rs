//! Refresh cycles against real HTTP endpoints
//!
//! Spins up local metrics servers (fast, slow, broken) and checks that one
//! stalled platform never holds back the others, and that transfers racing a
//! refresh keep the ledger consistent.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use revenue_engine::adapter::{HttpMetricSource, METRICS_PATH};
use revenue_engine::config::{Baseline, EngineConfig, PlatformConfig};
use revenue_engine::engine::RevenueEngine;
use serde_json::json;
use tokio::net::TcpListener;
use types::ids::PlatformId;
use types::metrics::ConsolidatedTotals;

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn fast_platform(revenue: f64) -> Router {
    Router::new().route(
        METRICS_PATH,
        get(move || async move {
            Json(json!({
                "revenue": revenue,
                "dailyRevenue": 12.0,
                "views": 300,
                "downloads": 4,
                "automationsActive": 2,
                "itemsGenerated": 9,
                "status": "healthy"
            }))
        }),
    )
}

fn slow_platform() -> Router {
    Router::new().route(
        METRICS_PATH,
        get(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            StatusCode::OK
        }),
    )
}

fn broken_platform() -> Router {
    Router::new().route(
        METRICS_PATH,
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    )
}

fn platform(id: &str, endpoint: Option<SocketAddr>, revenue: f64) -> PlatformConfig {
    PlatformConfig {
        id: PlatformId::new(id),
        endpoint: endpoint.map(|addr| format!("http://{}", addr)),
        baseline: Baseline {
            revenue,
            ..Baseline::default()
        },
        growth_rate: 0.05,
    }
}

async fn engine(platforms: Vec<PlatformConfig>, timeout_ms: u64) -> RevenueEngine {
    let config = EngineConfig {
        platforms,
        fetch_timeout_ms: timeout_ms,
        rng_seed: Some(2024),
        ..EngineConfig::default()
    };
    let source = HttpMetricSource::from_platforms(&config.platforms, config.fetch_timeout()).unwrap();
    RevenueEngine::bootstrap(&config, Arc::new(source)).await
}

fn assert_totals_match(
    totals: &ConsolidatedTotals,
    entries: &std::collections::BTreeMap<PlatformId, types::metrics::PlatformMetrics>,
) {
    let expected = ConsolidatedTotals::from_metrics(entries.values());
    assert!((totals.total_revenue - expected.total_revenue).abs() < 1e-6);
    assert_eq!(totals.total_views, expected.total_views);
    assert_eq!(totals.healthy_platforms, expected.healthy_platforms);
}

#[tokio::test]
async fn test_slow_platform_does_not_stall_cycle() {
    let fast = serve(fast_platform(1_500.0)).await;
    let slow = serve(slow_platform()).await;

    let engine = engine(
        vec![
            platform("fast", Some(fast), 1_000.0),
            platform("slow", Some(slow), 400.0),
        ],
        300,
    )
    .await;

    let started = Instant::now();
    let report = engine.refresh(Utc::now()).await;
    let elapsed = started.elapsed();

    // Bounded by the per-fetch timeout, not the slow server's delay
    assert!(elapsed < Duration::from_secs(3), "cycle took {:?}", elapsed);
    assert_eq!(report.live, vec![PlatformId::new("fast")]);
    assert_eq!(report.simulated, vec![PlatformId::new("slow")]);

    let entries = engine.ledger().snapshot().await;
    let fast_entry = &entries[&PlatformId::new("fast")];
    assert!(fast_entry.is_live);
    assert_eq!(fast_entry.revenue, 1_500.0);
    assert_eq!(fast_entry.views, 300);

    let slow_entry = &entries[&PlatformId::new("slow")];
    assert!(!slow_entry.is_live);
    assert!(slow_entry.revenue >= 400.0);

    assert_totals_match(&report.totals, &entries);
}

#[tokio::test]
async fn test_mixed_failures_fall_back_independently() {
    let fast = serve(fast_platform(250.0)).await;
    let broken = serve(broken_platform()).await;

    let engine = engine(
        vec![
            platform("fast", Some(fast), 100.0),
            platform("broken", Some(broken), 100.0),
            platform("offline", None, 100.0),
        ],
        1_000,
    )
    .await;

    let report = engine.refresh(Utc::now()).await;

    assert_eq!(report.live, vec![PlatformId::new("fast")]);
    assert_eq!(report.simulated.len(), 2);
    assert_eq!(report.failures.len(), 2);

    let entries = engine.ledger().snapshot().await;
    assert_eq!(entries.len(), 3);
    assert!(entries.values().all(|m| m.revenue >= 0.0));
    assert_totals_match(&report.totals, &entries);
}

#[tokio::test]
async fn test_transfers_racing_refresh_keep_ledger_consistent() {
    let fast = serve(fast_platform(5_000.0)).await;

    let engine = Arc::new(
        engine(
            vec![
                platform("fast", Some(fast), 5_000.0),
                platform("offline_a", None, 3_000.0),
                platform("offline_b", None, 2_000.0),
            ],
            1_000,
        )
        .await,
    );

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        tasks.push(tokio::spawn(async move {
            engine.refresh(Utc::now()).await;
        }));
    }
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        tasks.push(tokio::spawn(async move {
            let _ = engine.transfer(100.0).await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let (entries, totals) = engine.ledger().view().await;
    assert!(entries.values().all(|m| m.revenue >= 0.0));
    assert_totals_match(&totals, &entries);

    let history = engine.history(None).await;
    assert_eq!(history.len(), 8);
    for record in &history {
        assert!((record.total_debited() - record.amount).abs() < 1e-6);
    }
    let mut ids: Vec<_> = history.iter().map(|r| r.id.clone()).collect();
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();
    assert_eq!(ids.len(), 8);
}
