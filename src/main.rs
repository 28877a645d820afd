//  █████╗ ██╗    ██████╗ ██╗   ██╗██╗     ███████╗███████╗
// ██╔══██╗██║    ██╔══██╗██║   ██║██║     ██╔════╝██╔════╝
// ███████║██║    ██████╔╝██║   ██║██║     ███████╗█████╗
// ██╔══██║██║    ██╔═══╝ ██║   ██║██║     ╚════██║██╔══╝
// ██║  ██║██║    ██║     ╚██████╔╝███████╗███████║███████╗
// ╚═╝  ╚═╝╚═╝    ╚═╝      ╚═════╝ ╚══════╝╚══════╝╚══════╝
//
// D A S H B O A R D
//
// Five public APIs, one page, zero state.
// Every refresh asks Hacker News, GitHub, Hugging Face, arXiv and YouTube
// what is new in AI, and shows whatever answers come back.

mod config;
mod error;
mod metrics;
mod models;
mod page;
mod render;
mod server;
mod sources;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{self, fmt, EnvFilter};

use crate::config::Config;
use crate::metrics::MetricsCollector;
use crate::render::Renderer;
use crate::server::AppState;
use crate::sources::Upstream;

fn print_banner() {
    let banner = r#"

    ╔══════════════════════════════════════════════════════════════╗
    ║                                                              ║
    ║      █████╗ ██╗    ██████╗ ██╗   ██╗██╗     ███████╗███████╗ ║
    ║     ██╔══██╗██║    ██╔══██╗██║   ██║██║     ██╔════╝██╔════╝ ║
    ║     ███████║██║    ██████╔╝██║   ██║██║     ███████╗█████╗   ║
    ║     ██╔══██║██║    ██╔═══╝ ██║   ██║██║     ╚════██║██╔══╝   ║
    ║     ██║  ██║██║    ██║     ╚██████╔╝███████╗███████║███████╗ ║
    ║     ╚═╝  ╚═╝╚═╝    ╚═╝      ╚═════╝ ╚══════╝╚══════╝╚══════╝ ║
    ║                                                              ║
    ║   Sources: HN | GitHub | Hugging Face | arXiv | YouTube      ║
    ║   Policy:  any upstream may fail, the page may not           ║
    ║                                                              ║
    ╚══════════════════════════════════════════════════════════════╝

    "#;
    println!("{}", banner);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .init();

    print_banner();

    info!("🧠 AI PULSE DASHBOARD initializing...");

    let config = Arc::new(Config::from_env());
    info!(
        bind = %config.bind_addr(),
        timeout_secs = config.request_timeout.as_secs(),
        youtube_key = config.has_youtube_key(),
        "✅ Configuration loaded"
    );
    if !config.has_youtube_key() {
        warn!("YOUTUBE_API_KEY is not set; the videos section will stay empty");
    }

    let metrics_collector = Arc::new(MetricsCollector::new());

    let upstream = Upstream::new(config.clone(), metrics_collector.clone())
        .context("building the outbound HTTP client")?;
    let renderer = Renderer::new().context("compiling the page template")?;
    let state = Arc::new(AppState { upstream, renderer });
    info!("✅ HTTP client and page template ready");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ═══════════════════════════════════════════
    // DASHBOARD
    // ═══════════════════════════════════════════
    let dashboard_listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("binding dashboard to {}", config.bind_addr()))?;
    let mut dashboard_shutdown = shutdown_rx.clone();
    let dashboard_handle = tokio::spawn(async move {
        server::run_dashboard_server(dashboard_listener, state, &mut dashboard_shutdown).await;
        info!("🌐 Dashboard server: OFFLINE");
    });

    // ═══════════════════════════════════════════
    // METRICS (optional, own port)
    // ═══════════════════════════════════════════
    let metrics_handle = match config.metrics_addr() {
        Some(addr) => {
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding metrics server to {}", addr))?;
            let metrics_for_server = metrics_collector.clone();
            let mut metrics_shutdown = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                metrics::run_metrics_server(listener, metrics_for_server, &mut metrics_shutdown).await;
                info!("📊 Metrics server: OFFLINE");
            }))
        }
        None => {
            info!("📊 Metrics server disabled");
            None
        }
    };

    info!("═══════════════════════════════════════════════════════");
    info!("  🟢 AI PULSE DASHBOARD ONLINE");
    info!("  🌐 Page at http://{}/", config.bind_addr());
    if let Some(addr) = config.metrics_addr() {
        info!("  📊 Metrics at http://{}/", addr);
    }
    info!("  ⚡ Press Ctrl+C for graceful shutdown");
    info!("═══════════════════════════════════════════════════════");

    match signal::ctrl_c().await {
        Ok(()) => {
            warn!("🛑 Shutdown signal received!");
        }
        Err(err) => {
            error!("❌ Signal listener error: {}", err);
        }
    }
    let _ = shutdown_tx.send(true);

    info!("⏳ Waiting for servers to stop (timeout: 10s)...");
    let _ = tokio::time::timeout(std::time::Duration::from_secs(10), async {
        let _ = dashboard_handle.await;
        if let Some(handle) = metrics_handle {
            let _ = handle.await;
        }
    })
    .await;

    info!("💤 AI PULSE DASHBOARD: OFFLINE");
    Ok(())
}
