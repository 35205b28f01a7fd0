use std::net::SocketAddr;

/// Install the global tracing subscriber. The filter comes from the
/// `VELA_LOG` environment variable when set, otherwise from the CLI flag.
pub fn init_tracing(log_level: &str, log_format: &str) -> Result<(), String> {
    let filter = std::env::var("VELA_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .map_err(|err| format!("invalid log filter {filter:?}: {err}"))?;

    match log_format.trim().to_lowercase().as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init(),
        "text" => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
        other => return Err(format!("unknown log format {other:?} (expected text or json)")),
    }
    Ok(())
}

#[cfg(feature = "prometheus")]
pub fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = metrics_addr else {
        return Ok(None);
    };
    let addr: SocketAddr = raw
        .parse()
        .map_err(|err| format!("invalid --metrics-addr {raw:?}: {err}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to start prometheus exporter on {addr}: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus exporter listening");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    match metrics_addr {
        Some(_) => Err("metrics exporter requires the vela-cli `prometheus` feature".to_string()),
        None => Ok(None),
    }
}
