use crate::context::ProbeContext;
use crate::traits::{CapError, ProgressSink};
use crate::types::{PortProbe, PortStatus, ProgressEvent};

/// Probe every configured port once, one at a time, in listed order.
pub async fn scan_ports(ctx: &ProbeContext, sink: &mut dyn ProgressSink) -> Vec<PortProbe> {
    let mut results = Vec::with_capacity(ctx.config.ports.len());
    for &port in &ctx.config.ports {
        let probe = probe_port(ctx, port).await;
        sink.emit(ProgressEvent::PortProbed(&probe));
        results.push(probe);
    }
    results
}

/// Request the health path on `port` and classify the result.
pub async fn probe_port(ctx: &ProbeContext, port: u16) -> PortProbe {
    let url = ctx.config.health_url(port);
    let outcome = ctx.http().get_status(&url, ctx.config.port_timeout()).await;
    tracing::debug!(port, ?outcome, "health probe finished");
    classify(port, outcome)
}

fn classify(port: u16, outcome: Result<u16, CapError>) -> PortProbe {
    match outcome {
        Ok(code) => PortProbe {
            port,
            status: PortStatus::Occupied,
            http_status: Some(code),
            detail: None,
        },
        Err(CapError::ConnectionRefused(_)) => PortProbe {
            port,
            status: PortStatus::Available,
            http_status: None,
            detail: Some("Connection refused".to_string()),
        },
        Err(e) => PortProbe {
            port,
            status: PortStatus::Unknown,
            http_status: None,
            detail: Some(e.to_string()),
        },
    }
}
