//! Prometheus metrics: request middleware plus a live-subscriber gauge.

use std::sync::Arc;
use std::time::Duration;

use actix_service::{
    Service, ServiceExt as _, Transform,
    boxed::{self, BoxService},
};
use actix_web::body::BoxBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use futures_util::future::LocalBoxFuture;
use prometheus::{IntGauge, Registry};
use tokio::task::JoinHandle;

use retail_backend::outbound::live_bus::BroadcastBus;

const SUBSCRIBER_SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// Request metrics under the `retail` namespace, served at `/metrics`.
/// Probe traffic is not counted.
///
/// # Errors
/// Returns [`std::io::Error`] when the collectors cannot be registered.
pub(crate) fn make_metrics() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("retail")
        .endpoint("/metrics")
        .exclude("/health/live")
        .exclude("/health/ready")
        .build()
        .map_err(|err| std::io::Error::other(format!("configure Prometheus metrics: {err}")))
}

/// Register the `retail_live_subscribers` gauge on `registry`.
///
/// # Errors
/// Returns [`std::io::Error`] when the gauge cannot be registered.
pub(crate) fn live_subscriber_gauge(registry: &Registry) -> std::io::Result<IntGauge> {
    let gauge = IntGauge::new(
        "retail_live_subscribers",
        "Open sales and alert stream subscriptions",
    )
    .map_err(std::io::Error::other)?;
    registry
        .register(Box::new(gauge.clone()))
        .map_err(std::io::Error::other)?;
    Ok(gauge)
}

/// Copy the bus subscriber count into `gauge` every few seconds.
pub(crate) fn sample_live_subscribers(gauge: IntGauge, bus: Arc<BroadcastBus>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SUBSCRIBER_SAMPLE_INTERVAL);
        loop {
            interval.tick().await;
            gauge.set(i64::try_from(bus.subscriber_count()).unwrap_or(i64::MAX));
        }
    })
}

#[derive(Clone)]
pub(crate) enum MetricsLayer {
    Enabled(Arc<PrometheusMetrics>),
    Disabled,
}

impl MetricsLayer {
    #[must_use]
    pub(crate) fn from_option(metrics: Option<PrometheusMetrics>) -> Self {
        match metrics {
            Some(metrics) => Self::Enabled(Arc::new(metrics)),
            None => Self::Disabled,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        match self.clone() {
            Self::Enabled(metrics) => {
                let fut = Compat::new((*metrics).clone()).new_transform(service);
                Box::pin(async move { Ok(boxed::service(fut.await?)) })
            }
            Self::Disabled => Box::pin(async move {
                let svc = service.map(|res: ServiceResponse<B>| res.map_into_boxed_body());
                Ok(boxed::service(svc))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retail_backend::domain::ports::LiveEventBus;
    use rstest::rstest;

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn subscriber_gauge_follows_the_bus() {
        let registry = Registry::new();
        let gauge = live_subscriber_gauge(&registry).expect("gauge registers");
        let bus = Arc::new(BroadcastBus::default());
        let _first = bus.subscribe();
        let _second = bus.subscribe();
        let task = sample_live_subscribers(gauge.clone(), bus);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(gauge.get(), 2);
        assert_eq!(registry.gather().len(), 1);
        task.abort();
    }

    #[rstest]
    fn gauge_cannot_be_registered_twice() {
        let registry = Registry::new();
        live_subscriber_gauge(&registry).expect("first registration");
        assert!(live_subscriber_gauge(&registry).is_err());
    }
}
