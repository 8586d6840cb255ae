//! Correlation identifier carried by each request.
//!
//! The identifier lives in task-local storage so services and error
//! constructors can read it without threading it through every call. Tokio
//! does not copy task locals into spawned tasks; wrap spawned work in
//! [`TraceId::scope`] when the identifier must follow it (the sales feed
//! generator does this for each tick).

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

/// Response header echoing the identifier back to clients.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    pub(crate) static TRACE_ID: TraceId;
}

/// Per-request trace identifier exposed via task-local storage.
///
/// # Examples
/// ```
/// use retail_backend::domain::TraceId;
///
/// async fn approve_order() {
///     if let Some(id) = TraceId::current() {
///         tracing::info!(trace_id = %id, "approving order");
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(pub(crate) Uuid);

impl TraceId {
    /// Random identifier for a new request or background tick.
    #[must_use]
    #[rustfmt::skip]
    pub fn generate() -> Self { Self(Uuid::new_v4()) }

    /// Construct a trace identifier from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the current trace identifier if one is in scope.
    #[must_use]
    #[rustfmt::skip]
    pub fn current() -> Option<Self> { TRACE_ID.try_with(|id| *id).ok() }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Run `fut` with `trace_id` as the current identifier.
    ///
    /// # Examples
    /// ```
    /// use retail_backend::domain::TraceId;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let trace_id: TraceId = "00000000-0000-0000-0000-000000000000"
    ///     .parse()
    ///     .expect("valid UUID");
    /// let observed = TraceId::scope(trace_id, async move { TraceId::current() }).await;
    /// assert_eq!(observed, Some(trace_id));
    /// # });
    /// ```
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn current_reflects_scope_and_is_cleared_after() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async move { TraceId::current() }).await;
        assert_eq!(observed, Some(expected));
        assert!(TraceId::current().is_none());
    }

    #[tokio::test]
    async fn nested_scopes_shadow_outer_identifier() {
        let outer = TraceId::generate();
        let inner = TraceId::generate();
        let observed = TraceId::scope(outer, async move {
            let nested = TraceId::scope(inner, async { TraceId::current() }).await;
            (nested, TraceId::current())
        })
        .await;
        assert_eq!(observed, (Some(inner), Some(outer)));
    }

    #[rstest]
    #[case("00000000-0000-0000-0000-000000000000")]
    #[case("3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    fn parses_and_displays_hyphenated_uuids(#[case] raw: &str) {
        let trace_id: TraceId = raw.parse().expect("valid UUID");
        assert_eq!(trace_id.to_string(), raw);
        assert_eq!(TraceId::from_uuid(*trace_id.as_uuid()), trace_id);
    }

    #[rstest]
    fn rejects_non_uuid_input() {
        assert!("order-42".parse::<TraceId>().is_err());
    }
}
