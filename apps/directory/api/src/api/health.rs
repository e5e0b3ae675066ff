//! Readiness backed by real partition pings.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use domain_directory::{DirectoryCoordinator, Partition, PartitionStore};
use std::sync::Arc;

fn check_name(partition: Partition) -> &'static str {
    match partition {
        Partition::A => "partition_a",
        Partition::B => "partition_b",
    }
}

/// 200 when both partitions answer a ping within the call deadline, 503 otherwise.
pub async fn ready_handler<S: PartitionStore>(
    State(coordinator): State<Arc<DirectoryCoordinator<S>>>,
) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = coordinator
        .check_partitions()
        .await
        .into_iter()
        .map(|(partition, result)| {
            let result = result.map_err(|e| format!("Partition {} ping failed: {}", partition, e));
            let check: HealthCheckFuture<'_> = Box::pin(std::future::ready(result));
            (check_name(partition), check)
        })
        .collect();

    match run_health_checks(checks).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ready_router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain_directory::InMemoryPartitionStore;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn ready(a: InMemoryPartitionStore, b: InMemoryPartitionStore) -> (StatusCode, Value) {
        let app = ready_router(Arc::new(DirectoryCoordinator::new(a, b)));
        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ready_when_both_partitions_answer() {
        let (status, body) =
            ready(InMemoryPartitionStore::new(), InMemoryPartitionStore::new()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["partition_a"], "connected");
        assert_eq!(body["partition_b"], "connected");
    }

    #[tokio::test]
    async fn test_not_ready_when_one_partition_is_down() {
        let b = InMemoryPartitionStore::new();
        b.set_available(false);

        let (status, body) = ready(InMemoryPartitionStore::new(), b).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["partition_a"], "connected");
        assert_eq!(body["partition_b"], "disconnected");
    }
}
