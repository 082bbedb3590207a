use crate::domain::error::DomainError;
use std::future::Future;
use std::time::Duration;

/// Runs an external call under `limit`. Elapsed calls become
/// `ExternalService` errors so they stay scoped to one item or channel.
pub async fn with_timeout<T, F>(what: &str, limit: Duration, call: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::ExternalService(format!(
            "{what} timed out after {}s",
            limit.as_secs_f64()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_elapsed_call_is_external_error() {
        let result: Result<(), DomainError> = with_timeout("oracle", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        assert!(err.is_external());
        assert!(err.to_string().contains("oracle timed out"));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let v = with_timeout("oracle", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(v, 7);
    }
}
