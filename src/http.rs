// Shared HTTP client
//
// One reqwest client per process, built lazily on first use. Concurrent first
// callers wait on the same initialization instead of racing to build their own.

use std::time::Duration;
use tokio::sync::OnceCell;

/// Lazily-initialized, process-scoped HTTP client
#[derive(Debug)]
pub struct SharedHttpClient {
    timeout: Duration,
    client: OnceCell<reqwest::Client>,
}

impl SharedHttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: OnceCell::new(),
        }
    }

    /// Get the client, building it on the first call
    pub async fn get(&self) -> Result<&reqwest::Client, reqwest::Error> {
        self.client
            .get_or_try_init(|| async {
                tracing::debug!(timeout_secs = self.timeout.as_secs(), "building HTTP client");
                reqwest::Client::builder().timeout(self.timeout).build()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_client() {
        let shared = Arc::new(SharedHttpClient::new(Duration::from_secs(1)));

        let a = shared.clone();
        let b = shared.clone();
        let (first, second) = tokio::join!(
            async move { a.get().await.map(|c| c as *const reqwest::Client as usize) },
            async move { b.get().await.map(|c| c as *const reqwest::Client as usize) },
        );

        assert_eq!(first.unwrap(), second.unwrap());
    }
}
