use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Enforces a minimum spacing between consecutive requests.
pub(crate) struct RateLimiter {
    spacing: Option<Duration>,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub(crate) fn per_second(qps: f64) -> Self {
        let spacing = (qps.is_finite() && qps > 0.0).then(|| Duration::from_secs_f64(1.0 / qps));
        Self {
            spacing,
            last_call: Mutex::new(None),
        }
    }

    pub(crate) async fn wait(&self) {
        let Some(spacing) = self.spacing else {
            return;
        };
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let since = prev.elapsed();
            if since < spacing {
                tokio::time::sleep(spacing - since).await;
            }
        }
        *last = Some(Instant::now());
    }
}
