use crate::utils::error::{Result, ScanError};
use backoff::backoff::Constant;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay_ms: u64) -> Self {
        Self {
            max_retries,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// 重試暫時性錯誤（連線失敗、逾時），其他錯誤直接回傳
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, context: &str, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;

    let counted = || {
        attempt += 1;
        let current = attempt;
        let call = operation();

        async move {
            match call.await {
                Ok(value) => Ok(value),
                // 第 max_retries + 1 次仍失敗就停止
                Err(e) if e.is_transient() && current <= policy.max_retries => {
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        }
    };

    let mut retries: u32 = 0;
    let notify = |e: ScanError, wait: Duration| {
        retries += 1;
        tracing::warn!(
            "🔄 Retry {}/{} for {} in {:?}: {}",
            retries,
            policy.max_retries,
            context,
            wait,
            e
        );
    };

    backoff::future::retry_notify(Constant::new(policy.delay), counted, notify).await
}
