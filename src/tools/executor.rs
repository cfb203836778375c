//! Tool Executor with Retry Logic
//!
//! Information Hiding:
//! - Retry strategy implementation hidden
//! - Backoff algorithm hidden
//! - Error classification logic hidden

use super::{Tool, ToolConfig, ToolResult};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};

/// Tool executor with retry and timeout support
pub struct ToolExecutor {
    config: ToolConfig,
    base_delay_ms: u64,
}

impl ToolExecutor {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            config,
            base_delay_ms: 100,
        }
    }

    /// Execute a tool with retry logic. Exhausted retries come back as a
    /// failed `ToolResult`, never as `Err`.
    pub async fn execute(&self, tool: Arc<dyn Tool>, args: Value) -> Result<ToolResult> {
        let tool_name = tool.metadata().name;

        if let Err(e) = tool.validate(&args) {
            return Ok(ToolResult::failure(format!("Validation failed: {}", e)));
        }

        let max_retries = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..max_retries {
            if attempt > 0 {
                tracing::warn!(
                    "Retrying tool '{}' (attempt {}/{})",
                    tool_name,
                    attempt + 1,
                    max_retries
                );
                sleep(Duration::from_millis(self.calculate_backoff(attempt))).await;
            }

            let run = tool.execute(args.clone());
            match timeout(Duration::from_secs(self.config.timeout_secs), run).await {
                Ok(Ok(result)) => {
                    if result.success || !self.should_retry(&result) {
                        return Ok(result);
                    }
                    last_error = result.error;
                }
                Ok(Err(e)) => {
                    last_error = Some(e.to_string());
                }
                Err(_) => {
                    last_error = Some(format!(
                        "timeout after {} seconds",
                        self.config.timeout_secs
                    ));
                }
            }
        }

        Ok(ToolResult::failure(format!(
            "Tool '{}' failed after {} attempts. Last error: {}",
            tool_name,
            max_retries,
            last_error.unwrap_or_else(|| "Unknown error".to_string())
        )))
    }

    fn calculate_backoff(&self, attempt: u32) -> u64 {
        let max_delay = 5000;
        self.base_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(max_delay)
    }

    /// Tool-reported failures are retried only when they look transient.
    fn should_retry(&self, result: &ToolResult) -> bool {
        if let Some(ref error) = result.error {
            let error_lower = error.to_lowercase();

            if error_lower.contains("validation")
                || error_lower.contains("invalid")
                || error_lower.contains("not allowed")
                || error_lower.contains("permission")
                || error_lower.contains("division by zero")
            {
                return false;
            }

            if error_lower.contains("timeout")
                || error_lower.contains("connection")
                || error_lower.contains("network")
                || error_lower.contains("temporar")
            {
                return true;
            }
        }

        false
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new(ToolConfig::default())
    }
}
