//! Centralized default constants for mindsift.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// AI PROVIDERS
// =============================================================================

/// Default Claude model for note processing.
pub const CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

/// Default OpenAI model for note processing.
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature for extraction calls.
pub const TEMPERATURE: f32 = 0.7;

/// Default completion token cap for extraction calls.
pub const MAX_TOKENS: u32 = 1024;

/// Token cap for the key-validation probe call.
pub const VALIDATION_MAX_TOKENS: u32 = 10;

/// Anthropic API endpoint.
pub const ANTHROPIC_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// OpenAI API endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Request timeout for provider calls, in seconds. A timeout is the only
/// bound on an in-flight completion; there is no mid-flight cancellation.
pub const PROVIDER_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the process-wide Claude fallback key.
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

// =============================================================================
// JOB QUEUE
// =============================================================================

/// Maximum automatic delivery retries per job.
pub const JOB_MAX_RETRIES: i32 = 3;

/// Base delay for exponential retry backoff, in milliseconds.
pub const JOB_BACKOFF_BASE_MS: u64 = 1000;

/// Polling interval when the queue is empty, in milliseconds.
pub const JOB_POLL_INTERVAL_MS: u64 = 500;

/// Maximum jobs processed concurrently by one worker.
pub const JOB_MAX_CONCURRENT: usize = 4;

// =============================================================================
// BATCH RUNNER
// =============================================================================

/// Default number of pending notes one catch-up pass picks up.
pub const BATCH_LIMIT: i64 = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule_fits_retry_budget() {
        // 3 attempts with exponential backoff from 1s: 1s, 2s, 4s.
        let delays: Vec<u64> = (0..JOB_MAX_RETRIES as u32)
            .map(|attempt| JOB_BACKOFF_BASE_MS << attempt)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000]);
    }
}
