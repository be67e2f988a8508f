//! Structured logging field name constants for mindsift.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |

/// Subsystem originating the log event.
/// Values: "pipeline", "inference", "db", "jobs", "crypto"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "processor", "parser", "anthropic", "worker", "dispatcher"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "process", "complete", "claim_next", "enqueue"
pub const OPERATION: &str = "op";

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Owning user UUID.
pub const USER_ID: &str = "user_id";

/// Job UUID being processed.
pub const JOB_ID: &str = "job_id";

/// AI provider backing a completion call ("claude", "openai").
pub const PROVIDER: &str = "provider";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a rendered prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_unique_snake_case() {
        let fields = [
            SUBSYSTEM,
            COMPONENT,
            OPERATION,
            NOTE_ID,
            USER_ID,
            JOB_ID,
            PROVIDER,
            DURATION_MS,
            PROMPT_LEN,
            RESPONSE_LEN,
        ];

        let unique: std::collections::HashSet<&str> = fields.iter().copied().collect();
        assert_eq!(unique.len(), fields.len());

        for field in fields {
            assert!(field
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
