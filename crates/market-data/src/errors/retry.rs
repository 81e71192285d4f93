/// Classification for retry policy.
///
/// Used by a source's [`BackoffPolicy`](crate::registry::BackoffPolicy) to decide
/// whether a failed retrieval is worth another attempt.
///
/// | Class | Retried? |
/// |-------|----------|
/// | `WithBackoff` | Yes, after `base * 2^attempt` |
/// | `Never` | No, the source degrades to an empty result |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The request is structurally wrong or cannot succeed by repeating it.
    Never,

    /// Transient failure: timeout, connection failure, HTTP 5xx or 429.
    WithBackoff,
}
