//! Request ID generation

use uuid::Uuid;

/// Generate a new request ID using UUID v4
///
/// Correlates every log line of one `process` call, including the tool
/// invocations dispatched for it. Never part of the response.
///
/// # Examples
///
/// ```
/// use scholar::logging::generate_request_id;
///
/// let request_id = generate_request_id();
/// assert!(!request_id.is_empty());
/// ```
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
