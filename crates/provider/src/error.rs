/// Errors from the provider HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A submission succeeded but the response carried no task id.
    #[error("No task id returned from provider {0} submission")]
    MissingTaskId(&'static str),

    /// Required configuration is missing or malformed.
    #[error("Provider configuration error: {0}")]
    Config(String),
}
