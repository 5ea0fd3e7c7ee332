use tracing::error;

/// Receives diagnostics about configuration documents that could not be decoded.
///
/// Decode failures are reported here before the error is returned to the caller, so that they are visible even when a
/// caller discards the error.
pub trait DiagnosticSink {
    /// Reports that the document for the component identified by `config_key` could not be decoded.
    fn decode_failed(&self, config_key: &'static str, error: &serde_json::Error);
}

/// A [`DiagnosticSink`] that logs through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn decode_failed(&self, config_key: &'static str, error: &serde_json::Error) {
        error!(config_key, error = %error, "Error decoding informer configuration.");
    }
}
