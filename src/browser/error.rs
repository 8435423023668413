use thiserror::Error;

/// Failures talking to the browser helper process.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Helper process failed to spawn
    #[error("failed to spawn {script} (is Node.js installed?): {source}")]
    SubprocessSpawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Pipe-level failure on the helper's stdin/stdout
    #[error("browser session I/O: {0}")]
    SessionIO(String),

    /// Helper answered with ok=false, or an answer without the expected payload
    #[error("browser command '{command}' failed: {error}")]
    SessionProtocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Screenshot payload was not valid base64
    #[error("screenshot payload could not be decoded: {0}")]
    ScreenshotDecode(#[from] base64::DecodeError),
}
