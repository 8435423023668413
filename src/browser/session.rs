use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::error::BrowserError;
use crate::browser::page::{PageDriver, PageElement};

/// Request sent to browser_server.js over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BrowserRequest {
    Navigate {
        cmd: &'static str,
        url: String,
        #[serde(rename = "waitMs")]
        wait_ms: u64,
    },
    Title {
        cmd: &'static str,
    },
    Elements {
        cmd: &'static str,
    },
    Screenshot {
        cmd: &'static str,
    },
    Quit {
        cmd: &'static str,
    },
}

impl BrowserRequest {
    pub fn navigate(url: &str, wait_ms: u64) -> Self {
        BrowserRequest::Navigate {
            cmd: "navigate",
            url: url.to_string(),
            wait_ms,
        }
    }

    pub fn title() -> Self {
        BrowserRequest::Title { cmd: "title" }
    }

    pub fn elements() -> Self {
        BrowserRequest::Elements { cmd: "elements" }
    }

    pub fn screenshot() -> Self {
        BrowserRequest::Screenshot { cmd: "screenshot" }
    }

    pub fn quit() -> Self {
        BrowserRequest::Quit { cmd: "quit" }
    }
}

/// Response received from browser_server.js over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub ready: Option<bool>,
}

/// How to start the helper process.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub script: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            script: "node/browser_server.js".to_string(),
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

/// A persistent browser session backed by browser_server.js.
///
/// Launches a long-lived Node.js process that keeps a Chromium page open.
/// Commands are sent as NDJSON over stdin, responses read from stdout.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    closed: bool,
}

impl BrowserSession {
    pub fn launch(options: &SessionOptions) -> Result<Self, BrowserError> {
        debug!(script = %options.script, "launching browser helper");

        let mut child = Command::new("node")
            .arg(&options.script)
            .arg(options.viewport_width.to_string())
            .arg(options.viewport_height.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| BrowserError::SubprocessSpawn {
                script: options.script.clone(),
                source: e,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            BrowserError::SessionIO("failed to capture stdin of browser helper".into())
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            BrowserError::SessionIO("failed to capture stdout of browser helper".into())
        })?;

        let mut reader = BufReader::new(stdout);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| BrowserError::SessionIO(format!("failed to read ready signal: {}", e)))?;

        let response: BrowserResponse =
            serde_json::from_str(line.trim()).map_err(|e| BrowserError::JsonParse {
                context: "browser helper ready signal".into(),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(BrowserError::SessionProtocol {
                command: "launch".into(),
                error: response
                    .error
                    .unwrap_or_else(|| "did not receive ready signal".into()),
            });
        }

        Ok(BrowserSession {
            child,
            stdin,
            reader,
            closed: false,
        })
    }

    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, BrowserError> {
        let json = serde_json::to_string(request).map_err(|e| BrowserError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .map_err(|e| BrowserError::SessionIO(format!("failed to write to helper stdin: {}", e)))?;
        self.stdin
            .flush()
            .map_err(|e| BrowserError::SessionIO(format!("failed to flush helper stdin: {}", e)))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| BrowserError::SessionIO(format!("failed to read helper stdout: {}", e)))?;

        if line.trim().is_empty() {
            return Err(BrowserError::SessionIO(
                "empty response from browser helper (process may have died)".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|e| BrowserError::JsonParse {
            context: "browser helper response".into(),
            source: e,
        })
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: &BrowserRequest, command: &str) -> Result<BrowserResponse, BrowserError> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(BrowserError::SessionProtocol {
                command: command.into(),
                error: response.error.unwrap_or_else(|| "unknown error".into()),
            });
        }
        Ok(response)
    }

    fn send_for_data(&mut self, request: &BrowserRequest, command: &str) -> Result<Value, BrowserError> {
        let response = self.send_ok(request, command)?;
        response.data.ok_or_else(|| BrowserError::SessionProtocol {
            command: command.into(),
            error: format!("no data in {} response", command),
        })
    }

    pub fn quit(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // Best-effort: the process may already be gone
        if let Err(e) = self.send(&BrowserRequest::quit()) {
            debug!(error = %e, "browser helper did not acknowledge quit");
        }
        if let Err(e) = self.child.wait() {
            warn!(error = %e, "failed to reap browser helper");
        }
        Ok(())
    }
}

impl PageDriver for BrowserSession {
    fn navigate(&mut self, url: &str, settle_ms: u64) -> Result<(), BrowserError> {
        self.send_ok(&BrowserRequest::navigate(url, settle_ms), "navigate")?;
        Ok(())
    }

    fn title(&mut self) -> Result<String, BrowserError> {
        let data = self.send_for_data(&BrowserRequest::title(), "title")?;
        Ok(data.as_str().unwrap_or_default().to_string())
    }

    fn interactive_elements(&mut self) -> Result<Vec<PageElement>, BrowserError> {
        let data = self.send_for_data(&BrowserRequest::elements(), "elements")?;
        serde_json::from_value(data).map_err(|e| BrowserError::JsonParse {
            context: "elements payload".into(),
            source: e,
        })
    }

    fn screenshot(&mut self) -> Result<Vec<u8>, BrowserError> {
        let data = self.send_for_data(&BrowserRequest::screenshot(), "screenshot")?;
        let encoded = data.as_str().ok_or_else(|| BrowserError::SessionProtocol {
            command: "screenshot".into(),
            error: "screenshot payload is not a string".into(),
        })?;
        Ok(BASE64_STANDARD.decode(encoded)?)
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
