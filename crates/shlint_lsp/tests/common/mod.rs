#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, WriteHalf};
use tokio::sync::{Mutex, mpsc};
use tower_lsp::LspService;
use tower_lsp::lsp_types::Url;

use shlint_lsp::{Backend, BackendOptions};

pub const WAIT: Duration = Duration::from_secs(5);

pub async fn send_msg<W: AsyncWriteExt + Unpin>(writer: &mut W, msg: &str) {
    let content = format!("Content-Length: {}\r\n\r\n{}", msg.len(), msg);
    writer.write_all(content.as_bytes()).await.unwrap();
    writer.flush().await.unwrap();
}

pub async fn recv_msg<R: AsyncReadExt + Unpin>(reader: &mut R) -> Option<String> {
    // Simple LSP parser: read headers until \r\n\r\n, parse Content-Length, read body
    let mut buffer = Vec::new();
    let mut content_length = 0;

    loop {
        let byte = reader.read_u8().await.ok()?;
        buffer.push(byte);
        if buffer.ends_with(b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buffer);
            for line in headers.lines() {
                if line.to_lowercase().starts_with("content-length:") {
                    let parts: Vec<&str> = line.split(':').collect();
                    if parts.len() == 2 {
                        content_length = parts[1].trim().parse().unwrap_or_else(|e| {
                            panic!("Failed to parse Content-Length: {e}, header: {line}")
                        });
                    }
                }
            }
            break;
        }
    }

    if content_length == 0 {
        return None;
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await.ok()?;

    Some(String::from_utf8(body).unwrap())
}

type SharedWriter = Arc<Mutex<WriteHalf<DuplexStream>>>;

/// A client talking to an in-process server over a duplex pipe.
///
/// Requests from the server (prompts, edits, show document) are answered
/// automatically and also recorded like any other message.
pub struct TestClient {
    writer: SharedWriter,
    rx: mpsc::UnboundedReceiver<Value>,
    backlog: Vec<Value>,
    next_id: i64,
}

impl TestClient {
    pub fn start(options: BackendOptions) -> Self {
        let (client_side, server_side) = tokio::io::duplex(1 << 16);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (mut client_read, client_write) = tokio::io::split(client_side);

        let (service, socket) =
            LspService::new(move |client| Backend::with_options(client, options.clone()));
        tokio::spawn(async move {
            tower_lsp::Server::new(server_read, server_write, socket)
                .serve(service)
                .await;
        });

        let writer: SharedWriter = Arc::new(Mutex::new(client_write));
        let (tx, rx) = mpsc::unbounded_channel();
        let reply_writer = writer.clone();
        tokio::spawn(async move {
            while let Some(raw) = recv_msg(&mut client_read).await {
                let msg: Value = serde_json::from_str(&raw).unwrap();
                if let (Some(id), Some(method)) = (msg.get("id"), msg["method"].as_str()) {
                    let result = match method {
                        "workspace/applyEdit" => json!({ "applied": true }),
                        "window/showDocument" => json!({ "success": true }),
                        _ => Value::Null,
                    };
                    let reply = json!({ "jsonrpc": "2.0", "id": id, "result": result });
                    send_msg(&mut *reply_writer.lock().await, &reply.to_string()).await;
                }
                if tx.send(msg).is_err() {
                    break;
                }
            }
        });

        Self {
            writer,
            rx,
            backlog: Vec::new(),
            next_id: 1,
        }
    }

    pub async fn notify(&mut self, method: &str, params: Value) {
        let msg = json!({ "jsonrpc": "2.0", "method": method, "params": params });
        send_msg(&mut *self.writer.lock().await, &msg.to_string()).await;
    }

    /// Sends a request and returns its `result`.
    pub async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        let msg = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        send_msg(&mut *self.writer.lock().await, &msg.to_string()).await;

        let response = self
            .wait_for(|m| m["id"] == json!(id) && m.get("method").is_none())
            .await
            .unwrap_or_else(|| panic!("no response to {method}"));
        response["result"].clone()
    }

    /// Waits for the first message matching `pred`, consuming it.
    pub async fn wait_for(&mut self, pred: impl Fn(&Value) -> bool) -> Option<Value> {
        if let Some(pos) = self.backlog.iter().position(&pred) {
            return Some(self.backlog.remove(pos));
        }

        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            let msg = tokio::time::timeout_at(deadline, self.rx.recv())
                .await
                .ok()??;
            if pred(&msg) {
                return Some(msg);
            }
            self.backlog.push(msg);
        }
    }

    /// Waits for the next diagnostics published for `uri`.
    pub async fn diagnostics_for(&mut self, uri: &Url) -> Vec<Value> {
        let uri = uri.to_string();
        let msg = self
            .wait_for(|m| {
                m["method"] == "textDocument/publishDiagnostics" && m["params"]["uri"] == uri
            })
            .await
            .unwrap_or_else(|| panic!("no diagnostics published for {uri}"));
        msg["params"]["diagnostics"].as_array().cloned().unwrap_or_default()
    }

    /// Collects everything the server sends during `duration`.
    pub async fn drain_for(&mut self, duration: Duration) -> Vec<Value> {
        let deadline = tokio::time::Instant::now() + duration;
        let mut seen = std::mem::take(&mut self.backlog);
        while let Ok(Some(msg)) = tokio::time::timeout_at(deadline, self.rx.recv()).await {
            seen.push(msg);
        }
        seen
    }

    pub async fn initialize(&mut self, root: &Path, options: Value) -> Value {
        let root_uri = Url::from_file_path(root).unwrap();
        let result = self
            .request(
                "initialize",
                json!({
                    "rootUri": root_uri,
                    "capabilities": {},
                    "initializationOptions": options,
                }),
            )
            .await;
        self.notify("initialized", json!({})).await;
        result
    }

    pub async fn open(&mut self, uri: &Url, language_id: &str, text: &str) {
        self.notify(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": uri,
                    "languageId": language_id,
                    "version": 1,
                    "text": text,
                }
            }),
        )
        .await;
    }

    pub async fn change(&mut self, uri: &Url, version: i32, text: &str) {
        self.notify(
            "textDocument/didChange",
            json!({
                "textDocument": { "uri": uri, "version": version },
                "contentChanges": [{ "text": text }],
            }),
        )
        .await;
    }
}

/// A fake `shellcheck` that logs each document it is given and prints the
/// contents of `output.json` from its directory.
///
/// When a `delay` file exists, each run sleeps that many seconds after
/// logging its input, which keeps the run in flight for a while.
pub struct FakeShellcheck {
    dir: PathBuf,
    pub path: PathBuf,
}

const INVOCATION_END: &str = "<<END>>";

impl FakeShellcheck {
    #[cfg(unix)]
    pub fn install(dir: &Path, version: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("shellcheck");
        let script = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"--version\" ]; then\n\
             echo 'ShellCheck - shell script analysis tool'\n\
             echo 'version: {version}'\n\
             exit 0\n\
             fi\n\
             input=$(cat)\n\
             printf '%s\\n{end}\\n' \"$input\" >> '{log}'\n\
             if [ -f '{delay}' ]; then sleep \"$(cat '{delay}')\"; fi\n\
             cat '{output}' 2>/dev/null\n\
             exit 1\n",
            version = version,
            end = INVOCATION_END,
            log = dir.join("invocations.log").display(),
            output = dir.join("output.json").display(),
            delay = dir.join("delay").display(),
        );
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        Self {
            dir: dir.to_path_buf(),
            path,
        }
    }

    pub fn set_output(&self, json: &str) {
        fs::write(self.dir.join("output.json"), json).unwrap();
    }

    /// Makes every following run take `seconds` before printing its output.
    pub fn set_delay(&self, seconds: u32) {
        fs::write(self.dir.join("delay"), seconds.to_string()).unwrap();
    }

    /// Removes the executable, as if it was uninstalled.
    pub fn uninstall(&self) {
        fs::remove_file(&self.path).unwrap();
    }

    /// Waits until at least `count` runs have started.
    pub async fn wait_for_invocations(&self, count: usize) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while self.invocations().len() < count {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {count} invocations, saw {}",
                self.invocations().len()
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Documents received so far, oldest first.
    pub fn invocations(&self) -> Vec<String> {
        let log = fs::read_to_string(self.dir.join("invocations.log")).unwrap_or_default();
        log.split(&format!("\n{}\n", INVOCATION_END))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn settings(&self, extra: Value) -> Value {
        let mut settings = json!({ "executablePath": self.path });
        if let (Some(base), Some(extra)) = (settings.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        json!({ "shellcheck": settings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recv_msg_success() {
        let payload = r#"{"jsonrpc":"2.0","method":"abc","params":{}}"#;
        let data = format!("Content-Length: {}\r\n\r\n{}", payload.len(), payload);
        let mut cursor = std::io::Cursor::new(data.into_bytes());

        let result = recv_msg(&mut cursor).await;
        assert_eq!(result.unwrap(), payload);
    }

    #[tokio::test]
    #[should_panic(expected = "Failed to parse Content-Length")]
    async fn test_recv_msg_parse_error() {
        let data = "Content-Length: invalid\r\n\r\n{}";
        let mut cursor = std::io::Cursor::new(data.as_bytes().to_vec());
        let _ = recv_msg(&mut cursor).await;
    }
}
