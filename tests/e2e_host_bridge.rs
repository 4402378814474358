//! End-to-end tests for the `eburon-host` binary (stdin/stdout JSON bridge).
//!
//! Each test spawns a fresh subprocess with an empty config directory, sends
//! JSON commands over stdin, and reads responses and events from stdout.

use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

// ---------------------------------------------------------------------------
// Test harness
// ---------------------------------------------------------------------------

struct HostBridgeHarness {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    reader: Lines<BufReader<ChildStdout>>,
    _config_dir: TempDir,
}

impl HostBridgeHarness {
    fn spawn() -> Self {
        let config_dir = TempDir::new().expect("failed to create temp dir");
        let mut child = Command::new(env!("CARGO_BIN_EXE_eburon-host"))
            .env("EBURON_CONFIG_DIR", config_dir.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to spawn eburon-host");

        let child_stdin = child.stdin.take().expect("no stdin on child process");
        let child_stdout = child.stdout.take().expect("no stdout on child process");

        Self {
            child,
            stdin: BufWriter::new(child_stdin),
            reader: BufReader::new(child_stdout).lines(),
            _config_dir: config_dir,
        }
    }

    async fn write(&mut self, cmd: &Value) {
        let line = format!("{cmd}\n");
        self.stdin
            .write_all(line.as_bytes())
            .await
            .expect("write to stdin");
        self.stdin.flush().await.expect("flush stdin");
    }

    async fn next_line(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(10), self.reader.next_line())
            .await
            .expect("timed out waiting for output")
            .expect("read stdout")
            .expect("stdout closed");
        serde_json::from_str(&line).expect("output is JSON")
    }

    /// Send a command and return its response.
    ///
    /// Events caused by the command follow the response; read them with
    /// [`Self::events`].
    async fn send(&mut self, request_id: &str, command: &str, payload: Value) -> Value {
        self.write(&json!({
            "v": 1,
            "request_id": request_id,
            "command": command,
            "payload": payload,
        }))
        .await;
        let response = self.next_line().await;
        assert_eq!(response["request_id"], request_id);
        response
    }

    async fn events(&mut self, count: usize) -> Vec<Value> {
        let mut events = Vec::with_capacity(count);
        for _ in 0..count {
            events.push(self.next_line().await);
        }
        events
    }

    async fn shutdown(mut self) {
        self.write(&json!({"v": 1, "request_id": "stop", "command": "runtime.stop"}))
            .await;
        let response = self.next_line().await;
        assert_eq!(response["payload"]["stopping"], true);
        let status = tokio::time::timeout(Duration::from_secs(10), self.child.wait())
            .await
            .expect("timed out waiting for exit")
            .expect("wait for child");
        assert!(status.success());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_and_initial_state() {
    let mut host = HostBridgeHarness::spawn();

    let pong = host.send("p", "host.ping", json!({})).await;
    assert_eq!(pong["payload"]["pong"], true);

    let state = host.send("s", "state.get", Value::Null).await;
    assert_eq!(state["payload"]["settings"]["language"], "Taglish (Philippines)");
    assert_eq!(state["payload"]["ui"]["theme"], "dark");
    assert_eq!(state["payload"]["tools"]["tools"], json!([]));

    host.shutdown().await;
}

#[tokio::test]
async fn commands_emit_change_events() {
    let mut host = HostBridgeHarness::spawn();

    let added = host.send("a", "tools.add", Value::Null).await;
    assert_eq!(added["payload"]["name"], "new_function");
    let events = host.events(1).await;
    assert_eq!(events[0]["event"], "tools.changed");

    let turn = host
        .send("t", "turns.add", json!({"role": "user", "text": "hi"}))
        .await;
    assert_eq!(turn["payload"]["count"], 1);
    let events = host.events(1).await;
    assert_eq!(events[0]["event"], "turns.changed");
    assert_eq!(events[0]["payload"][0]["text"], "hi");

    host.shutdown().await;
}

#[tokio::test]
async fn malformed_input_does_not_kill_the_bridge() {
    let mut host = HostBridgeHarness::spawn();

    host.stdin
        .write_all(b"{ not json\n")
        .await
        .expect("write garbage");
    host.stdin.flush().await.expect("flush stdin");
    let error = host.next_line().await;
    assert_eq!(error["request_id"], "parse-error");
    assert_eq!(error["ok"], false);

    let pong = host.send("p", "host.ping", json!({})).await;
    assert_eq!(pong["ok"], true);

    host.shutdown().await;
}
