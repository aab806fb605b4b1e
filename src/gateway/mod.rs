//! Command gateway: the JSON boundary in front of the vault
//!
//! Maps each inbound [`Command`] to a [`Vault`] call and turns every failure
//! into a [`UserError`]. [`CommandGateway::serve`] speaks newline-delimited
//! JSON, one request per line and one reply per line, in order.

pub mod command;

pub use command::{Command, Reply, Request, Response, UserError};

use std::io::{BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::error::PyroResult;
use crate::vault::Vault;

/// How often the idle watcher checks the vault
const IDLE_POLL: Duration = Duration::from_secs(1);

/// Dispatches commands to a shared vault
#[derive(Clone)]
pub struct CommandGateway {
    vault: Arc<Vault>,
}

impl CommandGateway {
    pub fn new(vault: Arc<Vault>) -> Self {
        Self { vault }
    }

    /// The vault behind this gateway
    pub fn vault(&self) -> &Arc<Vault> {
        &self.vault
    }

    /// Run one command against the vault
    pub fn dispatch(&self, command: Command) -> Result<Response, UserError> {
        debug!(cmd = command.name(), "dispatching command");
        self.run(command).map_err(|e| {
            debug!(error_name = e.error_name(), "command failed");
            UserError::from(e)
        })
    }

    fn run(&self, command: Command) -> PyroResult<Response> {
        let vault = &self.vault;
        match command {
            Command::LoadDocuments => vault.list().map(Response::Documents),
            Command::SaveDocument { doc_name, text } => {
                vault.put(&doc_name, text).map(|()| Response::Ack)
            }
            Command::Crypt { password, locking } => {
                if locking {
                    vault.lock(&password)?;
                } else {
                    vault.unlock(&password)?;
                }
                Ok(Response::Ack)
            }
            Command::GetDocument { doc_name } => {
                let text = vault.get(&doc_name)?;
                Ok(Response::Document { doc_name, text })
            }
            Command::RenameDocument { old_name, new_name } => {
                vault.rename(&old_name, &new_name).map(|()| Response::Ack)
            }
            Command::DeleteDocument { doc_name } => {
                vault.delete(&doc_name).map(|()| Response::Ack)
            }
            Command::SetupPassword { password } => {
                vault.initialize(&password).map(|()| Response::Ack)
            }
            Command::Status => vault.status().map(Response::Status),
        }
    }

    /// Handle a parsed request
    pub fn handle(&self, request: Request) -> Reply {
        Reply::new(request.id, self.dispatch(request.command))
    }

    /// One JSON request in, one JSON reply out
    pub fn invoke(&self, line: &str) -> String {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).to_json(),
            Err(e) => {
                debug!("unparseable request");
                Reply::new(None, Err(UserError::parsing(&e))).to_json()
            }
        }
    }

    /// Serve newline-delimited JSON requests until `reader` reaches EOF
    ///
    /// Requests are handled one at a time in arrival order and each gets
    /// exactly one reply line. A line that is not a valid request, UTF-8
    /// included, is answered with a `ParsingError` and reading continues.
    /// At EOF the vault is shut down.
    pub fn serve<R, W>(&self, mut reader: R, mut writer: W) -> PyroResult<()>
    where
        R: BufRead,
        W: Write,
    {
        info!("gateway serving");
        let watch_idle = self.vault.settings().idle_timeout_secs.is_some();

        let result = thread::scope(|scope| {
            let (stop_tx, stop_rx) = mpsc::channel::<()>();
            if watch_idle {
                scope.spawn(move || self.watch_idle(stop_rx));
            }

            let result = self.read_requests(&mut reader, &mut writer);
            drop(stop_tx);
            result
        });

        info!("gateway input closed");
        let shutdown = self.vault.shutdown();
        result.and(shutdown)
    }

    fn read_requests<R, W>(&self, reader: &mut R, writer: &mut W) -> PyroResult<()>
    where
        R: BufRead,
        W: Write,
    {
        let mut buf = Zeroizing::new(Vec::new());
        loop {
            buf.zeroize();
            if reader.read_until(b'\n', &mut *buf)? == 0 {
                return Ok(());
            }

            let reply = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.invoke(line),
                Err(_) => {
                    debug!("request is not valid UTF-8");
                    Reply::new(None, Err(UserError::malformed("Request is not valid UTF-8")))
                        .to_json()
                }
            };
            writeln!(writer, "{}", reply)?;
            writer.flush()?;
        }
    }

    fn watch_idle(&self, stop: mpsc::Receiver<()>) {
        loop {
            match stop.recv_timeout(IDLE_POLL) {
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(e) = self.vault.lock_if_idle() {
                        warn!(error = %e, "idle auto-lock failed");
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PyroPaths, Settings};
    use crate::crypto::KdfParams;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn gateway() -> (TempDir, CommandGateway) {
        let temp_dir = TempDir::new().unwrap();
        let paths = PyroPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = Settings {
            kdf: KdfParams::new(1024, 1, 1),
            ..Settings::default()
        };
        let vault = Vault::open(&paths, settings).unwrap();
        (temp_dir, CommandGateway::new(Arc::new(vault)))
    }

    fn call(gateway: &CommandGateway, request: Value) -> Value {
        serde_json::from_str(&gateway.invoke(&request.to_string())).unwrap()
    }

    #[test]
    fn test_locked_vault_reports_not_encrypted() {
        let (_temp, gateway) = gateway();
        gateway.vault().initialize("password1").unwrap();
        gateway.vault().lock("password1").unwrap();

        let reply = call(&gateway, json!({"id": 1, "cmd": "load_documents"}));
        assert_eq!(reply["id"], 1);
        assert_eq!(reply["error"]["error_name"], "NotEncryptedError");
    }

    #[test]
    fn test_document_flow() {
        let (_temp, gateway) = gateway();
        let reply = call(&gateway, json!({"cmd": "setupPassword", "password": "password1"}));
        assert_eq!(reply["ok"], Value::Null);
        assert!(reply.get("error").is_none());

        call(&gateway, json!({"cmd": "saveDocument", "doc_name": "notes", "text": "hi"}));
        let reply = call(&gateway, json!({"cmd": "load_documents"}));
        assert_eq!(reply["ok"], json!(["notes"]));

        let reply = call(&gateway, json!({"cmd": "getDocument", "doc_name": "notes"}));
        assert_eq!(reply["ok"], json!({"doc_name": "notes", "text": "hi"}));

        let reply = call(
            &gateway,
            json!({"cmd": "renameDocument", "old_name": "notes", "new_name": "todo"}),
        );
        assert!(reply.get("ok").is_some());

        let reply = call(&gateway, json!({"cmd": "deleteDocument", "doc_name": "notes"}));
        assert_eq!(reply["error"]["error_name"], "NotFoundError");
    }

    #[test]
    fn test_crypt_round_trip() {
        let (_temp, gateway) = gateway();
        call(&gateway, json!({"cmd": "setupPassword", "password": "password1"}));
        call(&gateway, json!({"cmd": "saveDocument", "doc_name": "a", "text": "b"}));

        let reply = call(&gateway, json!({"cmd": "crypt", "password": "password1", "locking": true}));
        assert!(reply.get("ok").is_some());
        let reply = call(&gateway, json!({"cmd": "status"}));
        assert_eq!(reply["ok"], json!({"state": "locked"}));

        let reply = call(&gateway, json!({"cmd": "crypt", "password": "nope-nope", "locking": false}));
        assert_eq!(reply["error"]["error_name"], "AuthenticationError");

        call(&gateway, json!({"cmd": "crypt", "password": "password1", "locking": false}));
        let reply = call(&gateway, json!({"cmd": "status"}));
        assert_eq!(reply["ok"], json!({"state": "unlocked", "documents": 1}));
    }

    #[test]
    fn test_invalid_json() {
        let (_temp, gateway) = gateway();
        let reply: Value = serde_json::from_str(&gateway.invoke("{not json")).unwrap();
        assert_eq!(reply["error"]["error_name"], "ParsingError");
        assert_eq!(reply["id"], Value::Null);
    }

    #[test]
    fn test_serve_answers_every_line_in_order() {
        let (_temp, gateway) = gateway();
        let input = concat!(
            r#"{"id": 1, "cmd": "status"}"#,
            "\n\n",
            r#"{"id": 2, "cmd": "load_documents"}"#,
            "\n",
            "garbage\n",
        );
        let mut output = Vec::new();
        gateway.serve(input.as_bytes(), &mut output).unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[0]["ok"], json!({"state": "uninitialized"}));
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["error"]["error_name"], "NotEncryptedError");
        assert_eq!(replies[2]["error"]["error_name"], "ParsingError");
    }

    #[test]
    fn test_serve_survives_invalid_utf8() {
        let (_temp, gateway) = gateway();
        let mut input = b"{\"id\": 1, \"cmd\": \"st\xffatus\"}\n".to_vec();
        input.extend_from_slice(b"{\"id\": 2, \"cmd\": \"status\"}\n");
        let mut output = Vec::new();
        gateway.serve(&input[..], &mut output).unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], Value::Null);
        assert_eq!(replies[0]["error"]["error_name"], "ParsingError");
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["ok"], json!({"state": "uninitialized"}));
    }
}
