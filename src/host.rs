//! Command boundary between the renderer core and the embedding shell.
//!
//! The shell owns windows, dialogs, and the filesystem outside the data
//! directory. The core only ever talks to it through [`HostCommand`] values
//! and gets back a uniform [`CommandResponse`] envelope, so the shell can be
//! swapped out (or faked in tests) without touching session logic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request from the renderer core to the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    OpenFileDialog,
    OpenFolderDialog,
    ReadFileContent { path: String },
    WriteFileContent { path: String, content: String },
    OpenInFileManager { path: String },
    OpenTerminal { path: String },
    ToggleDevTools,
    QuitApp,
    GetSystemInfo,
}

/// Uniform response envelope for every host command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandResponse {
    #[must_use]
    pub fn ok(data: Option<Value>) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Implemented by the embedding shell.
pub trait HostBridge {
    fn invoke(&self, command: HostCommand) -> CommandResponse;
}
