//! ScpTransport - `<tool> -i <identity> <local> <user>@<host>:<dir>/`

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::ports::{TransferOutcome, Transport};

/// Remote archive location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTarget {
    pub user: String,
    pub host: String,
    pub directory: String,
}

impl RemoteTarget {
    /// `user@host:directory/` (exactly one trailing slash).
    pub fn destination(&self) -> String {
        format!(
            "{}@{}:{}/",
            self.user,
            self.host,
            self.directory.trim_end_matches('/')
        )
    }
}

/// Copies files by running an scp-compatible executable.
///
/// Exit code 0 is success. Any other exit is a remote failure; a spawn
/// error (binary missing, not executable) means the tool is unavailable.
#[derive(Debug, Clone)]
pub struct ScpTransport {
    tool: PathBuf,
    tool_name: String,
    identity_file: PathBuf,
    target: RemoteTarget,
}

impl ScpTransport {
    pub fn new(tool: impl Into<PathBuf>, identity_file: impl Into<PathBuf>, target: RemoteTarget) -> Self {
        let tool = tool.into();
        Self {
            tool_name: tool.display().to_string(),
            tool,
            identity_file: identity_file.into(),
            target,
        }
    }

    /// Arguments passed to the tool for `local_path`.
    pub fn args(&self, local_path: &Path) -> Vec<OsString> {
        vec![
            OsString::from("-i"),
            self.identity_file.clone().into_os_string(),
            local_path.as_os_str().to_os_string(),
            OsString::from(self.target.destination()),
        ]
    }
}

#[async_trait]
impl Transport for ScpTransport {
    fn name(&self) -> &str {
        &self.tool_name
    }

    async fn transfer(&self, local_path: &Path) -> TransferOutcome {
        debug!(tool = %self.tool_name, file = %local_path.display(), "running copy tool");
        let output = Command::new(&self.tool)
            .args(self.args(local_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Err(e) => TransferOutcome::ToolUnavailable {
                detail: e.to_string(),
            },
            Ok(out) if out.status.success() => TransferOutcome::Delivered,
            Ok(out) => {
                let code = out
                    .status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string());
                let stderr = String::from_utf8_lossy(&out.stderr);
                TransferOutcome::RemoteFailure {
                    detail: format!("exit {code}: {}", stderr.trim()),
                }
            }
        }
    }
}
