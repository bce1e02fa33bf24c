//! WSL adapters built on `wsl.exe`.
//!
//! Every invocation goes through [`run_command`], which bounds it with a
//! timeout and turns non-zero exits into [`Error::NonZeroExit`].

mod enumerator;
mod lister;

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};

pub use enumerator::{parse_instance_list, WslEnumerator};
pub use lister::WslSocketLister;

/// Run a command to completion and return its stdout.
async fn run_command(program: &str, args: &[String], limit: Duration) -> Result<Vec<u8>> {
    debug!(program = program, args = ?args, "Executing command");

    let result = timeout(limit, async {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
    })
    .await;

    match result {
        Ok(Ok(output)) => {
            if output.status.success() {
                Ok(output.stdout)
            } else {
                let stderr = decode_output(&output.stderr).trim().to_string();
                debug!(program = program, code = ?output.status.code(), "Command failed");
                Err(Error::NonZeroExit {
                    code: output.status.code(),
                    stderr,
                })
            }
        }
        Ok(Err(e)) => Err(Error::CommandFailed(format!("Failed to run {}: {}", program, e))),
        Err(_) => Err(Error::Timeout(limit)),
    }
}

/// Decode command output that may be UTF-16LE.
///
/// `wsl.exe` writes its own messages as UTF-16LE, while output of commands
/// run inside an instance is UTF-8. UTF-16 is detected by a BOM or by a NUL
/// in the high byte of one of the first few code units.
pub fn decode_output(bytes: &[u8]) -> String {
    let has_bom = bytes.starts_with(&[0xFF, 0xFE]);
    let looks_utf16 = bytes.len() >= 2
        && bytes.len() % 2 == 0
        && bytes.iter().skip(1).step_by(2).take(10).any(|b| *b == 0);

    if has_bom || looks_utf16 {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let units = units.strip_prefix(&[0xFEFF]).unwrap_or(&units[..]);
        String::from_utf16_lossy(units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
