//! Socket listing inside an instance via `wsl -d <name> -u root -- ss -tlnp`.

use std::time::Duration;

use crate::error::Result;
use crate::ports::SocketListerPort;
use crate::settings::Settings;

use super::{decode_output, run_command};

/// Runs the socket command inside a WSL distribution.
///
/// The command runs as `settings.user` (root by default): `ss -p` only shows
/// owning processes the caller is allowed to inspect.
pub struct WslSocketLister {
    wsl_command: String,
    user: String,
    socket_command: Vec<String>,
    timeout: Duration,
}

impl WslSocketLister {
    pub fn new(settings: &Settings) -> Self {
        Self {
            wsl_command: settings.wsl_command.clone(),
            user: settings.user.clone(),
            socket_command: settings.socket_command.clone(),
            timeout: settings.command_timeout(),
        }
    }

    /// Arguments passed to `wsl` for one instance.
    fn args(&self, instance_id: &str) -> Vec<String> {
        let mut args = vec![
            "-d".to_string(),
            instance_id.to_string(),
            "-u".to_string(),
            self.user.clone(),
            "--".to_string(),
        ];
        args.extend(self.socket_command.iter().cloned());
        args
    }
}

impl SocketListerPort for WslSocketLister {
    async fn list_sockets(&self, instance_id: &str) -> Result<String> {
        let stdout = run_command(&self.wsl_command, &self.args(instance_id), self.timeout).await?;
        Ok(decode_output(&stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let lister = WslSocketLister::new(&Settings::default());
        assert_eq!(
            lister.args("Ubuntu-22.04"),
            vec!["-d", "Ubuntu-22.04", "-u", "root", "--", "ss", "-tlnp"]
        );
    }

    #[test]
    fn test_missing_wsl_is_an_error() {
        let settings = Settings {
            wsl_command: "/nonexistent/wsl".to_string(),
            ..Settings::default()
        };
        let lister = WslSocketLister::new(&settings);
        let result = tokio_test::block_on(lister.list_sockets("Ubuntu"));
        assert!(result.is_err());
    }
}
