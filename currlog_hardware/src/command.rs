//! External collaborators invoked as child processes: storage release
//! (`umount`) and the audio announcement helper.
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use currlog_traits::{Notifier, StorageEject};

use crate::error::{HwError, Result};
use crate::util::poll_until;

const CHILD_POLL: Duration = Duration::from_millis(20);

/// Releases removable storage by running an external command with the mount
/// path appended as the last argument (default: `umount <path>`).
#[derive(Debug, Clone)]
pub struct CommandEject {
    program: String,
    args: Vec<String>,
}

impl CommandEject {
    /// `argv[0]` is the program; remaining entries are passed before the path.
    pub fn new(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| HwError::Command("empty release command".into()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl StorageEject for CommandEject {
    fn release(
        &mut self,
        mount_path: &Path,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(mount_path)
            .stdin(Stdio::null())
            .status()?;
        if !status.success() {
            return Err(HwError::Command(format!("{} exited with {status}", self.program)).into());
        }
        tracing::debug!(path = %mount_path.display(), "storage released");
        Ok(())
    }
}

/// Runs an announcement helper program, substituting `{device}` and `{url}`
/// in its arguments. The child is killed when it outlives `timeout`.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandNotifier {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Result<Self> {
        if argv.is_empty() {
            return Err(HwError::Command("empty notify command".into()));
        }
        Ok(Self { argv, timeout })
    }

    fn render(&self, device: &str, media_url: &str) -> Vec<String> {
        self.argv
            .iter()
            .map(|a| a.replace("{device}", device).replace("{url}", media_url))
            .collect()
    }
}

impl Notifier for CommandNotifier {
    fn announce(
        &self,
        device: &str,
        media_url: &str,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let argv = self.render(device, media_url);
        let Some((program, args)) = argv.split_first() else {
            return Err(HwError::Command("empty notify command".into()).into());
        };
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let waited = poll_until(
            || match child.try_wait() {
                Ok(Some(status)) => Some(Ok(status)),
                Ok(None) => None,
                Err(e) => Some(Err(e)),
            },
            self.timeout,
            CHILD_POLL,
        );

        let Ok(exited) = waited else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(HwError::CommandTimeout(self.timeout).into());
        };
        let status = exited.map_err(HwError::Io)?;
        if status.success() {
            Ok(())
        } else {
            Err(HwError::Command(format!("{program} exited with {status}")).into())
        }
    }
}
