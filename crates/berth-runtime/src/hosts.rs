use crate::process::{EnvVars, ProcessRunner, RunMode};
use crate::RuntimeError;
use berth_schema::split_domains;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

const LOOPBACK_V4: &str = "127.0.0.1";
const LOOPBACK_V6: &str = "::1";

/// Reads and amends the static name-resolution table (`/etc/hosts`).
pub struct HostsResolver<'r> {
    path: PathBuf,
    runner: &'r dyn ProcessRunner,
}

impl<'r> HostsResolver<'r> {
    pub fn new(path: impl Into<PathBuf>, runner: &'r dyn ProcessRunner) -> Self {
        Self {
            path: path.into(),
            runner,
        }
    }

    /// True when every hostname in `domains` resolves to loopback.
    pub fn has_domains(&self, domains: &str) -> Result<bool, RuntimeError> {
        ensure_supported()?;
        let content = std::fs::read_to_string(&self.path)?;
        let mapped = loopback_hostnames(&content);
        Ok(split_domains(domains)
            .iter()
            .all(|d| mapped.iter().any(|m| m.eq_ignore_ascii_case(d))))
    }

    /// Append `127.0.0.1 <domains>`. Falls back to `sudo` when the file is not
    /// writable by the current user.
    pub fn fix_hosts_file(&self, domains: &str) -> Result<(), RuntimeError> {
        ensure_supported()?;
        let entry = format!("{LOOPBACK_V4} {}", split_domains(domains).join(" "));

        match self.append_directly(&entry) {
            Ok(()) => {
                info!("added '{entry}' to {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied && !is_root() => {
                debug!("{} not writable, retrying with sudo", self.path.display());
                self.append_elevated(&entry)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn append_directly(&self, entry: &str) -> std::io::Result<()> {
        let needs_newline = std::fs::read_to_string(&self.path)
            .map(|c| !c.is_empty() && !c.ends_with('\n'))
            .unwrap_or(false);
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        if needs_newline {
            file.write_all(b"\n")?;
        }
        writeln!(file, "{entry}")
    }

    fn append_elevated(&self, entry: &str) -> Result<(), RuntimeError> {
        let script = format!(
            "printf '%s\\n' {} >> {}",
            shell_quote(entry),
            shell_quote(&self.path.to_string_lossy())
        );
        let command = vec!["sudo".to_owned(), "sh".to_owned(), "-c".to_owned(), script];
        let output = self
            .runner
            .run(&command, &EnvVars::new(), RunMode::Foreground)?;
        if output.success {
            info!("added '{entry}' to {} (elevated)", self.path.display());
            Ok(())
        } else {
            Err(RuntimeError::PermissionDenied(format!(
                "unable to write {}",
                self.path.display()
            )))
        }
    }
}

fn ensure_supported() -> Result<(), RuntimeError> {
    if cfg!(unix) {
        Ok(())
    } else {
        Err(RuntimeError::UnsupportedPlatform(
            std::env::consts::OS.to_owned(),
        ))
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn is_root() -> bool {
    // SAFETY: geteuid() has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

/// Hostnames mapped to a loopback address, ignoring comments.
fn loopback_hostnames(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let address = fields.next()?;
            (address == LOOPBACK_V4 || address == LOOPBACK_V6).then_some(fields)
        })
        .flatten()
        .collect()
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
