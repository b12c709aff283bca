use std::fmt;
use std::process::Command;

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: &'static str,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn command_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn compose_plugin_works() -> bool {
    Command::new("docker")
        .args(["compose", "version"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check the tools needed to start, stop, and remove environments.
/// Returns a list of missing items. Empty list means all prerequisites are met.
pub fn check_lifecycle_prereqs() -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if !command_exists("docker") {
        missing.push(MissingPrereq {
            name: "docker",
            purpose: "running the environment containers",
            install_hint: "https://docs.docker.com/engine/install/",
        });
    } else if !compose_plugin_works() {
        missing.push(MissingPrereq {
            name: "docker compose",
            purpose: "orchestrating the environment services",
            install_hint: "apt install docker-compose-plugin | dnf install docker-compose-plugin",
        });
    }

    if !command_exists("mutagen") {
        missing.push(MissingPrereq {
            name: "mutagen",
            purpose: "two-way synchronization of the project sources",
            install_hint: "brew install mutagen-io/mutagen/mutagen | https://mutagen.io/documentation/introduction/installation",
        });
    }

    missing
}

/// Whether `mkcert` is installed, so locally-trusted certificates can be offered.
pub fn can_make_trusted_certificates() -> bool {
    command_exists("mkcert")
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\nBerth requires these tools to run container environments.");
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_prereq_display() {
        let m = MissingPrereq {
            name: "mutagen",
            purpose: "file sync",
            install_hint: "brew install mutagen",
        };
        let s = format!("{m}");
        assert!(s.contains("mutagen"));
        assert!(s.contains("file sync"));
        assert!(s.contains("brew install mutagen"));
    }

    #[test]
    fn format_missing_produces_readable_output() {
        let items = vec![
            MissingPrereq {
                name: "docker",
                purpose: "containers",
                install_hint: "apt install docker.io",
            },
            MissingPrereq {
                name: "mutagen",
                purpose: "sync",
                install_hint: "brew install mutagen",
            },
        ];
        let output = format_missing(&items);
        assert!(output.contains("missing prerequisites:"));
        assert!(output.contains("docker"));
        assert!(output.contains("mutagen"));
    }

    #[test]
    fn which_reports_absent_binary() {
        assert!(!command_exists("berth-definitely-not-installed"));
    }
}
