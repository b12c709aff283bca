use super::{EXIT_EXCEPTION, EXIT_SUCCESS};
use berth_store::{FileRegistry, Registry, StoreLayout};
use std::path::Path;

pub fn run(store_path: &Path, hosts_file: &Path, json_output: bool) -> Result<u8, String> {
    let mut checks: Vec<Check> = Vec::new();
    let mut all_pass = true;

    check_prereqs(&mut checks, &mut all_pass);
    check_hosts_file(hosts_file, &mut checks);

    let layout = StoreLayout::new(store_path);
    if layout.is_initialized() {
        checks.push(Check::pass("store_exists", "Store directory exists"));
        check_store(&layout, &mut checks, &mut all_pass);
        check_disk_space(store_path, &mut checks);
    } else {
        checks.push(Check::info(
            "store_exists",
            "Store not initialized (will be created on first install)",
        ));
    }

    print_results(&checks, all_pass, json_output)
}

fn check_prereqs(checks: &mut Vec<Check>, all_pass: &mut bool) {
    let missing = berth_runtime::check_lifecycle_prereqs();
    if missing.is_empty() {
        checks.push(Check::pass(
            "lifecycle_prereqs",
            "docker compose and mutagen are available",
        ));
    } else {
        *all_pass = false;
        checks.push(Check::fail(
            "lifecycle_prereqs",
            &berth_runtime::format_missing(&missing),
        ));
    }

    if berth_runtime::can_make_trusted_certificates() {
        checks.push(Check::pass("mkcert", "mkcert is available"));
    } else {
        checks.push(Check::warn(
            "mkcert",
            "mkcert not found; environments cannot declare TLS domains",
        ));
    }
}

fn check_hosts_file(hosts_file: &Path, checks: &mut Vec<Check>) {
    match std::fs::metadata(hosts_file) {
        Ok(meta) if meta.permissions().readonly() => checks.push(Check::info(
            "hosts_file",
            &format!(
                "{} is read-only; domain entries will be added with sudo",
                hosts_file.display()
            ),
        )),
        Ok(_) => checks.push(Check::pass(
            "hosts_file",
            &format!("{} is readable", hosts_file.display()),
        )),
        Err(e) => checks.push(Check::warn(
            "hosts_file",
            &format!("Cannot read {}: {e}", hosts_file.display()),
        )),
    }
}

fn check_store(layout: &StoreLayout, checks: &mut Vec<Check>, all_pass: &mut bool) {
    // Version
    match layout.verify_version() {
        Ok(()) => checks.push(Check::pass("store_version", "Store format version valid")),
        Err(e) => {
            *all_pass = false;
            checks.push(Check::fail(
                "store_version",
                &format!("Store version check failed: {e}"),
            ));
        }
    }

    // Lock
    match berth_core::StoreLock::try_acquire(&layout) {
        Ok(Some(_)) => checks.push(Check::pass("store_lock", "Store lock is free")),
        Ok(None) => checks.push(Check::warn(
            "store_lock",
            "Store lock is held by another process",
        )),
        Err(e) => {
            *all_pass = false;
            checks.push(Check::fail(
                "store_lock",
                &format!("Cannot check store lock: {e}"),
            ));
        }
    }

    // Registry integrity and environments
    match FileRegistry::open(layout.clone()) {
        Ok(registry) => {
            let envs = registry.list(false);
            let running = envs.iter().filter(|e| e.active).count();
            checks.push(Check::pass("registry", "Registry checksum verified"));
            checks.push(Check::info(
                "environments",
                &format!("{} environments ({running} running)", envs.len()),
            ));
            if running > 1 {
                *all_pass = false;
                checks.push(Check::fail(
                    "single_active",
                    "More than one environment is marked as running",
                ));
            }
        }
        Err(e) => {
            *all_pass = false;
            checks.push(Check::fail(
                "registry",
                &format!("Registry cannot be loaded: {e}"),
            ));
        }
    }
}

fn print_results(checks: &[Check], all_pass: bool, json_output: bool) -> Result<u8, String> {
    if json_output {
        let json = serde_json::json!({
            "healthy": all_pass,
            "checks": checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "status": c.status,
                "message": c.message,
            })).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?
        );
    } else {
        println!("Berth Doctor\n");
        for check in checks {
            let icon = match check.status {
                "pass" => "✓",
                "fail" => "✗",
                "warn" => "⚠",
                _ => "ℹ",
            };
            println!("  {icon} {}", check.message);
        }
        println!();
        if all_pass {
            println!("All checks passed.");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }
    Ok(if all_pass { EXIT_SUCCESS } else { EXIT_EXCEPTION })
}

struct Check {
    name: String,
    status: &'static str,
    message: String,
}

impl Check {
    fn new(name: &str, status: &'static str, message: &str) -> Self {
        Self {
            name: name.to_owned(),
            status,
            message: message.to_owned(),
        }
    }

    fn pass(name: &str, message: &str) -> Self {
        Self::new(name, "pass", message)
    }

    fn fail(name: &str, message: &str) -> Self {
        Self::new(name, "fail", message)
    }

    fn warn(name: &str, message: &str) -> Self {
        Self::new(name, "warn", message)
    }

    fn info(name: &str, message: &str) -> Self {
        Self::new(name, "info", message)
    }
}

fn check_disk_space(store_path: &Path, checks: &mut Vec<Check>) {
    let Ok(c_path) = std::ffi::CString::new(store_path.to_string_lossy().as_bytes()) else {
        return;
    };

    // SAFETY: zeroed statvfs is a valid initial state for the struct.
    #[allow(unsafe_code, clippy::undocumented_unsafe_blocks)]
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: valid NUL-terminated path and a zeroed output struct that is
    // only read after the call succeeds.
    #[allow(unsafe_code, clippy::undocumented_unsafe_blocks)]
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), &raw mut stat) };
    if ret != 0 {
        return;
    }

    let avail_mb = (stat.f_bavail * stat.f_frsize) / (1024 * 1024);
    if avail_mb < 100 {
        checks.push(Check::warn(
            "disk_space",
            &format!("Low disk space for the registry: {avail_mb} MB available"),
        ));
    } else {
        checks.push(Check::pass(
            "disk_space",
            &format!("Disk space: {avail_mb} MB available"),
        ));
    }
}
