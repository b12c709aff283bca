use super::{core_err, is_tty, print_report, EXIT_SUCCESS};
use berth_core::{Engine, InstallRequest};
use berth_schema::{identify_type, EnvironmentType};
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};

pub struct InstallArgs {
    pub location: Option<PathBuf>,
    pub name: Option<String>,
    pub env_type: Option<EnvironmentType>,
    pub php: Option<String>,
    pub domains: Option<String>,
}

fn default_name(location: &Path) -> String {
    location
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn prompt_err(e: dialoguer::Error) -> String {
    format!("prompt failed: {e}")
}

/// Fill the values missing from the command line by asking the operator.
fn ask(engine: &Engine, location: &Path, args: InstallArgs) -> Result<InstallRequest, String> {
    let name = match args.name {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("What is the name of the environment you want to install?")
            .default(default_name(location))
            .interact_text()
            .map_err(prompt_err)?,
    };

    let env_type = match args.env_type {
        Some(t) => t,
        None => {
            let detected = identify_type(location).unwrap_or(EnvironmentType::Symfony);
            let default_idx = EnvironmentType::ALL
                .iter()
                .position(|t| *t == detected)
                .unwrap_or(0);
            let items: Vec<&str> = EnvironmentType::ALL.iter().map(|t| t.as_str()).collect();
            let idx = Select::new()
                .with_prompt("Which type of environment do you want to install?")
                .items(&items)
                .default(default_idx)
                .interact()
                .map_err(prompt_err)?;
            EnvironmentType::ALL[idx]
        }
    };

    let php_version = match args.php {
        Some(v) => v,
        None => Input::<String>::new()
            .with_prompt("Which version of PHP do you want to use?")
            .default(engine.settings().default_php_version.clone())
            .interact_text()
            .map_err(prompt_err)?,
    };

    let domains = match args.domains {
        Some(d) => Some(d),
        None if berth_runtime::can_make_trusted_certificates() => {
            let wanted = Confirm::new()
                .with_prompt("Do you want to generate a locally-trusted certificate with mkcert?")
                .default(true)
                .interact()
                .map_err(prompt_err)?;
            if wanted {
                let d: String = Input::<String>::new()
                    .with_prompt("Which domains does this certificate belong to?")
                    .default(env_type.default_domain())
                    .interact_text()
                    .map_err(prompt_err)?;
                Some(d)
            } else {
                None
            }
        }
        None => None,
    };

    Ok(InstallRequest {
        name,
        location: location.to_path_buf(),
        env_type,
        php_version: Some(php_version),
        domains,
    })
}

/// Build the request from flags alone; the type must be given or detectable.
fn from_flags(location: &Path, args: InstallArgs) -> Result<InstallRequest, String> {
    let env_type = args
        .env_type
        .or_else(|| identify_type(location))
        .ok_or_else(|| {
            format!(
                "unable to detect the technology of {}; pass --type",
                location.display()
            )
        })?;
    Ok(InstallRequest {
        name: args.name.unwrap_or_else(|| default_name(location)),
        location: location.to_path_buf(),
        env_type,
        php_version: args.php,
        domains: args.domains,
    })
}

pub fn run(engine: &Engine, args: InstallArgs, assume_yes: bool, json: bool) -> Result<u8, String> {
    let location = match args.location.clone() {
        Some(l) => l,
        None => std::env::current_dir().map_err(|e| format!("cannot read current directory: {e}"))?,
    };
    let location = if location.is_absolute() {
        location
    } else {
        std::env::current_dir()
            .map_err(|e| format!("cannot read current directory: {e}"))?
            .join(location)
    };

    let request = if is_tty() && !assume_yes && !json {
        ask(engine, &location, args)?
    } else {
        from_flags(&location, args)?
    };

    let report = engine.install(request).map_err(core_err)?;
    print_report(&report, "Environment successfully installed.", json)?;
    Ok(EXIT_SUCCESS)
}
