use super::{confirm, core_err, is_tty, json_pretty, resolve_environment, EXIT_SUCCESS};
use berth_core::{Engine, UpdateRequest};
use console::Style;
use dialoguer::Input;

pub struct UpdateArgs<'a> {
    pub name: Option<&'a str>,
    pub php: Option<String>,
    pub domains: Option<String>,
    pub no_domains: bool,
}

pub fn run(engine: &Engine, args: UpdateArgs<'_>, assume_yes: bool, json: bool) -> Result<u8, String> {
    let environment = resolve_environment(engine, args.name)?;
    let question = format!(
        "Are you sure you want to update the {} environment?",
        environment.name
    );
    if !confirm(&question, false, assume_yes)? {
        println!("update cancelled");
        return Ok(EXIT_SUCCESS);
    }

    let domains = if args.no_domains {
        None
    } else if args.domains.is_some() {
        args.domains
    } else if is_tty() && !assume_yes {
        let answer: String = Input::<String>::new()
            .with_prompt("Which domains does this certificate belong to? (empty for none)")
            .with_initial_text(environment.domains.clone().unwrap_or_default())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| format!("prompt failed: {e}"))?;
        Some(answer).filter(|d| !d.trim().is_empty())
    } else {
        environment.domains.clone()
    };

    let updated = engine
        .update(
            &environment.name,
            UpdateRequest {
                php_version: args.php,
                domains,
            },
        )
        .map_err(core_err)?;

    if json {
        println!("{}", json_pretty(&updated)?);
    } else {
        println!(
            "{} Environment successfully updated.",
            Style::new().green().apply_to("✓")
        );
        println!("If you changed the database service, consider resetting its volume.");
    }
    Ok(EXIT_SUCCESS)
}
