use super::{confirm, core_err, print_report, resolve_environment, EXIT_SUCCESS};
use berth_core::Engine;

pub fn run(engine: &Engine, name: Option<&str>, assume_yes: bool, json: bool) -> Result<u8, String> {
    let environment = resolve_environment(engine, name)?;
    let question = format!(
        "Are you sure you want to uninstall the {} environment?",
        environment.name
    );
    if !confirm(&question, false, assume_yes)? {
        println!("uninstall cancelled");
        return Ok(EXIT_SUCCESS);
    }

    let report = engine.uninstall(&environment.name).map_err(core_err)?;
    print_report(&report, "Environment successfully uninstalled.", json)?;
    Ok(EXIT_SUCCESS)
}
