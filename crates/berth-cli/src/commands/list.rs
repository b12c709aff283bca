use super::{colorize_active, core_err, json_pretty, EXIT_SUCCESS};
use berth_core::Engine;

pub fn run(engine: &Engine, only_active: bool, json: bool) -> Result<u8, String> {
    let envs = engine.list(only_active).map_err(core_err)?;
    if json {
        println!("{}", json_pretty(&envs)?);
    } else if envs.is_empty() {
        println!("no environments found");
    } else {
        println!(
            "{:<16} {:<10} {:<10} {:<28} LOCATION",
            "NAME", "TYPE", "STATE", "DOMAINS"
        );
        for env in &envs {
            println!(
                "{:<16} {:<10} {:<10} {:<28} {}",
                env.name,
                env.env_type,
                colorize_active(env.active),
                env.domains.as_deref().unwrap_or("-"),
                env.location.display()
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
