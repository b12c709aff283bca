use super::{core_err, json_pretty, resolve_environment, EXIT_SUCCESS};
use berth_core::Engine;

/// Print the variable set as `export` lines for `eval $(berth root)`.
pub fn run(engine: &Engine, name: Option<&str>, json: bool) -> Result<u8, String> {
    let environment = resolve_environment(engine, name)?;
    let vars = engine
        .required_variables(&environment.name)
        .map_err(core_err)?;

    if json {
        println!("{}", json_pretty(&vars)?);
        return Ok(EXIT_SUCCESS);
    }

    for (key, value) in vars.iter() {
        println!("export {key}={}", shell_quote(value));
    }
    println!("# Run this command to configure your shell:");
    println!("# eval $(berth root)");
    Ok(EXIT_SUCCESS)
}

/// Single-quote `value` for POSIX shells; nothing inside is expanded.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_value_is_single_quoted() {
        assert_eq!(shell_quote("blog"), "'blog'");
    }

    #[test]
    fn shell_metacharacters_stay_literal() {
        assert_eq!(
            shell_quote("/srv/$HOME/`id`/a\\b"),
            "'/srv/$HOME/`id`/a\\b'"
        );
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
