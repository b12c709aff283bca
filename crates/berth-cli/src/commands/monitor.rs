use super::{core_err, resolve_environment, EXIT_EXCEPTION, EXIT_SUCCESS};
use berth_core::Engine;

pub fn run(engine: &Engine, name: Option<&str>) -> Result<u8, String> {
    let environment = resolve_environment(engine, name)?;
    let ok = engine.monitor(&environment.name).map_err(core_err)?;
    Ok(if ok { EXIT_SUCCESS } else { EXIT_EXCEPTION })
}
