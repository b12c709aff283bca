use super::{core_err, print_report, resolve_environment, EXIT_EXCEPTION, EXIT_SUCCESS};
use berth_core::Engine;

pub fn start(engine: &Engine, name: Option<&str>, json: bool) -> Result<u8, String> {
    let environment = resolve_environment(engine, name)?;
    let report = engine.start(&environment.name).map_err(core_err)?;
    print_report(&report, "Docker environment successfully started.", json)?;
    Ok(EXIT_SUCCESS)
}

pub fn stop(engine: &Engine, name: Option<&str>, json: bool) -> Result<u8, String> {
    let environment = resolve_environment(engine, name)?;
    let report = engine.stop(&environment.name).map_err(core_err)?;
    print_report(&report, "Docker environment successfully stopped.", json)?;
    Ok(EXIT_SUCCESS)
}

/// Restart services and synchronization; a failed synchronization restart
/// is reported through the exit code.
pub fn restart(engine: &Engine, name: Option<&str>, json: bool) -> Result<u8, String> {
    let environment = resolve_environment(engine, name)?;
    let report = engine.restart(&environment.name).map_err(core_err)?;
    if report.succeeded() {
        print_report(&report, "Docker environment successfully restarted.", json)?;
        Ok(EXIT_SUCCESS)
    } else {
        if json {
            print_report(&report, "", json)?;
        } else {
            for step in &report.degraded {
                eprintln!("error: {}", step.message);
            }
        }
        Ok(EXIT_EXCEPTION)
    }
}
