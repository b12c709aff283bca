use crate::process::{
    argv, EnvVars, ProcessRunner, RunMode, COMPOSE_FILE, COMPOSE_PROJECT_NAME, DOCKER_PHP_IMAGE,
    PROJECT_LOCATION,
};
use crate::RuntimeError;
use berth_schema::Environment;
use std::path::Path;
use tracing::warn;

const SSH_AGENT_FIX: &str = "chown www-data:www-data /run/host-services/ssh-auth.sock";

/// Derive the variables every tool invocation for `environment` must see.
///
/// The PHP image comes from the environment's generated `.env`, falling back
/// to `default_php_version`. Fails when the derived project name is empty.
pub fn required_variables(
    environment: &Environment,
    default_php_version: &str,
) -> Result<EnvVars, RuntimeError> {
    let install_dir = environment.installation_dir();
    let php_image = read_dotenv_value(&install_dir.join(".env"), DOCKER_PHP_IMAGE)
        .unwrap_or_else(|| default_php_version.to_owned());

    let mut vars = EnvVars::new();
    vars.insert(
        COMPOSE_FILE,
        install_dir
            .join("docker-compose.yml")
            .to_string_lossy()
            .into_owned(),
    );
    vars.insert(COMPOSE_PROJECT_NAME, environment.name.trim());
    vars.insert(DOCKER_PHP_IMAGE, php_image);
    vars.insert(
        PROJECT_LOCATION,
        environment.location.to_string_lossy().into_owned(),
    );

    vars.project_name()?;
    Ok(vars)
}

fn read_dotenv_value(path: &Path, key: &str) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    content.lines().find_map(|line| {
        let line = line.trim();
        if line.starts_with('#') {
            return None;
        }
        let (k, v) = line.split_once('=')?;
        (k.trim() == key)
            .then(|| v.trim().trim_matches('"').to_owned())
            .filter(|v| !v.is_empty())
    })
}

/// Wrapper around `docker compose` for one environment's services.
pub struct Compose<'r> {
    runner: &'r dyn ProcessRunner,
}

impl<'r> Compose<'r> {
    pub fn new(runner: &'r dyn ProcessRunner) -> Self {
        Self { runner }
    }

    /// Hand the forwarded SSH agent socket to the web user inside the PHP
    /// container. Best effort.
    pub fn fix_shared_agent_permissions(&self, vars: &EnvVars) -> Result<bool, RuntimeError> {
        let ok = self.compose(&["exec", "-T", "php", "bash", "-c", SSH_AGENT_FIX], vars)?;
        if !ok {
            warn!("could not fix permissions on the shared SSH agent socket");
        }
        Ok(ok)
    }

    pub fn start_services(&self, vars: &EnvVars) -> Result<bool, RuntimeError> {
        self.compose(&["up", "--build", "--detach", "--remove-orphans"], vars)
    }

    pub fn stop_services(&self, vars: &EnvVars) -> Result<bool, RuntimeError> {
        self.compose(&["stop"], vars)
    }

    pub fn restart_services(&self, vars: &EnvVars) -> Result<bool, RuntimeError> {
        self.compose(&["restart"], vars)
    }

    /// Remove containers, locally built images, and volumes.
    pub fn remove_services(&self, vars: &EnvVars) -> Result<bool, RuntimeError> {
        self.compose(
            &["down", "--rmi", "local", "--volumes", "--remove-orphans"],
            vars,
        )
    }

    fn compose(&self, args: &[&str], vars: &EnvVars) -> Result<bool, RuntimeError> {
        vars.project_name()?;
        let mut command = argv(&["docker", "compose"]);
        command.extend(args.iter().map(|a| (*a).to_owned()));
        Ok(self.runner.run(&command, vars, RunMode::Foreground)?.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunner;
    use berth_schema::EnvironmentType;

    fn shop(location: &Path) -> Environment {
        Environment::new("shop", location, EnvironmentType::Magento2, None)
    }

    #[test]
    fn derives_variables_from_environment() {
        let env = shop(Path::new("/srv/shop"));
        let vars = required_variables(&env, "8.2").unwrap();

        assert_eq!(vars.get(COMPOSE_PROJECT_NAME), Some("shop"));
        assert_eq!(vars.get(PROJECT_LOCATION), Some("/srv/shop"));
        assert_eq!(
            vars.get(COMPOSE_FILE),
            Some("/srv/shop/var/docker/docker-compose.yml")
        );
        assert_eq!(vars.get(DOCKER_PHP_IMAGE), Some("8.2"));
    }

    #[test]
    fn php_image_read_from_generated_dotenv() {
        let dir = tempfile::tempdir().unwrap();
        let env = shop(dir.path());
        std::fs::create_dir_all(env.installation_dir()).unwrap();
        std::fs::write(
            env.installation_dir().join(".env"),
            "# generated\nDOCKER_PHP_IMAGE=\"8.1\"\nOTHER=x\n",
        )
        .unwrap();

        let vars = required_variables(&env, "latest").unwrap();
        assert_eq!(vars.get(DOCKER_PHP_IMAGE), Some("8.1"));
    }

    #[test]
    fn derivation_is_per_environment() {
        let shop_vars = required_variables(&shop(Path::new("/srv/shop")), "latest").unwrap();
        let blog = Environment::new("blog", "/srv/blog", EnvironmentType::Symfony, None);
        let blog_vars = required_variables(&blog, "latest").unwrap();
        assert_ne!(shop_vars, blog_vars);
        assert_eq!(blog_vars.get(COMPOSE_PROJECT_NAME), Some("blog"));
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut env = shop(Path::new("/srv/shop"));
        env.name = String::new();
        assert!(matches!(
            required_variables(&env, "latest"),
            Err(RuntimeError::MissingVariable(COMPOSE_PROJECT_NAME))
        ));
    }

    #[test]
    fn fixes_agent_socket_in_php_container() {
        let runner = MockRunner::new();
        let vars = required_variables(&shop(Path::new("/srv/shop")), "latest").unwrap();
        assert!(Compose::new(&runner)
            .fix_shared_agent_permissions(&vars)
            .unwrap());
        assert_eq!(
            runner.calls()[0].argv,
            vec![
                "docker",
                "compose",
                "exec",
                "-T",
                "php",
                "bash",
                "-c",
                "chown www-data:www-data /run/host-services/ssh-auth.sock",
            ]
        );
    }

    #[test]
    fn service_commands() {
        let runner = MockRunner::new();
        let vars = required_variables(&shop(Path::new("/srv/shop")), "latest").unwrap();
        let compose = Compose::new(&runner);
        compose.start_services(&vars).unwrap();
        compose.stop_services(&vars).unwrap();
        compose.restart_services(&vars).unwrap();
        compose.remove_services(&vars).unwrap();
        assert_eq!(
            runner.command_lines(),
            vec![
                "docker compose up --build --detach --remove-orphans",
                "docker compose stop",
                "docker compose restart",
                "docker compose down --rmi local --volumes --remove-orphans",
            ]
        );
    }

    #[test]
    fn reports_compose_failure() {
        let runner = MockRunner::new();
        runner.fail_on(&["docker", "compose", "up"]);
        let vars = required_variables(&shop(Path::new("/srv/shop")), "latest").unwrap();
        assert!(!Compose::new(&runner).start_services(&vars).unwrap());
    }
}
