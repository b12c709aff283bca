use crate::templates::{blueprint_for, render_dotenv, render_nginx};
use crate::CoreError;
use berth_runtime::{Mkcert, ProcessRunner};
use berth_schema::Environment;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Materializes an environment's configuration under `<location>/var/docker`.
pub struct ConfigurationInstaller<'r> {
    runner: &'r dyn ProcessRunner,
}

impl<'r> ConfigurationInstaller<'r> {
    pub fn new(runner: &'r dyn ProcessRunner) -> Self {
        Self { runner }
    }

    /// Write the compose file, `.env`, and proxy configuration, then generate
    /// a certificate when the environment declares domains. Running it again
    /// overwrites the previous files.
    pub fn install(&self, environment: &Environment, php_version: &str) -> Result<(), CoreError> {
        let dir = environment.installation_dir();
        let domains = environment.domain_list();
        info!(
            "installing {} configuration in {}",
            environment.env_type,
            dir.display()
        );

        let nginx_dir = dir.join("nginx");
        create_dir(&nginx_dir)?;

        let blueprint = blueprint_for(environment.env_type);
        write_file(&dir.join("docker-compose.yml"), blueprint.compose)?;
        write_file(&dir.join(".env"), &render_dotenv(php_version))?;
        write_file(
            &nginx_dir.join("default.conf"),
            &render_nginx(environment.env_type, &domains),
        )?;

        if !domains.is_empty() {
            let certs = nginx_dir.join("certs");
            create_dir(&certs)?;
            let generated = Mkcert::new(self.runner).generate_certificate(
                &certs.join("custom.pem"),
                &certs.join("custom.key"),
                &domains,
            );
            match generated {
                Ok(true) => debug!("certificate written to {}", certs.display()),
                Ok(false) => {
                    return Err(CoreError::Filesystem(format!(
                        "unable to generate the certificate for {}",
                        domains.join(", ")
                    )))
                }
                Err(e) => {
                    return Err(CoreError::Filesystem(format!(
                        "unable to generate the certificate for {}: {e}",
                        domains.join(", ")
                    )))
                }
            }
        }

        Ok(())
    }

    pub fn uninstall(&self, environment: &Environment) -> Result<(), CoreError> {
        let dir = environment.installation_dir();
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| {
                CoreError::Filesystem(format!("failed to remove {}: {e}", dir.display()))
            })?;
            info!("removed {}", dir.display());
        }
        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<(), CoreError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CoreError::Filesystem(format!("failed to create {}: {e}", dir.display())))
}

fn write_file(dest: &Path, content: &str) -> Result<(), CoreError> {
    let fail = |e: std::io::Error| {
        CoreError::Filesystem(format!("failed to write {}: {e}", dest.display()))
    };
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(content.as_bytes()).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(dest).map_err(|e| fail(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_runtime::MockRunner;
    use berth_schema::EnvironmentType;

    #[test]
    fn writes_configuration_files() {
        let project = tempfile::tempdir().unwrap();
        let env = Environment::new("blog", project.path(), EnvironmentType::Symfony, None);
        let runner = MockRunner::new();

        ConfigurationInstaller::new(&runner)
            .install(&env, "8.2")
            .unwrap();

        let dir = project.path().join("var/docker");
        assert!(dir.join("docker-compose.yml").exists());
        assert_eq!(
            std::fs::read_to_string(dir.join(".env")).unwrap(),
            "DOCKER_PHP_IMAGE=8.2\n"
        );
        assert!(dir.join("nginx/default.conf").exists());
        assert!(!dir.join("nginx/certs").exists());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn domains_trigger_certificate_generation() {
        let project = tempfile::tempdir().unwrap();
        let env = Environment::new(
            "shop",
            project.path(),
            EnvironmentType::Magento2,
            Some("shop.localhost".to_owned()),
        );
        let runner = MockRunner::new();

        ConfigurationInstaller::new(&runner)
            .install(&env, "latest")
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].argv[0], "mkcert");
        assert!(calls[0].argv[2].ends_with("var/docker/nginx/certs/custom.pem"));
        assert!(calls[0].argv[4].ends_with("var/docker/nginx/certs/custom.key"));
        assert_eq!(calls[0].argv[5], "shop.localhost");
    }

    #[test]
    fn failed_certificate_is_a_filesystem_error() {
        let project = tempfile::tempdir().unwrap();
        let env = Environment::new(
            "shop",
            project.path(),
            EnvironmentType::Magento2,
            Some("shop.localhost".to_owned()),
        );
        let runner = MockRunner::new();
        runner.fail_on(&["mkcert"]);

        let err = ConfigurationInstaller::new(&runner)
            .install(&env, "latest")
            .unwrap_err();
        assert!(matches!(err, CoreError::Filesystem(_)));
    }

    #[test]
    fn reinstall_overwrites_dotenv() {
        let project = tempfile::tempdir().unwrap();
        let env = Environment::new("blog", project.path(), EnvironmentType::Sylius, None);
        let runner = MockRunner::new();
        let installer = ConfigurationInstaller::new(&runner);

        installer.install(&env, "8.1").unwrap();
        installer.install(&env, "8.3").unwrap();

        let dotenv = std::fs::read_to_string(project.path().join("var/docker/.env")).unwrap();
        assert_eq!(dotenv, "DOCKER_PHP_IMAGE=8.3\n");
    }

    #[test]
    fn uninstall_removes_installation_directory() {
        let project = tempfile::tempdir().unwrap();
        let env = Environment::new("blog", project.path(), EnvironmentType::Symfony, None);
        let runner = MockRunner::new();
        let installer = ConfigurationInstaller::new(&runner);

        installer.install(&env, "latest").unwrap();
        installer.uninstall(&env).unwrap();
        assert!(!project.path().join("var/docker").exists());
        assert!(project.path().exists());

        // already gone
        installer.uninstall(&env).unwrap();
    }
}
