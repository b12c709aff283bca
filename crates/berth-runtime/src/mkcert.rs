use crate::process::{EnvVars, ProcessRunner, RunMode};
use crate::RuntimeError;
use std::path::Path;
use tracing::info;

/// Wrapper around `mkcert` for locally-trusted development certificates.
pub struct Mkcert<'r> {
    runner: &'r dyn ProcessRunner,
}

impl<'r> Mkcert<'r> {
    pub fn new(runner: &'r dyn ProcessRunner) -> Self {
        Self { runner }
    }

    pub fn generate_certificate(
        &self,
        certificate: &Path,
        private_key: &Path,
        domains: &[&str],
    ) -> Result<bool, RuntimeError> {
        if domains.is_empty() {
            return Err(RuntimeError::ExecFailed(
                "a certificate needs at least one domain".to_owned(),
            ));
        }

        let mut command = vec![
            "mkcert".to_owned(),
            "-cert-file".to_owned(),
            certificate.to_string_lossy().into_owned(),
            "-key-file".to_owned(),
            private_key.to_string_lossy().into_owned(),
        ];
        command.extend(domains.iter().map(|d| (*d).to_owned()));

        info!("generating certificate for {}", domains.join(", "));
        Ok(self
            .runner
            .run(&command, &EnvVars::new(), RunMode::Foreground)?
            .success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunner;

    #[test]
    fn passes_paths_and_domains() {
        let runner = MockRunner::new();
        let ok = Mkcert::new(&runner)
            .generate_certificate(
                Path::new("/srv/shop/var/docker/nginx/certs/custom.pem"),
                Path::new("/srv/shop/var/docker/nginx/certs/custom.key"),
                &["shop.localhost", "www.shop.localhost"],
            )
            .unwrap();
        assert!(ok);
        assert_eq!(
            runner.command_lines(),
            vec![
                "mkcert -cert-file /srv/shop/var/docker/nginx/certs/custom.pem \
                 -key-file /srv/shop/var/docker/nginx/certs/custom.key \
                 shop.localhost www.shop.localhost"
            ]
        );
    }

    #[test]
    fn refuses_empty_domain_list() {
        let runner = MockRunner::new();
        let result =
            Mkcert::new(&runner).generate_certificate(Path::new("c.pem"), Path::new("c.key"), &[]);
        assert!(result.is_err());
        assert!(runner.calls().is_empty());
    }
}
