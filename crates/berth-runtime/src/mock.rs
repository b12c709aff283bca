use crate::process::{EnvVars, ProcessOutput, ProcessRunner, RunMode};
use crate::RuntimeError;
use std::sync::Mutex;

/// What the [`MockRunner`] answers for a matching command.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Output(ProcessOutput),
    /// Behave as if the binary could not be launched.
    SpawnError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub argv: Vec<String>,
    pub env: EnvVars,
    pub mode: RunMode,
}

impl RecordedCall {
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

/// In-memory [`ProcessRunner`] that records every invocation and answers
/// from scripted responses. Unscripted commands succeed with empty output.
#[derive(Default)]
pub struct MockRunner {
    responses: Mutex<Vec<(Vec<String>, MockResponse)>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response for commands starting with `prefix`. Later
    /// registrations take precedence over earlier ones.
    pub fn respond(&self, prefix: &[&str], response: MockResponse) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push((prefix.iter().map(|s| (*s).to_owned()).collect(), response));
        }
    }

    pub fn fail_on(&self, prefix: &[&str]) {
        self.respond(prefix, MockResponse::Output(ProcessOutput::failed()));
    }

    pub fn output_on(&self, prefix: &[&str], stdout: &str) {
        self.respond(prefix, MockResponse::Output(ProcessOutput::ok(stdout)));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Recorded invocations as space-joined command lines.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(RecordedCall::command_line)
            .collect()
    }

    pub fn was_called(&self, prefix: &[&str]) -> bool {
        self.calls()
            .iter()
            .any(|c| c.argv.len() >= prefix.len() && c.argv.iter().zip(prefix).all(|(a, p)| a == p))
    }

    fn response_for(&self, argv: &[String]) -> MockResponse {
        let responses = match self.responses.lock() {
            Ok(r) => r,
            Err(_) => return MockResponse::Output(ProcessOutput::ok("")),
        };
        responses
            .iter()
            .rev()
            .find(|(prefix, _)| argv.len() >= prefix.len() && argv[..prefix.len()] == prefix[..])
            .map_or_else(
                || MockResponse::Output(ProcessOutput::ok("")),
                |(_, response)| response.clone(),
            )
    }
}

impl ProcessRunner for MockRunner {
    fn run(
        &self,
        argv: &[String],
        env: &EnvVars,
        mode: RunMode,
    ) -> Result<ProcessOutput, RuntimeError> {
        self.calls
            .lock()
            .map_err(|e| RuntimeError::ExecFailed(format!("mutex poisoned: {e}")))?
            .push(RecordedCall {
                argv: argv.to_vec(),
                env: env.clone(),
                mode,
            });

        match self.response_for(argv) {
            MockResponse::Output(output) => Ok(output),
            MockResponse::SpawnError => Err(RuntimeError::Spawn {
                program: argv.first().cloned().unwrap_or_default(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}
