use std::process::{Command, Output};

use anyhow::Context;

/// Access to the PBS Pro command line tools.
///
/// Every method returns the raw stdout of the corresponding command, parsing is
/// done by the caller so that each piece of output can degrade independently.
pub trait PbsClient {
    /// `qstat -Qf -F json <queue>`
    fn queue_info(&self, queue: &str) -> anyhow::Result<String>;
    /// `qstat -u <user>`
    fn user_jobs(&self, user: &str) -> anyhow::Result<String>;
    /// `pbsnodes <node>`
    fn node_info(&self, node: &str) -> anyhow::Result<String>;
    /// `pbsnodes -a -F json`
    fn node_list_json(&self) -> anyhow::Result<String>;
    /// `pbsnodes -a`
    fn node_list(&self) -> anyhow::Result<String>;
}

/// Runs the real PBS commands found in `PATH`.
#[derive(Default)]
pub struct SystemPbsClient;

impl SystemPbsClient {
    fn run(&self, arguments: &[&str]) -> anyhow::Result<String> {
        log::debug!("Running PBS command `{}`", arguments.join(" "));

        let output = Command::new(arguments[0])
            .args(&arguments[1..])
            .output()
            .with_context(|| format!("{} start failed", arguments[0]))?;
        let output = check_command_output(output)
            .with_context(|| format!("{} execution failed", arguments[0]))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        log::trace!("{} output:\n{}", arguments[0], stdout.trim_end());
        Ok(stdout)
    }
}

impl PbsClient for SystemPbsClient {
    fn queue_info(&self, queue: &str) -> anyhow::Result<String> {
        self.run(&["qstat", "-Qf", "-F", "json", queue])
    }

    fn user_jobs(&self, user: &str) -> anyhow::Result<String> {
        self.run(&["qstat", "-u", user])
    }

    fn node_info(&self, node: &str) -> anyhow::Result<String> {
        self.run(&["pbsnodes", node])
    }

    fn node_list_json(&self) -> anyhow::Result<String> {
        self.run(&["pbsnodes", "-a", "-F", "json"])
    }

    fn node_list(&self) -> anyhow::Result<String> {
        self.run(&["pbsnodes", "-a"])
    }
}

pub fn check_command_output(output: Output) -> anyhow::Result<Output> {
    let status = output.status;
    if !status.success() {
        return Err(anyhow::anyhow!(
            "Exit code: {}\nStderr: {}\nStdout: {}",
            status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim(),
            String::from_utf8_lossy(&output.stdout).trim()
        ));
    }
    Ok(output)
}
