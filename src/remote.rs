//! Remote commands run on a freshly created node.
//!
//! Commands are kept as program + argument lists and only turned into a
//! shell string when they are handed to a [`NodeHandle`].

use shell_escape::escape;
use std::{borrow::Cow, fmt::Display, future::Future, pin::Pin};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    program: String,
    args: Vec<String>,
}

impl RemoteCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Runs `program` through `sudo`.
    pub fn sudo(program: impl Into<String>) -> Self {
        Self::new("sudo").arg(program)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn to_shell_string(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| escape(Cow::Borrowed(word.as_str())).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Display for RemoteCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_shell_string())
    }
}

/// Commands chained with `&&`; the first failure stops the chain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteScript {
    commands: Vec<RemoteCommand>,
}

impl RemoteScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, command: RemoteCommand) -> Self {
        self.commands.push(command);
        self
    }

    pub fn commands(&self) -> &[RemoteCommand] {
        &self.commands
    }

    pub fn to_shell_string(&self) -> String {
        self.commands
            .iter()
            .map(RemoteCommand::to_shell_string)
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

impl From<RemoteCommand> for RemoteScript {
    fn from(command: RemoteCommand) -> Self {
        Self::new().then(command)
    }
}

/// A remote-execution capability for one node, owned by the scheduler.
pub trait NodeHandle: Send + Sync {
    /// Runs a shell command line on the node and returns its captured output.
    fn execute<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + 'a + Send>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words_are_not_quoted() {
        let command = RemoteCommand::sudo("chmod").args(["600", "/swapfile"]);
        assert_eq!(command.to_shell_string(), "sudo chmod 600 /swapfile");
        assert_eq!(command.program(), "sudo");
        assert_eq!(command.get_args(), ["chmod", "600", "/swapfile"]);
    }

    #[test]
    fn test_special_characters_are_quoted() {
        let command = RemoteCommand::new("awk").args([
            "/MemTotal/ { printf \"%d\\n\", $2 }",
            "/proc/meminfo",
        ]);
        assert_eq!(
            command.to_shell_string(),
            "awk '/MemTotal/ { printf \"%d\\n\", $2 }' /proc/meminfo"
        );
    }

    #[test]
    fn test_injection_stays_inside_one_word() {
        let command = RemoteCommand::new("echo").arg("secret; rm -rf ./sentinel");
        assert_eq!(command.to_shell_string(), "echo 'secret; rm -rf ./sentinel'");
    }

    #[test]
    fn test_script_chains_with_and() {
        let script = RemoteScript::new()
            .then(RemoteCommand::sudo("mkswap").arg("/swapfile"))
            .then(RemoteCommand::new("free").arg("-h"));
        assert_eq!(script.to_shell_string(), "sudo mkswap /swapfile && free -h");
        assert_eq!(script.commands().len(), 2);
    }
}
