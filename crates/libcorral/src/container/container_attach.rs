use std::os::fd::RawFd;
use std::path::PathBuf;

use super::Container;
use crate::error::{LibcorralError, Result};
use crate::gate::Precondition;

/// How a process is attached to a running container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachOptions {
    /// Descriptors handed to the attached process; `None` inherits ours.
    pub stdin: Option<RawFd>,
    pub stdout: Option<RawFd>,
    pub stderr: Option<RawFd>,
    /// Extra `KEY=VALUE` pairs.
    pub env: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Start from an empty environment instead of ours.
    pub clear_env: bool,
}

impl AttachOptions {
    pub fn with_clear_env(mut self) -> Self {
        self.clear_env = true;
        self
    }

    pub fn with_stdio(mut self, stdin: RawFd, stdout: RawFd, stderr: RawFd) -> Self {
        self.stdin = Some(stdin);
        self.stdout = Some(stdout);
        self.stderr = Some(stderr);
        self
    }
}

/// Console session parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleOptions {
    /// -1 takes the first free tty, 0 the console itself.
    pub ttynum: i32,
    pub stdin: RawFd,
    pub stdout: RawFd,
    pub stderr: RawFd,
    /// Escape character as a control offset, 1 for `Ctrl+a`.
    pub escape: u8,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            ttynum: -1,
            stdin: 0,
            stdout: 1,
            stderr: 2,
            escape: 1,
        }
    }
}

impl ConsoleOptions {
    /// The escape key as the engine's tools spell it, `a` for `Ctrl+a`.
    pub fn escape_char(&self) -> char {
        char::from(b'a' + self.escape.saturating_sub(1).min(25))
    }
}

impl Container {
    /// Runs `args` in a temporary container built from this, not yet
    /// defined, container's configuration. Returns the combined output.
    pub fn execute(&self, args: &[String]) -> Result<Vec<u8>> {
        if args.is_empty() {
            return Err(LibcorralError::InsufficientArguments { name: self.name() });
        }
        self.make_sure(Precondition::NOT_DEFINED)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), ?args, "executing in temporary container");
        inner.engine().execute(args).ok_or_else(|| {
            tracing::error!(name = %inner.name(), ?args, "engine failed to execute command");
            LibcorralError::ExecuteFailed { name: inner.name() }
        })
    }

    /// Attaches an interactive shell and blocks until it exits.
    pub fn attach_shell(&self, options: &AttachOptions) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), ?options, "attaching shell");
        if inner.engine().attach_shell(options) < 0 {
            return Err(LibcorralError::AttachFailed { name: inner.name() });
        }
        Ok(())
    }

    /// Runs `args` inside the container and waits for it. `Ok(true)` when the
    /// command exited with status 0.
    pub fn run_command(&self, options: &AttachOptions, args: &[String]) -> Result<bool> {
        if args.is_empty() {
            return Err(LibcorralError::InsufficientArguments { name: self.name() });
        }
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), ?args, ?options, "running command");
        let status = inner.engine().attach_run_wait(options, args);
        if status < 0 {
            tracing::error!(name = %inner.name(), ?args, "engine failed to attach");
            return Err(LibcorralError::AttachFailed { name: inner.name() });
        }
        tracing::debug!(name = %inner.name(), status, "command exited");
        Ok(status == 0)
    }

    /// Allocates tty `ttynum` (-1 for any free one). The caller owns the
    /// returned descriptor and closes it to free the tty.
    pub fn console_fd(&self, ttynum: i32) -> Result<RawFd> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        let fd = inner.engine().console_getfd(ttynum);
        if fd < 0 {
            return Err(LibcorralError::AttachFailed { name: inner.name() });
        }
        Ok(fd)
    }

    /// Runs a console session until the user leaves it with the escape
    /// sequence.
    pub fn console(&self, options: &ConsoleOptions) -> Result<()> {
        self.make_sure(Precondition::DEFINED | Precondition::RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), ?options, "attaching console");
        if !inner.engine().console(options) {
            return Err(LibcorralError::AttachFailed { name: inner.name() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::engine::memory::{MemoryEngine, Primitive};

    fn running(engine: &MemoryEngine) -> Result<Container> {
        let container = Container::new(engine, "rubik", None)?;
        container.create("busybox", &[])?;
        container.start()?;
        Ok(container)
    }

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_run_command_exit_status() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = running(&engine)?;
        let options = AttachOptions::default().with_clear_env();

        assert!(container.run_command(&options, &args(&["true"]))?);
        assert!(!container.run_command(&options, &args(&["false"]))?);
        Ok(())
    }

    #[test]
    fn test_run_command_needs_arguments() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = running(&engine)?;

        assert!(matches!(
            container.run_command(&AttachOptions::default(), &[]),
            Err(LibcorralError::InsufficientArguments { .. })
        ));
        assert_eq!(engine.calls("rubik", Primitive::AttachRunWait), 0);
        Ok(())
    }

    #[test]
    fn test_attach_requires_running() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;
        container.create("busybox", &[])?;

        assert!(matches!(
            container.attach_shell(&AttachOptions::default()),
            Err(LibcorralError::NotRunning { .. })
        ));
        assert!(matches!(
            container.console_fd(-1),
            Err(LibcorralError::NotRunning { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_attach_failure() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = running(&engine)?;

        engine.fail_next("rubik", Primitive::AttachShell);
        assert!(matches!(
            container.attach_shell(&AttachOptions::default()),
            Err(LibcorralError::AttachFailed { .. })
        ));
        container.attach_shell(&AttachOptions::default())?;
        Ok(())
    }

    #[test]
    fn test_execute_requires_undefined() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;

        let output = container.execute(&args(&["echo", "hello"]))?;
        assert_eq!(output, b"hello\n");

        container.create("busybox", &[])?;
        assert!(matches!(
            container.execute(&args(&["echo", "hello"])),
            Err(LibcorralError::AlreadyDefined { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_console_escape_char() {
        assert_eq!(ConsoleOptions::default().escape_char(), 'a');
        let options = ConsoleOptions {
            escape: 17,
            ..Default::default()
        };
        assert_eq!(options.escape_char(), 'q');
    }
}
