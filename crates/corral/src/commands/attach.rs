//! Contains functionality of attach and exec commands
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use libcorral::container::AttachOptions;
use libcorral::engine::Engine;

use super::{container_handle, load_container};

/// Run a command, or a shell without one, inside a running container
#[derive(Parser, Debug)]
pub struct Attach {
    pub name: String,
    /// Start from an empty environment
    #[clap(long)]
    pub clear_env: bool,
    /// Extra environment variables, KEY=VALUE
    #[clap(short = 'v', long = "set-var")]
    pub env: Vec<String>,
    /// Working directory of the command
    #[clap(long)]
    pub cwd: Option<PathBuf>,
    #[clap(last = true)]
    pub command: Vec<String>,
}

/// Run a command in a throwaway container built from a configuration
#[derive(Parser, Debug)]
pub struct Exec {
    pub name: String,
    /// Configuration file of the temporary container
    #[clap(short = 'f', long)]
    pub rcfile: Option<PathBuf>,
    #[clap(last = true, required = true)]
    pub command: Vec<String>,
}

impl Attach {
    fn options(&self) -> AttachOptions {
        AttachOptions {
            env: self.env.clone(),
            cwd: self.cwd.clone(),
            clear_env: self.clear_env,
            ..Default::default()
        }
    }
}

pub fn attach(args: Attach, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let container = load_container(engine, lxcpath, &args.name)?;
    let options = args.options();

    if args.command.is_empty() {
        return container
            .attach_shell(&options)
            .with_context(|| format!("failed to attach to {}", args.name));
    }

    let succeeded = container.run_command(&options, &args.command)?;
    tracing::debug!(name = %args.name, succeeded, "command finished");
    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

pub fn exec(args: Exec, engine: &dyn Engine, lxcpath: &Path) -> Result<()> {
    let container = container_handle(engine, lxcpath, &args.name)?;
    if let Some(rcfile) = &args.rcfile {
        container.load_config_file(rcfile)?;
    }

    let output = container
        .execute(&args.command)
        .with_context(|| format!("failed to execute in {}", args.name))?;
    std::io::stdout().write_all(&output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_options() {
        let args = Attach::parse_from([
            "attach",
            "rubik",
            "--clear-env",
            "-v",
            "TERM=xterm",
            "--",
            "uname",
            "-a",
        ]);
        let options = args.options();
        assert!(options.clear_env);
        assert_eq!(options.env, vec!["TERM=xterm"]);
        assert_eq!(args.command, vec!["uname", "-a"]);
    }
}
