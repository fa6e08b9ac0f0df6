use crate::constants::{NODE_COMMAND, PYTHON_COMMAND, PYTHON_ENV_OVERRIDE};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// How to launch a tool server child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLaunch {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl ServerLaunch {
    pub fn new(command: impl Into<PathBuf>, args: Vec<String>) -> Self {
        let command = command.into();
        let name = display_name(&command);
        Self {
            name,
            command,
            args,
            env: HashMap::new(),
            workdir: None,
        }
    }

    /// Builds the launch for a positional target.
    ///
    /// `.py` scripts run under python, `.js`/`.mjs`/`.cjs` under node; any
    /// other target is executed directly. `extra_args` follow the script.
    pub fn from_target(target: &str, extra_args: Vec<String>) -> Self {
        let target = expand(target);
        let extra_args: Vec<String> = extra_args.iter().map(|arg| expand(arg)).collect();
        let name = display_name(Path::new(&target));

        let interpreter = match extension(&target).as_deref() {
            Some("py") => Some(
                env::var(PYTHON_ENV_OVERRIDE)
                    .ok()
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| PYTHON_COMMAND.to_string()),
            ),
            Some("js" | "mjs" | "cjs") => Some(NODE_COMMAND.to_string()),
            _ => None,
        };

        let (command, args) = match interpreter {
            Some(interpreter) => {
                let mut args = vec![target];
                args.extend(extra_args);
                (PathBuf::from(interpreter), args)
            }
            None => (PathBuf::from(target), extra_args),
        };

        Self {
            name,
            command,
            args,
            env: HashMap::new(),
            workdir: None,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

fn expand(value: &str) -> String {
    shellexpand::full(value)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

fn extension(target: &str) -> Option<String> {
    Path::new(target)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn display_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("tool-server")
        .to_string()
}
