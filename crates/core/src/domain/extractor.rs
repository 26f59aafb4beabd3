use std::{fmt, path::PathBuf};

use serde::Deserialize;

/// A program invocation without any secret material attached.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<P: Into<String>>(program: P, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// An external balance extraction program and the worksheet it writes into.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExtractorSpec {
    pub name: String,
    #[serde(flatten)]
    pub command: CommandSpec,
    pub sheet_name: String,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl ExtractorSpec {
    pub fn new<N: Into<String>, S: Into<String>>(name: N, command: CommandSpec, sheet_name: S) -> Self {
        Self {
            name: name.into(),
            command,
            sheet_name: sheet_name.into(),
            working_dir: None,
        }
    }

    pub fn binance() -> Self {
        Self::new(
            "binance",
            CommandSpec::new("python", &["binance_script.py"]),
            "Sheet1",
        )
    }

    pub fn bybit() -> Self {
        Self::new(
            "bybit",
            CommandSpec::new("python", &["bybit_script.py"]),
            "Sheet2",
        )
    }
}
