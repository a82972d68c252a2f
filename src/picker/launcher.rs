use crate::error::{ReconcileError, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Opens a visual comparison of two files
pub trait DiffLauncher {
	fn launch(&self, a: &Path, b: &Path) -> Result<()>;
}

/// Spawns an external program with the two paths appended to its arguments.
///
/// The program is not waited on; the picker keeps running while it is open.
#[derive(Debug, Clone)]
pub struct ExternalDiffTool {
	program: String,
	args: Vec<String>,
}

impl ExternalDiffTool {
	pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
		Self { program: program.into(), args }
	}

	pub fn program(&self) -> &str {
		&self.program
	}

	fn command(&self, a: &Path, b: &Path) -> Command {
		let mut command = Command::new(&self.program);
		command.args(&self.args).arg(a).arg(b);
		command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
		command
	}
}

impl DiffLauncher for ExternalDiffTool {
	fn launch(&self, a: &Path, b: &Path) -> Result<()> {
		debug!("Launching {} {} {}", self.program, a.display(), b.display());
		self.command(a, b).spawn().map_err(|e| {
			ReconcileError::configuration_error("diff_tool", &format!("{}: {}", self.program, e))
		})?;
		Ok(())
	}
}

/// Used when no diff tool is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiffTool;

impl DiffLauncher for NoDiffTool {
	fn launch(&self, a: &Path, b: &Path) -> Result<()> {
		info!("No diff tool configured, not comparing {} and {}", a.display(), b.display());
		Ok(())
	}
}
