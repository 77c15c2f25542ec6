use std::env;
use std::io;
use std::path::Path;

use tokio::process::Command;

#[inline]
fn create_command_with_inferred_shell() -> Command {
    let Some(shell) = env::var_os("SHELL") else {
        return Command::new("/bin/sh");
    };
    Command::new(shell)
}

/// Runs `cmdline` with the user's shell inside `dir`, and collects what it
/// wrote to stdout and stderr.
///
/// A non-zero exit status is reported in the output rather than as an
/// error, since the model should see it.
pub async fn run_command_line(
    cmdline: &str,
    dir: &Path,
) -> Result<String, io::Error> {
    trace!("running {cmdline:?} in {}", dir.display());
    let output = create_command_with_inferred_shell()
        .arg("-c")
        .arg(cmdline)
        .current_dir(dir)
        .kill_on_drop(true)
        .output()
        .await?;

    let mut result = String::new();
    if !output.stdout.is_empty() {
        result.push_str("==> STDOUT <==\n");
        result.push_str(&String::from_utf8_lossy(&output.stdout));
    }
    if !output.stderr.is_empty() {
        result.push_str("\n==> STDERR <==\n");
        result.push_str(&String::from_utf8_lossy(&output.stderr));
    }
    if !output.status.success() {
        result.push_str("\n==> STATUS <==\n");
        result.push_str(&output.status.to_string());
    }
    Ok(result)
}
