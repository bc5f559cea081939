//! A stand-in for `1cestart.exe`.
//!
//! Installs an executable shell script named `1cestart.exe` in a temporary
//! directory. The script records its arguments, pulls the archive path out
//! of `/DumpIB<path>` and the log path out of `/Out<path>`, then acts out
//! the chosen [`Behaviour`].

use std::fmt::Write as _;
use std::io::Write as _;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;

use onec_backup::onec::locator::CONFIGURATOR_EXE;

#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Write an archive of `archive_bytes` bytes plus a log, exit 0.
    Succeed { archive_bytes: usize },
    /// Create an empty archive, exit 0.
    SucceedEmpty,
    /// Create no archive at all, exit 0.
    SucceedWithoutOutput,
    /// Write `log` (if any) to the `/Out` file and exit with `exit_code`.
    Fail { exit_code: i32, log: Option<String> },
    /// Write the script's pid to the pid file, then never exit on its own.
    Hang,
    /// Append `chunks` chunks with `chunk_delay` between them, wait
    /// `settle`, then exit 0.
    GrowThenSucceed {
        chunks: u32,
        chunk_delay: Duration,
        settle: Duration,
    },
}

pub struct FakeConfigurator {
    dir: TempDir,
    exe: PathBuf,
    args_file: PathBuf,
    pid_file: PathBuf,
}

impl FakeConfigurator {
    pub fn install(behaviour: Behaviour) -> Result<Self> {
        let dir = tempfile::tempdir().context("creating temp dir for fake configurator")?;
        let bin_dir = dir.path().join("bin");
        std::fs::create_dir_all(&bin_dir)?;

        let exe = bin_dir.join(CONFIGURATOR_EXE);
        let args_file = dir.path().join("args.txt");
        let fixture = dir.path().join("log_fixture.txt");
        let pid_file = dir.path().join("configurator.pid");

        if let Behaviour::Fail { log: Some(log), .. } = &behaviour {
            std::fs::write(&fixture, log).context("writing log fixture")?;
        }

        let script = render_script(&behaviour, &args_file, &fixture, &pid_file);
        write_via_shell(&exe, &script).context("writing fake configurator script")?;
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755))
            .context("making fake configurator executable")?;

        Ok(Self {
            dir,
            exe,
            args_file,
            pid_file,
        })
    }

    pub fn exe_path(&self) -> &Path {
        &self.exe
    }

    /// Scratch directory owned by this fake; removed on drop.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Arguments of the last invocation, one entry per argv element.
    pub fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(&self.args_file)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Pid recorded by a [`Behaviour::Hang`] run, once the script got that far.
    pub fn recorded_pid(&self) -> Option<u32> {
        std::fs::read_to_string(&self.pid_file)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

/// Whether `pid` still names a live (or unreaped) process, via `kill -0`.
pub fn process_exists(pid: u32) -> bool {
    Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// Write `contents` to `path` from a short-lived `sh` process.
///
/// This process must never hold a writable fd to a script that another test
/// thread may exec concurrently, or the exec fails with ETXTBSY.
fn write_via_shell(path: &Path, contents: &str) -> Result<()> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg("cat > \"$1\"")
        .arg("sh")
        .arg(path)
        .stdin(Stdio::piped())
        .spawn()?;
    child
        .stdin
        .take()
        .context("sh stdin not piped")?
        .write_all(contents.as_bytes())?;
    let status = child.wait()?;
    anyhow::ensure!(status.success(), "sh exited with {status}");
    Ok(())
}

fn render_script(
    behaviour: &Behaviour,
    args_file: &Path,
    fixture: &Path,
    pid_file: &Path,
) -> String {
    let mut script = String::new();
    script.push_str("#!/bin/sh\n");
    let _ = writeln!(script, "args_file='{}'", args_file.display());
    script.push_str(
        r#": > "$args_file"
out=""
log=""
for arg in "$@"; do
  printf '%s\n' "$arg" >> "$args_file"
  case "$arg" in
    /DumpIB*) out="${arg#/DumpIB}" ;;
    /Out*) log="${arg#/Out}" ;;
  esac
done
echo "designer started"
echo "designer diagnostics on stderr" >&2
"#,
    );

    match behaviour {
        Behaviour::Succeed { archive_bytes } => {
            script.push_str("echo 'Infobase dump started' > \"$log\"\n");
            let _ = writeln!(script, "head -c {archive_bytes} /dev/zero > \"$out\"");
            script.push_str("exit 0\n");
        }
        Behaviour::SucceedEmpty => {
            script.push_str("echo 'Infobase dump started' > \"$log\"\n");
            script.push_str(": > \"$out\"\nexit 0\n");
        }
        Behaviour::SucceedWithoutOutput => {
            script.push_str("echo 'Infobase dump started' > \"$log\"\nexit 0\n");
        }
        Behaviour::Fail { exit_code, log } => {
            if log.is_some() {
                let _ = writeln!(script, "cat '{}' > \"$log\"", fixture.display());
            }
            let _ = writeln!(script, "exit {exit_code}");
        }
        Behaviour::Hang => {
            let _ = writeln!(script, "echo $$ > '{}'", pid_file.display());
            script.push_str("exec sleep 600\n");
        }
        Behaviour::GrowThenSucceed {
            chunks,
            chunk_delay,
            settle,
        } => {
            let _ = writeln!(
                script,
                r#"i=0
while [ "$i" -lt {chunks} ]; do
  printf 'xxxxxxxx' >> "$out"
  sleep {delay:.3}
  i=$((i+1))
done
sleep {settle:.3}
exit 0"#,
                delay = chunk_delay.as_secs_f64(),
                settle = settle.as_secs_f64(),
            );
        }
    }

    script
}
