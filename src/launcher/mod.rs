//! Run-time launcher: find the bundled binary next to the launcher and hand
//! the process over to it.

use anyhow::{Context, Result};
use log::debug;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::platform::BINARY_STEM;

/// `argv[0]` seen by the wrapped binary.
pub const ARGV0: &str = "par2";

const NOTICE_COLOR: &str = "\x1b[95m";
const RESET_COLOR: &str = "\x1b[0m";

/// `<install_root>/binaries/par2[.exe]`, with the extension of the platform
/// the launcher was compiled for.
pub fn binary_path(install_root: &Path) -> PathBuf {
    install_root.join("binaries").join(format!(
        "{}{}",
        BINARY_STEM,
        std::env::consts::EXE_SUFFIX
    ))
}

/// Directory containing the running launcher executable.
pub fn install_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the launcher executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("Launcher path {:?} has no parent directory", exe))
}

pub fn notice(program: &Path) -> String {
    format!(
        "{}Running par2 via par2cmdline-turbo at {}{}",
        NOTICE_COLOR,
        program.display(),
        RESET_COLOR
    )
}

/// Hands control of the current invocation to another program.
///
/// Returns the exit code to terminate with. Implementations that replace the
/// process image only return on failure.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessTransfer {
    fn transfer(&self, program: &Path, argv0: &str, args: &[OsString]) -> Result<i32>;
}

/// Replaces the current process image (`execv`).
#[cfg(unix)]
pub struct ExecTransfer;

#[cfg(unix)]
impl ProcessTransfer for ExecTransfer {
    fn transfer(&self, program: &Path, argv0: &str, args: &[OsString]) -> Result<i32> {
        use std::ffi::CString;
        use std::iter;
        use std::os::unix::ffi::OsStrExt;

        let path = CString::new(program.as_os_str().as_bytes())?;
        let argv = iter::once(CString::new(argv0))
            .chain(args.iter().map(|arg| CString::new(arg.as_bytes())))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("execv {:?} with {} argument(s)", path, args.len());
        match nix::unistd::execv(&path, &argv) {
            Ok(never) => match never {},
            Err(errno) => Err(std::io::Error::from(errno).into()),
        }
    }
}

/// Runs the program as a child, waits, and reports its exit code.
pub struct SpawnTransfer;

impl ProcessTransfer for SpawnTransfer {
    fn transfer(&self, program: &Path, argv0: &str, args: &[OsString]) -> Result<i32> {
        let mut command = Command::new(program);
        command.args(args);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.arg0(argv0);
        }
        #[cfg(not(unix))]
        let _ = argv0;

        debug!("Spawning {:?}", program);
        let status = command.status()?;

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Ok(128 + signal);
            }
        }
        Ok(status.code().unwrap_or(1))
    }
}

/// In-place replacement where the host supports it, a child process otherwise.
pub fn default_transfer() -> Box<dyn ProcessTransfer> {
    #[cfg(unix)]
    {
        Box::new(ExecTransfer)
    }
    #[cfg(not(unix))]
    {
        Box::new(SpawnTransfer)
    }
}

/// Print the notice line to `out` and transfer control to `program` with
/// `args` unchanged.
pub fn launch<T, W>(transfer: &T, program: &Path, args: &[OsString], out: &mut W) -> Result<i32>
where
    T: ProcessTransfer + ?Sized,
    W: Write,
{
    writeln!(out, "{}", notice(program))?;
    // Exec discards buffered output
    out.flush()?;
    transfer.transfer(program, ARGV0, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_path_is_fixed_relative_location() {
        let path = binary_path(Path::new("/opt/venv/lib/par2cmdline"));
        #[cfg(not(windows))]
        assert_eq!(path, PathBuf::from("/opt/venv/lib/par2cmdline/binaries/par2"));
        #[cfg(windows)]
        assert_eq!(path, PathBuf::from("/opt/venv/lib/par2cmdline/binaries/par2.exe"));
    }

    #[test]
    fn test_notice_is_magenta_line() {
        assert_eq!(
            notice(Path::new("/x/binaries/par2")),
            "\x1b[95mRunning par2 via par2cmdline-turbo at /x/binaries/par2\x1b[0m"
        );
    }

    #[test]
    fn test_launch_forwards_args_and_exit_code() {
        let program = PathBuf::from("/x/binaries/par2");
        let mut transfer = MockProcessTransfer::new();
        transfer
            .expect_transfer()
            .withf(|program, argv0, args| {
                program == Path::new("/x/binaries/par2")
                    && argv0 == "par2"
                    && args == [OsString::from("--help")]
            })
            .times(1)
            .returning(|_, _, _| Ok(7));

        let mut out = Vec::new();
        let code = launch(&transfer, &program, &[OsString::from("--help")], &mut out).unwrap();

        assert_eq!(code, 7);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", notice(&program))
        );
    }

    #[test]
    fn test_launch_passes_empty_args_untouched() {
        let mut transfer = MockProcessTransfer::new();
        transfer
            .expect_transfer()
            .withf(|program, argv0, args| {
                program == Path::new("/x/par2") && argv0 == "par2" && args.is_empty()
            })
            .returning(|_, _, _| Ok(0));

        let code = launch(&transfer, Path::new("/x/par2"), &[], &mut std::io::sink()).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_launch_surfaces_transfer_error() {
        let mut transfer = MockProcessTransfer::new();
        transfer.expect_transfer().returning(|_, _, _| {
            Err(std::io::Error::from(std::io::ErrorKind::NotFound).into())
        });

        let err = launch(&transfer, Path::new("/missing/par2"), &[], &mut Vec::new()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<std::io::Error>().map(|e| e.kind()),
            Some(std::io::ErrorKind::NotFound)
        );
    }

    #[cfg(unix)]
    fn stub(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("par2");
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_transfer_propagates_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("args.log");
        let program = stub(
            dir.path(),
            &format!("printf '%s\\n' \"$@\" > '{}'\nexit 7\n", log.display()),
        );

        let code = SpawnTransfer
            .transfer(&program, ARGV0, &[OsString::from("--help"), OsString::from("a b")])
            .unwrap();

        assert_eq!(code, 7);
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "--help\na b\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_transfer_sets_argv0() {
        let shell = std::fs::canonicalize("/bin/sh").unwrap();
        // busybox dispatches on argv[0]
        if shell.file_name().is_some_and(|name| name == "busybox") {
            return;
        }

        let code = SpawnTransfer
            .transfer(
                &shell,
                ARGV0,
                &[OsString::from("-c"), OsString::from("[ \"$0\" = par2 ] && exit 3; exit 4")],
            )
            .unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn test_spawn_transfer_missing_program_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SpawnTransfer
            .transfer(&dir.path().join("no-par2"), ARGV0, &[])
            .unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_transfer_missing_program_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExecTransfer
            .transfer(&dir.path().join("no-par2"), ARGV0, &[OsString::from("-h")])
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<std::io::Error>().map(|e| e.kind()),
            Some(std::io::ErrorKind::NotFound)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_transfer_rejects_interior_nul() {
        let result = ExecTransfer.transfer(
            Path::new("/bin/true"),
            ARGV0,
            &[OsString::from("bad\0arg")],
        );
        assert!(result.is_err());
    }
}
