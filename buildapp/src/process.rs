use std::{ffi::OsStr, fmt, io, num::NonZeroI32, process};

use log::debug;

pub struct Command(process::Command);

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Command {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self(process::Command::new(program))
    }

    pub fn args<'a, I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = &'a OsStr>,
    {
        self.0.args(args);
        self
    }

    /// Runs the command to completion while capturing stdout and stderr. A non-zero exit status is
    /// not considered an error, see [`Command::output`] for that.
    pub fn try_output(mut self) -> Result<Output, Error> {
        if log::log_enabled!(log::Level::Debug) {
            debug!("capturing `{command:?}`...", command = &self.0);
        }

        match self.0.output() {
            Ok(output) => Ok(Output {
                command: self,
                output,
            }),
            Err(error) => Err(Error {
                command: self,
                kind: error.into(),
            }),
        }
    }

    pub fn output(self) -> Result<Output, Error> {
        self.try_output().and_then(Output::require_success)
    }
}

#[derive(Debug)]
pub struct Output {
    pub command: Command,
    pub output: process::Output,
}

impl Output {
    pub fn require_success(self) -> Result<Output, Error> {
        let Output { command, output } = self;
        if output.status.success() {
            Ok(Output { command, output })
        } else {
            Err(Error {
                command,
                kind: ErrorKind::NonZeroExitStatus {
                    code: output.status.code().and_then(NonZeroI32::new),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
                },
            })
        }
    }
}

impl std::ops::Deref for Output {
    type Target = process::Output;

    fn deref(&self) -> &Self::Target {
        &self.output
    }
}

#[derive(Debug)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Io(io::Error),
    NonZeroExitStatus {
        code: Option<NonZeroI32>,
        stderr: String,
    },
}

impl From<io::Error> for ErrorKind {
    fn from(value: io::Error) -> Self {
        match value.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::Io(value),
        }
    }
}

#[derive(Debug)]
pub struct Error {
    pub command: Command,
    pub kind: ErrorKind,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to run `{command:?}`: ",
            command = &self.command.0
        )?;
        match &self.kind {
            ErrorKind::NotFound => {
                let program = self.command.0.get_program().to_string_lossy();
                write!(f, "the `{program}` command is required but not available on your system, please install it")
            }
            ErrorKind::PermissionDenied => {
                let program = self.command.0.get_program().to_string_lossy();
                write!(f, "the `{program}` command is available but does not have the right permissions, please make sure the binary is executable")
            }
            ErrorKind::Io(error) => write!(f, "{error}"),
            ErrorKind::NonZeroExitStatus { code, stderr } => {
                if let Some(code) = code {
                    write!(f, "exited with non-zero exit code `{code}`")?;
                } else {
                    write!(f, "did not run succesfully")?;
                }
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {}

/// Creates a new [`Command`] and supplies the provided arguments, if any, while calling
/// [`std::convert::AsRef::as_ref`] on each.
macro_rules! command {
    ($program:expr, $($arg:expr),* $(,)?) => {
        $crate::process::args!($crate::process::Command::new($program), $($arg,)*)
    };
}

/// Calls [`Command::args`] on the provided [`Command`] while calling [`std::convert::AsRef::as_ref`]
/// on each argument.
macro_rules! args {
    ($program:expr, $($arg:expr),+ $(,)?) => {
        $program.args([
            $(::std::convert::AsRef::<::std::ffi::OsStr>::as_ref(&$arg),)*
        ])
    }
}

pub(crate) use args;
pub(crate) use command;
