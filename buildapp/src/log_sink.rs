use std::{
    fmt,
    fs::File,
    io::{self, Write},
    path::Path,
};

use env_logger::{Logger, Target, WriteStyle};
use log::{Level, LevelFilter, Log, Record};

use crate::time_ext;

/// Target written on every line of the log file.
pub const TARGET: &str = "buildapp";

/// Writes log lines to a single file. Unlike the console logger this one is not installed
/// globally, it is owned by whoever writes the build log.
pub struct LogSink {
    logger: Logger,
}

impl LogSink {
    /// Creates the file at `path`, truncating it if it exists.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::from_writer(File::create(path)?))
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        let logger = env_logger::Builder::new()
            .target(Target::Pipe(Box::new(writer)))
            .write_style(WriteStyle::Never)
            .filter_level(LevelFilter::Info)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{timestamp} {level} {target}: {args}",
                    timestamp = time_ext::now_local_string(),
                    level = record.level(),
                    target = record.target(),
                    args = record.args()
                )
            })
            .build();
        Self { logger }
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.logger.log(
            &Record::builder()
                .args(args)
                .level(level)
                .target(TARGET)
                .build(),
        );
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        self.logger.flush();
    }
}


#[cfg(test)]
mod tests {
    use super::{testing::SharedBuffer, *};

    #[test]
    fn lines_carry_level_target_and_message() {
        let buffer = SharedBuffer::default();
        let sink = LogSink::from_writer(buffer.clone());
        sink.info(format_args!("stream: {}", "Step 1/2 : FROM alpine"));
        sink.log(Level::Error, format_args!("build error: {}", "failed to solve"));

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" INFO buildapp: stream: Step 1/2 : FROM alpine"));
        assert!(lines[1].ends_with(" ERROR buildapp: build error: failed to solve"));
    }

    #[test]
    fn debug_lines_are_dropped() {
        let buffer = SharedBuffer::default();
        let sink = LogSink::from_writer(buffer.clone());
        sink.log(Level::Debug, format_args!("not written"));
        sink.log(Level::Warn, format_args!("written"));

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" WARN buildapp: written"));
    }

    #[test]
    fn create_truncates_the_file() {
        let path = crate::temp_path::tmp_path(".log");
        std::fs::write(&path, "previous run\n").unwrap();

        drop(LogSink::create(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        let sink = LogSink::create(&path).unwrap();
        sink.info(format_args!("created image. ID: sha256:abc"));
        drop(sink);
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(contents.ends_with(" INFO buildapp: created image. ID: sha256:abc\n"));
        assert!(!contents.contains("previous run"));
    }
}
