//! Process-wide log sink.
//!
//! Every record is rendered into one complete line and written while a single
//! writer lock is held, so lines from concurrent threads never interleave.

use std::io::{self, Write};
use std::thread;

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

use crate::error::Result;

/// A serialized, line-oriented `log` backend
pub struct LogSink {
    /// The single writer, held for the duration of one line
    writer: Mutex<Box<dyn Write + Send>>,

    /// Records above this level are dropped
    level: LevelFilter,
}

impl LogSink {
    /// Create a sink writing to `writer`.
    pub fn new(writer: Box<dyn Write + Send>, level: LevelFilter) -> Self {
        Self {
            writer: Mutex::new(writer),
            level,
        }
    }

    /// Create a sink writing to standard output.
    pub fn stdout(level: LevelFilter) -> Self {
        Self::new(Box::new(io::stdout()), level)
    }

    /// Render a record as one line, newline included.
    fn format(record: &Record<'_>) -> String {
        let now = chrono::Local::now();
        let current = thread::current();
        format!(
            "{} [{:<5}] {} - {}\n",
            now.format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            current.name().unwrap_or("unnamed"),
            record.args()
        )
    }
}

impl Log for LogSink {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = Self::format(record);
        let mut writer = self.writer.lock();
        // A failing sink has nowhere to report to.
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    fn flush(&self) {
        let _ = self.writer.lock().flush();
    }
}

/// Install `sink` as the global logger.
///
/// Fails if a logger has already been installed in this process.
pub fn init(sink: LogSink) -> Result<()> {
    let level = sink.level;
    log::set_boxed_logger(Box::new(sink))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use std::sync::Arc;

    /// In-memory writer shared with the test
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            // Accept one byte at a time so a sink that split lines would be caught
            if let Some(byte) = buf.first() {
                self.0.lock().push(*byte);
                thread::yield_now();
                Ok(1)
            } else {
                Ok(0)
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    fn emit(sink: &LogSink, level: Level, message: &str) {
        sink.log(
            &Record::builder()
                .args(format_args!("{}", message))
                .level(level)
                .target("hive_concurrency::test")
                .build(),
        );
    }

    #[test]
    fn test_line_format() {
        let buffer = SharedBuffer::default();
        let sink = LogSink::new(Box::new(buffer.clone()), LevelFilter::Info);

        emit(&sink, Level::Info, "worker 3 returned");

        let output = buffer.contents();
        assert!(output.ends_with("worker 3 returned\n"));
        assert!(output.contains("[INFO ]"));
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_level_filtering() {
        let buffer = SharedBuffer::default();
        let sink = LogSink::new(Box::new(buffer.clone()), LevelFilter::Info);

        emit(&sink, Level::Debug, "hidden");
        emit(&sink, Level::Warn, "shown");

        let output = buffer.contents();
        assert!(!output.contains("hidden"));
        assert!(output.contains("shown"));
    }

    #[test]
    fn test_concurrent_lines_do_not_interleave() {
        let buffer = SharedBuffer::default();
        let sink = Arc::new(LogSink::new(Box::new(buffer.clone()), LevelFilter::Trace));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..50 {
                        let message = format!("thread={} line={} end", t, i);
                        emit(&sink, Level::Info, &message);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let output = buffer.contents();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 8 * 50);
        for line in lines {
            assert!(line.ends_with(" end"), "torn line: {}", line);
            assert_eq!(line.matches("thread=").count(), 1, "torn line: {}", line);
        }
    }
}
