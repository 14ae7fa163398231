//! # Simple logging providers
//!
//! The driver only uses the [log] facade. This module provides a logger which forwards the
//! records to any blocking [embedded_io::Write] byte sink, usually the UART.
use core::sync::atomic::AtomicBool;

static LOGGER_INIT_DONE: AtomicBool = AtomicBool::new(false);

/// Blocking byte sink loggers.
pub mod sink_blocking {
    use super::*;
    use core::{cell::RefCell, convert::Infallible};
    use embedded_io::Write as _;

    use critical_section::Mutex;
    use log::{LevelFilter, SetLoggerError, set_logger, set_max_level};

    /// Byte sink used by the logger.
    pub type Sink = &'static mut (dyn embedded_io::Write<Error = Infallible> + Send);

    pub struct SinkLoggerBlocking(Mutex<RefCell<Option<Sink>>>);

    static SINK_LOGGER_BLOCKING: SinkLoggerBlocking =
        SinkLoggerBlocking(Mutex::new(RefCell::new(None)));

    /// Initialize the logger with a blocking byte sink.
    ///
    /// The logger performs the write inside a critical section, so interrupts are disabled
    /// while a record is written. Only the first call installs the logger, subsequent calls
    /// return without doing anything.
    pub fn init_with_locks(sink: Sink, level: LevelFilter) -> Result<(), SetLoggerError> {
        if LOGGER_INIT_DONE.swap(true, core::sync::atomic::Ordering::Relaxed) {
            return Ok(());
        }
        critical_section::with(|cs| {
            SINK_LOGGER_BLOCKING.0.borrow(cs).replace(Some(sink));
        });
        set_logger(&SINK_LOGGER_BLOCKING)?;
        set_max_level(level);
        Ok(())
    }

    impl log::Log for SinkLoggerBlocking {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            critical_section::with(|cs| {
                let mut opt_sink = self.0.borrow(cs).borrow_mut();
                if let Some(sink) = opt_sink.as_mut() {
                    // Formatting errors are dropped, there is nowhere to report them.
                    writeln!(sink, "{} - {}\r", record.level(), record.args()).ok();
                }
            })
        }

        fn flush(&self) {
            critical_section::with(|cs| {
                let mut opt_sink = self.0.borrow(cs).borrow_mut();
                if let Some(sink) = opt_sink.as_mut() {
                    sink.flush().ok();
                }
            });
        }
    }
}
