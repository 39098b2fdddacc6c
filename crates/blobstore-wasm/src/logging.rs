//! Browser console logging
//!
//! Routes `tracing` events to `console.log` through tracing-subscriber, one
//! console call per formatted event.

use std::io;

use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::prelude::*;

/// Buffers one formatted event and logs it to the console on drop.
#[derive(Default)]
pub struct ConsoleWriter {
    buffer: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buffer);
        let line = line.trim_end();
        if !line.is_empty() {
            web_sys::console::log_1(&JsValue::from_str(line));
        }
    }
}

/// `MakeWriter` handing out a fresh [`ConsoleWriter`] per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::default()
    }
}

/// Route panics and `tracing` output to the browser console.
///
/// `filter` uses `EnvFilter` syntax and defaults to `"info"`. Safe to call
/// more than once; only the first call installs a subscriber.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(filter: Option<String>) {
    console_error_panic_hook::set_once();
    blobstore_core::logging::init_with_writer(
        filter.as_deref().unwrap_or("info"),
        ConsoleMakeWriter,
    );
}
