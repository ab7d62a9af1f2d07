//! Pretty-printed payload per update, stdout by default.

use std::io::{self, Write};

use vehicle_domain::{VehicleObserver, VehicleSnapshot, VehicleUpdate};

/// Writes each update as indented JSON followed by a newline.
#[derive(Debug)]
pub struct ConsoleSink<W = io::Stdout> {
    writer: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> VehicleObserver for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn notify(&mut self, snapshot: &VehicleSnapshot) -> vehicle_domain::Result<()> {
        let json = VehicleUpdate::now(snapshot).to_json_pretty()?;
        writeln!(self.writer, "{json}")?;
        Ok(())
    }
}
