pub struct Config {
    /// Pretty-prints the emitted plan instead of writing one compact line.
    pub pretty: bool,
    /// Raises the log level: 0 = info, 1 = debug, 2+ = trace.
    ///
    /// `RUST_LOG` still takes precedence when set.
    pub verbose: u8,
}

impl Config {
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
