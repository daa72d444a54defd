use crate::{Result, Transport};
use std::io::{Read, Write};

/// Standard input/output as the command stream, for running under a pipe or
/// a terminal multiplexer.
pub struct StdioTransport {
    stdin: std::io::Stdin,
    stdout: std::io::Stdout,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            stdin: std::io::stdin(),
            stdout: std::io::stdout(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for StdioTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.stdin.lock().read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(self.stdout.lock().write(buf)?)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.stdout.lock().flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_write_and_flush() {
        let mut t = StdioTransport::default();
        assert_eq!(t.write(b"").unwrap(), 0);
        t.flush().unwrap();
    }
}
