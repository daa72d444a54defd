use crate::{Result, Transport, TransportError};
use std::collections::VecDeque;

/// In-process loopback transport. Bytes queued with [`MockTransport::feed`]
/// are handed out by `read`; everything written is kept for inspection.
#[derive(Debug, Default)]
pub struct MockTransport {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    closed: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the next reads.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Reject any further writes and report end of stream once the queue drains.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    /// Take the written bytes, leaving the log empty.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.rx.is_empty() {
            if self.closed {
                return Ok(0);
            }
            // Nothing queued on an open stream behaves like a read timeout
            return Err(TransportError::Timeout);
        }
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_drains_queue_in_order() {
        let mut t = MockTransport::new();
        t.feed(b"READ 0 raw\r\n");
        let mut buf = [0u8; 4];
        assert_eq!(t.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"READ");
        let mut rest = [0u8; 32];
        let n = t.read(&mut rest).unwrap();
        assert_eq!(&rest[..n], b" 0 raw\r\n");
    }

    #[test]
    fn test_empty_queue_times_out_until_closed() {
        let mut t = MockTransport::new();
        let mut buf = [0u8; 8];
        assert!(matches!(t.read(&mut buf), Err(TransportError::Timeout)));
        t.close();
        assert_eq!(t.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_write_all_collects_output() {
        let mut t = MockTransport::new();
        t.write_all(b"256\n").unwrap();
        assert_eq!(t.written(), b"256\n");
        assert_eq!(t.take_written(), b"256\n".to_vec());
        assert!(t.written().is_empty());

        t.close();
        assert!(matches!(t.write(b"x"), Err(TransportError::Closed)));
    }
}
