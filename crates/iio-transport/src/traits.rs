use crate::Result;

/// A minimal blocking byte-stream interface.
///
/// Both calls follow `read(2)`/`write(2)` semantics: they may move fewer bytes
/// than requested and return how many were actually transferred.
pub trait Transport {
    /// Read up to `buf.len()` bytes. `Ok(0)` means end of stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write up to `buf.len()` bytes.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Push buffered output to the peer.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Write the whole buffer, retrying on short writes.
    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.write(buf)? {
                0 => return Err(crate::TransportError::Closed),
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
