use crate::{fill, AttrKind, DeviceOps, Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;

type ChannelKey = (String, bool, String);

/// A device backed by plain memory: attribute values are byte strings and the
/// data path is a fixed-size byte block. Used for layouts loaded from YAML
/// and as a stand-in for hardware in tests.
#[derive(Debug, Default)]
pub struct MemoryDevice {
    attrs: Mutex<HashMap<(AttrKind, String), Vec<u8>>>,
    channel_attrs: Mutex<HashMap<ChannelKey, Vec<u8>>>,
    data: Mutex<Vec<u8>>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.with_attr_kind(AttrKind::Device, name, value)
    }

    pub fn with_attr_kind(self, kind: AttrKind, name: &str, value: &str) -> Self {
        self.attrs
            .lock()
            .insert((kind, name.to_string()), value.as_bytes().to_vec());
        self
    }

    pub fn with_channel_attr(self, channel: &str, is_output: bool, attr: &str, value: &str) -> Self {
        self.channel_attrs.lock().insert(
            (channel.to_string(), is_output, attr.to_string()),
            value.as_bytes().to_vec(),
        );
        self
    }

    /// Give the device a zero-filled data block of `len` bytes.
    pub fn with_data_len(self, len: usize) -> Self {
        *self.data.lock() = vec![0; len];
        self
    }

    pub fn with_data(self, bytes: &[u8]) -> Self {
        *self.data.lock() = bytes.to_vec();
        self
    }

    /// Current value of a device-level attribute.
    pub fn attr(&self, kind: AttrKind, name: &str) -> Option<Vec<u8>> {
        self.attrs.lock().get(&(kind, name.to_string())).cloned()
    }

    /// Current value of a channel attribute.
    pub fn channel_attr(&self, channel: &str, is_output: bool, attr: &str) -> Option<Vec<u8>> {
        self.channel_attrs
            .lock()
            .get(&(channel.to_string(), is_output, attr.to_string()))
            .cloned()
    }

    /// Snapshot of the data block.
    pub fn data(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    fn data_range(len: usize, offset: usize, want: usize) -> Result<std::ops::Range<usize>> {
        if offset > len {
            return Err(Error::InvalidArgument(format!(
                "offset {offset} past end of {len}-byte data block"
            )));
        }
        Ok(offset..offset + want.min(len - offset))
    }
}

impl DeviceOps for MemoryDevice {
    fn read_attr(&self, attr: &str, buf: &mut [u8], kind: AttrKind) -> Result<usize> {
        let attrs = self.attrs.lock();
        let value = attrs
            .get(&(kind, attr.to_string()))
            .ok_or_else(|| Error::NotFound(format!("attribute {attr}")))?;
        Ok(fill(buf, value))
    }

    fn write_attr(&self, attr: &str, buf: &[u8], kind: AttrKind) -> Result<usize> {
        self.attrs
            .lock()
            .insert((kind, attr.to_string()), buf.to_vec());
        Ok(buf.len())
    }

    fn ch_read_attr(
        &self,
        channel: &str,
        is_output: bool,
        attr: &str,
        buf: &mut [u8],
    ) -> Result<usize> {
        let attrs = self.channel_attrs.lock();
        let value = attrs
            .get(&(channel.to_string(), is_output, attr.to_string()))
            .ok_or_else(|| Error::NotFound(format!("channel attribute {channel}/{attr}")))?;
        Ok(fill(buf, value))
    }

    fn ch_write_attr(
        &self,
        channel: &str,
        is_output: bool,
        attr: &str,
        buf: &[u8],
    ) -> Result<usize> {
        self.channel_attrs.lock().insert(
            (channel.to_string(), is_output, attr.to_string()),
            buf.to_vec(),
        );
        Ok(buf.len())
    }

    fn read_data(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let data = self.data.lock();
        let range = Self::data_range(data.len(), offset, buf.len())?;
        Ok(fill(buf, &data[range]))
    }

    fn write_data(&self, buf: &[u8], offset: usize) -> Result<usize> {
        let mut data = self.data.lock();
        let range = Self::data_range(data.len(), offset, buf.len())?;
        let n = range.len();
        data[range].copy_from_slice(&buf[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_round_trip_by_kind() {
        let dev = MemoryDevice::new()
            .with_attr("sample_rate", "1000")
            .with_attr_kind(AttrKind::Debug, "direct_reg_access", "0");
        let mut buf = [0u8; 16];
        let n = dev.read_attr("sample_rate", &mut buf, AttrKind::Device).unwrap();
        assert_eq!(&buf[..n], b"1000");
        assert!(matches!(
            dev.read_attr("sample_rate", &mut buf, AttrKind::Buffer),
            Err(Error::NotFound(_))
        ));

        assert_eq!(
            dev.write_attr("sample_rate", b"2000", AttrKind::Device).unwrap(),
            4
        );
        assert_eq!(
            dev.attr(AttrKind::Device, "sample_rate").as_deref(),
            Some(&b"2000"[..])
        );
    }

    #[test]
    fn test_channel_attributes_are_keyed_by_direction() {
        let dev = MemoryDevice::new().with_channel_attr("voltage0", false, "raw", "256");
        let mut buf = [0u8; 8];
        let n = dev.ch_read_attr("voltage0", false, "raw", &mut buf).unwrap();
        assert_eq!(&buf[..n], b"256");
        assert!(matches!(
            dev.ch_read_attr("voltage0", true, "raw", &mut buf),
            Err(Error::NotFound(_))
        ));
        dev.ch_write_attr("voltage0", true, "raw", b"12").unwrap();
        assert_eq!(
            dev.channel_attr("voltage0", true, "raw").as_deref(),
            Some(&b"12"[..])
        );
    }

    #[test]
    fn test_data_block_bounds() {
        let dev = MemoryDevice::new().with_data(&[1, 2, 3, 4, 5, 6]);
        let mut buf = [0u8; 4];
        assert_eq!(dev.read_data(&mut buf, 4).unwrap(), 2);
        assert_eq!(&buf[..2], &[5, 6]);
        assert_eq!(dev.read_data(&mut buf, 6).unwrap(), 0);
        assert!(matches!(
            dev.read_data(&mut buf, 7),
            Err(Error::InvalidArgument(_))
        ));

        assert_eq!(dev.write_data(&[9, 9, 9], 4).unwrap(), 2);
        assert_eq!(dev.data(), vec![1, 2, 3, 4, 9, 9]);

        let empty = MemoryDevice::new().with_data_len(3);
        assert_eq!(empty.data(), vec![0, 0, 0]);
    }
}
