use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Namespace of a device-level attribute access.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum AttrKind {
    #[default]
    Device,
    Debug,
    Buffer,
}

/// Read/write behavior behind a device.
///
/// Every method is optional: the default body reports
/// [`Error::Unsupported`], which is what the protocol engine sees when a
/// device does not implement that access. Implementations return the number
/// of bytes produced or consumed, or an error that is handed to the protocol
/// engine unchanged.
pub trait DeviceOps: Send + Sync {
    /// Read a device-level attribute into `buf`.
    fn read_attr(&self, _attr: &str, _buf: &mut [u8], _kind: AttrKind) -> Result<usize> {
        Err(Error::Unsupported("read_attr"))
    }

    /// Write a device-level attribute from `buf`.
    fn write_attr(&self, _attr: &str, _buf: &[u8], _kind: AttrKind) -> Result<usize> {
        Err(Error::Unsupported("write_attr"))
    }

    /// Read a channel attribute into `buf`.
    fn ch_read_attr(
        &self,
        _channel: &str,
        _is_output: bool,
        _attr: &str,
        _buf: &mut [u8],
    ) -> Result<usize> {
        Err(Error::Unsupported("ch_read_attr"))
    }

    /// Write a channel attribute from `buf`.
    fn ch_write_attr(
        &self,
        _channel: &str,
        _is_output: bool,
        _attr: &str,
        _buf: &[u8],
    ) -> Result<usize> {
        Err(Error::Unsupported("ch_write_attr"))
    }

    /// Read `buf.len()` bytes of sample data starting at `offset`.
    fn read_data(&self, _buf: &mut [u8], _offset: usize) -> Result<usize> {
        Err(Error::Unsupported("read_data"))
    }

    /// Write `buf` into the sample data starting at `offset`.
    fn write_data(&self, _buf: &[u8], _offset: usize) -> Result<usize> {
        Err(Error::Unsupported("write_data"))
    }
}

/// Copy `value` into `buf`, truncating to fit. Returns the bytes copied.
pub fn fill(buf: &mut [u8], value: &[u8]) -> usize {
    let n = buf.len().min(value.len());
    buf[..n].copy_from_slice(&value[..n]);
    n
}

type ReadAttrFn<D> = Box<dyn Fn(&D, &str, &mut [u8], AttrKind) -> Result<usize> + Send + Sync>;
type WriteAttrFn<D> = Box<dyn Fn(&D, &str, &[u8], AttrKind) -> Result<usize> + Send + Sync>;
type ChReadAttrFn<D> =
    Box<dyn Fn(&D, &str, bool, &str, &mut [u8]) -> Result<usize> + Send + Sync>;
type ChWriteAttrFn<D> = Box<dyn Fn(&D, &str, bool, &str, &[u8]) -> Result<usize> + Send + Sync>;
type ReadDataFn<D> = Box<dyn Fn(&D, &mut [u8], usize) -> Result<usize> + Send + Sync>;
type WriteDataFn<D> = Box<dyn Fn(&D, &[u8], usize) -> Result<usize> + Send + Sync>;

/// A [`DeviceOps`] assembled from a user data value and individual closures.
///
/// Useful for hosts that describe a device as "some state plus a handful of
/// callbacks"; any slot left empty reports [`Error::Unsupported`].
///
/// ```
/// use iio_registry::{fill, AccessorTable, AttrKind, DeviceOps};
///
/// let ops = AccessorTable::new(1000u32)
///     .with_read_attr(|rate, _attr, buf, _kind| Ok(fill(buf, rate.to_string().as_bytes())));
/// let mut buf = [0u8; 8];
/// assert_eq!(ops.read_attr("sample_rate", &mut buf, AttrKind::Device).unwrap(), 4);
/// assert!(ops.write_attr("sample_rate", b"10", AttrKind::Device).is_err());
/// ```
pub struct AccessorTable<D> {
    data: D,
    read_attr: Option<ReadAttrFn<D>>,
    write_attr: Option<WriteAttrFn<D>>,
    ch_read_attr: Option<ChReadAttrFn<D>>,
    ch_write_attr: Option<ChWriteAttrFn<D>>,
    read_data: Option<ReadDataFn<D>>,
    write_data: Option<WriteDataFn<D>>,
}

impl<D: Send + Sync + 'static> AccessorTable<D> {
    pub fn new(data: D) -> Self {
        Self {
            data,
            read_attr: None,
            write_attr: None,
            ch_read_attr: None,
            ch_write_attr: None,
            read_data: None,
            write_data: None,
        }
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn with_read_attr(
        mut self,
        f: impl Fn(&D, &str, &mut [u8], AttrKind) -> Result<usize> + Send + Sync + 'static,
    ) -> Self {
        self.read_attr = Some(Box::new(f));
        self
    }

    pub fn with_write_attr(
        mut self,
        f: impl Fn(&D, &str, &[u8], AttrKind) -> Result<usize> + Send + Sync + 'static,
    ) -> Self {
        self.write_attr = Some(Box::new(f));
        self
    }

    pub fn with_ch_read_attr(
        mut self,
        f: impl Fn(&D, &str, bool, &str, &mut [u8]) -> Result<usize> + Send + Sync + 'static,
    ) -> Self {
        self.ch_read_attr = Some(Box::new(f));
        self
    }

    pub fn with_ch_write_attr(
        mut self,
        f: impl Fn(&D, &str, bool, &str, &[u8]) -> Result<usize> + Send + Sync + 'static,
    ) -> Self {
        self.ch_write_attr = Some(Box::new(f));
        self
    }

    pub fn with_read_data(
        mut self,
        f: impl Fn(&D, &mut [u8], usize) -> Result<usize> + Send + Sync + 'static,
    ) -> Self {
        self.read_data = Some(Box::new(f));
        self
    }

    pub fn with_write_data(
        mut self,
        f: impl Fn(&D, &[u8], usize) -> Result<usize> + Send + Sync + 'static,
    ) -> Self {
        self.write_data = Some(Box::new(f));
        self
    }
}

impl<D: Send + Sync + 'static> DeviceOps for AccessorTable<D> {
    fn read_attr(&self, attr: &str, buf: &mut [u8], kind: AttrKind) -> Result<usize> {
        match &self.read_attr {
            Some(f) => f(&self.data, attr, buf, kind),
            None => Err(Error::Unsupported("read_attr")),
        }
    }

    fn write_attr(&self, attr: &str, buf: &[u8], kind: AttrKind) -> Result<usize> {
        match &self.write_attr {
            Some(f) => f(&self.data, attr, buf, kind),
            None => Err(Error::Unsupported("write_attr")),
        }
    }

    fn ch_read_attr(
        &self,
        channel: &str,
        is_output: bool,
        attr: &str,
        buf: &mut [u8],
    ) -> Result<usize> {
        match &self.ch_read_attr {
            Some(f) => f(&self.data, channel, is_output, attr, buf),
            None => Err(Error::Unsupported("ch_read_attr")),
        }
    }

    fn ch_write_attr(
        &self,
        channel: &str,
        is_output: bool,
        attr: &str,
        buf: &[u8],
    ) -> Result<usize> {
        match &self.ch_write_attr {
            Some(f) => f(&self.data, channel, is_output, attr, buf),
            None => Err(Error::Unsupported("ch_write_attr")),
        }
    }

    fn read_data(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        match &self.read_data {
            Some(f) => f(&self.data, buf, offset),
            None => Err(Error::Unsupported("read_data")),
        }
    }

    fn write_data(&self, buf: &[u8], offset: usize) -> Result<usize> {
        match &self.write_data {
            Some(f) => f(&self.data, buf, offset),
            None => Err(Error::Unsupported("write_data")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnly;

    impl DeviceOps for ReadOnly {
        fn read_attr(&self, _attr: &str, buf: &mut [u8], _kind: AttrKind) -> Result<usize> {
            Ok(fill(buf, b"1"))
        }
    }

    #[test]
    fn test_default_methods_report_unsupported() {
        let dev = ReadOnly;
        let mut buf = [0u8; 4];
        assert_eq!(dev.read_attr("x", &mut buf, AttrKind::Device).unwrap(), 1);
        assert!(matches!(
            dev.write_attr("x", b"1", AttrKind::Device),
            Err(Error::Unsupported("write_attr"))
        ));
        assert!(matches!(
            dev.read_data(&mut buf, 0),
            Err(Error::Unsupported("read_data"))
        ));
    }

    #[test]
    fn test_fill_truncates() {
        let mut buf = [0u8; 2];
        assert_eq!(fill(&mut buf, b"256"), 2);
        assert_eq!(&buf, b"25");
        let mut big = [0u8; 8];
        assert_eq!(fill(&mut big, b"256"), 3);
    }

    #[test]
    fn test_table_passes_user_data_and_arguments() {
        let table = AccessorTable::new(String::from("adc"))
            .with_ch_read_attr(|data, channel, is_output, attr, buf| {
                if is_output {
                    return Err(Error::NotFound(channel.to_string()));
                }
                let v = format!("{data}/{channel}/{attr}");
                Ok(fill(buf, v.as_bytes()))
            })
            .with_write_data(|_data, buf, offset| Ok(buf.len() + offset));

        let mut buf = [0u8; 32];
        let n = table
            .ch_read_attr("voltage0", false, "raw", &mut buf)
            .unwrap();
        assert_eq!(&buf[..n], b"adc/voltage0/raw");
        assert!(matches!(
            table.ch_read_attr("voltage0", true, "raw", &mut buf),
            Err(Error::NotFound(_))
        ));
        assert_eq!(table.write_data(b"abcd", 4).unwrap(), 8);
        assert!(matches!(
            table.ch_write_attr("voltage0", false, "raw", b"1"),
            Err(Error::Unsupported("ch_write_attr"))
        ));
        assert_eq!(table.data(), "adc");
    }
}
