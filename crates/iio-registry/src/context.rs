use crate::metrics::{Access, MetricsHub};
use crate::types::{checked_name, checked_text};
use crate::{
    descriptor, resolver, AttrKind, DeviceChain, Error, Result, CONTEXT_DESC_MAX_SIZE,
    CONTEXT_NAME_MAX_SIZE, IIO_XML_SIZE,
};
use iio_transport::Transport;

/// Entry points the protocol engine drives.
///
/// Attribute and data accesses return the accessor's byte count or error
/// unchanged; `read`/`write` move raw bytes over the host's transport.
pub trait Operations {
    fn read_attr(&self, device: &str, attr: &str, buf: &mut [u8], kind: AttrKind)
        -> Result<usize>;
    fn write_attr(&self, device: &str, attr: &str, buf: &[u8], kind: AttrKind) -> Result<usize>;
    fn ch_read_attr(
        &self,
        device: &str,
        channel: &str,
        is_output: bool,
        attr: &str,
        buf: &mut [u8],
    ) -> Result<usize>;
    fn ch_write_attr(
        &self,
        device: &str,
        channel: &str,
        is_output: bool,
        attr: &str,
        buf: &[u8],
    ) -> Result<usize>;
    fn read_data(&self, device: &str, buf: &mut [u8], offset: usize) -> Result<usize>;
    fn write_data(&self, device: &str, buf: &[u8], offset: usize) -> Result<usize>;
    /// The context descriptor document.
    fn get_xml(&self) -> &str;
    /// Read raw command bytes from the client.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
    /// Write raw reply bytes to the client.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;
}

/// The wire-protocol state machine sitting on top of a [`Context`].
pub trait ProtocolEngine {
    /// Read and execute one client command using `ops`.
    fn read_command(&mut self, ops: &mut dyn Operations) -> Result<()>;
}

/// Root of the registry: the frozen device tree, its descriptor and the
/// transport used by the protocol engine.
pub struct Context {
    name: String,
    description: String,
    devices: DeviceChain,
    xml: String,
    transport: Box<dyn Transport + Send>,
    metrics: Option<MetricsHub>,
}

/// Optional settings for [`Context`] construction.
pub struct ContextBuilder {
    name: String,
    description: String,
    capacity: usize,
    metrics: Option<MetricsHub>,
}

impl ContextBuilder {
    /// Descriptor capacity in bytes; the document must stay strictly below it.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn metrics(mut self, metrics: MetricsHub) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Freeze `devices` into a context and render its descriptor.
    pub fn build(
        self,
        devices: DeviceChain,
        transport: impl Transport + Send + 'static,
    ) -> Result<Context> {
        let name = checked_name("context name", &self.name, CONTEXT_NAME_MAX_SIZE)?;
        let description = checked_text(
            "context description",
            &self.description,
            CONTEXT_DESC_MAX_SIZE,
        )?;
        if devices.is_empty() {
            return Err(Error::InvalidArgument(
                "context needs at least one device".into(),
            ));
        }
        let xml = descriptor::generate(&name, &description, &devices, self.capacity)?;
        if let Some(m) = &self.metrics {
            m.dispatch.devices_registered.set(devices.len() as i64);
        }
        tracing::info!(
            context = %name,
            devices = devices.len(),
            descriptor_bytes = xml.len(),
            capacity = self.capacity,
            "context ready"
        );
        Ok(Context {
            name,
            description,
            devices,
            xml,
            transport: Box::new(transport),
            metrics: self.metrics,
        })
    }
}

impl Context {
    pub fn builder(name: &str, description: &str) -> ContextBuilder {
        ContextBuilder {
            name: name.to_string(),
            description: description.to_string(),
            capacity: IIO_XML_SIZE,
            metrics: None,
        }
    }

    /// Build a context with the default descriptor capacity and no metrics.
    pub fn new(
        name: &str,
        description: &str,
        devices: DeviceChain,
        transport: impl Transport + Send + 'static,
    ) -> Result<Self> {
        Self::builder(name, description).build(devices, transport)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn devices(&self) -> &DeviceChain {
        &self.devices
    }

    /// The descriptor rendered at construction. Always the same buffer.
    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn metrics(&self) -> Option<&MetricsHub> {
        self.metrics.as_ref()
    }

    /// Hand the operations table to `engine` for one command.
    pub fn read_command(&mut self, engine: &mut dyn ProtocolEngine) -> Result<()> {
        engine.read_command(self)
    }

    fn observe(&self, access: Access, result: Result<usize>) -> Result<usize> {
        if let Some(m) = &self.metrics {
            m.observe(access, result.is_ok());
        }
        result
    }
}

impl Operations for Context {
    fn read_attr(
        &self,
        device: &str,
        attr: &str,
        buf: &mut [u8],
        kind: AttrKind,
    ) -> Result<usize> {
        let r = resolver::read_attr(&self.devices, device, attr, buf, kind);
        self.observe(Access::AttrRead, r)
    }

    fn write_attr(&self, device: &str, attr: &str, buf: &[u8], kind: AttrKind) -> Result<usize> {
        let r = resolver::write_attr(&self.devices, device, attr, buf, kind);
        self.observe(Access::AttrWrite, r)
    }

    fn ch_read_attr(
        &self,
        device: &str,
        channel: &str,
        is_output: bool,
        attr: &str,
        buf: &mut [u8],
    ) -> Result<usize> {
        let r = resolver::ch_read_attr(&self.devices, device, channel, is_output, attr, buf);
        self.observe(Access::AttrRead, r)
    }

    fn ch_write_attr(
        &self,
        device: &str,
        channel: &str,
        is_output: bool,
        attr: &str,
        buf: &[u8],
    ) -> Result<usize> {
        let r = resolver::ch_write_attr(&self.devices, device, channel, is_output, attr, buf);
        self.observe(Access::AttrWrite, r)
    }

    fn read_data(&self, device: &str, buf: &mut [u8], offset: usize) -> Result<usize> {
        let r = resolver::read_data(&self.devices, device, buf, offset);
        self.observe(Access::DataRead, r)
    }

    fn write_data(&self, device: &str, buf: &[u8], offset: usize) -> Result<usize> {
        let r = resolver::write_data(&self.devices, device, buf, offset);
        self.observe(Access::DataWrite, r)
    }

    fn get_xml(&self) -> &str {
        &self.xml
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.transport.read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(self.transport.write(buf)?)
    }
}
