use crate::{
    AttrKind, Attribute, Channel, ChannelType, Context, Device, DeviceChain, MemoryDevice,
    MetricsHub, IIO_XML_SIZE,
};
use anyhow::Context as _;
use iio_transport::Transport;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A whole context described in YAML. Devices are served by
/// [`MemoryDevice`]s seeded with the attribute values given here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct Layout {
    pub context: ContextSpec,
    /// Descriptor capacity in bytes.
    #[serde(default)]
    pub capacity: Option<usize>,
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ContextSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct DeviceSpec {
    pub name: String,
    pub id: u32,
    #[serde(default)]
    pub attributes: Vec<AttrSpec>,
    #[serde(default)]
    pub channels: Vec<ChannelSpec>,
    /// Size of the zero-filled sample data block.
    #[serde(default)]
    pub data: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ChannelSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default)]
    pub attributes: Vec<AttrSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct AttrSpec {
    pub name: String,
    #[serde(default)]
    pub value: String,
    /// Namespace the value is served under. Ignored for channel attributes.
    #[serde(default)]
    pub kind: AttrKind,
}

impl DeviceSpec {
    fn build(&self) -> crate::Result<Device> {
        let mut mem = MemoryDevice::new().with_data_len(self.data.unwrap_or(0));
        for a in &self.attributes {
            mem = mem.with_attr_kind(a.kind, &a.name, &a.value);
        }
        for ch in &self.channels {
            for a in &ch.attributes {
                mem = mem.with_channel_attr(&ch.id, ch.kind.is_output(), &a.name, &a.value);
            }
        }

        let mut device = Device::new(&self.name, self.id, Arc::new(mem))?;
        for ch in &self.channels {
            let mut channel = Channel::new(&ch.id, ch.kind)?;
            for a in &ch.attributes {
                channel.register_attribute(Attribute::new(&a.name)?)?;
            }
            device.register_channel(channel)?;
        }
        // One name may carry values in several namespaces; it is listed once
        for a in &self.attributes {
            if device.attributes().find(&a.name).is_none() {
                device.register_attribute(Attribute::new(&a.name)?)?;
            }
        }
        Ok(device)
    }
}

impl Layout {
    pub fn capacity(&self) -> usize {
        self.capacity.unwrap_or(IIO_XML_SIZE)
    }

    /// Register every device, in file order.
    pub fn build_devices(&self) -> anyhow::Result<DeviceChain> {
        let mut devices = DeviceChain::new();
        for spec in &self.devices {
            let device = spec
                .build()
                .with_context(|| format!("building device {} ({})", spec.id, spec.name))?;
            devices
                .register(device)
                .with_context(|| format!("registering device {} ({})", spec.id, spec.name))?;
        }
        Ok(devices)
    }

    pub fn build_context(
        &self,
        transport: impl Transport + Send + 'static,
        metrics: Option<MetricsHub>,
    ) -> anyhow::Result<Context> {
        let devices = self.build_devices()?;
        let mut builder = Context::builder(&self.context.name, &self.context.description)
            .capacity(self.capacity());
        if let Some(m) = metrics {
            builder = builder.metrics(m);
        }
        builder
            .build(devices, transport)
            .with_context(|| format!("building context {}", self.context.name))
    }
}

pub fn parse_layout(raw: &str) -> anyhow::Result<Layout> {
    serde_yaml::from_str(raw).context("decoding layout")
}

pub fn load_layout_file(path: impl AsRef<Path>) -> anyhow::Result<Layout> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading layout: {}", path.display()))?;
    parse_layout(&raw).with_context(|| format!("parsing yaml: {}", path.display()))
}

/// Merge every `*.yml`/`*.yaml` file in `dir`, in file name order. The first
/// file supplies the context name, description and capacity; later files
/// only contribute devices.
pub fn load_layouts_dir(dir: impl AsRef<Path>) -> anyhow::Result<Layout> {
    let dir = dir.as_ref();
    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("reading layout dir: {}", dir.display()))?
    {
        let path = entry?.path();
        if let Some(ext) = path.extension() {
            if ext == "yml" || ext == "yaml" {
                entries.push(path);
            }
        }
    }
    entries.sort();

    let mut merged: Option<Layout> = None;
    for p in entries {
        let layout = load_layout_file(&p)?;
        merged = Some(match merged.take() {
            None => layout,
            Some(mut m) => {
                m.devices.extend(layout.devices);
                m
            }
        });
    }
    merged.with_context(|| format!("no layout files in {}", dir.display()))
}
