use crate::chain::{AttributeChain, ChainEntry, ChannelChain};
use crate::{DeviceOps, Error, Result};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Default capacity of the context descriptor, in bytes.
pub const IIO_XML_SIZE: usize = 1024 * 3;

// Field sizes include room for a terminator, so the longest accepted value is
// one byte shorter than the constant.
pub const ATTR_NAME_MAX_SIZE: usize = 32;
pub const DEV_NAME_STR_MAX_SIZE: usize = 32;
pub const CHN_ID_STR_MAX_SIZE: usize = 32;
pub const CONTEXT_NAME_MAX_SIZE: usize = 32;
pub const CONTEXT_DESC_MAX_SIZE: usize = 32;
pub const TYPE_STR_MAX_SIZE: usize = 16;

/// Validate a bounded identifier: non-empty, shorter than `size`, and free of
/// characters that would break the XML descriptor.
pub(crate) fn checked_name(field: &'static str, value: &str, size: usize) -> Result<String> {
    if value.is_empty() {
        return Err(Error::InvalidName {
            field,
            value: value.to_string(),
        });
    }
    checked_text(field, value, size)
}

/// Like [`checked_name`] but allows the empty string.
pub(crate) fn checked_text(field: &'static str, value: &str, size: usize) -> Result<String> {
    if value.len() >= size {
        return Err(Error::NameTooLong {
            field,
            max: size - 1,
            len: value.len(),
        });
    }
    if value
        .chars()
        .any(|c| c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '&'))
    {
        return Err(Error::InvalidName {
            field,
            value: value.to_string(),
        });
    }
    Ok(value.to_string())
}

/// A named attribute. Carries no behavior; reads and writes go to the owning
/// device's accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
}

impl Attribute {
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            name: checked_name("attribute name", name, ATTR_NAME_MAX_SIZE)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ChainEntry for Attribute {
    const KIND: &'static str = "attribute";

    fn conflicts_with(&self, other: &Self) -> Option<String> {
        (self.name == other.name).then(|| self.name.clone())
    }
}

/// Channel direction as it appears in the descriptor's `type` attribute.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Input,
    Output,
}

impl ChannelType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelType::Input => "input",
            ChannelType::Output => "output",
        }
    }

    pub fn is_output(self) -> bool {
        self == ChannelType::Output
    }

    pub fn from_output_flag(is_output: bool) -> Self {
        if is_output {
            ChannelType::Output
        } else {
            ChannelType::Input
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() >= TYPE_STR_MAX_SIZE {
            return Err(Error::NameTooLong {
                field: "channel type",
                max: TYPE_STR_MAX_SIZE - 1,
                len: s.len(),
            });
        }
        match s {
            "input" => Ok(ChannelType::Input),
            "output" => Ok(ChannelType::Output),
            other => Err(Error::InvalidArgument(format!(
                "channel type must be input or output, got {other:?}"
            ))),
        }
    }
}

/// A directional data path of a device, e.g. one ADC input.
#[derive(Debug, Clone)]
pub struct Channel {
    id: String,
    kind: ChannelType,
    attrs: AttributeChain,
}

impl Channel {
    pub fn new(id: &str, kind: ChannelType) -> Result<Self> {
        Ok(Self {
            id: checked_name("channel id", id, CHN_ID_STR_MAX_SIZE)?,
            kind,
            attrs: AttributeChain::new(),
        })
    }

    /// Build a channel from its textual type (`"input"` or `"output"`).
    pub fn with_type(id: &str, kind: &str) -> Result<Self> {
        Self::new(id, kind.parse()?)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ChannelType {
        self.kind
    }

    pub fn is_output(&self) -> bool {
        self.kind.is_output()
    }

    pub fn attributes(&self) -> &AttributeChain {
        &self.attrs
    }

    /// Append an attribute; returns the new attribute count.
    pub fn register_attribute(&mut self, attr: Attribute) -> Result<usize> {
        self.attrs.register(attr)
    }
}

impl ChainEntry for Channel {
    const KIND: &'static str = "channel";

    fn conflicts_with(&self, other: &Self) -> Option<String> {
        (self.kind == other.kind && self.id == other.id)
            .then(|| format!("{} ({})", self.id, self.kind))
    }
}

/// An instrument or peripheral: channels, device-level attributes and the
/// accessor that serves them.
#[derive(Clone)]
pub struct Device {
    name: String,
    id: u32,
    channels: ChannelChain,
    attrs: AttributeChain,
    ops: Arc<dyn DeviceOps>,
}

impl Device {
    pub fn new(name: &str, id: u32, ops: Arc<dyn DeviceOps>) -> Result<Self> {
        Ok(Self {
            name: checked_name("device name", name, DEV_NAME_STR_MAX_SIZE)?,
            id,
            channels: ChannelChain::new(),
            attrs: AttributeChain::new(),
            ops,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn channels(&self) -> &ChannelChain {
        &self.channels
    }

    pub fn attributes(&self) -> &AttributeChain {
        &self.attrs
    }

    pub fn ops(&self) -> &dyn DeviceOps {
        self.ops.as_ref()
    }

    pub fn register_channel(&mut self, channel: Channel) -> Result<usize> {
        self.channels.register(channel)
    }

    pub fn register_attribute(&mut self, attr: Attribute) -> Result<usize> {
        self.attrs.register(attr)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("channels", &self.channels)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

impl ChainEntry for Device {
    const KIND: &'static str = "device";

    fn conflicts_with(&self, other: &Self) -> Option<String> {
        if self.id == other.id {
            Some(format!("id {}", self.id))
        } else if self.name == other.name {
            Some(format!("name {}", self.name))
        } else {
            None
        }
    }
}
