use crate::{Attribute, Channel, Device, Error, Result};

/// An entry that can be registered into a [`Chain`].
pub trait ChainEntry {
    /// Entry kind, used in logs and errors.
    const KIND: &'static str;

    /// The key `self` shares with `other`, if registering both would break the
    /// chain's uniqueness rule.
    fn conflicts_with(&self, other: &Self) -> Option<String>;
}

/// Append-only, insertion-ordered collection with a per-kind uniqueness rule.
#[derive(Debug, Clone)]
pub struct Chain<T> {
    entries: Vec<T>,
}

pub type AttributeChain = Chain<Attribute>;
pub type ChannelChain = Chain<Channel>;
pub type DeviceChain = Chain<Device>;

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Chain<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Entry at a 1-based position, as returned by `register`.
    pub fn nth(&self, position: usize) -> Option<&T> {
        position
            .checked_sub(1)
            .and_then(|idx| self.entries.get(idx))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }
}

impl<T: ChainEntry> Chain<T> {
    /// Append `entry` and return the new entry count.
    ///
    /// Fails with [`Error::AlreadyExists`] when an entry with the same key is
    /// present, or [`Error::OutOfMemory`] when the chain cannot grow. The chain
    /// is unchanged on failure.
    pub fn register(&mut self, entry: T) -> Result<usize> {
        if let Some(key) = self.entries.iter().find_map(|e| e.conflicts_with(&entry)) {
            tracing::warn!(kind = T::KIND, %key, "duplicate registration rejected");
            return Err(Error::AlreadyExists(format!("{} {key}", T::KIND)));
        }
        self.entries
            .try_reserve(1)
            .map_err(|_| Error::OutOfMemory)?;
        self.entries.push(entry);
        tracing::debug!(kind = T::KIND, position = self.entries.len(), "registered");
        Ok(self.entries.len())
    }
}

impl AttributeChain {
    pub fn find(&self, name: &str) -> Option<&Attribute> {
        self.entries.iter().find(|a| a.name() == name)
    }
}

impl ChannelChain {
    /// Look up a channel by id. A channel whose direction matches `is_output`
    /// wins; otherwise the first channel with that id is returned and the
    /// accessor gets to judge the direction.
    pub fn find(&self, id: &str, is_output: bool) -> Option<&Channel> {
        let mut same_id = self.entries.iter().filter(|c| c.id() == id);
        let first = same_id.next()?;
        if first.is_output() == is_output {
            return Some(first);
        }
        Some(same_id.find(|c| c.is_output() == is_output).unwrap_or(first))
    }
}

impl DeviceChain {
    pub fn find(&self, id: u32) -> Option<&Device> {
        self.entries.iter().find(|d| d.id() == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Device> {
        self.entries.iter().find(|d| d.name() == name)
    }
}

impl<'a, T> IntoIterator for &'a Chain<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

pub fn register_attribute(list: &mut AttributeChain, attr: Attribute) -> Result<usize> {
    list.register(attr)
}

pub fn register_channel(list: &mut ChannelChain, channel: Channel) -> Result<usize> {
    list.register(channel)
}

pub fn register_device(list: &mut DeviceChain, device: Device) -> Result<usize> {
    list.register(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelType, MemoryDevice};
    use std::sync::Arc;

    #[test]
    fn test_register_returns_position() {
        let mut attrs = AttributeChain::new();
        assert!(attrs.is_empty());
        for (i, name) in ["sample_rate", "direct_reg_access", "length_align_bytes"]
            .iter()
            .enumerate()
        {
            let pos = register_attribute(&mut attrs, Attribute::new(name).unwrap()).unwrap();
            assert_eq!(pos, i + 1);
            assert_eq!(attrs.nth(pos).unwrap().name(), *name);
        }
        assert!(attrs.nth(0).is_none());
        assert!(attrs.nth(4).is_none());
        let names: Vec<&str> = attrs.iter().map(|a| a.name()).collect();
        assert_eq!(
            names,
            vec!["sample_rate", "direct_reg_access", "length_align_bytes"]
        );
    }

    #[test]
    fn test_duplicate_attribute_leaves_chain_unchanged() {
        let mut attrs = AttributeChain::new();
        attrs.register(Attribute::new("scale").unwrap()).unwrap();
        attrs.register(Attribute::new("raw").unwrap()).unwrap();
        let err = attrs.register(Attribute::new("scale").unwrap()).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.nth(2).unwrap().name(), "raw");
    }

    #[test]
    fn test_channel_uniqueness_is_per_direction() {
        let mut chans = ChannelChain::new();
        let v0_in = Channel::new("voltage0", ChannelType::Input).unwrap();
        let v0_out = Channel::new("voltage0", ChannelType::Output).unwrap();
        assert_eq!(register_channel(&mut chans, v0_in.clone()).unwrap(), 1);
        assert_eq!(register_channel(&mut chans, v0_out).unwrap(), 2);
        assert!(matches!(
            register_channel(&mut chans, v0_in),
            Err(Error::AlreadyExists(_))
        ));
        assert_eq!(chans.len(), 2);
    }

    #[test]
    fn test_channel_lookup_prefers_matching_direction() {
        let mut chans = ChannelChain::new();
        chans
            .register(Channel::new("voltage0", ChannelType::Input).unwrap())
            .unwrap();
        chans
            .register(Channel::new("voltage1", ChannelType::Input).unwrap())
            .unwrap();
        chans
            .register(Channel::new("voltage0", ChannelType::Output).unwrap())
            .unwrap();

        assert!(chans.find("voltage0", true).unwrap().is_output());
        assert!(!chans.find("voltage0", false).unwrap().is_output());
        // No output channel with this id: fall back to the input one
        assert!(!chans.find("voltage1", true).unwrap().is_output());
        assert!(chans.find("voltage2", false).is_none());
    }

    #[test]
    fn test_duplicate_device_id_is_rejected() {
        let ops = Arc::new(MemoryDevice::new());
        let mut devices = DeviceChain::new();
        let adc = Device::new("adc", 0, ops.clone()).unwrap();
        assert_eq!(register_device(&mut devices, adc).unwrap(), 1);
        let dac = Device::new("dac", 1, ops.clone()).unwrap();
        assert_eq!(register_device(&mut devices, dac).unwrap(), 2);

        let clash = Device::new("adc-b", 1, ops).unwrap();
        let err = register_device(&mut devices, clash).unwrap_err();
        assert_eq!(err.to_string(), "already registered: device id 1");
        assert_eq!(devices.len(), 2);
        assert_eq!(devices.find(1).unwrap().name(), "dac");
        assert_eq!(devices.find_by_name("adc").unwrap().id(), 0);
    }
}
