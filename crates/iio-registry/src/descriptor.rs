//! XML context descriptor generation.
//!
//! The descriptor is produced once, when the [`Context`](crate::Context) is
//! built, into a buffer of fixed capacity. Every append is checked against
//! that capacity first, so an undersized configuration is rejected at start-up
//! instead of producing a truncated document.

use crate::{AttributeChain, DeviceChain, Error, Result};

/// Document type declaration preceding the context element.
pub const DTD: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"utf-8\"?>",
    "<!DOCTYPE context [",
    "<!ELEMENT context (device)*>",
    "<!ELEMENT device (channel | attribute | debug-attribute | buffer-attribute)*>",
    "<!ELEMENT channel (scan-element?, attribute*)>",
    "<!ELEMENT attribute EMPTY>",
    "<!ELEMENT scan-element EMPTY>",
    "<!ELEMENT debug-attribute EMPTY>",
    "<!ELEMENT buffer-attribute EMPTY>",
    "<!ATTLIST context name CDATA #REQUIRED description CDATA #IMPLIED>",
    "<!ATTLIST device id CDATA #REQUIRED name CDATA #IMPLIED>",
    "<!ATTLIST channel id CDATA #REQUIRED type (input|output) #REQUIRED name CDATA #IMPLIED>",
    "<!ATTLIST scan-element index CDATA #REQUIRED format CDATA #REQUIRED scale CDATA #IMPLIED>",
    "<!ATTLIST attribute name CDATA #REQUIRED filename CDATA #IMPLIED>",
    "<!ATTLIST debug-attribute name CDATA #REQUIRED>",
    "<!ATTLIST buffer-attribute name CDATA #REQUIRED value CDATA #IMPLIED>]>",
);

/// Append-only sink with an optional hard limit. Without a limit it only
/// counts, which is how [`required_size`] measures a registry.
struct Writer {
    out: String,
    len: usize,
    capacity: Option<usize>,
}

impl Writer {
    fn bounded(capacity: usize) -> Self {
        Self {
            out: String::new(),
            len: 0,
            capacity: Some(capacity),
        }
    }

    fn measuring() -> Self {
        Self {
            out: String::new(),
            len: 0,
            capacity: None,
        }
    }

    fn append(&mut self, parts: &[&str]) -> Result<()> {
        let add: usize = parts.iter().map(|p| p.len()).sum();
        let needed = self.len + add;
        let Some(capacity) = self.capacity else {
            self.len = needed;
            return Ok(());
        };
        // Strictly below: one byte stays reserved, as for a C string terminator
        if needed >= capacity {
            return Err(Error::DescriptorOverflow { needed, capacity });
        }
        self.out.try_reserve(add).map_err(|_| Error::OutOfMemory)?;
        for p in parts {
            self.out.push_str(p);
        }
        self.len = needed;
        Ok(())
    }
}

fn attributes(w: &mut Writer, attrs: &AttributeChain) -> Result<()> {
    for attr in attrs {
        w.append(&["<attribute name=\"", attr.name(), "\" />"])?;
    }
    Ok(())
}

fn walk(w: &mut Writer, name: &str, description: &str, devices: &DeviceChain) -> Result<()> {
    w.append(&[DTD])?;
    w.append(&["<context name=\"", name, "\" "])?;
    w.append(&["description=\"", description, "\">"])?;

    for device in devices {
        let id = device.id().to_string();
        w.append(&["<device id=\"", &id, "\" name=\"", device.name(), "\">"])?;

        for channel in device.channels() {
            w.append(&[
                "<channel id=\"",
                channel.id(),
                "\" type=\"",
                channel.kind().as_str(),
                "\">",
            ])?;
            attributes(w, channel.attributes())?;
            w.append(&["</channel>"])?;
        }

        attributes(w, device.attributes())?;
        w.append(&["</device>"])?;
    }

    w.append(&["</context>"])
}

/// Length in bytes of the descriptor for this registry.
pub fn required_size(name: &str, description: &str, devices: &DeviceChain) -> usize {
    let mut w = Writer::measuring();
    // A measuring writer has no limit to hit
    let _ = walk(&mut w, name, description, devices);
    w.len
}

/// Render the descriptor, failing with [`Error::DescriptorOverflow`] unless it
/// fits strictly below `capacity` bytes. The error reports the full size the
/// registry needs.
pub fn generate(
    name: &str,
    description: &str,
    devices: &DeviceChain,
    capacity: usize,
) -> Result<String> {
    let mut w = Writer::bounded(capacity);
    match walk(&mut w, name, description, devices) {
        Ok(()) => Ok(w.out),
        Err(Error::DescriptorOverflow { capacity, .. }) => Err(Error::DescriptorOverflow {
            needed: required_size(name, description, devices),
            capacity,
        }),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attribute, Channel, ChannelType, Device, MemoryDevice, IIO_XML_SIZE};
    use std::sync::Arc;

    fn device(name: &str, id: u32, channels: &[(&str, ChannelType, &[&str])], attrs: &[&str]) -> Device {
        let mut dev = Device::new(name, id, Arc::new(MemoryDevice::new())).unwrap();
        for (cid, kind, cattrs) in channels {
            let mut ch = Channel::new(cid, *kind).unwrap();
            for a in *cattrs {
                ch.register_attribute(Attribute::new(a).unwrap()).unwrap();
            }
            dev.register_channel(ch).unwrap();
        }
        for a in attrs {
            dev.register_attribute(Attribute::new(a).unwrap()).unwrap();
        }
        dev
    }

    #[test]
    fn test_document_layout() {
        let mut devices = DeviceChain::new();
        devices
            .register(device(
                "adc",
                0,
                &[("voltage0", ChannelType::Input, &["raw"])],
                &["sample_rate"],
            ))
            .unwrap();

        let xml = generate("tiny", "Tiny IIOD", &devices, IIO_XML_SIZE).unwrap();
        let expected = format!(
            "{DTD}<context name=\"tiny\" description=\"Tiny IIOD\">\
             <device id=\"0\" name=\"adc\">\
             <channel id=\"voltage0\" type=\"input\"><attribute name=\"raw\" /></channel>\
             <attribute name=\"sample_rate\" />\
             </device></context>"
        );
        assert_eq!(xml, expected);
        assert_eq!(required_size("tiny", "Tiny IIOD", &devices), xml.len());
    }

    #[test]
    fn test_empty_context() {
        let devices = DeviceChain::new();
        let xml = generate("tiny", "", &devices, IIO_XML_SIZE).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?><!DOCTYPE context ["));
        assert!(xml.ends_with("<context name=\"tiny\" description=\"\"></context>"));
    }

    #[test]
    fn test_elements_nest_under_their_owner() {
        let mut devices = DeviceChain::new();
        devices
            .register(device(
                "adc",
                0,
                &[
                    ("voltage0", ChannelType::Input, &["scale", "raw"]),
                    ("voltage0", ChannelType::Output, &["raw"]),
                ],
                &["sample_rate"],
            ))
            .unwrap();
        devices
            .register(device("dac", 3, &[("altvoltage0", ChannelType::Output, &[])], &[]))
            .unwrap();
        let xml = generate("ctx", "two devices", &devices, IIO_XML_SIZE).unwrap();

        assert_eq!(xml.matches("<device ").count(), 2);
        assert_eq!(xml.matches("<channel ").count(), 3);
        assert_eq!(xml.matches("<attribute ").count(), 4);

        let adc = xml.find("<device id=\"0\" name=\"adc\">").unwrap();
        let dac = xml.find("<device id=\"3\" name=\"dac\">").unwrap();
        let out = xml.find("<channel id=\"voltage0\" type=\"output\">").unwrap();
        let rate = xml.find("<attribute name=\"sample_rate\" />").unwrap();
        // Channels come before device attributes, both inside their device
        assert!(adc < out && out < rate && rate < dac);
        assert!(xml.contains("<channel id=\"altvoltage0\" type=\"output\"></channel></device></context>"));
    }

    #[test]
    fn test_capacity_is_a_strict_upper_bound() {
        let mut devices = DeviceChain::new();
        devices
            .register(device("adc", 0, &[("voltage0", ChannelType::Input, &["raw"])], &[]))
            .unwrap();
        let size = required_size("tiny", "desc", &devices);

        assert!(generate("tiny", "desc", &devices, size + 1).is_ok());
        match generate("tiny", "desc", &devices, size) {
            Err(Error::DescriptorOverflow { needed, capacity }) => {
                assert_eq!(needed, size);
                assert_eq!(capacity, size);
            }
            other => panic!("expected overflow, got {other:?}"),
        }
        // Even the preamble alone does not fit
        assert!(matches!(
            generate("tiny", "desc", &devices, DTD.len()),
            Err(Error::DescriptorOverflow { .. })
        ));
    }

    #[test]
    fn test_default_capacity_overflow() {
        let mut devices = DeviceChain::new();
        for id in 0..40 {
            let name = format!("dev{id}");
            devices
                .register(device(
                    &name,
                    id,
                    &[("voltage0", ChannelType::Input, &["raw", "scale", "offset"])],
                    &["sample_rate"],
                ))
                .unwrap();
        }
        let needed = required_size("tiny", "many", &devices);
        assert!(needed > IIO_XML_SIZE);
        assert!(matches!(
            generate("tiny", "many", &devices, IIO_XML_SIZE),
            Err(Error::DescriptorOverflow { .. })
        ));
    }
}
