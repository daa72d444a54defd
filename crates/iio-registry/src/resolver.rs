//! Attribute and data access dispatch.
//!
//! Each function walks the registry (device, then channel, then attribute,
//! as applicable), stops with [`Error::NotFound`] at the first level without a
//! match, and otherwise calls the device accessor and returns its result
//! untouched. Nothing is cached; registries are small enough for linear scans.

use crate::{AttrKind, Channel, Device, DeviceChain, Error, Result};

/// Parse a device identifier as sent by the protocol engine.
///
/// Only ASCII decimal digits that fit a `u32` are accepted; anything else,
/// including a sign, is an [`Error::InvalidDeviceId`] rather than being read
/// as device 0.
pub fn parse_device_id(device: &str) -> Result<u32> {
    if device.is_empty() || !device.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidDeviceId(device.to_string()));
    }
    device
        .parse::<u32>()
        .map_err(|_| Error::InvalidDeviceId(device.to_string()))
}

fn find_device<'a>(devices: &'a DeviceChain, device: &str) -> Result<&'a Device> {
    let id = parse_device_id(device)?;
    devices.find(id).ok_or_else(|| {
        tracing::debug!(device, "no such device");
        Error::NotFound(format!("device {device}"))
    })
}

fn find_device_attr<'a>(devices: &'a DeviceChain, device: &str, attr: &str) -> Result<&'a Device> {
    let dev = find_device(devices, device)?;
    if dev.attributes().find(attr).is_none() {
        tracing::debug!(device, attr, "no such device attribute");
        return Err(Error::NotFound(format!("attribute {attr} on device {device}")));
    }
    Ok(dev)
}

fn find_channel_attr<'a>(
    devices: &'a DeviceChain,
    device: &str,
    channel: &str,
    is_output: bool,
    attr: &str,
) -> Result<(&'a Device, &'a Channel)> {
    let dev = find_device(devices, device)?;
    let chn = dev.channels().find(channel, is_output).ok_or_else(|| {
        tracing::debug!(device, channel, "no such channel");
        Error::NotFound(format!("channel {channel} on device {device}"))
    })?;
    if chn.attributes().find(attr).is_none() {
        tracing::debug!(device, channel, attr, "no such channel attribute");
        return Err(Error::NotFound(format!(
            "attribute {attr} on channel {channel}"
        )));
    }
    Ok((dev, chn))
}

pub fn read_attr(
    devices: &DeviceChain,
    device: &str,
    attr: &str,
    buf: &mut [u8],
    kind: AttrKind,
) -> Result<usize> {
    let dev = find_device_attr(devices, device, attr)?;
    tracing::trace!(device = dev.id(), attr, ?kind, "read_attr");
    dev.ops().read_attr(attr, buf, kind)
}

pub fn write_attr(
    devices: &DeviceChain,
    device: &str,
    attr: &str,
    buf: &[u8],
    kind: AttrKind,
) -> Result<usize> {
    let dev = find_device_attr(devices, device, attr)?;
    tracing::trace!(device = dev.id(), attr, ?kind, len = buf.len(), "write_attr");
    dev.ops().write_attr(attr, buf, kind)
}

pub fn ch_read_attr(
    devices: &DeviceChain,
    device: &str,
    channel: &str,
    is_output: bool,
    attr: &str,
    buf: &mut [u8],
) -> Result<usize> {
    let (dev, chn) = find_channel_attr(devices, device, channel, is_output, attr)?;
    tracing::trace!(device = dev.id(), channel = chn.id(), is_output, attr, "ch_read_attr");
    dev.ops().ch_read_attr(channel, is_output, attr, buf)
}

pub fn ch_write_attr(
    devices: &DeviceChain,
    device: &str,
    channel: &str,
    is_output: bool,
    attr: &str,
    buf: &[u8],
) -> Result<usize> {
    let (dev, chn) = find_channel_attr(devices, device, channel, is_output, attr)?;
    tracing::trace!(device = dev.id(), channel = chn.id(), is_output, attr, "ch_write_attr");
    dev.ops().ch_write_attr(channel, is_output, attr, buf)
}

/// Read sample data. The device is the data source; no channel is selected.
pub fn read_data(
    devices: &DeviceChain,
    device: &str,
    buf: &mut [u8],
    offset: usize,
) -> Result<usize> {
    let dev = find_device(devices, device)?;
    tracing::trace!(device = dev.id(), offset, len = buf.len(), "read_data");
    dev.ops().read_data(buf, offset)
}

pub fn write_data(devices: &DeviceChain, device: &str, buf: &[u8], offset: usize) -> Result<usize> {
    let dev = find_device(devices, device)?;
    tracing::trace!(device = dev.id(), offset, len = buf.len(), "write_data");
    dev.ops().write_data(buf, offset)
}
