use crate::{Result, Transport, TransportError};
use serialport::{SerialPort, SerialPortType};
use std::io::{Read, Write};
use std::time::Duration;

/// Line settings for a UART link to the client.
#[derive(Clone, Debug)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            timeout: Duration::from_millis(200),
        }
    }
}

/// A serial port discovered on the host.
#[derive(Clone, Debug)]
pub struct PortInfo {
    pub name: String,
    pub driver: String,
}

/// Command stream over a serial port (USB-UART bridges, debug consoles).
pub struct SerialTransport {
    path: String,
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with(path, &SerialConfig::default())
    }

    pub fn open_with(path: &str, config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(path, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|e| TransportError::Io(e.to_string()))?;
        tracing::debug!(path, baud = config.baud_rate, "serial transport opened");
        Ok(Self {
            path: path.to_string(),
            port,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Enumerate serial ports, USB bridges first.
    pub fn list() -> Result<Vec<PortInfo>> {
        let mut usb = Vec::new();
        let mut other = Vec::new();
        for p in serialport::available_ports().map_err(|e| TransportError::Io(e.to_string()))? {
            match p.port_type {
                SerialPortType::UsbPort(_) => usb.push(PortInfo {
                    name: p.port_name,
                    driver: "usb-serial".to_string(),
                }),
                _ => other.push(PortInfo {
                    name: p.port_name,
                    driver: "serial".to_string(),
                }),
            }
        }
        usb.extend(other);
        Ok(usb)
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.port.read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(self.port.write(buf)?)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.port.flush()?)
    }
}
