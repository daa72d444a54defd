use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Kind of access dispatched through the context.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Access {
    AttrRead,
    AttrWrite,
    DataRead,
    DataWrite,
}

#[derive(Clone)]
pub struct DispatchMetrics {
    pub attr_reads: IntCounter,
    pub attr_writes: IntCounter,
    pub data_reads: IntCounter,
    pub data_writes: IntCounter,
    pub dispatch_errors: IntCounter,
    pub devices_registered: IntGauge,
}

#[derive(Clone)]
pub struct MetricsHub {
    pub registry: Registry,
    pub dispatch: DispatchMetrics,
}

impl MetricsHub {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        let counter = |name: &str, help: &str| {
            IntCounter::new(name, help).map_err(|e| format!("metrics init error: {e}"))
        };
        let dispatch = DispatchMetrics {
            attr_reads: counter("iio_attr_reads", "Device and channel attribute reads")?,
            attr_writes: counter("iio_attr_writes", "Device and channel attribute writes")?,
            data_reads: counter("iio_data_reads", "Sample data reads")?,
            data_writes: counter("iio_data_writes", "Sample data writes")?,
            dispatch_errors: counter("iio_dispatch_errors", "Accesses that returned an error")?,
            devices_registered: IntGauge::new(
                "iio_devices_registered",
                "Number of devices in the context",
            )
            .map_err(|e| format!("metrics init error: {e}"))?,
        };
        registry
            .register(Box::new(dispatch.attr_reads.clone()))
            .map_err(|e| format!("metrics register error: {e}"))?;
        registry
            .register(Box::new(dispatch.attr_writes.clone()))
            .map_err(|e| format!("metrics register error: {e}"))?;
        registry
            .register(Box::new(dispatch.data_reads.clone()))
            .map_err(|e| format!("metrics register error: {e}"))?;
        registry
            .register(Box::new(dispatch.data_writes.clone()))
            .map_err(|e| format!("metrics register error: {e}"))?;
        registry
            .register(Box::new(dispatch.dispatch_errors.clone()))
            .map_err(|e| format!("metrics register error: {e}"))?;
        registry
            .register(Box::new(dispatch.devices_registered.clone()))
            .map_err(|e| format!("metrics register error: {e}"))?;
        Ok(Self { registry, dispatch })
    }

    pub fn observe(&self, access: Access, ok: bool) {
        let counter = match access {
            Access::AttrRead => &self.dispatch.attr_reads,
            Access::AttrWrite => &self.dispatch.attr_writes,
            Access::DataRead => &self.dispatch.data_reads,
            Access::DataWrite => &self.dispatch.data_writes,
        };
        counter.inc();
        if !ok {
            self.dispatch.dispatch_errors.inc();
        }
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_counts_errors_separately() {
        let hub = MetricsHub::new().unwrap();
        hub.observe(Access::AttrRead, true);
        hub.observe(Access::AttrRead, false);
        hub.observe(Access::DataWrite, true);
        assert_eq!(hub.dispatch.attr_reads.get(), 2);
        assert_eq!(hub.dispatch.data_writes.get(), 1);
        assert_eq!(hub.dispatch.dispatch_errors.get(), 1);

        let text = hub.encode_text();
        assert!(text.contains("iio_attr_reads 2"));
        assert!(text.contains("iio_devices_registered 0"));
    }

    #[test]
    fn test_every_metric_is_registered() {
        let a = MetricsHub::new().unwrap();
        let b = MetricsHub::new().unwrap();
        assert_eq!(a.registry.gather().len(), 6);
        b.observe(Access::DataRead, false);
        assert_eq!(a.dispatch.dispatch_errors.get(), 0);
        assert_eq!(b.dispatch.dispatch_errors.get(), 1);
    }
}
