//! iio-registry: device/channel/attribute registry for a tiny IIO daemon
//!
//! Devices, their channels and their attributes are registered once at start-up
//! and frozen into a [`Context`]. The context renders the XML context descriptor
//! that clients use for discovery, and resolves attribute and data accesses
//! coming from the protocol engine into the [`DeviceOps`] accessor of the
//! matching device.

mod error;
pub use error::{Error, Result};

mod types;
pub use types::*;

mod chain;
pub use chain::{
    register_attribute, register_channel, register_device, AttributeChain, Chain, ChainEntry,
    ChannelChain, DeviceChain,
};

mod accessor;
pub use accessor::{fill, AccessorTable, AttrKind, DeviceOps};

mod memory;
pub use memory::MemoryDevice;

pub mod resolver;

pub mod descriptor;

mod context;
pub use context::{Context, ContextBuilder, Operations, ProtocolEngine};

mod loader;
pub use loader::{
    load_layout_file, load_layouts_dir, parse_layout, AttrSpec, ChannelSpec, ContextSpec,
    DeviceSpec, Layout,
};

mod metrics;
pub use metrics::{Access, DispatchMetrics, MetricsHub};
