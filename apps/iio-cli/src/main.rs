use anyhow::{bail, Context as _, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

use iio_registry as iio;
use iio_registry::Operations;
use iio_transport::MockTransport;

#[derive(Parser, Debug)]
#[command(
    name = "iio",
    version,
    about = "Inspect and exercise tiny IIO context layouts",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Source {
    /// Layout YAML file
    #[arg(long, conflicts_with = "dir")]
    layout: Option<String>,
    /// Directory of layout YAML files, merged in file name order
    #[arg(long)]
    dir: Option<String>,
    /// Override the descriptor capacity in bytes
    #[arg(long)]
    capacity: Option<usize>,
}

#[derive(Args, Debug)]
struct Target {
    /// Numeric device id
    #[arg(long)]
    device: String,
    /// Channel id; omit for a device attribute
    #[arg(long)]
    channel: Option<String>,
    /// Address the output channel with this id
    #[arg(long, action = ArgAction::SetTrue, requires = "channel")]
    output: bool,
    /// Attribute name
    #[arg(long)]
    attr: String,
    /// Attribute namespace for device attributes
    #[arg(long, value_enum, default_value = "device")]
    kind: Kind,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Kind {
    Device,
    Debug,
    Buffer,
}

impl From<Kind> for iio::AttrKind {
    fn from(k: Kind) -> Self {
        match k {
            Kind::Device => iio::AttrKind::Device,
            Kind::Debug => iio::AttrKind::Debug,
            Kind::Buffer => iio::AttrKind::Buffer,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the XML context descriptor
    Describe {
        #[command(flatten)]
        source: Source,
    },
    /// Report descriptor size against capacity; fails when it does not fit
    Check {
        #[command(flatten)]
        source: Source,
    },
    /// List devices, channels and attributes
    List {
        #[command(flatten)]
        source: Source,
        /// Emit JSON instead of an indented tree
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Resolve and read one attribute
    ReadAttr {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        target: Target,
        /// Read buffer size in bytes
        #[arg(long, default_value_t = 256usize)]
        len: usize,
    },
    /// Resolve and write one attribute
    WriteAttr {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        target: Target,
        /// Value to write
        #[arg(long)]
        value: String,
    },
    /// Read bytes from a device's data block (hex dump)
    ReadData {
        #[command(flatten)]
        source: Source,
        /// Numeric device id
        #[arg(long)]
        device: String,
        #[arg(long, default_value_t = 0usize)]
        offset: usize,
        #[arg(long, default_value_t = 64usize)]
        count: usize,
    },
    /// List serial ports usable as a transport
    Ports,
}

#[derive(Serialize)]
struct DeviceView<'a> {
    id: u32,
    name: &'a str,
    channels: Vec<ChannelView<'a>>,
    attributes: Vec<&'a str>,
}

#[derive(Serialize)]
struct ChannelView<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: Vec<&'a str>,
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Describe { source } => describe(&source),
        Commands::Check { source } => check(&source),
        Commands::List { source, json } => list(&source, json),
        Commands::ReadAttr {
            source,
            target,
            len,
        } => read_attr(&source, &target, len),
        Commands::WriteAttr {
            source,
            target,
            value,
        } => write_attr(&source, &target, &value),
        Commands::ReadData {
            source,
            device,
            offset,
            count,
        } => read_data(&source, &device, offset, count),
        Commands::Ports => ports(),
    }
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(source: &Source) -> Result<iio::Layout> {
    let mut layout = match (&source.layout, &source.dir) {
        (Some(file), _) => iio::load_layout_file(file)?,
        (None, Some(dir)) => iio::load_layouts_dir(dir)?,
        (None, None) => bail!("one of --layout or --dir is required"),
    };
    if let Some(cap) = source.capacity {
        layout.capacity = Some(cap);
    }
    info!(
        context = %layout.context.name,
        devices = layout.devices.len(),
        "layout loaded"
    );
    Ok(layout)
}

fn open(source: &Source) -> Result<iio::Context> {
    load(source)?.build_context(MockTransport::new(), None)
}

fn describe(source: &Source) -> Result<()> {
    let ctx = open(source)?;
    println!("{}", ctx.get_xml());
    Ok(())
}

fn check(source: &Source) -> Result<()> {
    let layout = load(source)?;
    let devices = layout.build_devices()?;
    let needed = iio::descriptor::required_size(
        &layout.context.name,
        &layout.context.description,
        &devices,
    );
    let capacity = layout.capacity();
    println!("descriptor: {needed} bytes, capacity {capacity} bytes");
    if needed >= capacity {
        bail!(
            "descriptor does not fit: needs a capacity of at least {} bytes",
            needed + 1
        );
    }
    // Names are validated while the context is built
    layout.build_context(MockTransport::new(), None)?;
    println!("ok: {} bytes spare", capacity - needed - 1);
    Ok(())
}

fn list(source: &Source, json: bool) -> Result<()> {
    let ctx = open(source)?;
    let views: Vec<DeviceView> = ctx
        .devices()
        .iter()
        .map(|d| DeviceView {
            id: d.id(),
            name: d.name(),
            channels: d
                .channels()
                .iter()
                .map(|c| ChannelView {
                    id: c.id(),
                    kind: c.kind().as_str(),
                    attributes: c.attributes().iter().map(|a| a.name()).collect(),
                })
                .collect(),
            attributes: d.attributes().iter().map(|a| a.name()).collect(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }
    println!("{} ({})", ctx.name(), ctx.description());
    for d in &views {
        println!("  device {} {}", d.id, d.name);
        for c in &d.channels {
            println!("    channel {} [{}]", c.id, c.kind);
            for a in &c.attributes {
                println!("      {a}");
            }
        }
        for a in &d.attributes {
            println!("    {a}");
        }
    }
    Ok(())
}

fn read_attr(source: &Source, target: &Target, len: usize) -> Result<()> {
    let ctx = open(source)?;
    let mut buf = vec![0u8; len];
    let result = match &target.channel {
        Some(ch) => ctx.ch_read_attr(&target.device, ch, target.output, &target.attr, &mut buf),
        None => ctx.read_attr(&target.device, &target.attr, &mut buf, target.kind.into()),
    };
    let n = result.map_err(|e| report(e, target))?;
    println!("{}", String::from_utf8_lossy(&buf[..n]));
    Ok(())
}

fn write_attr(source: &Source, target: &Target, value: &str) -> Result<()> {
    let ctx = open(source)?;
    let result = match &target.channel {
        Some(ch) => ctx.ch_write_attr(
            &target.device,
            ch,
            target.output,
            &target.attr,
            value.as_bytes(),
        ),
        None => ctx.write_attr(
            &target.device,
            &target.attr,
            value.as_bytes(),
            target.kind.into(),
        ),
    };
    let n = result.map_err(|e| report(e, target))?;
    println!("wrote {n} bytes");
    Ok(())
}

fn read_data(source: &Source, device: &str, offset: usize, count: usize) -> Result<()> {
    let ctx = open(source)?;
    let mut buf = vec![0u8; count];
    let n = ctx
        .read_data(device, &mut buf, offset)
        .with_context(|| format!("reading data from device {device}"))?;
    for (i, chunk) in buf[..n].chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!("{:08x}  {}", offset + i * 16, hex.join(" "));
    }
    Ok(())
}

fn report(e: iio::Error, target: &Target) -> anyhow::Error {
    warn!(errno = e.errno(), device = %target.device, attr = %target.attr, "access failed");
    anyhow::Error::new(e).context(format!(
        "accessing {}{}",
        target
            .channel
            .as_deref()
            .map(|c| format!("{c}/"))
            .unwrap_or_default(),
        target.attr
    ))
}

#[cfg(feature = "serial")]
fn ports() -> Result<()> {
    for p in iio_transport::SerialTransport::list()? {
        println!("{}\t{}", p.name, p.driver);
    }
    Ok(())
}

#[cfg(not(feature = "serial"))]
fn ports() -> Result<()> {
    bail!("built without serial support; rebuild with --features serial")
}
