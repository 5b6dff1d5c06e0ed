use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use rail_netdev::netdev::RecvMode;
use rail_netdev::logging::{init_enhanced_logging, log_debug, log_error};
use rail_netdev::util::hex::{decode_hex, pretty_hex};
use rail_netdev::{
    init_logger, log_info, DriverParams, MockRadio, NetDevice, NetOpt, NetdevEvent, OptValue,
    RailEvents, RailNetdev,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rail-netdev")]
#[command(about = "IEEE 802.15.4 netdev driver running against a simulated radio")]
struct Cli {
    /// Driver parameters as JSON
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange frames between two simulated nodes
    Loopback {
        #[arg(short = 'n', long, default_value = "3")]
        count: u8,
    },
    /// Transmit one frame and show what reached the radio
    Send {
        /// MAC frame without FCS, as hex
        frame: String,
    },
    /// Print every option the device answers
    Options,
}

fn load_params(path: Option<&PathBuf>) -> Result<DriverParams> {
    match path {
        Some(path) => DriverParams::from_json_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(DriverParams::default()),
    }
}

fn bring_up(radio: &MockRadio, params: DriverParams) -> Result<RailNetdev<MockRadio>> {
    let mut dev = RailNetdev::new(radio.clone(), params);
    dev.init().context("device init failed")?;
    log_debug(&format!(
        "device up on channel {} ({} band)",
        dev.channel(),
        dev.params().band
    ));
    Ok(dev)
}

/// Data frame, short addresses, PAN ID compression, broadcast destination
fn data_frame(seq: u8, pan: u16, src: [u8; 2], payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0x41, 0x88, seq];
    frame.extend_from_slice(&pan.to_le_bytes());
    frame.extend_from_slice(&[0xff, 0xff]);
    frame.extend_from_slice(&[src[1], src[0]]);
    frame.extend_from_slice(payload);
    frame
}

fn loopback(params: DriverParams, count: u8) -> Result<()> {
    let radio_a = MockRadio::with_eui64([0x00, 0x0b, 0x57, 0xff, 0xfe, 0x00, 0x00, 0x0a]);
    let radio_b = MockRadio::with_eui64([0x00, 0x0b, 0x57, 0xff, 0xfe, 0x00, 0x00, 0x0b]);
    let mut node_a = bring_up(&radio_a, params.clone())?;
    let mut node_b = bring_up(&radio_b, params)?;

    let pan = match node_a.get(NetOpt::Nid)? {
        OptValue::Nid(pan) => pan,
        other => bail!("unexpected PAN ID value {other:?}"),
    };
    let src = match node_a.get(NetOpt::Address)? {
        OptValue::Address(addr) => addr,
        other => bail!("unexpected address value {other:?}"),
    };

    for seq in 0..count {
        let payload = format!("ping {seq}");
        let frame = data_frame(seq, pan, src, payload.as_bytes());
        node_a.send(&[&frame])?;

        // Carry the frame over the simulated air, PHR stripped
        for on_air in radio_a.take_tx_frames() {
            radio_b.inject_rx(&on_air[1..], -45, 255);
        }
        radio_a.complete_tx(RailEvents::TX_PACKET_SENT);

        while let Some(event) = node_b.isr() {
            if event != NetdevEvent::RxComplete {
                continue;
            }
            let mut buf = [0u8; 127];
            let mut info = rail_netdev::RxInfo::default();
            let len = node_b.recv(RecvMode::Deliver {
                buf: &mut buf,
                info: Some(&mut info),
            })?;
            println!(
                "node b received {len} bytes (rssi {} dBm, lqi {}):",
                info.rssi, info.lqi
            );
            println!("{}", pretty_hex(&buf[..len], 16));
        }
        while let Some(event) = node_a.isr() {
            println!("node a: {event:?}");
        }
    }

    println!("node a: {}", node_a.stats());
    println!("node b: {}", node_b.stats());
    Ok(())
}

fn send(params: DriverParams, frame_hex: &str) -> Result<()> {
    let frame = decode_hex(frame_hex).context("frame is not valid hex")?;
    let radio = MockRadio::new();
    let mut dev = bring_up(&radio, params)?;

    let len = dev.send(&[&frame])?;
    log_info(&format!("submitted {len} byte frame"));

    for phy in radio.take_tx_frames() {
        println!("PHR {} ({} byte PSDU incl. FCS)", phy[0], phy[0]);
        println!("{}", pretty_hex(&phy, 16));
    }
    Ok(())
}

fn options(params: DriverParams) -> Result<()> {
    let radio = MockRadio::new();
    let dev = bring_up(&radio, params)?;

    for opt in NetOpt::ALL {
        match dev.get(opt) {
            Ok(value) => println!("{:<24} {value}", opt.name()),
            Err(err) => println!("{:<24} <{err}>", opt.name()),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.log_level.as_deref() {
        Some(level) => init_enhanced_logging(level)
            .map_err(|err| anyhow!("logger setup failed: {err}"))?,
        None => init_logger(),
    }

    let params = load_params(cli.config.as_ref())?;

    let result = match cli.command {
        Commands::Loopback { count } => loopback(params, count),
        Commands::Send { frame } => send(params, &frame),
        Commands::Options => options(params),
    };
    if let Err(err) = &result {
        log_error(&format!("{err:#}"));
    }
    result
}
