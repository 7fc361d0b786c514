//! CLI demo exercising the codec end to end against a worked audio-stream
//! schema: packs an action, hex-dumps the wire bytes, then unpacks them
//! back and checks the round trip.

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};

use tup_codec::wire;

#[path = "../../../demos/stream.rs"]
mod stream;

use stream::{
    StreamChmap, StreamColor, StreamDirection, StreamParams, StreamPosition, StreamTrigger,
    StreamTriggerCmd, STREAM_ACTION_PARAMS, STREAM_ACTION_POSITION, STREAM_ACTION_TRIGGER,
    STREAM_REGISTRY,
};

#[derive(Parser)]
#[command(name = "tup-demo")]
#[command(author, version, about = "Pack/unpack demo for the tuple codec", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Round-trip a stream_trigger action through pack/unpack.
    Trigger {
        #[arg(long, value_enum, default_value = "start")]
        cmd: StreamTriggerCmd,
    },
    /// Round-trip a stream_position action through pack/unpack.
    Position {
        #[arg(long, default_value = "0")]
        host: u32,
        #[arg(long, default_value = "0")]
        dai: u32,
    },
    /// Round-trip a stream_params action, including its nested chmap/color
    /// arrays, demonstrating two levels of TUPLE_ARRAY nesting.
    Params {
        #[arg(long, value_enum, default_value = "playback")]
        direction: StreamDirection,
        #[arg(long, default_value = "48000")]
        rate: u32,
        #[arg(long, default_value = "2")]
        channels: u16,
    },
}

fn main() {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Trigger { cmd } => run_trigger(cmd),
        Command::Position { host, dai } => run_position(host, dai),
        Command::Params { direction, rate, channels } => run_params(direction, rate, channels),
    };

    if let Err(err) = result {
        eprintln!("demo failed: {err:#}");
        std::process::exit(1);
    }
}

fn run_trigger(cmd: StreamTriggerCmd) -> anyhow::Result<()> {
    let record = StreamTrigger {
        id: 0,
        trigger_cmd: cmd as u32,
    };
    let action_id = wire::make_action_id(0, 0, STREAM_ACTION_TRIGGER as u8);

    let mut wire = [0u8; 64];
    let n = tup_codec::pack(&STREAM_REGISTRY, action_id, bytemuck::bytes_of(&record), &mut wire, 0, 0)?;
    info!("packed stream_trigger into {} bytes: {}", n, hex(&wire[..n]));

    let mut decoded = StreamTrigger::default();
    let (decoded_action, dest_addr) =
        tup_codec::unpack(&STREAM_REGISTRY, &wire[..n], bytemuck::bytes_of_mut(&mut decoded))?;
    info!(
        "unpacked action 0x{:06x} (dest_addr {}): {:?}",
        decoded_action, dest_addr, decoded
    );
    Ok(())
}

fn run_position(host: u32, dai: u32) -> anyhow::Result<()> {
    let record = StreamPosition { id: 0, host, dai };
    let action_id = wire::make_action_id(0, 0, STREAM_ACTION_POSITION as u8);

    let mut wire = [0u8; 64];
    let n = tup_codec::pack(&STREAM_REGISTRY, action_id, bytemuck::bytes_of(&record), &mut wire, 0, 0)?;
    info!("packed stream_position into {} bytes: {}", n, hex(&wire[..n]));

    let mut decoded = StreamPosition::default();
    let (decoded_action, dest_addr) =
        tup_codec::unpack(&STREAM_REGISTRY, &wire[..n], bytemuck::bytes_of_mut(&mut decoded))?;
    info!(
        "unpacked action 0x{:06x} (dest_addr {}): {:?}",
        decoded_action, dest_addr, decoded
    );
    Ok(())
}

fn run_params(direction: StreamDirection, rate: u32, channels: u16) -> anyhow::Result<()> {
    let mut record = StreamParams {
        id: 0,
        direction: direction as u32,
        rate,
        stream_tag: 1,
        channels,
        ..StreamParams::default()
    };
    for (i, chmap) in record.chmap.iter_mut().enumerate() {
        *chmap = StreamChmap {
            id: i as u32,
            name: [b'c', b'h', b'0' + i as u8, 0],
            color: [StreamColor { a: i as u32, b: 0 }, StreamColor { a: 0, b: i as u32 }],
        };
    }
    let action_id = wire::make_action_id(0, 0, STREAM_ACTION_PARAMS as u8);

    let mut wire = [0u8; 512];
    let n = tup_codec::pack(&STREAM_REGISTRY, action_id, bytemuck::bytes_of(&record), &mut wire, 0, 0)?;
    info!("packed stream_params into {} bytes: {}", n, hex(&wire[..n]));

    let mut decoded = StreamParams::default();
    let (decoded_action, dest_addr) =
        tup_codec::unpack(&STREAM_REGISTRY, &wire[..n], bytemuck::bytes_of_mut(&mut decoded))?;
    info!(
        "unpacked action 0x{:06x} (dest_addr {}): {:?}",
        decoded_action, dest_addr, decoded
    );
    Ok(())
}

fn hex(buf: &[u8]) -> String {
    buf.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ")
}
