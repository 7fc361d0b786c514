//! Round-trips the worked audio-stream schema (`demos/stream.rs`) through
//! the public codec, including its two levels of nested TUPLE_ARRAY
//! (`StreamParams` -> `chmap[]` -> `color[]`).

use tup_codec::wire::make_action_id;
use tup_codec::{pack, unpack};

#[path = "../demos/stream.rs"]
mod stream;

use stream::{
    StreamChmap, StreamColor, StreamParams, StreamPosition, StreamTrigger, StreamTriggerCmd,
    STREAM_ACTION_PARAMS, STREAM_ACTION_POSITION, STREAM_ACTION_TRIGGER, STREAM_REGISTRY,
};

#[test]
fn trigger_round_trips() {
    let src = StreamTrigger { id: 3, trigger_cmd: StreamTriggerCmd::Pause as u32 };
    let action_id = make_action_id(0, 0, STREAM_ACTION_TRIGGER as u8);

    let mut wire = [0u8; 64];
    let n = pack(&STREAM_REGISTRY, action_id, bytemuck::bytes_of(&src), &mut wire, 0, 0).unwrap();

    let mut out = StreamTrigger::default();
    let (decoded_action, dest_addr) =
        unpack(&STREAM_REGISTRY, &wire[..n], bytemuck::bytes_of_mut(&mut out)).unwrap();
    assert_eq!(decoded_action, action_id);
    assert_eq!(dest_addr, 0);
    assert_eq!(out, src);
}

#[test]
fn position_round_trips() {
    let src = StreamPosition { id: 1, host: 1000, dai: 998 };
    let action_id = make_action_id(0, 0, STREAM_ACTION_POSITION as u8);

    let mut wire = [0u8; 64];
    let n = pack(&STREAM_REGISTRY, action_id, bytemuck::bytes_of(&src), &mut wire, 0, 0).unwrap();

    let mut out = StreamPosition::default();
    unpack(&STREAM_REGISTRY, &wire[..n], bytemuck::bytes_of_mut(&mut out)).unwrap();
    assert_eq!(out, src);
}

#[test]
fn params_with_nested_chmap_and_color_round_trips() {
    let mut src = StreamParams {
        id: 0,
        direction: 0,
        rate: 44100,
        stream_tag: 2,
        channels: 2,
        ..StreamParams::default()
    };
    for (i, chmap) in src.chmap.iter_mut().enumerate() {
        *chmap = StreamChmap {
            id: i as u32,
            name: [b'c', b'0' + i as u8, 0, 0],
            color: [
                StreamColor { a: i as u32, b: i as u32 * 2 },
                StreamColor { a: i as u32 * 3, b: i as u32 * 4 },
            ],
        };
    }
    let action_id = make_action_id(0, 0, STREAM_ACTION_PARAMS as u8);

    let mut wire = [0u8; 512];
    let n = pack(&STREAM_REGISTRY, action_id, bytemuck::bytes_of(&src), &mut wire, 0, 0).unwrap();

    let mut out = StreamParams::default();
    let (decoded_action, _) =
        unpack(&STREAM_REGISTRY, &wire[..n], bytemuck::bytes_of_mut(&mut out)).unwrap();
    assert_eq!(decoded_action, action_id);
    assert_eq!(out, src);
}

#[test]
fn params_capture_direction_round_trips() {
    let src = StreamParams {
        id: 0,
        direction: 1,
        rate: 96000,
        stream_tag: 0,
        channels: 1,
        ..StreamParams::default()
    };
    let action_id = make_action_id(0, 0, STREAM_ACTION_PARAMS as u8);

    let mut wire = [0u8; 512];
    let n = pack(&STREAM_REGISTRY, action_id, bytemuck::bytes_of(&src), &mut wire, 0, 0).unwrap();

    let mut out = StreamParams::default();
    unpack(&STREAM_REGISTRY, &wire[..n], bytemuck::bytes_of_mut(&mut out)).unwrap();
    assert_eq!(out, src);
}
