//! A worked audio-stream schema modeling a typical DSP stream-control
//! protocol: trigger/position/params actions for a playback or capture
//! stream. Outside the core codec's scope: used only by the demo binary
//! and integration tests.
//!
//! `StreamParams` in particular exercises nested TUPLE_ARRAY records two
//! levels deep — a channel map array, each entry itself carrying a small
//! array of "color" sub-records.

use memoffset::offset_of;
use tup_codec::schema::{child, class, elems, subclass, ActionStructDesc, ClassDef, ElemSet, Registry};

pub const STREAM_ACTION_PARAMS: u32 = 0;
pub const STREAM_ACTION_TRIGGER: u32 = 2;
pub const STREAM_ACTION_POSITION: u32 = 3;

pub const CHMAP_COLORS: usize = 2;
pub const CHMAP_NAME_LEN: usize = 4;
pub const PARAMS_CHANNELS: usize = 4;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StreamTrigger {
    pub id: u32,
    pub trigger_cmd: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StreamPosition {
    pub id: u32,
    pub host: u32,
    pub dai: u32,
}

/// Carries no real data of its own — exists purely to demonstrate a second
/// level of nested array processing under `StreamChmap`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StreamColor {
    pub a: u32,
    pub b: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StreamChmap {
    pub id: u32,
    pub name: [u8; CHMAP_NAME_LEN],
    pub color: [StreamColor; CHMAP_COLORS],
}

impl Default for StreamChmap {
    fn default() -> Self {
        StreamChmap {
            id: 0,
            name: [0; CHMAP_NAME_LEN],
            color: core::array::from_fn(|_| StreamColor::default()),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StreamParams {
    pub id: u32,
    pub direction: u32,
    pub rate: u32,
    pub stream_tag: u16,
    pub channels: u16,
    pub chmap: [StreamChmap; PARAMS_CHANNELS],
}

impl Default for StreamParams {
    fn default() -> Self {
        StreamParams {
            id: 0,
            direction: 0,
            rate: 0,
            stream_tag: 0,
            channels: 0,
            chmap: core::array::from_fn(|_| StreamChmap::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[repr(u32)]
pub enum StreamDirection {
    Playback = 0,
    Capture = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[repr(u32)]
pub enum StreamTriggerCmd {
    Start = 0,
    Stop = 1,
    Pause = 2,
    Release = 3,
}

static TRIGGER_ELEMS: &[tup_codec::schema::Elem] = elems![
    10 => Uint32[offset_of!(StreamTrigger, id) as u32, 0, 255],
    11 => Enum[offset_of!(StreamTrigger, trigger_cmd) as u32, 0, 3],
];
static TRIGGER_DESC: ActionStructDesc = ActionStructDesc {
    size: std::mem::size_of::<StreamTrigger>() as u32,
    offset: 0,
    array_elems: 0,
    tuple_id: 0,
    mandatory: ElemSet(TRIGGER_ELEMS),
    optional: ElemSet::EMPTY,
    children: &[],
};

static POSITION_ELEMS: &[tup_codec::schema::Elem] = elems![
    0 => Uint32[offset_of!(StreamPosition, id) as u32, 0, 255],
    1 => Uint32[offset_of!(StreamPosition, dai) as u32, 0, u32::MAX],
    2 => Uint32[offset_of!(StreamPosition, host) as u32, 0, u32::MAX],
];
static POSITION_DESC: ActionStructDesc = ActionStructDesc {
    size: std::mem::size_of::<StreamPosition>() as u32,
    offset: 0,
    array_elems: 0,
    tuple_id: 0,
    mandatory: ElemSet(POSITION_ELEMS),
    optional: ElemSet::EMPTY,
    children: &[],
};

// StreamParams -> chmap[PARAMS_CHANNELS] -> color[CHMAP_COLORS]: two levels
// of nested TUPLE_ARRAY, each level with its own small, independent id space
// (a child descriptor's ids only need to be unique among its own siblings,
// see schema::ActionStructDesc::get_tuple_elem).

static COLOR_ELEMS: &[tup_codec::schema::Elem] = elems![
    0 => Uint32[offset_of!(StreamColor, a) as u32, 0, u32::MAX],
    1 => Uint32[offset_of!(StreamColor, b) as u32, 0, u32::MAX],
];
static COLOR_DESC: ActionStructDesc = child!(2 => {
    size: std::mem::size_of::<StreamColor>() as u32,
    offset: offset_of!(StreamChmap, color) as u32,
    array_elems: CHMAP_COLORS as u32,
    mandatory: COLOR_ELEMS,
    optional: ElemSet::EMPTY.0,
});

static CHMAP_ELEMS: &[tup_codec::schema::Elem] = elems![
    0 => Uint32[offset_of!(StreamChmap, id) as u32, 0, PARAMS_CHANNELS as u64 - 1],
    1 => String[offset_of!(StreamChmap, name) as u32, 0, CHMAP_NAME_LEN as u64],
];
static CHMAP_CHILDREN: &[ActionStructDesc] = &[COLOR_DESC];
static CHMAP_DESC: ActionStructDesc = child!(11 => {
    size: std::mem::size_of::<StreamChmap>() as u32,
    offset: offset_of!(StreamParams, chmap) as u32,
    array_elems: PARAMS_CHANNELS as u32,
    mandatory: CHMAP_ELEMS,
    optional: ElemSet::EMPTY.0,
    children: CHMAP_CHILDREN,
});

static PARAMS_MANDATORY: &[tup_codec::schema::Elem] = elems![
    0 => Uint32[offset_of!(StreamParams, id) as u32, 0, 255],
    1 => Enum[offset_of!(StreamParams, direction) as u32, 0, 1],
    3 => Uint32[offset_of!(StreamParams, rate) as u32, 8000, 192000],
];
static PARAMS_OPTIONAL: &[tup_codec::schema::Elem] = elems![
    9 => Uint16[offset_of!(StreamParams, stream_tag) as u32, 0, u16::MAX as u64],
    2 => Uint16[offset_of!(StreamParams, channels) as u32, 1, 8],
];
static PARAMS_CHILDREN: &[ActionStructDesc] = &[CHMAP_DESC];
static PARAMS_DESC: ActionStructDesc = ActionStructDesc {
    size: std::mem::size_of::<StreamParams>() as u32,
    offset: 0,
    array_elems: 0,
    tuple_id: 0,
    mandatory: ElemSet(PARAMS_MANDATORY),
    optional: ElemSet(PARAMS_OPTIONAL),
    children: PARAMS_CHILDREN,
};

static CLASSES: &[ClassDef] = &[class!(0 => [
    subclass!(0 => [
        tup_codec::schema::ActionDef { action_id: STREAM_ACTION_PARAMS, desc: &PARAMS_DESC },
        tup_codec::schema::ActionDef { action_id: STREAM_ACTION_TRIGGER, desc: &TRIGGER_DESC },
        tup_codec::schema::ActionDef { action_id: STREAM_ACTION_POSITION, desc: &POSITION_DESC },
    ]),
])];

pub static STREAM_REGISTRY: Registry = Registry { classes: CLASSES };
