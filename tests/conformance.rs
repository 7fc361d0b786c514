//! End-to-end scenarios run through the public `pack`/`unpack` API: the
//! ones not already exercised as unit tests alongside the engines
//! themselves (single-scalar round-trip, truncation, and out-of-range
//! rejection live in `src/unpack.rs`'s own test module).

use tup_codec::schema::{
    ActionDef, ActionStructDesc, ClassDef, Elem, ElemSet, Registry, SubclassDef, TupleDataType,
};
use tup_codec::wire::make_action_id;
use tup_codec::{pack, unpack};

fn registry_of(desc: &'static ActionStructDesc, action_id: u32) -> Registry {
    let actions: &'static [ActionDef] = Box::leak(Box::new([ActionDef { action_id, desc }]));
    let subclasses: &'static [SubclassDef] = Box::leak(Box::new([SubclassDef { id: 0, actions }]));
    let classes: &'static [ClassDef] = Box::leak(Box::new([ClassDef { id: 0, subclasses }]));
    Registry { classes }
}

// Forward compatibility: a record packed under a schema with an extra
// trailing field unpacks cleanly under a schema that doesn't know it, and
// leaves the corresponding destination bytes untouched.
#[test]
fn unknown_trailing_field_is_dropped_without_touching_its_destination_bytes() {
    const ACTION_ID: u32 = make_action_id(1, 0, 0);

    static WIDE_FIELDS: [Elem; 3] = [
        Elem { id: 0, ty: TupleDataType::Uint32, offset: 0, value1: 0, value2: u32::MAX as u64 },
        Elem { id: 1, ty: TupleDataType::Uint32, offset: 4, value1: 0, value2: u32::MAX as u64 },
        Elem { id: 2, ty: TupleDataType::Uint32, offset: 8, value1: 0, value2: u32::MAX as u64 },
    ];
    static WIDE_DESC: ActionStructDesc = ActionStructDesc {
        size: 12,
        offset: 0,
        array_elems: 0,
        tuple_id: 0,
        mandatory: ElemSet(&WIDE_FIELDS),
        optional: ElemSet::EMPTY,
        children: &[],
    };

    static NARROW_FIELDS: [Elem; 2] = [
        Elem { id: 0, ty: TupleDataType::Uint32, offset: 0, value1: 0, value2: u32::MAX as u64 },
        Elem { id: 1, ty: TupleDataType::Uint32, offset: 4, value1: 0, value2: u32::MAX as u64 },
    ];
    static NARROW_DESC: ActionStructDesc = ActionStructDesc {
        size: 8,
        offset: 0,
        array_elems: 0,
        tuple_id: 0,
        mandatory: ElemSet(&NARROW_FIELDS),
        optional: ElemSet::EMPTY,
        children: &[],
    };

    let wide = registry_of(&WIDE_DESC, ACTION_ID);
    let narrow = registry_of(&NARROW_DESC, ACTION_ID);

    let src: [u32; 3] = [10, 20, 30];
    let src_bytes =
        unsafe { std::slice::from_raw_parts(src.as_ptr() as *const u8, std::mem::size_of_val(&src)) };

    let mut wire = [0u8; 64];
    let n = pack(&wide, ACTION_ID, src_bytes, &mut wire, 0, 0).unwrap();

    let mut dest = [0xAAu8; 12];
    let (action_id, _) = unpack(&narrow, &wire[..n], &mut dest).unwrap();
    assert_eq!(action_id, ACTION_ID);

    assert_eq!(u32::from_le_bytes(dest[0..4].try_into().unwrap()), 10);
    assert_eq!(u32::from_le_bytes(dest[4..8].try_into().unwrap()), 20);
    // id=2 isn't in NARROW_DESC: its destination bytes are never touched.
    assert_eq!(&dest[8..12], &[0xAA; 4]);
}

// Mask check: a value with bits outside the permitted mask is rejected;
// a value within the mask round-trips.
#[test]
fn mask_violation_is_rejected_and_permitted_bits_round_trip() {
    const ACTION_ID: u32 = make_action_id(1, 0, 1);

    static FIELDS: [Elem; 1] =
        [Elem { id: 0, ty: TupleDataType::Uint16Mask, offset: 0, value1: 0x000F, value2: 0 }];
    static DESC: ActionStructDesc = ActionStructDesc {
        size: 2,
        offset: 0,
        array_elems: 0,
        tuple_id: 0,
        mandatory: ElemSet(&FIELDS),
        optional: ElemSet::EMPTY,
        children: &[],
    };
    let registry = registry_of(&DESC, ACTION_ID);

    let good: u16 = 0x000A;
    let mut wire = [0u8; 32];
    let n = pack(&registry, ACTION_ID, &good.to_le_bytes(), &mut wire, 0, 0).unwrap();
    let mut dest = [0u8; 2];
    unpack(&registry, &wire[..n], &mut dest).unwrap();
    assert_eq!(u16::from_le_bytes(dest), good);

    // Tamper the packed payload: set a bit outside the 0x000F mask.
    let data_start = n - 2;
    wire[data_start..n].copy_from_slice(&0x0010u16.to_le_bytes());
    let mut dest = [0u8; 2];
    let err = unpack(&registry, &wire[..n], &mut dest).unwrap_err();
    assert!(matches!(err, tup_codec::TupError::MaskViolation { .. }));
}

// Nested sub-action: a TUPLE_ARRAY of count=2 inner {id, name} records
// round-trips through pack/unpack.
#[test]
fn nested_tuple_array_round_trips() {
    const ACTION_ID: u32 = make_action_id(1, 0, 2);

    static ITEM_FIELDS: [Elem; 2] = [
        Elem { id: 0, ty: TupleDataType::Uint32, offset: 0, value1: 0, value2: u32::MAX as u64 },
        Elem { id: 1, ty: TupleDataType::String, offset: 4, value1: 0, value2: 4 },
    ];
    static ITEM_DESC: ActionStructDesc = ActionStructDesc {
        size: 8,
        offset: 4, // items[] starts right after the outer header_id field
        array_elems: 2,
        tuple_id: 5,
        mandatory: ElemSet(&ITEM_FIELDS),
        optional: ElemSet::EMPTY,
        children: &[],
    };
    static OUTER_FIELDS: [Elem; 1] =
        [Elem { id: 0, ty: TupleDataType::Uint32, offset: 0, value1: 0, value2: u32::MAX as u64 }];
    static CHILDREN: [ActionStructDesc; 1] = [ITEM_DESC];
    static OUTER_DESC: ActionStructDesc = ActionStructDesc {
        size: 4 + 2 * 8,
        offset: 0,
        array_elems: 0,
        tuple_id: 0,
        mandatory: ElemSet(&OUTER_FIELDS),
        optional: ElemSet::EMPTY,
        children: &CHILDREN,
    };
    let registry = registry_of(&OUTER_DESC, ACTION_ID);

    #[repr(C)]
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    struct Item {
        id: u32,
        name: [u8; 4],
    }
    #[repr(C)]
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    struct Outer {
        header_id: u32,
        items: [Item; 2],
    }

    let src = Outer {
        header_id: 7,
        items: [
            Item { id: 1, name: *b"left" },
            Item { id: 2, name: *b"righ" },
        ],
    };
    let src_bytes = unsafe {
        std::slice::from_raw_parts((&src as *const Outer) as *const u8, std::mem::size_of::<Outer>())
    };

    let mut wire = [0u8; 64];
    let n = pack(&registry, ACTION_ID, src_bytes, &mut wire, 0, 0).unwrap();

    let mut out = Outer::default();
    let out_bytes = unsafe {
        std::slice::from_raw_parts_mut((&mut out as *mut Outer) as *mut u8, std::mem::size_of::<Outer>())
    };
    let (action_id, _) = unpack(&registry, &wire[..n], out_bytes).unwrap();
    assert_eq!(action_id, ACTION_ID);
    assert_eq!(out, src);
}

// TooDeep: nesting past the schema's MAX_DEPTH cap is rejected outright,
// exercised directly against the recursive resolver rather than by hand
// building eleven levels of static descriptors.
#[test]
fn exceeding_depth_cap_is_rejected() {
    use tup_codec::schema::MAX_DEPTH;

    static LEAF: ActionStructDesc = ActionStructDesc {
        size: 4,
        offset: 0,
        array_elems: 1,
        tuple_id: 9,
        mandatory: ElemSet::EMPTY,
        optional: ElemSet::EMPTY,
        children: &[],
    };
    assert!(LEAF.get_child_desc(9, MAX_DEPTH + 1).is_none());
    assert!(LEAF.get_child_desc(9, 0).is_none()); // no children at all here
}
