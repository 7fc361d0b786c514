//! In-memory schema model: class -> subclass -> action -> descriptor tree.
//!
//! Registries are plain `'static` data built by the application at compile
//! time; the codec only ever reads them. Resolvers are linear scans —
//! descriptor tables are tiny and hot.

use crate::error::{Result, TupError};
use crate::tuple::Tuple;
use crate::wire::MAX_TUPLE_ID;

/// Maximum descent through nested (TUPLE_ARRAY) sub-records.
pub const MAX_DEPTH: u32 = 10;

/// A schema's value type for one tuple element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleDataType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Double,
    Uint8Mask,
    Uint16Mask,
    Uint32Mask,
    Uint64Mask,
    Enum,
    Boolean,
    String,
    Uuid,
    Data,
}

/// The two wire containers a scalar elem can travel in, used to decide
/// whether adjacent elems can continuous-ID-compress — see `arrayable_with`
/// for the exact rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayShape {
    Micro,
    Std,
}

impl TupleDataType {
    /// STD for 32/64-bit scalar/enum/float/double/uuid/string/data, MICRO
    /// for 8/16-bit scalar/mask/boolean.
    pub fn shape(self) -> ArrayShape {
        use TupleDataType::*;
        match self {
            Int8 | Uint8 | Uint8Mask | Int16 | Uint16 | Uint16Mask | Boolean => ArrayShape::Micro,
            _ => ArrayShape::Std,
        }
    }

    /// In-memory (record field) width in bytes. For string/data this needs
    /// the elem's `value2` (max length).
    pub fn native_width(self, value2: u64) -> u32 {
        use TupleDataType::*;
        match self {
            Int8 | Uint8 | Uint8Mask => 1,
            Int16 | Uint16 | Uint16Mask | Boolean => 2,
            Int32 | Uint32 | Uint32Mask | Enum | Float => 4,
            Int64 | Uint64 | Uint64Mask | Double => 8,
            Uuid => 16,
            String | Data => value2 as u32,
        }
    }

    /// On-wire data width in bytes: 8/16-bit scalars travel inside a 2-byte
    /// MICRO slot; everything else matches its native width.
    pub fn wire_width(self, value2: u64) -> u32 {
        match self.shape() {
            ArrayShape::Micro => 2,
            ArrayShape::Std => self.native_width(value2),
        }
    }

    /// Only same-width, same-shape neighbors are eligible to continuous-ID
    /// compress into one array tuple (see ArrayShape doc). MICRO-shape
    /// neighbors always share a width (the 2-byte wire slot); STD-shape
    /// neighbors must additionally agree on native width, since that width
    /// becomes the array's uniform element size on the wire.
    pub fn arrayable_with(self, other: TupleDataType, self_v2: u64, other_v2: u64) -> bool {
        self.shape() == other.shape() && self.native_width(self_v2) == other.native_width(other_v2)
    }

    /// Which wire array shape a continuous run of this type (at this
    /// width) uses: STD_ARRAY only for the common 4-byte case, VAR_ARRAY
    /// for any other uniform STD-shape width (doubles, uuids, fixed-length
    /// strings), MICRO_ARRAY for MICRO-shape.
    pub fn array_kind(self, value2: u64) -> ArrayKind {
        match self.shape() {
            ArrayShape::Micro => ArrayKind::Micro,
            ArrayShape::Std if self.native_width(value2) == 4 => ArrayKind::Std4,
            ArrayShape::Std => ArrayKind::Var(self.native_width(value2)),
        }
    }
}

/// The concrete wire array tuple a run of same-shape elems collapses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    Micro,
    Std4,
    Var(u32),
}

/// A schema entry binding a tuple id to an in-memory field.
#[derive(Debug, Clone, Copy)]
pub struct Elem {
    pub id: u16,
    pub ty: TupleDataType,
    pub offset: u32,
    /// Min for numeric values, permitted-bit mask for masks, unused for
    /// string/data/uuid.
    pub value1: u64,
    /// Max for numeric values, max length for string/data, unused for masks/uuid.
    pub value2: u64,
}

impl Elem {
    pub fn native_width(&self) -> u32 {
        self.ty.native_width(self.value2)
    }

    pub fn wire_width(&self) -> u32 {
        self.ty.wire_width(self.value2)
    }

    pub fn validate_id(&self) -> Result<()> {
        if self.id > MAX_TUPLE_ID {
            return Err(TupError::InvalidArgument("elem id exceeds 0x1FFF"));
        }
        Ok(())
    }
}

/// A set of elems sharing similar treatment (mandatory or optional).
#[derive(Debug, Clone, Copy)]
pub struct ElemSet(pub &'static [Elem]);

impl ElemSet {
    pub const EMPTY: ElemSet = ElemSet(&[]);

    fn find(&self, id: u16) -> Option<&'static Elem> {
        self.0.iter().find(|e| e.id == id)
    }
}

/// Schema tree node for one action, or one nested sub-record within it.
#[derive(Debug, Clone, Copy)]
pub struct ActionStructDesc {
    /// Size, in bytes, of the C-like record this descriptor maps.
    pub size: u32,
    /// Offset of this sub-record within its parent record, if nested.
    pub offset: u32,
    /// Element count if this descriptor describes one element of an
    /// inline array of sub-records in the parent, 0 otherwise.
    pub array_elems: u32,
    /// Tuple id this descriptor is carried under when it is a *child* of
    /// another descriptor (i.e. nested): the parent emits/reads a single
    /// TUPLE_ARRAY tuple at this id whose `array_elems` inner tuples are
    /// each packed/unpacked against this descriptor. Meaningless for a
    /// root descriptor reached directly via `get_action_def`.
    pub tuple_id: u16,
    pub mandatory: ElemSet,
    pub optional: ElemSet,
    pub children: &'static [ActionStructDesc],
}

impl ActionStructDesc {
    /// Lowest-id elem across mandatory ∪ optional, mandatory preferred on
    /// ties.
    pub fn first_elem(&self) -> Option<&'static Elem> {
        let mut best: Option<&'static Elem> = None;
        for e in self.mandatory.0.iter().chain(self.optional.0.iter()) {
            if best.map_or(true, |b| e.id < b.id) {
                best = Some(e);
            }
        }
        best
    }

    /// Next elem by ascending id strictly after `current.id`.
    pub fn next_elem(&self, current: &Elem) -> Option<&'static Elem> {
        let mut best: Option<&'static Elem> = None;
        for e in self.mandatory.0.iter().chain(self.optional.0.iter()) {
            if e.id > current.id && best.map_or(true, |b| e.id < b.id) {
                best = Some(e);
            }
        }
        best
    }

    /// One position in this descriptor's pack ordering: either a scalar
    /// elem or a nested child descriptor carried as a TUPLE_ARRAY.
    pub fn first_item(&self) -> Option<PackItem> {
        self.item_after(None)
    }

    pub fn next_item(&self, current_id: u16) -> Option<PackItem> {
        self.item_after(Some(current_id))
    }

    fn item_after(&self, after: Option<u16>) -> Option<PackItem> {
        let mut best: Option<PackItem> = None;
        let candidates = self
            .mandatory
            .0
            .iter()
            .map(PackItem::Elem)
            .chain(self.optional.0.iter().map(PackItem::Elem))
            .chain(self.children.iter().map(PackItem::Child));
        for item in candidates {
            let id = item.id();
            let ok = match after {
                Some(a) => id > a,
                None => true,
            };
            if ok && best.map_or(true, |b| id < b.id()) {
                best = Some(item);
            }
        }
        best
    }

    /// Resolves `tuple.id + index` against this descriptor's elems, then
    /// recursively against every child descriptor. Unknown ids are not an
    /// error — the caller drops them for forward compatibility.
    pub fn get_tuple_elem(&self, tuple: &Tuple, index: u32, depth: u32) -> Option<&'static Elem> {
        if depth > MAX_DEPTH {
            return None;
        }
        let wanted = tuple.id().checked_add(index as u16)?;
        if let Some(e) = self.mandatory.find(wanted) {
            return Some(e);
        }
        if let Some(e) = self.optional.find(wanted) {
            return Some(e);
        }
        for child in self.children {
            if let Some(e) = child.get_tuple_elem(tuple, index, depth + 1) {
                return Some(e);
            }
        }
        None
    }

    /// Resolves a TUPLE_ARRAY wire id to the child descriptor that
    /// describes its nested instances, searching this descriptor's direct
    /// children first, then descending (depth-capped, like
    /// `get_tuple_elem`).
    pub fn get_child_desc(&self, tuple_id: u16, depth: u32) -> Option<&'static ActionStructDesc> {
        if depth > MAX_DEPTH {
            return None;
        }
        for child in self.children {
            if child.tuple_id == tuple_id {
                return Some(child);
            }
        }
        for child in self.children {
            if let Some(d) = child.get_child_desc(tuple_id, depth + 1) {
                return Some(d);
            }
        }
        None
    }
}

/// One position pack walks in ascending id order: a plain scalar field, or
/// a nested sub-record descriptor carried as a TUPLE_ARRAY.
#[derive(Debug, Clone, Copy)]
pub enum PackItem {
    Elem(&'static Elem),
    Child(&'static ActionStructDesc),
}

impl PackItem {
    pub fn id(&self) -> u16 {
        match self {
            PackItem::Elem(e) => e.id,
            PackItem::Child(c) => c.tuple_id,
        }
    }
}

/// `{ action_id, descriptor }`.
#[derive(Debug, Clone, Copy)]
pub struct ActionDef {
    pub action_id: u32,
    pub desc: &'static ActionStructDesc,
}

#[derive(Debug, Clone, Copy)]
pub struct SubclassDef {
    pub id: u8,
    pub actions: &'static [ActionDef],
}

#[derive(Debug, Clone, Copy)]
pub struct ClassDef {
    pub id: u8,
    pub subclasses: &'static [SubclassDef],
}

/// Process-wide, read-only schema registry: no locks on the hot path,
/// install once before any codec call.
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    pub classes: &'static [ClassDef],
}

impl Registry {
    pub fn get_class(&self, class: u8) -> Result<&'static ClassDef> {
        self.classes
            .iter()
            .find(|c| c.id == class)
            .ok_or(TupError::UnknownClass(class))
    }

    pub fn get_subclass(&self, class: &ClassDef, subclass: u8) -> Result<&'static SubclassDef> {
        class
            .subclasses
            .iter()
            .find(|s| s.id == subclass)
            .ok_or(TupError::UnknownSubclass(subclass))
    }

    pub fn get_action(&self, subclass: &SubclassDef, action_id: u32) -> Result<&'static ActionDef> {
        subclass
            .actions
            .iter()
            .find(|a| a.action_id == action_id)
            .ok_or(TupError::UnknownAction(action_id))
    }

    /// Composes `get_class`/`get_subclass`/`get_action` from a 24-bit
    /// action identifier.
    pub fn get_action_def(&self, action_id: u32) -> Result<&'static ActionDef> {
        let class = self.get_class(crate::wire::action_class(action_id))?;
        let subclass = self.get_subclass(class, crate::wire::action_subclass(action_id))?;
        self.get_action(subclass, action_id)
    }
}

// Schema declaration sugar: the tree below is meant to be declared by the
// application as a static table. Plain struct literals work fine (see the
// pack/unpack test registries), these macros just cut the boilerplate of
// writing one out by hand.

/// `elems![ 10 => Uint32[offset, min, max], 11 => Uint8Mask[offset, mask, 0] ]`.
macro_rules! elems {
    ( $( $id:expr => $ty:ident [ $offset:expr, $v1:expr, $v2:expr ] ),* $(,)? ) => {
        &[
            $(
                $crate::schema::Elem {
                    id: $id,
                    ty: $crate::schema::TupleDataType::$ty,
                    offset: $offset,
                    value1: ($v1) as u64,
                    value2: ($v2) as u64,
                }
            ),*
        ]
    };
}
pub use elems;

/// A nested sub-record descriptor, carried under `tuple_id` as a
/// TUPLE_ARRAY of `array_elems` instances.
macro_rules! child {
    ($tuple_id:expr => {
        size: $size:expr, offset: $offset:expr, array_elems: $array_elems:expr,
        mandatory: $mandatory:expr, optional: $optional:expr $(, children: $children:expr)? $(,)?
    }) => {
        $crate::schema::ActionStructDesc {
            size: $size,
            offset: $offset,
            array_elems: $array_elems,
            tuple_id: $tuple_id,
            mandatory: $crate::schema::ElemSet($mandatory),
            optional: $crate::schema::ElemSet($optional),
            children: $crate::schema::child!(@children $($children)?),
        }
    };
    (@children) => { &[] };
    (@children $children:expr) => { $children };
}
pub use child;

/// `action![ action_id => { size: N, mandatory: [...], optional: [...], children: [...] } ]`.
macro_rules! action {
    ($action_id:expr => {
        size: $size:expr, mandatory: $mandatory:expr, optional: $optional:expr
        $(, children: $children:expr)? $(,)?
    }) => {
        $crate::schema::ActionDef {
            action_id: $action_id,
            desc: &$crate::schema::ActionStructDesc {
                size: $size,
                offset: 0,
                array_elems: 0,
                tuple_id: 0,
                mandatory: $crate::schema::ElemSet($mandatory),
                optional: $crate::schema::ElemSet($optional),
                children: $crate::schema::child!(@children $($children)?),
            },
        }
    };
}
pub use action;

/// `subclass![ id => [ action!(...), ... ] ]`.
macro_rules! subclass {
    ($id:expr => [ $( $action:expr ),* $(,)? ]) => {
        $crate::schema::SubclassDef { id: $id, actions: &[ $( $action ),* ] }
    };
}
pub use subclass;

/// `class![ id => [ subclass!(...), ... ] ]`.
macro_rules! class {
    ($id:expr => [ $( $subclass:expr ),* $(,)? ]) => {
        $crate::schema::ClassDef { id: $id, subclasses: &[ $( $subclass ),* ] }
    };
}
pub use class;
