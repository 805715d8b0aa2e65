/*!
arrow - The external Arrow-batch input model (§3): column descriptors,
per-column arrays, and the batch they make up. Ownership of every buffer
referenced here stays with the caller for the duration of one dispatch
(§3, §9) — the bridge never retains pointers past `dispatch::step`'s scope,
so every type in this module borrows rather than owns.
*/

/// Semantic column type (§3). `Int64` also covers microsecond timestamps —
/// the transcoder treats them identically, as plain 8-byte little-endian
/// integers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    PointZ,
}

impl ColumnType {
    /// Width in bytes of one fixed-width value. `None` for `PointZ`, which
    /// is variable-width (offsets + payload, §3).
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            ColumnType::Int16 => Some(2),
            ColumnType::Int32 => Some(4),
            ColumnType::Int64 => Some(8),
            ColumnType::Float32 => Some(4),
            ColumnType::Float64 => Some(8),
            ColumnType::PointZ => None,
        }
    }

    pub fn is_geometry(self) -> bool {
        matches!(self, ColumnType::PointZ)
    }
}

/// One column's static metadata. `srid` is only meaningful for `PointZ`
/// columns; `None` means the core substitutes a sentinel spatial reference
/// identifier (§4.D).
#[derive(Copy, Clone, Debug)]
pub struct ColumnDescriptor {
    pub ty: ColumnType,
    pub source_attr: u32,
    pub srid: Option<i32>,
}

impl ColumnDescriptor {
    pub fn fixed(ty: ColumnType, source_attr: u32) -> Self {
        debug_assert!(ty.fixed_width().is_some());
        ColumnDescriptor {
            ty,
            source_attr,
            srid: None,
        }
    }

    pub fn point_z(source_attr: u32, srid: i32) -> Self {
        ColumnDescriptor {
            ty: ColumnType::PointZ,
            source_attr,
            srid: Some(srid),
        }
    }
}

/// A validity bitmap: LSB-first, 64-bit-word granularity. `None` means
/// "all valid" (§3).
#[derive(Copy, Clone, Debug)]
pub struct Validity<'a>(pub Option<&'a [u64]>);

impl<'a> Validity<'a> {
    pub fn is_valid(&self, row: usize) -> bool {
        match self.0 {
            None => true,
            Some(words) => {
                let word = words[row / 64];
                (word >> (row % 64)) & 1 == 1
            }
        }
    }
}

/// One column's data, in the shape Arrow exposes it (§3): one buffer for
/// fixed-width types, or offsets+payload for variable-length geometry.
#[derive(Copy, Clone, Debug)]
pub enum ArrowData<'a> {
    /// Fixed-width values, `nrows * typlen` bytes. `None` means the Arrow
    /// array has no data buffer (every row implicitly invalid).
    Fixed(Option<&'a [u8]>),
    /// Variable-length: `nrows + 1` `i32` offsets into `payload`, where
    /// `payload[offsets[i]..offsets[i+1]]` is row `i`'s well-known-binary
    /// record.
    Varlen {
        offsets: &'a [i32],
        payload: &'a [u8],
    },
}

#[derive(Copy, Clone, Debug)]
pub struct ArrowArray<'a> {
    pub validity: Validity<'a>,
    pub data: ArrowData<'a>,
}

/// One incoming batch: parallel column descriptors and arrays, plus a
/// shared row count (§3).
pub struct ArrowBatch<'a> {
    pub columns: Vec<ColumnDescriptor>,
    pub arrays: Vec<ArrowArray<'a>>,
    pub nrows: usize,
}

impl<'a> ArrowBatch<'a> {
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }
}
