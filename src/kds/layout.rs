/*!
kds::layout - Byte-exact constants and sizing helpers for the KDS buffer
(§3). Treated as an ABI contract with the external accelerator runtime
(§6, §9) — nothing here is negotiable at runtime.

Header
======
```text
offset  size  field
0       4     total length (u32 LE)
4       2     format tag (u16 LE) — always FORMAT_TAG_COLUMNAR
6       2     column count (u16 LE)
8       4     capacity, in rows (u32 LE)
12      4     actual row count (u32 LE)
16      ..    column offset table: one u32 LE per column
```
The header region (fixed fields + offset table) is padded up to
`MAX_ALIGN`; every column region that follows is independently padded to
`MAX_ALIGN` as well.
*/

/// The platform's maximum scalar alignment, matching `max_align_t` on the
/// common 64-bit targets the accelerator runtime ships for.
pub const MAX_ALIGN: usize = 16;

/// Fixed-size portion of the header, before the per-column offset table.
pub const HEADER_FIXED_SIZE: usize = 16;

/// The only format tag this core ever emits or recognizes.
pub const FORMAT_TAG_COLUMNAR: u16 = 1;

/// Round `n` up to the next multiple of `MAX_ALIGN`.
pub const fn max_align(n: usize) -> usize {
    (n + MAX_ALIGN - 1) / MAX_ALIGN * MAX_ALIGN
}

/// Size of the validity bitmap region for `nrows` rows: `ceil(nrows/64)`
/// 64-bit words, max-aligned.
pub const fn validity_bytes(nrows: usize) -> usize {
    max_align(nrows.div_ceil(64) * 8)
}

/// Size of the header region: fixed fields plus one `u32` offset per
/// column, max-aligned.
pub const fn header_region_size(ncols: usize) -> usize {
    max_align(HEADER_FIXED_SIZE + 4 * ncols)
}

/// Size of one fixed-width column's region (validity + data).
pub const fn fixed_column_size(nrows: usize, typlen: usize) -> usize {
    validity_bytes(nrows) + max_align(nrows * typlen)
}

/// Size of one geometry column's region (validity + offsets + payload).
pub const fn geometry_column_size(nrows: usize) -> usize {
    validity_bytes(nrows) + max_align((nrows + 1) * 4) + max_align(nrows * super::geometry::GEOM_HEADER_LEN)
}

/// Byte offsets of the fixed header fields.
pub mod header_field {
    pub const TOTAL_LEN: usize = 0;
    pub const FORMAT_TAG: usize = 4;
    pub const COLUMN_COUNT: usize = 6;
    pub const CAPACITY_ROWS: usize = 8;
    pub const ACTUAL_ROWS: usize = 12;
    pub const OFFSET_TABLE: usize = 16;
}
