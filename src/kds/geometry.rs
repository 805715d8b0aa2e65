/*!
kds::geometry - The per-value POINT-Z geometry header (§3, §4.D): a fixed
48-byte record written once per row into a geometry column's payload, plus
the inverse: parsing the source well-known-binary record the aggregation
engine hands us.

Layout (byte-exact, §3)
=======================
```text
offset  size  field
0       4     type code (u32 LE) — always TYPE_POINT
4       2     flags (u16 LE) — bit 0 = has-Z
6       2     padding
8       4     spatial reference identifier (i32 LE)
12      4     inline item count (u32 LE) — always 1
16      4     raw payload size (u32 LE) — always 24
20      4     padding (aligns the coordinates to 8 bytes)
24      8     x (f64 LE)
32      8     y (f64 LE)
40      8     z (f64 LE)
```
*/

/// Total size of one geometry header+coordinates block.
pub const GEOM_HEADER_LEN: usize = 48;

/// The only type code this core ever emits (WKB point).
pub const TYPE_POINT: u32 = 1;

/// Set in `flags` when the point carries a Z coordinate — always set,
/// since this core is 3-D-point-only (§1 Non-goals).
pub const FLAG_HAS_Z: u16 = 1;

/// Inline item count is always exactly one point per header.
pub const NITEMS: u32 = 1;

/// Raw payload size is always the three 8-byte coordinates.
pub const RAWSIZE: u32 = 24;

/// Spatial reference identifier used when a geometry column's descriptor
/// carries no explicit SRID (§4.D: "a sentinel value is used when
/// absent"). 0 is the conventional "unknown/unspecified" SRID.
pub const SENTINEL_SRID: i32 = 0;

/// Write one 48-byte geometry header+coordinates block at `buf[0..48]`.
pub fn write_point_header(buf: &mut [u8], srid: i32, x: f64, y: f64, z: f64) {
    debug_assert!(buf.len() >= GEOM_HEADER_LEN);
    buf[0..4].copy_from_slice(&TYPE_POINT.to_le_bytes());
    buf[4..6].copy_from_slice(&FLAG_HAS_Z.to_le_bytes());
    buf[6..8].copy_from_slice(&[0u8; 2]);
    buf[8..12].copy_from_slice(&srid.to_le_bytes());
    buf[12..16].copy_from_slice(&NITEMS.to_le_bytes());
    buf[16..20].copy_from_slice(&RAWSIZE.to_le_bytes());
    buf[20..24].copy_from_slice(&[0u8; 4]);
    buf[24..32].copy_from_slice(&x.to_le_bytes());
    buf[32..40].copy_from_slice(&y.to_le_bytes());
    buf[40..48].copy_from_slice(&z.to_le_bytes());
}

/// Read back a 48-byte geometry header+coordinates block. Used by the
/// round-trip tests; the bridge itself never needs to read its own output.
#[cfg(test)]
pub fn read_point_header(buf: &[u8]) -> (u32, u16, i32, u32, u32, f64, f64, f64) {
    let type_code = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    let flags = u16::from_le_bytes(buf[4..6].try_into().unwrap());
    let srid = i32::from_le_bytes(buf[8..12].try_into().unwrap());
    let nitems = u32::from_le_bytes(buf[12..16].try_into().unwrap());
    let rawsize = u32::from_le_bytes(buf[16..20].try_into().unwrap());
    let x = f64::from_le_bytes(buf[24..32].try_into().unwrap());
    let y = f64::from_le_bytes(buf[32..40].try_into().unwrap());
    let z = f64::from_le_bytes(buf[40..48].try_into().unwrap());
    (type_code, flags, srid, nitems, rawsize, x, y, z)
}

/// Minimum well-known-binary record length this core accepts: 1 byte
/// byte-order + 4 bytes type + 3 * 8 bytes of coordinates.
pub const MIN_WKB_LEN: usize = 1 + 4 + 24;

/// Parse a source geometry payload: skip byte-order and type, then read
/// three little-endian `f64`s. Returns `None` if the payload is shorter
/// than `MIN_WKB_LEN`, per §4.D's "treated as if the row were null."
pub fn parse_wkb_point(payload: &[u8]) -> Option<(f64, f64, f64)> {
    if payload.len() < MIN_WKB_LEN {
        return None;
    }
    let base = 5; // 1 byte-order + 4 type
    let x = f64::from_le_bytes(payload[base..base + 8].try_into().unwrap());
    let y = f64::from_le_bytes(payload[base + 8..base + 16].try_into().unwrap());
    let z = f64::from_le_bytes(payload[base + 16..base + 24].try_into().unwrap());
    Some((x, y, z))
}
