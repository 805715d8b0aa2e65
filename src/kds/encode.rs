/*!
kds::encode - The Arrow→KDS transcoder (§4.D), component D. Builds one
contiguous, zero-initialized KDS buffer from an `ArrowBatch`.

Zero-init is load-bearing (§4.D): uninitialized bytes reachable by the
accelerator would be a correctness hazard, not just a performance one, so
`encode` always starts from a zeroed buffer rather than
`Vec::with_capacity` + `set_len`.

The initial allocation goes through `try_reserve_exact` rather than a plain
`vec![0u8; total]`, so a batch whose sizing pass computes an unreservable
byte count surfaces as `BridgeError::AllocationFailed` — caught by
`dispatch::try_accelerate` and turned into a CPU fallback like any other
transcoding failure — instead of aborting the process.
*/

use crate::arrow::{ArrowArray, ArrowData, ColumnDescriptor};
use crate::error::{BridgeError, Result};
use crate::kds::geometry::{self, GEOM_HEADER_LEN};
use crate::kds::layout::{self, header_field};

/// An owned, byte-exact KDS buffer (§3). The only way to obtain one is
/// `encode`; callers hand `as_bytes()` to the accelerator's `submit` entry
/// point and drop the `KdsBuffer` when the dispatch scope ends (§5, §9).
pub struct KdsBuffer {
    bytes: Vec<u8>,
}

impl KdsBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }
}

/// Compute the byte size of the full KDS allocation for `columns` over
/// `nrows` rows (§4.D's "sizing pass").
fn total_size(columns: &[ColumnDescriptor], nrows: usize) -> usize {
    let mut size = layout::header_region_size(columns.len());
    for col in columns {
        size += match col.ty.fixed_width() {
            Some(typlen) => layout::fixed_column_size(nrows, typlen),
            None => layout::geometry_column_size(nrows),
        };
    }
    size
}

/// Transcode one Arrow batch into a KDS buffer conforming byte-for-byte to
/// §3's layout.
pub fn encode(
    arrays: &[ArrowArray],
    columns: &[ColumnDescriptor],
    nrows: usize,
) -> Result<KdsBuffer> {
    debug_assert_eq!(arrays.len(), columns.len());

    let total = total_size(columns, nrows);
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(total)
        .map_err(|_| BridgeError::AllocationFailed(total))?;
    bytes.resize(total, 0u8);

    write_header(&mut bytes, columns, nrows, total);

    let mut cursor = layout::header_region_size(columns.len());
    for (i, (col, array)) in columns.iter().zip(arrays.iter()).enumerate() {
        let offset_slot = header_field::OFFSET_TABLE + 4 * i;
        bytes[offset_slot..offset_slot + 4].copy_from_slice(&(cursor as u32).to_le_bytes());

        let region_len = match col.ty.fixed_width() {
            Some(typlen) => {
                encode_fixed_column(&mut bytes[cursor..], array, nrows, typlen);
                layout::fixed_column_size(nrows, typlen)
            }
            None => {
                encode_geometry_column(&mut bytes[cursor..], array, col, nrows)?;
                layout::geometry_column_size(nrows)
            }
        };
        cursor += region_len;
    }

    Ok(KdsBuffer { bytes })
}

fn write_header(bytes: &mut [u8], columns: &[ColumnDescriptor], nrows: usize, total: usize) {
    bytes[header_field::TOTAL_LEN..header_field::TOTAL_LEN + 4]
        .copy_from_slice(&(total as u32).to_le_bytes());
    bytes[header_field::FORMAT_TAG..header_field::FORMAT_TAG + 2]
        .copy_from_slice(&layout::FORMAT_TAG_COLUMNAR.to_le_bytes());
    bytes[header_field::COLUMN_COUNT..header_field::COLUMN_COUNT + 2]
        .copy_from_slice(&(columns.len() as u16).to_le_bytes());
    bytes[header_field::CAPACITY_ROWS..header_field::CAPACITY_ROWS + 4]
        .copy_from_slice(&(nrows as u32).to_le_bytes());
    bytes[header_field::ACTUAL_ROWS..header_field::ACTUAL_ROWS + 4]
        .copy_from_slice(&(nrows as u32).to_le_bytes());
}

/// Write the validity bitmap region at the start of `region`. If the
/// source has no validity buffer, every row is valid (`0xFF` fill) and the
/// trailing bits of the last word are masked back to zero (§4.D).
fn write_validity(region: &mut [u8], validity: crate::arrow::Validity, nrows: usize) {
    let vbytes = layout::validity_bytes(nrows);
    match validity.0 {
        Some(words) => {
            for (i, word) in words.iter().enumerate() {
                let at = i * 8;
                if at + 8 <= vbytes {
                    region[at..at + 8].copy_from_slice(&word.to_le_bytes());
                }
            }
        }
        None => {
            for b in &mut region[..vbytes] {
                *b = 0xFF;
            }
            let trailing = nrows % 64;
            if trailing != 0 {
                let last_word_start = (nrows / 64) * 8;
                let mask = (1u64 << trailing) - 1;
                let masked = mask.to_le_bytes();
                region[last_word_start..last_word_start + 8].copy_from_slice(&masked);
            }
        }
    }
}

fn encode_fixed_column(region: &mut [u8], array: &ArrowArray, nrows: usize, typlen: usize) {
    let vbytes = layout::validity_bytes(nrows);
    write_validity(region, array.validity, nrows);

    if let ArrowData::Fixed(Some(src)) = array.data {
        let n = nrows * typlen;
        region[vbytes..vbytes + n].copy_from_slice(&src[..n]);
    }
    // `ArrowData::Fixed(None)` leaves the data region zeroed, as required.
}

fn encode_geometry_column(
    region: &mut [u8],
    array: &ArrowArray,
    col: &ColumnDescriptor,
    nrows: usize,
) -> Result<()> {
    let vbytes = layout::validity_bytes(nrows);
    write_validity(region, array.validity, nrows);

    let offsets_len = layout::max_align((nrows + 1) * 4);
    let offsets_start = vbytes;
    let payload_start = offsets_start + offsets_len;

    let (src_offsets, payload) = match array.data {
        ArrowData::Varlen { offsets, payload } => (offsets, payload),
        ArrowData::Fixed(_) => {
            return Err(BridgeError::MalformedGeometry {
                row: 0,
                reason: "geometry column has no payload buffer",
            });
        }
    };

    let srid = col.srid.unwrap_or(geometry::SENTINEL_SRID);
    let mut cursor = 0u32;
    for row in 0..nrows {
        let slot = offsets_start + row * 4;
        region[slot..slot + 4].copy_from_slice(&cursor.to_le_bytes());

        if !array.validity.is_valid(row) {
            continue;
        }

        let start = src_offsets[row] as usize;
        let end = src_offsets[row + 1] as usize;
        let row_payload = &payload[start..end];

        if let Some((x, y, z)) = geometry::parse_wkb_point(row_payload) {
            let at = payload_start + cursor as usize;
            geometry::write_point_header(&mut region[at..at + GEOM_HEADER_LEN], srid, x, y, z);
            cursor += GEOM_HEADER_LEN as u32;
        }
        // A too-short payload is treated as if the row were null: the
        // offset was already written, nothing is appended (§4.D).
    }
    let slot = offsets_start + nrows * 4;
    region[slot..slot + 4].copy_from_slice(&cursor.to_le_bytes());

    Ok(())
}
