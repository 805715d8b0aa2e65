/*!
kds::decode - The reverse of `encode` the dispatcher actually calls: turning
the accelerator's result buffer back into per-aggregate values and null
flags (§4.D "Reverse operation").

Result buffer layout (§3): `n_aggs` `f64` values, followed by `n_aggs`
`bool` (one byte each) null flags, in aggregate-declaration order.
*/

/// Decode a result buffer into (values, nulls). If `result_buf` is too
/// short to hold `n_aggs` values and flags, every output is marked null
/// instead of failing (§4.D) — the caller still gets `n_aggs`-length
/// vectors, just with no usable data.
pub fn decode(result_buf: &[u8], n_aggs: usize) -> (Vec<f64>, Vec<bool>) {
    let value_bytes = n_aggs * std::mem::size_of::<f64>();
    let flag_bytes = n_aggs;
    let needed = value_bytes + flag_bytes;

    if result_buf.len() < needed {
        return (vec![0.0; n_aggs], vec![true; n_aggs]);
    }

    let mut values = Vec::with_capacity(n_aggs);
    for i in 0..n_aggs {
        let at = i * 8;
        values.push(f64::from_le_bytes(result_buf[at..at + 8].try_into().unwrap()));
    }

    let mut nulls = Vec::with_capacity(n_aggs);
    for i in 0..n_aggs {
        nulls.push(result_buf[value_bytes + i] != 0);
    }

    (values, nulls)
}
