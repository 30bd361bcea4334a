//! HTTP `Range` header parsing.

use crate::{domain::ByteRange, errors::Error, Result};

/// Parse a `Range` header against the last byte index of a resource.
///
/// A missing or empty header parses to an empty vec ("full content").
/// `"a-b"` maps to `(a, b)`, `"a-"` to `(a, last_byte_index)` and `"-b"`
/// to `(0, b)` — the suffix spelling means "from byte 0 through b" here,
/// not "last b bytes".
///
/// Multiple comma-separated specs all parse; rejecting multi-range
/// requests is the gateway's policy, not the parser's.
pub fn parse_range(header: Option<&str>, last_byte_index: u64) -> Result<Vec<ByteRange>> {
    let Some(header) = header else {
        return Ok(Vec::new());
    };
    let header = header.trim();
    if header.is_empty() {
        return Ok(Vec::new());
    }

    let Some((unit, specs)) = header.split_once('=') else {
        return Err(Error::UnsupportedRangeUnit(header.to_string()));
    };
    if unit != "bytes" {
        return Err(Error::UnsupportedRangeUnit(unit.to_string()));
    }

    specs
        .split(',')
        .map(|spec| parse_spec(spec.trim(), last_byte_index))
        .collect()
}

fn parse_spec(spec: &str, last_byte_index: u64) -> Result<ByteRange> {
    let invalid = || Error::InvalidRangeSpec(spec.to_string());

    let bounds = spec
        .splitn(2, '-')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u64>().map_err(|_| invalid()))
        .collect::<Result<Vec<u64>>>()?;

    let (offset, limit) = match bounds.as_slice() {
        [offset, limit] => (*offset, *limit),
        [single] if spec.starts_with('-') => (0, *single),
        [single] => (*single, last_byte_index),
        _ => return Err(invalid()),
    };

    if offset > limit {
        return Err(invalid());
    }
    Ok(ByteRange { offset, limit })
}
