//! Protobuf series payloads (`/api/v2/series`).
//!
//! The payload is a `MetricPayload` message whose repeated field 1 holds
//! `MetricSeries` sub-messages; field 2 of each sub-message is the metric
//! name. Only those two fields are ever decoded.

use crate::codec::wire::{FieldReader, FieldWriter, WireError, METRIC_NAME_FIELD, SERIES_FIELD};

use super::PrefixFilter;

/// Drop series whose name matches the filter.
///
/// Every retained field is copied byte-for-byte in its original position.
pub fn filter_series(payload: &[u8], filter: &PrefixFilter) -> Result<(Vec<u8>, i64), WireError> {
    let mut writer = FieldWriter::with_capacity(payload.len());
    let mut dropped = 0i64;

    for field in FieldReader::new(payload) {
        let field = field?;
        if field.number == SERIES_FIELD {
            let name = metric_name(field.length_delimited()?)?;
            if filter.matches(name) {
                dropped += 1;
                continue;
            }
        }
        writer.copy(&field);
    }

    Ok((writer.finish().into(), dropped))
}

/// First metric name field of an encoded series, empty if absent.
fn metric_name(series: &[u8]) -> Result<&[u8], WireError> {
    for field in FieldReader::new(series) {
        let field = field?;
        if field.number == METRIC_NAME_FIELD {
            return field.length_delimited();
        }
    }
    Ok(&[])
}
