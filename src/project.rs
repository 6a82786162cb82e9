//! Field projection.

use std::collections::HashMap;

use crate::record::Record;

/// Keep only the requested `fields` of each record.
///
/// `None` or an empty list leaves the records untouched. Unless
/// `case_sensitive`, names are matched case-insensitively. Output keys keep
/// the record's own spelling, and fields a record lacks are omitted rather
/// than filled with null, so projecting twice with the same list is a no-op.
pub fn project(records: Vec<Record>, fields: Option<&[String]>, case_sensitive: bool) -> Vec<Record> {
    let Some(fields) = fields.filter(|f| !f.is_empty()) else { return records };
    let wanted: Vec<String> =
        fields.iter().map(|f| if case_sensitive { f.clone() } else { f.to_lowercase() }).collect();

    records.into_iter().map(|record| project_one(&record, &wanted, case_sensitive)).collect()
}

fn project_one(record: &Record, wanted: &[String], case_sensitive: bool) -> Record {
    let index: HashMap<String, &str> = record
        .keys()
        .map(|key| (if case_sensitive { key.to_string() } else { key.to_lowercase() }, key))
        .collect();

    wanted
        .iter()
        .filter_map(|name| index.get(name))
        .filter_map(|key| record.get(key).map(|value| (key.to_string(), value.clone())))
        .collect()
}
