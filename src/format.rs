//! Text rendering and message chunking.
//!
//! ```text
//! [{id: 5, name: "A", spent: 3}, {...}]
//!        │ format_records
//!        v
//! ["id: 5\nname: A\nspent: 3", "..."]      one block per record
//!        │ chunk(max_size, "\n\n")
//!        v
//! ["id: 5\nname: A\nspent: 3\n\n...", ...] each <= max_size chars unless a
//!                                          single block is larger
//! ```

use serde_json::Value;

use crate::record::Record;

/// Fields listed before the alphabetical rest.
const LEADING_FIELDS: [&str; 2] = ["id", "name"];

/// Separator between record blocks.
pub const BLOCK_JOINER: &str = "\n\n";

/// Render any JSON value as human-readable text.
///
/// Strings holding JSON are decoded first; other strings come back unchanged.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(decoded @ (Value::Object(_) | Value::Array(_))) => format_value(&decoded),
            _ => s.clone(),
        },
        Value::Object(map) => {
            let record: Record = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            format_record(&record)
        }
        Value::Array(items) => items.iter().map(format_value).collect::<Vec<_>>().join(BLOCK_JOINER),
        scalar => render_scalar(scalar),
    }
}

/// `key: value` lines, `id` and `name` first, then alphabetical.
pub fn format_record(record: &Record) -> String {
    let leading = LEADING_FIELDS.iter().filter_map(|k| record.get(k).map(|v| (*k, v)));
    let rest = record.iter().filter(|(k, _)| !LEADING_FIELDS.contains(k));
    leading.chain(rest).map(|(k, v)| format!("{k}: {}", render_scalar(v))).collect::<Vec<_>>().join("\n")
}

/// One block per record.
pub fn format_records(records: &[Record]) -> Vec<String> {
    records.iter().map(format_record).collect()
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Pack `blocks` greedily into chunks of at most `max_size` characters,
/// joining neighbours with `joiner`.
///
/// Blocks are never split: a block longer than `max_size` becomes a chunk of
/// its own. `chunks.join(joiner) == blocks.join(joiner)` always holds.
pub fn chunk<S: AsRef<str>>(blocks: &[S], max_size: usize, joiner: &str) -> Vec<String> {
    let joiner_len = joiner.chars().count();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    let mut started = false;

    for block in blocks {
        let block = block.as_ref();
        let block_len = block.chars().count();
        if !started {
            current.push_str(block);
            current_len = block_len;
            started = true;
        } else if current_len + joiner_len + block_len <= max_size {
            current.push_str(joiner);
            current.push_str(block);
            current_len += joiner_len + block_len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(block);
            current_len = block_len;
        }
    }

    if started {
        chunks.push(current);
    }
    chunks
}

/// Split already-rendered text at block boundaries and chunk it.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    let blocks: Vec<&str> = text.split(BLOCK_JOINER).collect();
    chunk(&blocks, max_size, BLOCK_JOINER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn records_promote_id_and_name() {
        let text = format_value(&json!({"spent": 3.5, "name": "Summer", "clicks": 10, "id": 5}));
        assert_eq!(text, "id: 5\nname: Summer\nclicks: 10\nspent: 3.5");
    }

    #[test]
    fn sequences_become_blank_line_separated_blocks() {
        let text = format_value(&json!([{"id": 1}, {"id": 2}]));
        assert_eq!(text, "id: 1\n\nid: 2");
    }

    #[test]
    fn json_strings_are_decoded_and_plain_strings_kept() {
        assert_eq!(format_value(&json!("{\"id\": 7}")), "id: 7");
        assert_eq!(format_value(&json!("Invalid Command")), "Invalid Command");
        assert_eq!(format_value(&json!("42")), "42");
    }

    #[test]
    fn oversized_blocks_stand_alone() {
        let blocks = ["aaaa", "bbbbbbbbbbbb", "cc", "dd"];
        let chunks = chunk(&blocks, 8, "\n\n");
        assert_eq!(chunks, ["aaaa", "bbbbbbbbbbbb", "cc\n\ndd"]);
    }

    #[test]
    fn empty_input_yields_no_chunks_but_empty_blocks_survive() {
        assert!(chunk::<&str>(&[], 10, "\n\n").is_empty());
        assert_eq!(chunk(&["", ""], 10, "\n\n"), ["\n\n"]);
    }

    #[test]
    fn sizes_are_counted_in_characters() {
        let chunks = chunk(&["ééé", "ééé"], 8, "\n\n");
        assert_eq!(chunks.len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_round_trip_and_respect_the_bound(
            blocks in proptest::collection::vec("[a-z ]{0,30}", 0..20),
            max_size in 1usize..80,
        ) {
            let chunks = chunk(&blocks, max_size, "\n\n");
            prop_assert_eq!(chunks.join("\n\n"), blocks.join("\n\n"));
            for c in &chunks {
                let fits = c.chars().count() <= max_size;
                let single = blocks.iter().any(|b| b == c);
                prop_assert!(fits || single, "chunk {:?} exceeds {}", c, max_size);
            }
        }
    }
}
