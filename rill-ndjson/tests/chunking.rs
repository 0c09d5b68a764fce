//! Chunk-boundary independence of the decode/frame pipeline.

use proptest::prelude::*;
use rill_ndjson::{FrameAssembler, Utf8ChunkDecoder, decode_record};

/// Run `bytes` through the pipeline split at `cuts` and collect the records.
fn records_for(bytes: &[u8], cuts: &[usize]) -> Vec<String> {
    let mut text = Utf8ChunkDecoder::new();
    let mut frames = FrameAssembler::new();
    let mut out = Vec::new();
    let mut start = 0;
    for &cut in cuts.iter().chain(std::iter::once(&bytes.len())) {
        let chunk = &bytes[start..cut];
        out.extend(frames.feed(&text.decode(chunk)).records);
        start = cut;
    }
    out
}

fn sorted_cuts(len: usize, raw: Vec<usize>) -> Vec<usize> {
    let mut cuts: Vec<usize> = raw.into_iter().map(|c| c % (len + 1)).collect();
    cuts.sort_unstable();
    cuts
}

proptest! {
    #[test]
    fn one_record_regardless_of_split(
        content in "\\PC{0,24}",
        raw_cuts in prop::collection::vec(any::<usize>(), 0..8),
    ) {
        let record = serde_json::json!({
            "message": {"role": "assistant", "content": content},
            "done": false,
        })
        .to_string();
        let serialized = format!("{record}\n");
        let bytes = serialized.as_bytes();

        let whole = records_for(bytes, &[]);
        let split = records_for(bytes, &sorted_cuts(bytes.len(), raw_cuts));

        prop_assert_eq!(whole.len(), 1);
        prop_assert_eq!(&split, &whole);
        prop_assert_eq!(&split[0], &record);

        let decoded = decode_record(&split[0]).unwrap().unwrap();
        prop_assert_eq!(decoded.token, content);
    }

    #[test]
    fn tokens_concatenate_across_any_split(
        tokens in prop::collection::vec("[a-zé€🦀 ]{1,6}", 1..6),
        raw_cuts in prop::collection::vec(any::<usize>(), 0..10),
    ) {
        let body: String = tokens
            .iter()
            .map(|t| format!("{}\n", serde_json::json!({"message": {"content": t}, "done": false})))
            .collect();
        let bytes = body.as_bytes();

        let text: String = records_for(bytes, &sorted_cuts(bytes.len(), raw_cuts))
            .iter()
            .filter_map(|line| decode_record(line))
            .map(|r| r.unwrap().token)
            .collect();

        prop_assert_eq!(text, tokens.concat());
    }
}

#[test]
fn spec_example_in_two_chunks() {
    let body = b"{\"message\":{\"content\":\"Hel\"},\"done\":false}\n{\"message\":{\"content\":\"lo\"},\"done\":true}\n";
    for cut in 0..=body.len() {
        let records = records_for(body, &[cut]);
        assert_eq!(records.len(), 2, "cut at {cut}");
        let decoded: Vec<_> = records
            .iter()
            .map(|l| decode_record(l).unwrap().unwrap())
            .collect();
        assert_eq!(decoded[0].token, "Hel");
        assert_eq!(decoded[1].token, "lo");
        assert!(decoded[1].done);
    }
}

#[test]
fn malformed_line_does_not_disturb_neighbours() {
    let body = "{\"response\":\"a\"}\n{broken\n{\"response\":\"b\"}\n";
    let results: Vec<_> = records_for(body.as_bytes(), &[5, 19])
        .iter()
        .filter_map(|l| decode_record(l))
        .collect();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().token, "a");
    assert_eq!(results[1].as_ref().unwrap_err().line(), "{broken");
    assert_eq!(results[2].as_ref().unwrap().token, "b");
}
