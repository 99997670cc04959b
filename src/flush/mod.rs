mod jsonl;

pub use jsonl::{flush_to_jsonl, load_jsonl, load_world_jsonl};
