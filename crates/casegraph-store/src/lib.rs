//! # casegraph-store
//!
//! Reference persistence for flat cases.
//!
//! Each case is one JSONL file of tagged rows, the `case` header first, then
//! `element` and `evidence_link` rows. Writes are atomic and refuse rows
//! whose parent or link references would not resolve; reads return flat rows
//! or the nested tree rebuilt by the kernel.
//!
//! ```text
//! <root>/<case-id>.jsonl
//!     {"kind":"case", ...}
//!     {"kind":"element", ...}
//!     {"kind":"evidence_link", ...}
//! ```

pub mod jsonl;
pub mod rows;
pub mod store;

pub use jsonl::{JsonlError, decode_case, encode_case, read_case_file, write_case_file};
pub use rows::{CaseHeader, CaseRow};
pub use store::{CASE_FILE_EXTENSION, JsonlCaseStore, StoreError, check_references};
