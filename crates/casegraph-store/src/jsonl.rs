//! Case file codec.
//!
//! A case file is JSONL whose first row is the `case` header; element and
//! evidence-link rows follow. Decoding folds rows straight into a
//! [`FlatCase`] and refuses files that break the header rule. Writes go
//! through [`AtomicFile`], so a crash leaves the old case or the new one,
//! never a mix.

use crate::rows::{CaseHeader, CaseRow, CaseRowRef};
use casegraph_kernel::FlatCase;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from reading or writing case files.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("{} line {line}: corrupted case file ({reason})", .path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: &'static str,
    },

    #[error("line {line}: case file must open with a case header row")]
    MissingHeader { line: usize },

    #[error("line {line}: second case header row")]
    RepeatedHeader { line: usize },

    #[error("case file has no rows")]
    Empty,
}

impl JsonlError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        JsonlError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Rebuild a flat case from case-file text. Blank lines are ignored.
pub fn decode_case(text: &str) -> Result<FlatCase, JsonlError> {
    let mut flat: Option<FlatCase> = None;
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let row: CaseRow = serde_json::from_str(raw).map_err(|e| JsonlError::Parse {
            line,
            message: e.to_string(),
        })?;
        match row {
            CaseRow::Case(_) if flat.is_some() => {
                return Err(JsonlError::RepeatedHeader { line });
            }
            CaseRow::Case(header) => flat = Some(header.into_flat()),
            CaseRow::Element(element) => after_header(&mut flat, line)?.elements.push(element),
            CaseRow::EvidenceLink(link) => {
                after_header(&mut flat, line)?.evidence_links.push(link)
            }
        }
    }
    flat.ok_or(JsonlError::Empty)
}

fn after_header(flat: &mut Option<FlatCase>, line: usize) -> Result<&mut FlatCase, JsonlError> {
    flat.as_mut().ok_or(JsonlError::MissingHeader { line })
}

/// Write `flat` as case-file rows: header, elements, then evidence links.
pub fn encode_case(writer: &mut impl Write, flat: &FlatCase) -> io::Result<()> {
    let header = CaseHeader::of(flat);
    let rows = std::iter::once(CaseRowRef::Case(&header))
        .chain(flat.elements.iter().map(CaseRowRef::Element))
        .chain(flat.evidence_links.iter().map(CaseRowRef::EvidenceLink));
    for row in rows {
        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

pub fn read_case_file(path: &Path) -> Result<FlatCase, JsonlError> {
    let bytes = fs::read(path).map_err(|e| JsonlError::io(path, e))?;
    let text = checked_text(path, bytes)?;
    decode_case(&text)
}

/// Replace the file at `path` with `flat`.
pub fn write_case_file(path: &Path, flat: &FlatCase) -> Result<(), JsonlError> {
    let mut file = AtomicFile::create(path)?;
    encode_case(&mut file.writer, flat).map_err(|e| JsonlError::io(&file.tmp, e))?;
    file.commit()
}

/// Case files are UTF-8 text without NUL bytes; report the first bad line.
fn checked_text(path: &Path, bytes: Vec<u8>) -> Result<String, JsonlError> {
    let corrupt = |bytes: &[u8], offset: usize, reason| JsonlError::Corrupt {
        path: path.to_path_buf(),
        line: 1 + bytes[..offset].iter().filter(|b| **b == b'\n').count(),
        reason,
    };
    if let Some(offset) = bytes.iter().position(|b| *b == 0) {
        return Err(corrupt(bytes.as_slice(), offset, "NUL byte"));
    }
    String::from_utf8(bytes).map_err(|e| {
        let offset = e.utf8_error().valid_up_to();
        corrupt(e.as_bytes(), offset, "invalid UTF-8")
    })
}

/// A sibling temp file that replaces `target` on [`commit`](Self::commit).
///
/// Dropping it uncommitted removes the temp file and leaves `target` alone.
struct AtomicFile {
    target: PathBuf,
    tmp: PathBuf,
    writer: BufWriter<File>,
    committed: bool,
}

impl AtomicFile {
    fn create(target: &Path) -> Result<Self, JsonlError> {
        if let Some(dir) = parent_dir(target) {
            fs::create_dir_all(dir).map_err(|e| JsonlError::io(dir, e))?;
        }
        let tmp = tmp_sibling(target);
        let file = File::create(&tmp).map_err(|e| JsonlError::io(&tmp, e))?;
        Ok(Self {
            target: target.to_path_buf(),
            tmp,
            writer: BufWriter::new(file),
            committed: false,
        })
    }

    /// Flush and fsync the temp file, rename it over the target, then fsync
    /// the directory so the rename itself is durable.
    fn commit(mut self) -> Result<(), JsonlError> {
        self.writer
            .flush()
            .and_then(|()| self.writer.get_ref().sync_all())
            .map_err(|e| JsonlError::io(&self.tmp, e))?;
        fs::rename(&self.tmp, &self.target).map_err(|e| JsonlError::io(&self.target, e))?;
        self.committed = true;

        if let Some(dir) = parent_dir(&self.target) {
            File::open(dir)
                .and_then(|handle| handle.sync_all())
                .map_err(|e| JsonlError::io(dir, e))?;
        }
        Ok(())
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|dir| !dir.as_os_str().is_empty())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{unique}", std::process::id()));
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegraph_kernel::{CaseInfo, Element, ElementType, EvidenceLink};
    use chrono::{TimeZone, Utc};

    const HEADER: &str = "{\"kind\":\"case\",\"version\":\"2.0\",\"exportedAt\":\"2024-01-01T00:00:00Z\",\"case\":{\"name\":\"x\"}}";
    const GOAL: &str = "{\"kind\":\"element\",\"id\":\"g\",\"elementType\":\"GOAL\",\"parentId\":null,\"name\":\"G1\"}";

    fn temp_dir(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "casegraph-jsonl-{prefix}-{}-{unique}",
            std::process::id()
        ))
    }

    fn sample_case(goal_id: &str) -> FlatCase {
        let mut flat = FlatCase::new(
            CaseInfo {
                name: "Encoded".to_string(),
                ..CaseInfo::default()
            },
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        flat.elements = vec![
            Element::new(goal_id, ElementType::Goal, "G1"),
            Element::new("p", ElementType::PropertyClaim, "P1").with_parent(goal_id),
            Element::new("e", ElementType::Evidence, "E1"),
        ];
        flat.evidence_links = vec![EvidenceLink::new("e", "p")];
        flat
    }

    #[test]
    fn encoded_case_opens_with_its_header_and_decodes_back() {
        let flat = sample_case("g");
        let mut out = Vec::new();
        encode_case(&mut out, &flat).expect("encode");

        let text = String::from_utf8(out).expect("utf8");
        let kinds: Vec<&str> = text
            .lines()
            .map(|line| if line.contains("\"kind\":\"case\"") { "case" } else { "row" })
            .collect();
        assert_eq!(kinds, vec!["case", "row", "row", "row", "row"]);
        assert_eq!(decode_case(&text).expect("decode"), flat);
    }

    #[test]
    fn rows_before_the_header_are_rejected() {
        let text = format!("\n{GOAL}\n{HEADER}\n");
        match decode_case(&text) {
            Err(JsonlError::MissingHeader { line }) => assert_eq!(line, 2),
            other => panic!("expected missing header, got {other:?}"),
        }
    }

    #[test]
    fn second_header_is_rejected() {
        let text = format!("{HEADER}\n{GOAL}\n{HEADER}\n");
        match decode_case(&text) {
            Err(JsonlError::RepeatedHeader { line }) => assert_eq!(line, 3),
            other => panic!("expected repeated header, got {other:?}"),
        }
    }

    #[test]
    fn blank_file_and_bad_rows_are_reported() {
        assert!(matches!(decode_case("\n  \n"), Err(JsonlError::Empty)));
        match decode_case(&format!("{HEADER}\n{{\"kind\":\"mystery\"}}\n")) {
            Err(JsonlError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_bytes_name_the_offending_line() {
        let dir = temp_dir("corrupt");
        fs::create_dir_all(&dir).expect("create dir");

        let nul = dir.join("nul.jsonl");
        fs::write(&nul, format!("{HEADER}\n{GOAL}\n\0garbage")).expect("fixture should write");
        match read_case_file(&nul) {
            Err(JsonlError::Corrupt { line, reason, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(reason, "NUL byte");
            }
            other => panic!("expected corrupt case file, got {other:?}"),
        }

        let latin = dir.join("latin.jsonl");
        fs::write(&latin, [b'{', b'\n', 0xff, 0xfe]).expect("fixture should write");
        match read_case_file(&latin) {
            Err(JsonlError::Corrupt { line, reason, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(reason, "invalid UTF-8");
            }
            other => panic!("expected corrupt case file, got {other:?}"),
        }

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn rewrite_replaces_the_case_and_leaves_no_temp_files() {
        let dir = temp_dir("atomic");
        let path = dir.join("case.jsonl");

        write_case_file(&path, &sample_case("first-goal")).expect("first write");
        write_case_file(&path, &sample_case("second-goal")).expect("second write");

        let raw = fs::read_to_string(&path).expect("case file should exist");
        assert!(!raw.contains("first-goal"));
        assert_eq!(
            read_case_file(&path).expect("reread"),
            sample_case("second-goal")
        );
        let entries = fs::read_dir(&dir).expect("list dir").count();
        assert_eq!(entries, 1);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn abandoned_write_removes_its_temp_file() {
        let dir = temp_dir("abandon");
        let path = dir.join("case.jsonl");
        let file = AtomicFile::create(&path).expect("create temp file");
        let tmp = file.tmp.clone();
        assert!(tmp.is_file());

        drop(file);
        assert!(!tmp.exists());
        assert!(!path.exists());

        let _ = fs::remove_dir_all(dir);
    }
}
