//! Line records for one stored case.
//!
//! A case file holds one `case` header line followed by `element` and
//! `evidence_link` lines, the same rows a relational store would keep.

use casegraph_kernel::{CaseInfo, Element, EvidenceLink, FlatCase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Case-level header line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseHeader {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub case: CaseInfo,
}

impl CaseHeader {
    pub fn of(flat: &FlatCase) -> Self {
        Self {
            version: flat.version.clone(),
            exported_at: flat.exported_at,
            case: flat.case.clone(),
        }
    }

    /// An empty flat case under this header. A blank version means "2.0".
    pub fn into_flat(self) -> FlatCase {
        let mut flat = FlatCase::new(self.case, self.exported_at);
        if !self.version.is_empty() {
            flat.version = self.version;
        }
        flat
    }
}

/// One JSONL line, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseRow {
    Case(CaseHeader),
    Element(Element),
    EvidenceLink(EvidenceLink),
}

/// Borrowed twin of [`CaseRow`] so writes never clone element rows.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum CaseRowRef<'a> {
    Case(&'a CaseHeader),
    Element(&'a Element),
    EvidenceLink(&'a EvidenceLink),
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegraph_kernel::{ElementType, FLAT_VERSION};
    use chrono::TimeZone;

    #[test]
    fn borrowed_rows_parse_back_as_owned_rows() {
        let element = Element::new("g", ElementType::Goal, "G1");
        let link = EvidenceLink::new("e", "p");

        let line = serde_json::to_string(&CaseRowRef::Element(&element)).expect("serialize");
        assert!(line.starts_with("{\"kind\":\"element\""));
        assert!(line.contains("\"elementType\":\"GOAL\""));
        let back: CaseRow = serde_json::from_str(&line).expect("parse element row");
        assert_eq!(back, CaseRow::Element(element));

        let line = serde_json::to_string(&CaseRowRef::EvidenceLink(&link)).expect("serialize");
        let back: CaseRow = serde_json::from_str(&line).expect("parse link row");
        assert_eq!(back, CaseRow::EvidenceLink(link));
    }

    #[test]
    fn blank_header_version_defaults_to_flat() {
        let header = CaseHeader {
            version: String::new(),
            exported_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            case: CaseInfo::default(),
        };
        let flat = header.into_flat();
        assert_eq!(flat.version, FLAT_VERSION);
        assert!(flat.elements.is_empty());
        assert_eq!(CaseHeader::of(&flat).version, FLAT_VERSION);
    }
}
