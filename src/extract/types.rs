use serde::{Deserialize, Serialize};

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    Pdf,
    Csv,
    PlainText,
}

impl UploadKind {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Csv => "text/csv",
            Self::PlainText => "text/plain",
        }
    }
}

/// Plain text of one upload, one entry per page. Text and CSV uploads are a
/// single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub name: String,
    pub kind: UploadKind,
    pub checksum: String,
    pub pages: Vec<String>,
}

impl Transcript {
    /// Pages joined with newline separators, in page order.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|page| page.chars().count()).sum()
    }
}
