use crate::core::types::AnalysisRecord;

/// Records whose file name contains `query`, ignoring case. A blank query
/// keeps everything. Input order is preserved.
pub fn filter_records<'a>(records: &'a [AnalysisRecord], query: &str) -> Vec<&'a AnalysisRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|record| record.pdf_name.to_lowercase().contains(&needle))
        .collect()
}
