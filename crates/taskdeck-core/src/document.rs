use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap on documents per task.
pub const MAX_DOCUMENTS_PER_TASK: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub task_id: String,
    pub file_name: String,
    pub store_key: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// Uploads are restricted to PDF files, matched on the file extension.
pub fn is_pdf(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
