//! Spreadsheet export of the chat history

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::chat::{MessageStore, SessionStore};

pub const SHEET_NAME: &str = "對話紀錄";
pub const HEADERS: [&str; 5] = ["序號", "聊天室", "發送者", "訊息內容", "檔案名稱"];
pub const NO_FILE: &str = "無";
/// Longest string a worksheet cell accepts
pub const MAX_CELL_CHARS: usize = 32_767;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Spreadsheet error: {0}")]
    XlsxError(#[from] XlsxError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One spreadsheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub seq: usize,
    pub session_name: String,
    pub sender_label: &'static str,
    pub text: String,
    pub file_name: String,
}

/// Map every message, across all sessions, to a row in store order
pub fn export_rows(sessions: &SessionStore, messages: &MessageStore) -> Vec<ExportRow> {
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| ExportRow {
            seq: index + 1,
            session_name: fit_cell(sessions.name_of(message.session_id).unwrap_or_default()),
            sender_label: message.sender.label(),
            text: fit_cell(&message.text),
            file_name: message
                .attachment
                .as_ref()
                .map(|a| fit_cell(&a.name))
                .unwrap_or_else(|| NO_FILE.to_string()),
        })
        .collect()
}

/// Cut text to the cell limit on a char boundary
fn fit_cell(text: &str) -> String {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Write rows to a single-sheet workbook
pub fn write_workbook(rows: &[ExportRow], path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    worksheet.set_column_width(3, 60.0)?;
    worksheet.set_column_width(4, 24.0)?;

    for (offset, row) in rows.iter().enumerate() {
        let r = offset as u32 + 1;
        worksheet.write_number(r, 0, row.seq as f64)?;
        worksheet.write_string(r, 1, row.session_name.as_str())?;
        worksheet.write_string(r, 2, row.sender_label)?;
        worksheet.write_string(r, 3, row.text.as_str())?;
        worksheet.write_string(r, 4, row.file_name.as_str())?;
    }

    workbook.save(path)?;
    info!("Exported {} messages to {}", rows.len(), path.display());
    Ok(())
}

/// Timestamped file name inside the export directory
pub fn default_export_path(dir: &Path, now: DateTime<Local>) -> PathBuf {
    dir.join(format!("chat_history_{}.xlsx", now.format("%Y%m%d_%H%M%S")))
}

/// Export the whole history and return the written path
pub fn export_history(
    sessions: &SessionStore,
    messages: &MessageStore,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let path = default_export_path(dir, Local::now());
    let rows = export_rows(sessions, messages);
    write_workbook(&rows, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Attachment, Sender, SessionId};
    use chrono::TimeZone;

    fn populated() -> (SessionStore, MessageStore) {
        let mut sessions = SessionStore::new();
        let mut messages = MessageStore::new();
        messages
            .append(&sessions, SessionId(1), Sender::User, "良率多少?", None)
            .unwrap();
        sessions.create_session();
        messages
            .append(
                &sessions,
                SessionId(2),
                Sender::User,
                "上傳檔案：qc.csv",
                Some(Attachment {
                    name: "qc.csv".into(),
                    bytes: b"a,b".to_vec(),
                }),
            )
            .unwrap();
        messages
            .append(&sessions, SessionId(1), Sender::Bot, "98%", None)
            .unwrap();
        (sessions, messages)
    }

    #[test]
    fn test_rows_cover_all_sessions_in_store_order() {
        let (sessions, messages) = populated();
        let rows = export_rows(&sessions, &messages);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().map(|r| r.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(rows[0].session_name, "Chat 1");
        assert_eq!(rows[0].sender_label, "使用者");
        assert_eq!(rows[0].file_name, NO_FILE);
        assert_eq!(rows[1].session_name, "Chat 2");
        assert_eq!(rows[1].file_name, "qc.csv");
        assert_eq!(rows[2].sender_label, "機器人");
        assert_eq!(rows[2].text, "98%");
    }

    #[test]
    fn test_rows_reflect_renames() {
        let (mut sessions, messages) = populated();
        sessions.rename_session(
            SessionId(1),
            crate::chat::PromptResponse::Submitted("沖壓線".into()),
        );
        let rows = export_rows(&sessions, &messages);
        assert_eq!(rows[0].session_name, "沖壓線");
        assert_eq!(rows[2].session_name, "沖壓線");
    }

    #[test]
    fn test_default_export_path_is_timestamped() {
        let now = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let path = default_export_path(Path::new("/tmp/out"), now);
        assert_eq!(path, PathBuf::from("/tmp/out/chat_history_20260304_050607.xlsx"));
    }

    #[test]
    fn test_write_workbook_creates_file() {
        let (sessions, messages) = populated();
        let dir = tempfile::tempdir().unwrap();

        let path = export_history(&sessions, &messages, &dir.path().join("exports")).unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
    }

    #[test]
    fn test_oversized_cells_are_cut_to_limit() {
        let mut sessions = SessionStore::new();
        let mut messages = MessageStore::new();
        sessions.rename_session(
            SessionId(1),
            crate::chat::PromptResponse::Submitted("線".repeat(MAX_CELL_CHARS + 5)),
        );
        let content = format!("檔案內容：\n{}", "x".repeat(40_000));
        messages
            .append(&sessions, SessionId(1), Sender::Bot, content, None)
            .unwrap();

        let rows = export_rows(&sessions, &messages);
        assert_eq!(rows[0].text.chars().count(), MAX_CELL_CHARS);
        assert!(rows[0].text.starts_with("檔案內容：\nxxx"));
        assert_eq!(rows[0].session_name.chars().count(), MAX_CELL_CHARS);

        let dir = tempfile::tempdir().unwrap();
        let path = export_history(&sessions, &messages, dir.path()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        write_workbook(&[], &path).unwrap();
        assert!(path.exists());
    }
}
