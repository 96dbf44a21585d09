use crate::model::date::CalendarDate;
use crate::model::document::{ChecklistList, DateRange, Document, Memo};
use crate::model::task::{normalize_title, stamp_id};

/// Error type for memo, checklist and calendar operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("memo index out of range: {index} (have {len})")]
    MemoNotFound { index: usize, len: usize },
    #[error("list not found: {0}")]
    ListNotFound(String),
    #[error("{number} is outside list {list_id} ({start}..={end})")]
    NumberOutOfRange {
        list_id: String,
        number: i64,
        start: i64,
        end: i64,
    },
    #[error("invalid list: start {start} is after end {end}")]
    InvalidList { start: i64, end: i64 },
}

// ---------------------------------------------------------------------------
// Memos
// ---------------------------------------------------------------------------

/// Append a memo. Returns its index.
pub fn add_memo(doc: &mut Document, text: &str, swatch_id: u32) -> usize {
    doc.memos.push(Memo {
        text: text.to_string(),
        swatch_id,
    });
    doc.memos.len() - 1
}

pub fn edit_memo(
    doc: &mut Document,
    index: usize,
    text: Option<&str>,
    swatch_id: Option<u32>,
) -> Result<(), DocumentError> {
    let len = doc.memos.len();
    let memo = doc
        .memos
        .get_mut(index)
        .ok_or(DocumentError::MemoNotFound { index, len })?;
    if let Some(text) = text {
        memo.text = text.to_string();
    }
    if let Some(swatch_id) = swatch_id {
        memo.swatch_id = swatch_id;
    }
    Ok(())
}

pub fn remove_memo(doc: &mut Document, index: usize) -> Result<Memo, DocumentError> {
    let len = doc.memos.len();
    if index >= len {
        return Err(DocumentError::MemoNotFound { index, len });
    }
    Ok(doc.memos.remove(index))
}

/// Move the memo at `from` so it ends up at `to`.
pub fn move_memo(doc: &mut Document, from: usize, to: usize) -> Result<(), DocumentError> {
    let len = doc.memos.len();
    for index in [from, to] {
        if index >= len {
            return Err(DocumentError::MemoNotFound { index, len });
        }
    }
    let memo = doc.memos.remove(from);
    doc.memos.insert(to, memo);
    Ok(())
}

// ---------------------------------------------------------------------------
// Checklists
// ---------------------------------------------------------------------------

/// Create a numbered checklist covering `start..=end`. Returns the new id.
pub fn add_list(
    doc: &mut Document,
    name: &str,
    start: i64,
    end: i64,
    swatch_id: u32,
) -> Result<String, DocumentError> {
    if start > end {
        return Err(DocumentError::InvalidList { start, end });
    }
    let id = stamp_id(|candidate| doc.lists.iter().any(|l| l.id == candidate));
    doc.lists.push(ChecklistList {
        id: id.clone(),
        name: normalize_title(name),
        start_number: start,
        end_number: end,
        swatch_id,
        done_numbers: Default::default(),
    });
    Ok(id)
}

pub fn remove_list(doc: &mut Document, list_id: &str) -> Result<ChecklistList, DocumentError> {
    let index = list_index(doc, list_id)?;
    Ok(doc.lists.remove(index))
}

pub fn rename_list(doc: &mut Document, list_id: &str, name: &str) -> Result<(), DocumentError> {
    let index = list_index(doc, list_id)?;
    doc.lists[index].name = normalize_title(name);
    Ok(())
}

/// Tick or untick `number`. Returns whether it is now ticked.
pub fn toggle_list_number(doc: &mut Document, list_id: &str, number: i64) -> Result<bool, DocumentError> {
    let index = list_index(doc, list_id)?;
    let list = &mut doc.lists[index];
    if !list.contains(number) {
        return Err(DocumentError::NumberOutOfRange {
            list_id: list.id.clone(),
            number,
            start: list.start_number,
            end: list.end_number,
        });
    }
    if list.done_numbers.remove(&number) {
        Ok(false)
    } else {
        list.done_numbers.insert(number);
        Ok(true)
    }
}

fn list_index(doc: &Document, list_id: &str) -> Result<usize, DocumentError> {
    doc.lists
        .iter()
        .position(|l| l.id == list_id)
        .ok_or_else(|| DocumentError::ListNotFound(list_id.to_string()))
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Add or remove a holiday. Returns whether `date` is now a holiday.
pub fn toggle_holiday(doc: &mut Document, date: CalendarDate) -> bool {
    if doc.holidays.remove(&date) {
        false
    } else {
        doc.holidays.insert(date);
        true
    }
}

/// Pin the visible range, or clear it to fall back to the window around today.
/// An inverted range is stored as given and renders no columns.
pub fn set_calendar_range(doc: &mut Document, range: Option<DateRange>) {
    doc.calendar_range = range;
}
