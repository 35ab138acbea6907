//! In-memory editing state served by the API handlers
//!
//! Holds buffers of lines, windows with cursors, and the typeahead queue fed by `input`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::errors::AppError;

pub const TYPEAHEAD_CAPACITY: usize = 64 * 1024;
pub const MAX_BUFFERS: usize = 1024;

const FIRST_WINDOW_HANDLE: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BufferHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

/// Cursor position: 1-based row, 0-based byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug)]
struct Buffer {
    name: String,
    lines: Vec<String>,
}

impl Buffer {
    fn new(name: String) -> Self {
        Self {
            name,
            lines: vec![String::new()],
        }
    }
}

#[derive(Debug)]
struct Window {
    buffer: BufferHandle,
    cursor: Cursor,
}

#[derive(Debug)]
struct WorkspaceState {
    buffers: BTreeMap<BufferHandle, Buffer>,
    windows: BTreeMap<WindowHandle, Window>,
    current_window: WindowHandle,
    next_buffer: u64,
    typeahead: String,
}

impl WorkspaceState {
    fn buffer(&self, handle: BufferHandle) -> Result<&Buffer, AppError> {
        self.buffers.get(&handle).ok_or_else(|| invalid_buffer(handle))
    }

    fn buffer_mut(&mut self, handle: BufferHandle) -> Result<&mut Buffer, AppError> {
        self.buffers
            .get_mut(&handle)
            .ok_or_else(|| invalid_buffer(handle))
    }

    fn window(&self, handle: WindowHandle) -> Result<&Window, AppError> {
        self.windows.get(&handle).ok_or_else(|| invalid_window(handle))
    }
}

#[derive(Debug)]
pub struct Workspace {
    state: RwLock<WorkspaceState>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Starts with one empty, unnamed buffer shown in one window.
    pub fn new() -> Self {
        let first_buffer = BufferHandle(1);
        let first_window = WindowHandle(FIRST_WINDOW_HANDLE);

        Self {
            state: RwLock::new(WorkspaceState {
                buffers: BTreeMap::from([(first_buffer, Buffer::new(String::new()))]),
                windows: BTreeMap::from([(
                    first_window,
                    Window {
                        buffer: first_buffer,
                        cursor: Cursor { row: 1, col: 0 },
                    },
                )]),
                current_window: first_window,
                next_buffer: 2,
                typeahead: String::new(),
            }),
        }
    }

    pub async fn create_buffer(&self, name: Option<String>) -> Result<BufferHandle, AppError> {
        let mut state = self.state.write().await;
        if state.buffers.len() >= MAX_BUFFERS {
            return Err(AppError::bad_request(
                "buffer_limit",
                format!("at most {MAX_BUFFERS} buffers may exist at once"),
            ));
        }
        let handle = BufferHandle(state.next_buffer);
        state.next_buffer += 1;
        state
            .buffers
            .insert(handle, Buffer::new(name.unwrap_or_default()));
        Ok(handle)
    }

    /// Removes a buffer that no window is showing.
    pub async fn delete_buffer(&self, buffer: BufferHandle) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.buffer(buffer)?;
        if state.windows.values().any(|window| window.buffer == buffer) {
            return Err(AppError::bad_request(
                "buffer_in_use",
                format!("buffer {} is shown in a window", buffer.0),
            ));
        }
        state.buffers.remove(&buffer);
        Ok(())
    }

    pub async fn current_window(&self) -> WindowHandle {
        self.state.read().await.current_window
    }

    pub async fn current_buffer(&self) -> Result<BufferHandle, AppError> {
        let state = self.state.read().await;
        Ok(state.window(state.current_window)?.buffer)
    }

    pub async fn buffer_name(&self, buffer: BufferHandle) -> Result<String, AppError> {
        Ok(self.state.read().await.buffer(buffer)?.name.clone())
    }

    pub async fn line_count(&self, buffer: BufferHandle) -> Result<usize, AppError> {
        Ok(self.state.read().await.buffer(buffer)?.lines.len())
    }

    pub async fn get_lines(
        &self,
        buffer: BufferHandle,
        start: i64,
        end: i64,
        strict_indexing: bool,
    ) -> Result<Vec<String>, AppError> {
        let state = self.state.read().await;
        let lines = &state.buffer(buffer)?.lines;
        let start = normalize_index(start, lines.len(), strict_indexing)?;
        let end = normalize_index(end, lines.len(), strict_indexing)?;
        check_range(start, end)?;

        Ok(lines[start..end].to_vec())
    }

    /// Replaces lines `[start, end)`; the buffer keeps at least one line.
    pub async fn set_lines(
        &self,
        buffer: BufferHandle,
        start: i64,
        end: i64,
        strict_indexing: bool,
        replacement: Vec<String>,
    ) -> Result<(), AppError> {
        if replacement.iter().any(|line| line.contains('\n')) {
            return Err(AppError::bad_request(
                "invalid_line",
                "replacement lines must not contain newlines",
            ));
        }

        let mut state = self.state.write().await;
        let target = state.buffer_mut(buffer)?;
        let start = normalize_index(start, target.lines.len(), strict_indexing)?;
        let end = normalize_index(end, target.lines.len(), strict_indexing)?;
        check_range(start, end)?;

        target.lines.splice(start..end, replacement);
        if target.lines.is_empty() {
            target.lines.push(String::new());
        }
        let line_lengths: Vec<usize> = target.lines.iter().map(String::len).collect();

        for window in state
            .windows
            .values_mut()
            .filter(|window| window.buffer == buffer)
        {
            if window.cursor.row > line_lengths.len() {
                window.cursor = Cursor {
                    row: line_lengths.len(),
                    col: 0,
                };
            }
            let line_len = line_lengths[window.cursor.row - 1];
            window.cursor.col = window.cursor.col.min(line_len);
        }
        Ok(())
    }

    pub async fn window_buffer(&self, window: WindowHandle) -> Result<BufferHandle, AppError> {
        Ok(self.state.read().await.window(window)?.buffer)
    }

    pub async fn cursor(&self, window: WindowHandle) -> Result<Cursor, AppError> {
        Ok(self.state.read().await.window(window)?.cursor)
    }

    /// Moves the cursor; the column is clamped to the length of the target line.
    pub async fn set_cursor(
        &self,
        window: WindowHandle,
        row: usize,
        col: usize,
    ) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let buffer = state.window(window)?.buffer;
        let line_len = {
            let lines = &state.buffer(buffer)?.lines;
            if row == 0 || row > lines.len() {
                return Err(AppError::bad_request(
                    "cursor_out_of_bounds",
                    format!("cursor row {row} is outside 1..={}", lines.len()),
                ));
            }
            lines[row - 1].len()
        };

        if let Some(target) = state.windows.get_mut(&window) {
            target.cursor = Cursor {
                row,
                col: col.min(line_len),
            };
        }
        Ok(())
    }

    /// Queues as much of `keys` as fits and returns the number of bytes queued.
    pub async fn push_input(&self, keys: &str) -> usize {
        let mut state = self.state.write().await;
        let available = TYPEAHEAD_CAPACITY.saturating_sub(state.typeahead.len());

        let mut accepted = keys.len().min(available);
        while !keys.is_char_boundary(accepted) {
            accepted -= 1;
        }
        state.typeahead.push_str(&keys[..accepted]);
        accepted
    }

    pub async fn pending_input(&self) -> String {
        self.state.read().await.typeahead.clone()
    }

    /// Drains the typeahead queue, freeing its capacity for later input.
    pub async fn take_input(&self) -> String {
        std::mem::take(&mut self.state.write().await.typeahead)
    }
}

fn check_range(start: usize, end: usize) -> Result<(), AppError> {
    if start > end {
        return Err(AppError::bad_request(
            "start_after_end",
            "start index must not be greater than end index",
        ));
    }
    Ok(())
}

/// Resolves a possibly negative line index; `-1` addresses the position past the last line.
fn normalize_index(index: i64, len: usize, strict: bool) -> Result<usize, AppError> {
    let len = i64::try_from(len).map_err(|_| AppError::internal("buffer too large"))?;
    let resolved = if index < 0 { len + 1 + index } else { index };

    if (0..=len).contains(&resolved) {
        return Ok(resolved as usize);
    }
    if strict {
        return Err(AppError::bad_request(
            "index_out_of_bounds",
            format!("line index {index} is out of bounds"),
        ));
    }
    Ok(resolved.clamp(0, len) as usize)
}

fn invalid_buffer(handle: BufferHandle) -> AppError {
    AppError::bad_request("invalid_buffer", format!("buffer {} does not exist", handle.0))
}

fn invalid_window(handle: WindowHandle) -> AppError {
    AppError::bad_request("invalid_window", format!("window {} does not exist", handle.0))
}
