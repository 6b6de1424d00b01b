//! Editable text buffers for the question field and the SQL editor.
//!
//! The cursor is a character index, never a byte index, so non-ASCII input
//! cannot split a code point.

/// Find the start position of the word before the cursor.
///
/// Words are delimited by whitespace; punctuation is part of the word.
/// Returns 0 if cursor is at start or only whitespace precedes it.
pub fn find_word_start_backward(text: &str, cursor: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut pos = cursor.min(chars.len());

    while pos > 0 && chars[pos - 1].is_whitespace() {
        pos -= 1;
    }
    while pos > 0 && !chars[pos - 1].is_whitespace() {
        pos -= 1;
    }

    pos
}

/// A text buffer with a cursor.
///
/// Single-line buffers ignore [`TextBuffer::newline`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    /// Cursor position (character index).
    cursor: usize,
    multiline: bool,
}

impl TextBuffer {
    /// Creates an empty single-line buffer.
    pub fn single_line() -> Self {
        Self::default()
    }

    /// Creates an empty buffer that accepts newlines.
    pub fn multi_line() -> Self {
        Self {
            multiline: true,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of characters in the buffer.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Number of lines, at least 1.
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Replaces the content and puts the cursor at the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        if !self.multiline {
            self.text = self.text.replace('\n', " ");
        }
        self.cursor = self.char_count();
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        if c == '\n' && !self.multiline {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Inserts a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            self.insert(c);
        }
    }

    /// Splits the line at the cursor. No-op for single-line buffers.
    pub fn newline(&mut self) {
        self.insert('\n');
    }

    /// Deletes the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Deletes the word before the cursor (Ctrl+W).
    pub fn delete_word_backward(&mut self) {
        let start = find_word_start_backward(&self.text, self.cursor);
        let from = self.byte_index(start);
        let to = self.byte_index(self.cursor);
        self.text.replace_range(from..to, "");
        self.cursor = start;
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    /// Moves the cursor to the start of the current line.
    pub fn move_home(&mut self) {
        let (line, _) = self.cursor_line_col();
        self.cursor = self.line_start(line);
    }

    /// Moves the cursor to the end of the current line.
    pub fn move_end(&mut self) {
        let (line, _) = self.cursor_line_col();
        self.cursor = self.line_start(line) + self.line_len(line);
    }

    /// Moves the cursor up one line, keeping the column where possible.
    pub fn move_up(&mut self) {
        let (line, col) = self.cursor_line_col();
        if line > 0 {
            self.cursor = self.line_start(line - 1) + col.min(self.line_len(line - 1));
        }
    }

    /// Moves the cursor down one line, keeping the column where possible.
    pub fn move_down(&mut self) {
        let (line, col) = self.cursor_line_col();
        if line + 1 < self.line_count() {
            self.cursor = self.line_start(line + 1) + col.min(self.line_len(line + 1));
        }
    }

    /// Returns the cursor as a zero-based (line, column) pair in characters.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for c in self.text.chars().take(self.cursor) {
            if c == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    fn line_start(&self, line: usize) -> usize {
        self.text
            .split('\n')
            .take(line)
            .map(|l| l.chars().count() + 1)
            .sum()
    }

    fn line_len(&self, line: usize) -> usize {
        self.text
            .split('\n')
            .nth(line)
            .map_or(0, |l| l.chars().count())
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(i, _)| i)
    }
}
