use ropey::Rope;
use std::{fs::File, io, path::Path, path::PathBuf};

/// Cursor position in chars; `col` may sit one past the line's last char
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub col: usize,
}

/// Source text being edited in the playground
pub struct Buffer {
    text: Rope,
    filepath: Option<PathBuf>,
    cursor: Cursor,
    revision: u64,
}

impl Buffer {
    pub fn new() -> Self {
        Self::from_text("")
    }

    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = Rope::from_reader(File::open(path)?)?;
        Ok(Self {
            text,
            filepath: Some(path.to_path_buf()),
            cursor: Cursor::default(),
            revision: 0,
        })
    }

    pub fn from_text(s: &str) -> Self {
        Self {
            text: Rope::from_str(s),
            filepath: None,
            cursor: Cursor::default(),
            revision: 0,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.filepath.as_deref()
    }

    /// Incremented on every edit
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    pub fn line(&self, idx: usize) -> ropey::RopeSlice<'_> {
        self.text.line(idx)
    }

    pub fn line_len(&self, idx: usize) -> usize {
        // Length excluding newline character
        let line = self.text.line(idx);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    fn cursor_char(&self) -> usize {
        self.text.line_to_char(self.cursor.line) + self.cursor.col
    }

    fn edited(&mut self) {
        self.revision += 1;
    }

    pub fn insert_char(&mut self, ch: char) {
        let idx = self.cursor_char();
        self.text.insert_char(idx, ch);
        if ch == '\n' {
            self.cursor = Cursor {
                line: self.cursor.line + 1,
                col: 0,
            };
        } else {
            self.cursor.col += 1;
        }
        self.edited();
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Delete the character before the cursor, joining lines at column 0
    pub fn backspace(&mut self) -> bool {
        let idx = self.cursor_char();
        if idx == 0 {
            return false;
        }
        if self.cursor.col > 0 {
            self.cursor.col -= 1;
        } else {
            self.cursor.line -= 1;
            self.cursor.col = self.line_len(self.cursor.line);
        }
        self.text.remove(idx - 1..idx);
        self.edited();
        true
    }

    /// Delete the character under the cursor
    pub fn delete(&mut self) -> bool {
        let idx = self.cursor_char();
        if idx >= self.text.len_chars() {
            return false;
        }
        self.text.remove(idx..idx + 1);
        self.edited();
        true
    }

    pub fn move_left(&mut self) {
        if self.cursor.col > 0 {
            self.cursor.col -= 1;
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.col = self.line_len(self.cursor.line);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor.col < self.line_len(self.cursor.line) {
            self.cursor.col += 1;
        } else if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.col = self.cursor.col.min(self.line_len(self.cursor.line));
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.col = self.cursor.col.min(self.line_len(self.cursor.line));
        }
    }

    pub fn move_home(&mut self) {
        self.cursor.col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor.col = self.line_len(self.cursor.line);
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buf = Buffer::new();
        assert_eq!(buf.line_count(), 1); // empty rope has 1 line
        assert_eq!(buf.text(), "");
    }

    #[test]
    fn line_len_excludes_newline() {
        let buf = Buffer::from_text("hello\n\nworld");
        assert_eq!(buf.line_len(0), 5);
        assert_eq!(buf.line_len(1), 0);
        assert_eq!(buf.line_len(2), 5);
    }

    #[test]
    fn typing_moves_cursor_and_bumps_revision() {
        let mut buf = Buffer::new();
        for ch in "# Hi".chars() {
            buf.insert_char(ch);
        }
        buf.insert_newline();
        buf.insert_char('x');
        assert_eq!(buf.text(), "# Hi\nx");
        assert_eq!(buf.cursor(), Cursor { line: 1, col: 1 });
        assert_eq!(buf.revision(), 6);
    }

    #[test]
    fn backspace_joins_lines() {
        let mut buf = Buffer::from_text("ab\ncd");
        buf.move_down();
        assert_eq!(buf.cursor(), Cursor { line: 1, col: 0 });
        assert!(buf.backspace());
        assert_eq!(buf.text(), "abcd");
        assert_eq!(buf.cursor(), Cursor { line: 0, col: 2 });
    }

    #[test]
    fn backspace_at_start_does_nothing() {
        let mut buf = Buffer::from_text("abc");
        assert!(!buf.backspace());
        assert_eq!(buf.revision(), 0);
    }

    #[test]
    fn delete_and_movement() {
        let mut buf = Buffer::from_text("abc\nde");
        buf.move_end();
        assert_eq!(buf.cursor().col, 3);
        buf.move_right();
        assert_eq!(buf.cursor(), Cursor { line: 1, col: 0 });
        buf.move_up();
        buf.move_home();
        assert!(buf.delete());
        assert_eq!(buf.text(), "bc\nde");
        buf.move_left();
        assert_eq!(buf.cursor(), Cursor { line: 0, col: 0 });
    }

    #[test]
    fn multibyte_characters_are_single_steps() {
        let mut buf = Buffer::from_text("日本");
        buf.move_right();
        buf.insert_char('🎉');
        assert_eq!(buf.text(), "日🎉本");
    }

    #[test]
    fn from_file_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Title\n").unwrap();
        let buf = Buffer::from_file(&path).unwrap();
        assert_eq!(buf.text(), "# Title\n");
        assert_eq!(buf.path(), Some(path.as_path()));
        assert!(Buffer::from_file(&dir.path().join("missing.md")).is_err());
    }
}
