//! Character cursor over shader source
//!
//! The source is held as a list of lines; a `'\n'` is produced between lines
//! so the raw lexer sees line breaks as whitespace.

use super::ast::SourceLocation;
use std::sync::Arc;

pub struct SourceCursor {
    file: Arc<str>,
    lines: Vec<Vec<char>>,
    line: usize,
    column: usize,
}

impl SourceCursor {
    pub fn new(source: &str, file: impl Into<Arc<str>>) -> Self {
        Self::from_lines(source.lines(), file)
    }

    /// Build a cursor over already-split lines
    pub fn from_lines<I, S>(lines: I, file: impl Into<Arc<str>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            file: file.into(),
            lines: lines
                .into_iter()
                .map(|line| line.as_ref().chars().collect())
                .collect(),
            line: 0,
            column: 0,
        }
    }

    pub fn file(&self) -> &Arc<str> {
        &self.file
    }

    /// Location of the next character to be consumed (1-based)
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.file.clone(), self.line + 1, self.column + 1)
    }

    pub fn is_at_end(&self) -> bool {
        self.peek().is_none()
    }

    /// Look at the next character without consuming it
    pub fn peek(&self) -> Option<char> {
        let current = self.lines.get(self.line)?;
        match current.get(self.column) {
            Some(&ch) => Some(ch),
            None if self.line + 1 < self.lines.len() => Some('\n'),
            None => None,
        }
    }

    /// Consume and return the next character
    pub fn get(&mut self) -> Option<char> {
        let ch = self.peek()?;
        if ch == '\n' && self.column >= self.lines[self.line].len() {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Consume the rest of the current line, leaving the line break
    pub fn remaining_on_line(&mut self) -> String {
        let Some(current) = self.lines.get(self.line) else {
            return String::new();
        };
        let start = self.column.min(current.len());
        let rest: String = current[start..].iter().collect();
        self.column = current.len();
        rest
    }
}
