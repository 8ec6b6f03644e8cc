//! 2DA V2.0 rule table parsing.
//!
//! ```text
//! 2DA V2.0
//! DEFAULT: ****
//!
//!      Label        Cleric   Druid
//! 0    Acid_Fog     ****     ****
//! 1    "Cure Light" 1        1
//! ```
//!
//! Cells are whitespace separated, double quotes allow spaces, and `****`
//! means "no value".

use std::path::Path;

/// Sentinel for an empty cell.
pub const EMPTY_CELL: &str = "****";

const HEADER: &str = "2DA V2.0";

#[derive(Debug, thiserror::Error)]
pub enum TwoDaError {
    #[error("missing '2DA V2.0' header")]
    MissingHeader,
    #[error("table has no column header line")]
    MissingColumns,
    #[error("line {line}: {message}")]
    MalformedRow { line: usize, message: String },
    #[error("I/O error reading table: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoDaRow {
    /// Row index as written in the file
    pub index: u32,
    cells: Vec<Option<String>>,
}

impl TwoDaRow {
    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells.get(column).and_then(|c| c.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwoDaTable {
    columns: Vec<String>,
    rows: Vec<TwoDaRow>,
}

impl TwoDaTable {
    pub fn parse(text: &str) -> Result<Self, TwoDaError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let header = lines.next().map(|(_, line)| line).unwrap_or_default();
        if header.split_whitespace().collect::<Vec<_>>().join(" ") != HEADER {
            return Err(TwoDaError::MissingHeader);
        }

        let mut columns = None;
        for (number, line) in lines.by_ref() {
            // Out-of-range row lookups are not served.
            if line.starts_with("DEFAULT:") {
                continue;
            }
            columns = Some(tokenize(line, number)?);
            break;
        }
        let columns = columns.ok_or(TwoDaError::MissingColumns)?;

        let mut rows = Vec::new();
        for (number, line) in lines {
            let mut tokens = tokenize(line, number)?.into_iter();
            let index = tokens
                .next()
                .and_then(|t| t.parse::<u32>().ok())
                .ok_or_else(|| TwoDaError::MalformedRow {
                    line: number,
                    message: "row does not start with a numeric index".to_string(),
                })?;
            let cells: Vec<Option<String>> = tokens.map(|t| cell_value(&t)).collect();
            if cells.len() > columns.len() {
                return Err(TwoDaError::MalformedRow {
                    line: number,
                    message: format!(
                        "{} cells for {} columns",
                        cells.len(),
                        columns.len()
                    ),
                });
            }
            rows.push(TwoDaRow { index, cells });
        }

        Ok(Self { columns, rows })
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, TwoDaError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text)
    }

    /// Column position, matched case-insensitively.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[TwoDaRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn cell_value(token: &str) -> Option<String> {
    if token.is_empty() || token == EMPTY_CELL {
        None
    } else {
        Some(token.to_string())
    }
}

fn tokenize(line: &str, number: usize) -> Result<Vec<String>, TwoDaError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '"' {
                    closed = true;
                    break;
                }
                token.push(c);
            }
            if !closed {
                return Err(TwoDaError::MalformedRow {
                    line: number,
                    message: "unterminated quote".to_string(),
                });
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}
