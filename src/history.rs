//! # History Walker
//!
//! Lazy, finite, restartable sequence of commands from a shell history
//! file. Lines are read through a `BufReader` one at a time, never the
//! whole file at once.
//!
//! Shell history packs several commands onto one physical line with `;`,
//! so the walker splits compound lines; every segment keeps the physical
//! line number. Blank and whitespace-only segments are skipped here and
//! never reach the classifier. Restart by calling `open` on the same path
//! again.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::{HistmapError, HistmapResult, HistoryLine};

#[derive(Debug)]
pub struct HistoryWalker {
    reader: BufReader<File>,
    path: PathBuf,
    /// Physical lines read so far (including blanks), for run metadata.
    raw_lines: u64,
    /// Commands from the current physical line not yet yielded.
    pending: VecDeque<HistoryLine>,
}

impl HistoryWalker {
    /// Open a history file. A missing or unreadable file is a fatal IO
    /// error carrying the offending path.
    pub fn open(path: &Path) -> HistmapResult<Self> {
        let file = File::open(path).map_err(|e| HistmapError::io(path, e))?;
        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            raw_lines: 0,
            pending: VecDeque::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Physical line count so far. Final total once iteration completes.
    pub fn raw_line_count(&self) -> u64 {
        self.raw_lines
    }

    /// Read physical lines until one yields at least one command.
    fn fill_pending(&mut self) -> HistmapResult<bool> {
        loop {
            let mut line = String::new();
            let bytes = self
                .reader
                .read_line(&mut line)
                .map_err(|e| HistmapError::io(self.path.as_path(), e))?;
            if bytes == 0 {
                return Ok(false); // EOF
            }

            self.raw_lines += 1;
            let number = self.raw_lines;
            let trimmed = line.trim_end_matches(['\n', '\r']);

            for command in trimmed.split(';') {
                let command = command.trim();
                if !command.is_empty() {
                    self.pending.push_back(HistoryLine {
                        raw: command.to_string(),
                        number,
                    });
                }
            }

            if !self.pending.is_empty() {
                return Ok(true);
            }
        }
    }
}

impl Iterator for HistoryWalker {
    type Item = HistmapResult<HistoryLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(line) = self.pending.pop_front() {
            return Some(Ok(line));
        }
        match self.fill_pending() {
            Ok(true) => self.pending.pop_front().map(Ok),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
