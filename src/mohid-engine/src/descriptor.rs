// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Reader for MOHID keyword files (`nomfich.dat`, `Model.dat`, ...).
//!
//! Each top-level line is `KEYWORD : value`. Everything after a `!` is a
//! comment. Lines between `<begin_x>` and `<end_x>` markers form blocks;
//! their keywords are not visible as top-level keywords. When a keyword
//! repeats, the first occurrence wins, matching how MOHID searches its
//! input files.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::common::Result;
use crate::init_err;
use crate::instant::parse_instant;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    value: String,
    line: usize,
}

#[derive(Clone, Debug)]
pub struct Descriptor {
    path: PathBuf,
    keywords: HashMap<String, Entry>,
    blocks: Vec<String>,
}

enum Marker<'a> {
    Begin(&'a str),
    End(&'a str),
}

/// `<begin_x>`, `<<end_x>>` or `<BeginX>`; anything else in angle brackets
/// (`<endless>`) is not a marker.
fn block_marker(line: &str) -> Option<Marker<'_>> {
    if !line.starts_with('<') {
        return None;
    }
    let inner = line.trim_start_matches('<').trim_end_matches('>').trim();
    if let Some(name) = marker_name(inner, "begin", "Begin") {
        Some(Marker::Begin(name))
    } else {
        marker_name(inner, "end", "End").map(Marker::End)
    }
}

fn marker_name<'a>(inner: &'a str, snake: &str, camel: &str) -> Option<&'a str> {
    if inner.len() < snake.len() || !inner.is_char_boundary(snake.len()) {
        return None;
    }
    let (head, rest) = inner.split_at(snake.len());
    let snake_boundary =
        head.eq_ignore_ascii_case(snake) && (rest.is_empty() || rest.starts_with('_'));
    let camel_boundary = head == camel && rest.starts_with(|c: char| c.is_ascii_uppercase());
    (snake_boundary || camel_boundary).then_some(rest)
}

fn block_name(suffix: &str) -> String {
    suffix.trim_start_matches('_').to_ascii_lowercase()
}

impl Descriptor {
    /// Reads and parses the keyword file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return init_err!(DoesNotExist, format!("{}", path.display()));
            }
            Err(err) => {
                return init_err!(Io, format!("{}: {err}", path.display()));
            }
        };
        Self::parse(path, &source)
    }

    pub fn parse(path: &Path, source: &str) -> Result<Self> {
        let mut keywords: HashMap<String, Entry> = HashMap::new();
        let mut blocks = Vec::new();
        let mut open_blocks: Vec<(String, usize)> = Vec::new();

        for (i, raw) in source.lines().enumerate() {
            let line_no = i + 1;
            let line = match raw.find('!') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            match block_marker(line) {
                Some(Marker::Begin(suffix)) => {
                    let name = block_name(suffix);
                    if open_blocks.is_empty() {
                        blocks.push(name.clone());
                    }
                    open_blocks.push((name, line_no));
                    continue;
                }
                Some(Marker::End(suffix)) => {
                    let name = block_name(suffix);
                    match open_blocks.pop() {
                        Some((open, _)) if open == name => {}
                        Some((open, opened_at)) => {
                            return init_err!(
                                UnexpectedBlockEnd,
                                format!(
                                    "{}:{line_no}: end of '{name}' while '{open}' (line {opened_at}) is open",
                                    path.display()
                                )
                            );
                        }
                        None => {
                            return init_err!(
                                UnexpectedBlockEnd,
                                format!("{}:{line_no}: end of '{name}' outside any block", path.display())
                            );
                        }
                    }
                    continue;
                }
                None => {}
            }

            if !open_blocks.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                debug!(path = %path.display(), line = line_no, "ignoring line without keyword");
                continue;
            };
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim().to_string();

            if let Some(first) = keywords.get(&key) {
                warn!(
                    path = %path.display(),
                    keyword = %key,
                    first = first.line,
                    repeated = line_no,
                    "repeated keyword, keeping the first value"
                );
                continue;
            }
            keywords.insert(
                key,
                Entry {
                    value,
                    line: line_no,
                },
            );
        }

        if let Some((name, opened_at)) = open_blocks.pop() {
            return init_err!(
                UnterminatedBlock,
                format!("{}:{opened_at}: block '{name}' is never closed", path.display())
            );
        }

        Ok(Descriptor {
            path: path.to_path_buf(),
            keywords,
            blocks,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the top-level blocks, in file order.
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keywords.contains_key(&key.to_ascii_uppercase())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.keywords
            .get(&key.to_ascii_uppercase())
            .map(|entry| entry.value.as_str())
    }

    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(value) => Ok(value),
            None => init_err!(
                MissingKeyword,
                format!("{} in {}", key.to_ascii_uppercase(), self.path.display())
            ),
        }
    }

    fn bad_value<T>(&self, key: &str, value: &str, expected: &str) -> Result<T> {
        init_err!(
            BadKeywordValue,
            format!(
                "{} in {}: expected {expected}, got '{value}'",
                key.to_ascii_uppercase(),
                self.path.display()
            )
        )
    }

    pub fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match value.parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(Some(number)),
            _ => self.bad_value(key, value, "a number"),
        }
    }

    /// MOHID logicals are written as `0`/`1`; `true`/`false` and the Fortran
    /// spellings are accepted as well.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().trim_matches('.') {
            "1" | "true" | "t" => Ok(Some(true)),
            "0" | "false" | "f" => Ok(Some(false)),
            _ => self.bad_value(key, value, "0 or 1"),
        }
    }

    pub fn get_instant(&self, key: &str) -> Result<Option<NaiveDateTime>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match parse_instant(value) {
            Ok(instant) => Ok(Some(instant)),
            Err(mut err) => {
                err.details = Some(format!(
                    "{} in {}: {}",
                    key.to_ascii_uppercase(),
                    self.path.display(),
                    err.details.take().unwrap_or_default()
                ));
                Err(err)
            }
        }
    }

    /// Resolves a path-valued keyword relative to the directory holding this
    /// file. MOHID projects are usually authored on Windows, so `\` is
    /// treated as a separator on every platform.
    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        let value = self.get(key)?;
        let normalized = if cfg!(windows) {
            value.to_string()
        } else {
            value.replace('\\', "/")
        };
        let path = PathBuf::from(normalized);
        if path.is_absolute() {
            return Some(path);
        }
        let base = self.path.parent().unwrap_or_else(|| Path::new(""));
        Some(base.join(path))
    }
}
