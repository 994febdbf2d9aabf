//! Text report interleaving source lines with the memory observed on them.

use std::fs;
use std::io::{self, Write};

use super::{LineEntry, Report, SourceGroup};

const HEADER: &str = "--------------------------mem profiler print start --------------------";
const FOOTER: &str = "--------------------------mem profiler print end --------------------";
const GAP_MARKER: &str = "...";

/// Source file contents, indexed by 1-based line number.
#[derive(Debug, Default)]
pub struct SourceText {
    lines: Vec<Option<String>>,
}

impl SourceText {
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| {
                let trimmed = line.trim_end();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_owned())
                }
            })
            .collect();
        Self { lines }
    }

    pub fn line(&self, line: i32) -> Option<&str> {
        let index = usize::try_from(line).ok()?.checked_sub(1)?;
        self.lines.get(index)?.as_deref()
    }
}

/// Where the annotated report gets source text from.
pub trait SourceLoader {
    fn load(&self, source: &str) -> Option<SourceText>;
}

/// Reads sources from the filesystem, treating the source name as a path.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSourceLoader;

impl SourceLoader for FileSourceLoader {
    fn load(&self, source: &str) -> Option<SourceText> {
        match fs::read(source) {
            Ok(bytes) => Some(SourceText::parse(&String::from_utf8_lossy(&bytes))),
            Err(err) => {
                log::trace!("Source {} is not readable: {}", source, err);
                None
            }
        }
    }
}

/// Floor division to whole KiB, rounding negative values towards negative infinity.
pub fn to_kib(bytes: i128) -> i128 {
    bytes.div_euclid(1024)
}

pub fn write_report<W: Write, L: SourceLoader>(
    report: &Report,
    loader: &L,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", HEADER)?;
    for group in report.sources.iter() {
        // Dropped before the next group is loaded
        let text = loader.load(&group.source);
        write_group(group, text.as_ref(), out)?;
    }
    writeln!(out)?;
    writeln!(out, "{}", FOOTER)?;
    Ok(())
}

fn write_group<W: Write>(
    group: &SourceGroup,
    text: Option<&SourceText>,
    out: &mut W,
) -> io::Result<()> {
    let mut last_line: Option<i32> = None;
    for entry in group.lines.iter() {
        if let Some(last_line) = last_line {
            if last_line.checked_add(1) != Some(entry.line) {
                writeln!(out, "{}", GAP_MARKER)?;
            }
        }
        last_line = Some(entry.line);

        match text.and_then(|text| text.line(entry.line)) {
            Some(code) => writeln!(
                out,
                "[{}:{}]--> {}         --{}",
                group.source,
                entry.line,
                code,
                format_memory(entry)
            )?,
            None => writeln!(
                out,
                "{}:{}             --{}",
                group.source,
                entry.line,
                format_memory(entry)
            )?,
        }
    }
    Ok(())
}

fn format_memory(entry: &LineEntry) -> String {
    format!(
        "memory used: {} KB, delta: {} KB",
        to_kib(entry.memory_used as i128),
        to_kib(entry.memory_delta as i128)
    )
}
