pub mod annotated;

use crate::aggregator::Aggregator;
use crate::ringbuffer::Ringbuffer;

/// Memory state observed at the most recent execution of one line.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LineEntry {
    pub line: i32,
    pub memory_used: u64,
    pub memory_delta: i64,
}

/// All reported lines of one source, ascending by line number.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceGroup {
    pub source: String,
    pub lines: Vec<LineEntry>,
}

impl SourceGroup {
    pub fn line(&self, line: i32) -> Option<&LineEntry> {
        self.lines
            .binary_search_by_key(&line, |entry| entry.line)
            .ok()
            .map(|index| &self.lines[index])
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Report {
    /// Samples written over the whole session. Exceeds `valid_samples` once the
    /// buffer has wrapped.
    pub total_samples: u64,
    pub valid_samples: usize,
    pub sources: Vec<SourceGroup>,
}

impl Report {
    pub fn from_buffer(buffer: &Ringbuffer) -> Self {
        let mut aggregator = Aggregator::new();
        aggregator.ingest(buffer);
        let sources = aggregator.into_groups();
        log::trace!(
            "Aggregated {} samples into {} sources",
            buffer.valid_count(),
            sources.len()
        );

        Report {
            total_samples: buffer.write_index(),
            valid_samples: buffer.valid_count(),
            sources,
        }
    }

    /// Samples that were overwritten before this report was taken.
    pub fn evicted_samples(&self) -> u64 {
        self.total_samples - self.valid_samples as u64
    }

    pub fn source(&self, source: &str) -> Option<&SourceGroup> {
        self.sources.iter().find(|group| group.source == source)
    }

    pub fn get(&self, source: &str, line: i32) -> Option<&LineEntry> {
        self.source(source).and_then(|group| group.line(line))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{Sample, SourceName};

    fn filled_buffer() -> Ringbuffer {
        let mut buffer = Ringbuffer::new(3).unwrap();
        for (source, line, used, delta) in [
            ("A", 1, 1000, 0),
            ("A", 2, 1500, 500),
            ("A", 1, 1800, 300),
            ("B", 1, 2000, 200),
        ] {
            buffer.write(Sample {
                source: SourceName::new(source),
                line,
                memory_used: used,
                memory_delta: delta,
            });
        }
        buffer
    }

    #[test]
    fn test_report_from_wrapped_buffer() {
        let report = Report::from_buffer(&filled_buffer());

        assert_eq!(report.total_samples, 4);
        assert_eq!(report.valid_samples, 3);
        assert_eq!(report.evicted_samples(), 1);
        assert_eq!(
            report.get("B", 1),
            Some(&LineEntry {
                line: 1,
                memory_used: 2000,
                memory_delta: 200
            })
        );
        assert_eq!(report.get("A", 1).unwrap().memory_used, 1800);
    }

    #[test]
    fn test_report_to_json() {
        let report = Report::from_buffer(&filled_buffer());
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["total_samples"], 4);
        assert_eq!(json["sources"][1]["source"], "B");
        assert_eq!(json["sources"][1]["lines"][0]["memory_delta"], 200);

        let decoded: Report = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, report);
    }
}
