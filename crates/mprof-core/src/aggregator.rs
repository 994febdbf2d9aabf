use std::collections::HashMap;

use crate::report::{LineEntry, SourceGroup};
use crate::sample::{Sample, SourceName};

/// Collapses a time-ordered sample stream into one entry per (source, line).
///
/// Later samples overwrite earlier ones for the same location, so each entry holds the
/// memory state observed at the most recent execution of that line. Sources keep the
/// order in which they were first seen.
#[derive(Debug, Default)]
pub struct Aggregator {
    source_index: HashMap<SourceName, usize>,
    sources: Vec<(SourceName, HashMap<i32, LineEntry>)>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest<'a, I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        for sample in samples {
            let sources = &mut self.sources;
            let index = *self.source_index.entry(sample.source).or_insert_with(|| {
                sources.push((sample.source, HashMap::new()));
                sources.len() - 1
            });
            self.sources[index].1.insert(
                sample.line,
                LineEntry {
                    line: sample.line,
                    memory_used: sample.memory_used,
                    memory_delta: sample.memory_delta,
                },
            );
        }
    }

    /// Groups by source, each group sorted by line number.
    pub fn into_groups(self) -> Vec<SourceGroup> {
        self.sources
            .into_iter()
            .map(|(source, lines)| {
                let mut lines: Vec<LineEntry> = lines.into_values().collect();
                lines.sort_by_key(|entry| entry.line);
                SourceGroup {
                    source: source.to_string(),
                    lines,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(source: &str, line: i32, memory_used: u64, memory_delta: i64) -> Sample {
        Sample {
            source: SourceName::new(source),
            line,
            memory_used,
            memory_delta,
        }
    }

    fn aggregate(samples: &[Sample]) -> Vec<SourceGroup> {
        let mut aggregator = Aggregator::new();
        aggregator.ingest(samples);
        aggregator.into_groups()
    }

    #[test]
    fn test_last_write_wins() {
        let groups = aggregate(&[
            sample("a.rb", 5, 1000, 0),
            sample("a.rb", 6, 1200, 200),
            sample("b.rb", 1, 1300, 100),
            sample("a.rb", 7, 1100, -200),
            sample("a.rb", 5, 900, -200),
        ]);

        let a = &groups[0];
        assert_eq!(a.source, "a.rb");
        assert_eq!(
            a.lines[0],
            LineEntry {
                line: 5,
                memory_used: 900,
                memory_delta: -200
            }
        );
    }

    #[test]
    fn test_lines_sorted_within_source() {
        let groups = aggregate(&[
            sample("a.rb", 30, 1, 0),
            sample("a.rb", 10, 2, 1),
            sample("a.rb", 20, 3, 1),
        ]);
        let lines: Vec<i32> = groups[0].lines.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![10, 20, 30]);
    }

    #[test]
    fn test_sources_in_first_seen_order() {
        let groups = aggregate(&[
            sample("z.rb", 1, 1, 0),
            sample("a.rb", 1, 1, 0),
            sample("m.rb", 1, 1, 0),
            sample("a.rb", 2, 1, 0),
        ]);
        let sources: Vec<&str> = groups.iter().map(|g| g.source.as_str()).collect();
        assert_eq!(sources, vec!["z.rb", "a.rb", "m.rb"]);
        assert_eq!(groups[1].lines.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
    }
}
