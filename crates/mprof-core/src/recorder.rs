use crate::host::{Host, Location, Statement};
use crate::ringbuffer::Ringbuffer;
use crate::sample::{memory_delta, Sample, SourceName, UNKNOWN_LINE};

/// Writes one sample describing `statement` into `buffer`.
///
/// Called from the runtime's statement hook, so failures never escape: an unresolvable
/// location is recorded as `[unknown]:1`.
pub fn record<H: Host, S: Statement + ?Sized>(buffer: &mut Ringbuffer, host: &H, statement: &S) {
    let (source, line) = match statement.location() {
        Ok(Location { source, line }) => (SourceName::new(source), line),
        Err(_) => {
            log::trace!("Statement location unresolved. Recording sentinel location.");
            (SourceName::unknown(), UNKNOWN_LINE)
        }
    };

    let memory_used = host.memory_used_bytes();
    let memory_delta = match buffer.last() {
        Some(previous) => memory_delta(previous.memory_used, memory_used),
        None => 0,
    };

    buffer.write(Sample {
        source,
        line,
        memory_used,
        memory_delta,
    });
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::host::{ContextId, LocationUnresolved};

    struct FixedMemory(Cell<u64>);

    impl Host for FixedMemory {
        type Context = ();

        fn context_id(&self, _context: &()) -> ContextId {
            ContextId::new(0)
        }
        fn set_hook(&self, _context: &(), _id: ContextId) {}
        fn clear_hook(&self, _context: &(), _id: ContextId) {}
        fn memory_used_bytes(&self) -> u64 {
            self.0.get()
        }
    }

    struct Unresolvable;

    impl Statement for Unresolvable {
        fn location(&self) -> Result<Location<'_>, LocationUnresolved> {
            Err(LocationUnresolved)
        }
    }

    #[test]
    fn test_first_sample_has_no_delta() {
        let host = FixedMemory(Cell::new(4096));
        let mut buffer = Ringbuffer::new(4).unwrap();
        record(&mut buffer, &host, &Location { source: "a.rb", line: 3 });

        let sample = buffer.last().unwrap();
        assert_eq!(sample.source.as_str(), "a.rb");
        assert_eq!(sample.line, 3);
        assert_eq!(sample.memory_used, 4096);
        assert_eq!(sample.memory_delta, 0);
    }

    #[test]
    fn test_delta_against_previous_sample() {
        let host = FixedMemory(Cell::new(4096));
        let mut buffer = Ringbuffer::new(4).unwrap();
        record(&mut buffer, &host, &Location { source: "a.rb", line: 1 });
        host.0.set(5120);
        record(&mut buffer, &host, &Location { source: "a.rb", line: 2 });
        host.0.set(1024);
        record(&mut buffer, &host, &Location { source: "b.rb", line: 9 });

        let deltas: Vec<i64> = buffer.iter().map(|s| s.memory_delta).collect();
        assert_eq!(deltas, vec![0, 1024, -4096]);
    }

    #[test]
    fn test_delta_across_wraparound() {
        let host = FixedMemory(Cell::new(100));
        let mut buffer = Ringbuffer::new(2).unwrap();
        for used in [100, 300, 600, 1000] {
            host.0.set(used);
            record(&mut buffer, &host, &Location { source: "a.rb", line: 1 });
        }
        let deltas: Vec<i64> = buffer.iter().map(|s| s.memory_delta).collect();
        assert_eq!(deltas, vec![300, 400]);
    }

    #[test]
    fn test_unresolved_location_uses_sentinel() {
        let host = FixedMemory(Cell::new(10));
        let mut buffer = Ringbuffer::new(1).unwrap();
        record(&mut buffer, &host, &Unresolvable);

        let sample = buffer.last().unwrap();
        assert_eq!(sample.source.as_str(), "[unknown]");
        assert_eq!(sample.line, 1);
        assert_eq!(sample.memory_used, 10);
    }
}
