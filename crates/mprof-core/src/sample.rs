use std::fmt;

/// Maximum number of bytes kept for a source name.
pub const MAX_SOURCE_LEN: usize = 255;

/// Prefix marking a source name that lost its leading bytes.
pub const TRUNCATION_MARK: &str = "...";

/// Location recorded when the host cannot tell where execution is.
pub const UNKNOWN_SOURCE: &str = "[unknown]";
pub const UNKNOWN_LINE: i32 = 1;

/// A source name stored inline so that recording a sample never allocates.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceName {
    len: u8,
    bytes: [u8; MAX_SOURCE_LEN],
}

impl SourceName {
    pub const fn empty() -> Self {
        Self {
            len: 0,
            bytes: [0; MAX_SOURCE_LEN],
        }
    }

    /// Copies `name`. A name that does not fit keeps its tail, cut on a character
    /// boundary and prefixed with [`TRUNCATION_MARK`], so file names stay distinct.
    pub fn new(name: &str) -> Self {
        let mut source = Self::empty();
        if name.len() <= MAX_SOURCE_LEN {
            source.push(name);
            return source;
        }

        let mut start = name.len() - (MAX_SOURCE_LEN - TRUNCATION_MARK.len());
        while !name.is_char_boundary(start) {
            start += 1;
        }
        source.push(TRUNCATION_MARK);
        source.push(&name[start..]);
        source
    }

    // Callers keep the total within MAX_SOURCE_LEN
    fn push(&mut self, part: &str) {
        let start = self.len as usize;
        let end = start + part.len();
        self.bytes[start..end].copy_from_slice(part.as_bytes());
        self.len = end as u8;
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_SOURCE)
    }

    pub fn as_str(&self) -> &str {
        // Only ever filled from a &str cut on a char boundary
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or(UNKNOWN_SOURCE)
    }
}

impl fmt::Debug for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation taken at one executed statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub source: SourceName,
    pub line: i32,
    pub memory_used: u64,
    pub memory_delta: i64,
}

impl Sample {
    pub const fn empty() -> Self {
        Self {
            source: SourceName::empty(),
            line: 0,
            memory_used: 0,
            memory_delta: 0,
        }
    }
}

/// Signed difference `current - previous` between two absolute byte counts.
pub fn memory_delta(previous: u64, current: u64) -> i64 {
    current.wrapping_sub(previous) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_name_round_trips_short_names() {
        let source = SourceName::new("app/models/user.rb");
        assert_eq!(source.as_str(), "app/models/user.rb");
        assert_eq!(source.to_string(), "app/models/user.rb");
    }

    #[test]
    fn test_source_name_keeps_installed_gem_paths() {
        let request = "/home/runner/.rbenv/versions/3.3.0/lib/ruby/gems/3.3.0/gems/rack-3.0.8/lib/rack/request.rb";
        let response = "/home/runner/.rbenv/versions/3.3.0/lib/ruby/gems/3.3.0/gems/rack-3.0.8/lib/rack/response.rb";
        assert_eq!(SourceName::new(request).as_str(), request);
        assert_ne!(SourceName::new(request), SourceName::new(response));
    }

    #[test]
    fn test_source_name_exactly_at_limit() {
        let name = "x".repeat(MAX_SOURCE_LEN);
        assert_eq!(SourceName::new(&name).as_str(), name);
    }

    #[test]
    fn test_source_name_keeps_tail_of_long_names() {
        let dir = "d".repeat(MAX_SOURCE_LEN);
        let a = SourceName::new(&format!("/{}/a.rb", dir));
        let b = SourceName::new(&format!("/{}/b.rb", dir));

        assert_eq!(a.as_str().len(), MAX_SOURCE_LEN);
        assert!(a.as_str().starts_with(TRUNCATION_MARK));
        assert!(a.as_str().ends_with("/a.rb"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_source_name_truncates_on_char_boundary() {
        // The cut point falls inside the 3-byte character, which is dropped whole
        let tail_len = MAX_SOURCE_LEN - TRUNCATION_MARK.len();
        let name = format!("xx€{}", "a".repeat(tail_len - 1));
        let source = SourceName::new(&name);
        assert_eq!(source.as_str(), format!("...{}", "a".repeat(tail_len - 1)));
    }

    #[test]
    fn test_memory_delta() {
        assert_eq!(memory_delta(4096, 5120), 1024);
        assert_eq!(memory_delta(5120, 4096), -1024);
        assert_eq!(memory_delta(0, 0), 0);
    }
}
