use crate::error::{Error, Result};
use crate::sample::Sample;

/// Fixed-capacity sample history that overwrites its oldest entry once full.
#[derive(Debug)]
pub struct Ringbuffer {
    // Reserved up front; grows by push until full, then slots are overwritten
    buffer: Vec<Sample>,
    capacity: usize,
    write_index: u64,
}

impl Ringbuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfiguration { capacity: 0 });
        }
        let mut buffer = Vec::new();
        if let Err(err) = buffer.try_reserve_exact(capacity) {
            log::warn!("Failed to allocate {} samples: {}", capacity, err);
            return Err(Error::CapacityTooLarge { capacity });
        }
        Ok(Self {
            buffer,
            capacity,
            write_index: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of samples ever written, including overwritten ones.
    pub fn write_index(&self) -> u64 {
        self.write_index
    }

    pub fn valid_count(&self) -> usize {
        self.write_index.min(self.capacity() as u64) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.write_index == 0
    }

    // Runs inside the statement hook: no allocation.
    pub fn write(&mut self, sample: Sample) {
        if self.buffer.len() < self.capacity {
            // Within the reserved capacity, so this never reallocates
            self.buffer.push(sample);
        } else {
            let slot = self.slot(self.write_index);
            self.buffer[slot] = sample;
        }
        self.write_index += 1;
    }

    /// The most recently written sample.
    pub fn last(&self) -> Option<&Sample> {
        if self.is_empty() {
            return None;
        }
        Some(&self.buffer[self.slot(self.write_index - 1)])
    }

    /// Valid samples, oldest to newest.
    pub fn iter(&self) -> Iter<'_> {
        let start = if self.write_index > self.capacity() as u64 {
            self.slot(self.write_index)
        } else {
            0
        };
        Iter {
            buffer: &self.buffer,
            start,
            position: 0,
            len: self.valid_count(),
        }
    }

    fn slot(&self, index: u64) -> usize {
        (index % self.capacity() as u64) as usize
    }
}

impl<'a> IntoIterator for &'a Ringbuffer {
    type Item = &'a Sample;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Debug)]
pub struct Iter<'a> {
    buffer: &'a [Sample],
    start: usize,
    position: usize,
    len: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Sample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position == self.len {
            return None;
        }
        let slot = (self.start + self.position) % self.buffer.len();
        self.position += 1;
        Some(&self.buffer[slot])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SourceName;

    fn sample(line: i32) -> Sample {
        Sample {
            source: SourceName::new("a.rb"),
            line,
            memory_used: line as u64 * 100,
            memory_delta: 0,
        }
    }

    fn lines(ringbuffer: &Ringbuffer) -> Vec<i32> {
        ringbuffer.iter().map(|s| s.line).collect()
    }

    #[test]
    fn test_ringbuffer_zero_capacity() {
        assert!(matches!(
            Ringbuffer::new(0),
            Err(Error::InvalidConfiguration { capacity: 0 })
        ));
    }

    #[test]
    fn test_ringbuffer_capacity_too_large() {
        assert!(matches!(
            Ringbuffer::new(usize::MAX),
            Err(Error::CapacityTooLarge { capacity: usize::MAX })
        ));
    }

    #[test]
    fn test_ringbuffer_empty() {
        let ringbuffer = Ringbuffer::new(2).unwrap();
        assert_eq!(ringbuffer.valid_count(), 0);
        assert_eq!(ringbuffer.last(), None);
        assert_eq!(ringbuffer.iter().next(), None);
    }

    #[test]
    fn test_ringbuffer_partially_filled() {
        let mut ringbuffer = Ringbuffer::new(4).unwrap();
        ringbuffer.write(sample(1));
        ringbuffer.write(sample(2));

        assert_eq!(ringbuffer.valid_count(), 2);
        assert_eq!(lines(&ringbuffer), vec![1, 2]);
        assert_eq!(ringbuffer.last().unwrap().line, 2);
    }

    #[test]
    fn test_ringbuffer_exactly_full() {
        let mut ringbuffer = Ringbuffer::new(3).unwrap();
        for line in 1..=3 {
            ringbuffer.write(sample(line));
        }
        assert_eq!(ringbuffer.write_index(), 3);
        assert_eq!(lines(&ringbuffer), vec![1, 2, 3]);
    }

    #[test]
    fn test_ringbuffer_overwrites_oldest() {
        let mut ringbuffer = Ringbuffer::new(3).unwrap();
        for line in 1..=4 {
            ringbuffer.write(sample(line));
        }
        assert_eq!(ringbuffer.write_index(), 4);
        assert_eq!(ringbuffer.valid_count(), 3);
        assert_eq!(lines(&ringbuffer), vec![2, 3, 4]);
        assert_eq!(ringbuffer.last().unwrap().line, 4);
    }

    #[test]
    fn test_ringbuffer_write_a_lot() {
        let mut ringbuffer = Ringbuffer::new(5).unwrap();
        for line in 1..=1003 {
            ringbuffer.write(sample(line));
        }
        assert_eq!(ringbuffer.valid_count(), 5);
        assert_eq!(ringbuffer.iter().len(), 5);
        assert_eq!(lines(&ringbuffer), vec![999, 1000, 1001, 1002, 1003]);
        // Iteration can be restarted
        assert_eq!(lines(&ringbuffer), vec![999, 1000, 1001, 1002, 1003]);
    }
}
