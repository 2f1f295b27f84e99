use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use crate::checksum::checksum;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    Read,
    Write,
}

/// Timing of a single channel transfer, printed when benchmarking is enabled.
#[derive(Clone, Debug)]
pub struct Sample {
    pub direction: Direction,
    pub channel: u8,
    pub length: usize,
    pub checksum: u16,
    pub elapsed: Duration,
}

impl Sample {
    pub fn new(direction: Direction, channel: u8, data: &[u8], elapsed: Duration) -> Sample {
        Sample {
            direction,
            channel,
            length: data.len(),
            checksum: checksum(data),
            elapsed,
        }
    }

    /// Throughput in MiB/s. A transfer too fast to be timed counts as zero.
    pub fn speed(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.length as f64 / (1024.0 * 1024.0 * seconds)
    }
}

impl Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (verb, preposition) = match self.direction {
            Direction::Read => ("Read", "from"),
            Direction::Write => ("Wrote", "to"),
        };
        write!(
            f,
            "{} {} bytes (checksum 0x{:04X}) {} channel {} at {:.6} MiB/s",
            verb,
            self.length,
            self.checksum,
            preposition,
            self.channel,
            self.speed()
        )
    }
}

/// Runs `op` and returns its result together with the wall-clock time it took.
pub fn timed<T>(op: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let result = op();
    (result, start.elapsed())
}

#[test]
fn read_sample_line() {
    let sample = Sample::new(
        Direction::Read,
        5,
        &[0u8; 1024 * 1024],
        Duration::from_millis(500),
    );
    assert_eq!(
        sample.to_string(),
        "Read 1048576 bytes (checksum 0x0000) from channel 5 at 2.000000 MiB/s"
    );
}

#[test]
fn write_sample_line() {
    let sample = Sample::new(Direction::Write, 0x7f, &[0x1a, 0x2b], Duration::from_secs(1));
    assert_eq!(
        sample.to_string(),
        "Wrote 2 bytes (checksum 0x0045) to channel 127 at 0.000002 MiB/s"
    );
}

#[test]
fn untimed_sample_has_zero_speed() {
    let sample = Sample::new(Direction::Write, 3, &[0x01; 16], Duration::ZERO);
    assert_eq!(sample.speed(), 0.0);
    assert_eq!(
        sample.to_string(),
        "Wrote 16 bytes (checksum 0x0010) to channel 3 at 0.000000 MiB/s"
    );
}
