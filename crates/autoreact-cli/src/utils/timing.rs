use cpu_time::ProcessTime;
use std::time::{Duration, Instant};

/// Wall-clock and process CPU time since creation.
pub struct Stopwatch {
    wall: Instant,
    cpu: ProcessTime,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            wall: Instant::now(),
            cpu: ProcessTime::now(),
        }
    }

    pub fn wall_elapsed(&self) -> Duration {
        self.wall.elapsed()
    }

    pub fn cpu_elapsed(&self) -> Duration {
        self.cpu.elapsed()
    }

    pub fn summary(&self) -> String {
        format!(
            "Total Timings\n==========================\nWall Time:  {}\nCPU Time:   {}\n==========================",
            format_hms(self.wall_elapsed()),
            format_hms(self.cpu_elapsed())
        )
    }
}

/// Formats a duration as `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_hms(Duration::ZERO), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_hms(Duration::from_millis(3_661_900)), "01:01:01");
        assert_eq!(format_hms(Duration::from_secs(30 * 3600 + 5)), "30:00:05");
    }

    #[test]
    fn summary_reports_both_clocks() {
        let watch = Stopwatch::start();
        let summary = watch.summary();
        assert!(summary.contains("Wall Time:  00:00:0"));
        assert!(summary.contains("CPU Time:   00:00:0"));
    }
}
