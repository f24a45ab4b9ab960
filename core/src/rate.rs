//! Throughput formatting.
//!
//! Rates are bucketed at powers of 1024 and rendered with one decimal
//! place. A value just below a threshold stays in the lower bucket even
//! when the decimal rounds up (1023.99 renders as "1024.0 B/s").

use crate::sampler::SampleReading;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Format a byte rate as `B/s`, `KB/s` or `MB/s` with one decimal place.
pub fn format_rate(bytes_per_sec: f64) -> String {
    if bytes_per_sec >= MIB {
        format!("{:.1} MB/s", bytes_per_sec / MIB)
    } else if bytes_per_sec >= KIB {
        format!("{:.1} KB/s", bytes_per_sec / KIB)
    } else {
        format!("{:.1} B/s", bytes_per_sec)
    }
}

/// The overlay's two-line readout: download on top, upload below.
pub fn display_text(reading: &SampleReading) -> String {
    format!(
        "↓ {}\n↑ {}",
        format_rate(reading.down_bytes_per_sec),
        format_rate(reading.up_bytes_per_sec)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_zero() {
        assert_eq!(format_rate(0.0), "0.0 B/s");
    }

    #[test]
    fn test_format_bucket_boundaries() {
        assert_eq!(format_rate(1024.0), "1.0 KB/s");
        // Just under the threshold stays in the lower bucket, even though
        // the decimal rounds up to the threshold value.
        assert_eq!(format_rate(1023.99), "1024.0 B/s");
        assert_eq!(format_rate(1048576.0), "1.0 MB/s");
        assert_eq!(format_rate(1048575.0), "1024.0 KB/s");
    }

    #[test]
    fn test_format_monotonic_within_bucket() {
        let numeric = |s: &str| -> f64 {
            s.split_whitespace()
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap()
        };

        for pair in [
            (0.0, 1023.0),
            (1024.0, 1048575.0),
            (1048576.0, 10.0 * 1048576.0),
            (100.0, 100.4),
        ] {
            assert!(numeric(&format_rate(pair.0)) <= numeric(&format_rate(pair.1)));
        }
    }

    #[test]
    fn test_display_text_two_lines() {
        let reading = SampleReading {
            down_bytes_per_sec: 2048.0,
            up_bytes_per_sec: 512.0,
        };
        assert_eq!(display_text(&reading), "↓ 2.0 KB/s\n↑ 512.0 B/s");
    }
}
