//! Human-readable traffic, duration and balance formatting.
//!
//! Pure and locale-free: the same input always renders the same string.

use std::fmt;
use std::time::Duration;

const FLUX_UNITS: [&str; 3] = ["K", "M", "G"];

/// Traffic in bytes, rendered with decimal units (`"0 B"`, `"1.50 K"`, `"3.20 G"`).
pub struct FmtFlux(pub u64);

impl fmt::Display for FmtFlux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 1000 {
            return write!(f, "{} B", self.0);
        }
        let mut value = self.0 as f64 / 1000.0;
        let mut unit = 0;
        while value >= 1000.0 && unit + 1 < FLUX_UNITS.len() {
            value /= 1000.0;
            unit += 1;
        }
        write!(f, "{value:.2} {}", FLUX_UNITS[unit])
    }
}

/// Elapsed time as `hh:mm:ss`, or `d.hh:mm:ss` past one day.
pub struct FmtDuration(pub Duration);

impl fmt::Display for FmtDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut total = self.0.as_secs();
        let sec = total % 60;
        total /= 60;
        let min = total % 60;
        total /= 60;
        let hour = total % 24;
        let days = total / 24;
        if days > 0 {
            write!(f, "{days}.{hour:02}:{min:02}:{sec:02}")
        } else {
            write!(f, "{hour:02}:{min:02}:{sec:02}")
        }
    }
}

pub fn format_flux(bytes: u64) -> String {
    FmtFlux(bytes).to_string()
}

pub fn format_duration(duration: Duration) -> String {
    FmtDuration(duration).to_string()
}

/// Account balance with two decimals.
pub fn format_balance(balance: f64) -> String {
    format!("{balance:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads a rendered flux string back into bytes.
    fn parse_flux(s: &str) -> f64 {
        let (num, unit) = s.split_once(' ').unwrap();
        let scale = match unit {
            "B" => 1.0,
            "K" => 1e3,
            "M" => 1e6,
            "G" => 1e9,
            other => panic!("unexpected unit {other}"),
        };
        num.parse::<f64>().unwrap() * scale
    }

    #[test]
    fn test_flux_zero_baseline() {
        assert_eq!(format_flux(0), "0 B");
    }

    #[test]
    fn test_flux_golden_values() {
        assert_eq!(format_flux(999), "999 B");
        assert_eq!(format_flux(1000), "1.00 K");
        assert_eq!(format_flux(1500), "1.50 K");
        assert_eq!(format_flux(2_345_678), "2.35 M");
        assert_eq!(format_flux(3_200_000_000), "3.20 G");
        assert_eq!(format_flux(12_000_000_000_000), "12000.00 G");
    }

    #[test]
    fn test_flux_recovers_magnitude_within_rounding() {
        for bytes in [1u64, 512, 1001, 65_536, 7_777_777, 123_456_789_012] {
            let shown = format_flux(bytes);
            let back = parse_flux(&shown);
            let unit = if bytes < 1000 {
                1.0
            } else if bytes < 1_000_000 {
                1e3
            } else if bytes < 1_000_000_000 {
                1e6
            } else {
                1e9
            };
            // Two decimals of the chosen unit.
            assert!(
                (back - bytes as f64).abs() <= unit * 0.005 + f64::EPSILON,
                "{bytes} rendered as {shown}"
            );
        }
    }

    #[test]
    fn test_duration_zero() {
        assert_eq!(format_duration(Duration::ZERO), "00:00:00");
    }

    #[test]
    fn test_duration_golden_values() {
        assert_eq!(format_duration(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_duration(Duration::from_secs(3661)), "01:01:01");
        assert_eq!(format_duration(Duration::from_secs(86_399)), "23:59:59");
        assert_eq!(format_duration(Duration::from_secs(86_400)), "1.00:00:00");
        assert_eq!(format_duration(Duration::from_secs(2 * 86_400 + 5)), "2.00:00:05");
    }

    #[test]
    fn test_duration_ignores_subsecond_part() {
        assert_eq!(format_duration(Duration::from_millis(1999)), "00:00:01");
    }

    #[test]
    fn test_duration_is_monotonic() {
        let to_secs = |s: &str| -> u64 {
            let (days, rest) = s.split_once('.').unwrap_or(("0", s));
            let parts: Vec<u64> = rest.split(':').map(|p| p.parse().unwrap()).collect();
            days.parse::<u64>().unwrap() * 86_400 + parts[0] * 3600 + parts[1] * 60 + parts[2]
        };
        let mut last = 0;
        for secs in (0..200_000).step_by(997) {
            let shown = to_secs(&format_duration(Duration::from_secs(secs)));
            assert_eq!(shown, secs);
            assert!(shown >= last);
            last = shown;
        }
    }

    #[test]
    fn test_balance_two_decimals() {
        assert_eq!(format_balance(0.0), "0.00");
        assert_eq!(format_balance(12.346), "12.35");
        assert_eq!(format_balance(-3.0), "-3.00");
    }
}
