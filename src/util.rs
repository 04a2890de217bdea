/// Format whole seconds as a mm:ss clock. Minutes keep growing past an
/// hour; sessions here are short enough that hours would be noise.
pub fn format_clock(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock_zero() {
        assert_eq!(format_clock(0), "00:00");
    }

    #[test]
    fn test_format_clock_under_a_minute() {
        assert_eq!(format_clock(5), "00:05");
        assert_eq!(format_clock(59), "00:59");
    }

    #[test]
    fn test_format_clock_minutes() {
        assert_eq!(format_clock(60), "01:00");
        assert_eq!(format_clock(83), "01:23");
    }

    #[test]
    fn test_format_clock_past_an_hour() {
        assert_eq!(format_clock(3723), "62:03");
    }
}
