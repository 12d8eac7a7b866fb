//! Count formatting for log lines.

/// `"1 block"`, `"3 blocks"`, `"0 templates"`.
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "template"), "0 templates");
        assert_eq!(plural_count(1, "block"), "1 block");
        assert_eq!(plural_count(12, "asset"), "12 assets");
    }
}
