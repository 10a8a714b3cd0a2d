use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Longest prefix of `text` occupying at most `width` terminal columns.
pub(crate) fn truncate_to_width(text: &str, width: usize) -> &str {
    let mut used = 0;
    for (idx, c) in text.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            return &text[..idx];
        }
        used += w;
    }
    text
}

/// `text` truncated or right-padded with spaces to exactly `width` columns.
pub(crate) fn pad_to_width(text: &str, width: usize) -> String {
    let text = truncate_to_width(text, width);
    let fill = width - text.width();
    format!("{}{}", text, " ".repeat(fill))
}

/// `left` and `right` pushed to opposite edges of a `width` column line.
/// `right` is dropped if both don't fit.
pub(crate) fn spread(left: &str, right: &str, width: usize) -> String {
    let used = left.width() + right.width();
    if used > width {
        pad_to_width(left, width)
    } else {
        format!("{}{}{}", left, " ".repeat(width - used), right)
    }
}

pub(crate) fn center_in(text: &str, width: usize) -> String {
    let text = truncate_to_width(text, width);
    let space = width - text.width();
    let before = space / 2;
    format!(
        "{}{}{}",
        " ".repeat(before),
        text,
        " ".repeat(space - before)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cjk_counts_double() {
        assert_eq!("春节    ", pad_to_width("春节", 8));
        assert_eq!("春", truncate_to_width("春节", 3));
        assert_eq!("ab  ", pad_to_width("ab", 4));
        assert_eq!(5, pad_to_width("春节快乐", 5).width());
    }

    #[test]
    fn spread_edges() {
        assert_eq!(" 17     休", spread(" 17", "休", 10));
        assert_eq!("abc", spread("abc", "休", 3));
    }

    #[test]
    fn centered() {
        assert_eq!("  初一  ", center_in("初一", 8));
        assert_eq!(" x  ", center_in("x", 4));
    }
}
