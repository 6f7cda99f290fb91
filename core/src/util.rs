/// First `max` characters of `text`, for log lines.
pub fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("hello", 10), "hello");
        assert_eq!(preview("hello", 2), "he");
        assert_eq!(preview("ñandú→sky", 5), "ñandú");
    }
}
