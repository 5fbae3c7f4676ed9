/// Status check for GitHub write calls (create, edit, delete).
pub fn is_write_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Status check for GitHub read calls (identity lookup, comment listing).
pub fn is_read_success_status(status: u16) -> bool {
    status == 200
}

pub fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}
