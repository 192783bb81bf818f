use itertools::Itertools;

/// Fits `text` into a fixed-width table column, padding with spaces or
/// truncating with a `...` suffix.
pub fn get_column_string(text: &str, width: usize) -> String {
    let len = text.chars().count();

    if len <= width {
        let padding = " ".repeat(width - len);
        return format!("{}{}", text, padding);
    }

    match width {
        0 => "".to_owned(),
        1 => ".".to_owned(),
        2 => "..".to_owned(),
        3 => "...".to_owned(),
        _ => {
            let truncated = text.chars().take(width - 3).join("");
            format!("{}...", truncated)
        }
    }
}
