use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cuts `s` to at most `max` display columns, ending in `ellipsis` when cut.
pub fn truncate_with(s: &str, max: usize, ellipsis: &str) -> String {
    if width(s) <= max {
        return s.to_string();
    }
    let room = max.saturating_sub(width(ellipsis));
    if room == 0 {
        return take_columns(ellipsis, max);
    }
    let mut out = take_columns(s, room);
    out.push_str(ellipsis);
    out
}

pub fn truncate(s: &str, max: usize) -> String {
    truncate_with(s, max, "…")
}

pub fn take_columns(s: &str, max: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}

pub fn pad(s: &str, cols: usize) -> String {
    let w = width(s);
    if w >= cols {
        return take_columns(s, cols);
    }
    let mut out = String::with_capacity(s.len() + cols - w);
    out.push_str(s);
    out.extend(std::iter::repeat_n(' ', cols - w));
    out
}

pub fn wrap(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut result = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            result.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut used = 0;
        for word in line.split_whitespace() {
            let word_len = width(word);
            if used == 0 {
                current = word.to_string();
                used = word_len;
            } else if used + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
                used += 1 + word_len;
            } else {
                result.push(std::mem::take(&mut current));
                current = word.to_string();
                used = word_len;
            }
            while used > max_width {
                let head = take_columns(&current, max_width);
                if head.is_empty() {
                    break;
                }
                let rest = current[head.len()..].to_string();
                result.push(head);
                used = width(&rest);
                current = rest;
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }
    result
}
