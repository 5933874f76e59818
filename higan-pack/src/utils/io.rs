//! Archive path display and filtering

/// Shorten an archive path for display, keeping the file name
pub fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let (dirs, file_name) = path.rsplit_once('/').unwrap_or(("", path));
    let name_len = file_name.chars().count();

    if name_len + 3 >= max_len {
        // Keep the tail of the file name
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    // Leading directories that fit before ".../<file>"
    let budget = max_len - name_len - 4;
    let mut head = String::new();
    for dir in dirs.split('/') {
        let needed = if head.is_empty() { dir.len() } else { dir.len() + 1 };
        if head.len() + needed > budget {
            break;
        }
        if !head.is_empty() {
            head.push('/');
        }
        head.push_str(dir);
    }

    if head.is_empty() {
        format!(".../{file_name}")
    } else {
        format!("{head}/.../{file_name}")
    }
}

/// Case-insensitive wildcard match; a pattern without `*` matches substrings
pub fn matches_pattern(text: &str, pattern: &str) -> bool {
    if pattern.is_empty() || pattern == "*" {
        return true;
    }

    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();

    if !pattern.contains('*') {
        return text.contains(&pattern);
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !text.starts_with(first) || !text.ends_with(last) || text.len() < first.len() + last.len()
    {
        return false;
    }

    let mut rest = &text[first.len()..text.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(found) => rest = &rest[found + part.len()..],
            None => return false,
        }
    }
    true
}
