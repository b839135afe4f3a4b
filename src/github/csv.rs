//! Key/value lookups in simple comma-separated files
//!
//! The first column is the key, the second the value. Fields are split on
//! commas and stripped of surrounding whitespace and quotes; quoted commas are
//! not supported.

fn clean(field: &str) -> &str {
    field.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Value in the second column of the first row keyed by `key`
pub fn lookup_value(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut fields = line.split(',');
            let row_key = clean(fields.next()?);
            let value = clean(fields.next()?);
            (row_key == key).then(|| value.to_string())
        })
        .next()
}

/// Rewrite the second column of the first row keyed by `key`
///
/// Returns `None` when no row has that key. Other lines, further columns and
/// the trailing newline are kept as they were.
pub fn replace_value(content: &str, key: &str, new_value: &str) -> Option<String> {
    let mut replaced = false;
    let mut lines = Vec::new();

    for line in content.lines() {
        if !replaced {
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() >= 2 && clean(fields[0]) == key {
                let mut updated = vec![fields[0].to_string(), new_value.to_string()];
                updated.extend(fields[2..].iter().map(|f| f.to_string()));
                lines.push(updated.join(","));
                replaced = true;
                continue;
            }
        }
        lines.push(line.to_string());
    }

    if !replaced {
        return None;
    }

    let mut updated = lines.join("\n");
    if content.ends_with('\n') {
        updated.push('\n');
    }
    Some(updated)
}
