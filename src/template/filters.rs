//! Text helpers used by the `text` and `truncate` template helpers.

/// Suffix appended to truncated text.
const ELLIPSIS: &str = "...";

/// Truncate text to at most `limit` characters.
///
/// Text that is cut ends with `...`, which counts toward the limit. For a
/// limit of 3 or less the text is cut without a suffix.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if limit == 0 {
        return String::new();
    }

    if text.chars().count() <= limit {
        return text.to_string();
    }

    if limit <= ELLIPSIS.len() {
        return text.chars().take(limit).collect();
    }

    let mut truncated: String = text.chars().take(limit - ELLIPSIS.len()).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Strip HTML tags from text, decode common entities and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_entity = false;
    let mut entity = String::new();

    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                // Tags separate words even when the markup has no spaces.
                if in_tag {
                    result.push(' ');
                }
                in_tag = false;
            }
            '&' if !in_tag => {
                if in_entity {
                    result.push('&');
                    result.push_str(&entity);
                }
                in_entity = true;
                entity.clear();
            }
            ';' if in_entity => {
                in_entity = false;
                match entity.as_str() {
                    "amp" => result.push('&'),
                    "lt" => result.push('<'),
                    "gt" => result.push('>'),
                    "quot" => result.push('"'),
                    "apos" => result.push('\''),
                    "nbsp" => result.push(' '),
                    _ if entity.starts_with('#') => {
                        if let Some(c) = parse_numeric_entity(&entity).and_then(char::from_u32) {
                            result.push(c);
                        }
                    }
                    _ => {
                        // Unknown entity, keep as-is
                        result.push('&');
                        result.push_str(&entity);
                        result.push(';');
                    }
                }
            }
            _ if in_entity => {
                if ch.is_alphanumeric() || ch == '#' {
                    entity.push(ch);
                } else {
                    // A bare ampersand, not an entity.
                    in_entity = false;
                    result.push('&');
                    result.push_str(&entity);
                    result.push(ch);
                }
            }
            _ if !in_tag => {
                result.push(ch);
            }
            _ => {}
        }
    }

    if in_entity {
        result.push('&');
        result.push_str(&entity);
    }

    result.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Parse a numeric HTML entity (e.g., "#123" or "#x7B").
fn parse_numeric_entity(entity: &str) -> Option<u32> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else {
        entity.strip_prefix('#')?.parse().ok()
    }
}
