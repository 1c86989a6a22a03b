//! JSON-with-comments support for launch.json files.

/// Strips C-style comments from JSON (// and /* */) and drops trailing
/// commas before `]` or `}`.
///
/// Comment markers and commas inside string literals are kept.
#[must_use]
pub fn strip_json_comments(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;
    // Byte offset in `result` of a comma not yet followed by a value.
    let mut pending_comma: Option<usize> = None;

    while let Some(c) = chars.next() {
        if in_line_comment {
            if c == '\n' {
                in_line_comment = false;
                result.push(c);
            }
            continue;
        }

        if in_block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_block_comment = false;
            }
            continue;
        }

        if in_string {
            result.push(c);
            match c {
                '"' => in_string = false,
                '\\' => {
                    if let Some(next) = chars.next() {
                        result.push(next);
                    }
                }
                _ => {}
            }
            continue;
        }

        match (c, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                pending_comma = None;
                result.push(c);
            }
            (',', _) => {
                pending_comma = Some(result.len());
                result.push(c);
            }
            ('/', Some('/')) => {
                chars.next();
                in_line_comment = true;
            }
            ('/', Some('*')) => {
                chars.next();
                in_block_comment = true;
            }
            (']' | '}', _) => {
                if let Some(pos) = pending_comma.take() {
                    result.remove(pos);
                }
                result.push(c);
            }
            _ => {
                if !c.is_whitespace() {
                    pending_comma = None;
                }
                result.push(c);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_comments() {
        let input = r#"{
            // Use IntelliSense to learn about possible attributes.
            "name": "Attach", /* inline comment */
            "request": "attach"
        }"#;
        let result = strip_json_comments(input);
        assert!(!result.contains("//"));
        assert!(!result.contains("/*"));
        assert!(result.contains("\"name\""));
        assert!(result.contains("\"request\""));
    }

    #[test]
    fn test_keeps_comment_markers_in_strings() {
        let input = r#"{ "pipeArgs": "-c // not a comment", "url": "http://localhost" }"#;
        assert_eq!(strip_json_comments(input), input);
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        let input = r#"{ "a": "say \"hi\" // still text" } // gone"#;
        let result = strip_json_comments(input);
        assert!(result.contains("// still text"));
        assert!(!result.contains("gone"));
    }

    #[test]
    fn test_drops_trailing_commas() {
        let input = "{ \"a\": [1, 2,], \"b\": { \"c\": true, }, }";
        let result = strip_json_comments(input);
        assert_eq!(result, "{ \"a\": [1, 2], \"b\": { \"c\": true } }");
        assert!(serde_json::from_str::<serde_json::Value>(&result).is_ok());
    }

    #[test]
    fn test_drops_trailing_comma_before_comment() {
        let input = "[\n  \"x\", // last one\n  /* done */\n]";
        let result = strip_json_comments(input);
        let value: serde_json::Value = serde_json::from_str(&result).expect("valid");
        assert_eq!(value, serde_json::json!(["x"]));
    }

    #[test]
    fn test_keeps_commas_in_strings() {
        let input = r#"{ "pipeArgs": "a,]", "b": 1 }"#;
        assert_eq!(strip_json_comments(input), input);
    }
}
