//! Lexical repair of hand-edited JSON name tables.
//!
//! Registry sources are frequently pasted together from vendor documents and
//! spreadsheets. Each pass below fixes one class of defect so that the result
//! can be handed to a strict JSON parser. Passes that look at structure are
//! string-aware: text inside string literals is left untouched.

/// Run every repair pass in order.
///
/// Stray escapes are repaired before the structural passes: an escaped
/// closing quote would otherwise flip their notion of what is inside a string.
pub fn sanitize(raw: &str) -> String {
    let text = strip_bom(raw);
    let text = replace_smart_quotes(text);
    let text = repair_stray_escapes(&text);
    let text = strip_comments(&text);
    let text = strip_trailing_commas(&text);
    text.trim().to_string()
}

/// Remove a leading UTF-8 byte-order mark.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

/// Replace typographic quotes with their ASCII counterparts.
pub fn replace_smart_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

/// Remove `// line` and `/* block */` comments outside string literals.
///
/// The newline ending a line comment is kept. An unterminated block comment
/// swallows the rest of the input.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Drop commas that directly precede a closing `}` or `]`.
pub fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(c);
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }

    out
}

/// Drop backslashes that do not form a valid JSON escape.
///
/// Two shapes are repaired: an escape of a character JSON does not allow to
/// be escaped (`\x` becomes `x`), and an escaped quote that actually closes
/// the value, recognised by the next significant character being `,`, `:`,
/// `}`, `]` or the end of input.
pub fn repair_stray_escapes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = false;
                out.push(c);
                i += 1;
            }
            '\\' => match chars.get(i + 1).copied() {
                Some('"') if closes_value(&chars[i + 2..]) => {
                    out.push('"');
                    in_string = false;
                    i += 2;
                }
                Some(next @ ('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')) => {
                    out.push('\\');
                    out.push(next);
                    i += 2;
                }
                Some(next) => {
                    out.push(next);
                    i += 2;
                }
                None => i += 1,
            },
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn closes_value(rest: &[char]) -> bool {
    match rest.iter().find(|c| !c.is_whitespace()) {
        None => true,
        Some(c) => matches!(c, ',' | ':' | '}' | ']'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parses(text: &str) -> bool {
        serde_json::from_str::<serde_json::Value>(text).is_ok()
    }

    #[test]
    fn test_strip_bom() {
        let raw = "\u{FEFF}{\"76\": \"Apple, Inc.\"}";
        assert!(!parses(raw));
        assert_eq!(strip_bom(raw), "{\"76\": \"Apple, Inc.\"}");
        assert!(parses(&sanitize(raw)));
    }

    #[test]
    fn test_smart_quotes() {
        let raw = "{\u{201C}76\u{201D}: \u{201C}Apple\u{2019}s\u{201D}}";
        assert!(!parses(raw));
        let fixed = sanitize(raw);
        assert_eq!(fixed, "{\"76\": \"Apple's\"}");
        assert!(parses(&fixed));
    }

    #[test]
    fn test_line_and_block_comments() {
        let raw = "// Bluetooth SIG company identifiers\n{\n  /* Apple */ \"76\": \"Apple, Inc.\", // decimal key\n  \"0x0075\": \"Samsung\"\n}";
        let fixed = strip_comments(raw);
        assert!(!fixed.contains("SIG"));
        assert!(!fixed.contains("decimal key"));
        assert!(!fixed.contains("/*"));
        assert!(parses(&fixed));
    }

    #[test]
    fn test_comment_markers_inside_strings_are_kept() {
        let raw = r#"{"1": "see https://example.com/* not a comment */"}"#;
        assert_eq!(strip_comments(raw), raw);
    }

    #[test]
    fn test_unterminated_block_comment_swallows_rest() {
        assert_eq!(strip_comments("[1] /* dangling"), "[1] ");
    }

    #[test]
    fn test_trailing_commas() {
        let raw = "[{\"code\": 76, \"name\": \"Apple\",}, {\"code\": 6, \"name\": \"Microsoft\"},\n]";
        assert!(!parses(raw));
        let fixed = strip_trailing_commas(raw);
        assert!(parses(&fixed));
        assert_eq!(
            strip_trailing_commas(r#"{"a": "x,}"}"#),
            r#"{"a": "x,}"}"#,
            "commas inside strings are untouched"
        );
    }

    #[test]
    fn test_stray_escape_on_closing_quote() {
        let raw = r#"{"76": "Apple, Inc.\", "6": "Microsoft\"}"#;
        assert!(!parses(raw));
        let fixed = repair_stray_escapes(raw);
        assert_eq!(fixed, r#"{"76": "Apple, Inc.", "6": "Microsoft"}"#);
        assert!(parses(&fixed));
    }

    #[test]
    fn test_invalid_escape_is_dropped() {
        let raw = r#"{"1": "Acme\ Corp"}"#;
        assert!(!parses(raw));
        assert_eq!(repair_stray_escapes(raw), r#"{"1": "Acme Corp"}"#);
    }

    #[test]
    fn test_valid_escapes_are_kept() {
        let raw = r#"{"1": "Say \"hi\" \\ é\n"}"#;
        assert_eq!(repair_stray_escapes(raw), raw);
        assert!(parses(raw));
    }

    #[test]
    fn test_all_defects_together() {
        let raw = "\u{FEFF}// header\n{\u{201C}76\u{201D}: \"Apple, Inc.\\\", /* x */ \"89\": \"Nordic\",}";
        let fixed = sanitize(raw);
        let value: serde_json::Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["76"], "Apple, Inc.");
        assert_eq!(value["89"], "Nordic");
    }
}
