use crate::enriched::RichFragment;

/// Remove the indentation shared by every non-blank line of `text`.
///
/// Blank lines do not count towards the shared margin and come out empty.
pub fn dedent_text(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let body = line.trim_start_matches(|c: char| c == ' ' || c == '\t');
        let indent = &line[..line.len() - body.len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }
    let margin = margin.unwrap_or("");

    text.split_inclusive('\n')
        .map(|line| {
            let body = line.strip_suffix('\n').unwrap_or(line);
            let newline = &line[body.len()..];
            if body.trim().is_empty() {
                newline.to_string()
            } else {
                format!("{}{}", body.strip_prefix(margin).unwrap_or(body), newline)
            }
        })
        .collect()
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}

/// Dedent every message
pub fn dedent(mut fragments: Vec<RichFragment>) -> Vec<RichFragment> {
    for sentence in fragments.iter_mut().filter_map(RichFragment::as_sentence_mut) {
        for message in sentence.messages_mut() {
            message.contents = dedent_text(&message.contents);
        }
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedent_common_margin() {
        assert_eq!(dedent_text("    a\n      b\n    c"), "a\n  b\nc");
    }

    #[test]
    fn test_dedent_blank_lines() {
        assert_eq!(dedent_text("  a\n \n  b\n"), "a\n\nb\n");
    }

    #[test]
    fn test_dedent_mixed_tabs_and_spaces() {
        assert_eq!(dedent_text("\t a\n\t b"), "a\nb");
        assert_eq!(dedent_text("\ta\n  b"), "\ta\n  b");
    }

    #[test]
    fn test_dedent_no_margin() {
        assert_eq!(dedent_text("a\n  b"), "a\n  b");
        assert_eq!(dedent_text(""), "");
    }
}
