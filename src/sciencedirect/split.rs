use crate::utils::newline_delimiter_of;

/// An [Iterator] over the entries of a ScienceDirect export.
///
/// Entries are separated by runs of two or more line breaks. [Iterator::next]
/// returns each entry with surrounding whitespace removed, along with the line
/// number its first non-blank line starts on. Entries that are empty after
/// trimming are skipped.
pub(crate) struct EntrySplit<'a> {
    text: &'a str,
    line_break: &'static str,
    separator: &'static str,
    line_number: usize,
}

impl<'a> EntrySplit<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let line_break = newline_delimiter_of(text);
        let separator = if line_break == "\r\n" { "\r\n\r\n" } else { "\n\n" };
        Self {
            text,
            line_break,
            separator,
            line_number: 1,
        }
    }

    /// Split off the next raw chunk, consuming the whole separator run after it.
    fn next_chunk(&mut self) -> (usize, &'a str) {
        let text = self.text;
        let (chunk, consumed) = match text.find(self.separator) {
            Some(end) => {
                let mut rest = end;
                while text[rest..].starts_with(self.line_break) {
                    rest += self.line_break.len();
                }
                (&text[..end], rest)
            }
            None => (text, text.len()),
        };
        let line_number = self.line_number;
        self.line_number += text[..consumed].matches(self.line_break).count();
        self.text = &text[consumed..];
        (line_number, chunk)
    }
}

impl<'a> Iterator for EntrySplit<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.text.is_empty() {
            let (line_number, chunk) = self.next_chunk();
            let entry = chunk.trim();
            if entry.is_empty() {
                continue;
            }
            let leading = &chunk[..chunk.len() - chunk.trim_start().len()];
            return Some((line_number + leading.matches(self.line_break).count(), entry));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("", &[])]
    #[case("\n", &[])]
    #[case("\n\n\n\n", &[])]
    #[case("one", &[(1, "one")])]
    #[case("\none", &[(2, "one")])]
    #[case("\n\none", &[(3, "one")])]
    #[case("one\n", &[(1, "one")])]
    #[case("one\ntwo\nthree\n", &[(1, "one\ntwo\nthree")])]
    #[case("one\ntwo\nthree\n\n\n", &[(1, "one\ntwo\nthree")])]
    #[case(
        "one\ntwo\nthree\n\napple\nbat\ncat\n",
        &[(1, "one\ntwo\nthree"), (5, "apple\nbat\ncat")]
    )]
    #[case(
        "one\ntwo\nthree\n\n\napple\nbat\ncat\n",
        &[(1, "one\ntwo\nthree"), (6, "apple\nbat\ncat")]
    )]
    #[case("\n\none\ntwo\n\n\n\napple\n\n\n", &[(3, "one\ntwo"), (8, "apple")])]
    #[case("one\n  \ntwo", &[(1, "one\n  \ntwo")])]
    #[case("  one  \n\n  two", &[(1, "one"), (3, "two")])]
    fn test_entry_split(#[case] text: &str, #[case] expected: &[(usize, &str)]) {
        let actual = EntrySplit::new(text).collect_vec();
        assert_eq!(&actual, expected)
    }

    #[test]
    fn test_entry_split_crlf() {
        let actual = EntrySplit::new("one\r\ntwo\r\n\r\n\r\nthree\r\n").collect_vec();
        assert_eq!(actual, vec![(1, "one\r\ntwo"), (5, "three")]);
    }
}
