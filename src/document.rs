//! Chunk-boundary recovery
//!
//! Provers that only accept one buffer get the caller's chunks joined with a separator.
//! Their output comes back as one flat fragment stream addressed against that joined
//! buffer. [`Document`] undoes the join: it regroups the stream per chunk, cutting any
//! fragment that straddles a chunk boundary, and strips the separator back off.
//!
//! ```text
//! chunks:      "foo."        "bar."
//! buffer:      "foo.\n"      "bar.\n"        (separator "\n")
//! fragments:   [Sentence "foo.", Text "\nb"] ...
//!                                    ^ cut at chunk end: "\n" | "b"
//! ```
//!
//! Offsets are implicit: a fragment starts where the previous one ended. They count
//! characters for [`Document::new`] and UTF-8 bytes for [`Document::encoded`].

use crate::fragment::{Fragment, Text};
use crate::location::{Addressing, LineIndex};
use once_cell::sync::OnceCell;
use std::collections::VecDeque;
use std::ops::Range;
use thiserror::Error;
use tracing::debug;

/// Structural-consistency failures: the fragment stream does not tile the buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("fragment at offset {fragment} starts before chunk {chunk} (offset {chunk_begin})")]
    FragmentBeforeChunk {
        chunk: usize,
        chunk_begin: usize,
        fragment: usize,
    },

    #[error("fragments of chunk {chunk} do not reproduce it: expected {expected:?}, found {found:?}")]
    ChunkMismatch {
        chunk: usize,
        expected: String,
        found: String,
    },

    #[error("cannot cut at offset {offset}: not a character boundary")]
    InvalidCut { offset: usize },

    #[error("{count} fragment(s) left over past the end of the document (offset {offset})")]
    LeftoverFragments { count: usize, offset: usize },

    #[error("last fragment of chunk {chunk} does not end with separator {separator:?}")]
    MissingSeparator { chunk: usize, separator: String },
}

/// Anything with a length in some addressing unit
pub trait Extent {
    fn extent(&self, addressing: Addressing) -> usize;
}

impl Extent for Fragment {
    fn extent(&self, addressing: Addressing) -> usize {
        self.contents().measure(addressing)
    }
}

impl Extent for &str {
    fn extent(&self, addressing: Addressing) -> usize {
        addressing.measure(self)
    }
}

impl Extent for String {
    fn extent(&self, addressing: Addressing) -> usize {
        addressing.measure(self)
    }
}

/// An item with its `[begin, end)` span in a flat buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Positioned<T> {
    pub begin: usize,
    pub end: usize,
    pub item: T,
}

/// Anchor each item right after the previous one
pub fn with_boundaries<T: Extent>(
    items: impl IntoIterator<Item = T>,
    addressing: Addressing,
) -> Vec<Positioned<T>> {
    let mut end = 0;
    items
        .into_iter()
        .map(|item| {
            let begin = end;
            end += item.extent(addressing);
            Positioned { begin, end, item }
        })
        .collect()
}

#[derive(Debug)]
pub struct Document {
    chunks: Vec<String>,
    with_separator: Vec<String>,
    contents: String,
    separator: String,
    addressing: Addressing,
    line_index: OnceCell<LineIndex>,
}

impl Document {
    /// A character-addressed document
    pub fn new<S: Into<String>>(chunks: impl IntoIterator<Item = S>, separator: &str) -> Self {
        Self::with_addressing(chunks, separator, Addressing::Chars)
    }

    /// A byte-addressed document (UTF-8)
    pub fn encoded<S: Into<String>>(chunks: impl IntoIterator<Item = S>, separator: &str) -> Self {
        Self::with_addressing(chunks, separator, Addressing::Bytes)
    }

    pub fn with_addressing<S: Into<String>>(
        chunks: impl IntoIterator<Item = S>,
        separator: &str,
        addressing: Addressing,
    ) -> Self {
        let chunks: Vec<String> = chunks.into_iter().map(Into::into).collect();
        let with_separator: Vec<String> = chunks
            .iter()
            .map(|chunk| format!("{}{}", chunk, separator))
            .collect();
        let contents = with_separator.concat();

        Self {
            chunks,
            with_separator,
            contents,
            separator: separator.to_string(),
            addressing,
            line_index: OnceCell::new(),
        }
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    /// The joined buffer all fragment offsets refer to
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Length of the joined buffer in this document's unit
    pub fn len(&self) -> usize {
        self.addressing.measure(&self.contents)
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Text of the buffer between two offsets
    pub fn slice(&self, range: Range<usize>) -> Option<&str> {
        slice_text(&self.contents, range, self.addressing)
    }

    fn line_index(&self) -> &LineIndex {
        self.line_index
            .get_or_init(|| LineIndex::with_addressing(&self.contents, self.addressing))
    }

    /// 1-based line and 0-based column of a buffer offset
    pub fn offset_to_position(&self, offset: usize) -> Option<(usize, usize)> {
        self.line_index().offset_to_line_col(offset)
    }

    pub fn position_to_offset(&self, line: usize, column: usize) -> Option<usize> {
        self.line_index().line_col_to_offset(line, column)
    }

    /// Regroup a flat fragment stream into one fragment list per chunk
    pub fn recover_chunks(
        &self,
        fragments: Vec<Fragment>,
    ) -> Result<Vec<Vec<Fragment>>, DocumentError> {
        debug!(
            chunks = self.chunks.len(),
            fragments = fragments.len(),
            "recovering chunk boundaries"
        );
        let grouped = self.group_by_chunk(fragments)?;
        strip_separators(grouped, &self.separator, self.addressing)
    }

    fn group_by_chunk(&self, fragments: Vec<Fragment>) -> Result<Vec<Vec<Fragment>>, DocumentError> {
        let addressing = self.addressing;
        let mut queue: VecDeque<_> = with_boundaries(fragments, addressing).into();
        let chunks = with_boundaries(self.with_separator.iter().map(String::as_str), addressing);
        let mut grouped = Vec::with_capacity(chunks.len());

        for (index, chunk) in chunks.into_iter().enumerate() {
            if let Some(front) = queue.front() {
                if front.begin < chunk.begin {
                    return Err(DocumentError::FragmentBeforeChunk {
                        chunk: index,
                        chunk_begin: chunk.begin,
                        fragment: front.begin,
                    });
                }
            }

            let mut group = Vec::new();
            while let Some(front) = queue.front() {
                if front.end > chunk.end {
                    break;
                }
                if let Some(positioned) = queue.pop_front() {
                    group.push(positioned.item);
                }
            }

            if let Some(front) = queue.front_mut() {
                if front.begin < chunk.end && chunk.end < front.end {
                    let (before, after) = front
                        .item
                        .split_at(chunk.end - front.begin, addressing)
                        .ok_or(DocumentError::InvalidCut { offset: chunk.end })?;
                    front.begin = chunk.end;
                    front.item = after;
                    group.push(before);
                }
            }

            let found: String = group.iter().map(|fr| fr.contents().to_string()).collect();
            if found != chunk.item {
                return Err(DocumentError::ChunkMismatch {
                    chunk: index,
                    expected: chunk.item.to_string(),
                    found,
                });
            }
            grouped.push(group);
        }

        if let Some(front) = queue.front() {
            return Err(DocumentError::LeftoverFragments {
                count: queue.len(),
                offset: front.begin,
            });
        }

        Ok(grouped)
    }

    /// Cut a fragment stream at every offset of `cutoffs` (ascending)
    pub fn split_fragments(
        fragments: Vec<Fragment>,
        cutoffs: &[usize],
        addressing: Addressing,
    ) -> Result<Vec<Fragment>, DocumentError> {
        let mut queue: VecDeque<_> = with_boundaries(fragments, addressing).into();
        let mut split = Vec::new();

        for &cutoff in cutoffs {
            while let Some(front) = queue.front() {
                if front.end > cutoff {
                    break;
                }
                if let Some(positioned) = queue.pop_front() {
                    split.push(positioned.item);
                }
            }

            if let Some(front) = queue.front_mut() {
                if front.begin < cutoff && cutoff < front.end {
                    let (before, after) = front
                        .item
                        .split_at(cutoff - front.begin, addressing)
                        .ok_or(DocumentError::InvalidCut { offset: cutoff })?;
                    front.begin = cutoff;
                    front.item = after;
                    split.push(before);
                }
            }
        }

        split.extend(queue.into_iter().map(|positioned| positioned.item));
        Ok(split)
    }

    /// Fill the gaps between positioned sentences of `text` with Text fragments
    pub fn intersperse_text_fragments(
        text: &str,
        sentences: Vec<Positioned<Fragment>>,
        addressing: Addressing,
    ) -> Result<Vec<Fragment>, DocumentError> {
        let gap = |range: Range<usize>| {
            slice_text(text, range.clone(), addressing)
                .map(|slice| Fragment::Text(Text::new(slice)))
                .ok_or(DocumentError::InvalidCut { offset: range.end })
        };

        let mut fragments = Vec::with_capacity(sentences.len() * 2 + 1);
        let mut position = 0;
        for sentence in sentences {
            if position < sentence.begin {
                fragments.push(gap(position..sentence.begin)?);
            }
            fragments.push(sentence.item);
            position = sentence.end;
        }

        let len = addressing.measure(text);
        if position < len {
            fragments.push(gap(position..len)?);
        }
        Ok(fragments)
    }
}

/// Remove the chunk separator from the end of each group.
///
/// A trailing Text fragment emptied by the removal is dropped; an emptied Sentence stays.
pub fn strip_separators(
    grouped: Vec<Vec<Fragment>>,
    separator: &str,
    addressing: Addressing,
) -> Result<Vec<Vec<Fragment>>, DocumentError> {
    let separator_len = addressing.measure(separator);

    grouped
        .into_iter()
        .enumerate()
        .map(|(index, mut group)| {
            if let Some(last) = group.last_mut() {
                if !last.contents().ends_with(separator) {
                    return Err(DocumentError::MissingSeparator {
                        chunk: index,
                        separator: separator.to_string(),
                    });
                }

                let cutoff = last.contents().measure(addressing) - separator_len;
                let (contents, _) = last
                    .contents()
                    .split_at(cutoff, addressing)
                    .ok_or(DocumentError::InvalidCut { offset: cutoff })?;
                *last.contents_mut() = contents;

                let emptied = last.is_text() && last.contents().is_empty();
                if emptied {
                    group.pop();
                }
            }
            Ok(group)
        })
        .collect()
}

fn slice_text(text: &str, range: Range<usize>, addressing: Addressing) -> Option<&str> {
    let start = addressing.byte_index(text, range.start)?;
    let end = addressing.byte_index(text, range.end)?;
    text.get(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{FragmentContent, FragmentToken};
    use crate::fragment::Sentence;

    fn text(raw: &str) -> Fragment {
        Fragment::text(raw)
    }

    fn sentence(raw: &str) -> Fragment {
        Fragment::sentence(raw)
    }

    #[test]
    fn test_recover_sentences_with_trailing_newlines() {
        let doc = Document::new(["foo.", "bar."], "\n");
        let groups = doc
            .recover_chunks(vec![sentence("foo.\n"), sentence("bar.\n")])
            .unwrap();
        assert_eq!(groups, vec![vec![sentence("foo.")], vec![sentence("bar.")]]);
    }

    #[test]
    fn test_recover_with_interleaved_text() {
        let doc = Document::new(["foo.\n", "bar.\n"], "\n");
        let groups = doc
            .recover_chunks(vec![
                sentence("foo."),
                text("\n\n"),
                sentence("bar."),
                text("\n\n"),
            ])
            .unwrap();
        assert_eq!(
            groups,
            vec![
                vec![sentence("foo."), text("\n")],
                vec![sentence("bar."), text("\n")],
            ]
        );
    }

    #[test]
    fn test_recover_splits_straddling_fragment() {
        let doc = Document::new(["a. (* x", "y *) b."], "\n");
        let groups = doc
            .recover_chunks(vec![
                sentence("a."),
                text(" (* x\ny *) "),
                Fragment::Sentence(Sentence::new("b.\n").with_message("done")),
            ])
            .unwrap();

        assert_eq!(groups[0], vec![sentence("a."), text(" (* x")]);
        assert_eq!(
            groups[1],
            vec![
                text("y *) "),
                Fragment::Sentence(Sentence::new("b.").with_message("done")),
            ]
        );
    }

    #[test]
    fn test_recover_empty_chunk() {
        let doc = Document::new(["a.", "", "b."], "\n");
        let groups = doc
            .recover_chunks(vec![sentence("a."), text("\n\n"), sentence("b."), text("\n")])
            .unwrap();
        assert_eq!(groups, vec![vec![sentence("a.")], vec![], vec![sentence("b.")]]);
    }

    #[test]
    fn test_recover_leftover_fragments() {
        let doc = Document::new(["a."], "\n");
        let err = doc
            .recover_chunks(vec![sentence("a.\n"), text("extra")])
            .unwrap_err();
        assert_eq!(err, DocumentError::LeftoverFragments { count: 1, offset: 3 });
    }

    #[test]
    fn test_recover_mismatched_text() {
        let doc = Document::new(["a."], "\n");
        let err = doc.recover_chunks(vec![sentence("b.\n")]).unwrap_err();
        assert!(matches!(err, DocumentError::ChunkMismatch { chunk: 0, .. }));
    }

    #[test]
    fn test_recover_bytes() {
        let doc = Document::encoded(["α.", "β."], "\n");
        assert_eq!(doc.len(), 8);
        let groups = doc
            .recover_chunks(vec![sentence("α.\nβ"), sentence(".\n")])
            .unwrap();
        assert_eq!(
            groups,
            vec![vec![sentence("α.")], vec![sentence("β"), sentence(".")]]
        );
    }

    #[test]
    fn test_strip_separators() {
        let stripped = strip_separators(
            vec![vec![text("!"), text("(* … *)\n")]],
            "\n",
            Addressing::Chars,
        )
        .unwrap();
        assert_eq!(stripped, vec![vec![text("!"), text("(* … *)")]]);

        let stripped =
            strip_separators(vec![vec![text("A"), text("\n")]], "\n", Addressing::Chars).unwrap();
        assert_eq!(stripped, vec![vec![text("A")]]);

        let stripped = strip_separators(vec![vec![text("\n")]], "\n", Addressing::Chars).unwrap();
        assert_eq!(stripped, vec![Vec::<Fragment>::new()]);

        let stripped = strip_separators(vec![vec![sentence("\n")]], "\n", Addressing::Chars).unwrap();
        assert_eq!(stripped, vec![vec![sentence("")]]);
    }

    #[test]
    fn test_strip_separators_missing() {
        let err = strip_separators(vec![vec![text("A")]], "\n", Addressing::Chars).unwrap_err();
        assert_eq!(
            err,
            DocumentError::MissingSeparator {
                chunk: 0,
                separator: "\n".into()
            }
        );
    }

    #[test]
    fn test_split_fragments() {
        let split = Document::split_fragments(
            vec![text("abcdwxyz")],
            &[0, 2, 4, 5, 7],
            Addressing::Chars,
        )
        .unwrap();
        let expected: Vec<_> = ["ab", "cd", "w", "xy", "z"].iter().map(|s| text(s)).collect();
        assert_eq!(split, expected);

        let split = Document::split_fragments(
            vec![text("abcd"), text("wxyz")],
            &[0, 2, 4, 5, 7],
            Addressing::Chars,
        )
        .unwrap();
        assert_eq!(split, expected);
    }

    #[test]
    fn test_split_keeps_token_metadata() {
        let contents = FragmentContent::new(vec![
            FragmentToken::new("ab"),
            FragmentToken::new("cx").with_link("c.html"),
            FragmentToken::new("yz"),
        ]);
        let split =
            Document::split_fragments(vec![Fragment::text(contents)], &[3], Addressing::Chars)
                .unwrap();
        assert_eq!(split[0].contents().tokens()[1].link.as_deref(), Some("c.html"));
        assert_eq!(split[1].contents().tokens()[0].link.as_deref(), Some("c.html"));
    }

    #[test]
    fn test_intersperse_text_fragments() {
        let source = "  a. b.  ";
        let sentences = vec![
            Positioned { begin: 2, end: 4, item: sentence("a.") },
            Positioned { begin: 5, end: 7, item: sentence("b.") },
        ];
        let fragments =
            Document::intersperse_text_fragments(source, sentences, Addressing::Chars).unwrap();
        assert_eq!(
            fragments,
            vec![text("  "), sentence("a."), text(" "), sentence("b."), text("  ")]
        );
    }

    #[test]
    fn test_positions() {
        let doc = Document::new(["ab", "cd"], "\n");
        assert_eq!(doc.contents(), "ab\ncd\n");
        assert_eq!(doc.offset_to_position(4), Some((2, 1)));
        assert_eq!(doc.position_to_offset(2, 1), Some(4));
        assert_eq!(doc.slice(3..5), Some("cd"));
        assert_eq!(doc.slice(3..50), None);
    }

    #[test]
    fn test_with_boundaries() {
        let positioned = with_boundaries(["ab", "", "cde"], Addressing::Chars);
        let spans: Vec<_> = positioned.iter().map(|p| (p.begin, p.end)).collect();
        assert_eq!(spans, vec![(0, 2), (2, 2), (2, 5)]);
    }
}
