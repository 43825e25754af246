//! Word Splitting
//!
//! IFS-based field splitting over the expanded segments of one word.
//!
//! Only splittable segments (unquoted parameter, command and arithmetic
//! results) are split; literal and quoted text joins the field it touches.
//! With `a="1 2"` and `b="3 4"`, `$a"$b"` yields `1` and `23 4`.

use crate::interpreter::helpers::ifs::is_ifs_whitespace;

/// An expanded piece of a word with its quoting provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSplitSegment {
    pub value: String,
    /// Subject to IFS splitting
    pub is_splittable: bool,
    /// Quoted text keeps an otherwise empty field alive
    pub is_quoted: bool,
    /// Pattern characters in the value are live for pathname expansion
    pub is_glob: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordSegment {
    Text(WordSplitSegment),
    /// Unconditional field boundary (between the elements of `$@`)
    FieldBreak,
}

impl WordSegment {
    /// Literal unquoted text from the source
    pub fn literal(value: impl Into<String>) -> Self {
        WordSegment::Text(WordSplitSegment {
            value: value.into(),
            is_splittable: false,
            is_quoted: false,
            is_glob: false,
        })
    }

    /// Quoted text, never split or globbed
    pub fn quoted(value: impl Into<String>) -> Self {
        WordSegment::Text(WordSplitSegment {
            value: value.into(),
            is_splittable: false,
            is_quoted: true,
            is_glob: false,
        })
    }

    /// Unquoted pattern characters from the source
    pub fn glob(value: impl Into<String>) -> Self {
        WordSegment::Text(WordSplitSegment {
            value: value.into(),
            is_splittable: false,
            is_quoted: false,
            is_glob: true,
        })
    }

    /// The result of an expansion: split and globbed only when unquoted
    pub fn expanded(value: impl Into<String>, in_quotes: bool) -> Self {
        WordSegment::Text(WordSplitSegment {
            value: value.into(),
            is_splittable: !in_quotes,
            is_quoted: in_quotes,
            is_glob: !in_quotes,
        })
    }
}

/// Piece of a finished field; `is_glob` marks pattern-active text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPiece {
    pub text: String,
    pub is_glob: bool,
}

/// One field after splitting, before pathname expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitField {
    pub pieces: Vec<FieldPiece>,
}

impl SplitField {
    pub fn value(&self) -> String {
        self.pieces.iter().map(|p| p.text.as_str()).collect()
    }

    fn push(&mut self, c: char, is_glob: bool) {
        match self.pieces.last_mut() {
            Some(piece) if piece.is_glob == is_glob => piece.text.push(c),
            _ => self.pieces.push(FieldPiece {
                text: c.to_string(),
                is_glob,
            }),
        }
    }

    fn push_str(&mut self, text: &str, is_glob: bool) {
        for c in text.chars() {
            self.push(c, is_glob);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitState {
    /// Nothing seen yet in this field
    Initial,
    InField,
    /// Just consumed IFS whitespace
    AfterWhitespace,
    /// Just consumed a non-whitespace IFS delimiter
    AfterDelimiter,
}

struct Splitter {
    fields: Vec<SplitField>,
    current: SplitField,
    /// Current field holds quoted text (possibly empty) or any character
    anchored: bool,
    state: SplitState,
}

impl Splitter {
    fn finish(&mut self) {
        if self.anchored {
            self.fields.push(std::mem::take(&mut self.current));
        }
        self.current = SplitField::default();
        self.anchored = false;
    }

    fn push_empty_field(&mut self) {
        self.fields.push(SplitField::default());
    }
}

/// Split expanded segments into fields.
///
/// IFS whitespace runs separate fields and are trimmed at the edges. Each
/// non-whitespace IFS character delimits exactly one field, so `a::b`
/// produces an empty middle field. An empty IFS disables splitting.
pub fn split_segments(segments: Vec<WordSegment>, ifs: &str) -> Vec<SplitField> {
    let mut splitter = Splitter {
        fields: Vec::new(),
        current: SplitField::default(),
        anchored: false,
        state: SplitState::Initial,
    };

    for segment in segments {
        let seg = match segment {
            WordSegment::FieldBreak => {
                splitter.finish();
                splitter.state = SplitState::Initial;
                continue;
            }
            WordSegment::Text(seg) => seg,
        };

        if !seg.is_splittable || ifs.is_empty() {
            if seg.is_quoted || !seg.value.is_empty() {
                splitter.anchored = true;
            }
            splitter.current.push_str(&seg.value, seg.is_glob);
            if !seg.value.is_empty() {
                splitter.state = SplitState::InField;
            }
            continue;
        }

        for c in seg.value.chars() {
            if is_ifs_whitespace(c, ifs) {
                if splitter.anchored {
                    splitter.finish();
                    splitter.state = SplitState::AfterWhitespace;
                } else if splitter.state == SplitState::InField {
                    splitter.state = SplitState::AfterWhitespace;
                }
            } else if ifs.contains(c) {
                if splitter.anchored {
                    splitter.finish();
                } else if matches!(
                    splitter.state,
                    SplitState::Initial | SplitState::AfterDelimiter
                ) {
                    splitter.push_empty_field();
                }
                splitter.state = SplitState::AfterDelimiter;
            } else {
                splitter.current.push(c, seg.is_glob);
                splitter.anchored = true;
                splitter.state = SplitState::InField;
            }
        }
    }

    splitter.finish();
    splitter.fields
}
