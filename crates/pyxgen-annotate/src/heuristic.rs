//! Heuristic line-pattern annotator
//!
//! Recognizes two header shapes by their leading tokens:
//!
//! - `for <ident> in range(...)` gets an integer type hint for `<ident>`
//! - `def ...` gets the four safety-check directives
//!
//! Every input line is copied through unchanged, terminator included, so
//! dropping the inserted lines recovers the input byte for byte.

use crate::directive::{is_identifier, loop_hint, CIMPORT_HEADER, CIMPORT_MARKER, SAFETY_DIRECTIVES};
use crate::Annotator;

/// Where the `cimport cython` header goes when it has to be added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPlacement {
    /// Very first line of the output, even above a `#!` interpreter line.
    #[default]
    Top,
    /// First line, unless the file opens with a `#!` line; then right below it.
    AfterShebang,
}

/// The default [`Annotator`]: pattern matching on stripped lines.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAnnotator {
    placement: HeaderPlacement,
}

impl HeuristicAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header_placement(mut self, placement: HeaderPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn header_placement(&self) -> HeaderPlacement {
        self.placement
    }
}

impl Annotator for HeuristicAnnotator {
    fn annotate(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 128);
        let mut header_pending = !text.contains(CIMPORT_MARKER);

        for (index, raw) in text.split_inclusive('\n').enumerate() {
            let (line, ending) = split_terminator(raw);
            let inserted_ending = if ending.is_empty() { "\n" } else { ending };

            if header_pending {
                let shebang_stays = index == 0
                    && self.placement == HeaderPlacement::AfterShebang
                    && line.starts_with("#!");
                if !shebang_stays {
                    push_line(&mut out, "", CIMPORT_HEADER, inserted_ending);
                    header_pending = false;
                }
            }

            match classify(line) {
                Trigger::RangeLoop(ident) => {
                    push_line(&mut out, indentation(line), &loop_hint(ident), inserted_ending);
                }
                Trigger::Definition => {
                    let indent = indentation(line);
                    for directive in SAFETY_DIRECTIVES {
                        push_line(&mut out, indent, directive, inserted_ending);
                    }
                }
                Trigger::None => {}
            }

            out.push_str(raw);
        }

        // Empty input, or a lone shebang line under AfterShebang
        if header_pending {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(CIMPORT_HEADER);
        }

        out
    }
}

/// What, if anything, a source line asks the annotator to insert.
#[derive(Debug, PartialEq, Eq)]
enum Trigger<'a> {
    None,
    RangeLoop(&'a str),
    Definition,
}

fn classify(line: &str) -> Trigger<'_> {
    let stripped = line.trim();
    if stripped.is_empty() || stripped.starts_with('#') {
        return Trigger::None;
    }

    let mut words = stripped.split_whitespace();
    match words.next() {
        Some("for") => match words.next() {
            Some(ident) if is_identifier(ident) && stripped.contains("in range") => {
                Trigger::RangeLoop(ident)
            }
            _ => Trigger::None,
        },
        Some("def") => Trigger::Definition,
        _ => Trigger::None,
    }
}

/// Leading whitespace of a line.
fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Split a raw line into its content and its `\n` / `\r\n` terminator.
fn split_terminator(raw: &str) -> (&str, &str) {
    if let Some(content) = raw.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = raw.strip_suffix('\n') {
        (content, "\n")
    } else {
        (raw, "")
    }
}

fn push_line(out: &mut String, indent: &str, body: &str, ending: &str) {
    out.push_str(indent);
    out.push_str(body);
    out.push_str(ending);
}
