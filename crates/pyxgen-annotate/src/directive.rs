//! Directive comment lines emitted by the annotator

/// Substring whose presence means the cython module is already imported.
pub const CIMPORT_MARKER: &str = "cimport cython";

/// Header line prepended when [`CIMPORT_MARKER`] is missing.
pub const CIMPORT_HEADER: &str = "# cimport cython";

/// Safety-check directives placed above every `def`, in emission order.
pub const SAFETY_DIRECTIVES: [&str; 4] = [
    "# @boundscheck(False)",
    "# @wraparound(False)",
    "# @nonecheck(False)",
    "# @cdivision(True)",
];

const LOOP_HINT_PREFIX: &str = "# cdef int ";
const LOOP_HINT_SUFFIX: &str = " (annotated)";

/// Integer type hint for a `for <ident> in range(...)` loop variable.
pub fn loop_hint(ident: &str) -> String {
    format!("{}{}{}", LOOP_HINT_PREFIX, ident, LOOP_HINT_SUFFIX)
}

/// Check whether a line (ignoring indentation and terminator) is one the
/// annotator could have inserted.
pub fn is_inserted_line(line: &str) -> bool {
    let stripped = line.trim();
    if stripped == CIMPORT_HEADER || SAFETY_DIRECTIVES.contains(&stripped) {
        return true;
    }

    stripped
        .strip_prefix(LOOP_HINT_PREFIX)
        .and_then(|rest| rest.strip_suffix(LOOP_HINT_SUFFIX))
        .is_some_and(is_identifier)
}

/// Python-style identifier check: a letter or `_` followed by letters,
/// digits or `_`.
pub fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_hint_format() {
        assert_eq!(loop_hint("i"), "# cdef int i (annotated)");
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("i"));
        assert!(is_identifier("_idx2"));
        assert!(is_identifier("größe"));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier("x,"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a.b"));
    }

    #[test]
    fn test_inserted_line_detection() {
        assert!(is_inserted_line("    # @boundscheck(False)"));
        assert!(is_inserted_line("# cimport cython\r\n"));
        assert!(is_inserted_line("\t# cdef int k (annotated)"));
        assert!(!is_inserted_line("# cdef int 1x (annotated)"));
        assert!(!is_inserted_line("# just a comment"));
        assert!(!is_inserted_line("x = 1"));
    }
}
