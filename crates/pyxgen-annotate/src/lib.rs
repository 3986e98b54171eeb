//! Pyxgen annotator
//!
//! Rewrites Python source text into a Cython-flavored variant by inserting
//! directive comments above loop and function headers. The transform is
//! purely textual: no syntax tree is built and the input is never rejected.

pub mod directive;
pub mod heuristic;

pub use directive::{is_inserted_line, CIMPORT_HEADER, CIMPORT_MARKER, SAFETY_DIRECTIVES};
pub use heuristic::{HeaderPlacement, HeuristicAnnotator};

/// A source-to-source annotation strategy.
///
/// The stager only ever sees this trait, so a structural annotator can replace
/// the heuristic one without touching the walk.
pub trait Annotator {
    /// Annotate the full text of one source file.
    fn annotate(&self, text: &str) -> String;
}

impl<A: Annotator + ?Sized> Annotator for &A {
    fn annotate(&self, text: &str) -> String {
        (**self).annotate(text)
    }
}

impl<A: Annotator + ?Sized> Annotator for Box<A> {
    fn annotate(&self, text: &str) -> String {
        (**self).annotate(text)
    }
}
