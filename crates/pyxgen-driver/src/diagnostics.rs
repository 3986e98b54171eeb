//! Source-located warnings for unresolved imports

use std::path::Path;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use pyxgen_scan::ImportSite;
use tracing::warn;

/// Print one warning report per unresolved import in `source`.
pub fn report_unresolved(file: &Path, source: &str, sites: &[ImportSite]) {
    let filename = file.display().to_string();

    for site in sites {
        let span = (filename.as_str(), site.span.clone());
        let printed = Report::build(ReportKind::Warning, span.clone())
            .with_config(Config::default().with_index_type(IndexType::Byte))
            .with_code("W0001")
            .with_message(format!("unresolved import '{}'", site.module))
            .with_label(
                Label::new(span)
                    .with_message("not importable in the current Python environment")
                    .with_color(Color::Yellow),
            )
            .with_note("the compiled extension will fail to import until this module is installed")
            .finish()
            .eprint((filename.as_str(), Source::from(source)));

        if let Err(e) = printed {
            warn!("failed to render diagnostic for {}: {}", filename, e);
        }
    }
}
