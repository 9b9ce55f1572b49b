mod exports;
mod styling;
mod summary;
mod tables;

pub use exports::{export_report, export_secure_report};
pub use styling::{dim, magenta_bold};
pub use summary::{print_secure_summary, print_summary, render_secure_summary, render_summary};

/// Prints the lineage banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔗 lineage"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Fetch artifact dependency checker")
    );
}
