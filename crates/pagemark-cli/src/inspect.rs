// Imports
use crate::{cli, validators};
use anyhow::Context;
use pagemark_compose::Viewport;
use pagemark_engine::{Engine, EngineConfig};
use std::path::Path;

pub(crate) async fn run_inspect(
    doc: &Path,
    config: EngineConfig,
    viewport: Viewport,
) -> anyhow::Result<()> {
    validators::file_has_ext(doc, "json")?;
    let json = cli::read_string_from_file(doc).await?;

    let mut engine = Engine::new(config, viewport);
    let (report, _) = engine
        .import_remote_json(&json)
        .with_context(|| format!("Failed to import document \"{}\".", doc.display()))?;

    println!(
        "{} annotations imported, {} skipped",
        report.inserted + report.replaced,
        report.skipped
    );
    for line in inspect_lines(&engine) {
        println!("{line}");
    }
    Ok(())
}

/// One line per live annotation in paint order: id, kind and pixel rect.
pub(crate) fn inspect_lines(engine: &Engine) -> Vec<String> {
    engine
        .render_items()
        .into_iter()
        .map(|item| {
            format!(
                "{}\t{}\tleft: {:.1}, top: {:.1}, width: {:.1}, height: {:.1}",
                item.id,
                item.kind,
                item.bounds.left,
                item.bounds.top,
                item.bounds.width,
                item.bounds.height
            )
        })
        .collect()
}
