use std::path::Path;

pub(crate) fn path_is_file(path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        return Err(anyhow::anyhow!(
            "Expected file, found directory or nothing at \"{}\"",
            path.display()
        ));
    }
    Ok(())
}

pub(crate) fn file_has_ext(path: &Path, expected_ext: &str) -> anyhow::Result<()> {
    path_is_file(path)?;
    match path.extension() {
        Some(ext) if ext == expected_ext => Ok(()),
        Some(ext) => Err(anyhow::anyhow!(
            "Expected file with extension \"{expected_ext}\", found extension \"{ext:?}\", file \"{}\".",
            path.display()
        )),
        None => Err(anyhow::anyhow!(
            "Expected file with extension \"{expected_ext}\", no extension found for file \"{}\".",
            path.display()
        )),
    }
}

/// Parses a `WIDTHxHEIGHT` page size in pixels.
pub(crate) fn parse_page_size(s: &str) -> anyhow::Result<(f64, f64)> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("Expected page size as WIDTHxHEIGHT, got \"{s}\""))?;
    let width = width.trim().parse::<f64>()?;
    let height = height.trim().parse::<f64>()?;
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(anyhow::anyhow!(
            "Page size must be strictly positive, got \"{s}\""
        ));
    }
    Ok((width, height))
}

pub(crate) fn parse_scale(s: &str) -> anyhow::Result<f64> {
    let scale = s.trim().parse::<f64>()?;
    if !(scale.is_finite() && scale > 0.0) {
        return Err(anyhow::anyhow!("Scale must be strictly positive, got \"{s}\""));
    }
    Ok(scale)
}
