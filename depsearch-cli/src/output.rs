use clap::ValueEnum;
use colored::Colorize;
use depsearch::{ScanMatch, ScanResult};
use itertools::Itertools;
use std::collections::HashSet;
use std::io::Write;

/// How scan results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns, one row per Makefile
    #[default]
    Table,
    /// Pretty-printed JSON array
    Json,
    /// Comma separated values with a header row
    Csv,
    /// One Makefile path per line, for piping into xargs/sed
    Paths,
}

/// Orders results by category, then port, then directory
pub fn sorted(matches: &[ScanMatch]) -> Vec<&ScanMatch> {
    let mut rows: Vec<_> = matches.iter().collect();
    rows.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.port.cmp(&b.port))
            .then_with(|| a.path.cmp(&b.path))
    });
    rows
}

pub fn render(
    format: OutputFormat,
    matches: &[ScanMatch],
    out: &mut impl Write,
    colorize: bool,
) -> ScanResult<()> {
    match format {
        OutputFormat::Table => write_table(matches, out, colorize),
        OutputFormat::Json => write_json(matches, out),
        OutputFormat::Csv => write_csv(matches, out),
        OutputFormat::Paths => write_paths(matches, out),
    }
}

pub fn write_table(matches: &[ScanMatch], out: &mut impl Write, colorize: bool) -> ScanResult<()> {
    let rows = sorted(matches);
    if rows.is_empty() {
        writeln!(out, "No matches found.")?;
        return Ok(());
    }

    let labels: Vec<(String, String)> = rows
        .iter()
        .map(|m| (m.coordinates(), m.matched_terms.iter().join(", ")))
        .collect();
    let coord_width = labels
        .iter()
        .map(|(coords, _)| coords.chars().count())
        .chain(std::iter::once("CATEGORY/PORT".len()))
        .max()
        .unwrap_or_default();
    let terms_width = labels
        .iter()
        .map(|(_, terms)| terms.chars().count())
        .chain(std::iter::once("MATCHED_TERMS".len()))
        .max()
        .unwrap_or_default();

    let header = format!(
        "{:<coord_width$}  {:<terms_width$}  {}",
        "CATEGORY/PORT", "MATCHED_TERMS", "FILE"
    );
    if colorize {
        writeln!(out, "{}", header.bold())?;
    } else {
        writeln!(out, "{header}")?;
    }

    for (m, (coords, terms)) in rows.iter().zip(&labels) {
        writeln!(
            out,
            "{:<coord_width$}  {:<terms_width$}  {}",
            coords,
            terms,
            m.file_path().display()
        )?;
        for line in m.lines.iter().flatten() {
            writeln!(out, "    {line}")?;
        }
    }
    Ok(())
}

pub fn write_json(matches: &[ScanMatch], out: &mut impl Write) -> ScanResult<()> {
    serde_json::to_writer_pretty(&mut *out, &sorted(matches))?;
    writeln!(out)?;
    Ok(())
}

pub fn write_csv(matches: &[ScanMatch], out: &mut impl Write) -> ScanResult<()> {
    writeln!(out, "category,port,path,file,matched_terms")?;
    for m in sorted(matches) {
        let record = [
            m.category.clone(),
            m.port.clone(),
            m.path.display().to_string(),
            m.file.clone(),
            m.matched_terms.iter().join("|"),
        ];
        writeln!(out, "{}", record.iter().map(|field| csv_field(field)).join(","))?;
    }
    Ok(())
}

/// Prints each Makefile path once, in result order
pub fn write_paths(matches: &[ScanMatch], out: &mut impl Write) -> ScanResult<()> {
    let mut seen = HashSet::new();
    for m in sorted(matches) {
        let path = m.file_path();
        if seen.insert(path.clone()) {
            writeln!(out, "{}", path.display())?;
        }
    }
    Ok(())
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) || field.starts_with(char::is_whitespace) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
