//! Zip bundling for multi-file codes.

use anyhow::{Context, Result};
use codedrop_core::ObjectRecord;
use codedrop_storage::Storage;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

/// Sanitize filename for archive entry to prevent path traversal.
/// Extracts only the base name (strips path components like `../`).
fn sanitize_archive_filename(filename: &str, fallback: &str) -> String {
    Path::new(&filename.replace('\\', "/"))
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

/// Split `name` into stem and extension (including the dot). Dotfiles such as
/// `.env` have no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Assign every record a distinct entry name, appending ` (n)` before the
/// extension to later duplicates.
pub fn unique_entry_names(records: &[ObjectRecord]) -> Vec<String> {
    let mut used = HashSet::new();
    let mut names = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let base = sanitize_archive_filename(record.original_name(), &format!("file-{}", index + 1));
        let mut candidate = base.clone();
        let mut counter = 1;
        while used.contains(&candidate) {
            let (stem, ext) = split_extension(&base);
            candidate = format!("{} ({}){}", stem, counter, ext);
            counter += 1;
        }
        used.insert(candidate.clone());
        names.push(candidate);
    }

    names
}

/// Create a ZIP archive holding every record under its original name.
pub async fn create_zip_archive(storage: &dyn Storage, records: &[ObjectRecord]) -> Result<Vec<u8>> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let names = unique_entry_names(records);

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(std::io::Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644)
            .large_file(records.iter().any(|r| r.byte_size() >= u32::MAX as u64));

        for (record, name) in records.iter().zip(names) {
            let file_data = storage
                .download(record.content_location())
                .await
                .with_context(|| format!("Failed to download file: {}", record.content_location()))?;

            zip.start_file(&name, options)
                .with_context(|| format!("Failed to add file to ZIP: {}", name))?;
            zip.write_all(&file_data)
                .with_context(|| format!("Failed to write file data to ZIP: {}", name))?;
        }

        zip.finish().context("Failed to finalize ZIP archive")?;
    }

    Ok(buffer)
}
