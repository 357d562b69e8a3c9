use regex::Regex;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

pub fn ensure_upload_dir(upload_folder: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(upload_folder)
}

/// Maps a stored relative path onto the upload folder. Absolute paths and
/// paths that climb out of the folder are refused.
pub fn resolve_stored_path(upload_folder: &Path, stored: &str) -> Option<PathBuf> {
    let relative = Path::new(stored);
    if stored.is_empty() {
        return None;
    }
    let clean = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    clean.then(|| upload_folder.join(relative))
}

fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static pattern"))
}

/// Header-safe file name for `Content-Disposition`.
pub fn download_name(base: &str, suffix: &str) -> String {
    let cleaned = unsafe_chars().replace_all(base.trim(), "_");
    let cleaned = cleaned.trim_matches('_');
    let stem = if cleaned.is_empty() { "Submission" } else { cleaned };
    format!("{}{}", stem, suffix)
}

/// Packs files into a zip archive held in memory. Entries whose file is
/// missing on disk are skipped.
pub fn zip_files(entries: &[(String, PathBuf)]) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip_data = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut zip_data));
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o644);

        for (name, path) in entries {
            let content = match std::fs::read(path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Skipping {} in archive: {}", path.display(), e);
                    continue;
                }
            };
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&content)?;
        }

        zip.finish()?;
    }
    Ok(zip_data)
}
