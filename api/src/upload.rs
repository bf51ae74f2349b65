use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const ALLOWED_EXTENSIONS: [&str; 1] = ["pdf"];

pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        None => false,
    }
}

fn unsafe_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid regex"))
}

/// Reduces a client-supplied name to a flat ASCII file name: path separators
/// become spaces, whitespace runs become `_`, anything outside
/// `[A-Za-z0-9_.-]` is dropped and leading/trailing `.`/`_` are trimmed.
pub fn secure_filename(filename: &str) -> String {
    let flattened = filename.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let stripped = unsafe_chars_re().replace_all(&joined, "");
    stripped.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Writes the PDF uploads into `folder` and returns their paths in upload
/// order. Files without an allowed extension are skipped.
pub async fn save_uploads(folder: &Path, files: &[UploadedFile]) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(folder)
        .await
        .with_context(|| format!("failed to create upload folder {}", folder.display()))?;

    let mut used = HashSet::new();
    let mut paths = Vec::new();

    for (i, file) in files.iter().enumerate() {
        if !allowed_file(&file.filename) {
            log::warn!("Skipping upload with disallowed extension: {}", file.filename);
            continue;
        }

        let mut name = secure_filename(&file.filename);
        if name.is_empty() || !allowed_file(&name) {
            name = format!("document_{}.pdf", i + 1);
        }
        if !used.insert(name.clone()) {
            name = format!("{}_{}", i + 1, name);
            used.insert(name.clone());
        }

        let path = folder.join(&name);
        tokio::fs::write(&path, &file.bytes)
            .await
            .with_context(|| format!("failed to save {}", path.display()))?;
        log::info!("Saved upload {} ({} bytes)", path.display(), file.bytes.len());
        paths.push(path);
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pdf_extension_is_allowed() {
        assert!(allowed_file("report.pdf"));
        assert!(allowed_file("REPORT.PDF"));
        assert!(!allowed_file("report.txt"));
        assert!(!allowed_file("pdf"));
    }

    #[test]
    fn secure_filename_flattens_paths() {
        assert_eq!(secure_filename("My cool report.pdf"), "My_cool_report.pdf");
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("résumé.pdf"), "rsum.pdf");
        assert_eq!(secure_filename("..."), "");
    }

    #[tokio::test]
    async fn saves_pdfs_and_skips_others() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            UploadedFile {
                filename: "a.pdf".to_string(),
                bytes: b"one".to_vec(),
            },
            UploadedFile {
                filename: "notes.txt".to_string(),
                bytes: b"two".to_vec(),
            },
            UploadedFile {
                filename: "sub/a.pdf".to_string(),
                bytes: b"three".to_vec(),
            },
        ];

        let paths = save_uploads(dir.path(), &files).await.unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.pdf", "sub_a.pdf"]);
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"three");
    }

    #[tokio::test]
    async fn duplicate_names_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            UploadedFile {
                filename: "a.pdf".to_string(),
                bytes: b"first".to_vec(),
            },
            UploadedFile {
                filename: "a.pdf".to_string(),
                bytes: b"second".to_vec(),
            },
        ];

        let paths = save_uploads(dir.path(), &files).await.unwrap();
        assert_eq!(paths.len(), 2);
        assert_ne!(paths[0], paths[1]);
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"first");
    }
}
