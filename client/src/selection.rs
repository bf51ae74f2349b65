use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }
}

/// The files picked for upload, in the order they were selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    files: Vec<SelectedFile>,
}

impl FileSelection {
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            files: paths
                .into_iter()
                .map(|p| SelectedFile::from_path(p.as_ref()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn listing(&self) -> FileListing {
        FileListing {
            names: self.files.iter().map(|f| f.name.clone()).collect(),
        }
    }
}

/// What the file-names region shows after a valid submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileListing {
    pub names: Vec<String>,
}

impl FileListing {
    pub const HEADING: &'static str = "Uploaded Files:";

    /// `Uploaded Files: <p>a.pdf</p><p>b.pdf</p>...`
    pub fn to_markup(&self) -> String {
        let entries: String = self
            .names
            .iter()
            .map(|name| format!("<p>{}</p>", escape_html(name)))
            .collect();
        format!("{} {}", Self::HEADING, entries)
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
