use relative_path::{RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid docs directory: {0}")]
    InvalidDocsDir(String),
}

/// Read a page below `root`
pub fn read_file(relative_path: &RelativePath, root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write a page below `root`, creating parent directories
pub fn write_file(relative_path: &RelativePath, root: &Path, content: &str) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// Every markdown file below `root`, sorted
pub fn scan_markdown_files(root: &Path) -> Result<Vec<PathBuf>, IoError> {
    if !root.exists() {
        return Err(IoError::InvalidDocsDir(format!(
            "docs directory not found: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    scan_directory_recursive(root, &mut files)?;
    files.sort();
    Ok(files)
}

/// Like [`scan_markdown_files`], but relative to `root`
pub fn scan_pages(root: &Path) -> Result<Vec<RelativePathBuf>, IoError> {
    let files = scan_markdown_files(root)?;
    let mut pages = Vec::with_capacity(files.len());
    for file in files {
        let relative = file
            .strip_prefix(root)
            .map_err(|e| IoError::InvalidDocsDir(e.to_string()))?;
        let page = RelativePathBuf::from_path(relative)
            .map_err(|e| IoError::InvalidDocsDir(e.to_string()))?;
        pages.push(page);
    }
    Ok(pages)
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;

    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == "md"
        {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_docs_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidDocsDir(format!(
            "directory does not exist: {}",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_docs_dir, create_test_file};

    #[test]
    fn test_scan_finds_nested_pages_only() {
        // Given a docs directory with pages, a nested page and an asset
        let docs_dir = create_test_docs_dir();
        create_test_file(&docs_dir, "index.md", "# Home");
        create_test_file(&docs_dir, "guide/repl.md", "``` {.python .repl}\n```");
        create_test_file(&docs_dir, "guide/session.json", "{}");

        // When scanning for files
        let files = scan_markdown_files(docs_dir.path()).unwrap();

        // Then only markdown files are found
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.file_name().unwrap() == "index.md"));
        assert!(files.iter().any(|f| f.file_name().unwrap() == "repl.md"));
    }

    #[test]
    fn test_scan_pages_is_relative_and_sorted() {
        let docs_dir = create_test_docs_dir();
        create_test_file(&docs_dir, "b.md", "");
        create_test_file(&docs_dir, "a/c.md", "");

        let pages = scan_pages(docs_dir.path()).unwrap();

        assert_eq!(
            pages,
            vec![RelativePathBuf::from("a/c.md"), RelativePathBuf::from("b.md")]
        );
    }

    #[test]
    fn test_handle_invalid_docs_directory() {
        let result = scan_markdown_files(Path::new("/this/path/does/not/exist"));
        assert!(result.unwrap_err().to_string().contains("docs directory"));
    }

    #[test]
    fn test_validate_docs_dir() {
        let docs_dir = create_test_docs_dir();
        assert!(validate_docs_dir(docs_dir.path()).is_ok());
        assert!(matches!(
            validate_docs_dir(Path::new("/nonexistent/path")),
            Err(IoError::InvalidDocsDir(_))
        ));
    }

    #[test]
    fn test_read_file_not_found() {
        let docs_dir = create_test_docs_dir();
        let result = read_file(RelativePath::new("nonexistent.md"), docs_dir.path());
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_file_creates_parent_directories() {
        let site_dir = create_test_docs_dir();
        let relative_path = RelativePath::new("guide/nested/page.md");
        let content = "```python {#hello title=\"#hello\"}\n```\n";

        write_file(relative_path, site_dir.path(), content).unwrap();

        assert_eq!(read_file(relative_path, site_dir.path()).unwrap(), content);
        assert!(site_dir.path().join("guide").join("nested").is_dir());
    }

    #[test]
    fn test_write_file_overwrites_existing() {
        let site_dir = create_test_docs_dir();
        create_test_file(&site_dir, "page.md", "old");

        let relative_path = RelativePath::new("page.md");
        write_file(relative_path, site_dir.path(), "new").unwrap();

        assert_eq!(read_file(relative_path, site_dir.path()).unwrap(), "new");
    }
}
