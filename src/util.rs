use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path};

pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

pub fn normalize_rel_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).with_context(|| {
        format!("strip prefix {} from {}", root.display(), path.display())
    })?;
    Ok(normalize_path(rel))
}

pub fn normalize_path(path: &Path) -> String {
    let mut parts = Vec::new();
    for comp in path.components() {
        match comp {
            Component::Normal(os) => parts.push(os.to_string_lossy().to_string()),
            Component::ParentDir => parts.push("..".to_string()),
            Component::CurDir => {}
            _ => {}
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display())),
        _ => Ok(()),
    }
}

/// Rejects empty or whitespace-only values with `The {what} cannot be blank.`
pub fn require_non_blank(value: &str, what: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("The {what} cannot be blank."))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn normalizes_relative_paths() {
        let root = PathBuf::from("/ws");
        assert_eq!(
            normalize_rel_path(&root, &root.join("src").join("./A.cs")).unwrap(),
            "src/A.cs"
        );
        assert!(normalize_rel_path(&root, Path::new("/other/A.cs")).is_err());
        assert_eq!(normalize_path(Path::new("")), ".");
    }

    #[test]
    fn blank_values_are_rejected() {
        assert_eq!(
            require_non_blank("  ", "class name"),
            Err("The class name cannot be blank.".to_string())
        );
        assert_eq!(require_non_blank(" Foo ", "class name"), Ok("Foo".to_string()));
    }
}
