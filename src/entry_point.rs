use crate::metadata::MethodMetadata;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

/// Where a method declaration lives in the analyzed sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub path: PathBuf,
    pub project: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
}

/// A located method declaration together with its bound symbol.
///
/// Equality and hashing use the display name only, matching [`MethodMetadata`].
/// An entry point without a symbol is kept so callers can report it, but the
/// mapping context never expands it.
#[derive(Clone)]
pub struct EntryPoint<S> {
    symbol: Option<S>,
    display_name: String,
    declaration: Declaration,
}

impl<S> EntryPoint<S> {
    pub fn new(symbol: Option<S>, display_name: impl Into<String>, declaration: Declaration) -> Self {
        Self {
            symbol,
            display_name: display_name.into(),
            declaration,
        }
    }

    pub fn symbol(&self) -> Option<&S> {
        self.symbol.as_ref()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    pub fn source_path(&self) -> String {
        self.declaration.path.to_string_lossy().into_owned()
    }

    pub fn metadata(&self) -> MethodMetadata {
        MethodMetadata::new(self.display_name.clone(), self.source_path())
    }
}

impl<S> PartialEq for EntryPoint<S> {
    fn eq(&self, other: &Self) -> bool {
        self.display_name == other.display_name
    }
}

impl<S> Eq for EntryPoint<S> {}

impl<S> Hash for EntryPoint<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.display_name.hash(state);
    }
}

impl<S> fmt::Debug for EntryPoint<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("display_name", &self.display_name)
            .field("bound", &self.symbol.is_some())
            .field("declaration", &self.declaration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(path: &str) -> Declaration {
        Declaration {
            path: PathBuf::from(path),
            project: "Core".to_string(),
            start_byte: 0,
            end_byte: 10,
            start_line: 1,
        }
    }

    #[test]
    fn equality_uses_display_name_only() {
        let a = EntryPoint::new(Some(1u32), "A.Run()", decl("a.cs"));
        let b = EntryPoint::new(Some(2u32), "A.Run()", decl("b.cs"));
        let c = EntryPoint::new(None, "A.Stop()", decl("a.cs"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn metadata_carries_source_path() {
        let entry: EntryPoint<u32> = EntryPoint::new(None, "A.Run()", decl("src/a.cs"));
        let meta = entry.metadata();
        assert_eq!(meta.display_name(), "A.Run()");
        assert_eq!(meta.source_path(), "src/a.cs");
        assert!(entry.symbol().is_none());
    }
}
