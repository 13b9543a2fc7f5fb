//! Current-project resolution.

use std::path::{Path, PathBuf};

/// The editor session as the engine sees it: ordered roots plus the focused document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    /// Root folders in editor-assigned order.
    pub roots: Vec<PathBuf>,

    /// Path of the focused document, if any.
    pub active_document: Option<PathBuf>,
}

impl Workspace {
    pub fn new(roots: Vec<PathBuf>, active_document: Option<PathBuf>) -> Self {
        Self {
            roots,
            active_document,
        }
    }

    /// A single-root workspace with nothing focused.
    pub fn single(root: impl Into<PathBuf>) -> Self {
        Self::new(vec![root.into()], None)
    }

    pub fn is_multi_root(&self) -> bool {
        self.roots.len() > 1
    }

    /// Resolve the current project of this workspace.
    pub fn resolve_project(&self) -> Option<&Path> {
        resolve_project(&self.roots, self.active_document.as_deref())
    }
}

/// Pick the current project root.
///
/// One root always wins. With several roots the focused document decides: the
/// first root, in workspace order, that contains it. Nested roots are therefore
/// resolved to whichever comes first, not to the most specific one. No document
/// or no containing root means there is no current project.
pub fn resolve_project<'a>(roots: &'a [PathBuf], active_document: Option<&Path>) -> Option<&'a Path> {
    match roots {
        [] => None,
        [only] => Some(only.as_path()),
        _ => {
            let document = active_document?;
            roots
                .iter()
                .find(|root| document.starts_with(root))
                .map(PathBuf::as_path)
        }
    }
}

/// Folder name used as the default project name. Never empty.
pub fn project_basename(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    }
}

/// Exact string under which per-project overrides are stored.
pub fn project_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots(paths: &[&str]) -> Vec<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_no_roots() {
        assert_eq!(resolve_project(&[], None), None);
        assert_eq!(resolve_project(&[], Some(Path::new("/a/x.rs"))), None);
    }

    #[test]
    fn test_single_root_ignores_document() {
        let single = roots(&["/a"]);
        assert_eq!(resolve_project(&single, None), Some(Path::new("/a")));
        assert_eq!(
            resolve_project(&single, Some(Path::new("/elsewhere/x.rs"))),
            Some(Path::new("/a"))
        );
    }

    #[test]
    fn test_multi_root_follows_document() {
        let multi = roots(&["/a", "/b"]);
        assert_eq!(
            resolve_project(&multi, Some(Path::new("/b/x.ts"))),
            Some(Path::new("/b"))
        );
        assert_eq!(resolve_project(&multi, None), None);
        assert_eq!(resolve_project(&multi, Some(Path::new("/c/x.ts"))), None);
    }

    #[test]
    fn test_prefix_is_component_wise() {
        let multi = roots(&["/a", "/ab"]);
        assert_eq!(
            resolve_project(&multi, Some(Path::new("/ab/x.ts"))),
            Some(Path::new("/ab"))
        );
    }

    #[test]
    fn test_nested_roots_first_match_wins() {
        let outer_first = roots(&["/repo", "/repo/packages/web"]);
        assert_eq!(
            resolve_project(&outer_first, Some(Path::new("/repo/packages/web/index.ts"))),
            Some(Path::new("/repo"))
        );

        let inner_first = roots(&["/repo/packages/web", "/repo"]);
        assert_eq!(
            resolve_project(&inner_first, Some(Path::new("/repo/packages/web/index.ts"))),
            Some(Path::new("/repo/packages/web"))
        );
    }

    #[test]
    fn test_basename() {
        assert_eq!(project_basename(Path::new("/proj")), "proj");
        assert_eq!(project_basename(Path::new("/home/me/my-app/")), "my-app");
        assert_eq!(project_basename(Path::new("/")), "/");
    }

    #[test]
    fn test_workspace_helpers() {
        let workspace = Workspace::single("/proj");
        assert!(!workspace.is_multi_root());
        assert_eq!(workspace.resolve_project(), Some(Path::new("/proj")));
    }
}
