use std::path::{Path, PathBuf};

/// Resolves paths in a config file relative to the file's own directory.
#[derive(Clone)]
pub struct PathResolver {
    base_dir: PathBuf,
}

impl PathResolver {
    pub fn new(config_path: &Path) -> Self {
        let base_dir = config_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        Self { base_dir }
    }

    pub fn resolve_opt(&self, p: &mut Option<PathBuf>) {
        if let Some(path) = p.as_mut() {
            self.resolve(path);
        }
    }

    pub fn resolve(&self, p: &mut PathBuf) {
        if p.as_os_str().is_empty() || p.is_absolute() || p.as_os_str() == ":memory:" {
            return;
        }
        *p = self.join_clean(p);
    }

    fn join_clean(&self, rel: &Path) -> PathBuf {
        let joined = self.base_dir.join(rel);

        let mut out = PathBuf::new();
        for c in joined.components() {
            use std::path::Component::*;
            match c {
                CurDir => {}
                ParentDir => {
                    out.pop();
                }
                RootDir | Prefix(_) | Normal(_) => out.push(c.as_os_str()),
            }
        }
        if out.as_os_str().is_empty() {
            out.push(".");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_follow_config_dir() {
        let r = PathResolver::new(Path::new("/etc/chatlog/chatlog.yaml"));
        let mut p = PathBuf::from("../models/./weights.json");
        r.resolve(&mut p);
        assert_eq!(p, PathBuf::from("/etc/models/weights.json"));
    }

    #[test]
    fn absolute_and_memory_paths_are_untouched() {
        let r = PathResolver::new(Path::new("conf/chatlog.yaml"));
        let mut abs = PathBuf::from("/data/result.db");
        r.resolve(&mut abs);
        assert_eq!(abs, PathBuf::from("/data/result.db"));

        let mut mem = Some(PathBuf::from(":memory:"));
        r.resolve_opt(&mut mem);
        assert_eq!(mem, Some(PathBuf::from(":memory:")));
    }
}
