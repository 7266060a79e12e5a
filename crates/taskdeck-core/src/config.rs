use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info, trace, warn};

use crate::store::{BlankTitle, TitlePolicy};
use crate::task::Priority;
use crate::view::{Filter, SortKey};

const RC_FILE_NAME: &str = ".taskdeckrc";

#[derive(Debug, Clone)]
pub struct Config {
    map: HashMap<String, String>,
    pub loaded_files: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let map = [
            ("title.min_length", "3"),
            ("title.blank", "reject"),
            ("default.priority", "medium"),
            ("default.filter", "all"),
            ("default.sort", "created"),
            ("color", "on"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            map,
            loaded_files: vec![],
        }
    }
}

impl Config {
    #[tracing::instrument(skip(rcfile_override))]
    pub fn load(rcfile_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Self::default();

        if let Some(path) = resolve_rcfile_path(rcfile_override)? {
            info!(rcfile = %path.display(), "loading rc file");
            cfg.load_file(&path, &mut Vec::new())?;
        } else {
            warn!("no rc file found; using defaults");
        }

        Ok(cfg)
    }

    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (k, v) in overrides {
            let key = k.strip_prefix("rc.").unwrap_or(&k).to_string();
            debug!(key = %key, value = %v, "applying override");
            self.map.insert(key, v);
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).map(|v| parse_bool(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.map.iter()
    }

    pub fn title_policy(&self) -> anyhow::Result<TitlePolicy> {
        let min_length = self
            .get_parsed::<usize>("title.min_length")?
            .unwrap_or(crate::store::DEFAULT_MIN_TITLE_LEN);
        if min_length == 0 {
            return Err(anyhow!("title.min_length must be at least 1"));
        }

        let blank = self.get_parsed::<BlankTitle>("title.blank")?.unwrap_or_default();
        Ok(TitlePolicy { min_length, blank })
    }

    pub fn default_priority(&self) -> anyhow::Result<Priority> {
        Ok(self.get_parsed("default.priority")?.unwrap_or_default())
    }

    pub fn default_filter(&self) -> anyhow::Result<Filter> {
        Ok(self.get_parsed("default.filter")?.unwrap_or_default())
    }

    pub fn default_sort(&self) -> anyhow::Result<SortKey> {
        Ok(self.get_parsed("default.sort")?.unwrap_or_default())
    }

    pub fn color(&self) -> bool {
        self.get_bool("color").unwrap_or(true)
    }

    fn get_parsed<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.map.get(key) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| anyhow!("invalid value for {key}: {err}"))
    }

    /// `including` holds the canonical paths of the files currently being
    /// read, outermost first.
    #[tracing::instrument(skip(self, including))]
    fn load_file(&mut self, path: &Path, including: &mut Vec<PathBuf>) -> anyhow::Result<()> {
        let path = expand_tilde(path);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let canonical = fs::canonicalize(&path)
            .with_context(|| format!("failed to resolve {}", path.display()))?;
        if including.contains(&canonical) {
            return Err(anyhow!("include cycle at {}", path.display()));
        }

        self.loaded_files.push(path.clone());
        including.push(canonical);

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        for (line_num, raw_line) in text.lines().enumerate() {
            let mut line = raw_line.trim();
            if let Some((before, _)) = line.split_once('#') {
                line = before.trim();
            }
            if line.is_empty() {
                continue;
            }

            if let Some(include_rest) = line.strip_prefix("include ") {
                let include_path = resolve_include_path(&base_dir, include_rest.trim())?;
                debug!(
                    file = %path.display(),
                    include = %include_path.display(),
                    line = line_num + 1,
                    "processing include"
                );

                if include_path.exists() {
                    self.load_file(&include_path, including)?;
                } else {
                    warn!(include = %include_path.display(), "include file does not exist; skipping");
                }
                continue;
            }

            let (k, v) = line.split_once('=').ok_or_else(|| {
                anyhow!(
                    "invalid config line {}:{}: {}",
                    path.display(),
                    line_num + 1,
                    raw_line
                )
            })?;

            let key = k.trim().to_string();
            let value = v.trim().to_string();
            trace!(key = %key, value = %value, "loaded config key");
            self.map.insert(key, value);
        }

        including.pop();
        Ok(())
    }
}

#[tracing::instrument(skip(override_path))]
fn resolve_rcfile_path(override_path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = override_path {
        return Ok(Some(path.to_path_buf()));
    }

    let Some(home) = dirs::home_dir() else {
        debug!("cannot determine home directory; skipping rc file lookup");
        return Ok(None);
    };
    let candidate = home.join(RC_FILE_NAME);
    if candidate.exists() {
        return Ok(Some(candidate));
    }

    Ok(None)
}

fn resolve_include_path(base_dir: &Path, include: &str) -> anyhow::Result<PathBuf> {
    if include.trim().is_empty() {
        return Err(anyhow!("include path cannot be empty"));
    }

    let expanded = expand_tilde(Path::new(include));
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(base_dir.join(expanded))
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "on" | "true"
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::Config;
    use crate::store::{BlankTitle, TitlePolicy};
    use crate::task::Priority;
    use crate::view::{Filter, SortKey};

    #[test]
    fn defaults_match_strict_policy() {
        let cfg = Config::default();
        assert_eq!(cfg.title_policy().unwrap(), TitlePolicy::default());
        assert_eq!(cfg.default_priority().unwrap(), Priority::Medium);
        assert_eq!(cfg.default_filter().unwrap(), Filter::All);
        assert_eq!(cfg.default_sort().unwrap(), SortKey::Created);
        assert!(cfg.color());
    }

    #[test]
    fn loads_file_with_comments_and_includes() {
        let dir = tempdir().unwrap();
        let extra = dir.path().join("extra.rc");
        fs::write(&extra, "default.sort = priority\n").unwrap();

        let rc = dir.path().join("main.rc");
        fs::write(
            &rc,
            "# settings\n\ntitle.blank = ignore   # lenient\ninclude extra.rc\ninclude missing.rc\ncolor=off\n",
        )
        .unwrap();

        let cfg = Config::load(Some(rc.as_path())).unwrap();
        assert_eq!(cfg.loaded_files.len(), 2);
        assert_eq!(cfg.title_policy().unwrap().blank, BlankTitle::Ignore);
        assert_eq!(cfg.default_sort().unwrap(), SortKey::Priority);
        assert!(!cfg.color());
    }

    #[test]
    fn include_cycles_are_errors() {
        let dir = tempdir().unwrap();
        let looped = dir.path().join("self.rc");
        fs::write(&looped, "color=off\ninclude self.rc\n").unwrap();

        let err = Config::load(Some(looped.as_path())).unwrap_err();
        assert!(err.to_string().starts_with("include cycle at"), "{err}");

        let a = dir.path().join("a.rc");
        let b = dir.path().join("b.rc");
        fs::write(&a, "include b.rc\n").unwrap();
        fs::write(&b, "include ./a.rc\n").unwrap();

        let err = Config::load(Some(a.as_path())).unwrap_err();
        assert!(err.to_string().contains("include cycle at"), "{err}");
    }

    #[test]
    fn same_file_may_be_included_twice_without_nesting() {
        let dir = tempdir().unwrap();
        let shared = dir.path().join("shared.rc");
        fs::write(&shared, "default.sort = alphabetical\n").unwrap();
        let rc = dir.path().join("main.rc");
        fs::write(&rc, "include shared.rc\ninclude shared.rc\n").unwrap();

        let cfg = Config::load(Some(rc.as_path())).unwrap();
        assert_eq!(cfg.loaded_files.len(), 3);
        assert_eq!(cfg.default_sort().unwrap(), SortKey::Alphabetical);
    }

    #[test]
    fn rejects_lines_without_equals() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join("bad.rc");
        fs::write(&rc, "color=on\nnot a setting\n").unwrap();

        let err = Config::load(Some(rc.as_path())).unwrap_err();
        assert!(err.to_string().contains(":2:"), "{err}");
    }

    #[test]
    fn overrides_strip_rc_prefix_and_win() {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![
            ("rc.default.filter".to_string(), "pending".to_string()),
            ("title.min_length".to_string(), "5".to_string()),
        ]);

        assert_eq!(cfg.default_filter().unwrap(), Filter::Pending);
        assert_eq!(cfg.title_policy().unwrap().min_length, 5);
    }

    #[test]
    fn invalid_values_name_the_key() {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![("default.priority".to_string(), "urgent".to_string())]);
        let err = cfg.default_priority().unwrap_err();
        assert!(err.to_string().contains("default.priority"));

        cfg.apply_overrides(vec![("title.min_length".to_string(), "0".to_string())]);
        assert!(cfg.title_policy().is_err());
    }
}
