use regex::Regex;
use std::path::Path;

/// Converts a glob with `*`, `**` and `?` into an anchored regex.
///
/// `*` stays within one path segment, `**` crosses segments, and a
/// `**/` prefix also matches paths with no leading directory.
///
/// # Example
/// ```
/// use engine::glob_to_regex;
/// let re = glob_to_regex("src/*.py").unwrap();
/// assert!(re.is_match("src/app.py"));
/// assert!(!re.is_match("src/sub/app.py"));
/// ```
pub fn glob_to_regex(pat: &str) -> Result<Regex, regex::Error> {
    let pat = if pat.ends_with('/') {
        format!("{pat}**")
    } else {
        pat.to_string()
    };
    let mut regex = String::from("^");
    let mut chars = pat.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        regex.push_str("(?:.*/)?");
                    } else {
                        regex.push_str(".*");
                    }
                } else {
                    regex.push_str("[^/]*");
                }
            }
            '?' => regex.push_str("[^/]"),
            '/' => regex.push('/'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');
    Regex::new(&regex)
}

/// Include/exclude filter over file paths.
///
/// A path is tested both as given and relative to the scan root, so
/// `src/*.py` works whether the root is `.` or an absolute directory.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, (String, regex::Error)> {
        let compile = |globs: &[String]| {
            globs
                .iter()
                .map(|g| glob_to_regex(g).map_err(|e| (g.clone(), e)))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    pub fn is_excluded(&self, path: &Path, root: &Path) -> bool {
        let candidates = candidates(path, root);
        self.exclude
            .iter()
            .any(|re| candidates.iter().any(|c| re.is_match(c)))
    }

    /// Whether a whole directory can be pruned: an exclude glob matches
    /// everything below it.
    pub fn excludes_dir(&self, dir: &Path, root: &Path) -> bool {
        let candidates: Vec<String> = candidates(dir, root)
            .into_iter()
            .map(|c| format!("{c}/"))
            .collect();
        self.exclude
            .iter()
            .any(|re| candidates.iter().any(|c| re.is_match(c)))
    }

    /// Whether a file should be scanned.
    pub fn allows(&self, path: &Path, root: &Path) -> bool {
        if self.is_excluded(path, root) {
            return false;
        }
        if self.include.is_empty() {
            return true;
        }
        let candidates = candidates(path, root);
        self.include
            .iter()
            .any(|re| candidates.iter().any(|c| re.is_match(c)))
    }
}

fn candidates(path: &Path, root: &Path) -> Vec<String> {
    let mut out = vec![normalize(path)];
    if let Ok(relative) = path.strip_prefix(root) {
        let relative = normalize(relative);
        if !relative.is_empty() {
            out.push(relative);
        }
    }
    if let Some(name) = path.file_name() {
        out.push(name.to_string_lossy().into_owned());
    }
    out
}

fn normalize(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    s.strip_prefix("./").map(str::to_string).unwrap_or(s)
}
