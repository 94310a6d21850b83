//! CSS file addressing.
//!
//! ```text
//! devup-ui.css              -> None      (aggregate / base stylesheet)
//! devup-ui-5.css            -> Some(5)   (chunk)
//! devup-ui.css?fileNum=79   -> Some(79)  (query-addressed chunk)
//! ```
//!
//! Some bundler pipelines can only route one fixed filename to a loader.
//! In split mode the coordinator therefore rewrites chunk imports into the
//! query form so a single route can dispatch by `fileNum`.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::utils::path::{relative_path, to_slash};

/// Aggregate stylesheet name.
pub const BASE_CSS_FILE: &str = "devup-ui.css";

const CHUNK_PREFIX: &str = "devup-ui-";
const QUERY_PREFIX: &str = "devup-ui.css?fileNum=";

/// `import "<dir>/devup-ui-<n>.css"` with optional `from` clause.
static CHUNK_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\bimport\s+(?:[^;"']*?\s+from\s+)?["'][^"'\n]*?)devup-ui-(\d+)\.css(["'])"#)
        .expect("chunk import pattern is valid")
});

/// File name of chunk `n`.
pub fn chunk_file_name(file_num: u32) -> String {
    format!("{CHUNK_PREFIX}{file_num}.css")
}

/// Chunk number addressed by a CSS file reference, `None` for the base file.
///
/// Leading directories are ignored. Unrecognised names map to `None`.
pub fn get_file_num_from_css_file(css_file: &str) -> Option<u32> {
    let name = css_file.rsplit(['/', '\\']).next().unwrap_or(css_file);

    if let Some(num) = name.strip_prefix(QUERY_PREFIX) {
        let digits = num.split('&').next().unwrap_or(num);
        return digits.parse().ok();
    }

    name.strip_prefix(CHUNK_PREFIX)?
        .strip_suffix(".css")?
        .parse()
        .ok()
}

/// Rewrite chunk imports into the query-addressed form.
///
/// `import "./df/devup-ui-3.css"` becomes `import "./df/devup-ui.css?fileNum=3"`.
/// With `single_css` the code is returned unchanged.
pub fn rewrite_css_imports(code: &str, single_css: bool) -> String {
    if single_css {
        return code.to_string();
    }
    CHUNK_IMPORT_RE
        .replace_all(code, "${1}devup-ui.css?fileNum=${2}${3}")
        .into_owned()
}

/// CSS directory as seen from a source file, for use in import specifiers.
///
/// Always `/`-separated and always starts with `.`, e.g. `../df/devup-ui`
/// or `./df/devup-ui`.
pub fn relative_css_dir(resource_path: &Path, css_dir: &Path) -> String {
    let from = resource_path.parent().unwrap_or(resource_path);
    let rel = to_slash(&relative_path(from, css_dir));
    if rel.is_empty() {
        ".".to_string()
    } else if rel.starts_with('.') {
        rel
    } else {
        format!("./{rel}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_num_base() {
        assert_eq!(get_file_num_from_css_file("devup-ui.css"), None);
        assert_eq!(get_file_num_from_css_file("/repo/df/devup-ui/devup-ui.css"), None);
    }

    #[test]
    fn test_file_num_chunk() {
        assert_eq!(get_file_num_from_css_file("devup-ui-5.css"), Some(5));
        assert_eq!(get_file_num_from_css_file("../df/devup-ui/devup-ui-12.css"), Some(12));
        assert_eq!(get_file_num_from_css_file(r"df\devup-ui\devup-ui-3.css"), Some(3));
    }

    #[test]
    fn test_file_num_query() {
        assert_eq!(get_file_num_from_css_file("devup-ui.css?fileNum=79"), Some(79));
        assert_eq!(
            get_file_num_from_css_file("./df/devup-ui.css?fileNum=2&importMainCss=true"),
            Some(2)
        );
    }

    #[test]
    fn test_file_num_garbage() {
        assert_eq!(get_file_num_from_css_file("devup-ui-x.css"), None);
        assert_eq!(get_file_num_from_css_file("other.css"), None);
        assert_eq!(get_file_num_from_css_file("devup-ui.css?fileNum="), None);
    }

    #[test]
    fn test_chunk_file_name() {
        assert_eq!(chunk_file_name(7), "devup-ui-7.css");
        assert_eq!(get_file_num_from_css_file(&chunk_file_name(7)), Some(7));
    }

    #[test]
    fn test_rewrite_split_mode() {
        let code = "import \"../df/devup-ui/devup-ui-1.css\";\n\
                    import '../df/devup-ui/devup-ui-22.css'\n\
                    import \"../df/devup-ui/devup-ui.css\";\n\
                    const a = \"a\";";
        let out = rewrite_css_imports(code, false);

        assert!(!out.contains("devup-ui-1.css"));
        assert!(!out.contains("devup-ui-22.css"));
        assert!(out.contains("import \"../df/devup-ui/devup-ui.css?fileNum=1\";"));
        assert!(out.contains("import '../df/devup-ui/devup-ui.css?fileNum=22'"));
        assert!(out.contains("import \"../df/devup-ui/devup-ui.css\";"));
        assert!(out.ends_with("const a = \"a\";"));
    }

    #[test]
    fn test_rewrite_single_css_untouched() {
        let code = "import \"./df/devup-ui/devup-ui-1.css\";";
        assert_eq!(rewrite_css_imports(code, true), code);
    }

    #[test]
    fn test_rewrite_leaves_non_imports() {
        let code = "const name = \"devup-ui-1.css\";";
        assert_eq!(rewrite_css_imports(code, false), code);
    }

    #[test]
    fn test_relative_css_dir() {
        assert_eq!(
            relative_css_dir(Path::new("/repo/src/App.tsx"), Path::new("/repo/df/devup-ui")),
            "../df/devup-ui"
        );
        assert_eq!(
            relative_css_dir(Path::new("/repo/App.tsx"), Path::new("/repo/df/devup-ui")),
            "./df/devup-ui"
        );
        assert_eq!(
            relative_css_dir(Path::new("/repo/df/devup-ui/x.tsx"), Path::new("/repo/df/devup-ui")),
            "."
        );
    }
}
