//! Built-in in-memory style registry.
//!
//! Recognised source surface:
//!
//! ```text
//! import { css, globalCss } from "@devup-ui/react";
//! const button = css({ bg: "red", p: 4 });   // -> const button = "a b";
//! globalCss(`body { margin: 0 }`);           // -> appended to devup-ui.css
//! ```
//!
//! Only files importing from the library package (or one of its aliases)
//! are touched. Each styled file owns a chunk number in split mode; the
//! number is assigned on first sight and never changes afterwards.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::scan::{self, Literal};
use super::{ExtractError, ExtractInput, ExtractOutput, SnapshotKind, StyleRegistry, theme};
use crate::output::{BASE_CSS_FILE, chunk_file_name};
use crate::utils::hash;

/// One atomic rule: `.class{property:value}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StyleRule {
    pub class: String,
    pub property: String,
    pub value: String,
}

impl StyleRule {
    fn render(&self) -> String {
        format!(".{}{{{}:{}}}\n", self.class, self.property, self.value)
    }
}

/// Serialized form of the `sheet` snapshot.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct SheetSnapshot {
    files: BTreeMap<String, BTreeSet<StyleRule>>,
    globals: BTreeMap<String, String>,
    single_css: bool,
}

#[derive(Debug)]
struct CachedExtraction {
    key: u64,
    code: String,
}

/// In-memory registry.
#[derive(Debug, Default)]
pub struct SheetRegistry {
    sheet: SheetSnapshot,
    /// `property:value` -> class name
    class_map: BTreeMap<String, String>,
    /// filename -> chunk number
    file_map: BTreeMap<String, u32>,
    class_names: FxHashSet<String>,
    theme_vars: BTreeMap<String, String>,
    cache: FxHashMap<String, CachedExtraction>,
}

impl SheetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunk number owned by `filename`, if any.
    pub fn file_num(&self, filename: &str) -> Option<u32> {
        self.file_map.get(filename).copied()
    }

    fn next_file_num(&self) -> u32 {
        self.file_map.values().max().map_or(1, |n| n + 1)
    }

    /// Class name for a property/value pair, allocating one if needed.
    fn class_for(&mut self, property: &str, value: &str, debug: bool) -> String {
        let key = format!("{property}:{value}");
        if let Some(class) = self.class_map.get(&key) {
            return class.clone();
        }

        let index = self.class_map.len();
        let mut class = if debug {
            debug_class_name(property, value)
        } else {
            short_class_name(index)
        };
        if self.class_names.contains(&class) {
            class = format!("{class}-{index}");
        }

        self.class_names.insert(class.clone());
        self.class_map.insert(key, class.clone());
        class
    }

    /// Packages whose imports mark a file as styled.
    fn accepts_package(input: &ExtractInput<'_>, package: &str) -> bool {
        package == input.lib_package
            || input
                .import_aliases
                .get(package)
                .is_some_and(|target| target == input.lib_package)
    }

    fn cache_key(input: &ExtractInput<'_>) -> u64 {
        let mut buf = String::with_capacity(input.code.len() + input.relative_css_dir.len() + 4);
        buf.push_str(input.code);
        buf.push('\0');
        buf.push_str(input.relative_css_dir);
        buf.push(if input.single_css { '1' } else { '0' });
        buf.push(if input.debug { '1' } else { '0' });
        hash::compute(&buf)
    }

    fn render_rules<'a>(rules: impl Iterator<Item = &'a StyleRule>) -> String {
        rules.map(StyleRule::render).collect()
    }
}

impl StyleRegistry for SheetRegistry {
    fn code_extract(&mut self, input: &ExtractInput<'_>) -> Result<ExtractOutput, ExtractError> {
        let filename = input.filename;
        let key = Self::cache_key(input);

        if input.cache
            && let Some(cached) = self.cache.get(filename)
            && cached.key == key
        {
            return Ok(ExtractOutput {
                code: cached.code.clone(),
                ..ExtractOutput::default()
            });
        }

        let imports = scan::imports(input.code);
        if !imports
            .iter()
            .any(|(package, _)| Self::accepts_package(input, package))
        {
            return Ok(ExtractOutput {
                code: input.code.to_string(),
                ..ExtractOutput::default()
            });
        }

        let calls = scan::find_calls(input.code, &["css", "globalCss"])
            .map_err(|msg| ExtractError::syntax(filename, msg))?;

        // Parse everything before touching registry state so a syntax error
        // leaves the registry unchanged.
        let mut declarations = Vec::new();
        let mut global_css = String::new();
        for call in &calls {
            match call.name {
                "css" => {
                    let entries = scan::parse_object(call.arg)
                        .map_err(|msg| ExtractError::syntax(filename, msg))?;
                    declarations.push(entries);
                }
                _ => {
                    let raw = scan::parse_template(call.arg)
                        .map_err(|msg| ExtractError::syntax(filename, msg))?;
                    global_css.push_str(raw.trim());
                    global_css.push('\n');
                }
            }
        }

        // Rewrite source: replace calls back to front so ranges stay valid.
        let mut code = input.code.to_string();
        let mut rules = BTreeSet::new();
        let mut class_lists = Vec::with_capacity(declarations.len());
        for entries in &declarations {
            let mut classes = Vec::with_capacity(entries.len());
            for (prop, literal) in entries {
                let property = css_property(prop);
                let value = css_value(&property, literal);
                let class = self.class_for(&property, &value, input.debug);
                rules.insert(StyleRule {
                    class: class.clone(),
                    property,
                    value,
                });
                classes.push(class);
            }
            class_lists.push(classes.join(" "));
        }
        let mut replacements = class_lists.into_iter();
        let mut rewritten: Vec<(std::ops::Range<usize>, String)> = calls
            .iter()
            .map(|call| {
                let text = match call.name {
                    "css" => format!("\"{}\"", replacements.next().unwrap_or_default()),
                    _ => String::new(),
                };
                (call.range.clone(), text)
            })
            .collect();
        rewritten.reverse();
        for (range, text) in rewritten {
            code.replace_range(range, &text);
        }

        // Point alias imports at the library package.
        let mut aliased: Vec<_> = scan::imports(&code)
            .into_iter()
            .filter(|(package, _)| *package != input.lib_package && Self::accepts_package(input, package))
            .map(|(_, range)| range)
            .collect();
        aliased.reverse();
        for range in aliased {
            code.replace_range(range, input.lib_package);
        }

        // Diff against the previous state of this file.
        let rules_changed = self.sheet.files.get(filename).map_or(!rules.is_empty(), |old| *old != rules);
        let global_css = global_css.trim_end().to_string();
        let globals_changed = self
            .sheet
            .globals
            .get(filename)
            .map_or(!global_css.is_empty(), |old| *old != global_css);

        let has_rules = !rules.is_empty();
        let has_globals = !global_css.is_empty();

        if has_rules {
            self.sheet.files.insert(filename.to_string(), rules);
        } else {
            self.sheet.files.remove(filename);
        }
        if has_globals {
            self.sheet.globals.insert(filename.to_string(), global_css);
        } else {
            self.sheet.globals.remove(filename);
        }
        self.sheet.single_css = input.single_css;

        let mut header = String::new();
        let mut css_file = None;
        let mut updated_base_style = globals_changed;

        if input.single_css {
            if has_rules || has_globals {
                header.push_str(&css_import(input.relative_css_dir, BASE_CSS_FILE));
            }
            if rules_changed || globals_changed {
                css_file = Some(BASE_CSS_FILE.to_string());
                updated_base_style = true;
            }
        } else {
            if has_globals {
                header.push_str(&css_import(input.relative_css_dir, BASE_CSS_FILE));
            }
            let file_num = match self.file_num(filename) {
                Some(n) => Some(n),
                None if has_rules => {
                    let n = self.next_file_num();
                    self.file_map.insert(filename.to_string(), n);
                    Some(n)
                }
                None => None,
            };
            if let Some(n) = file_num {
                let chunk = chunk_file_name(n);
                if has_rules {
                    header.push_str(&css_import(input.relative_css_dir, &chunk));
                }
                if rules_changed {
                    css_file = Some(chunk);
                }
            }
            if css_file.is_none() && globals_changed {
                css_file = Some(BASE_CSS_FILE.to_string());
            }
        }

        let code = header + &code;
        self.cache.insert(
            filename.to_string(),
            CachedExtraction {
                key,
                code: code.clone(),
            },
        );

        Ok(ExtractOutput {
            code,
            map: None,
            css_file,
            updated_base_style,
        })
    }

    fn get_css(&self, file_num: Option<u32>, import_main_css: bool) -> String {
        match file_num {
            None => {
                let mut css = theme::render(&self.theme_vars);
                for global in self.sheet.globals.values() {
                    css.push_str(global);
                    css.push('\n');
                }
                if self.sheet.single_css {
                    let all: BTreeSet<&StyleRule> = self.sheet.files.values().flatten().collect();
                    css.push_str(&Self::render_rules(all.into_iter()));
                }
                css
            }
            Some(n) => {
                let mut css = if import_main_css {
                    format!("@import \"./{BASE_CSS_FILE}\";\n")
                } else {
                    String::new()
                };
                let rules = self
                    .file_map
                    .iter()
                    .find(|(_, num)| **num == n)
                    .and_then(|(file, _)| self.sheet.files.get(file));
                if let Some(rules) = rules {
                    css.push_str(&Self::render_rules(rules.iter()));
                }
                css
            }
        }
    }

    fn export_snapshot(&self, kind: SnapshotKind) -> Result<String, ExtractError> {
        let result = match kind {
            SnapshotKind::Sheet => serde_json::to_string(&self.sheet),
            SnapshotKind::ClassMap => serde_json::to_string(&self.class_map),
            SnapshotKind::FileMap => serde_json::to_string(&self.file_map),
        };
        result.map_err(|e| ExtractError::Snapshot(kind, e))
    }

    fn import_snapshot(&mut self, kind: SnapshotKind, value: Value) -> Result<(), ExtractError> {
        let err = |e| ExtractError::Snapshot(kind, e);
        match kind {
            SnapshotKind::Sheet => self.sheet = serde_json::from_value(value).map_err(err)?,
            SnapshotKind::ClassMap => {
                self.class_map = serde_json::from_value(value).map_err(err)?;
                self.class_names = self.class_map.values().cloned().collect();
            }
            SnapshotKind::FileMap => self.file_map = serde_json::from_value(value).map_err(err)?,
        }
        self.cache.clear();
        Ok(())
    }

    fn register_theme(&mut self, theme: Value) -> Result<(), ExtractError> {
        self.theme_vars = theme::flatten(&theme)?;
        Ok(())
    }
}

// =============================================================================
// Naming and value helpers
// =============================================================================

/// `0 -> a`, `25 -> z`, `26 -> ba`, ...
fn short_class_name(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'a' + (index % 26) as u8);
        index /= 26;
        if index == 0 {
            break;
        }
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

fn debug_class_name(property: &str, value: &str) -> String {
    let value: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{property}-{value}")
}

/// Expand shorthand props and convert camelCase to kebab-case.
fn css_property(prop: &str) -> String {
    let expanded = match prop {
        "bg" => "background",
        "p" => "padding",
        "px" => "padding-inline",
        "py" => "padding-block",
        "m" => "margin",
        "mx" => "margin-inline",
        "my" => "margin-block",
        "w" => "width",
        "h" => "height",
        "color" => "color",
        _ => prop,
    };
    let mut out = String::with_capacity(expanded.len() + 4);
    for c in expanded.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn css_value(property: &str, literal: &Literal) -> String {
    const UNITLESS: &[&str] = &["opacity", "z-index", "font-weight", "line-height", "flex", "order"];
    match literal {
        Literal::Str(s) => s.clone(),
        Literal::Num(n) if *n == 0.0 || UNITLESS.contains(&property) => format!("{n}"),
        Literal::Num(n) => format!("{n}px"),
    }
}

fn css_import(relative_css_dir: &str, file: &str) -> String {
    let dir = relative_css_dir.trim_end_matches('/');
    format!("import \"{dir}/{file}\";\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HEADER: &str = "import { css, globalCss } from \"@devup-ui/react\";\n";

    fn input<'a>(
        filename: &'a str,
        code: &'a str,
        single_css: bool,
        aliases: &'a FxHashMap<String, String>,
    ) -> ExtractInput<'a> {
        ExtractInput {
            filename,
            code,
            lib_package: "@devup-ui/react",
            relative_css_dir: "../df/devup-ui",
            single_css,
            debug: false,
            cache: true,
            import_aliases: aliases,
        }
    }

    fn styled(body: &str) -> String {
        format!("{HEADER}{body}")
    }

    #[test]
    fn test_short_class_names() {
        assert_eq!(short_class_name(0), "a");
        assert_eq!(short_class_name(25), "z");
        assert_eq!(short_class_name(26), "ba");
        assert_eq!(short_class_name(27), "bb");
    }

    #[test]
    fn test_css_property_and_value() {
        assert_eq!(css_property("bg"), "background");
        assert_eq!(css_property("fontSize"), "font-size");
        assert_eq!(css_value("padding", &Literal::Num(4.0)), "4px");
        assert_eq!(css_value("opacity", &Literal::Num(0.5)), "0.5");
        assert_eq!(css_value("margin", &Literal::Num(0.0)), "0");
    }

    #[test]
    fn test_unstyled_file_untouched() {
        let mut registry = SheetRegistry::new();
        let aliases = FxHashMap::default();
        let code = "import React from 'react';\nconst a = css({ bg: 'red' });";
        let out = registry.code_extract(&input("a.tsx", code, false, &aliases)).unwrap();

        assert_eq!(out.code, code);
        assert_eq!(out.css_file, None);
        assert!(!out.updated_base_style);
    }

    #[test]
    fn test_split_mode_extraction() {
        let mut registry = SheetRegistry::new();
        let aliases = FxHashMap::default();
        let code = styled("const a = css({ bg: \"red\", p: 4 });");
        let out = registry.code_extract(&input("src/App.tsx", &code, false, &aliases)).unwrap();

        assert_eq!(out.css_file.as_deref(), Some("devup-ui-1.css"));
        assert!(!out.updated_base_style);
        assert!(out.code.starts_with("import \"../df/devup-ui/devup-ui-1.css\";\n"));
        assert!(out.code.contains("const a = \"a b\";"));

        let chunk = registry.get_css(Some(1), true);
        assert!(chunk.starts_with("@import \"./devup-ui.css\";"));
        assert!(chunk.contains(".a{background:red}"));
        assert!(chunk.contains(".b{padding:4px}"));
    }

    #[test]
    fn test_chunk_numbers_stable() {
        let mut registry = SheetRegistry::new();
        let aliases = FxHashMap::default();
        let a = styled("css({ bg: 'red' })");
        let b = styled("css({ bg: 'blue' })");
        let a2 = styled("css({ bg: 'green' })");

        registry.code_extract(&input("a.tsx", &a, false, &aliases)).unwrap();
        registry.code_extract(&input("b.tsx", &b, false, &aliases)).unwrap();
        let out = registry.code_extract(&input("a.tsx", &a2, false, &aliases)).unwrap();

        assert_eq!(registry.file_num("a.tsx"), Some(1));
        assert_eq!(registry.file_num("b.tsx"), Some(2));
        assert_eq!(out.css_file.as_deref(), Some("devup-ui-1.css"));
    }

    #[test]
    fn test_reextract_unchanged_reports_no_css_file() {
        let mut registry = SheetRegistry::new();
        let aliases = FxHashMap::default();
        let code = styled("css({ bg: 'red' })");

        let first = registry.code_extract(&input("a.tsx", &code, false, &aliases)).unwrap();
        let mut no_cache = input("a.tsx", &code, false, &aliases);
        no_cache.cache = false;
        let second = registry.code_extract(&no_cache).unwrap();
        let cached = registry.code_extract(&input("a.tsx", &code, false, &aliases)).unwrap();

        assert!(first.css_file.is_some());
        assert_eq!(second.css_file, None);
        assert_eq!(second.code, first.code);
        assert_eq!(cached.code, first.code);
        assert_eq!(registry.file_num("a.tsx"), Some(1));
    }

    #[test]
    fn test_single_css_mode() {
        let mut registry = SheetRegistry::new();
        let aliases = FxHashMap::default();
        let code = styled("css({ bg: 'red' })");
        let out = registry.code_extract(&input("a.tsx", &code, true, &aliases)).unwrap();

        assert_eq!(out.css_file.as_deref(), Some("devup-ui.css"));
        assert!(out.updated_base_style);
        assert!(out.code.starts_with("import \"../df/devup-ui/devup-ui.css\";\n"));
        assert!(registry.get_css(None, false).contains(".a{background:red}"));
        assert_eq!(registry.file_num("a.tsx"), None);
    }

    #[test]
    fn test_global_css_updates_base() {
        let mut registry = SheetRegistry::new();
        let aliases = FxHashMap::default();
        let code = styled("globalCss(`body { margin: 0 }`);");
        let out = registry.code_extract(&input("g.tsx", &code, false, &aliases)).unwrap();

        assert!(out.updated_base_style);
        assert_eq!(out.css_file.as_deref(), Some("devup-ui.css"));
        assert!(!out.code.contains("globalCss(`"));
        assert!(registry.get_css(None, false).contains("body { margin: 0 }"));
    }

    #[test]
    fn test_syntax_error_leaves_state() {
        let mut registry = SheetRegistry::new();
        let aliases = FxHashMap::default();
        let code = styled("css({ bg: color })");
        let err = registry.code_extract(&input("bad.tsx", &code, false, &aliases));

        assert!(matches!(err, Err(ExtractError::Syntax { .. })));
        assert_eq!(registry.file_num("bad.tsx"), None);
        assert_eq!(registry.export_class_map().unwrap(), "{}");
    }

    #[test]
    fn test_import_alias() {
        let mut registry = SheetRegistry::new();
        let mut aliases = FxHashMap::default();
        aliases.insert("@devup-ui/core".to_string(), "@devup-ui/react".to_string());
        let code = "import { css } from \"@devup-ui/core\";\ncss({ bg: 'red' })";
        let out = registry.code_extract(&input("a.tsx", code, false, &aliases)).unwrap();

        assert!(out.css_file.is_some());
        assert!(out.code.contains("from \"@devup-ui/react\""));
        assert!(!out.code.contains("@devup-ui/core"));
    }

    #[test]
    fn test_debug_class_names() {
        let mut registry = SheetRegistry::new();
        let aliases = FxHashMap::default();
        let code = styled("css({ bg: 'red' })");
        let mut debug = input("a.tsx", &code, false, &aliases);
        debug.debug = true;
        let out = registry.code_extract(&debug).unwrap();
        assert!(out.code.contains("\"background-red\""));
    }

    #[test]
    fn test_snapshot_round_trip_keeps_numbering() {
        let mut registry = SheetRegistry::new();
        let aliases = FxHashMap::default();
        registry
            .code_extract(&input("a.tsx", &styled("css({ bg: 'red' })"), false, &aliases))
            .unwrap();
        registry
            .code_extract(&input("b.tsx", &styled("css({ bg: 'blue' })"), false, &aliases))
            .unwrap();

        let mut restored = SheetRegistry::new();
        for kind in SnapshotKind::ALL {
            let text = registry.export_snapshot(kind).unwrap();
            restored
                .import_snapshot(kind, serde_json::from_str(&text).unwrap())
                .unwrap();
        }

        assert_eq!(restored.get_css(Some(2), false), registry.get_css(Some(2), false));
        let out = restored
            .code_extract(&input("c.tsx", &styled("css({ bg: 'red' })"), false, &aliases))
            .unwrap();
        assert_eq!(out.css_file.as_deref(), Some("devup-ui-3.css"));
        // existing class reused
        assert!(out.code.contains("\"a\""));
    }

    #[test]
    fn test_import_snapshot_rejects_garbage() {
        let mut registry = SheetRegistry::new();
        let err = registry.import_file_map(json!({ "a.tsx": "one" }));
        assert!(matches!(err, Err(ExtractError::Snapshot(SnapshotKind::FileMap, _))));
    }

    #[test]
    fn test_theme_in_base_css() {
        let mut registry = SheetRegistry::new();
        registry
            .register_theme(json!({ "colors": { "primary": "#123" } }))
            .unwrap();
        assert!(registry.get_css(None, false).starts_with(":root{--primary:#123;}"));
    }
}
