use crate::casefold;
use crate::config::{PATH_COMPONENTS, SHARD_PLACEHOLDER};
use crate::error::PathError;
use crate::namespace::NamespaceTable;
use crate::shard;
use std::path::PathBuf;

/// Derives on-disk paths for page titles from a namespace table.
///
/// Paths are relative to the output root and start with `/`:
///
/// - `"Accordion"` -> `/a/c/c/Accordion`
/// - `"Template:AA"` -> `/Template/a/a/_/Template:AA`
///
/// The result depends only on the table, the depth and the title.
#[derive(Debug, Clone, Copy)]
pub struct PathBuilder<'a> {
    table: &'a NamespaceTable,
    depth: usize,
}

impl<'a> PathBuilder<'a> {
    pub fn new(table: &'a NamespaceTable) -> Self {
        Self {
            table,
            depth: PATH_COMPONENTS,
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn build(&self, title: &str) -> Result<String, PathError> {
        if title.is_empty() {
            return Err(PathError::EmptyTitle);
        }

        let resolved = self.table.resolve(title);
        let namespace = resolved.namespace;
        // Shard on the bare name so "Template:Foo" lands under f/o/o, not t/e/m.
        let prefix = shard::shard(resolved.local_name, self.depth);
        let folded = casefold::fold(namespace, resolved.local_name)?;

        let mut path = String::with_capacity(
            2 * namespace.name.len() + prefix.len() + folded.len() + 3,
        );
        let mut file_name = String::with_capacity(namespace.name.len() + folded.len() + 1);
        if !namespace.is_default() {
            path.push('/');
            path.push_str(&path_component(&namespace.name));
            file_name.push_str(&namespace.name);
            file_name.push(':');
        }
        file_name.push_str(&folded);
        path.push_str(&prefix);
        path.push('/');
        path.push_str(&path_component(&file_name));

        Ok(path)
    }
}

/// Makes `name` usable as a single path segment: `/` becomes `_`, and the
/// special entries `.` and `..` are spelled with placeholders.
fn path_component(name: &str) -> String {
    match name {
        "." | ".." => SHARD_PLACEHOLDER.to_string().repeat(name.len()),
        _ => name.replace('/', "_"),
    }
}

/// Path of `title` at the default shard depth.
pub fn build_path(table: &NamespaceTable, title: &str) -> Result<String, PathError> {
    PathBuilder::new(table).build(title)
}

/// Relative path from the directory holding `from` to `to`, both as returned
/// by [`build_path`]. Used as the target of a redirect symlink.
pub fn relative_link(from: &str, to: &str) -> PathBuf {
    let mut from_dir: Vec<&str> = from.split('/').filter(|c| !c.is_empty()).collect();
    from_dir.pop();
    let to: Vec<&str> = to.split('/').filter(|c| !c.is_empty()).collect();

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut link = PathBuf::new();
    for _ in common..from_dir.len() {
        link.push("..");
    }
    for component in &to[common..] {
        link.push(component);
    }
    link
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casefold::CaseRule;
    use crate::namespace::Namespace;

    fn table() -> NamespaceTable {
        NamespaceTable::new(vec![
            Namespace::new("", CaseRule::FirstLetter),
            Namespace::new("Template", CaseRule::FirstLetter),
        ])
    }

    #[test]
    fn known_titles() {
        let table = table();
        for (title, want) in [
            ("Accordion", "/a/c/c/Accordion"),
            ("101 Dalmatians (1961 movie)", "/1/0/1/101 Dalmatians (1961 movie)"),
            ("A cappella", "/a/_/c/A cappella"),
            ("a cappella", "/a/_/c/A cappella"),
            ("Acarajé", "/a/c/a/Acarajé"),
            ("Açaí Palm", "/a/_/a/Açaí Palm"),
            ("açaí Palm", "/a/_/a/Açaí Palm"),
            ("-1", "/_/1/_/-1"),
            ("10", "/1/0/_/10"),
            ("A4", "/a/4/_/A4"),
            ("Aaa", "/a/a/a/Aaa"),
            ("A∴A∴", "/a/_/a/A∴A∴"),
            ("Not a Template:Abbreviations", "/n/o/t/Not a Template:Abbreviations"),
            ("Template:Abbreviations", "/Template/a/b/b/Template:Abbreviations"),
            ("Template:AA", "/Template/a/a/_/Template:AA"),
        ] {
            assert_eq!(build_path(&table, title).unwrap(), want, "title {title:?}");
        }
    }

    #[test]
    fn namespace_prefix_uses_declared_spelling() {
        let table = table();
        assert_eq!(
            build_path(&table, "template:abbreviations").unwrap(),
            "/Template/a/b/b/Template:Abbreviations"
        );
    }

    #[test]
    fn slash_in_name_is_replaced() {
        let table = table();
        assert_eq!(build_path(&table, "AC/DC").unwrap(), "/a/c/_/AC_DC");
        assert_eq!(
            build_path(&table, "Template:Foo/doc").unwrap(),
            "/Template/f/o/o/Template:Foo_doc"
        );
    }

    #[test]
    fn deterministic() {
        let table = table();
        for title in ["Accordion", "Template:AA", "açaí Palm", "-1"] {
            assert_eq!(
                build_path(&table, title).unwrap(),
                build_path(&table, title).unwrap()
            );
        }
    }

    #[test]
    fn empty_title_rejected() {
        assert_eq!(build_path(&table(), ""), Err(PathError::EmptyTitle));
    }

    #[test]
    fn bare_namespace_prefix_rejected() {
        assert_eq!(
            build_path(&table(), "Template:"),
            Err(PathError::EmptyName {
                namespace: "Template".to_string()
            })
        );
    }

    #[test]
    fn unsupported_case_rule_propagates() {
        let table = NamespaceTable::new(vec![
            Namespace::new("", CaseRule::FirstLetter),
            Namespace::new("Gadget definition", CaseRule::from("case-sensitive")),
        ]);
        assert_eq!(
            build_path(&table, "Gadget definition:foo"),
            Err(PathError::UnsupportedCaseRule("case-sensitive".to_string()))
        );
        assert!(build_path(&table, "Foo").is_ok());
    }

    #[test]
    fn missing_default_namespace_cannot_fold() {
        let table = NamespaceTable::new(vec![Namespace::new("Template", CaseRule::FirstLetter)]);
        assert_eq!(
            build_path(&table, "Accordion"),
            Err(PathError::UnsupportedCaseRule(String::new()))
        );
        assert_eq!(
            build_path(&table, "Template:AA").unwrap(),
            "/Template/a/a/_/Template:AA"
        );
    }

    #[test]
    fn custom_depth() {
        let table = table();
        let builder = PathBuilder::new(&table).with_depth(1);
        assert_eq!(builder.build("Accordion").unwrap(), "/a/Accordion");
        let builder = PathBuilder::new(&table).with_depth(0);
        assert_eq!(builder.build("Template:AA").unwrap(), "/Template/Template:AA");
    }

    #[test]
    fn no_parent_components() {
        let table = table();
        for title in ["../etc/passwd", "Template:../../x", "a/../../b"] {
            let path = build_path(&table, title).unwrap();
            assert!(
                path.split('/').all(|c| c != ".."),
                "{title:?} -> {path:?}"
            );
        }
    }

    #[test]
    fn dot_titles_stay_inside_root() {
        let table = table();
        assert_eq!(build_path(&table, "..").unwrap(), "/_/_/_/__");
        assert_eq!(build_path(&table, ".").unwrap(), "/_/_/_/_");
        assert_eq!(build_path(&table, "...").unwrap(), "/_/_/_/...");
    }

    #[test]
    fn namespace_name_is_sanitized() {
        let table = NamespaceTable::new(vec![
            Namespace::new("", CaseRule::FirstLetter),
            Namespace::new("A/B", CaseRule::FirstLetter),
            Namespace::new("..", CaseRule::FirstLetter),
            Namespace::new(".", CaseRule::FirstLetter),
        ]);
        assert_eq!(build_path(&table, "A/B:x").unwrap(), "/A_B/x/_/_/A_B:X");
        assert_eq!(build_path(&table, "..:x").unwrap(), "/__/x/_/_/..:X");
        assert_eq!(build_path(&table, ".:x").unwrap(), "/_/x/_/_/.:X");

        for title in ["A/B:x", "..:x", ".:x", "..:.."] {
            let path = build_path(&table, title).unwrap();
            assert_eq!(path.matches('/').count(), 5, "{title:?} -> {path:?}");
            assert!(
                path.split('/').all(|c| c != ".." && c != "."),
                "{title:?} -> {path:?}"
            );
        }
    }

    #[test]
    fn shared_table_across_threads() {
        let table = table();
        let titles = [
            "Accordion",
            "a cappella",
            "Template:AA",
            "açaí Palm",
            "101 Dalmatians (1961 movie)",
            "Not a Template:Abbreviations",
        ];
        let sequential: Vec<_> = titles
            .iter()
            .map(|t| build_path(&table, t).unwrap())
            .collect();

        let table = &table;
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(move || {
                        titles
                            .iter()
                            .map(|t| build_path(table, t).unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), sequential);
            }
        });
    }

    #[test]
    fn relative_link_same_directory() {
        assert_eq!(
            relative_link("/r/u/s/Rust", "/r/u/s/Rust (programming language)"),
            PathBuf::from("Rust (programming language)")
        );
    }

    #[test]
    fn relative_link_across_shards() {
        assert_eq!(
            relative_link("/a/b/c/Abc", "/a/x/y/Axy"),
            PathBuf::from("../../x/y/Axy")
        );
    }

    #[test]
    fn relative_link_out_of_namespace() {
        assert_eq!(
            relative_link("/Template/a/a/_/Template:AA", "/a/c/c/Accordion"),
            PathBuf::from("../../../../a/c/c/Accordion")
        );
    }
}
