mod common;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;
use indoc::indoc;
use saphyr_marshal::{
    AnyField, DictField, EnvConfig, ErrorCode, Field, FlagsConfig, IntField, ListField,
    LoadOptions, LoadResult, LoadingContext, PathConfig, StringField, TagHandler, Value, load_file,
};

use common::{check_load, load_err, load_ok};

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dirs");
    }
    fs::write(path, content).expect("write file");
}

fn with_roots(roots: &[&Path]) -> LoadOptions {
    LoadOptions::default().with_config(PathConfig::with_roots(roots.iter().copied()))
}

#[test]
fn import_from_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "file1.yaml", "file1_content");

    for tag in ["!import", "!try-import"] {
        let yaml = format!("{tag} file1.yaml");
        let value = load_ok(&yaml, &StringField::new(), with_roots(&[dir.path()]));
        assert_eq!(value, Value::from("file1_content"));
    }
}

#[test]
fn import_requires_a_scalar() {
    load_err("!import [a, b]", &StringField::new(), LoadOptions::default(), ErrorCode::UnexpectedNodeType);
}

#[test]
fn import_skips_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("root_1/file.yaml")).expect("dir named like a file");
    write(dir.path(), "root_2/file.yaml", "file_content");

    let roots = [dir.path().join("root_1"), dir.path().join("root_2")];
    let options = LoadOptions::default().with_config(PathConfig::with_roots(roots));
    let value = load_ok("!import file.yaml", &StringField::new(), options);
    assert_eq!(value, Value::from("file_content"));
}

#[test]
fn missing_import() {
    let dir = tempfile::tempdir().expect("tempdir");
    load_err(
        "!import doesnt_exist.yaml",
        &StringField::new(),
        with_roots(&[dir.path()]),
        ErrorCode::ImportNotFound,
    );

    let (value, errors) = check_load("!try-import doesnt_exist.yaml", &StringField::new(), with_roots(&[dir.path()]));
    assert_eq!(value, None);
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn import_parse_error_is_a_value_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "corrupted.yaml", "key: [unclosed");
    load_err(
        "!import corrupted.yaml",
        &StringField::new(),
        with_roots(&[dir.path()]),
        ErrorCode::ValueError,
    );
}

#[test]
fn relative_import_follows_the_loaded_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "conf/parent.yaml", "child: !import sub/child.yaml\n");
    write(dir.path(), "conf/sub/child.yaml", "!import leaf.yaml\n");
    write(dir.path(), "conf/sub/leaf.yaml", "42\n");

    let field = DictField::new(IntField::new());
    let value = load_file(dir.path().join("conf/parent.yaml"), &field, LoadOptions::default())
        .expect("loads")
        .and_then(|v| v.extract::<IndexMap<String, i64>>())
        .expect("dict");
    assert_eq!(value["child"], 42);

    let options = LoadOptions::default().with_config(PathConfig::default().allow_relative(false));
    let err = load_file(dir.path().join("conf/parent.yaml"), &field, options).expect_err("not found");
    assert_eq!(err.code(), Some(ErrorCode::ImportNotFound));
}

#[test]
fn absolute_import() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "file1.yaml", "file1_content");
    let yaml = format!("!import '{}'", dir.path().join("file1.yaml").display());
    let value = load_ok(&yaml, &StringField::new(), LoadOptions::default());
    assert_eq!(value, Value::from("file1_content"));
}

#[test]
fn imported_errors_point_into_the_imported_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "values.yaml", "- 1\n- nope\n");

    let (value, errors) = check_load(
        "!import values.yaml",
        &ListField::new(IntField::new()),
        with_roots(&[dir.path()]),
    );
    assert_eq!(value, Some(Value::from(vec![1i64])));
    let reported = &errors.errors()[0];
    assert_eq!(reported.code, ErrorCode::ValueError);
    assert!(reported.mark.source().ends_with("values.yaml"), "{reported}");
    assert_eq!(reported.mark.line(), 2);
}

fn glob_layout() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "folder/a/file_1.yaml", "file_1");
    write(dir.path(), "folder/b/c/file_2.yaml", "file_2");
    write(dir.path(), "other/file_3.yaml", "file_3");
    dir
}

fn load_strings(yaml: &str, options: LoadOptions) -> Vec<String> {
    let value = load_ok(yaml, &ListField::new(StringField::new()), options);
    let mut items: Vec<String> = value.extract().expect("list of strings");
    items.sort();
    items
}

#[test]
fn glob_from_root() {
    let dir = glob_layout();
    assert_eq!(
        load_strings("!glob folder/**/*", with_roots(&[dir.path()])),
        ["file_1", "file_2"]
    );
    assert_eq!(
        load_strings("!glob folder/*/*.yaml", with_roots(&[dir.path()])),
        ["file_1"]
    );
    assert!(load_strings("!glob nowhere/*", with_roots(&[dir.path()])).is_empty());
}

#[test]
fn glob_character_class() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "file1.yaml", "one");
    write(dir.path(), "file2.yaml", "two");
    write(dir.path(), "file3.yaml", "three");

    assert_eq!(
        load_strings("!glob file[12].yaml", with_roots(&[dir.path()])),
        ["one", "two"]
    );
    assert_eq!(
        load_strings("!glob file[!12].yaml", with_roots(&[dir.path()])),
        ["three"]
    );
}

#[test]
fn glob_relative_to_loaded_file() {
    let dir = glob_layout();
    let parent = dir.path().join("parent_file.yaml");

    let options = LoadOptions::default().with_location(&parent);
    assert_eq!(load_strings("!glob folder/**/*", options), ["file_1", "file_2"]);

    let options = LoadOptions::default()
        .with_location(&parent)
        .with_config(PathConfig::default().allow_relative(false));
    assert!(load_strings("!glob folder/**/*", options).is_empty());
}

#[test]
fn glob_errors() {
    let field = ListField::new(StringField::new());
    load_err("!glob []", &field, LoadOptions::default(), ErrorCode::UnexpectedNodeType);
    load_err("!glob {}", &field, LoadOptions::default(), ErrorCode::UnexpectedNodeType);

    let dir = glob_layout();
    write(dir.path(), "folder/broken.yaml", "[unclosed");
    let (value, errors) = check_load("!glob folder/**/*", &field, with_roots(&[dir.path()]));
    assert_eq!(errors.codes(), vec![ErrorCode::ValueError]);
    let mut items: Vec<String> = value.and_then(|v| v.extract()).expect("list");
    items.sort();
    assert_eq!(items, ["file_1", "file_2"]);
}

fn env(vars: &[(&str, &str)]) -> LoadOptions {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    LoadOptions::default().with_config(EnvConfig::from_map(vars))
}

#[test]
fn env_values_go_through_the_field() {
    let options = env(&[("PORT", "8080"), ("HOST", "example.org")]);
    let yaml = indoc! {"
        port: !env PORT
        host: !env HOST
        user: !env USER_NAME
    "};
    let value = load_ok(yaml, &AnyField::new(), options);
    assert_eq!(value.to_string(), "{port: 8080, host: example.org}");

    let value = load_ok("!env PORT", &IntField::new(), env(&[("PORT", "8080")]));
    assert_eq!(value, Value::Int(8080));

    load_err("!env PORT", &IntField::new(), env(&[("PORT", "http")]), ErrorCode::ValueError);
    load_err("!env [PORT]", &IntField::new(), env(&[]), ErrorCode::UnexpectedNodeType);
}

#[test]
fn env_defaults_to_process_environment() {
    let Ok(path) = std::env::var("PATH") else {
        return;
    };
    let value = load_ok("!env PATH", &StringField::new(), LoadOptions::default());
    assert_eq!(value, Value::String(path));
}

#[test]
fn if_flag() {
    let yaml = indoc! {"
        a: !if(debug) 1
        b: !if(release) 2
        c: 3
    "};
    let field = DictField::new(IntField::new());
    let options = LoadOptions::default().with_config(FlagsConfig::new(["debug"]));
    let value = load_ok(yaml, &field, options);
    assert_eq!(value.to_string(), "{a: 1, c: 3}");

    let value = load_ok(yaml, &field, LoadOptions::default());
    assert_eq!(value.to_string(), "{c: 3}");
}

#[test]
fn if_flag_keeps_collections() {
    let options = LoadOptions::default().with_config(FlagsConfig::new(["on"]));
    let value = load_ok("!if(on) [1, 2]", &ListField::new(IntField::new()), options);
    assert_eq!(value, Value::from(vec![1i64, 2]));
}

#[test]
fn first_of() {
    let field = IntField::new();
    assert_eq!(load_ok("!first-of [!fail 1, 2, 3]", &field, LoadOptions::default()), Value::Int(2));

    let (value, errors) = check_load("!first-of [!fail 1, !fail 2]", &field, LoadOptions::default());
    assert_eq!(value, None);
    assert!(errors.is_empty());

    load_err("!first-of 1", &field, LoadOptions::default(), ErrorCode::UnexpectedNodeType);
}

#[test]
fn merge_dicts_and_lists() {
    let yaml = indoc! {"
        !merge
          - {a: 1, b: 2}
          - !fail {x: 0}
          - {b: 3, c: 4}
    "};
    let value = load_ok(yaml, &DictField::new(IntField::new()), LoadOptions::default());
    assert_eq!(value.to_string(), "{a: 1, b: 3, c: 4}");

    let value = load_ok("!merge [[1, 2], [3]]", &ListField::new(IntField::new()), LoadOptions::default());
    assert_eq!(value, Value::from(vec![1i64, 2, 3]));

    let (value, errors) = check_load("!merge [[1], {a: b}]", &AnyField::new(), LoadOptions::default());
    assert_eq!(errors.codes(), vec![ErrorCode::ValueError]);
    assert_eq!(value.map(|v| v.to_string()), Some("[1]".to_string()));

    load_err("!merge {a: 1}", &AnyField::new(), LoadOptions::default(), ErrorCode::UnexpectedNodeType);
}

#[test]
fn merge_with_import() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "defaults.yaml", "{host: localhost, port: 80}");
    let yaml = indoc! {"
        !merge
          - !import defaults.yaml
          - {port: 8080}
    "};
    let value = load_ok(yaml, &AnyField::new(), with_roots(&[dir.path()]));
    assert_eq!(value.to_string(), "{host: localhost, port: 8080}");
}

struct Constant(&'static str, &'static str);

impl TagHandler for Constant {
    fn matches(&self, tag: &str) -> bool {
        tag == self.0
    }

    fn load(&self, _ctx: &mut LoadingContext<'_>, _field: &dyn Field) -> LoadResult {
        Ok(Some(Value::from(self.1)))
    }
}

#[test]
fn ambiguous_tag_is_reported_once_and_first_handler_wins() {
    let options = LoadOptions::default()
        .with_tag_handler(Constant("dup", "first"))
        .with_tag_handler(Constant("dup", "second"));
    let (value, errors) = check_load("!dup x", &StringField::new(), options);
    assert_eq!(value, Some(Value::from("first")));
    assert_eq!(errors.codes(), vec![ErrorCode::MultipleMatchingHandlers]);
}

/// Rewrites `!upper text` into an uppercase scalar and loads it through the field.
struct Upper;

impl TagHandler for Upper {
    fn matches(&self, tag: &str) -> bool {
        tag == "upper"
    }

    fn load(&self, ctx: &mut LoadingContext<'_>, field: &dyn Field) -> LoadResult {
        if !ctx.expect_scalar()? {
            return Ok(None);
        }
        let Some(node) = ctx.current_node().cloned() else {
            return Ok(None);
        };
        let text = node.as_scalar().unwrap_or_default().to_uppercase();
        let rewritten = saphyr_marshal::Node::scalar(text).at(node.mark().clone());
        ctx.load(field, Rc::new(rewritten), None)
    }
}

#[test]
fn custom_handler_hands_back_to_the_field() {
    let options = LoadOptions::default().with_tag_handler(Upper);
    let value = load_ok("[!upper abc, def]", &ListField::new(StringField::new()), options);
    assert_eq!(value.to_string(), "[ABC, def]");

    let options = LoadOptions::default().with_tag_handler(Upper);
    let (_, errors) = check_load("!upper 0x1z", &IntField::new(), options);
    assert_eq!(errors.codes(), vec![ErrorCode::ValueError]);
}
