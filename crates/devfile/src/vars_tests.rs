// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[yare::parameterized(
    simple      = { "echo {{GREETING}}", "echo hello" },
    spaced      = { "echo {{ GREETING }}", "echo hello" },
    repeated    = { "{{GREETING}}-{{GREETING}}", "hello-hello" },
    no_refs     = { "npm start", "npm start" },
    single_brace = { "echo {GREETING}", "echo {GREETING}" },
)]
fn substitutes_known(template: &str, expected: &str) {
    let mut missing = BTreeSet::new();
    let out = substitute(template, &vars(&[("GREETING", "hello")]), &mut missing);
    assert_eq!(out, expected);
    assert!(missing.is_empty());
}

#[test]
fn unknown_keys_are_collected_and_left_in_place() {
    let mut missing = BTreeSet::new();
    let out = substitute("run {{B}} {{A}} {{B}}", &IndexMap::new(), &mut missing);
    assert_eq!(out, "run {{B}} {{A}} {{B}}");
    assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
}

#[yare::parameterized(
    plain       = { "KEY=value", "KEY", "value" },
    equals_in_v = { "URL=a=b", "URL", "a=b" },
    empty_value = { "KEY=", "KEY", "" },
)]
fn var_flag_parses(flag: &str, key: &str, value: &str) {
    assert_eq!(parse_var_flag(flag).unwrap(), (key.to_string(), value.to_string()));
}

#[yare::parameterized(
    no_equals = { "KEY" },
    no_key    = { "=value" },
)]
fn var_flag_rejects(flag: &str) {
    assert!(matches!(parse_var_flag(flag), Err(DevfileError::InvalidVarFlag(_))));
}

#[test]
fn var_file_skips_comments_and_blanks() {
    let parsed = parse_var_file("# settings\n\nA=1\n  B = two\n").unwrap();
    assert_eq!(parsed, vars(&[("A", "1"), ("B", " two")]));
}

#[test]
fn flags_override_var_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vars.env");
    std::fs::write(&path, "PORT=3000\nMODE=prod\n").unwrap();

    let overrides =
        VarOverrides::from_sources(Some(&path), &["MODE=dev".to_string()]).unwrap();
    let mut merged = vars(&[("PORT", "8080"), ("NAME", "app")]);
    overrides.apply_to(&mut merged);

    assert_eq!(merged, vars(&[("PORT", "3000"), ("NAME", "app"), ("MODE", "dev")]));
}

#[test]
fn substitute_value_walks_nested_yaml() {
    let mut value: serde_yaml::Value =
        serde_yaml::from_str("a: [\"{{X}}\", 3]\nb: {c: \"x-{{X}}\"}\n").unwrap();
    let mut missing = BTreeSet::new();
    substitute_value(&mut value, &vars(&[("X", "1")]), &mut missing);
    assert_eq!(value["a"][0], serde_yaml::Value::String("1".to_string()));
    assert_eq!(value["b"]["c"], serde_yaml::Value::String("x-1".to_string()));
}
