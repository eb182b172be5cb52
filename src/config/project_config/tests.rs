use super::*;

#[test]
fn test_default_profile_matches_go_conventions() {
    let profile = Profile::default();
    assert!(profile.is_skipped_dir("vendor"));
    assert!(profile.is_skipped_dir("Godeps"));
    assert!(!profile.is_skipped_dir("src"));
    assert!(profile.has_skipped_suffix("api.pb.go"));
    assert!(profile.has_skipped_suffix("assets_bindata.go"));
    assert!(!profile.has_skipped_suffix("main.go"));
    assert!(profile.has_extension(Path::new("pkg/main.go")));
    assert!(!profile.has_extension(Path::new("pkg/main.rs")));
    assert!(!profile.has_extension(Path::new("Makefile")));
}

#[test]
fn test_skip_dir_args() {
    let profile = Profile::default();
    assert_eq!(
        profile.skip_dir_args(),
        vec!["--skip=Godeps", "--skip=vendor", "--skip=third_party"]
    );

    let no_flag = Profile {
        skip_dir_flag: String::new(),
        ..Profile::default()
    };
    assert!(no_flag.skip_dir_args().is_empty());
}

#[test]
fn test_exclude_args_only_with_flag() {
    let skipped = vec![std::path::PathBuf::from("a/gen.pb.go")];
    let mut spec = CheckSpec::command("lint", "", &["lint"], 1.0);
    assert!(spec.exclude_args(&skipped).is_empty());

    spec.exclude_flag = Some("--exclude={}".to_string());
    assert_eq!(spec.exclude_args(&skipped), vec!["--exclude=a/gen.pb.go"]);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config: ProjectConfig = toml::from_str(
        r#"
        [profile]
        skip_dirs = ["vendor"]

        [[checks]]
        name = "vet"
        command = ["go", "vet"]
        "#,
    )
    .unwrap();

    assert_eq!(config.profile.skip_dirs, vec!["vendor"]);
    assert_eq!(config.profile.extensions, vec!["go"]);
    assert_eq!(config.layout, LayoutConfig::default());
    assert_eq!(config.checks.len(), 1);
    assert_eq!(config.checks[0].weight, 1.0);
    assert_eq!(config.checks[0].findings_exit_code, 1);
    assert_eq!(config.checks[0].kind, CheckKind::Command);
    assert!(config.validate().is_ok());
}

#[test]
fn test_native_format_kind_parses() {
    let config: ProjectConfig = toml::from_str(
        r#"
        [[checks]]
        name = "fmt"
        kind = "native-format"
        weight = 0.5
        "#,
    )
    .unwrap();
    assert_eq!(config.checks[0].kind, CheckKind::NativeFormat);
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_bad_checks() {
    let mut config = ProjectConfig::default();
    config.checks.push(CheckSpec::command("empty", "", &[], 1.0));
    assert!(matches!(config.validate(), Err(CheckError::Config(_))));

    let mut config = ProjectConfig::default();
    config.checks.push(config.checks[1].clone());
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("defined twice"));

    let mut config = ProjectConfig::default();
    config.checks[0].weight = -1.0;
    assert!(config.validate().is_err());

    let mut config = ProjectConfig::default();
    config.profile.skip_dir_flag = "--skip".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_retain_checks() {
    let mut config = ProjectConfig::default();
    config
        .retain_checks(&["golint".to_string(), "gofmt".to_string()])
        .unwrap();
    let names: Vec<&str> = config.checks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["gofmt", "golint"]);

    let err = config.retain_checks(&["nope".to_string()]).unwrap_err();
    assert!(err.to_string().contains("unknown check 'nope'"));
}

#[test]
fn test_toml_round_trip_of_defaults() {
    let rendered = ProjectConfig::default().to_toml().unwrap();
    let parsed: ProjectConfig = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed, ProjectConfig::default());
}

#[test]
fn test_load_project_config_prefers_toml_then_json() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(load_project_config(dir.path()), ProjectConfig::default());

    std::fs::write(
        dir.path().join(".codegraderc.json"),
        r#"{"checks": [{"name": "json-check", "command": ["true"]}]}"#,
    )
    .unwrap();
    assert_eq!(load_project_config(dir.path()).checks[0].name, "json-check");

    std::fs::write(
        dir.path().join("codegrade.toml"),
        "[[checks]]\nname = \"toml-check\"\ncommand = [\"true\"]\n",
    )
    .unwrap();
    assert_eq!(load_project_config(dir.path()).checks[0].name, "toml-check");
}

#[test]
fn test_invalid_project_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("codegrade.toml"), "checks = 5").unwrap();
    assert_eq!(load_project_config(dir.path()), ProjectConfig::default());
}

#[test]
fn test_load_config_file_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[[checks]]\nname = \"\"\ncommand = [\"x\"]\n").unwrap();
    assert!(load_config_file(&path).is_err());
    assert!(load_config_file(&dir.path().join("missing.toml")).is_err());
}
