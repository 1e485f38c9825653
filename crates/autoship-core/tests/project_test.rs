use autoship_core::project::{is_build_file_name, is_node_manifest_name, project_name};
use autoship_core::{Error, ImageReference, MemoryLog, ProjectType, scan, walk_files};
use proptest::prelude::*;
use tempfile::TempDir;

#[test]
fn detects_nodejs_project() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("package.json"), "{}").unwrap();
    std::fs::write(tmp.path().join("index.js"), "").unwrap();

    let log = MemoryLog::new();
    let project = scan(tmp.path(), &log).unwrap();

    assert_eq!(project.project_type, ProjectType::NodeJs);
    assert!(project.has_manifest);
    assert!(!project.has_existing_build_file);
    assert_eq!(
        project.manifest_path.as_deref(),
        Some(tmp.path().join("package.json").as_path())
    );
    assert!(project.require_known().is_ok());
}

#[test]
fn unknown_without_package_json() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Cargo.toml"), "[package]").unwrap();
    std::fs::write(tmp.path().join("requirements.txt"), "flask").unwrap();

    let project = scan(tmp.path(), &MemoryLog::new()).unwrap();

    assert_eq!(project.project_type, ProjectType::Unknown);
    assert!(!project.has_manifest);
    assert!(matches!(
        project.require_known(),
        Err(Error::UnknownProjectType(_))
    ));
}

#[test]
fn manifest_match_is_case_sensitive() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("PACKAGE.JSON"), "{}").unwrap();

    let project = scan(tmp.path(), &MemoryLog::new()).unwrap();

    assert_eq!(project.project_type, ProjectType::Unknown);
}

#[test]
fn detects_nested_build_file_case_insensitively() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("docker")).unwrap();
    std::fs::write(tmp.path().join("docker/api.DockerFile"), "FROM node").unwrap();
    std::fs::write(tmp.path().join("package.json"), "{}").unwrap();

    let project = scan(tmp.path(), &MemoryLog::new()).unwrap();

    assert!(project.has_existing_build_file);
}

#[test]
fn prefers_root_manifest_over_nested_ones() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("node_modules/express")).unwrap();
    std::fs::write(tmp.path().join("node_modules/express/package.json"), "{}").unwrap();
    std::fs::write(tmp.path().join("package.json"), "{}").unwrap();

    let project = scan(tmp.path(), &MemoryLog::new()).unwrap();

    assert_eq!(
        project.manifest_path.as_deref(),
        Some(tmp.path().join("package.json").as_path())
    );
}

#[test]
fn records_every_discovered_file() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("src")).unwrap();
    std::fs::write(tmp.path().join("package.json"), "{}").unwrap();
    std::fs::write(tmp.path().join("src/app.js"), "").unwrap();

    let log = MemoryLog::new();
    scan(tmp.path(), &log).unwrap();

    assert!(log.contains("package.json"));
    assert!(log.contains("app.js"));
    assert!(log.contains("project type: nodejs"));
}

#[test]
fn fails_on_file_path() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("package.json");
    std::fs::write(&file, "{}").unwrap();

    let result = scan(&file, &MemoryLog::new());
    assert!(matches!(result, Err(Error::NotADirectory(_))));
}

#[test]
fn fails_on_missing_path() {
    let tmp = TempDir::new().unwrap();

    let result = scan(&tmp.path().join("nope"), &MemoryLog::new());
    let err = result.unwrap_err().to_string();
    assert!(err.contains("is not a directory"));
}

#[test]
fn walk_is_depth_first_in_name_order() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("b")).unwrap();
    std::fs::write(tmp.path().join("a.txt"), "").unwrap();
    std::fs::write(tmp.path().join("b/inner.txt"), "").unwrap();
    std::fs::write(tmp.path().join("c.txt"), "").unwrap();

    let files = walk_files(tmp.path()).unwrap();
    let relative: Vec<_> = files
        .iter()
        .map(|f| f.strip_prefix(tmp.path()).unwrap().to_path_buf())
        .collect();

    assert_eq!(
        relative,
        vec![
            std::path::PathBuf::from("a.txt"),
            std::path::PathBuf::from("b/inner.txt"),
            std::path::PathBuf::from("c.txt"),
        ]
    );
}

#[cfg(unix)]
#[test]
fn follows_symlinked_directories() {
    let target = TempDir::new().unwrap();
    std::fs::write(target.path().join("package.json"), "{}").unwrap();
    let project = TempDir::new().unwrap();
    std::os::unix::fs::symlink(target.path(), project.path().join("app")).unwrap();

    let descriptor = scan(project.path(), &MemoryLog::new()).unwrap();

    assert_eq!(descriptor.project_type, ProjectType::NodeJs);
    assert!(descriptor.has_manifest);
    assert_eq!(
        descriptor.manifest_path,
        Some(project.path().join("app/package.json"))
    );
}

#[cfg(unix)]
#[test]
fn symlink_loop_does_not_hang_the_walk() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("src")).unwrap();
    std::fs::write(tmp.path().join("src/index.js"), "").unwrap();
    std::os::unix::fs::symlink(tmp.path(), tmp.path().join("src/root")).unwrap();

    let files = walk_files(tmp.path()).unwrap();

    assert_eq!(files, vec![tmp.path().join("src/index.js")]);
}

#[cfg(unix)]
#[test]
fn dangling_symlink_is_skipped() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("package.json"), "{}").unwrap();
    std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("link")).unwrap();

    let files = walk_files(tmp.path()).unwrap();

    assert_eq!(files, vec![tmp.path().join("package.json")]);
}

#[test]
fn project_name_uses_directory_name() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("demo");
    std::fs::create_dir(&dir).unwrap();

    assert_eq!(project_name(&dir), "demo");
}

#[test]
fn image_reference_formats() {
    let image = ImageReference::new("web", "v2");

    assert_eq!(image.to_string(), "web:v2");
    assert_eq!(image.latest(), "web:latest");
}

proptest! {
    #[test]
    fn dockerfile_suffix_matches_any_case(prefix in "[a-z._-]{0,8}", mask in proptest::collection::vec(any::<bool>(), 10)) {
        let suffix: String = "dockerfile"
            .chars()
            .zip(mask.iter())
            .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
            .collect();
        let name = format!("{prefix}{suffix}");
        prop_assert!(is_build_file_name(&name));
    }

    #[test]
    fn names_without_manifest_suffix_are_not_manifests(name in "[a-zA-Z0-9._-]{0,20}") {
        prop_assume!(!name.ends_with("package.json"));
        prop_assert!(!is_node_manifest_name(&name));
    }
}
