// tests/config_loading.rs

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use adwatch::cli::CliArgs;
use adwatch::config::{load_and_validate, load_for_cli};
use adwatch::types::IdentityMode;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn full_config_file_is_loaded_and_state_paths_anchored() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Adwatch.toml");
    fs::write(
        &path,
        r#"
[watch]
roots = ["/recordings/hd", "/recordings/sd"]
pattern = "*.mpg"
stability_wait_secs = 30
identity = "file_name"

[tool]
path = "/usr/local/bin/comskip"
args = ["--ts"]
output_dir = "/videos"
side_file_extensions = ["edl"]

[state]
dir = "state"
done = "/var/lib/adwatch/done.txt"
"#,
    )?;

    let cfg = load_and_validate(&path)?;

    assert_eq!(
        cfg.watch.roots,
        vec![PathBuf::from("/recordings/hd"), PathBuf::from("/recordings/sd")]
    );
    assert_eq!(cfg.watch.pattern, "*.mpg");
    assert_eq!(cfg.stability_wait().as_secs(), 30);
    assert_eq!(cfg.watch.identity, IdentityMode::FileName);
    assert_eq!(cfg.tool.path, PathBuf::from("/usr/local/bin/comskip"));
    assert_eq!(cfg.tool.args, vec!["--ts"]);
    assert_eq!(cfg.tool.side_file_extensions, vec!["edl"]);
    assert_eq!(cfg.tool.benign_marker, "Commercials were not found");

    let state_dir = dir.path().join("state");
    assert_eq!(cfg.state.dir, state_dir);
    assert_eq!(cfg.state.ignored, state_dir.join("ignore_list.txt"));
    assert_eq!(cfg.state.in_flight, state_dir.join("processing.txt"));
    assert_eq!(cfg.state.done, PathBuf::from("/var/lib/adwatch/done.txt"));
    assert_eq!(cfg.state.lock, state_dir.join("adwatch.lock"));
    assert!(!cfg.state.reclaim_stale_in_flight);

    Ok(())
}

#[test]
fn cli_flags_override_the_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("adwatch.toml");
    fs::write(
        &path,
        r#"
[watch]
roots = ["/from/file"]
stability_wait_secs = 30

[tool]
output_dir = "/file/videos"
"#,
    )?;

    let args = CliArgs {
        config: Some(path),
        input_roots: vec![PathBuf::from("/cli/a"), PathBuf::from("/cli/b")],
        output_dir: Some(PathBuf::from("/cli/videos")),
        tool: Some(PathBuf::from("/opt/comskip")),
        size_check_seconds: Some(0),
        no_delete_extras: true,
        ..CliArgs::default()
    };
    let cfg = load_for_cli(&args)?;

    assert_eq!(cfg.watch.roots, vec![PathBuf::from("/cli/a"), PathBuf::from("/cli/b")]);
    assert_eq!(cfg.tool.output_dir, PathBuf::from("/cli/videos"));
    assert_eq!(cfg.tool.path, PathBuf::from("/opt/comskip"));
    assert_eq!(cfg.stability_wait().as_secs(), 0);
    assert!(!cfg.tool.delete_side_files);
    assert_eq!(cfg.state.done, dir.path().join("processed.txt"));

    Ok(())
}

#[test]
fn file_values_survive_when_no_flag_is_given() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("adwatch.toml");
    fs::write(
        &path,
        "[watch]\nroots = [\"/rec\"]\n\n[tool]\noutput_dir = \"/videos\"\ndelete_side_files = false\n",
    )?;

    let args = CliArgs {
        config: Some(path),
        ..CliArgs::default()
    };
    let cfg = load_for_cli(&args)?;

    assert_eq!(cfg.watch.roots, vec![PathBuf::from("/rec")]);
    assert_eq!(cfg.stability_wait().as_secs(), 5);
    assert!(!cfg.tool.delete_side_files);
    Ok(())
}
