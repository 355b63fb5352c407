use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use mtgdb_release::config::PublishConfig;
use mtgdb_release::error::ProcessFailedDetails;
use mtgdb_release::pipeline::{run_release, StageStatus};
use mtgdb_release::shortcut::encode_lnk;
use mtgdb_release::stages::{AutoConfirm, Confirmation, StageId};
use mtgdb_release::{Error, Invocation, ProcessRunner, Result};
use tempfile::TempDir;

/// Records every invocation and fakes the files the real tools would write.
#[derive(Default)]
struct FakeTools {
    calls: RefCell<Vec<Invocation>>,
    fail_signer_with: Option<i32>,
}

impl FakeTools {
    fn failing_signer(status: i32) -> Self {
        Self {
            fail_signer_with: Some(status),
            ..Self::default()
        }
    }

    fn programs(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| format!("{} {}", c.program, c.args.first().cloned().unwrap_or_default()))
            .collect()
    }

    fn ran(&self, program: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.program == program)
    }
}

impl ProcessRunner for FakeTools {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        self.calls.borrow_mut().push(invocation.clone());
        let args = &invocation.args;

        if invocation.program == "mono" && args.get(1).map(String::as_str) == Some("-sign") {
            if let Some(status) = self.fail_signer_with {
                return Err(Error::process_failed(ProcessFailedDetails {
                    program: invocation.program.clone(),
                    args: args.clone(),
                    exit_code: status,
                }));
            }
            fs::write(&args[4], b"signed manifest").unwrap();
        }

        if invocation.program == "7z" {
            fs::write(&args[1], b"zip").unwrap();
        }
        Ok(())
    }

    fn launch(&self, invocation: &Invocation) -> Result<()> {
        self.calls.borrow_mut().push(invocation.clone());
        Ok(())
    }
}

struct Decline;

impl Confirmation for Decline {
    fn confirm(&self, _message: &str) -> Result<bool> {
        Ok(false)
    }
}

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A repository checkout with build output for version 2.0.0.1.
fn workspace() -> (TempDir, PublishConfig) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let repo = root.join("mtgdb");
    let out = repo.join("out");

    write(
        &repo.join("shared/SolutionInfo.cs"),
        b"using System.Reflection;\n[assembly: AssemblyVersion(\"2.0.0.1\")]\n[assembly: AssemblyFileVersion(\"2.0.0.1\")]\n",
    );
    write(&repo.join("LICENSE"), b"license");
    write(&out.join("start.sh"), b"#!/bin/sh\n");

    let mut template = b"LNK\x00".to_vec();
    template.extend(encode_lnk("v0.0.0.0"));
    write(&out.join("Mtgdb.Gui.lnk.template"), &template);

    write(&out.join("data/AllPrintings.json"), b"{}");
    write(&out.join("data/allSets-x.json"), b"{}");
    write(&out.join("data/index/deck/segments"), b"idx");
    write(&out.join("bin/release/Mtgdb.Gui.exe"), b"exe");
    write(&out.join("bin/release/Mtgdb.Gui.pdb"), b"pdb");
    write(&out.join("etc/config.xml"), b"<config/>");
    write(&out.join("images/icon.ico"), b"ico");
    write(&out.join("update/filelist.txt"), b"old");
    write(&out.join("color-schemes/dark.colors"), b"dark");
    write(&out.join("charts/default.chart"), b"chart");

    let mut config = PublishConfig::default();
    config.origin = repo;
    config.packaged_root = root.join("packaged");
    config.channels.test = root.join("shared/app/test");
    config.channels.production = root.join("shared/app/release");
    config.channels.light = root.join("shared/app/deflate");
    (dir, config)
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn signer_failure_aborts_with_its_exit_status() {
    let (_dir, config) = workspace();
    let tools = FakeTools::failing_signer(2);

    let err = run_release(&config, &tools, &AutoConfirm).unwrap_err();

    assert_eq!(err.code.as_str(), "process.failed");
    assert_eq!(err.exit_code(), 2);
    assert_eq!(err.details["stage"], "sign_binaries");

    assert!(!tools.ran("7z"), "no packaging after failed signing");
    assert!(!tools.ran("git"), "no notification after failed signing");
    assert_eq!(tools.calls.borrow().len(), 2);
    assert!(!config.channels.test.exists());
    assert!(!config.channels.production.exists());

    let statuses: Vec<String> = err.details["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["status"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(statuses.iter().filter(|s| *s == "not_run").count(), 11);
}

#[test]
fn full_release_names_artifacts_after_version() {
    let (dir, config) = workspace();
    let tools = FakeTools::default();

    let result = run_release(&config, &tools, &AutoConfirm).unwrap();

    assert_eq!(result.version, "2.0.0.1");
    assert_eq!(result.package_name, "Mtgdb.Gui.v2.0.0.1");
    assert_eq!(result.summary.failed, 0);
    assert_eq!(result.summary.not_run, 0);

    let version_root = dir.path().join("packaged/2.0.0.1");
    let target = version_root.join("Mtgdb.Gui.v2.0.0.1");
    assert!(version_root.join("Mtgdb.Gui.v2.0.0.1.zip").exists());
    assert!(target.join("bin/v2.0.0.1/Mtgdb.Gui.exe").exists());
    assert!(!target.join("bin/v2.0.0.1/Mtgdb.Gui.pdb").exists());
    assert!(!target.join("data/allSets-x.json").exists());
    assert!(!target.join("data/index/deck").exists());
    assert_eq!(
        fs::read_to_string(target.join("update/version.txt")).unwrap(),
        "Mtgdb.Gui.v2.0.0.1.zip"
    );

    let mut shortcut = b"LNK\x00".to_vec();
    shortcut.extend(encode_lnk("v2.0.0.1"));
    assert_eq!(fs::read(target.join("Mtgdb.Gui.lnk")).unwrap(), shortcut);
}

#[test]
fn full_release_runs_tools_in_order() {
    let (_dir, config) = workspace();
    let tools = FakeTools::default();

    let result = run_release(&config, &tools, &AutoConfirm).unwrap();

    let skipped: Vec<StageId> = result
        .stages
        .iter()
        .filter(|s| s.status == StageStatus::Skipped)
        .map(|s| s.id)
        .collect();
    assert_eq!(skipped, vec![StageId::LaunchInstalledApp, StageId::RunTests]);

    let programs = tools.programs();
    assert_eq!(programs[0].split(' ').next(), Some("msbuild"));
    let expected_tail = ["mono", "7z", "mono", "git", "mono", "git", "git", "git", "7z"];
    let actual_tail: Vec<&str> = programs[1..]
        .iter()
        .map(|p| p.split(' ').next().unwrap())
        .collect();
    assert_eq!(actual_tail, expected_tail);
}

#[test]
fn stale_channel_archives_are_replaced() {
    let (_dir, config) = workspace();
    for stale in ["Mtgdb.Gui.v1.9.0.0.zip", "Mtgdb.Gui.v1.9.1.0.zip", "Mtgdb.Gui.v1.9.2.0.zip"] {
        write(&config.channels.test.join(stale), b"old");
        write(&config.channels.production.join(stale), b"old");
    }
    write(&config.channels.light.join("Mtgdb.Gui.old.zip"), b"old");

    run_release(&config, &FakeTools::default(), &AutoConfirm).unwrap();

    let expected = vec!["Mtgdb.Gui.v2.0.0.1.zip".to_string(), "filelist.txt".to_string()];
    assert_eq!(file_names(&config.channels.test), expected);
    assert_eq!(file_names(&config.channels.production), expected);
    assert_eq!(file_names(&config.channels.light), vec!["Mtgdb.Gui.zip".to_string()]);
}

#[test]
fn declined_confirmation_keeps_production_untouched() {
    let (_dir, config) = workspace();
    let tools = FakeTools::default();

    let err = run_release(&config, &tools, &Decline).unwrap_err();

    assert_eq!(err.code.as_str(), "operator.cancelled");
    assert_eq!(err.exit_code(), 130);
    assert!(config.channels.test.join("Mtgdb.Gui.v2.0.0.1.zip").exists());
    assert!(!config.channels.production.exists());
    assert!(!tools.ran("git"));
}

#[test]
fn missing_version_line_fails_before_any_tool_runs() {
    let (_dir, config) = workspace();
    fs::write(
        config.origin.join("shared/SolutionInfo.cs"),
        "[assembly: AssemblyTitle(\"Mtgdb\")]\n",
    )
    .unwrap();
    let tools = FakeTools::default();

    let err = run_release(&config, &tools, &AutoConfirm).unwrap_err();

    assert_eq!(err.code.as_str(), "version.not_found");
    assert_eq!(err.exit_code(), 3);
    assert!(tools.calls.borrow().is_empty());
    assert!(!PathBuf::from(&config.packaged_root).exists());
}
