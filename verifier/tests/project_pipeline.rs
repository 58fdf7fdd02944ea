//! End-to-end pipeline A tests driven through scripted process seams.
//!
//! These cover ordering, classification, short-circuiting and cleanup
//! without a Python interpreter.

use std::path::PathBuf;

use verifier::core::types::{FileReport, ProjectStatus};
use verifier::io::config::VerifierConfig;
use verifier::io::provision::StepKind;
use verifier::project::{ProjectRequest, run_project};
use verifier::test_support::{ScriptedImporter, ScriptedProvisioner, TestProject};

fn request(project: &TestProject, targets: &[&str]) -> ProjectRequest {
    ProjectRequest {
        project_root: project.path().to_path_buf(),
        env_path: project.path().join(".verify-venv"),
        target_files: targets.iter().map(PathBuf::from).collect(),
    }
}

fn parse_payload(out: &[u8]) -> Vec<FileReport> {
    let text = std::str::from_utf8(out).expect("utf8 payload");
    assert_eq!(text.lines().count(), 1, "payload must be a single line");
    serde_json::from_str(text.trim()).expect("json payload")
}

#[test]
fn mixed_project_yields_one_result_per_file_in_order() {
    let project = TestProject::new().expect("project");
    project.write("requirements.txt", "requests\n").expect("write");
    project.write("ok.py", "import json\n").expect("write");
    project.write("broken.py", "def f(:\n").expect("write");
    project.write("needs_numpy.py", "import numpy\n").expect("write");
    project.write("pkg/__init__.py", "value = undefined_name\n").expect("write");
    project.write("slow.py", "while True:\n    pass\n").expect("write");
    project.write("__init__.py", "").expect("write");

    let provisioner = ScriptedProvisioner::succeeding();
    let importer = ScriptedImporter::new(vec![
        Ok(ScriptedImporter::clean()),
        Ok(ScriptedImporter::missing("numpy")),
        Ok(ScriptedImporter::raising(
            "NameError: name 'undefined_name' is not defined",
        )),
        Ok(ScriptedImporter::timed_out()),
    ]);
    let req = request(
        &project,
        &[
            "ok.py",
            "broken.py",
            "needs_numpy.py",
            "pkg/__init__.py",
            "slow.py",
            "__init__.py",
        ],
    );
    let mut out = Vec::new();

    let reports = run_project(
        &req,
        &VerifierConfig::default(),
        &provisioner,
        &importer,
        &mut out,
    )
    .expect("run");

    let statuses: Vec<(String, ProjectStatus)> = reports
        .iter()
        .map(|report| (report.file.clone(), report.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("ok.py".to_string(), ProjectStatus::Success),
            ("broken.py".to_string(), ProjectStatus::SyntaxError),
            ("needs_numpy.py".to_string(), ProjectStatus::DependencyFailure),
            ("__init__.py".to_string(), ProjectStatus::RuntimeFailure),
            ("slow.py".to_string(), ProjectStatus::Failure),
            ("__init__.py".to_string(), ProjectStatus::Failure),
        ]
    );
    assert_eq!(
        importer.modules(),
        vec!["ok", "needs_numpy", "pkg", "slow"]
    );
    for report in &reports {
        assert_eq!(
            report.error.is_none(),
            report.status == ProjectStatus::Success,
            "{report:?}"
        );
    }
    assert!(
        reports[4]
            .error
            .as_deref()
            .is_some_and(|error| error.contains("15 seconds"))
    );
    assert!(
        reports[2]
            .error
            .as_deref()
            .is_some_and(|error| error.contains("ModuleNotFoundError"))
    );

    assert_eq!(parse_payload(&out), reports);
    assert!(!req.env_path.exists(), "environment must be removed");
    assert_eq!(
        provisioner.kinds(),
        vec![
            StepKind::CreateEnv,
            StepKind::UpgradeInstaller,
            StepKind::InstallDependencies
        ]
    );
}

#[test]
fn project_without_dependency_file_still_checks_files() {
    let project = TestProject::new().expect("project");
    project.write("main.py", "print('hi')\n").expect("write");

    let provisioner = ScriptedProvisioner::succeeding();
    let importer = ScriptedImporter::new(vec![Ok(ScriptedImporter::clean())]);
    let req = request(&project, &["main.py"]);
    let mut out = Vec::new();

    let reports = run_project(
        &req,
        &VerifierConfig::default(),
        &provisioner,
        &importer,
        &mut out,
    )
    .expect("run");

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, ProjectStatus::Success);
    assert_eq!(provisioner.kinds(), vec![StepKind::CreateEnv]);
    assert!(!req.env_path.exists());
}

#[test]
fn install_failure_aborts_before_any_file_and_cleans_up() {
    let project = TestProject::new().expect("project");
    project.write("requirements.txt", "missing-package\n").expect("write");
    project.write("main.py", "x = 1\n").expect("write");

    let provisioner = ScriptedProvisioner::new(vec![Some(0), Some(0), Some(2)]);
    let importer = ScriptedImporter::new(Vec::new());
    let req = request(&project, &["main.py"]);
    let mut out = Vec::new();

    let err = run_project(
        &req,
        &VerifierConfig::default(),
        &provisioner,
        &importer,
        &mut out,
    )
    .expect_err("install failure is fatal");

    let message = format!("{err:#}");
    assert!(message.contains("requirements.txt"), "{message}");
    assert!(message.contains("exit code: 2"), "{message}");
    assert!(out.is_empty(), "no payload on fatal failure");
    assert!(importer.modules().is_empty());
    assert!(!req.env_path.exists());
}

#[test]
fn manifest_install_runs_from_project_root() {
    let project = TestProject::new().expect("project");
    project
        .write("pyproject.toml", "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n")
        .expect("write");
    project.write("demo.py", "x = 1\n").expect("write");

    let provisioner = ScriptedProvisioner::succeeding();
    let importer = ScriptedImporter::new(vec![Ok(ScriptedImporter::clean())]);
    let req = request(&project, &["demo.py"]);
    let mut out = Vec::new();

    run_project(
        &req,
        &VerifierConfig::default(),
        &provisioner,
        &importer,
        &mut out,
    )
    .expect("run");

    let install = provisioner
        .steps()
        .into_iter()
        .find(|step| step.kind == StepKind::InstallDependencies)
        .expect("install step");
    assert_eq!(install.cwd.as_deref(), Some(project.path()));
    assert_eq!(install.args.last().map(|arg| arg.to_string_lossy().into_owned()), Some(".".to_string()));
}
