//! Post-scaffold coordination: runs the external generators that derive
//! deep-copy methods and CRD/RBAC manifests from the scaffolded API types.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{error, info};

use super::project::BOILERPLATE_PATH;
use crate::error::{FinalizeError, StepFailure};

/// Binary used when neither the environment nor `opforge.toml` names one.
pub const DEFAULT_CONTROLLER_GEN: &str = "controller-gen";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorStep {
    DeepCopy,
    Manifests,
}

impl GeneratorStep {
    pub fn name(&self) -> &'static str {
        match self {
            GeneratorStep::DeepCopy => "deep-copy",
            GeneratorStep::Manifests => "manifests",
        }
    }

    /// The make target that performs the same step in a scaffolded project.
    pub fn make_target(&self) -> &'static str {
        match self {
            GeneratorStep::DeepCopy => "make generate",
            GeneratorStep::Manifests => "make manifests",
        }
    }

    /// Arguments passed to controller-gen, run from the project root.
    ///
    /// Deep-copy output takes its header from `hack/boilerplate.go.txt` when
    /// the project has one, else from `boilerplate`.
    pub fn args(&self, root: &Path, boilerplate: Option<&Path>) -> Vec<String> {
        match self {
            GeneratorStep::DeepCopy => {
                let header = if root.join(BOILERPLATE_PATH).is_file() {
                    Some(BOILERPLATE_PATH.to_string())
                } else {
                    boilerplate.map(|p| absolute(p).display().to_string())
                };
                let object = match header {
                    Some(header) => format!("object:headerFile={header}"),
                    None => "object".to_string(),
                };
                vec![object, "paths=./...".to_string()]
            }
            GeneratorStep::Manifests => vec![
                "rbac:roleName=manager-role".to_string(),
                "crd".to_string(),
                "paths=./...".to_string(),
                "output:crd:artifacts:config=config/crd/bases".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeOptions {
    pub generate_deep_copy: bool,
    pub generate_manifests: bool,
    pub controller_gen: PathBuf,
    /// Header for deep-copy output when the project has no `hack/boilerplate.go.txt`.
    pub boilerplate: Option<PathBuf>,
}

impl Default for FinalizeOptions {
    fn default() -> Self {
        Self {
            generate_deep_copy: true,
            generate_manifests: true,
            controller_gen: PathBuf::from(DEFAULT_CONTROLLER_GEN),
            boilerplate: None,
        }
    }
}

/// Anchor a relative path at the process working directory. Generators run
/// with the project root as theirs.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// The binary to spawn. A bare program name is left for `PATH` lookup.
pub fn resolve_binary(binary: &Path) -> PathBuf {
    if binary.components().count() > 1 {
        absolute(binary)
    } else {
        binary.to_path_buf()
    }
}

/// Run every enabled generator step in `root`.
///
/// Steps are independent: a failing step does not stop later ones, and all
/// failures are reported together.
pub fn finalize(root: &Path, options: &FinalizeOptions) -> Result<(), FinalizeError> {
    let binary = resolve_binary(&options.controller_gen);
    let mut failures = Vec::new();
    for (step, enabled) in [
        (GeneratorStep::DeepCopy, options.generate_deep_copy),
        (GeneratorStep::Manifests, options.generate_manifests),
    ] {
        if !enabled {
            info!(
                step = step.name(),
                "step disabled; run `{}` in the project to perform it",
                step.make_target()
            );
            continue;
        }
        let args = step.args(root, options.boilerplate.as_deref());
        if let Err(failure) = run_step(root, &binary, step, &args) {
            error!(step = step.name(), status = ?failure.status, "post-scaffold step failed");
            failures.push(failure);
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(FinalizeError { failures })
    }
}

fn run_step(
    root: &Path,
    binary: &Path,
    step: GeneratorStep,
    args: &[String],
) -> Result<(), StepFailure> {
    info!(step = step.name(), binary = %binary.display(), args = ?args, "running generator");
    let output = Command::new(binary)
        .args(args)
        .current_dir(root)
        .output()
        .map_err(|e| StepFailure {
            step: step.name().to_string(),
            status: None,
            diagnostics: format!("{}: {e}", binary.display()),
        })?;
    if output.status.success() {
        return Ok(());
    }
    let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
    diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
    Err(StepFailure::exited(step.name(), output.status, diagnostics))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn stub(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("controller-gen");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn options(binary: PathBuf) -> FinalizeOptions {
        FinalizeOptions {
            controller_gen: binary,
            ..FinalizeOptions::default()
        }
    }

    #[test]
    fn test_successful_steps() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub(dir.path(), "echo \"$@\" >> calls.log\nexit 0");
        finalize(dir.path(), &options(bin)).unwrap();

        let calls = fs::read_to_string(dir.path().join("calls.log")).unwrap();
        let lines: Vec<_> = calls.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "object paths=./...");
        assert!(lines[1].starts_with("rbac:roleName=manager-role crd"));
    }

    #[test]
    fn test_header_file_passed_when_present() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("hack")).unwrap();
        fs::write(dir.path().join(BOILERPLATE_PATH), "/* header */\n").unwrap();
        let configured = Path::new("/etc/opforge/header.txt");
        assert_eq!(
            GeneratorStep::DeepCopy.args(dir.path(), Some(configured))[0],
            "object:headerFile=hack/boilerplate.go.txt"
        );
    }

    #[test]
    fn test_configured_boilerplate_reaches_deep_copy() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("header.txt");
        fs::write(&header, "// header\n").unwrap();
        let bin = stub(dir.path(), "echo \"$@\" >> calls.log\nexit 0");
        let opts = FinalizeOptions {
            generate_manifests: false,
            boilerplate: Some(header.clone()),
            ..options(bin)
        };
        finalize(dir.path(), &opts).unwrap();

        let calls = fs::read_to_string(dir.path().join("calls.log")).unwrap();
        assert_eq!(
            calls.trim_end(),
            format!("object:headerFile={} paths=./...", header.display())
        );
    }

    #[test]
    fn test_relative_binary_resolves_against_working_directory() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            resolve_binary(Path::new("bin/controller-gen")),
            cwd.join("bin/controller-gen")
        );
        assert_eq!(
            resolve_binary(Path::new("./controller-gen")),
            cwd.join("./controller-gen")
        );
        assert_eq!(
            resolve_binary(Path::new("controller-gen")),
            PathBuf::from("controller-gen")
        );
        assert_eq!(
            resolve_binary(Path::new("/opt/bin/controller-gen")),
            PathBuf::from("/opt/bin/controller-gen")
        );
    }

    #[test]
    fn test_relative_binary_runs_outside_the_project_root() {
        // the stub sits under the crate, not under the project root
        let cwd = std::env::current_dir().unwrap();
        let tools = tempfile::tempdir_in(&cwd).unwrap();
        let bin = stub(tools.path(), "exit 0");
        let relative = bin.strip_prefix(&cwd).unwrap().to_path_buf();

        let project = tempfile::tempdir().unwrap();
        finalize(project.path(), &options(relative)).unwrap();
    }

    #[test]
    fn test_every_step_runs_and_failures_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub(dir.path(), "echo \"failed: $1\" >&2\nexit 3");
        let err = finalize(dir.path(), &options(bin)).unwrap_err();

        assert_eq!(err.failures.len(), 2);
        assert_eq!(err.failures[0].step, "deep-copy");
        assert_eq!(err.failures[0].status, Some(3));
        assert!(err.failures[0].diagnostics.contains("failed: object"));
        assert_eq!(err.failures[1].step, "manifests");
        assert!(err.failures[1].diagnostics.contains("failed: rbac:roleName=manager-role"));
    }

    #[test]
    fn test_one_failing_step_does_not_hide_the_other() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub(
            dir.path(),
            "if [ \"$1\" = \"crd\" ] || [ \"$2\" = \"crd\" ]; then exit 1; fi\ntouch ran-$1\nexit 0",
        );
        let err = finalize(dir.path(), &options(bin)).unwrap_err();
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].step, "manifests");
        assert!(dir.path().join("ran-object").exists());
    }

    #[test]
    fn test_missing_binary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = finalize(
            dir.path(),
            &options(dir.path().join("no-such-controller-gen")),
        )
        .unwrap_err();
        assert_eq!(err.failures.len(), 2);
        assert!(err.failures.iter().all(|f| f.status.is_none()));
    }

    #[test]
    fn test_disabled_steps_do_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub(dir.path(), "exit 1");
        let opts = FinalizeOptions {
            generate_deep_copy: false,
            generate_manifests: false,
            ..options(bin)
        };
        finalize(dir.path(), &opts).unwrap();
    }
}
