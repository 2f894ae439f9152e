#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

pub mod workspace {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Scratch directory holding workload documents and an `out/` project root.
    pub struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        pub fn new() -> Self {
            Self {
                dir: tempfile::tempdir().expect("create temp dir"),
            }
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }

        /// Project root the tests scaffold into.
        pub fn out(&self) -> PathBuf {
            self.dir.path().join("out")
        }

        /// Write `content` to `rel`, creating parent directories.
        pub fn write(&self, rel: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            path
        }

        pub fn read_out(&self, rel: &str) -> String {
            fs::read_to_string(self.out().join(rel))
                .unwrap_or_else(|e| panic!("read {rel}: {e}"))
        }
    }
}

#[cfg(unix)]
pub mod controller_gen {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Executable shell script standing in for controller-gen.
    pub fn stub(dir: &Path, body: &str) -> PathBuf {
        let bin = dir.join("bin");
        fs::create_dir_all(&bin).unwrap();
        let path = bin.join("controller-gen");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// Stub that appends its arguments to `controller-gen.log` in the working directory.
    pub fn recording(dir: &Path) -> PathBuf {
        stub(dir, "echo \"$@\" >> controller-gen.log\nexit 0")
    }
}

/// A collection whose root depends on an inline component.
pub const WIDGET_COLLECTION: &str = r#"
apiVersion: opforge.dev/v1alpha1
kind: WorkloadCollection
name: widget
spec:
  repository: github.com/acme/widget-operator
  domain: acme.io
  api: { group: apps, version: v1, kind: Widget }
  fields:
    - { name: replicas, type: int, default: 2, description: Desired replicas. }
  dependencies:
    - { name: gadget }
  components:
    - apiVersion: opforge.dev/v1alpha1
      kind: ComponentWorkload
      name: gadget
      spec:
        api: { kind: Gadget }
"#;
