//! Shell-script stand-ins for the docker binary.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Write an executable `docker` script into `dir` and return its path.
pub(crate) fn stub_docker(dir: &Path, script: &str) -> String {
    let path = dir.join("docker");
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().to_string()
}
