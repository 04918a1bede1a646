//! Volume-mount specification parsing, validation, and post-start
//! verification.
//!
//! Parsing and host-path validation run before any runtime call; mount
//! verification runs after the container is up, against the mount table the
//! runtime itself reports.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use dbrig_common::error::{DbrigError, Result};

use crate::plane::ContainerReport;

/// Access mode of a mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountMode {
    /// Read-write; the default.
    #[default]
    Rw,
    /// Read-only.
    Ro,
}

impl fmt::Display for MountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rw => write!(f, "rw"),
            Self::Ro => write!(f, "ro"),
        }
    }
}

/// Parsed form of one `host:container[:mode]` volume string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    /// Host-side path; must exist at validation time.
    pub host_path: PathBuf,
    /// Container-side path.
    pub container_path: String,
    /// Access mode; defaults to read-write.
    pub mode: MountMode,
}

impl VolumeMount {
    /// Parses one raw volume string.
    ///
    /// Grammar: `host:container` or `host:container:mode` where mode is
    /// `rw` or `ro`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for fewer than two parts, empty
    /// parts, or an unknown mode.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(DbrigError::config(format!(
                "volume '{raw}' must be host:container or host:container:mode"
            )));
        }
        let (host, container) = (parts[0], parts[1]);
        if host.is_empty() || container.is_empty() {
            return Err(DbrigError::config(format!(
                "volume '{raw}' has an empty host or container path"
            )));
        }
        let mode = match parts.get(2) {
            None => MountMode::Rw,
            Some(&"rw") => MountMode::Rw,
            Some(&"ro") => MountMode::Ro,
            Some(other) => {
                return Err(DbrigError::config(format!(
                    "volume '{raw}' has unknown mode '{other}' (expected rw or ro)"
                )));
            }
        };
        Ok(Self {
            host_path: PathBuf::from(host),
            container_path: container.to_string(),
            mode,
        })
    }
}

impl FromStr for VolumeMount {
    type Err = DbrigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for VolumeMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.host_path.display(),
            self.container_path,
            self.mode
        )
    }
}

/// Parses every raw volume string of a descriptor.
///
/// # Errors
///
/// Returns the first parse failure encountered.
pub fn parse_all(raws: &[String]) -> Result<Vec<VolumeMount>> {
    raws.iter().map(|raw| VolumeMount::parse(raw)).collect()
}

/// Fail-fast gate run before any runtime call: returns one human-readable
/// error per mount whose host path does not exist. An empty list means all
/// mounts are valid.
#[must_use]
pub fn validate_all(specs: &[VolumeMount]) -> Vec<String> {
    specs
        .iter()
        .filter(|spec| !spec.host_path.exists())
        .map(|spec| {
            format!(
                "host path '{}' for container path '{}' does not exist",
                spec.host_path.display(),
                spec.container_path
            )
        })
        .collect()
}

/// Confirms every declared mount appears in the runtime's reported mount
/// table with the right destination and access mode.
///
/// Host paths are canonicalized on both sides before comparison because the
/// runtime reports resolved paths. Returns `false` on any mismatch; the
/// caller decides whether that is fatal.
#[must_use]
pub fn verify_mounted(report: &ContainerReport, specs: &[VolumeMount]) -> bool {
    specs.iter().all(|spec| {
        let found = report.mounts.iter().any(|record| {
            paths_match(&spec.host_path, &record.source)
                && record.destination == spec.container_path
                && record.read_write == matches!(spec.mode, MountMode::Rw)
        });
        if !found {
            tracing::warn!(
                container = %report.name,
                mount = %spec,
                "declared mount missing from runtime mount table"
            );
        }
        found
    })
}

/// Compares two host paths, resolving symlinks where possible.
fn paths_match(declared: &Path, reported: &Path) -> bool {
    let declared = declared.canonicalize().unwrap_or_else(|_| declared.to_path_buf());
    let reported = reported.canonicalize().unwrap_or_else(|_| reported.to_path_buf());
    declared == reported
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use dbrig_common::types::ContainerStatus;

    use super::*;
    use crate::plane::MountRecord;

    fn report_with_mounts(mounts: Vec<MountRecord>) -> ContainerReport {
        ContainerReport {
            name: "db".into(),
            image: "postgres:16".into(),
            status: ContainerStatus::Running,
            labels: BTreeMap::new(),
            mounts,
            created_at: None,
        }
    }

    #[test]
    fn parse_defaults_to_read_write() {
        let mount = VolumeMount::parse("/data/pg:/var/lib/postgresql/data").expect("valid");
        assert_eq!(mount.host_path, PathBuf::from("/data/pg"));
        assert_eq!(mount.container_path, "/var/lib/postgresql/data");
        assert_eq!(mount.mode, MountMode::Rw);
    }

    #[test]
    fn parse_accepts_explicit_modes() {
        let ro = VolumeMount::parse("/seed:/docker-entrypoint-initdb.d:ro").expect("valid");
        assert_eq!(ro.mode, MountMode::Ro);
        let rw = VolumeMount::parse("/data:/var/lib/data:rw").expect("valid");
        assert_eq!(rw.mode, MountMode::Rw);
    }

    #[test]
    fn parse_format_roundtrip() {
        for raw in [
            "/data/pg:/var/lib/postgresql/data:rw",
            "/seed:/init:ro",
            "/a:/b:rw",
        ] {
            let mount = VolumeMount::parse(raw).expect("valid");
            assert_eq!(VolumeMount::parse(&mount.to_string()).expect("valid"), mount);
        }
    }

    #[test]
    fn parse_rejects_missing_container_path() {
        assert!(VolumeMount::parse("/data").is_err());
        assert!(VolumeMount::parse("/data:").is_err());
        assert!(VolumeMount::parse(":/data").is_err());
    }

    #[test]
    fn parse_rejects_unknown_mode() {
        let err = VolumeMount::parse("/data:/x:rwx").expect_err("invalid mode");
        assert!(err.to_string().contains("rwx"));
    }

    #[test]
    fn parse_rejects_too_many_parts() {
        assert!(VolumeMount::parse("/a:/b:ro:extra").is_err());
    }

    #[test]
    fn validate_all_reports_missing_host_path() {
        let specs =
            vec![VolumeMount::parse("/definitely/not/a/real/path/for/dbrig:/x").expect("parses")];
        let errors = validate_all(&specs);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("/definitely/not/a/real/path/for/dbrig"));
    }

    #[test]
    fn validate_all_passes_existing_host_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = format!("{}:/x:ro", dir.path().display());
        let specs = vec![VolumeMount::parse(&raw).expect("parses")];
        assert!(validate_all(&specs).is_empty());
    }

    #[test]
    fn verify_mounted_matches_full_triple() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = format!("{}:/var/lib/data", dir.path().display());
        let specs = vec![VolumeMount::parse(&raw).expect("parses")];
        let report = report_with_mounts(vec![MountRecord {
            source: dir.path().to_path_buf(),
            destination: "/var/lib/data".into(),
            read_write: true,
        }]);
        assert!(verify_mounted(&report, &specs));
    }

    #[test]
    fn verify_mounted_fails_on_wrong_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = format!("{}:/var/lib/data:ro", dir.path().display());
        let specs = vec![VolumeMount::parse(&raw).expect("parses")];
        let report = report_with_mounts(vec![MountRecord {
            source: dir.path().to_path_buf(),
            destination: "/var/lib/data".into(),
            read_write: true,
        }]);
        assert!(!verify_mounted(&report, &specs));
    }

    #[test]
    fn verify_mounted_fails_on_absent_mount() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = format!("{}:/var/lib/data", dir.path().display());
        let specs = vec![VolumeMount::parse(&raw).expect("parses")];
        let report = report_with_mounts(vec![]);
        assert!(!verify_mounted(&report, &specs));
    }
}
