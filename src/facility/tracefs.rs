/*!
 * TraceFS Facility
 * Control-file access backed by a mounted tracefs
 */

use super::traits::TraceFacility;
use crate::core::config::{ENV_ANNOTATION_FLAGS, ENV_TRACEFS_ROOT};
use crate::core::errors::{FacilityError, FacilityResult};
use crate::core::limits::{ATRACE_BINARY, TRACEFS_MOUNT_CANDIDATES, TRACING_ON};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Struct representing a mounted trace file system
#[derive(Debug, Clone)]
pub struct TraceFs {
    root: PathBuf,
    atrace: Option<PathBuf>,
    annotation_flags: Option<PathBuf>,
}

impl TraceFs {
    /// Opens the trace file system
    ///
    /// `TRACEMUX_TRACEFS_ROOT` wins when set, then the first `tracefs` entry of
    /// `/proc/mounts`, then the well-known mount points. The system atrace
    /// helper is picked up when installed.
    ///
    /// Contention with other annotation agents is only detected when a tag
    /// mask file is known: either `TRACEMUX_ANNOTATION_FLAGS` names one, or
    /// the caller chains [`with_annotation_flags`](Self::with_annotation_flags).
    /// Without it [`is_external_agent_active`](TraceFacility::is_external_agent_active)
    /// always reports `false`.
    pub fn open() -> FacilityResult<TraceFs> {
        if let Ok(root) = std::env::var(ENV_TRACEFS_ROOT) {
            return Self::open_at(root).map(Self::with_system_defaults);
        }

        if let Some(path) = Self::find_mount() {
            return Self::open_at(path).map(Self::with_system_defaults);
        }

        for candidate in TRACEFS_MOUNT_CANDIDATES {
            if let Ok(tracefs) = Self::open_at(candidate) {
                return Ok(tracefs.with_system_defaults());
            }
        }

        warn!("TraceFS not mounted");
        Err(FacilityError::NotMounted)
    }

    /// Opens the trace file system rooted at `path`
    pub fn open_at(path: impl AsRef<Path>) -> FacilityResult<TraceFs> {
        let root = path.as_ref().to_path_buf();

        /* Ensure we have access */
        fs::metadata(root.join(TRACING_ON)).map_err(|e| FacilityError::ReadFailed {
            path: root.join(TRACING_ON).display().to_string(),
            reason: e.to_string(),
        })?;

        info!(path = %root.display(), "TraceFS opened");
        Ok(Self {
            root,
            atrace: None,
            annotation_flags: None,
        })
    }

    /// Use `binary` (an atrace-compatible helper) for userspace annotations
    pub fn with_atrace(mut self, binary: impl Into<PathBuf>) -> Self {
        self.atrace = Some(binary.into());
        self
    }

    /// File holding the annotation tag mask; non-zero means someone holds them
    pub fn with_annotation_flags(mut self, path: impl Into<PathBuf>) -> Self {
        self.annotation_flags = Some(path.into());
        self
    }

    fn with_system_defaults(mut self) -> Self {
        if Path::new(ATRACE_BINARY).is_file() {
            self = self.with_atrace(ATRACE_BINARY);
        }
        match std::env::var_os(ENV_ANNOTATION_FLAGS) {
            Some(flags) => self.with_annotation_flags(flags),
            None => {
                debug!("No annotation flags file, external agents go undetected");
                self
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find_mount() -> Option<String> {
        let mounts = File::open("/proc/mounts").ok()?;
        let reader = BufReader::new(mounts);

        for line in reader.lines().map_while(Result::ok) {
            let mut parts = line.split_whitespace();

            /* Format: fsspec path vfstype */
            if let (Some(path), Some(fstype)) = (parts.nth(1), parts.next()) {
                if fstype == "tracefs" {
                    return Some(path.to_string());
                }
            }
        }

        None
    }

    fn run_atrace(&self, args: &[String]) -> FacilityResult<()> {
        let binary = self.atrace.as_ref().ok_or_else(|| FacilityError::Unsupported {
            operation: "userspace annotations".to_string(),
        })?;

        debug!(binary = %binary.display(), ?args, "Running annotation helper");
        let output = Command::new(binary)
            .args(args)
            .output()
            .map_err(|e| FacilityError::WriteFailed {
                path: binary.display().to_string(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(FacilityError::WriteFailed {
                path: binary.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl TraceFacility for TraceFs {
    fn write_control(&self, path: &str, value: &str) -> FacilityResult<()> {
        let full = self.root.join(path);
        let result = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&full)
            .and_then(|mut file| file.write_all(value.as_bytes()));

        result.map_err(|e| {
            debug!(path = %full.display(), error = %e, "Control write failed");
            FacilityError::WriteFailed {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn append_control(&self, path: &str, value: &str) -> FacilityResult<()> {
        let full = self.root.join(path);
        let result = OpenOptions::new()
            .append(true)
            .open(&full)
            .and_then(|mut file| file.write_all(format!("{}\n", value).as_bytes()));

        result.map_err(|e| FacilityError::WriteFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    fn read_control(&self, path: &str) -> FacilityResult<String> {
        fs::read_to_string(self.root.join(path)).map_err(|e| FacilityError::ReadFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    fn is_external_agent_active(&self) -> bool {
        let Some(flags) = &self.annotation_flags else {
            return false;
        };

        let Ok(raw) = fs::read_to_string(flags) else {
            return false;
        };

        let raw = raw.trim();
        let mask = match raw.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u64>().ok(),
        };
        mask.unwrap_or(0) != 0
    }

    fn start_annotations(&self, apps: &[String], categories: &[String]) -> FacilityResult<()> {
        let mut args = vec!["--async_start".to_string(), "--only_userspace".to_string()];
        if !apps.is_empty() {
            args.push("-a".to_string());
            args.push(apps.join(","));
        }
        args.extend(categories.iter().cloned());
        self.run_atrace(&args)
    }

    fn stop_annotations(&self) -> FacilityResult<()> {
        self.run_atrace(&["--async_stop".to_string(), "--only_userspace".to_string()])
    }
}
