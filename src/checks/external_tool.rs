//! Process-backed check tool
//!
//! Runs an external lint command over a directory and exposes its standard
//! output as a line stream. The output is consumed while the process runs,
//! so reports of any size are handled without buffering them whole.
//!
//! # Arguments
//!
//! The argument vector is the configured command, then one exclusion flag
//! per skipped directory, then one per skipped file (only for tools with a
//! file exclusion flag), then the directory with the recursive suffix:
//!
//! ```text
//! go vet --skip=Godeps --skip=vendor --skip=third_party ./pkg/...
//! ```

use super::{CheckTool, ExitClass, ReportStream};
use crate::config::{CheckSpec, Profile};
use crate::error::{CheckError, CheckResult};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// An external command that prints `path:line:column:message` reports
#[derive(Debug, Clone)]
pub struct ExternalTool {
    spec: CheckSpec,
    skip_dir_args: Vec<String>,
    recursive_suffix: String,
}

impl ExternalTool {
    /// Build the tool described by a check spec under an analysis profile
    pub fn from_spec(spec: &CheckSpec, profile: &Profile) -> Self {
        Self {
            spec: spec.clone(),
            skip_dir_args: profile.skip_dir_args(),
            recursive_suffix: profile.recursive_suffix.clone(),
        }
    }

    /// Arguments passed after the program name
    pub fn args(&self, dir: &Path, skipped: &[PathBuf]) -> Vec<String> {
        let mut args: Vec<String> = self.spec.command.iter().skip(1).cloned().collect();
        args.extend(self.skip_dir_args.iter().cloned());
        args.extend(self.spec.exclude_args(skipped));

        let dir = dir.to_string_lossy();
        let dir = match dir.trim_end_matches('/') {
            "" if dir.starts_with('/') => "",
            "" => ".",
            trimmed => trimmed,
        };
        args.push(format!("{dir}{}", self.recursive_suffix));
        args
    }

    fn command_line(&self) -> String {
        self.spec.command.join(" ")
    }
}

impl CheckTool for ExternalTool {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn launch(
        &self,
        dir: &Path,
        _files: &[PathBuf],
        skipped: &[PathBuf],
    ) -> CheckResult<Box<dyn ReportStream>> {
        let Some(program) = self.spec.command.first() else {
            return Err(CheckError::Config(format!(
                "check '{}' has an empty command",
                self.spec.name
            )));
        };
        let args = self.args(dir, skipped);

        debug!("Running {}: {} {:?}", self.spec.name, program, args);

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    warn!("{} not found. Please install it first.", program);
                }
                CheckError::Launch {
                    command: self.command_line(),
                    source,
                }
            })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CheckError::Launch {
                command: self.command_line(),
                source: std::io::Error::other("stdout was not captured"),
            });
        };

        let stderr = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        Ok(Box::new(ProcessStream {
            command_line: self.command_line(),
            child: Some(child),
            reader: BufReader::new(stdout),
            stderr,
            findings_exit_code: self.spec.findings_exit_code,
        }))
    }
}

/// Standard output of a running tool
struct ProcessStream {
    command_line: String,
    child: Option<Child>,
    reader: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    findings_exit_code: i32,
}

impl ReportStream for ProcessStream {
    fn next_line(&mut self) -> Option<std::io::Result<String>> {
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }

    fn finish(mut self: Box<Self>) -> CheckResult<ExitClass> {
        let Some(mut child) = self.child.take() else {
            return Ok(ExitClass::Failed(None));
        };
        let status = child.wait().map_err(|source| CheckError::Stream {
            command: self.command_line.clone(),
            source,
        })?;

        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        let class = ExitClass::from_code(status.code(), self.findings_exit_code);
        debug!("{} finished with {:?} ({})", self.command_line, class, status);
        if class.is_failure() && !stderr.trim().is_empty() {
            warn!("{} stderr: {}", self.command_line, stderr.trim());
        }
        Ok(class)
    }
}

impl Drop for ProcessStream {
    fn drop(&mut self) {
        // Stream abandoned before finish(): do not leave the tool running.
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> ExternalTool {
        let spec = CheckSpec::command("sh", "", &["sh", "-c", script], 1.0);
        ExternalTool::from_spec(&spec, &Profile::default())
    }

    fn drain(stream: &mut Box<dyn ReportStream>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = stream.next_line() {
            lines.push(line.unwrap());
        }
        lines
    }

    #[test]
    fn test_args_layout() {
        let mut spec = CheckSpec::command("vet", "", &["go", "vet", "-all"], 1.0);
        let tool = ExternalTool::from_spec(&spec, &Profile::default());
        assert_eq!(
            tool.args(Path::new("repos/src/github.com/o/r/"), &[PathBuf::from("x.pb.go")]),
            vec![
                "-all",
                "--skip=Godeps",
                "--skip=vendor",
                "--skip=third_party",
                "repos/src/github.com/o/r/...",
            ]
        );

        spec.exclude_flag = Some("--exclude={}".to_string());
        let tool = ExternalTool::from_spec(&spec, &Profile::default());
        let args = tool.args(Path::new("."), &[PathBuf::from("x.pb.go")]);
        assert_eq!(&args[args.len() - 2..], ["--exclude=x.pb.go", "./..."]);
    }

    #[test]
    fn test_streams_lines_and_classifies_findings_exit() {
        let tool = sh("printf 'a.go:1:1: one\\r\\nb.go:2:1: two\\n'; exit 1");
        let mut stream = tool.launch(Path::new("."), &[], &[]).unwrap();
        assert_eq!(drain(&mut stream), vec!["a.go:1:1: one", "b.go:2:1: two"]);
        assert_eq!(stream.finish().unwrap(), ExitClass::Findings);
    }

    #[test]
    fn test_clean_and_failed_exits() {
        let mut stream = sh("true").launch(Path::new("."), &[], &[]).unwrap();
        assert!(drain(&mut stream).is_empty());
        assert_eq!(stream.finish().unwrap(), ExitClass::Clean);

        let mut stream = sh("echo boom >&2; exit 3").launch(Path::new("."), &[], &[]).unwrap();
        drain(&mut stream);
        assert_eq!(stream.finish().unwrap(), ExitClass::Failed(Some(3)));
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let spec = CheckSpec::command("nope", "", &["codegrade-no-such-tool-xyz"], 1.0);
        let tool = ExternalTool::from_spec(&spec, &Profile::default());
        match tool.launch(Path::new("."), &[], &[]) {
            Err(CheckError::Launch { command, .. }) => {
                assert_eq!(command, "codegrade-no-such-tool-xyz")
            }
            other => panic!("expected launch error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_dropping_stream_kills_tool() {
        let mut stream = sh("echo first; sleep 30").launch(Path::new("."), &[], &[]).unwrap();
        assert_eq!(stream.next_line().unwrap().unwrap(), "first");
        let start = std::time::Instant::now();
        drop(stream);
        assert!(start.elapsed() < std::time::Duration::from_secs(10));
    }
}
