//! Scripted stand-in for the yt-dlp binary (unix shells only).

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::download::source::YtDlpSettings;

#[derive(Debug, Clone)]
enum Behavior {
    WriteFiles(Vec<(String, u64)>),
    Fail(String),
    Sleep(u64),
}

/// Builder for a fake yt-dlp script.
#[derive(Debug, Clone)]
pub struct FakeYtDlp {
    dir: PathBuf,
    behavior: Behavior,
    required_format: Option<String>,
}

/// An installed fake: the script path plus the log of `-f` values it received.
#[derive(Debug, Clone)]
pub struct InstalledFake {
    pub bin: PathBuf,
    log: PathBuf,
}

fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

impl FakeYtDlp {
    /// Script files live in `dir`; the downloads land wherever `-P` points.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            behavior: Behavior::WriteFiles(vec![("video.mp4".to_string(), 1024)]),
            required_format: None,
        }
    }

    /// Create these files (name, size in bytes) in the destination directory.
    pub fn writes_files(mut self, files: &[(&str, u64)]) -> Self {
        self.behavior = Behavior::WriteFiles(files.iter().map(|(n, s)| (n.to_string(), *s)).collect());
        self
    }

    /// Exit 1 with this stderr.
    pub fn fails_with(mut self, stderr: &str) -> Self {
        self.behavior = Behavior::Fail(stderr.to_string());
        self
    }

    /// Hang for `secs` seconds before doing nothing.
    pub fn sleeps(mut self, secs: u64) -> Self {
        self.behavior = Behavior::Sleep(secs);
        self
    }

    /// Reject every `-f` selector except this one with "Requested format is not available".
    pub fn only_format(mut self, format: &str) -> Self {
        self.required_format = Some(format.to_string());
        self
    }

    fn script(&self, log: &Path) -> String {
        let mut script = String::from(
            "#!/bin/sh\n\
             dir=\"\"\n\
             fmt=\"\"\n\
             while [ $# -gt 0 ]; do\n\
             \x20 case \"$1\" in\n\
             \x20   -P) dir=\"$2\"; shift ;;\n\
             \x20   -f) fmt=\"$2\"; shift ;;\n\
             \x20 esac\n\
             \x20 shift\n\
             done\n",
        );
        script.push_str(&format!("echo \"$fmt\" >> {}\n", shell_quote(&log.display().to_string())));

        if let Some(ref required) = self.required_format {
            script.push_str(&format!(
                "if [ \"$fmt\" != {} ]; then echo 'ERROR: [youtube] abc123: Requested format is not available' >&2; exit 1; fi\n",
                shell_quote(required)
            ));
        }

        match &self.behavior {
            Behavior::WriteFiles(files) => {
                for (name, size) in files {
                    script.push_str(&format!(
                        "head -c {} /dev/zero > \"$dir\"/{}\n",
                        size,
                        shell_quote(name)
                    ));
                }
            }
            Behavior::Fail(stderr) => {
                script.push_str(&format!("echo {} >&2\nexit 1\n", shell_quote(stderr)));
            }
            Behavior::Sleep(secs) => {
                script.push_str(&format!("sleep {}\n", secs));
            }
        }
        script.push_str("exit 0\n");
        script
    }

    /// Write the script and mark it executable.
    pub fn install(self) -> std::io::Result<InstalledFake> {
        std::fs::create_dir_all(&self.dir)?;
        let bin = self.dir.join("fake-yt-dlp");
        let log = self.dir.join("fake-yt-dlp.log");
        std::fs::write(&bin, self.script(&log))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755))?;
        }

        Ok(InstalledFake { bin, log })
    }
}

impl InstalledFake {
    /// Settings pointing adapters at this script.
    pub fn settings(&self, timeout: Duration) -> YtDlpSettings {
        YtDlpSettings {
            bin: self.bin.display().to_string(),
            cookies_file: None,
            timeout,
        }
    }

    /// `-f` values received so far, one per run (empty string when absent).
    pub fn formats_seen(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
