//! Test services management.
//!
//! Spawns and manages slirc-services instances for integration testing.

use std::path::PathBuf;
use std::process::{Child, Command};
use tempfile::TempDir;

/// A services process linked (or trying to link) to a local hub port.
pub struct TestServices {
    child: Child,
    data_dir: TempDir,
}

impl TestServices {
    /// Write a config pointing at `hub_port` and start the binary.
    pub fn spawn(hub_port: u16) -> anyhow::Result<Self> {
        let data_dir = tempfile::tempdir()?;
        let dir = data_dir.path();

        std::fs::write(dir.join("homoglyphs.txt"), "# test set\nа о е\n")?;

        let config_path = dir.join("services.toml");
        let config_content = format!(
            r##"
[server]
name = "services.test.net"
numeric = "S"
description = "Test services"
metrics_port = 0

[hub]
host = "127.0.0.1"
port = {hub_port}
password = "linkpass"

[database]
path = "{db}"

[services]
operations_channel = "#opers"

[services.host]
cloak_secret = "TestSecret-2026-Secure!9X"

[services.spam]
secret = "spamsecret"

[abuse]
homoglyph_file = "{homoglyphs}"
banned_words = ["spam"]
"##,
            db = dir.join("services.db").display(),
            homoglyphs = dir.join("homoglyphs.txt").display(),
        );
        std::fs::write(&config_path, config_content)?;

        let child = Command::new(env!("CARGO_BIN_EXE_slirc-services"))
            .arg(&config_path)
            .env("RUST_LOG", "warn")
            .spawn()?;

        Ok(Self { child, data_dir })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.path().join("services.db")
    }
}

impl Drop for TestServices {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
