// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

use crate::job_engine::job::Task;

pub const DEFAULT_EXPECTED_CONTENT: &str = "Hello, world";

/// Reads a file and checks that it contains exactly the expected text.
#[derive(Debug, Clone)]
pub struct CheckFileTask {
    desc: String,
    path: PathBuf,
    expected: String,
}

impl CheckFileTask {
    pub fn new(path: impl Into<PathBuf>, expected: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            desc: format!("check content of {}", path.display()),
            path,
            expected: expected.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Task for CheckFileTask {
    fn desc(&self) -> &str {
        &self.desc
    }

    fn run(&self) -> anyhow::Result<()> {
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("error reading file {}", self.path.display()))?;

        if data != self.expected {
            bail!(
                "file content mismatch in {}: got {:?}, want {:?}",
                self.path.display(),
                data,
                self.expected
            );
        }
        Ok(())
    }
}
