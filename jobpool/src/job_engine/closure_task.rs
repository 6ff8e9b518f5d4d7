// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use crate::job_engine::job::Task;

pub struct ClosureTask {
    desc: String,
    body: Box<dyn Fn() -> anyhow::Result<()> + Send + 'static>,
}

impl ClosureTask {
    pub fn new<F>(desc: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            desc: desc.into(),
            body: Box::new(f),
        }
    }
}

impl Task for ClosureTask {
    fn desc(&self) -> &str {
        &self.desc
    }

    fn run(&self) -> anyhow::Result<()> {
        (self.body)()
    }
}
