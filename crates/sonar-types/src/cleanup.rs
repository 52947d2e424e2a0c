//! Release actions registered at acquisition time.
//!
//! Tasks run in reverse registration order, exactly once: either through an
//! explicit `run_all`, or when the registry is dropped on any other exit path.

type Task = Box<dyn FnOnce()>;

/// Stack of cleanup tasks.
#[derive(Default)]
pub struct CleanupTasks {
    tasks: Vec<(String, Task)>,
}

impl CleanupTasks {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Register a release action. `label` is only used for logging.
    pub fn push<F>(&mut self, label: impl Into<String>, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.tasks.push((label.into(), Box::new(task)));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every registered task, most recent first. The registry is empty afterwards.
    pub fn run_all(&mut self) {
        while let Some((label, task)) = self.tasks.pop() {
            tracing::debug!(task = %label, "running cleanup task");
            task();
        }
    }
}

impl Drop for CleanupTasks {
    fn drop(&mut self) {
        self.run_all();
    }
}

impl std::fmt::Debug for CleanupTasks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.tasks.iter().map(|(l, _)| l.as_str()).collect();
        f.debug_struct("CleanupTasks").field("tasks", &labels).finish()
    }
}
