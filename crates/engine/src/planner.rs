//! Batch planner (C1, §4.1): parses a Markdown task document into an
//! ordered [`BatchPlan`]. Lives in `loom-engine` rather than `loom-core`
//! because it needs `regex`, which only this crate's dependency table
//! carries (the core stays dependency-light — see `loom_core::batch` for
//! the data shapes this produces).

use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBatch {
    pub name: String,
    pub task_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub batches: Vec<PlannedBatch>,
    pub used_fallback: bool,
    pub fallback_size: Option<usize>,
    pub total_incomplete: usize,
    pub dependency_warnings: Vec<String>,
}

#[derive(Debug, Clone)]
struct ParsedTask {
    id: String,
    done: bool,
    deps: Vec<String>,
}

#[derive(Debug, Clone)]
struct ParsedSection {
    /// `None` for the implicit section accumulating tasks before the
    /// first `## ` header.
    name: Option<String>,
    tasks: Vec<ParsedTask>,
}

/// Section header: `## <name>`.
#[allow(clippy::expect_used)]
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s*(.+?)\s*$").expect("constant regex pattern is valid"));

/// Task line: `- [ ] T001` / `* [x] T002`, with an optional `[depends: ...]`
/// annotation appearing anywhere after it.
#[allow(clippy::expect_used)]
static TASK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-*]\s*\[([ xX])\]\s*(T\d{3})").expect("constant regex pattern is valid")
});

/// `[depends: T001,T002]` / `[dep: T001]` / `[after: T003]`, case-insensitive.
#[allow(clippy::expect_used)]
static DEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[(?:depends|dep|after)\s*:\s*([A-Za-z0-9,\s]+)\]")
        .expect("constant regex pattern is valid")
});

fn parse_deps(line: &str) -> Vec<String> {
    let Some(caps) = DEP_RE.captures(line) else {
        return Vec::new();
    };
    caps[1]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_document(document: &str) -> Vec<ParsedSection> {
    let mut sections = vec![ParsedSection {
        name: None,
        tasks: Vec::new(),
    }];

    for raw_line in document.lines() {
        let line = raw_line.trim_end();
        if let Some(caps) = HEADER_RE.captures(line.trim_start()) {
            sections.push(ParsedSection {
                name: Some(caps[1].to_string()),
                tasks: Vec::new(),
            });
            continue;
        }
        let trimmed = line.trim_start();
        if let Some(caps) = TASK_RE.captures(trimmed) {
            let done = matches!(&caps[1], "x" | "X");
            let id = caps[2].to_string();
            let deps = parse_deps(trimmed);
            if let Some(current) = sections.last_mut() {
                current.tasks.push(ParsedTask { id, done, deps });
            }
        }
    }

    sections
}

/// Topologically sort `tasks` by intra-batch dependency edges (Kahn's
/// algorithm). Dependencies on ids outside `tasks` are ignored for
/// ordering. On a cycle, returns `None` and the caller falls back to
/// document order.
fn topo_sort(tasks: &[ParsedTask]) -> Option<Vec<usize>> {
    let n = tasks.len();
    let mut in_degree = vec![0usize; n];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.deps {
            for (j, other) in tasks.iter().enumerate() {
                if j != i && other.id == *dep {
                    successors[j].push(i);
                    in_degree[i] += 1;
                }
            }
        }
    }

    let mut ready: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(i) = ready.pop_front() {
        order.push(i);
        for &succ in &successors[i] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                // Insert keeping the remaining queue in ascending document
                // order so ties resolve deterministically.
                let pos = ready.iter().position(|&r| r > succ).unwrap_or(ready.len());
                ready.insert(pos, succ);
            }
        }
    }

    if order.len() == n {
        Some(order)
    } else {
        None
    }
}

fn order_batch(name: &str, tasks: &[ParsedTask], warnings: &mut Vec<String>) -> Vec<String> {
    match topo_sort(tasks) {
        Some(order) => order.into_iter().map(|i| tasks[i].id.clone()).collect(),
        None => {
            warnings.push(format!(
                "Dependency cycle detected in batch '{name}'; falling back to document order"
            ));
            tasks.iter().map(|t| t.id.clone()).collect()
        }
    }
}

/// Parse `document` into an ordered [`BatchPlan`], chunking into
/// `fallback_batch_size`-sized groups when no `##` section contains any
/// incomplete task (§4.1).
pub fn plan_batches(document: &str, fallback_batch_size: usize) -> BatchPlan {
    let sections = parse_document(document);

    let mut all_ids: HashSet<String> = HashSet::new();
    let mut all_deps: Vec<(String, String)> = Vec::new();
    for section in &sections {
        for task in &section.tasks {
            all_ids.insert(task.id.clone());
            for dep in &task.deps {
                all_deps.push((task.id.clone(), dep.clone()));
            }
        }
    }

    let mut dependency_warnings = Vec::new();
    for (id, dep) in &all_deps {
        if !all_ids.contains(dep) {
            dependency_warnings.push(format!("Task {id} depends on {dep}, which doesn't exist"));
        }
    }

    let total_incomplete: usize = sections
        .iter()
        .map(|s| s.tasks.iter().filter(|t| !t.done).count())
        .sum();

    let named_incomplete_exists = sections
        .iter()
        .any(|s| s.name.is_some() && s.tasks.iter().any(|t| !t.done));

    if named_incomplete_exists {
        let mut batches = Vec::new();
        for section in &sections {
            let incomplete: Vec<ParsedTask> = section
                .tasks
                .iter()
                .filter(|t| !t.done)
                .cloned()
                .collect();
            if incomplete.is_empty() {
                continue;
            }
            let name = section.name.clone().unwrap_or_default();
            let task_ids = order_batch(&name, &incomplete, &mut dependency_warnings);
            batches.push(PlannedBatch { name, task_ids });
        }

        return BatchPlan {
            batches,
            used_fallback: false,
            fallback_size: None,
            total_incomplete,
            dependency_warnings,
        };
    }

    let flat_incomplete: Vec<ParsedTask> = sections
        .iter()
        .flat_map(|s| s.tasks.iter().filter(|t| !t.done).cloned())
        .collect();

    if flat_incomplete.is_empty() {
        return BatchPlan {
            batches: Vec::new(),
            used_fallback: false,
            fallback_size: None,
            total_incomplete: 0,
            dependency_warnings,
        };
    }

    let chunk_size = fallback_batch_size.max(1);
    let mut batches = Vec::new();
    for (n, chunk) in flat_incomplete.chunks(chunk_size).enumerate() {
        let name = format!("Batch {}", n + 1);
        let task_ids = order_batch(&name, chunk, &mut dependency_warnings);
        batches.push(PlannedBatch { name, task_ids });
    }

    BatchPlan {
        batches,
        used_fallback: true,
        fallback_size: Some(chunk_size),
        total_incomplete,
        dependency_warnings,
    }
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
