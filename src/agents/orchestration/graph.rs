//! Task dependency resolution

use std::collections::{HashMap, HashSet};

use crate::agents::domain::Task;
use crate::agents::error::{AgentError, AgentResult};

/// Order `tasks` so every task comes after its dependencies.
///
/// Kahn's algorithm; among tasks that are ready at the same time the
/// workflow order wins, so an already valid order is returned unchanged.
pub fn resolve_order(tasks: &[Task]) -> AgentResult<Vec<Task>> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(tasks.len());
    for (i, task) in tasks.iter().enumerate() {
        if index.insert(task.id.as_str(), i).is_some() {
            return Err(AgentError::Validation(format!(
                "Duplicate task id '{}'",
                task.id
            )));
        }
    }

    let mut in_degree = vec![0usize; tasks.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];

    for (i, task) in tasks.iter().enumerate() {
        let mut seen = HashSet::new();
        for dep in &task.dependencies {
            let Some(&d) = index.get(dep.as_str()) else {
                return Err(AgentError::DependencyNotFound {
                    task: task.id.clone(),
                    dependency: dep.clone(),
                });
            };
            // a repeated dependency counts once
            if seen.insert(d) {
                in_degree[i] += 1;
                dependents[d].push(i);
            }
        }
    }

    let mut placed = vec![false; tasks.len()];
    let mut order = Vec::with_capacity(tasks.len());

    while order.len() < tasks.len() {
        let Some(next) = (0..tasks.len()).find(|&i| !placed[i] && in_degree[i] == 0) else {
            let stuck = (0..tasks.len())
                .find(|&i| !placed[i])
                .map(|i| tasks[i].id.clone())
                .unwrap_or_default();
            return Err(AgentError::CircularDependency(stuck));
        };

        placed[next] = true;
        for &dependent in &dependents[next] {
            in_degree[dependent] -= 1;
        }
        order.push(tasks[next].clone());
    }

    Ok(order)
}
