//! Execution environment composition.
//!
//! Ambient variables carrying the configured prefix are forwarded first, sorted
//! by key so repeated runs produce the same list. Entries from `--env` follow in
//! the order given. Nothing is deduplicated or validated here; a backend that
//! cannot use an entry rejects it at create time.

use crate::types::ExecutionEnvironment;

pub fn compose<I>(ambient: I, extra: &[String], prefix: &str) -> ExecutionEnvironment
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut forwarded: Vec<(String, String)> = ambient
        .into_iter()
        .filter(|(key, _)| key.starts_with(prefix))
        .collect();
    forwarded.sort_by(|a, b| a.0.cmp(&b.0));

    let mut env = ExecutionEnvironment::new();
    for (key, value) in forwarded {
        env.push(format!("{key}={value}"));
    }

    for flag in extra {
        for entry in flag.split(',') {
            let entry = entry.trim();
            if !entry.is_empty() {
                env.push(entry);
            }
        }
    }

    env
}

/// Compose against the current process environment.
pub fn compose_from_process(extra: &[String], prefix: &str) -> ExecutionEnvironment {
    compose(std::env::vars(), extra, prefix)
}
