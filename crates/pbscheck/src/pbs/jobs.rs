use crate::pbs::client::PbsClient;

/// `qstat -u` prints at most 8 characters of the queue name and marks a
/// truncated name with a trailing `*`.
fn queue_column_matches(line: &str, queue: &str) -> bool {
    let mut columns = line.split_whitespace();
    let (Some(job_id), Some(_user), Some(column)) =
        (columns.next(), columns.next(), columns.next())
    else {
        return false;
    };
    if !job_id.contains('.') {
        return false;
    }
    match column.strip_suffix('*') {
        Some(prefix) => !prefix.is_empty() && queue.starts_with(prefix),
        None => column == queue,
    }
}

/// Counts lines of `qstat -u` output that belong to a job in `queue`.
pub fn count_queue_jobs(qstat_output: &str, queue: &str) -> usize {
    qstat_output
        .lines()
        .filter(|line| line.contains(queue) || queue_column_matches(line, queue))
        .count()
}

/// Returns true if `user` has a job in `queue`.
///
/// The check is advisory: when `qstat` cannot be run, a warning is logged and
/// the user is assumed to have no job.
pub fn user_has_queue_job(client: &dyn PbsClient, user: &str, queue: &str) -> bool {
    match client.user_jobs(user) {
        Ok(output) => {
            let count = count_queue_jobs(&output, queue);
            log::debug!("User {user} has {count} job(s) in queue {queue}");
            count > 0
        }
        Err(error) => {
            log::warn!("Could not list jobs of user {user}: {error:#}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{count_queue_jobs, user_has_queue_job};
    use crate::tests::utils::{MockPbs, QSTAT_USER_JOBS, QSTAT_USER_JOBS_BATCH_ONLY};

    #[test]
    fn count_jobs() {
        assert_eq!(count_queue_jobs(QSTAT_USER_JOBS, "interactq"), 1);
        assert_eq!(count_queue_jobs(QSTAT_USER_JOBS_BATCH_ONLY, "interactq"), 0);
        assert_eq!(count_queue_jobs("", "interactq"), 0);
    }

    #[test]
    fn truncated_queue_names() {
        assert_eq!(count_queue_jobs(QSTAT_USER_JOBS, "interactive"), 1);
        assert_eq!(count_queue_jobs(QSTAT_USER_JOBS, "largeq"), 1);
        assert_eq!(count_queue_jobs(QSTAT_USER_JOBS, "interq"), 0);
        assert_eq!(count_queue_jobs(QSTAT_USER_JOBS_BATCH_ONLY, "largeq"), 1);
    }

    #[test]
    fn full_queue_name_matches() {
        let output =
            "318702.pbs01    jdoe     shortq   STDIN       60212   1   1    1gb 00:10 R 00:01";
        assert_eq!(count_queue_jobs(output, "shortq"), 1);
        assert_eq!(count_queue_jobs(output, "short"), 1);
        assert_eq!(count_queue_jobs(output, "longq"), 0);
    }

    #[test]
    fn job_present() {
        let pbs = MockPbs {
            user_jobs: Some(QSTAT_USER_JOBS.to_string()),
            ..Default::default()
        };
        assert!(user_has_queue_job(&pbs, "jdoe", "interactq"));
    }

    #[test]
    fn query_failure_means_no_job() {
        let pbs = MockPbs::default();
        assert!(!user_has_queue_job(&pbs, "jdoe", "interactq"));
    }
}
