use crate::model::{Commit, SparseHistogram};

/// Counts commits per authored calendar day. Order of `commits` does not
/// matter.
pub fn build_histogram<'a, I>(commits: I) -> SparseHistogram
where
    I: IntoIterator<Item = &'a Commit>,
{
    let mut histogram = SparseHistogram::new();
    for commit in commits {
        histogram.record(commit.authored_day());
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn commit(id: &str, authored: &str) -> Commit {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "parent_ids": [],
            "author_email": "dev@example.com",
            "authored_date": authored
        }))
        .unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn same_day_commits_share_a_bucket() {
        let commits = vec![
            commit("a", "2024-09-20T00:00:01+00:00"),
            commit("b", "2024-09-20T23:59:59+00:00"),
            commit("c", "2024-09-23T08:00:00+00:00"),
        ];
        let h = build_histogram(&commits);
        assert_eq!(h.len(), 2);
        assert_eq!(h.get(&day("2024-09-20")), Some(2));
        assert_eq!(h.get(&day("2024-09-23")), Some(1));
        assert_eq!(h.get(&day("2024-09-21")), None);
    }

    #[test]
    fn buckets_follow_the_reported_offset() {
        // same instant, different local days
        let commits = vec![
            commit("a", "2024-09-20T23:30:00-02:00"),
            commit("b", "2024-09-21T01:30:00+00:00"),
        ];
        let h = build_histogram(&commits);
        assert_eq!(h.get(&day("2024-09-20")), Some(1));
        assert_eq!(h.get(&day("2024-09-21")), Some(1));
    }

    #[test]
    fn result_does_not_depend_on_order() {
        let commits = vec![
            commit("a", "2024-01-01T10:00:00Z"),
            commit("b", "2024-01-03T10:00:00Z"),
            commit("c", "2024-01-01T11:00:00Z"),
            commit("d", "2024-01-02T10:00:00Z"),
        ];
        let forward = build_histogram(&commits);
        let backward = build_histogram(commits.iter().rev());
        let mut rotated = commits.clone();
        rotated.rotate_left(2);
        assert_eq!(forward, backward);
        assert_eq!(forward, build_histogram(&rotated));
        assert_eq!(forward.iter().map(|(_, n)| n).sum::<u32>(), 4);
    }

    #[test]
    fn no_commits_no_buckets() {
        assert!(build_histogram(&Vec::<Commit>::new()).is_empty());
    }
}
