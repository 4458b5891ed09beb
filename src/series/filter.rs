use crate::model::Commit;

/// Drops merge commits, keeping root and regular ones in their original order.
pub fn exclude_merges(commits: &[Commit]) -> Vec<Commit> {
    commits.iter().filter(|c| !c.is_merge()).cloned().collect()
}

/// Keeps commits whose author email equals `email` byte for byte. Case is
/// not folded: the API's stored casing decides.
pub fn by_author_email(commits: &[Commit], email: &str) -> Vec<Commit> {
    commits
        .iter()
        .filter(|c| c.author_email == email)
        .cloned()
        .collect()
}
