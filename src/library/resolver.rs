//! Disambiguation of multi-match catalog results

use crate::catalog::RemoteGameInfo;
use crate::prompt::Chooser;
use std::sync::Arc;

/// Hands ambiguous catalog matches to the user. Never picks on its own.
#[derive(Clone)]
pub struct ConflictResolver {
    chooser: Arc<dyn Chooser>,
}

impl ConflictResolver {
    pub fn new(chooser: Arc<dyn Chooser>) -> Self {
        Self { chooser }
    }

    /// Ask for exactly one of `candidates`, in catalog order.
    ///
    /// `None` means the user declined.
    pub async fn resolve(
        &self,
        candidate_name: &str,
        mut candidates: Vec<RemoteGameInfo>,
    ) -> Option<RemoteGameInfo> {
        if candidates.is_empty() {
            return None;
        }

        let prompt = format!(
            "{} catalog entries match '{}'. Which one is it?",
            candidates.len(),
            candidate_name
        );
        let labels: Vec<String> = candidates.iter().map(RemoteGameInfo::display_label).collect();

        match self.chooser.choose(&prompt, &labels).await {
            Some(index) if index < candidates.len() => {
                let chosen = candidates.swap_remove(index);
                tracing::debug!("Resolved '{}' to catalog id {}", candidate_name, chosen.id);
                Some(chosen)
            }
            Some(index) => {
                tracing::warn!(
                    "Chooser returned out-of-range index {} for '{}', treating as cancelled",
                    index,
                    candidate_name
                );
                None
            }
            None => {
                tracing::info!("Selection for '{}' cancelled", candidate_name);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::MockChooser;

    fn info(id: i64, name: &str) -> RemoteGameInfo {
        RemoteGameInfo {
            id,
            name: name.to_string(),
            author: format!("author{}", id),
            version: String::new(),
            url: None,
            summary: None,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn presents_candidates_in_catalog_order() {
        let mut chooser = MockChooser::new();
        chooser
            .expect_choose()
            .withf(|prompt, options| {
                prompt.contains("Game X")
                    && options.to_vec()
                        == vec![
                            "Game X by author12".to_string(),
                            "Game X by author77".to_string(),
                            "Game X Remake by author3".to_string(),
                        ]
            })
            .times(1)
            .returning(|_, _| Some(1));

        let resolver = ConflictResolver::new(Arc::new(chooser));
        let chosen = resolver
            .resolve(
                "Game X",
                vec![info(12, "Game X"), info(77, "Game X"), info(3, "Game X Remake")],
            )
            .await;
        assert_eq!(chosen.map(|c| c.id), Some(77));
    }

    #[tokio::test]
    async fn cancellation_returns_none() {
        let mut chooser = MockChooser::new();
        chooser.expect_choose().times(1).returning(|_, _| None);

        let resolver = ConflictResolver::new(Arc::new(chooser));
        assert!(resolver
            .resolve("Game X", vec![info(1, "a"), info(2, "b")])
            .await
            .is_none());
    }

    #[tokio::test]
    async fn out_of_range_choice_is_not_guessed() {
        let mut chooser = MockChooser::new();
        chooser.expect_choose().returning(|_, _| Some(9));

        let resolver = ConflictResolver::new(Arc::new(chooser));
        assert!(resolver
            .resolve("Game X", vec![info(1, "a"), info(2, "b")])
            .await
            .is_none());
    }

    #[tokio::test]
    async fn empty_candidates_never_prompt() {
        let mut chooser = MockChooser::new();
        chooser.expect_choose().times(0);

        let resolver = ConflictResolver::new(Arc::new(chooser));
        assert!(resolver.resolve("Game X", Vec::new()).await.is_none());
    }
}
