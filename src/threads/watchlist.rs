use anyhow::{Context, Result};
use std::path::Path;
use url::Url;

/// Thread id carried by a forum URL.
///
/// The id is the run of digits after the last `.` of the final path
/// segment, so `.../threads/some-game.123/` and `.../thread.123-updated`
/// both yield 123. A segment without a `.` must itself start with digits.
pub fn extract_remote_id(url: &str) -> Option<i64> {
    let path = match Url::parse(url.trim()) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .trim()
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let segment = path.split('/').filter(|s| !s.is_empty()).last()?;
    let tail = segment
        .rsplit_once('.')
        .map(|(_, tail)| tail)
        .unwrap_or(segment);
    let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();

    digits.parse::<i64>().ok().filter(|id| *id > 0)
}

/// Read a watch list file: one URL per line, blank lines and `#` comments
/// ignored.
pub async fn read_watch_list(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read watch list {}", path.display()))?;

    Ok(parse_watch_list(&content))
}

fn parse_watch_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_from_trailing_segment() {
        assert_eq!(extract_remote_id("https://forum.example/threads/thread.123"), Some(123));
        assert_eq!(
            extract_remote_id("https://forum.example/threads/some-game-v0-5.48213/"),
            Some(48213)
        );
        assert_eq!(
            extract_remote_id("https://forum.example/threads/thread.123-updated"),
            Some(123)
        );
        assert_eq!(extract_remote_id("https://forum.example/threads/9001"), Some(9001));
    }

    #[test]
    fn query_and_fragment_are_ignored() {
        assert_eq!(
            extract_remote_id("https://forum.example/threads/game.77/?page=2#post-5"),
            Some(77)
        );
    }

    #[test]
    fn urls_without_id_are_rejected() {
        assert_eq!(extract_remote_id("https://forum.example/threads/no-id/"), None);
        assert_eq!(extract_remote_id("https://forum.example/"), None);
        assert_eq!(extract_remote_id("https://forum.example/threads/game.0/"), None);
        assert_eq!(extract_remote_id(""), None);
    }

    #[test]
    fn relative_urls_still_parse() {
        assert_eq!(extract_remote_id("threads/game.55/"), Some(55));
    }

    #[test]
    fn watch_list_skips_blanks_and_comments() {
        let parsed = parse_watch_list(
            "# watched\nhttps://forum.example/threads/a.1/\n\n   \n  https://forum.example/threads/b.2/  \n",
        );
        assert_eq!(
            parsed,
            vec![
                "https://forum.example/threads/a.1/",
                "https://forum.example/threads/b.2/"
            ]
        );
    }

    #[tokio::test]
    async fn read_watch_list_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.txt");
        tokio::fs::write(&path, "https://forum.example/threads/a.1/\n")
            .await
            .unwrap();

        assert_eq!(read_watch_list(&path).await.unwrap().len(), 1);
        assert!(read_watch_list(&dir.path().join("missing.txt")).await.is_err());
    }
}
