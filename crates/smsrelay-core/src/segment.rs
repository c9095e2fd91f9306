use std::io;
use std::path::Path;

/// Read one segment file's text content.
///
/// Modem firmware occasionally writes byte sequences that are not valid
/// UTF-8; decode is best-effort with replacement rather than a failure.
pub async fn read_segment(path: &Path) -> io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_utf8_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.txt");
        tokio::fs::write(&path, "Hello, world").await.unwrap();

        assert_eq!(read_segment(&path).await.unwrap(), "Hello, world");
    }

    #[tokio::test]
    async fn replaces_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.txt");
        tokio::fs::write(&path, b"ok\xff\xfeok").await.unwrap();

        let text = read_segment(&path).await.unwrap();
        assert!(text.starts_with("ok"));
        assert!(text.ends_with("ok"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_segment(&dir.path().join("gone.txt")).await.is_err());
    }
}
