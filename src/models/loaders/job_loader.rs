use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{AppError, FileError};

/// 发布任务文件
///
/// ```toml
/// title = "周末去露营"
/// description = "好天气 #露营[话题]#"
/// files = ["photos/1.jpg", "photos/2.png"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PublishJob {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// 从 TOML 文件加载发布任务
///
/// 相对路径的图片以任务文件所在目录为基准。
pub async fn load_publish_job(job_file_path: &Path) -> Result<PublishJob> {
    let content = fs::read_to_string(job_file_path)
        .await
        .with_context(|| format!("无法读取任务文件: {}", job_file_path.display()))?;

    let mut job: PublishJob = toml::from_str(&content).map_err(|source| {
        AppError::File(FileError::TomlParseFailed {
            path: job_file_path.display().to_string(),
            source,
        })
    })?;

    if let Some(base) = job_file_path.parent() {
        for file in job.files.iter_mut() {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
    }

    tracing::info!(
        "成功加载任务: {} ({} 个文件)",
        job.title,
        job.files.len()
    );

    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_relative_files_resolve_against_job_dir() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = dir.path().join("publish.toml");
        std::fs::write(
            &job_path,
            "title = \"A\"\ndescription = \"B\"\nfiles = [\"img/1.jpg\", \"/abs/2.png\"]\n",
        )
        .unwrap();

        let job = load_publish_job(&job_path).await.unwrap();
        assert_eq!(job.title, "A");
        assert_eq!(job.description, "B");
        assert_eq!(job.files[0], dir.path().join("img/1.jpg"));
        assert_eq!(job.files[1], PathBuf::from("/abs/2.png"));
    }

    #[tokio::test]
    async fn test_missing_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = dir.path().join("job.toml");
        std::fs::write(&job_path, "title = \"only title\"\n").unwrap();

        let job = load_publish_job(&job_path).await.unwrap();
        assert!(job.description.is_empty());
        assert!(job.files.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let result = load_publish_job(Path::new("/definitely/not/here.toml")).await;
        assert!(result.is_err());
    }
}
