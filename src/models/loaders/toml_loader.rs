use crate::error::{AppResult, FileError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 测评文件中的候选人信息
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateEntry {
    pub name: String,
    #[serde(default)]
    pub position: String,
}

/// 测评文件中的单道题目（可附带待评估的答案）
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionEntry {
    pub text: String,
    #[serde(default)]
    pub context: Option<String>,
    /// 答案音频路径，相对于 TOML 文件所在目录
    #[serde(default)]
    pub answer_audio: Option<String>,
    /// 人工录入的文本答案
    #[serde(default)]
    pub answer_text: Option<String>,
}

impl QuestionEntry {
    pub fn has_answer(&self) -> bool {
        self.answer_audio.is_some() || self.answer_text.is_some()
    }
}

/// 一个测评 TOML 文件
#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentFile {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub candidate: CandidateEntry,
    /// 所有答案提交后是否完成测试
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub questions: Vec<QuestionEntry>,

    #[serde(skip)]
    pub file_path: Option<PathBuf>,
}

impl AssessmentFile {
    /// 把题目里的相对音频路径解析为基于 TOML 所在目录的路径
    pub fn resolve_audio_path(&self, relative: &str) -> PathBuf {
        let rel = Path::new(relative);
        if rel.is_absolute() {
            return rel.to_path_buf();
        }
        match self.file_path.as_deref().and_then(Path::parent) {
            Some(dir) => dir.join(rel),
            None => rel.to_path_buf(),
        }
    }
}

/// 从 TOML 文件加载测评定义
pub async fn load_assessment_file(toml_file_path: &Path) -> AppResult<AssessmentFile> {
    let path_str = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: path_str.clone(),
            source,
        })?;

    let mut file: AssessmentFile =
        toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path_str,
            source,
        })?;

    file.file_path = Some(toml_file_path.to_path_buf());

    Ok(file)
}

/// 从文件夹中加载所有测评 TOML 文件
///
/// 单个文件解析失败只记录警告并跳过。结果按文件名排序，保证处理顺序稳定。
pub async fn load_all_assessment_files(folder_path: &str) -> AppResult<Vec<AssessmentFile>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: folder_path.to_string(),
            source,
        })?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|source| FileError::ReadFailed {
            path: folder_path.to_string(),
            source,
        })?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_assessment_file(&path).await {
            Ok(file) => {
                tracing::info!("成功加载 {} 道题目", file.questions.len());
                files.push(file);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(files)
}
