use crate::error::{AppResult, FileError};
use crate::models::question::TestDefinition;
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载试卷定义并校验结构
pub async fn load_test_definition(toml_file_path: &Path) -> AppResult<TestDefinition> {
    let path_display = toml_file_path.display().to_string();

    if !toml_file_path.exists() {
        return Err(FileError::NotFound { path: path_display }.into());
    }

    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: path_display.clone(),
            source,
        })?;

    let definition = parse_test_definition(&content, &path_display)?;

    tracing::info!(
        "成功加载试卷 {}: {} 个分区, {} 道题目",
        definition.title,
        definition.sections.len(),
        definition.question_count()
    );

    Ok(definition)
}

/// 解析 TOML 文本为试卷定义
///
/// `origin` 只用于错误信息
pub fn parse_test_definition(content: &str, origin: &str) -> AppResult<TestDefinition> {
    let definition: TestDefinition =
        toml::from_str(content).map_err(|source| FileError::TomlParseFailed {
            path: origin.to_string(),
            source,
        })?;

    definition.validate()?;

    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ConfigError};
    use crate::models::Modality;

    const SAMPLE: &str = r#"
        id = "backend-screen"
        title = "后端工程师笔试"
        budget_minutes = 30

        [[sections]]
        title = "基础"

        [[sections.questions]]
        id = "ownership"
        title = "所有权"
        skill = "rust"
        modality = "multiple-choice"
        time_budget_minutes = 2
        options = ["move", "copy", "clone"]

        [[sections]]
        title = "沟通"

        [[sections.questions]]
        id = "intro"
        title = "自我介绍"
        skill = "communication"
        modality = "voice"
        time_budget_minutes = 3
    "#;

    #[test]
    fn test_parse_sample_definition() {
        let def = parse_test_definition(SAMPLE, "inline").unwrap();
        assert_eq!(def.id, "backend-screen");
        assert!(def.allow_revisit);
        assert_eq!(def.question_count(), 2);
        assert_eq!(def.sections[1].questions[0].modality, Modality::Voice);
    }

    #[test]
    fn test_parse_reports_toml_errors() {
        let err = parse_test_definition("id = ", "broken.toml").unwrap_err();
        assert!(matches!(
            err,
            AppError::File(FileError::TomlParseFailed { ref path, .. }) if path == "broken.toml"
        ));
    }

    #[test]
    fn test_parse_rejects_duplicate_ids() {
        let content = SAMPLE.replace("id = \"intro\"", "id = \"ownership\"");
        let err = parse_test_definition(&content, "dup.toml").unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::DuplicateQuestion { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_test_definition(Path::new("does/not/exist.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
    }
}
