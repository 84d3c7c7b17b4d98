// Command handler tests against throwaway project directories

use std::fs;

use fmtbridge_cli::commands::{Command, Context, FormatCommand, GlobalOptions, InitCommand};
use fmtbridge_cli::CliError;
use fmtbridge_edit::parser::PLAIN_TEXT;
use tempfile::TempDir;

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("package.json"), "{}").unwrap();
    fs::create_dir_all(temp.path().join("src")).unwrap();
    temp
}

fn options(temp: &TempDir) -> GlobalOptions {
    GlobalOptions {
        root: Some(temp.path().to_path_buf()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_context_loads_settings_file() {
    let temp = project();
    let settings = temp.path().join("fmtbridge.yaml");
    fs::write(&settings, "onlyUseLocalVersion: true\ntabWidth: 8\n").unwrap();

    let context = Context::build(&GlobalOptions {
        settings: Some(settings),
        ..options(&temp)
    })
    .await
    .unwrap();
    assert!(context.settings.only_use_local_version);
    assert_eq!(context.settings.defaults.tab_width, Some(8));
    assert_eq!(context.root, temp.path());
}

#[tokio::test]
async fn test_invalid_settings_file_is_config_error() {
    let temp = project();
    let settings = temp.path().join("fmtbridge.yaml");
    fs::write(&settings, "tabWidth: 0\n").unwrap();

    let result = Context::build(&GlobalOptions {
        settings: Some(settings),
        ..options(&temp)
    })
    .await;
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[tokio::test]
async fn test_missing_bundled_install_fails() {
    let temp = project();
    let result = Context::build(&GlobalOptions {
        bundled: Some(temp.path().join("no-such-dir")),
        ..options(&temp)
    })
    .await;
    assert!(matches!(result, Err(CliError::Module(_))));
}

#[tokio::test]
async fn test_unknown_language_without_formatter() {
    let temp = project();
    let file = temp.path().join("src/a.ts");
    fs::write(&file, "a;\n").unwrap();

    let context = Context::build(&options(&temp)).await.unwrap();
    let document = context.document(&file, None).await.unwrap();
    assert_eq!(document.language_id, PLAIN_TEXT);
    assert_eq!(document.text, "a;\n");

    let document = context.document(&file, Some("typescript")).await.unwrap();
    assert_eq!(document.language_id, "typescript");
}

#[tokio::test]
async fn test_format_without_formatter_leaves_file() {
    let temp = project();
    let file = temp.path().join("src/a.ts");
    fs::write(&file, "a;\n").unwrap();

    let command = FormatCommand::new(options(&temp), file.clone())
        .with_write(true)
        .with_language(Some("typescript".into()));
    assert!(matches!(command.execute().await, Err(CliError::Internal(_))));
    assert_eq!(fs::read_to_string(&file).unwrap(), "a;\n");
}

#[tokio::test]
async fn test_format_rejects_bad_range_before_reading() {
    let temp = project();
    let command = FormatCommand::new(options(&temp), temp.path().join("missing.ts"))
        .with_range(Some("9:3".into()));
    assert!(matches!(
        command.execute().await,
        Err(CliError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn test_init_without_formatter_writes_nothing() {
    let temp = project();
    let command = InitCommand::new(options(&temp), None);

    assert!(matches!(command.execute().await, Err(CliError::NoFormatter(_))));
    assert!(!temp.path().join(".prettierrc").exists());
}
