use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn phonelist_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_phonelist"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("phonelist.toml"),
        r#"[processing]
chunk_size = 2
download_type = "separated"
remove_duplicates = true
"#,
    )
    .unwrap();

    fs::write(
        root.join("contatos.csv"),
        "Nome;Celular\nAlice;(11) 99999-8888\nBob;21988887777\nCarla;11 97777-6666\nAlice;11999998888\n",
    )
    .unwrap();

    (tmp, config_dir.join("phonelist.toml"))
}

fn run_phonelist(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = phonelist_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run phonelist binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_process_writes_chunked_archive() {
    let (tmp, config) = setup_test_env();
    let input = tmp.path().join("contatos.csv");
    let output = tmp.path().join("out").join("lista.zip");

    let (stdout, stderr, success) = run_phonelist(
        &config,
        &["process", input.to_str().unwrap(), "-o", output.to_str().unwrap()],
    );
    assert!(success, "process failed: {}", stderr);
    assert!(stdout.contains("lista_001.xlsx"));
    assert!(stdout.contains("lista_002.xlsx"));

    let file = fs::File::open(&output).unwrap();
    let zip = zip::ZipArchive::new(file).unwrap();
    assert_eq!(zip.len(), 3);
}

#[test]
fn test_process_grouped_keeps_duplicates() {
    let (tmp, config) = setup_test_env();
    let input = tmp.path().join("contatos.csv");
    let output = tmp.path().join("lista.zip");

    let (stdout, stderr, success) = run_phonelist(
        &config,
        &[
            "process",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--grouped",
            "--keep-duplicates",
        ],
    );
    assert!(success, "process failed: {}", stderr);
    assert!(stdout.contains("lista_completa.xlsx"));

    let line = stdout
        .lines()
        .find(|l| l.contains("Total contacts:"))
        .unwrap();
    assert!(line.trim_end().ends_with('4'), "unexpected line: {}", line);
}

#[test]
fn test_inspect_reports_columns() {
    let (tmp, config) = setup_test_env();
    let input = tmp.path().join("contatos.csv");

    let (stdout, stderr, success) = run_phonelist(&config, &["inspect", input.to_str().unwrap()]);
    assert!(success, "inspect failed: {}", stderr);
    assert!(stdout.contains("name via keyword"));
    assert!(stdout.contains("phone via keyword"));
    assert!(stdout.contains("Valid contacts:  3"));
    assert!(stdout.contains("Duplicates:      1"));
}

#[test]
fn test_process_rejects_unrecognized_columns() {
    let (tmp, config) = setup_test_env();
    let input = tmp.path().join("vazio.csv");
    fs::write(&input, "Coluna 1,Coluna 2\nFoo,Bar\n").unwrap();

    let (_, stderr, success) = run_phonelist(&config, &["process", input.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Não foi possível identificar colunas"));
}

#[test]
fn test_missing_config_uses_defaults() {
    let (tmp, _) = setup_test_env();
    let input = tmp.path().join("contatos.csv");
    let output = tmp.path().join("lista.zip");
    let absent = tmp.path().join("absent.toml");

    let (stdout, stderr, success) = run_phonelist(
        &absent,
        &["process", input.to_str().unwrap(), "-o", output.to_str().unwrap()],
    );
    assert!(success, "process failed: {}", stderr);
    assert!(stdout.contains("lista_001.xlsx"));
    assert!(!stdout.contains("lista_002.xlsx"));
}
