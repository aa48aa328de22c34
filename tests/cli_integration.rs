use std::env;
use std::io::Cursor;
use std::path::PathBuf;
use std::process::Command;

fn get_binary_path() -> PathBuf {
    // When running tests via cargo test, CARGO_BIN_EXE_<name> is set
    let name = "token-factory";
    let path = env::var(format!("CARGO_BIN_EXE_{}", name))
        .expect("Could not find binary path via env var");
    PathBuf::from(path)
}

fn write_png(dir: &tempfile::TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let img = image::RgbaImage::new(width, height);
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode png");
    let path = dir.path().join(name);
    std::fs::write(&path, buf).expect("write png");
    path
}

#[test]
fn test_help_command() {
    let output = Command::new(get_binary_path())
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("token-factory"));
    assert!(stdout.contains("--network"));
    assert!(stdout.contains("validate-logo"));
}

#[test]
fn test_invalid_network_flag() {
    let output = Command::new(get_binary_path())
        .arg("--network")
        .arg("invalid_value")
        .arg("history")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid network"));
}

#[test]
fn test_validate_logo_accepts_recommended_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(&dir, "logo.png", 512, 512);

    let output = Command::new(get_binary_path())
        .arg("validate-logo")
        .arg(&path)
        .arg("--json")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"valid\": true"));
    assert!(stdout.contains("\"warnings\": []"));
}

#[test]
fn test_validate_logo_warns_on_off_size_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(&dir, "logo.png", 256, 256);

    let output = Command::new(get_binary_path())
        .arg("validate-logo")
        .arg(&path)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Recommended dimensions"));
}

#[test]
fn test_validate_logo_rejects_unknown_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logo.gif");
    std::fs::write(&path, b"GIF89a").unwrap();

    let output = Command::new(get_binary_path())
        .arg("validate-logo")
        .arg(&path)
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Invalid file type"));
}

#[test]
fn test_validate_logo_missing_file() {
    let output = Command::new(get_binary_path())
        .arg("validate-logo")
        .arg("/definitely/not/here.png")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read logo file"));
}
