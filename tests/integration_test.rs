use std::fs;
use std::path::Path;
use std::process::Command;

/// Nothing listens here, so every API call is refused straight away.
const DEAD_API: &str = "http://127.0.0.1:1";

const ROUTE: &str = "ticketInfo/Ana/ana%40example.com/999/XP100/2025-05-01/2025-06-13/08%3A30%3A00/2025-06-13/10%3A15%3A00/150.0/555.0/Tarjeta";

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_xpectrum"))
}

fn output_dir() -> &'static Path {
    Path::new("tests/output")
}

fn setup() {
    fs::create_dir_all(output_dir()).expect("Failed to create output directory");
}

fn cleanup_file(name: &str) {
    let path = output_dir().join(name);
    if path.exists() {
        fs::remove_file(&path).ok();
    }
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_barcode_png() {
    setup();
    let output_file = "test-barcode.png";
    cleanup_file(output_file);

    let output = cargo_bin()
        .args([
            "barcode", "W6LTWP 2017-07-13",
            "-o", &format!("tests/output/{}", output_file),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);

    let path = output_dir().join(output_file);
    assert!(path.exists(), "PNG file was not created");
    let img = image::open(&path).expect("barcode is a readable image");
    assert_eq!(img.height(), 80);
}

#[test]
fn test_qr_png_then_scan_with_unreachable_api() {
    setup();
    let output_file = "test-qr-xp100.png";
    cleanup_file(output_file);
    let qr_path = format!("tests/output/{}", output_file);

    let output = cargo_bin()
        .args(["qr", "XP100", "-o", &qr_path])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Command failed: {:?}", output);

    let output = cargo_bin()
        .args(["scan", &qr_path, "--base-url", DEAD_API])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Lookup against a dead API should fail");
    assert!(
        stderr_of(&output).contains("No se encontró información para este QR"),
        "unexpected stderr: {}",
        stderr_of(&output)
    );
}

#[test]
fn test_scan_image_without_code() {
    let output = cargo_bin()
        .args(["scan", "assets/logo.png", "--base-url", DEAD_API])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("No se pudo leer el QR de la imagen"));
}

#[test]
fn test_scan_missing_image() {
    let output = cargo_bin()
        .args(["scan", "tests/output/does-not-exist.png"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("Error al procesar la imagen"));
}

#[test]
fn test_lookup_blank_payload() {
    let output = cargo_bin()
        .args(["lookup", "  ", "--base-url", DEAD_API])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Blank payload should not succeed");
}

#[test]
fn test_flights_with_unreachable_api() {
    let output = cargo_bin()
        .args(["flights", "--base-url", DEAD_API])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("No se encontraron vuelos"));
}

#[test]
fn test_pdf_from_route() {
    let dir = "tests/output/pdf-with-logo";
    fs::create_dir_all(dir).expect("Failed to create output directory");

    let output = cargo_bin()
        .args(["pdf", ROUTE, "--output-dir", dir, "--logo", "assets/logo.png"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(String::from_utf8_lossy(&output.stdout)
        .contains("PDF guardado en Descargas: BoardingPass-Ana-XP100.pdf"));

    let path = Path::new(dir).join("BoardingPass-Ana-XP100.pdf");
    let metadata = fs::metadata(&path).expect("Failed to get file metadata");
    assert!(metadata.len() > 1000, "PDF file is too small, likely empty or corrupt");
}

#[test]
fn test_pdf_with_missing_logo_still_written() {
    let dir = "tests/output/pdf-without-logo";
    fs::create_dir_all(dir).expect("Failed to create output directory");
    let path = Path::new(dir).join("BoardingPass-Ana-XP100.pdf");
    if path.exists() {
        fs::remove_file(&path).ok();
    }

    let output = cargo_bin()
        .args(["pdf", ROUTE, "--output-dir", dir, "--logo", "tests/output/no-logo.png"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(path.exists(), "PDF file was not created");
}

#[test]
fn test_bundled_logo_from_other_working_directory() {
    let workdir = tempfile::tempdir().expect("temp working directory");
    let with_logo = workdir.path().join("bundled");
    let text_only = workdir.path().join("text-only");

    let output = cargo_bin()
        .current_dir(workdir.path())
        .args(["pdf", ROUTE, "--output-dir", with_logo.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(!stderr_of(&output).contains("logo unavailable"));

    let output = cargo_bin()
        .current_dir(workdir.path())
        .args([
            "pdf", ROUTE,
            "--output-dir", text_only.to_str().unwrap(),
            "--logo", "missing-logo.png",
        ])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Command failed: {:?}", output);

    let name = "BoardingPass-Ana-XP100.pdf";
    let bundled_size = fs::metadata(with_logo.join(name)).expect("PDF with logo").len();
    let text_size = fs::metadata(text_only.join(name)).expect("text-only PDF").len();
    assert!(
        bundled_size > text_size + 1000,
        "logo missing from PDF: {} vs {} bytes",
        bundled_size,
        text_size
    );
}

#[test]
fn test_invalid_route() {
    let output = cargo_bin()
        .args(["pdf", "pasajeros/XP100", "--output-dir", "tests/output"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed for a bad route");
}

#[test]
fn test_invalid_config_timeout() {
    setup();
    let config_path = output_dir().join("zero-timeout.toml");
    fs::write(&config_path, "[api]\nconnect_timeout_ms = 0\n").expect("write config");

    let output = cargo_bin()
        .args(["flights", "--config", config_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("invalid configuration"));
}
