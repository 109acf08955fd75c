use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const TEMPLATE: &str = "version=@MBTOOL_VERSION@\nfirst=@FIRST_INDEX@\nlast=@LAST_INDEX@\n@ROM_MENU_ITEMS@";

#[test]
fn test_cli_generate_list_cycle() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Setup: template tree plus a ROM config directory
    let template_dir = tempdir()?;
    let android = template_dir.path().join("META-INF/com/google/android");
    fs::create_dir_all(&android)?;
    fs::write(android.join("aroma-config.in"), TEMPLATE)?;
    fs::write(android.join("update-binary"), b"#!/sbin/sh\n")?;

    let config_root = tempdir()?;
    fs::create_dir_all(config_root.path().join("primary"))?;
    fs::write(config_root.path().join("primary/config.json"), r#"{"name": "Stock"}"#)?;

    let out_dir = tempdir()?;
    let archive_path = out_dir.path().join("aroma.zip");

    // 2. Generate
    let mut cmd = Command::cargo_bin("mbpack")?;
    cmd.arg("generate")
        .arg(template_dir.path())
        .arg(&archive_path)
        .arg("--config-root")
        .arg(config_root.path())
        .arg("--rom")
        .arg("primary")
        .arg("--rom")
        .arg("dual");
    cmd.assert().success();

    assert!(archive_path.exists());

    // 3. List contents
    let mut cmd = Command::cargo_bin("mbpack")?;
    cmd.arg("list").arg(&archive_path);
    cmd.assert().success().stdout(
        predicate::str::contains("Archive Index (2 files)")
            .and(predicate::str::contains("META-INF/com/google/android/aroma-config ("))
            .and(predicate::str::contains("META-INF/com/google/android/update-binary"))
            .and(predicate::str::contains("aroma-config.in").not()),
    );

    // 4. Check the generated config
    let mut archive = zip::ZipArchive::new(fs::File::open(&archive_path)?)?;
    let mut config = String::new();
    std::io::Read::read_to_string(
        &mut archive.by_name("META-INF/com/google/android/aroma-config")?,
        &mut config,
    )?;
    assert_eq!(
        config,
        format!(
            "version={}\nfirst=3\nlast=4\n\"Stock\", \"\", \"@default\",\n\"dual\", \"\", \"@default\",\n",
            env!("CARGO_PKG_VERSION")
        )
    );

    Ok(())
}

#[test]
fn test_cli_generate_scans_roms_dir() -> Result<(), Box<dyn std::error::Error>> {
    let template_dir = tempdir()?;
    let android = template_dir.path().join("META-INF/com/google/android");
    fs::create_dir_all(&android)?;
    fs::write(android.join("aroma-config.in"), "@LAST_INDEX@")?;

    let roms_dir = tempdir()?;
    for id in ["dual", "primary", "data-slot-a"] {
        fs::create_dir(roms_dir.path().join(id))?;
    }
    let empty_configs = tempdir()?;

    let out_dir = tempdir()?;
    let archive_path = out_dir.path().join("aroma.zip");

    let mut cmd = Command::cargo_bin("mbpack")?;
    cmd.arg("generate")
        .arg(template_dir.path())
        .arg(&archive_path)
        .env("MBPACK_ROMS_DIR", roms_dir.path())
        .env("MBPACK_CONFIG_ROOT", empty_configs.path());
    cmd.assert().success();

    let mut archive = zip::ZipArchive::new(fs::File::open(&archive_path)?)?;
    let mut config = String::new();
    std::io::Read::read_to_string(
        &mut archive.by_name("META-INF/com/google/android/aroma-config")?,
        &mut config,
    )?;
    assert_eq!(config, "5");
    Ok(())
}

#[test]
fn test_cli_generate_missing_template_dir_fails() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = tempdir()?;
    let archive_path = out_dir.path().join("aroma.zip");

    let mut cmd = Command::cargo_bin("mbpack")?;
    cmd.arg("generate")
        .arg(out_dir.path().join("does-not-exist"))
        .arg(&archive_path)
        .arg("--rom")
        .arg("primary");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to generate"));

    // the output is still a closed, empty zip
    let archive = zip::ZipArchive::new(fs::File::open(&archive_path)?)?;
    assert_eq!(archive.len(), 0);
    Ok(())
}

#[test]
fn test_cli_requires_subcommand_arguments() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("mbpack")?;
    cmd.arg("generate").arg("only-one-path");
    cmd.assert().failure();

    let mut cmd = Command::cargo_bin("mbpack")?;
    cmd.arg("list").arg("/definitely/not/here.zip");
    cmd.assert().failure().stderr(predicate::str::contains("Error:"));
    Ok(())
}
