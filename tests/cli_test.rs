use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn round_trip_test(format: &str,data: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let raw_path = temp_dir.path().join("raw.bin");
    let cmp_path = temp_dir.path().join("cmp.bin");
    let out_path = temp_dir.path().join("out.bin");
    std::fs::write(&raw_path,data)?;
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("compress")
        .arg("-f").arg(format)
        .arg("-i").arg(&raw_path)
        .arg("-o").arg(&cmp_path)
        .assert()
        .success();
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("expand")
        .arg("-f").arg(format)
        .arg("-i").arg(&cmp_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();
    assert_eq!(std::fs::read(out_path)?,data);
    Ok(())
}

#[test]
fn kosinski_round_trip() -> STDRESULT {
    round_trip_test("kosinski",b"This is the chaunt of the priests. The chaunt of the priests of Mung.")
}

#[test]
fn nemesis_round_trip() -> STDRESULT {
    round_trip_test("nemesis",&[0x11u8;64])
}

#[test]
fn snkrle_round_trip() -> STDRESULT {
    round_trip_test("snkrle",&[0xAA,0xAA,0xAA,0xBB,0xCC,0xCC])
}

#[test]
fn moduled_round_trip() -> STDRESULT {
    let data: Vec<u8> = (0..=255u8).cycle().take(300).collect();
    let temp_dir = tempfile::tempdir()?;
    let raw_path = temp_dir.path().join("raw.bin");
    let cmp_path = temp_dir.path().join("cmp.bin");
    let out_path = temp_dir.path().join("out.bin");
    std::fs::write(&raw_path,&data)?;
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("compress")
        .arg("-f").arg("kosinski").arg("-m")
        .arg("-i").arg(&raw_path)
        .arg("-o").arg(&cmp_path)
        .assert()
        .success();
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("expand")
        .arg("-f").arg("kosinski").arg("-m")
        .arg("-i").arg(&cmp_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();
    assert_eq!(std::fs::read(out_path)?,data);
    Ok(())
}

#[test]
fn crunch_canonicalizes() -> STDRESULT {
    let data = b"abcabcabcabc something something".to_vec();
    let temp_dir = tempfile::tempdir()?;
    let raw_path = temp_dir.path().join("raw.bin");
    let cmp_path = temp_dir.path().join("cmp.bin");
    let crunched_path = temp_dir.path().join("crunched.bin");
    std::fs::write(&raw_path,&data)?;
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("compress")
        .arg("-f").arg("kosplus")
        .arg("-i").arg(&raw_path)
        .arg("-o").arg(&cmp_path)
        .assert()
        .success();
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("crunch")
        .arg("-f").arg("kosplus")
        .arg("-i").arg(&cmp_path)
        .arg("-o").arg(&crunched_path)
        .assert()
        .success();
    // the encoder's own output is already canonical
    assert_eq!(std::fs::read(crunched_path)?,std::fs::read(cmp_path)?);
    Ok(())
}

#[test]
fn nemesis_info_prints_end_offset() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let raw_path = temp_dir.path().join("raw.bin");
    let cmp_path = temp_dir.path().join("cmp.bin");
    let out_path = temp_dir.path().join("out.bin");
    std::fs::write(&raw_path,[0u8;32])?;
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("compress")
        .arg("-f").arg("nemesis")
        .arg("-i").arg(&raw_path)
        .arg("-o").arg(&cmp_path)
        .assert()
        .success();
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("expand")
        .arg("-f").arg("nemesis").arg("-n")
        .arg("-i").arg(&cmp_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("0x"));
    Ok(())
}

#[test]
fn missing_input_exits_2() -> STDRESULT {
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("compress")
        .arg("-f").arg("kosinski")
        .arg("-i").arg("no_such_file.bin")
        .arg("-o").arg("unused.bin")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("could not be opened"));
    Ok(())
}

#[test]
fn invalid_combination_exits_4() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("in.bin");
    std::fs::write(&in_path,[0u8;4])?;
    // --info is a nemesis affair
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("expand")
        .arg("-f").arg("kosinski").arg("-n")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(temp_dir.path().join("out.bin"))
        .assert()
        .failure()
        .code(4);
    // padding must be a power of two
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("compress")
        .arg("-f").arg("kosinski").arg("-m")
        .arg("-p").arg("12")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(temp_dir.path().join("out.bin"))
        .assert()
        .failure()
        .code(4);
    Ok(())
}

#[test]
fn missing_subcommand_exits_1() -> STDRESULT {
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.assert().failure().code(1);
    Ok(())
}

#[test]
fn artc42_is_unimplemented() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("in.bin");
    std::fs::write(&in_path,[0u8;4])?;
    let mut cmd = Command::cargo_bin("megacomp")?;
    cmd.arg("compress")
        .arg("-f").arg("artc42")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(temp_dir.path().join("out.bin"))
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("placeholder"));
    Ok(())
}
