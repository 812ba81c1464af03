use std::{env, fs, path::PathBuf, process::Command};

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "[[species]]\n"
        + "init = [ 0.0, 0.0, 0.0,]\n"
        + "beta = 20.0\n"
        + "de = 2.0\n"
        + "mue = 0.1\n"
        + "dl = 10.0\n"
        + "mul = 0.1\n"
        + "dp = 2.0\n"
        + "mup = 0.1\n"
        + "gamma = 1.0\n"
        + "k0 = 10.0\n"
        + "\n"
        + "[[species]]\n"
        + "init = [ 100.0, 50.0, 10.0,]\n"
        + "total_m = 20\n"
        + "beta = 21.2\n"
        + "de = 6.64\n"
        + "mue = 0.034\n"
        + "dl = 3.72\n"
        + "mul = 0.035\n"
        + "dp = 0.643\n"
        + "mup = 0.249\n"
        + "gamma = 13.25\n"
        + "k0 = 1000.0\n"
        + "model_seasonality = true\n"
        + "g0 = 0.28\n"
        + "g = [ -0.6, -0.2, 0.05,]\n"
        + "h = [ 0.5, -0.1, 0.02,]\n"
        + "\n"
        + "[population]\n"
        + "individuals = [ 120, 80,]\n"
        + "states = [ \"Sm\", \"Pm\", \"Im\", \"NonExistent\",]\n"
        + "adult_states = [ \"Sm\", \"Pm\", \"Im\",]\n"
        + "prob_init = [ 0.4, 0.1, 0.1, 0.4,]\n"
        + "prob_trans = [ [ 0.8, 0.1, 0.0, 0.1,], [ 0.0, 0.8, 0.1, 0.1,], [ 0.0, 0.0, 0.9, 0.1,], [ 0.3, 0.0, 0.0, 0.7,],]\n"
        + "\n"
        + "[output]\n"
        + "steps_per_save = 4\n"
        + "saves_per_file = 16\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    fn run_bin(args: &[&str]) {
        let bin = PathBuf::from(env!("CARGO_BIN_EXE_mosquito-ode"));

        let output = Command::new(bin)
            .args(args)
            .output()
            .expect("failed to execute command");

        let stdout_str =
            std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
        let stderr_str =
            std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

        assert!(
            output.status.success(),
            "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
        );
    }

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin(&["--sim-dir", test_dir_str, "create"]);
    run_bin(&["--sim-dir", test_dir_str, "create"]);

    run_bin(&["--sim-dir", test_dir_str, "resume", "--run-idx", "0"]);
    run_bin(&["--sim-dir", test_dir_str, "resume", "--run-idx", "1"]);
    run_bin(&["--sim-dir", test_dir_str, "status", "--run-idx", "1"]);

    for run in ["run-0000", "run-0001"] {
        for file in ["trajectory-0000.msgpack", "trajectory-0001.msgpack", "checkpoint.msgpack"] {
            assert!(test_dir.join(run).join(file).is_file(), "missing {run}/{file}");
        }
    }

    run_bin(&["--sim-dir", test_dir_str, "analyze"]);
    assert!(test_dir.join("run-0000").join("results.msgpack").is_file());

    run_bin(&["--sim-dir", test_dir_str, "clean"]);
    assert!(!test_dir.join("run-0000").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_config_fails() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("invalid_config");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");
    fs::write(test_dir.join("config.toml"), "[output]\nsteps_per_save = 1\n")
        .expect("failed to write config file");

    let output = Command::new(env!("CARGO_BIN_EXE_mosquito-ode"))
        .args(["--sim-dir", test_dir.to_str().unwrap(), "create"])
        .output()
        .expect("failed to execute command");
    assert!(!output.status.success());

    fs::remove_dir_all(&test_dir).ok();
}
