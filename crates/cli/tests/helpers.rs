use gp_recover::{engine_name_from_env, init_logging, DEFAULT_ENGINE};
use tempfile::tempdir;

#[test]
fn engine_name_comes_from_env_with_a_default() {
    // Default and override share one test; the environment is process wide.
    std::env::remove_var("GPREC_ENGINE");
    assert_eq!(engine_name_from_env(), DEFAULT_ENGINE);

    std::env::set_var("GPREC_ENGINE", "json-export");
    assert_eq!(engine_name_from_env(), "json-export");
    std::env::remove_var("GPREC_ENGINE");
}

#[test]
fn init_logging_appends_to_an_existing_file() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("run.log");
    std::fs::write(&path, "earlier run\n").expect("seed log");

    init_logging(&path).expect("install logger");
    log::info!("fresh line");

    let contents = std::fs::read_to_string(&path).expect("read log");
    assert!(contents.starts_with("earlier run"));
    assert!(contents.contains("fresh line"));
}
