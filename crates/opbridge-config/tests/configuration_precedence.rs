//! Behavioural tests for configuration layer precedence.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use opbridge_config::{
    Config, WithDefaultsMode, default_log_filter, default_log_format,
    default_operation_datastore, default_with_defaults,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Layers collected by the steps before the configuration is loaded.
#[derive(Default)]
struct Layers {
    args: Vec<OsString>,
    saved_env: Vec<(String, Option<OsString>)>,
    outcome: Option<Result<Config, String>>,
}

struct PrecedenceWorld {
    scratch: TempDir,
    layers: RefCell<Layers>,
    _env_lock: MutexGuard<'static, ()>,
}

impl PrecedenceWorld {
    fn new() -> Self {
        Self {
            scratch: TempDir::new().expect("scratch directory"),
            layers: RefCell::new(Layers {
                args: vec![OsString::from("opbridge")],
                ..Layers::default()
            }),
            // Scenarios share the process environment.
            _env_lock: ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    fn add_file_layer(&self, mode: WithDefaultsMode) {
        let path = self.scratch.path().join("opbridge.toml");
        fs::write(&path, format!("with_defaults = \"{mode}\"\n")).expect("write configuration");
        let mut layers = self.layers.borrow_mut();
        layers.args.push(OsString::from("--config-path"));
        layers.args.push(path.into_os_string());
    }

    fn add_env_layer(&self, key: &str, value: &str) {
        self.layers
            .borrow_mut()
            .saved_env
            .push((key.to_owned(), std::env::var_os(key)));
        // Environment mutation is `unsafe` on edition 2024.
        unsafe { std::env::set_var(key, value) };
    }

    fn add_cli_flag(&self, flag: &str, value: &str) {
        let mut layers = self.layers.borrow_mut();
        layers.args.push(OsString::from(flag));
        layers.args.push(OsString::from(value));
    }

    fn resolve(&self) -> Config {
        let mut layers = self.layers.borrow_mut();
        let args = layers.args.clone();
        let outcome = layers
            .outcome
            .get_or_insert_with(|| Config::load_from_iter(args).map_err(|error| error.to_string()));
        match outcome {
            Ok(config) => config.clone(),
            Err(error) => panic!("configuration failed to load: {error}"),
        }
    }
}

impl Drop for PrecedenceWorld {
    fn drop(&mut self) {
        let saved = std::mem::take(&mut self.layers.get_mut().saved_env);
        for (key, previous) in saved.into_iter().rev() {
            match previous {
                Some(value) => unsafe { std::env::set_var(&key, value) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}

fn mode(text: &str) -> WithDefaultsMode {
    text.parse()
        .unwrap_or_else(|error| panic!("invalid with-defaults mode '{text}': {error}"))
}

#[fixture]
fn world() -> PrecedenceWorld {
    PrecedenceWorld::new()
}

#[given("a configuration file setting with-defaults to \"{value}\"")]
fn given_file(world: &PrecedenceWorld, value: String) {
    world.add_file_layer(mode(&value));
}

#[given("the environment overrides with-defaults to \"{value}\"")]
fn given_environment(world: &PrecedenceWorld, value: String) {
    world.add_env_layer("OPBRIDGE_WITH_DEFAULTS", &value);
}

#[when("the CLI sets with-defaults to \"{value}\"")]
fn when_cli(world: &PrecedenceWorld, value: String) {
    world.add_cli_flag("--with-defaults", &value);
}

#[when("the configuration loads without overrides")]
fn when_plain_load(world: &PrecedenceWorld) {
    let _ = world.resolve();
}

#[then("loading the configuration resolves with-defaults to \"{value}\"")]
fn then_mode(world: &PrecedenceWorld, value: String) {
    assert_eq!(world.resolve().with_defaults(), mode(&value));
}

#[then("loading the configuration applies the built-in defaults")]
fn then_built_in(world: &PrecedenceWorld) {
    let config = world.resolve();
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert_eq!(config.with_defaults(), default_with_defaults());
    assert_eq!(config.operation_datastore(), default_operation_datastore());
}

#[scenario(path = "tests/features/configuration_precedence.feature", index = 0)]
fn built_in_defaults(#[from(world)] world: PrecedenceWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/configuration_precedence.feature", index = 1)]
fn file_overrides_defaults(#[from(world)] world: PrecedenceWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/configuration_precedence.feature", index = 2)]
fn environment_overrides_file(#[from(world)] world: PrecedenceWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/configuration_precedence.feature", index = 3)]
fn cli_overrides_environment(#[from(world)] world: PrecedenceWorld) {
    let _ = world;
}
