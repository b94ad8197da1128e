use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_derive::Deserialize;
use walkdir::WalkDir;

// Case
//
//

#[derive(Clone, PartialEq, Eq)]
pub struct Case {
    pub suite: String,
    pub name: String,
    pub path: PathBuf,
}

impl Case {
    pub fn new(suite: String, path: PathBuf) -> Self {
        let name = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default();

        Self { suite, name, path }
    }

    pub fn content(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    pub fn expected(&self) -> Option<String> {
        let path = self.expected_path();
        fs::read_to_string(path).ok()
    }

    pub fn set_expected(&self, s: &str) -> io::Result<()> {
        fs::write(self.expected_path(), s)
    }

    /// `<suite>/<name>`, the text `--filter` is matched against.
    pub fn id(&self) -> String {
        format!("{}/{}", self.suite, self.name)
    }

    fn expected_path(&self) -> PathBuf {
        self.path.with_extension("expected")
    }
}

/// The `.src` files below a suite directory, in a stable order.
fn case_paths(path: &Path) -> Vec<PathBuf> {
    WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && path.extension() == Some(OsStr::new("src")))
        .collect()
}

// Suites
//
//

pub fn load(path: &Path) -> Vec<Suite> {
    WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| Suite::new(entry.into_path()))
        .collect()
}

/// The phase whose failure a suite expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailPhase {
    Lex,
    Parse,
    Check,
    Build,
}

impl FailPhase {
    pub fn name(self) -> &'static str {
        match self {
            FailPhase::Lex => "lex",
            FailPhase::Parse => "parse",
            FailPhase::Check => "check",
            FailPhase::Build => "build",
        }
    }
}

/// Each testsuite is configured by a `suite.toml` file whose contents
/// are described by this struct.
#[derive(Default, Deserialize, Clone)]
pub struct Config {
    /// In which phase the cases of the testsuite are supposed to fail.
    /// If this is none, then the testcases should succeed.
    pub fail: Option<FailPhase>,
    /// Human-readable description of what the tests in this suite are testing.
    #[serde(default)]
    pub description: String,
}

/// A single testsuite such as "fail-lex", "fail-check" or "success".
#[derive(Clone)]
pub struct Suite {
    /// The name of the testsuite.
    pub name: String,
    /// The parsed content of the `suite.toml` file.
    pub config: Config,
    /// The individual cases which belong to this testsuite.
    pub cases: Vec<Case>,
}

impl Suite {
    pub fn new(path: PathBuf) -> Self {
        let name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        // Read in the configuration from the `suite.toml` file.
        let config_path = path.join("suite.toml");
        let config = match fs::read_to_string(&config_path) {
            Ok(text) => toml::from_str(&text)
                .unwrap_or_else(|err| panic!("invalid {}: {err}", config_path.display())),
            Err(_) => Config::default(),
        };
        let cases = case_paths(&path).into_iter().map(|case| Case::new(name.clone(), case)).collect();

        Suite { name, config, cases }
    }
}
