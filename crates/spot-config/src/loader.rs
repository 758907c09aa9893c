//! Multi-file configuration loading.
//!
//! The entry file may name other files under `include`. Included files are
//! merged section by section; a section defined twice, or a file included
//! twice, is an error.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Loads a configuration file together with its includes.
pub struct ConfigLoader {
	/// Directory relative includes are resolved against.
	base_path: PathBuf,
	/// Canonical paths already read, for cycle detection.
	loaded_files: HashSet<PathBuf>,
	/// File each top-level section came from.
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads, merges and validates the configuration rooted at `config_path`.
	pub async fn load_config(&mut self, config_path: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let config_path = self.resolve_path(config_path)?;

		let main_content = self.load_file(&config_path).await?;
		let main_toml: toml::Value = toml::from_str(&main_content)?;
		let includes = extract_includes(&main_toml)?;

		if includes.is_empty() {
			return main_content.parse();
		}

		let combined = self.combine(main_toml, includes, config_path).await?;
		let combined = toml::to_string(&combined).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize combined config: {}", e))
		})?;
		combined.parse()
	}

	/// Reads a file once per load and resolves its environment references.
	async fn load_file(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical = tokio::fs::canonicalize(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		resolve_env_vars(&content)
	}

	async fn combine(
		&mut self,
		mut main_toml: toml::Value,
		includes: Vec<PathBuf>,
		main_path: PathBuf,
	) -> Result<toml::Value, ConfigError> {
		let Some(main_table) = main_toml.as_table_mut() else {
			return Err(ConfigError::Parse("configuration root must be a table".into()));
		};
		main_table.remove("include");
		for key in main_table.keys() {
			self.section_sources.insert(key.clone(), main_path.clone());
		}

		for include in includes {
			let path = self.resolve_path(&include)?;
			let content = self.load_file(&path).await?;
			let included: toml::Value = toml::from_str(&content)?;
			let Some(included) = included.as_table() else {
				continue;
			};

			for (key, value) in included {
				if key == "include" {
					return Err(ConfigError::Validation(format!(
						"Nested include in {} is not supported",
						path.display()
					)));
				}
				if let Some(existing) = self.section_sources.get(key) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}. \
						Each top-level section must be unique across all configuration files.",
						key,
						existing.display(),
						path.display()
					)));
				}
				self.section_sources.insert(key.clone(), path.clone());
				main_table.insert(key.clone(), value.clone());
			}
		}

		Ok(main_toml)
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}
		Ok(resolved)
	}
}

/// Reads `include = "file"` or `include = ["a", "b"]`.
fn extract_includes(toml: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	match toml.get("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.iter()
			.map(|item| {
				item.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("Include array must contain only strings".into())
				})
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::{contract_id, secret};
	use std::fs;
	use tempfile::TempDir;

	const NETWORK: &str = r#"
[network]
rpc_url = "https://soroban-testnet.stellar.org"
network_passphrase = "Test SDF Network ; September 2015"
poll_attempts = 10
"#;

	fn contract_section() -> String {
		format!("[contract]\nspot_contract_id = \"{}\"\n", contract_id())
	}

	fn accounts_section() -> String {
		format!("[accounts]\nadmin_secret = \"{}\"\n", secret(1))
	}

	#[tokio::test]
	async fn test_single_file_config() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("config.toml");
		fs::write(
			&path,
			format!("{}\n{}\n{}", NETWORK, contract_section(), accounts_section()),
		)
		.unwrap();

		let config = Config::from_file(path.to_str().unwrap()).await.unwrap();

		assert_eq!(config.network.poll_attempts, 10);
		assert_eq!(config.contract.spot_contract_id, contract_id());
	}

	#[tokio::test]
	async fn test_config_with_includes() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("main.toml"),
			format!("include = [\"network.toml\", \"accounts.toml\"]\n{}", contract_section()),
		)
		.unwrap();
		fs::write(dir.path().join("network.toml"), NETWORK).unwrap();
		fs::write(dir.path().join("accounts.toml"), accounts_section()).unwrap();

		let mut loader = ConfigLoader::new(dir.path());
		let config = loader.load_config("main.toml").await.unwrap();

		assert_eq!(config.network.poll_attempts, 10);
		assert_eq!(config.accounts.admin_secret.expose_secret(), secret(1));
	}

	#[tokio::test]
	async fn test_single_include_string() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("main.toml"),
			format!(
				"include = \"network.toml\"\n{}\n{}",
				contract_section(),
				accounts_section()
			),
		)
		.unwrap();
		fs::write(dir.path().join("network.toml"), NETWORK).unwrap();

		let mut loader = ConfigLoader::new(dir.path());
		assert!(loader.load_config("main.toml").await.is_ok());
	}

	#[tokio::test]
	async fn test_duplicate_section_error() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("main.toml"),
			format!("include = [\"dup.toml\"]\n{}", NETWORK),
		)
		.unwrap();
		fs::write(dir.path().join("dup.toml"), NETWORK).unwrap();

		let mut loader = ConfigLoader::new(dir.path());
		let err = loader.load_config("main.toml").await.unwrap_err();

		assert!(err.to_string().contains("Duplicate section 'network'"));
	}

	#[tokio::test]
	async fn test_self_include_detection() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("self.toml"),
			format!("include = [\"self.toml\"]\n{}", NETWORK),
		)
		.unwrap();

		let mut loader = ConfigLoader::new(dir.path());
		let err = loader.load_config("self.toml").await.unwrap_err();

		assert!(err.to_string().contains("already loaded"));
	}

	#[tokio::test]
	async fn test_missing_include_is_io_error() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("main.toml"),
			"include = [\"nowhere.toml\"]\n",
		)
		.unwrap();

		let mut loader = ConfigLoader::new(dir.path());
		let err = loader.load_config("main.toml").await.unwrap_err();

		assert!(matches!(err, ConfigError::Io(_)));
	}
}
