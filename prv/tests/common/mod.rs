#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a temporary project directory
pub struct TempProject {
    pub dir: TempDir,
}

impl TempProject {
    /// Create a new temporary project
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        Self { dir }
    }

    /// Get the path to the project directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file in the project with the given content
    pub fn create_file(&self, relative_path: &str, content: &str) {
        let file_path = self.dir.path().join(relative_path);

        // Create parent directories if needed
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Get the absolute path to a file in the project
    pub fn file_path(&self, relative_path: &str) -> PathBuf {
        self.dir.path().join(relative_path)
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Requirements that never need a registry lookup
pub fn sample_offline_requirements_txt() -> &'static str {
    r#"# References only
-r base-requirements.txt
-e .
../my-local-library/
./dist/custom_package-1.0.0-py3-none-any.whl
https://github.com/username/special-package.git@v1.0.0
"#
}

/// Requirements exercising every constraint form against `mock_registry`
pub fn sample_requirements_txt() -> &'static str {
    r#"# Sample requirements.txt
requests
flask>=2.0,<3.0   # web
numpy==1.24.0
pytest~=7.4
private-package
"#
}

/// Create a TempProject with the given requirements.txt content
pub fn create_temp_project_with_requirements(content: &str) -> TempProject {
    let project = TempProject::new();
    project.create_file("requirements.txt", content);
    project
}

/// Mount a PyPI JSON endpoint returning the given release keys
pub async fn mount_package(server: &MockServer, name: &str, versions: &[&str]) {
    let releases: serde_json::Map<String, serde_json::Value> = versions
        .iter()
        .map(|v| ((*v).to_string(), serde_json::json!([])))
        .collect();

    Mock::given(method("GET"))
        .and(path(format!("/{name}/json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "info": { "name": name },
            "releases": releases,
        })))
        .mount(server)
        .await;
}

/// A registry knowing requests, flask, numpy and pytest; anything else is 404
pub async fn mock_registry() -> MockServer {
    let server = MockServer::start().await;
    mount_package(&server, "requests", &["2.31.0", "2.32.3"]).await;
    mount_package(&server, "flask", &["1.1.4", "2.3.3", "3.0.0"]).await;
    mount_package(&server, "numpy", &["1.24.0", "1.26.4"]).await;
    mount_package(&server, "pytest", &["7.3.0", "7.4.4", "8.0.0"]).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(10)
        .mount(&server)
        .await;

    server
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_project_creation() {
        let project = TempProject::new();
        assert!(project.path().exists());
        assert!(project.path().is_dir());
    }

    #[test]
    fn test_create_file_with_subdirs() {
        let project = TempProject::new();
        project.create_file("subdir/test.txt", "hello");

        let file_path = project.file_path("subdir/test.txt");
        assert!(file_path.exists());
        assert_eq!(fs::read_to_string(file_path).unwrap(), "hello");
    }
}
