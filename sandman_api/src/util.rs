// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

/// Write a configuration template to the given path, which must not exist.
pub fn create_template(path: &str, content: &str) -> anyhow::Result<()> {
    anyhow::ensure!(!path.is_empty(), "empty path for the configuration template");
    match std::path::Path::new(&path).exists() {
        true => anyhow::bail!("cannot overwrite configuration file: {}", path),
        false => {
            std::fs::write(path, content)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_template_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orchestrator.toml");
        let path = path.to_str().unwrap();

        create_template(path, "a = 1\n").unwrap();
        assert_eq!("a = 1\n", std::fs::read_to_string(path).unwrap());

        assert!(create_template(path, "a = 2\n").is_err());
        assert_eq!("a = 1\n", std::fs::read_to_string(path).unwrap());

        assert!(create_template("", "a = 2\n").is_err());
    }
}
