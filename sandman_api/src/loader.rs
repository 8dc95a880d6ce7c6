// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("service description not found: {0}")]
    NotFound(String),
    #[error("malformed service description {path}: {reason}")]
    ParseFailure { path: String, reason: String },
}

/// Turns the path of a service package into parsed service data.
pub trait DescriptorLoaderAPI: Send + Sync {
    fn parse_service_description(&self, path: &str) -> Result<crate::descriptor::ServiceData, DescriptorError>;
}

/// Loader of service descriptions stored as a single JSON document:
/// `{ "nsd": { ... }, "vnfds": [ ... ] }`.
#[derive(Clone, Default)]
pub struct JsonFileLoader {}

impl DescriptorLoaderAPI for JsonFileLoader {
    fn parse_service_description(&self, path: &str) -> Result<crate::descriptor::ServiceData, DescriptorError> {
        log::debug!("Loading service description from {}", path);
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Err(DescriptorError::NotFound(path.to_string())),
            Err(err) => {
                return Err(DescriptorError::ParseFailure {
                    path: path.to_string(),
                    reason: err.to_string(),
                })
            }
        };
        let data: crate::descriptor::ServiceData = serde_json::from_str(&content).map_err(|err| DescriptorError::ParseFailure {
            path: path.to_string(),
            reason: err.to_string(),
        })?;
        if data.nsd.network_functions.is_empty() {
            return Err(DescriptorError::ParseFailure {
                path: path.to_string(),
                reason: "the service has no network functions".to_string(),
            });
        }
        log::info!(
            "Loaded service {} with {} network functions, {} descriptors",
            data.nsd.name,
            data.nsd.network_functions.len(),
            data.vnfds.len()
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SERVICE: &str = r##"{
  "nsd": {
    "vendor": "eu.sonata-nfv",
    "name": "sonata-demo",
    "version": "0.1",
    "network_functions": [
      { "vnf_id": "vnf_firewall", "vnf_vendor": "eu.sonata-nfv", "vnf_name": "firewall-vnf", "vnf_version": "0.1" }
    ],
    "connection_points": [ { "id": "ns:input", "interface": "ipv4", "type": "external" } ],
    "virtual_links": [
      { "id": "input-2-fw", "connectivity_type": "E-Line", "connection_points_reference": ["ns:input", "vnf_firewall:input"] }
    ]
  },
  "vnfds": [
    {
      "vendor": "eu.sonata-nfv",
      "name": "firewall-vnf",
      "version": "0.1",
      "virtual_deployment_units": [
        { "id": "vdu01", "vm_image": "sonata-fw", "resource_requirements": { "cpu": 1, "memory": 2, "storage": 10 } }
      ]
    }
  ]
}"##;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_service_description() {
        let file = write_file(SERVICE);
        let data = JsonFileLoader::default()
            .parse_service_description(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!("sonata-demo", data.nsd.name);
        assert_eq!(1, data.vnfds.len());
        assert!(data.has_access_point("ns:input"));
        let nf = data.network_function("vnf_firewall").unwrap();
        assert_eq!(1.0, data.vnfd(nf).unwrap().resource_requirements().cpu);
    }

    #[test]
    fn test_load_errors() {
        match JsonFileLoader::default().parse_service_description("/this/path/does/not/exist.json") {
            Err(DescriptorError::NotFound(_)) => {}
            _ => panic!("expected not found"),
        }

        let file = write_file("{ \"nsd\": 42 }");
        match JsonFileLoader::default().parse_service_description(file.path().to_str().unwrap()) {
            Err(DescriptorError::ParseFailure { .. }) => {}
            _ => panic!("expected parse failure"),
        }
    }
}
