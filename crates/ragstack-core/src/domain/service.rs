//! Statically declared service descriptors.

use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

use super::error::{Result, StackError};
use super::image::ImageRef;
use super::request::{LaunchSelector, ServiceName, ServiceSelector};
use crate::config::StackConfig;

/// Immutable description of one managed service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub name: ServiceName,
    pub build_recipe_path: PathBuf,
    pub image_reference: ImageRef,
    pub archive_path: PathBuf,
    pub compose_name: String,
}

/// The two managed services, in declaration order.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCatalog {
    /// Build a catalog, rejecting descriptors that share an image reference,
    /// archive path or compose name.
    pub fn new(descriptors: Vec<ServiceDescriptor>) -> Result<Self> {
        for name in ServiceName::DECLARED {
            let count = descriptors.iter().filter(|d| d.name == name).count();
            if count != 1 {
                return Err(StackError::Config(format!(
                    "expected exactly one descriptor for {name}, found {count}"
                )));
            }
        }

        ensure_disjoint(&descriptors)?;
        Ok(Self::sorted(descriptors))
    }

    fn sorted(mut descriptors: Vec<ServiceDescriptor>) -> Self {
        descriptors.sort_by_key(|d| d.name);
        Self { descriptors }
    }

    pub fn from_config(config: &StackConfig) -> Result<Self> {
        config.validate()?;
        let descriptors = ServiceName::DECLARED
            .iter()
            .map(|&name| {
                let settings = config.settings(name);
                ServiceDescriptor {
                    name,
                    build_recipe_path: config.root.join(&settings.recipe),
                    image_reference: ImageRef::new(settings.image.clone()),
                    archive_path: config.artifacts_path().join(&settings.archive),
                    compose_name: settings.compose_name.clone(),
                }
            })
            .collect();
        Self::new(descriptors)
    }

    pub fn get(&self, name: ServiceName) -> &ServiceDescriptor {
        // `new` guarantees one descriptor per service, sorted by declaration.
        &self.descriptors[name.ordinal()]
    }

    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    /// Resolve a selector into the ordered list of descriptors to process.
    pub fn resolve(&self, selector: ServiceSelector) -> Vec<&ServiceDescriptor> {
        match selector {
            ServiceSelector::One(name) => vec![self.get(name)],
            ServiceSelector::All => self.descriptors.iter().collect(),
        }
    }

    /// Map the request selector onto the supervisor's vocabulary.
    pub fn launch_selector(&self, selector: ServiceSelector) -> LaunchSelector {
        match selector {
            ServiceSelector::One(name) => {
                LaunchSelector::Services(vec![self.get(name).compose_name.clone()])
            }
            ServiceSelector::All => LaunchSelector::All,
        }
    }
}

fn ensure_disjoint(descriptors: &[ServiceDescriptor]) -> Result<()> {
    let mut images = HashSet::new();
    let mut archives = HashSet::new();
    let mut compose_names = HashSet::new();
    for d in descriptors {
        if !images.insert(d.image_reference.as_str()) {
            return Err(StackError::Config(format!(
                "image reference {} is shared by more than one service",
                d.image_reference
            )));
        }
        if !archives.insert(d.archive_path.as_path()) {
            return Err(StackError::Config(format!(
                "archive path {} is shared by more than one service",
                d.archive_path.display()
            )));
        }
        if !compose_names.insert(d.compose_name.as_str()) {
            return Err(StackError::Config(format!(
                "compose service {} is shared by more than one service",
                d.compose_name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn descriptor(name: ServiceName, image: &str, archive: &str) -> ServiceDescriptor {
        ServiceDescriptor {
            name,
            build_recipe_path: PathBuf::from(format!("docker/{name}/Dockerfile")),
            image_reference: ImageRef::new(image),
            archive_path: PathBuf::from(archive),
            compose_name: format!("{name}-server"),
        }
    }

    #[test]
    fn test_default_catalog_layout() {
        let config = StackConfig::default().with_root("/srv/stack");
        let catalog = ServiceCatalog::from_config(&config).unwrap();

        let fastapi = catalog.get(ServiceName::Fastapi);
        assert_eq!(
            fastapi.build_recipe_path,
            Path::new("/srv/stack/docker/fastapi/Dockerfile")
        );
        assert_eq!(
            fastapi.archive_path,
            Path::new("/srv/stack/build/fastapi-image.tar")
        );
        assert_eq!(fastapi.compose_name, "fastapi-server");
        assert_eq!(
            catalog.get(ServiceName::Ollama).compose_name,
            "ollama-server"
        );
    }

    #[test]
    fn test_resolve_all_in_declared_order() {
        // Supplied out of order on purpose.
        let catalog = ServiceCatalog::new(vec![
            descriptor(ServiceName::Ollama, "o:latest", "o.tar"),
            descriptor(ServiceName::Fastapi, "f:latest", "f.tar"),
        ])
        .unwrap();

        let names: Vec<_> = catalog
            .resolve(ServiceSelector::All)
            .iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec![ServiceName::Fastapi, ServiceName::Ollama]);
    }

    #[test]
    fn test_resolve_single() {
        let catalog = ServiceCatalog::from_config(&StackConfig::default()).unwrap();
        let resolved = catalog.resolve(ServiceSelector::One(ServiceName::Ollama));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, ServiceName::Ollama);
    }

    #[test]
    fn test_shared_image_reference_rejected() {
        let err = ServiceCatalog::new(vec![
            descriptor(ServiceName::Fastapi, "same:latest", "f.tar"),
            descriptor(ServiceName::Ollama, "same:latest", "o.tar"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("same:latest"));
    }

    #[test]
    fn test_shared_archive_rejected() {
        let err = ServiceCatalog::new(vec![
            descriptor(ServiceName::Fastapi, "f:latest", "x.tar"),
            descriptor(ServiceName::Ollama, "o:latest", "x.tar"),
        ])
        .unwrap_err();
        assert!(matches!(err, StackError::Config(_)));
    }

    #[test]
    fn test_missing_descriptor_rejected() {
        let err = ServiceCatalog::new(vec![descriptor(ServiceName::Fastapi, "f:1", "f.tar")])
            .unwrap_err();
        assert!(err.to_string().contains("ollama"));
    }

    #[test]
    fn test_launch_selector_mapping() {
        let catalog = ServiceCatalog::from_config(&StackConfig::default()).unwrap();
        assert_eq!(
            catalog.launch_selector(ServiceSelector::One(ServiceName::Fastapi)),
            LaunchSelector::Services(vec!["fastapi-server".to_string()])
        );
        assert_eq!(
            catalog.launch_selector(ServiceSelector::All),
            LaunchSelector::All
        );
    }
}
