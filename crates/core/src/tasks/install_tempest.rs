use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fs;

use tracing::{debug, warn};

use crate::cloud::{CloudLookup, Credentials};
use crate::lifecycle::Lifecycle;
use crate::tasks::TaskBinding;
use crate::template::{self, TEMPEST_TEMPLATE};
use crate::types::ArestorResult;

const REPO: &str = "git+https://github.com/openstack/tempest.git";

/// Installs Tempest and writes its configuration file into the venv
pub struct InstallTempest {
    binding: TaskBinding,
    credentials: Credentials,
    cloud: OnceCell<CloudLookup>,
}

impl InstallTempest {
    pub fn new(binding: TaskBinding) -> Self {
        Self::with_credentials(binding, Credentials::from_env())
    }

    pub fn with_credentials(binding: TaskBinding, credentials: Credentials) -> Self {
        Self {
            binding,
            credentials,
            cloud: OnceCell::new(),
        }
    }

    fn cloud(&self) -> &CloudLookup {
        self.cloud.get_or_init(|| {
            CloudLookup::new(self.binding.executor().clone(), self.credentials.clone())
        })
    }

    /// Values substituted into the Tempest config template
    fn config_values(&self) -> ArestorResult<BTreeMap<String, String>> {
        let settings = self.binding.settings();
        let mut values = BTreeMap::new();
        values.insert("flavor_ref".to_string(), settings.flavor.clone());
        values.insert("flavor_ref_alt".to_string(), settings.flavor.clone());

        let credentials = [
            ("admin_tenant_name", &self.credentials.tenant_name),
            ("admin_password", &self.credentials.password),
            ("admin_username", &self.credentials.username),
        ];
        for (key, value) in credentials {
            if let Some(value) = value {
                values.insert(key.to_string(), value.clone());
            }
        }

        if !self.credentials.is_complete() {
            warn!("OS_AUTH_URL is not set, cloud specific Tempest options keep their defaults");
            return Ok(values);
        }

        let cloud = self.cloud();
        let image = cloud.image_id(&settings.image_pattern)?;
        let lookups = [
            ("image_ref", image.clone()),
            ("image_ref_alt", image),
            ("admin_tenant_id", cloud.tenant_id()?),
            ("default_network", cloud.network_cidr(&settings.public_network)?),
            ("public_router_id", cloud.router_id(&settings.router)?),
            ("public_network_id", cloud.network_id(&settings.public_network)?),
        ];
        for (key, value) in lookups {
            match value {
                Some(value) => {
                    values.insert(key.to_string(), value);
                }
                None => warn!("Could not resolve {} for the Tempest config", key),
            }
        }
        Ok(values)
    }

    fn write_config(&self) -> ArestorResult<()> {
        let destination = self
            .binding
            .require_venv(self.name())?
            .join("etc")
            .join("tempest.conf");

        let template = match &self.binding.settings().tempest_template {
            Some(path) => fs::read_to_string(path)?,
            None => TEMPEST_TEMPLATE.to_string(),
        };

        template::write_config(&template, &self.config_values()?, &destination)?;
        debug!("Tempest config written to {}", destination.display());
        Ok(())
    }
}

impl Lifecycle for InstallTempest {
    fn name(&self) -> &'static str {
        "InstallTempest"
    }

    fn work(&mut self) -> ArestorResult<Option<String>> {
        let requirement = format!("{}@{}", REPO, self.binding.args().tempest_branch);
        self.binding.pip_install(&requirement)?;
        Ok(None)
    }

    fn epilogue(&mut self) -> ArestorResult<()> {
        self.binding.verify_import("tempest")?;
        self.write_config()?;
        debug!("{:?} in epilogue section", self.name());
        Ok(())
    }
}
