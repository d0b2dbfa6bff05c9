/*
 * Copyright 2024 Google LLC
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use kube::core::crd::v1::CustomResourceExt;

use crate::providers::k8s::ListenerResource;

/// Generates the `ListenerConfig` custom resource definition.
#[derive(clap::Args, Clone)]
pub struct GenerateCrd {
    /// Write the definition to this file instead of stdout.
    #[clap(short, long)]
    pub output: Option<std::path::PathBuf>,
}

impl GenerateCrd {
    pub fn generate_crd(&self) -> crate::Result<()> {
        let crd = serde_yaml::to_string(&ListenerResource::crd())?;

        match &self.output {
            Some(path) => {
                tracing::info!("Writing CRD to {}", path.display());
                std::fs::write(path, crd)?;
            }
            None => print!("{crd}"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_crd() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crd.yaml");
        GenerateCrd {
            output: Some(path.clone()),
        }
        .generate_crd()
        .unwrap();

        let crd = std::fs::read_to_string(path).unwrap();
        assert!(crd.contains("listenerconfigs.kxds.dev"));
        assert!(crd.contains("kind: CustomResourceDefinition"));
    }
}
