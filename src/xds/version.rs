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

/// Accumulates the resource versions of every source object that contributed
/// to a response into one aggregate version.
///
/// The aggregate only depends on the multiset of versions added, not on the
/// order they were added in.
#[derive(Clone, Debug, Default)]
pub struct VersionBuilder {
    versions: Vec<String>,
}

impl VersionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, version: impl Into<String>) {
        self.versions.push(version.into());
    }

    pub fn build(mut self) -> String {
        self.versions.sort_unstable();

        let mut hasher = seahash::SeaHasher::new();
        for version in &self.versions {
            std::hash::Hasher::write(&mut hasher, version.as_bytes());
            // Separator, so that ["ab", "c"] and ["a", "bc"] differ.
            std::hash::Hasher::write_u8(&mut hasher, 0xff);
        }

        format!("{:016x}", std::hash::Hasher::finish(&hasher))
    }
}

impl<S: Into<String>> Extend<S> for VersionBuilder {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        self.versions.extend(iter.into_iter().map(Into::into));
    }
}
