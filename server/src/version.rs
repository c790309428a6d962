// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Build stamp of the service.

use std::env::consts::{ARCH, OS};
use std::fmt;

/// Value reported for stamp fields that were not provided at build time.
const UNKNOWN: &str = "unknown";

/// Details about the build of the running binary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildStamp {
    /// Version of the package.
    pub version: &'static str,

    /// Revision the binary was built from.
    pub commit: &'static str,

    /// Date the binary was built on.
    pub build_date: &'static str,

    /// Operating system and architecture the binary was built for.
    pub platform: String,
}

impl BuildStamp {
    /// Returns the stamp of the running binary.
    ///
    /// The commit and build date come from the `TENANCY_GIT_COMMIT` and `TENANCY_BUILD_DATE`
    /// variables at compilation time.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("TENANCY_GIT_COMMIT").unwrap_or(UNKNOWN),
            build_date: option_env!("TENANCY_BUILD_DATE").unwrap_or(UNKNOWN),
            platform: format!("{}/{}", OS, ARCH),
        }
    }
}

impl fmt::Display for BuildStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Version:    {}", self.version)?;
        writeln!(f, "Commit:     {}", self.commit)?;
        writeln!(f, "Build date: {}", self.build_date)?;
        write!(f, "Platform:   {}", self.platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current() {
        let stamp = BuildStamp::current();
        assert_eq!(env!("CARGO_PKG_VERSION"), stamp.version);
        assert!(!stamp.commit.is_empty());
        assert!(!stamp.build_date.is_empty());
        assert_eq!(format!("{}/{}", OS, ARCH), stamp.platform);
    }

    #[test]
    fn test_display() {
        let stamp = BuildStamp {
            version: "1.2.3",
            commit: "abcdef",
            build_date: "2024-01-31",
            platform: "linux/x86_64".to_owned(),
        };
        assert_eq!(
            "Version:    1.2.3\nCommit:     abcdef\nBuild date: 2024-01-31\nPlatform:   linux/x86_64",
            stamp.to_string()
        );
    }
}
