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

//! Test utilities shared by the crates of the workspace.

pub use paste::paste;

/// Instantiates the `module::name` test for the backend configured by `setup`.
///
/// The `extra` metadata parameter can be used to tag the generated tests.
#[macro_export]
macro_rules! generate_one_test [
    ( $name:ident, $setup:expr, $module:path $(, #[$extra:meta] )? ) => {
        #[tokio::test]
        $(#[$extra])?
        async fn $name() {
            $crate::testutils::paste! {
                $module :: [< $name >]($setup).await;
            }
        }
    }
];

pub use generate_one_test;

/// Instantiates a collection of tests for a specific backend.
///
/// The backend to run the tests against is determined by the `setup` expression, which needs to
/// return a fresh and empty instance of the backend for every test.
///
/// The `extra` metadata parameter can be used to tag the generated tests.
#[macro_export]
macro_rules! generate_tests [
    ( #[$extra:meta], $setup:expr, $module:path $(, $name:ident)+ ) => {
        $(
            $crate::testutils::generate_one_test!($name, $setup, $module, #[$extra]);
        )+
    };

    ( $setup:expr, $module:path $(, $name:ident)+ ) => {
        $(
            $crate::testutils::generate_one_test!($name, $setup, $module);
        )+
    };
];

pub use generate_tests;

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static SETUPS: AtomicUsize = AtomicUsize::new(0);

    /// Fake backend setup that records how many times it was called.
    async fn setup() -> usize {
        SETUPS.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Collection of tests to instantiate.
    mod cases {
        pub(super) async fn test_one(id: usize) {
            assert!(id > 0);
        }

        pub(super) async fn test_two(id: usize) {
            assert!(id > 0);
        }
    }

    generate_tests!(setup().await, cases, test_one, test_two);
}
