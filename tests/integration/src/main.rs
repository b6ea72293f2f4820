//! Integration Test Harness
//!
//! Runs every integration test category and prints a summary.
//!
//! # Usage
//!
//! Run all tests:
//! ```text
//! cargo run -p integration-tests
//! ```
//!
//! Run one category:
//! ```text
//! cargo test -p integration-tests --test codec_tests
//! cargo test -p integration-tests --test collection_tests
//! cargo test -p integration-tests --test job_tests
//! ```
//!
//! Run with increased logging:
//! ```text
//! RUST_LOG=orpc=debug cargo run -p integration-tests
//! ```

use std::process::Command;
use std::time::{Duration, Instant};

/// Test category
#[derive(Debug, Clone)]
struct TestCategory {
    name: &'static str,
    description: &'static str,
    test_name: &'static str,
}

const TEST_CATEGORIES: &[TestCategory] = &[
    TestCategory {
        name: "Codec Tests",
        description: "Framing, embedded OBJREFs, referents, closed enumerations",
        test_name: "codec_tests",
    },
    TestCategory {
        name: "Dispatch Tests",
        description: "Opnum routing through inherited interfaces",
        test_name: "dispatch_tests",
    },
    TestCategory {
        name: "Invocation Tests",
        description: "Typed calls, failure statuses, binding errors",
        test_name: "invocation_tests",
    },
    TestCategory {
        name: "Lifecycle Tests",
        description: "RemQueryInterface, RemAddRef and RemRelease",
        test_name: "lifecycle_tests",
    },
    TestCategory {
        name: "Collection Tests",
        description: "Enumeration, editing and commit of collections",
        test_name: "collection_tests",
    },
    TestCategory {
        name: "Job Tests",
        description: "Run, cancel and wait on long-running jobs",
        test_name: "job_tests",
    },
];

fn print_banner() {
    println!(r#"
================================================================================
      ___  ____  ____   ____   ___       _            _
     / _ \|  _ \|  _ \ / ___| |_ _|_ __ | |_ ___  ___| |_
    | | | | |_) | |_) | |      | || '_ \| __/ _ \/ __| __|
    | |_| |  _ <|  __/| |___   | || | | | ||  __/\__ \ |_
     \___/|_| \_\_|    \____| |___|_| |_|\__\___||___/\__|

                      Object RPC Integration Suite
================================================================================
"#);
}

fn print_test_categories() {
    println!("Test Categories:");
    println!("{}", "-".repeat(80));
    for (i, cat) in TEST_CATEGORIES.iter().enumerate() {
        println!("  {}. {} - {}", i + 1, cat.name, cat.description);
    }
    println!("{}", "-".repeat(80));
    println!();
}

fn run_test_category(category: &TestCategory) -> (bool, Duration, String) {
    println!("\n{}", "=".repeat(80));
    println!("Running: {}", category.name);
    println!("{}", "=".repeat(80));

    let start = Instant::now();

    let output = Command::new("cargo")
        .args([
            "test",
            "-p",
            "integration-tests",
            "--test",
            category.test_name,
            "--",
            "--nocapture",
        ])
        .output();

    let duration = start.elapsed();

    match output {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);

            if !stdout.is_empty() {
                println!("{}", stdout);
            }
            if !stderr.is_empty() {
                eprintln!("{}", stderr);
            }

            let success = output.status.success();
            let summary = if success {
                "PASSED".to_string()
            } else {
                format!("FAILED (exit code: {:?})", output.status.code())
            };

            (success, duration, summary)
        }
        Err(e) => (false, duration, format!("Failed to execute: {}", e)),
    }
}

fn main() {
    print_banner();
    print_test_categories();

    let total_start = Instant::now();
    let results: Vec<_> = TEST_CATEGORIES
        .iter()
        .map(|category| {
            let (success, duration, summary) = run_test_category(category);
            (category.name, success, duration, summary)
        })
        .collect();
    let total_duration = total_start.elapsed();

    println!("\n{}", "=".repeat(80));
    println!("FINAL SUMMARY");
    println!("{}", "=".repeat(80));

    let passed = results.iter().filter(|(_, s, _, _)| *s).count();
    let failed = results.len() - passed;

    println!("\nCategories: {} | Passed: {} | Failed: {}", results.len(), passed, failed);
    println!("Total Duration: {:?}", total_duration);
    println!();

    println!("{:<30} {:<10} {:<15} {}", "Category", "Status", "Duration", "Details");
    println!("{}", "-".repeat(80));
    for (name, success, duration, summary) in &results {
        let status = if *success { "PASS" } else { "FAIL" };
        println!("{:<30} {:<10} {:<15?} {}", name, status, duration, summary);
    }
    println!("{}", "=".repeat(80));

    if failed > 0 {
        println!("\nSome tests failed!");
        std::process::exit(1);
    }
    println!("\nAll tests passed!");
}
