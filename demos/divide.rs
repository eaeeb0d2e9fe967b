//! Premise Divide Demo
//!
//! Declares a few tests, runs them as a suite and prints the JSON summary.
//!
//! # Usage
//!
//! ```bash
//! # Sequential run
//! cargo run --example divide
//!
//! # Parallel run with settings from a file
//! cargo run --example divide -- --settings run.toml
//!
//! # More log output
//! RUST_LOG=debug cargo run --example divide
//! ```

use premise::prelude::*;

#[derive(Debug, thiserror::Error)]
#[error("division by zero")]
struct DivideByZero;

fn checked_divide(dividend: i32, divisor: i32) -> Result<i32, DivideByZero> {
    dividend.checked_div(divisor).ok_or(DivideByZero)
}

fn build_suite() -> Result<TestSuite, RunnerError> {
    let divide = Scenario::new()
        .given_each_of(|| vec![2, 1, 0])
        .try_when(|x| checked_divide(2, *x))
        .then("positive, or division by zero", |x, outcome| {
            if *x > 0 {
                outcome.value().is_some_and(|v| *v > 0)
            } else {
                outcome.error().is_some_and(|e| e.is::<DivideByZero>())
            }
        })
        .build()
        .with_trait("category", "arithmetic");

    let zero = Scenario::new()
        .given(|| 7)
        .try_when(|x| checked_divide(*x, 0))
        .then_fails_with::<DivideByZero>()
        .build()
        .with_trait("category", "arithmetic");

    let table = Scenario::new()
        .given_each_of(|| vec![1, 2, 3])
        .and_each_of(|| vec![10, 20])
        .when(|a, b| a * b)
        .then_returns()
        .and("is a multiple of the second factor", |_a, b, product| product % b == 0)
        .build();

    let logged = Scenario::new()
        .given_test_context()
        .and(|| "premise")
        .when(|ctx, name| {
            ctx.write_output(&format!("hello from {name}"));
            name.len()
        })
        .then_returns()
        .and("counts every byte", |_ctx, _name, len| *len == 7)
        .build();

    TestSuite::new()
        .with("divide", divide)?
        .with("divide by zero", zero)?
        .with("multiplication table", table)?
        .with("context output", logged)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let settings = match args.iter().position(|a| a == "--settings") {
        Some(index) => {
            let path = args.get(index + 1).ok_or("--settings needs a path")?;
            RunSettings::load(path)?
        }
        None => RunSettings::default(),
    };

    let suite = build_suite()?;
    let summary = TestRunner::new(settings)?
        .run_suite(&suite, Cancellation::never())
        .await?;

    println!("{}", summary.to_json()?);
    println!(
        "passed: {}, failed: {}, skipped: {}",
        summary.passed(),
        summary.failed(),
        summary.skipped()
    );

    if summary.is_success() {
        Ok(())
    } else {
        Err("some tests failed".into())
    }
}
