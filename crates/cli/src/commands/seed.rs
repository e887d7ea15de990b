use cutquote_db::{DemoDataset, SeedResult, VerificationCheck};

use crate::commands::{open_pool, prepare, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;

        let seeded = DemoDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let outcome: Result<SeedResult, StepFailure> = if verification.all_present {
            Ok(seeded)
        } else {
            Err(("seed_verification", failed_checks_message(&verification.checks), 6u8))
        };

        pool.close().await;
        outcome
    });

    match result {
        Ok(seeded) => CommandResult::success(
            "seed",
            format!(
                "demo dataset ready: {} customers, {} catalog entries, {} materials",
                seeded.customers, seeded.catalog_entries, seeded.materials
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn failed_checks_message(checks: &[VerificationCheck]) -> String {
    let failed: Vec<String> = checks
        .iter()
        .filter(|check| !check.passed)
        .map(|check| {
            format!("{} (expected {}, found {})", check.name, check.expected, check.actual)
        })
        .collect();
    if failed.is_empty() {
        "some demo rows failed to load".to_string()
    } else {
        format!("seed verification failed for checks: {}", failed.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use cutquote_db::VerificationCheck;

    use super::failed_checks_message;

    fn check(name: &'static str, actual: i64) -> VerificationCheck {
        VerificationCheck { name, expected: 2, actual, passed: actual == 2 }
    }

    #[test]
    fn names_only_the_failed_checks() {
        let message = failed_checks_message(&[check("customers", 2), check("mirrors", 1)]);
        assert_eq!(message, "seed verification failed for checks: mirrors (expected 2, found 1)");
    }

    #[test]
    fn falls_back_to_a_generic_message() {
        let message = failed_checks_message(&[check("customers", 2)]);
        assert_eq!(message, "some demo rows failed to load");
    }
}
