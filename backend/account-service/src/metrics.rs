/// Prometheus metrics for the registration workflow
use crate::error::AccountError;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

static REGISTRATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "account_registrations_total",
        "Total number of registration attempts",
        &["outcome"]
    )
    .expect("Failed to register account registrations metric")
});

static ACTIVATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "account_activations_total",
        "Total number of activation attempts",
        &["outcome"]
    )
    .expect("Failed to register account activations metric")
});

fn outcome<T>(result: &Result<T, AccountError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    }
}

pub fn record_registration<T>(result: &Result<T, AccountError>) {
    REGISTRATIONS_TOTAL
        .with_label_values(&[outcome(result)])
        .inc();
}

pub fn record_activation<T>(result: &Result<T, AccountError>) {
    ACTIVATIONS_TOTAL.with_label_values(&[outcome(result)]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        let before = ACTIVATIONS_TOTAL
            .with_label_values(&["invalid_or_expired"])
            .get();

        record_activation::<()>(&Err(AccountError::InvalidOrExpired));

        assert_eq!(
            ACTIVATIONS_TOTAL
                .with_label_values(&["invalid_or_expired"])
                .get(),
            before + 1
        );
        assert_eq!(outcome(&Ok::<_, AccountError>(())), "success");
        assert_eq!(
            outcome::<()>(&Err(AccountError::AlreadyExists)),
            "already_exists"
        );
    }
}
