//! Bounded retry for backend phases.
//!
//! Only database errors are retried — they are the transient class — and
//! only up to the configured attempt count; anything else, or persistent
//! connectivity loss, fails the whole run. Retrying a phase wholesale is
//! safe because every projection write is an upsert.

/// Run a phase expression, retrying transient database failures with
/// fixed backoff. Evaluates to the phase's `Ok` value; non-database
/// errors and exhausted retries return out of the enclosing function.
macro_rules! retry_phase {
    ($config:expr, $phase:literal, $op:expr) => {{
        let mut attempt: u32 = 0;
        loop {
            match $op {
                Ok(value) => break value,
                Err(korpus_core::Error::Database(e)) if attempt < $config.commit_retries => {
                    attempt += 1;
                    tracing::warn!(
                        subsystem = "import",
                        component = "pipeline",
                        op = $phase,
                        attempt,
                        error = %e,
                        "Transient backend failure, retrying"
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(
                        $config.retry_backoff_ms,
                    ))
                    .await;
                }
                Err(e) => {
                    tracing::error!(
                        subsystem = "import",
                        component = "pipeline",
                        op = $phase,
                        error = %e,
                        "Phase failed, aborting run"
                    );
                    return Err(e);
                }
            }
        }
    }};
}

pub(crate) use retry_phase;
