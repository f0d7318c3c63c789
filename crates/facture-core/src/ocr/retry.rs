//! Bounded retry combinator keeping the best-scoring attempt.

/// Run up to `max_attempts` attempts of `attempt(n)` (n starting at 0),
/// stopping early once `accept` holds; the best attempt by `score` is
/// returned even when no attempt was accepted.
///
/// Errors from an attempt abort the loop immediately; retry is for
/// low-quality outcomes, not infrastructure failures.
pub fn best_attempt<T, E>(
    max_attempts: u32,
    mut attempt: impl FnMut(u32) -> Result<T, E>,
    score: impl Fn(&T) -> f32,
    accept: impl Fn(&T) -> bool,
) -> Result<Option<T>, E> {
    let mut best: Option<T> = None;

    for n in 0..max_attempts {
        let outcome = attempt(n)?;
        let accepted = accept(&outcome);

        let better = match &best {
            Some(current) => score(&outcome) > score(current),
            None => true,
        };
        if better {
            best = Some(outcome);
        }

        if accepted {
            break;
        }
    }

    Ok(best)
}
